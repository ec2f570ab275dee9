/// Dynamic programming solvers that read the full transition model
pub mod dp;

/// Learners that only sample the model
pub mod tabular;

pub use dp::{
    occupancy_measure, policy_evaluation, value_iteration, OccupancyMeasure, PolicyEvaluator,
    Report, SolverConfig, Sweep, ValueIteration,
};
pub use tabular::{q_learning, QLearningConfig, QTableAgent, TrainingReport};
