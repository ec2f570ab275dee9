//! Model-free learners that only sample the model

pub mod q_table;

pub use q_table::{q_learning, QLearningConfig, QTableAgent, TrainingReport};
