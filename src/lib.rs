//! Solvers for finite Markov decision processes
//!
//! Four independent algorithms over one model contract, [`env::Mdp`]:
//!
//! - [`policy_evaluation`] computes the state values of a fixed, possibly stochastic, policy
//! - [`value_iteration`] computes optimal state and action values
//! - [`q_learning`] learns action values from sampled episodes with epsilon-greedy exploration
//! - [`occupancy_measure`] computes the discounted number of visits to each state under a fixed policy
//!
//! Every call allocates fresh tables and keeps nothing afterwards. Progress and convergence are reported
//! through the [`log`] facade and never change the returned values.
//!
//! ```
//! use tabular_mdp::{env::TabularMdp, value_iteration};
//!
//! let mdp = TabularMdp::new(1)
//!     .with_start("A")
//!     .with_transition("A", 0, "B", 1.0)
//!     .with_terminal("B")
//!     .with_reward("B", 1.0);
//!
//! let (values, q) = value_iteration(&mdp, 0.9, 1e-6, 1000);
//! assert_eq!(values.get(&"B"), 0.0);
//! assert_eq!(q.best_action(&"A"), (0, 1.0));
//! ```

/// Implemented solvers
pub mod algo;

/// Implementations of strategies for time-decaying hyperparameters
pub mod decay;

/// The model contract
pub mod env;

/// Exploration policies
pub mod exploration;

/// Ready-made models
#[cfg(feature = "gym")]
pub mod gym;

/// Value, action-value and policy tables
pub mod table;

mod error;
mod util;

pub use algo::{occupancy_measure, policy_evaluation, q_learning, value_iteration};
pub use error::{Error, Result};
