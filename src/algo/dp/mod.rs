//! Dynamic programming over a fully known model
//!
//! Each solver compiles the model into a [`DenseModel`] once, sweeps until the largest change in a sweep drops
//! below `theta` or `max_iterations` is reached, and hands back freshly allocated tables.

use std::sync::Arc;

use crate::{
    env::{Hashable, Mdp},
    table::{Policy, StateIndex},
};

pub mod occupancy;
pub mod policy_evaluation;
pub mod value_iteration;

pub use occupancy::{occupancy_measure, OccupancyMeasure};
pub use policy_evaluation::{policy_evaluation, PolicyEvaluator};
pub use value_iteration::{value_iteration, ValueIteration};

/// How a sweep reads the values it is replacing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Sweep {
    /// Each new value is written immediately, so states later in the sweep already see it
    #[default]
    InPlace,
    /// Every new value is computed from the previous sweep's table, then all are committed together
    Synchronous,
}

/// Configuration shared by the iterative solvers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Discount factor, normally in `[0, 1]`
    ///
    /// **Default**: `0.9`
    pub gamma: f64,
    /// Convergence threshold on the largest change within one sweep
    ///
    /// **Default**: `1e-6`
    pub theta: f64,
    /// Hard cap on the number of sweeps
    ///
    /// **Default**: `1000`
    pub max_iterations: usize,
    /// **Default**: [`Sweep::InPlace`]
    pub sweep: Sweep,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            gamma: 0.9,
            theta: 1e-6,
            max_iterations: 1000,
            sweep: Sweep::InPlace,
        }
    }
}

impl SolverConfig {
    pub fn new(gamma: f64, theta: f64, max_iterations: usize) -> Self {
        Self {
            gamma,
            theta,
            max_iterations,
            ..Default::default()
        }
    }
}

/// Trace of one solver run
///
/// Advisory only: the returned tables never depend on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    /// Sweeps performed
    pub iterations: usize,
    /// Whether the run stopped because the change fell below `theta`
    pub converged: bool,
    /// Largest change observed in each sweep
    pub deltas: Vec<f64>,
}

/// Run `sweep` until it reports a change below `theta`, at most `max_iterations` times
pub(crate) fn iterate(
    label: &str,
    theta: f64,
    max_iterations: usize,
    mut sweep: impl FnMut() -> f64,
) -> Report {
    let mut report = Report::default();
    for iteration in 1..=max_iterations {
        let delta = sweep();
        report.iterations = iteration;
        report.deltas.push(delta);
        log::trace!("{label}: iteration {iteration}, max change {delta:e}");
        if delta < theta {
            report.converged = true;
            break;
        }
    }

    if report.converged {
        log::info!("{label} converged after {} iterations", report.iterations);
    } else {
        log::warn!("{label} reached maximum iterations ({max_iterations})");
    }

    report
}

/// A model flattened onto dense state indices
///
/// Successor lists are already resolved (empty distributions became self-loops). States that are reached
/// but missing from [`Mdp::states`] are appended to the index and compiled like any other.
pub(crate) struct DenseModel<S: Hashable> {
    pub index: Arc<StateIndex<S>>,
    pub num_actions: usize,
    pub terminal: Vec<bool>,
    pub rewards: Vec<f64>,
    successors: Vec<Vec<Vec<(usize, f64)>>>,
    self_loops: Vec<(usize, f64)>,
}

impl<S: Hashable> DenseModel<S> {
    pub fn compile<M: Mdp<State = S>>(mdp: &M) -> Self {
        let num_actions = mdp.num_actions();
        let mut index = StateIndex::new(mdp.states());
        for state in mdp.start_states() {
            index.insert(state);
        }

        let mut terminal = Vec::with_capacity(index.len());
        let mut rewards = Vec::with_capacity(index.len());
        let mut successors = Vec::with_capacity(index.len());

        let mut i = 0;
        while i < index.len() {
            let state = index.state(i).clone();
            let is_terminal = mdp.is_terminal(&state);
            terminal.push(is_terminal);
            rewards.push(mdp.reward(&state));

            let mut per_action = Vec::new();
            if !is_terminal {
                per_action.reserve(num_actions);
                for action in 0..num_actions {
                    let mut outcomes = Vec::new();
                    for (next, p) in mdp.resolved_transitions(&state, action) {
                        let j = match index.position(&next) {
                            Some(j) => j,
                            None => {
                                log::debug!("{next:?} is reachable from {state:?} but not listed by the model");
                                index.insert(next)
                            }
                        };
                        outcomes.push((j, p));
                    }
                    per_action.push(outcomes);
                }
            }
            successors.push(per_action);
            i += 1;
        }

        let self_loops = (0..index.len()).map(|i| (i, 1.0)).collect();
        Self {
            index: Arc::new(index),
            num_actions,
            terminal,
            rewards,
            successors,
            self_loops,
        }
    }

    pub fn len(&self) -> usize {
        self.terminal.len()
    }

    /// Resolved successors of `(state, action)`; an action outside the model is a self-loop
    pub fn successors(&self, state: usize, action: usize) -> &[(usize, f64)] {
        match self.successors[state].get(action) {
            Some(outcomes) => outcomes,
            None => std::slice::from_ref(&self.self_loops[state]),
        }
    }

    /// Expected reward plus discounted value of the successor of `(state, action)`
    pub fn backup(&self, state: usize, action: usize, gamma: f64, values: &[f64]) -> f64 {
        self.successors(state, action)
            .iter()
            .map(|&(next, p)| p * (self.rewards[next] + gamma * values[next]))
            .sum()
    }

    /// Per-state action distributions of `policy`, keeping only positive probabilities
    pub fn policy_rows<P: Policy<S>>(&self, policy: &P) -> Vec<Vec<(usize, f64)>> {
        self.index
            .states()
            .iter()
            .map(|state| {
                policy
                    .action_probabilities(state)
                    .into_iter()
                    .filter(|&(_, p)| p > 0.0)
                    .collect()
            })
            .collect()
    }
}
