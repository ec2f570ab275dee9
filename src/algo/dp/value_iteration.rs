use crate::{
    env::Mdp,
    table::{QTable, ValueTable},
    util::argmax,
};

use super::{iterate, DenseModel, Report, SolverConfig, Sweep};

/// Value iteration
///
/// Repeats the Bellman optimality backup
///
/// Q(s,a) = Σ<sub>s'</sub> P(s'|s,a) (R(s') + γV(s')), V(s) = max<sub>a</sub> Q(s,a)
///
/// until the largest change in V within a sweep falls below θ. Terminal states keep V = 0 and Q = 0 for every
/// action. No policy is produced; use [`PolicyTable::greedy`](crate::table::PolicyTable::greedy) on the
/// returned Q table.
#[derive(Debug, Clone, Default)]
pub struct ValueIteration {
    config: SolverConfig,
}

impl ValueIteration {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Optimal state and action values of `mdp`
    pub fn solve<M: Mdp>(&self, mdp: &M) -> (ValueTable<M::State>, QTable<M::State>) {
        let (values, q, _) = self.run(mdp);
        (values, q)
    }

    /// Optimal state and action values of `mdp`, with the convergence trace
    pub fn run<M: Mdp>(&self, mdp: &M) -> (ValueTable<M::State>, QTable<M::State>, Report) {
        let SolverConfig {
            gamma,
            theta,
            max_iterations,
            sweep,
        } = self.config;

        let model = DenseModel::compile(mdp);
        let n_a = model.num_actions;
        let mut values = vec![0.0; model.len()];
        let mut staged = vec![0.0; model.len()];
        let mut q = vec![0.0; model.len() * n_a];

        let report = iterate("Optimal value iteration", theta, max_iterations, || {
            let mut max_delta = 0.0_f64;
            for s in 0..model.len() {
                let row = s * n_a..(s + 1) * n_a;
                if model.terminal[s] {
                    values[s] = 0.0;
                    staged[s] = 0.0;
                    q[row].fill(0.0);
                    continue;
                }

                for a in 0..n_a {
                    q[s * n_a + a] = model.backup(s, a, gamma, &values);
                }
                let new_value = argmax(&q[row]).map_or(0.0, |(_, v)| v);
                max_delta = max_delta.max((new_value - values[s]).abs());

                match sweep {
                    Sweep::InPlace => values[s] = new_value,
                    Sweep::Synchronous => staged[s] = new_value,
                }
            }
            if sweep == Sweep::Synchronous {
                std::mem::swap(&mut values, &mut staged);
            }
            max_delta
        });

        let values_table = ValueTable::from_parts(model.index.clone(), values);
        let q_table = QTable::from_parts(model.index, n_a, q);
        (values_table, q_table, report)
    }
}

/// Solve for optimal values, see [`ValueIteration`]
pub fn value_iteration<M: Mdp>(
    mdp: &M,
    gamma: f64,
    theta: f64,
    max_iterations: usize,
) -> (ValueTable<M::State>, QTable<M::State>) {
    ValueIteration::new(SolverConfig::new(gamma, theta, max_iterations)).solve(mdp)
}
