use crate::{
    env::Mdp,
    table::{Policy, ValueTable},
};

use super::{iterate, DenseModel, Report, SolverConfig, Sweep};

/// Iterative policy evaluation
///
/// Repeats the Bellman expectation backup
///
/// V(s) = Σ<sub>a</sub> π(a|s) Σ<sub>s'</sub> P(s'|s,a) (R(s') + γV(s'))
///
/// over every non-terminal state until the largest change in a sweep falls below θ. Terminal states stay at 0.
/// The policy may be stochastic.
#[derive(Debug, Clone, Default)]
pub struct PolicyEvaluator {
    config: SolverConfig,
}

impl PolicyEvaluator {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Evaluate `policy` on `mdp`
    pub fn evaluate<M, P>(&self, mdp: &M, policy: &P) -> ValueTable<M::State>
    where
        M: Mdp,
        P: Policy<M::State>,
    {
        self.run(mdp, policy).0
    }

    /// Evaluate `policy` on `mdp`, also returning the convergence trace
    pub fn run<M, P>(&self, mdp: &M, policy: &P) -> (ValueTable<M::State>, Report)
    where
        M: Mdp,
        P: Policy<M::State>,
    {
        let SolverConfig {
            gamma,
            theta,
            max_iterations,
            sweep,
        } = self.config;

        let model = DenseModel::compile(mdp);
        let actions = model.policy_rows(policy);
        let mut values = vec![0.0; model.len()];
        let mut staged = vec![0.0; model.len()];

        let report = iterate("Policy evaluation", theta, max_iterations, || {
            let mut max_delta = 0.0_f64;
            for s in 0..model.len() {
                if model.terminal[s] {
                    values[s] = 0.0;
                    staged[s] = 0.0;
                    continue;
                }

                let new_value: f64 = actions[s]
                    .iter()
                    .map(|&(a, p)| p * model.backup(s, a, gamma, &values))
                    .sum();
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

        (ValueTable::from_parts(model.index, values), report)
    }
}

/// Evaluate a fixed policy, see [`PolicyEvaluator`]
pub fn policy_evaluation<M, P>(
    mdp: &M,
    policy: &P,
    gamma: f64,
    theta: f64,
    max_iterations: usize,
) -> ValueTable<M::State>
where
    M: Mdp,
    P: Policy<M::State>,
{
    PolicyEvaluator::new(SolverConfig::new(gamma, theta, max_iterations)).evaluate(mdp, policy)
}
