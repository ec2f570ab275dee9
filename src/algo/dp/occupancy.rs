use crate::{
    env::Mdp,
    table::{Policy, ValueTable},
};

use super::{iterate, DenseModel, Report, SolverConfig};

/// Discounted state occupancy under a fixed policy
///
/// Starting from a uniform distribution over the start states, probability mass is pushed forward one step
/// per iteration and discounted by γ, while each non-terminal state accumulates the mass that sits on it.
/// Mass entering a terminal state is absorbed: it is neither propagated nor counted, and every terminal
/// state ends at exactly 0. Iteration stops once the largest single-state increment falls below θ.
///
/// [`SolverConfig::sweep`] has no effect here; the distribution is always advanced as a whole.
#[derive(Debug, Clone, Default)]
pub struct OccupancyMeasure {
    config: SolverConfig,
}

impl OccupancyMeasure {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Expected discounted number of visits to each state of `mdp` under `policy`
    pub fn compute<M, P>(&self, mdp: &M, policy: &P) -> ValueTable<M::State>
    where
        M: Mdp,
        P: Policy<M::State>,
    {
        self.run(mdp, policy).0
    }

    /// Like [`compute`](OccupancyMeasure::compute), also returning the convergence trace
    pub fn run<M, P>(&self, mdp: &M, policy: &P) -> (ValueTable<M::State>, Report)
    where
        M: Mdp,
        P: Policy<M::State>,
    {
        let SolverConfig {
            gamma,
            theta,
            max_iterations,
            ..
        } = self.config;

        let model = DenseModel::compile(mdp);
        let mut occupancy = vec![0.0; model.len()];

        let starts: Vec<usize> = mdp
            .start_states()
            .iter()
            .filter_map(|s| model.index.position(s))
            .collect();
        if starts.is_empty() {
            log::warn!("No start states found, occupancy measure is zero everywhere");
            return (
                ValueTable::from_parts(model.index, occupancy),
                Report::default(),
            );
        }

        let actions = model.policy_rows(policy);
        let mut current = vec![0.0; model.len()];
        let mut next = vec![0.0; model.len()];
        let initial = 1.0 / starts.len() as f64;
        for &s in &starts {
            current[s] = initial;
        }

        let report = iterate(
            "Occupancy measure computation",
            theta,
            max_iterations,
            || {
                next.fill(0.0);
                let mut max_change = 0.0_f64;
                for s in 0..model.len() {
                    let mass = current[s];
                    if mass <= 0.0 || model.terminal[s] {
                        continue;
                    }

                    occupancy[s] += mass;
                    max_change = max_change.max(mass);

                    for &(a, pa) in &actions[s] {
                        for &(to, pt) in model.successors(s, a) {
                            if pt > 0.0 && !model.terminal[to] {
                                next[to] += mass * pa * pt * gamma;
                            }
                        }
                    }
                }
                std::mem::swap(&mut current, &mut next);
                max_change
            },
        );

        for (s, value) in occupancy.iter_mut().enumerate() {
            if model.terminal[s] {
                *value = 0.0;
            }
        }

        (ValueTable::from_parts(model.index, occupancy), report)
    }
}

/// Discounted occupancy of each state, see [`OccupancyMeasure`]
pub fn occupancy_measure<M, P>(
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
    OccupancyMeasure::new(SolverConfig::new(gamma, theta, max_iterations)).compute(mdp, policy)
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;

    use super::*;
    use crate::{env::TabularMdp, table::PolicyTable};

    fn line(len: u32) -> TabularMdp<u32> {
        (0..len)
            .fold(TabularMdp::new(1).with_start(0), |mdp, s| mdp.with_transition(s, 0, s + 1, 1.0))
            .with_terminal(len)
    }

    #[test]
    fn line_visits_decay_geometrically() {
        let mdp = line(3);
        let policy = PolicyTable::uniform(0..4, 1);
        let (occ, report) =
            OccupancyMeasure::new(SolverConfig::new(0.5, 1e-9, 100)).run(&mdp, &policy);

        assert_eq!(occ.get(&0), 1.0);
        assert_eq!(occ.get(&1), 0.5);
        assert_eq!(occ.get(&2), 0.25);
        assert_eq!(occ.get(&3), 0.0, "terminal absorbs without counting");
        assert!(report.converged);
        assert_eq!(report.iterations, 4, "mass is gone after the terminal step");
    }

    #[test]
    fn start_mass_is_uniform() {
        let mdp = TabularMdp::new(1)
            .with_start("a")
            .with_start("b")
            .with_transition("a", 0, "end", 1.0)
            .with_transition("b", 0, "end", 1.0)
            .with_terminal("end");
        let occ = occupancy_measure(&mdp, &|_: &&str| vec![(0, 1.0)], 0.9, 1e-9, 100);
        assert_eq!(occ.get(&"a"), 0.5);
        assert_eq!(occ.get(&"b"), 0.5);
        assert_eq!(occ.get(&"end"), 0.0);
    }

    #[test]
    fn self_loop_accumulates_geometric_series() {
        let mdp = TabularMdp::new(1).with_start(0).with_state(1);
        let policy = PolicyTable::uniform([0, 1], 1);
        let occ = occupancy_measure(&mdp, &policy, 0.5, 1e-12, 1000);
        assert_float_eq!(occ.get(&0), 2.0, abs <= 1e-11);
        assert_eq!(occ.get(&1), 0.0, "never reached");
    }

    #[test]
    fn terminal_start_is_zero() {
        let mdp = TabularMdp::new(1).with_start(0).with_terminal(0);
        let policy = PolicyTable::uniform([0], 1);
        let (occ, report) = OccupancyMeasure::default().run(&mdp, &policy);
        assert_eq!(occ.get(&0), 0.0);
        assert!(report.converged, "nothing to propagate");
        assert_eq!(report.iterations, 1);
    }

    #[test]
    fn no_start_states_yields_zero_table() {
        let mdp = TabularMdp::new(1).with_state(0).with_state(1).with_transition(0, 0, 1, 1.0);
        let policy = PolicyTable::uniform([0, 1], 1);
        let (occ, report) = OccupancyMeasure::default().run(&mdp, &policy);
        assert_eq!(occ.len(), 2, "every state still has an entry");
        assert_eq!(occ.total(), 0.0);
        assert_eq!(report.iterations, 0);
    }
}
