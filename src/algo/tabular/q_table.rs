use std::sync::Arc;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    decay::Decay,
    env::Mdp,
    exploration::{Choice, EpsilonGreedy},
    table::{QTable, StateIndex, ValueTable},
};

/// Configuration for the [`QTableAgent`]
#[derive(Debug, Clone)]
pub struct QLearningConfig<D: Decay = f64> {
    /// Learning rate, in `(0, 1]`
    ///
    /// **Default**: `0.1`
    pub alpha: f64,
    /// Discount factor, in `[0, 1]`
    ///
    /// **Default**: `0.9`
    pub gamma: f64,
    /// Exploration policy; a plain `f64` epsilon keeps it constant
    ///
    /// **Default**: epsilon `0.1`
    pub exploration: EpsilonGreedy<D>,
    /// **Default**: `10000`
    pub num_episodes: usize,
    /// **Default**: `1000`
    pub max_steps_per_episode: usize,
    /// Seed of the random source; `None` draws one from the operating system
    ///
    /// **Default**: `None`
    pub seed: Option<u64>,
}

impl Default for QLearningConfig<f64> {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.9,
            exploration: EpsilonGreedy::new(0.1),
            num_episodes: 10000,
            max_steps_per_episode: 1000,
            seed: None,
        }
    }
}

/// Per-episode statistics gathered while learning
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingReport {
    /// Steps taken in each episode
    pub steps: Vec<usize>,
    /// Undiscounted sum of rewards collected in each episode
    pub returns: Vec<f64>,
}

/// A one-step Q-learning agent that learns a Q-table by sampling the model
///
/// Each step picks an action epsilon-greedily, samples the successor, and moves
///
/// Q(s,a) ← Q(s,a) + α (target - Q(s,a))
///
/// toward `r` if the successor is terminal, else toward `r + γ · max_a' Q(s', a')`.
/// Transition probabilities are never read directly.
///
/// All randomness (start states, exploration, successors) comes from one [`StdRng`], so a fixed seed
/// reproduces the run exactly.
pub struct QTableAgent<'a, M: Mdp, D: Decay = f64> {
    mdp: &'a M,
    q_table: QTable<M::State>,
    exploration: EpsilonGreedy<D>,
    alpha: f64,   // learning rate
    gamma: f64,   // discount factor
    max_steps: usize,
    rng: StdRng,
    episode: usize, // current episode
}

impl<'a, M: Mdp, D: Decay> QTableAgent<'a, M, D> {
    /// Initialize a new agent with a zero entry for every state and action of `mdp`
    pub fn new(mdp: &'a M, config: &QLearningConfig<D>) -> Self
    where
        D: Clone,
    {
        let index = Arc::new(StateIndex::new(mdp.states()));
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            mdp,
            q_table: QTable::new(index, mdp.num_actions()),
            exploration: config.exploration.clone(),
            alpha: config.alpha,
            gamma: config.gamma,
            max_steps: config.max_steps_per_episode,
            rng,
            episode: 0,
        }
    }

    pub fn q_table(&self) -> &QTable<M::State> {
        &self.q_table
    }

    /// Choose an action based on the current state and exploration policy
    fn act(&mut self, state: &M::State) -> usize {
        match self.exploration.choose(self.episode, &mut self.rng) {
            Choice::Explore => self.rng.gen_range(0..self.q_table.num_actions()),
            Choice::Exploit => self.q_table.best_action(state).0,
        }
    }

    /// Move `Q(state, action)` toward the one-step target
    fn learn(&mut self, state: &M::State, action: usize, reward: f64, next_state: &M::State) {
        let q_value = self.q_table.get(state, action);
        let target = if self.mdp.is_terminal(next_state) {
            reward
        } else {
            reward + self.gamma * self.q_table.best_action(next_state).1
        };
        self.q_table
            .set(state, action, q_value + self.alpha * (target - q_value));
    }

    /// Run a single episode
    ///
    /// **Returns** `(steps, return)`, or `None` if the model has no start state to begin from
    pub fn go(&mut self) -> Option<(usize, f64)> {
        let mut state = self.mdp.sample_start_state(&mut self.rng)?;
        let mut steps = 0;
        let mut total = 0.0;

        for _ in 0..self.max_steps {
            if self.mdp.is_terminal(&state) {
                break;
            }

            let action = self.act(&state);
            let next_state = self.mdp.sample_next_state(&state, action, &mut self.rng);
            let reward = self.mdp.reward(&next_state);
            self.learn(&state, action, reward, &next_state);

            steps += 1;
            total += reward;
            state = next_state;
        }

        self.episode += 1;
        Some((steps, total))
    }

    /// Run `num_episodes` episodes and hand back the learned tables
    ///
    /// The value table holds the best Q value of each state, with terminal states pinned to 0.
    pub fn train(
        mut self,
        num_episodes: usize,
    ) -> (QTable<M::State>, ValueTable<M::State>, TrainingReport) {
        let mut report = TrainingReport::default();

        if self.q_table.num_actions() == 0 {
            log::warn!("Model has no actions, skipping Q-learning");
        } else {
            let progress_every = (num_episodes / 10).max(1);
            for episode in 0..num_episodes {
                let Some((steps, total)) = self.go() else {
                    log::warn!("No start states found, skipping Q-learning");
                    break;
                };
                report.steps.push(steps);
                report.returns.push(total);

                if (episode + 1) % progress_every == 0 {
                    log::info!(
                        "Q-Learning progress: {}/{} episodes completed",
                        episode + 1,
                        num_episodes
                    );
                }
            }
        }

        let mdp = self.mdp;
        let values = self.q_table.to_value_table(|s| mdp.is_terminal(s));
        (self.q_table, values, report)
    }
}

impl<D: Decay + Clone> QLearningConfig<D> {
    /// Learn `mdp` with this configuration
    pub fn run<M: Mdp>(&self, mdp: &M) -> (QTable<M::State>, ValueTable<M::State>, TrainingReport) {
        QTableAgent::new(mdp, self).train(self.num_episodes)
    }
}

/// Learn action values by Q-learning with a constant epsilon, see [`QTableAgent`]
pub fn q_learning<M: Mdp>(
    mdp: &M,
    alpha: f64,
    gamma: f64,
    epsilon: f64,
    num_episodes: usize,
    max_steps_per_episode: usize,
    seed: Option<u64>,
) -> (QTable<M::State>, ValueTable<M::State>) {
    let config = QLearningConfig {
        alpha,
        gamma,
        exploration: EpsilonGreedy::new(epsilon),
        num_episodes,
        max_steps_per_episode,
        seed,
    };
    let (q, v, _) = config.run(mdp);
    (q, v)
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;

    use super::*;
    use crate::{
        algo::dp::{tests::two_state_chain, value_iteration},
        decay::{Exponential, Step},
        env::TabularMdp,
    };

    /// Action 0 drifts back to `s0`, action 1 advances; `goal` is terminal with reward 1
    fn ladder() -> TabularMdp<&'static str> {
        TabularMdp::new(2)
            .with_start("s0")
            .with_transition("s0", 0, "s0", 1.0)
            .with_transition("s0", 1, "s1", 1.0)
            .with_transition("s1", 0, "s0", 1.0)
            .with_transition("s1", 1, "goal", 0.8)
            .with_transition("s1", 1, "s1", 0.2)
            .with_terminal("goal")
            .with_reward("goal", 1.0)
    }

    #[test]
    fn same_seed_same_table() {
        let mdp = ladder();
        let config = QLearningConfig {
            exploration: EpsilonGreedy::new(0.3),
            num_episodes: 200,
            max_steps_per_episode: 50,
            seed: Some(1234),
            ..Default::default()
        };
        let (q1, _, r1) = config.run(&mdp);
        let (q2, _, r2) = config.run(&mdp);

        for (state, row) in q1.iter() {
            let other = q2.action_values(state);
            for (a, b) in row.iter().zip(other) {
                assert_eq!(a.to_bits(), b.to_bits(), "bit-identical Q for {state:?}");
            }
        }
        assert_eq!(r1, r2, "identical trajectories");
    }

    #[test]
    fn two_state_chain_learns_exact_value() {
        let (q, v) = q_learning(&two_state_chain(), 0.5, 0.9, 0.1, 60, 10, Some(7));
        assert_float_eq!(q.get(&"A", 0), 1.0, abs <= 1e-12);
        assert_float_eq!(v.get(&"A"), 1.0, abs <= 1e-12);
        assert_eq!(v.get(&"B"), 0.0, "terminal pinned to zero");
    }

    #[test]
    fn approaches_value_iteration() {
        let mdp = ladder();
        let config = QLearningConfig {
            alpha: 0.2,
            exploration: EpsilonGreedy::new(0.2),
            num_episodes: 3000,
            max_steps_per_episode: 100,
            seed: Some(99),
            ..Default::default()
        };
        let (q, v, _) = config.run(&mdp);
        let (v_star, q_star) = value_iteration(&mdp, 0.9, 1e-10, 1000);

        assert_float_eq!(v.get(&"s0"), v_star.get(&"s0"), abs <= 0.05);
        assert_float_eq!(v.get(&"s1"), v_star.get(&"s1"), abs <= 0.05);
        assert_eq!(q.best_action(&"s0").0, q_star.best_action(&"s0").0);
        assert_eq!(q.best_action(&"s1").0, q_star.best_action(&"s1").0);
    }

    #[test]
    fn decaying_exploration() {
        let config = QLearningConfig {
            alpha: 0.5,
            gamma: 0.9,
            exploration: EpsilonGreedy::new(Exponential::new(0.01, 1.0, 0.05).unwrap()),
            num_episodes: 500,
            max_steps_per_episode: 50,
            seed: Some(5),
        };
        let (q, _, report) = config.run(&ladder());
        assert_eq!(report.steps.len(), 500);
        assert_eq!(q.best_action(&"s0").0, 1, "advancing is learned");
    }

    #[test]
    fn schedule_switches_from_random_to_greedy() {
        // Waiting is a self-loop, leaving reaches the goal
        let mdp = TabularMdp::new(2)
            .with_start("wait")
            .with_transition("wait", 0, "wait", 1.0)
            .with_transition("wait", 1, "goal", 1.0)
            .with_terminal("goal")
            .with_reward("goal", 1.0);
        let config = QLearningConfig {
            alpha: 0.5,
            gamma: 0.9,
            exploration: EpsilonGreedy::new(Step::new(0.0, 1.0, 0.0, 20).unwrap()),
            num_episodes: 60,
            max_steps_per_episode: 50,
            seed: Some(8),
        };
        let (q, _, report) = config.run(&mdp);

        assert!(
            report.steps[..20].iter().any(|&n| n > 1),
            "random actions while epsilon is 1"
        );
        assert!(
            report.steps[20..].iter().all(|&n| n == 1),
            "straight to the goal once epsilon drops to 0"
        );
        assert!(report.returns[20..].iter().all(|&r| r == 1.0));
        assert!(q.get(&"wait", 1) > q.get(&"wait", 0), "leaving is preferred");
    }

    #[test]
    fn episodes_stop_at_step_cap() {
        let mdp = TabularMdp::new(1).with_start(0).with_transition(0, 0, 0, 1.0).with_reward(0, 1.0);
        let config = QLearningConfig {
            num_episodes: 3,
            max_steps_per_episode: 4,
            seed: Some(0),
            ..Default::default()
        };
        let (_, _, report) = config.run(&mdp);
        assert_eq!(report.steps, [4, 4, 4]);
        assert_eq!(report.returns, [4.0, 4.0, 4.0]);
    }

    #[test]
    fn no_start_states_yields_zero_tables() {
        let mdp = TabularMdp::new(2).with_state("x").with_transition("x", 0, "y", 1.0);
        let (q, v) = q_learning(&mdp, 0.5, 0.9, 0.1, 10, 10, Some(0));
        assert_eq!(q.action_values(&"x"), [0.0, 0.0]);
        assert_eq!(v.total(), 0.0);
        assert_eq!(v.len(), 2, "every state still has an entry");
    }

    #[test]
    fn zero_episodes() {
        let (q, v) = q_learning(&two_state_chain(), 0.5, 0.9, 0.1, 0, 10, Some(0));
        assert_eq!(q.get(&"A", 0), 0.0);
        assert_eq!(v.get(&"A"), 0.0);
    }
}
