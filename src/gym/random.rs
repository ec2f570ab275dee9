use rand::{rngs::StdRng, seq::index, SeedableRng};
use rand_distr::{Dirichlet, Distribution, Normal};

use crate::{
    env::TabularMdp,
    error::{Error, Result},
};

/// Parameters of a randomly generated model
///
/// Every non-terminal `(state, action)` pair moves to `branching` distinct successors, with probabilities
/// drawn from a flat Dirichlet distribution. Rewards are normally distributed around zero. The last
/// `num_terminal` states are terminal and episodes start in state 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomMdp {
    /// **Default**: `10`
    pub num_states: usize,
    /// **Default**: `3`
    pub num_actions: usize,
    /// **Default**: `3`
    pub branching: usize,
    /// **Default**: `1`
    pub num_terminal: usize,
    /// Standard deviation of state rewards
    ///
    /// **Default**: `1.0`
    pub reward_std: f64,
}

impl Default for RandomMdp {
    fn default() -> Self {
        Self {
            num_states: 10,
            num_actions: 3,
            branching: 3,
            num_terminal: 1,
            reward_std: 1.0,
        }
    }
}

impl RandomMdp {
    fn validate(&self) -> Result<()> {
        let invalid = |name: &'static str, reason: String| -> Result<()> {
            Err(Error::InvalidParameter { name, reason })
        };
        if self.num_states == 0 {
            return invalid("num_states", "model needs at least one state".into());
        }
        if self.num_actions == 0 {
            return invalid("num_actions", "model needs at least one action".into());
        }
        if self.branching == 0 || self.branching > self.num_states {
            return invalid(
                "branching",
                format!("must be in 1..={}, got {}", self.num_states, self.branching),
            );
        }
        if self.num_terminal >= self.num_states {
            return invalid(
                "num_terminal",
                format!("state 0 must stay non-terminal, got {} of {}", self.num_terminal, self.num_states),
            );
        }
        if !(self.reward_std >= 0.0 && self.reward_std.is_finite()) {
            return invalid(
                "reward_std",
                format!("must be finite and non-negative, got {}", self.reward_std),
            );
        }
        Ok(())
    }

    /// Draw a model; the same seed always yields the same model
    pub fn generate(&self, seed: u64) -> Result<TabularMdp<usize>> {
        self.validate()?;
        let mut rng = StdRng::seed_from_u64(seed);

        let rewards = Normal::new(0.0, self.reward_std).map_err(|e| Error::InvalidParameter {
            name: "reward_std",
            reason: format!("{e:?}"),
        })?;
        let weights = match self.branching {
            1 => None,
            n => Some(
                Dirichlet::new_with_size(1.0, n).map_err(|e| Error::InvalidParameter {
                    name: "branching",
                    reason: format!("{e:?}"),
                })?,
            ),
        };

        let first_terminal = self.num_states - self.num_terminal;
        let mut mdp = TabularMdp::new(self.num_actions).with_start(0);
        for s in 0..self.num_states {
            mdp = mdp.with_reward(s, rewards.sample(&mut rng));
        }
        for s in first_terminal..self.num_states {
            mdp = mdp.with_terminal(s);
        }

        for s in 0..first_terminal {
            for a in 0..self.num_actions {
                let successors = index::sample(&mut rng, self.num_states, self.branching);
                let probabilities = match &weights {
                    Some(dirichlet) => dirichlet.sample(&mut rng),
                    None => vec![1.0],
                };
                for (next, p) in successors.into_iter().zip(probabilities) {
                    mdp = mdp.with_transition(s, a, next, p);
                }
            }
        }

        Ok(mdp)
    }
}
