use rand::Rng;

use crate::decay::Decay;

use super::Choice;

/// Epsilon greedy exploration policy with a possibly time-decaying epsilon
///
/// The random source is supplied by the caller so that a seeded learner replays the exact same choices.
#[derive(Debug, Clone)]
pub struct EpsilonGreedy<D: Decay = f64> {
    epsilon: D,
}

impl<D: Decay> EpsilonGreedy<D> {
    /// Initialize epsilon greedy policy with a decay strategy
    pub fn new(decay: D) -> Self {
        Self { epsilon: decay }
    }

    /// Epsilon in effect during `episode`
    pub fn epsilon(&self, episode: usize) -> f64 {
        self.epsilon.at(episode)
    }

    /// Invoke epsilon greedy policy for the given episode
    ///
    /// Exactly one uniform draw is consumed from `rng`. Explores with probability epsilon.
    pub fn choose<R: Rng + ?Sized>(&self, episode: usize, rng: &mut R) -> Choice {
        if rng.gen::<f64>() < self.epsilon(episode) {
            Choice::Explore
        } else {
            Choice::Exploit
        }
    }
}

impl Default for EpsilonGreedy<f64> {
    fn default() -> Self {
        Self::new(0.1)
    }
}
