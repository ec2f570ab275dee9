use std::{fmt::Debug, hash::Hash};

use rand::{distributions::WeightedIndex, prelude::*};

mod tabular;

pub use tabular::TabularMdp;

/// A trait for state types that can be used as keys in a [`HashMap`](std::collections::HashMap)
pub trait Hashable: Clone + Eq + Hash + Debug {}

impl<T> Hashable for T where T: Clone + Eq + Hash + Debug {}

/// A finite Markov decision process, as seen by the solvers
///
/// The solvers only ever read from the model. Actions are the integers `0..num_actions()` in every state;
/// a model may report an empty transition list for a pair it does not define, which every solver reads as
/// "stay where you are" (see [`resolved_transitions`](Mdp::resolved_transitions)).
///
/// Rewards belong to states: arriving in a state yields its reward, whatever action led there.
pub trait Mdp {
    /// Opaque state identifier
    type State: Hashable;

    /// Every state of the model, in a stable order
    ///
    /// The order fixes the sweep order of the dynamic programming solvers.
    fn states(&self) -> Vec<Self::State>;

    /// Number of actions, valid in every state
    fn num_actions(&self) -> usize;

    /// Terminal states are absorbing, have zero value, and end episodes
    fn is_terminal(&self, state: &Self::State) -> bool;

    /// States an episode may begin in
    fn start_states(&self) -> Vec<Self::State>;

    /// Distribution over next states for `(state, action)` as `(next_state, probability)` pairs
    ///
    /// May be empty.
    fn transitions(&self, state: &Self::State, action: usize) -> Vec<(Self::State, f64)>;

    /// Reward received on arrival in `state`
    fn reward(&self, state: &Self::State) -> f64;

    /// [`transitions`](Mdp::transitions), with an empty distribution replaced by a certain self-loop
    fn resolved_transitions(&self, state: &Self::State, action: usize) -> Vec<(Self::State, f64)> {
        let transitions = self.transitions(state, action);
        if transitions.is_empty() {
            vec![(state.clone(), 1.0)]
        } else {
            transitions
        }
    }

    /// Draw the initial state of an episode
    ///
    /// Defaults to a uniform choice over [`start_states`](Mdp::start_states).
    ///
    /// **Returns** `None` if the model has no start states
    fn sample_start_state<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Self::State> {
        self.start_states().choose(rng).cloned()
    }

    /// Draw the successor of `state` under `action`
    ///
    /// Defaults to weighted sampling over [`resolved_transitions`](Mdp::resolved_transitions). A distribution
    /// that cannot be sampled from (all weights zero, negative or NaN) resolves to a self-loop.
    fn sample_next_state<R: Rng + ?Sized>(
        &self,
        state: &Self::State,
        action: usize,
        rng: &mut R,
    ) -> Self::State {
        let mut transitions = self.resolved_transitions(state, action);
        match WeightedIndex::new(transitions.iter().map(|(_, p)| *p)) {
            Ok(dist) => transitions.swap_remove(dist.sample(rng)).0,
            Err(_) => state.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use rand::rngs::StdRng;

    use super::*;

    /// Two states, one action, transitions given verbatim
    pub(crate) struct MockMdp {
        pub transitions: Vec<(u8, f64)>,
        pub starts: Vec<u8>,
    }

    impl Mdp for MockMdp {
        type State = u8;

        fn states(&self) -> Vec<u8> {
            vec![0, 1]
        }

        fn num_actions(&self) -> usize {
            1
        }

        fn is_terminal(&self, state: &u8) -> bool {
            *state == 1
        }

        fn start_states(&self) -> Vec<u8> {
            self.starts.clone()
        }

        fn transitions(&self, state: &u8, _action: usize) -> Vec<(u8, f64)> {
            match state {
                0 => self.transitions.clone(),
                _ => vec![],
            }
        }

        fn reward(&self, state: &u8) -> f64 {
            *state as f64
        }
    }

    #[test]
    fn empty_distribution_resolves_to_self_loop() {
        let mdp = MockMdp {
            transitions: vec![],
            starts: vec![0],
        };
        assert_eq!(mdp.resolved_transitions(&0, 0), vec![(0, 1.0)]);
        assert_eq!(mdp.resolved_transitions(&1, 0), vec![(1, 1.0)]);

        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(mdp.sample_next_state(&0, 0, &mut rng), 0, "sampling follows the self-loop");
    }

    #[test]
    fn sampling_follows_weights() {
        let mdp = MockMdp {
            transitions: vec![(0, 0.2), (1, 0.8)],
            starts: vec![0],
        };
        let mut rng = StdRng::seed_from_u64(2718);
        let n = 10_000;
        let hits = (0..n)
            .filter(|_| mdp.sample_next_state(&0, 0, &mut rng) == 1)
            .count();
        let freq = hits as f64 / n as f64;
        assert!((freq - 0.8).abs() < 0.02, "frequency {freq} is near 0.8");
    }

    #[test]
    fn unsampleable_distribution_stays_put() {
        let mdp = MockMdp {
            transitions: vec![(1, 0.0)],
            starts: vec![0],
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(mdp.sample_next_state(&0, 0, &mut rng), 0);
    }

    #[test]
    fn start_state_sampling() {
        let mut rng = StdRng::seed_from_u64(3);
        let none = MockMdp {
            transitions: vec![],
            starts: vec![],
        };
        assert_eq!(none.sample_start_state(&mut rng), None);

        let one = MockMdp {
            transitions: vec![],
            starts: vec![0],
        };
        assert_eq!(one.sample_start_state(&mut rng), Some(0));
    }
}
