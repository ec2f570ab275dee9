use crate::env::TabularMdp;

/// A deterministic chain `0 -> 1 -> ... -> len` with a single action
///
/// State `len` is terminal and worth `reward` on arrival; all other states are worth 0. Episodes start at 0.
pub fn chain(len: usize, reward: f64) -> TabularMdp<usize> {
    (0..len)
        .fold(TabularMdp::new(1).with_start(0), |mdp, s| {
            mdp.with_transition(s, 0, s + 1, 1.0)
        })
        .with_terminal(len)
        .with_reward(len, reward)
}
