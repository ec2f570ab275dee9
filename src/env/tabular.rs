use std::collections::HashMap;

use super::{Hashable, Mdp};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct StateInfo {
    reward: f64,
    terminal: bool,
}

/// An explicit in-memory MDP, assembled with a builder
///
/// States are registered on first mention (with reward `0.0`) and keep that order. Transitions for the same
/// `(state, action, next_state)` accumulate. Nothing is validated: probabilities that do not sum to one are
/// used as given.
///
/// ### Example
/// ```
/// use tabular_mdp::env::{Mdp, TabularMdp};
///
/// let mdp = TabularMdp::new(1)
///     .with_start("A")
///     .with_terminal("B")
///     .with_reward("B", 1.0)
///     .with_transition("A", 0, "B", 1.0);
///
/// assert_eq!(mdp.states(), vec!["A", "B"]);
/// assert!(mdp.is_terminal(&"B"));
/// ```
#[derive(Debug, Clone)]
pub struct TabularMdp<S: Hashable> {
    num_actions: usize,
    states: Vec<S>,
    info: HashMap<S, StateInfo>,
    starts: Vec<S>,
    transitions: HashMap<(S, usize), Vec<(S, f64)>>,
}

impl<S: Hashable> TabularMdp<S> {
    /// An empty model in which every state has `num_actions` actions
    pub fn new(num_actions: usize) -> Self {
        Self {
            num_actions,
            states: Vec::new(),
            info: HashMap::new(),
            starts: Vec::new(),
            transitions: HashMap::new(),
        }
    }

    fn register(&mut self, state: &S) -> &mut StateInfo {
        if !self.info.contains_key(state) {
            self.states.push(state.clone());
        }
        self.info.entry(state.clone()).or_default()
    }

    /// Add a state with no special role
    pub fn with_state(mut self, state: S) -> Self {
        self.register(&state);
        self
    }

    /// Set the reward received on arrival in `state`
    pub fn with_reward(mut self, state: S, reward: f64) -> Self {
        self.register(&state).reward = reward;
        self
    }

    /// Mark `state` as terminal
    pub fn with_terminal(mut self, state: S) -> Self {
        self.register(&state).terminal = true;
        self
    }

    /// Mark `state` as a valid episode start
    pub fn with_start(mut self, state: S) -> Self {
        self.register(&state);
        if !self.starts.contains(&state) {
            self.starts.push(state);
        }
        self
    }

    /// Add `probability` to moving from `from` to `to` under `action`
    pub fn with_transition(mut self, from: S, action: usize, to: S, probability: f64) -> Self {
        self.register(&from);
        self.register(&to);
        let outcomes = self.transitions.entry((from, action)).or_default();
        match outcomes.iter_mut().find(|(next, _)| *next == to) {
            Some((_, p)) => *p += probability,
            None => outcomes.push((to, probability)),
        }
        self
    }
}

impl<S: Hashable> Mdp for TabularMdp<S> {
    type State = S;

    fn states(&self) -> Vec<S> {
        self.states.clone()
    }

    fn num_actions(&self) -> usize {
        self.num_actions
    }

    fn is_terminal(&self, state: &S) -> bool {
        self.info.get(state).is_some_and(|info| info.terminal)
    }

    fn start_states(&self) -> Vec<S> {
        self.starts.clone()
    }

    fn transitions(&self, state: &S, action: usize) -> Vec<(S, f64)> {
        self.transitions
            .get(&(state.clone(), action))
            .cloned()
            .unwrap_or_default()
    }

    fn reward(&self, state: &S) -> f64 {
        self.info.get(state).map_or(0.0, |info| info.reward)
    }
}
