use std::collections::HashMap;

use crate::env::Hashable;

use super::QTable;

/// A possibly stochastic mapping from states to distributions over actions
///
/// Entries with non-positive probability are ignored by every solver.
pub trait Policy<S> {
    /// `(action, probability)` pairs for `state`
    fn action_probabilities(&self, state: &S) -> Vec<(usize, f64)>;
}

impl<S, F> Policy<S> for F
where
    F: Fn(&S) -> Vec<(usize, f64)>,
{
    fn action_probabilities(&self, state: &S) -> Vec<(usize, f64)> {
        self(state)
    }
}

/// A policy stored as an explicit table
///
/// A state without an entry has an empty distribution: no action is ever taken there.
#[derive(Debug, Clone)]
pub struct PolicyTable<S: Hashable> {
    table: HashMap<S, Vec<(usize, f64)>>,
}

impl<S: Hashable> Default for PolicyTable<S> {
    fn default() -> Self {
        Self {
            table: HashMap::new(),
        }
    }
}

impl<S: Hashable> PolicyTable<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every action equally likely in every given state
    pub fn uniform(states: impl IntoIterator<Item = S>, num_actions: usize) -> Self {
        let p = 1.0 / num_actions as f64;
        let table = states
            .into_iter()
            .map(|s| (s, (0..num_actions).map(|a| (a, p)).collect()))
            .collect();
        Self { table }
    }

    /// The deterministic policy that is greedy with respect to `q`, ties going to the lowest action
    pub fn greedy(q: &QTable<S>) -> Self {
        let table = q
            .iter()
            .map(|(s, _)| (s.clone(), vec![(q.best_action(s).0, 1.0)]))
            .collect();
        Self { table }
    }

    /// Replace the distribution for `state`
    pub fn set(&mut self, state: S, probabilities: Vec<(usize, f64)>) {
        self.table.insert(state, probabilities);
    }

    /// Always take `action` in `state`
    pub fn set_deterministic(&mut self, state: S, action: usize) {
        self.set(state, vec![(action, 1.0)]);
    }

    /// The single most likely action in `state`, lowest index on ties
    pub fn action(&self, state: &S) -> Option<usize> {
        self.table
            .get(state)?
            .iter()
            .fold(None, |best: Option<(usize, f64)>, &(a, p)| match best {
                Some((_, bp)) if p <= bp => best,
                _ => Some((a, p)),
            })
            .map(|(a, _)| a)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl<S: Hashable> Policy<S> for PolicyTable<S> {
    fn action_probabilities(&self, state: &S) -> Vec<(usize, f64)> {
        self.table.get(state).cloned().unwrap_or_default()
    }
}
