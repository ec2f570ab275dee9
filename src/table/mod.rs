use std::{collections::HashMap, sync::Arc};

use crate::{env::Hashable, util::argmax};

mod policy;

pub use policy::{Policy, PolicyTable};

/// Dense numbering of states
///
/// Built once when a solver starts, so that the hot loops index plain vectors instead of hashing states.
/// Tables produced by the same solver call share one index.
#[derive(Debug, Clone, PartialEq)]
pub struct StateIndex<S: Hashable> {
    states: Vec<S>,
    positions: HashMap<S, usize>,
}

impl<S: Hashable> StateIndex<S> {
    /// Number the given states in order, ignoring repeats
    pub fn new(states: impl IntoIterator<Item = S>) -> Self {
        let mut index = Self {
            states: Vec::new(),
            positions: HashMap::new(),
        };
        for state in states {
            index.insert(state);
        }
        index
    }

    /// Position of `state`, adding it at the end if it is new
    pub fn insert(&mut self, state: S) -> usize {
        if let Some(&i) = self.positions.get(&state) {
            return i;
        }
        let i = self.states.len();
        self.positions.insert(state.clone(), i);
        self.states.push(state);
        i
    }

    pub fn position(&self, state: &S) -> Option<usize> {
        self.positions.get(state).copied()
    }

    pub fn state(&self, i: usize) -> &S {
        &self.states[i]
    }

    pub fn states(&self) -> &[S] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// State values, or any other per-state quantity such as occupancy
#[derive(Debug, Clone)]
pub struct ValueTable<S: Hashable> {
    index: Arc<StateIndex<S>>,
    values: Vec<f64>,
}

impl<S: Hashable> ValueTable<S> {
    /// A table with an explicit zero for every indexed state
    pub fn new(index: Arc<StateIndex<S>>) -> Self {
        let values = vec![0.0; index.len()];
        Self { index, values }
    }

    pub(crate) fn from_parts(index: Arc<StateIndex<S>>, values: Vec<f64>) -> Self {
        debug_assert_eq!(index.len(), values.len());
        Self { index, values }
    }

    /// Value of `state`, `0.0` if the table has never seen it
    pub fn get(&self, state: &S) -> f64 {
        self.index
            .position(state)
            .map_or(0.0, |i| self.values[i])
    }

    /// Overwrite the value of `state`, adding the state if it is new
    pub fn set(&mut self, state: &S, value: f64) {
        match self.index.position(state) {
            Some(i) => self.values[i] = value,
            None => {
                Arc::make_mut(&mut self.index).insert(state.clone());
                self.values.push(value);
            }
        }
    }

    /// Iterate over `(state, value)` in index order
    pub fn iter(&self) -> impl Iterator<Item = (&S, f64)> + '_ {
        self.index.states().iter().zip(self.values.iter().copied())
    }

    /// Sum of all entries
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn index(&self) -> &StateIndex<S> {
        &self.index
    }

    /// States with an entry, in index order
    pub fn states(&self) -> &[S] {
        self.index.states()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Action values, stored densely as one row of `num_actions` entries per state
#[derive(Debug, Clone)]
pub struct QTable<S: Hashable> {
    index: Arc<StateIndex<S>>,
    num_actions: usize,
    values: Vec<f64>,
}

impl<S: Hashable> QTable<S> {
    /// A table with an explicit zero for every indexed state and every action
    pub fn new(index: Arc<StateIndex<S>>, num_actions: usize) -> Self {
        let values = vec![0.0; index.len() * num_actions];
        Self {
            index,
            num_actions,
            values,
        }
    }

    pub(crate) fn from_parts(index: Arc<StateIndex<S>>, num_actions: usize, values: Vec<f64>) -> Self {
        debug_assert_eq!(index.len() * num_actions, values.len());
        Self {
            index,
            num_actions,
            values,
        }
    }

    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    /// Q value of `(state, action)`, `0.0` for a state or action the table does not hold
    pub fn get(&self, state: &S, action: usize) -> f64 {
        self.action_values(state).get(action).copied().unwrap_or(0.0)
    }

    /// Overwrite the Q value of `(state, action)`, adding the state if it is new
    ///
    /// **Panics** if `action` is not below [`num_actions`](QTable::num_actions)
    pub fn set(&mut self, state: &S, action: usize, value: f64) {
        assert!(
            action < self.num_actions,
            "Invalid action: {} (table has {} actions)",
            action,
            self.num_actions
        );
        let i = match self.index.position(state) {
            Some(i) => i,
            None => {
                self.values.extend(std::iter::repeat(0.0).take(self.num_actions));
                Arc::make_mut(&mut self.index).insert(state.clone())
            }
        };
        self.values[i * self.num_actions + action] = value;
    }

    /// The row of Q values for `state`, empty if the state is unknown
    pub fn action_values(&self, state: &S) -> &[f64] {
        match self.index.position(state) {
            Some(i) => self.row(i),
            None => &[],
        }
    }

    /// Greedy action and its value
    ///
    /// Ties go to the lowest action index, which keeps learning reproducible under a fixed seed.
    /// An unknown state (or a table without actions) yields `(0, 0.0)`.
    pub fn best_action(&self, state: &S) -> (usize, f64) {
        argmax(self.action_values(state)).unwrap_or((0, 0.0))
    }

    /// Derive state values as the best action value per state, pinning states accepted by `is_terminal` to zero
    pub fn to_value_table(&self, is_terminal: impl Fn(&S) -> bool) -> ValueTable<S> {
        let values = (0..self.index.len())
            .map(|i| {
                if is_terminal(self.index.state(i)) {
                    0.0
                } else {
                    argmax(self.row(i)).map_or(0.0, |(_, v)| v)
                }
            })
            .collect();
        ValueTable::from_parts(Arc::clone(&self.index), values)
    }

    /// Iterate over `(state, action values)` in index order
    pub fn iter(&self) -> impl Iterator<Item = (&S, &[f64])> + '_ {
        (0..self.index.len()).map(|i| (self.index.state(i), self.row(i)))
    }

    pub fn index(&self) -> &StateIndex<S> {
        &self.index
    }

    fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.num_actions..(i + 1) * self.num_actions]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> Arc<StateIndex<&'static str>> {
        Arc::new(StateIndex::new(["a", "b", "a", "c"]))
    }

    #[test]
    fn state_index_functional() {
        let mut index = StateIndex::new(["a", "b", "a", "c"]);
        assert_eq!(index.len(), 3, "repeats ignored");
        assert_eq!(index.position(&"c"), Some(2));
        assert_eq!(index.position(&"z"), None);
        assert_eq!(index.insert("b"), 1, "existing state keeps its position");
        assert_eq!(index.insert("z"), 3, "new state appended");
        assert_eq!(index.state(3), &"z");
    }

    #[test]
    fn value_table_functional() {
        let mut table = ValueTable::new(index());
        assert_eq!(table.values(), [0.0, 0.0, 0.0], "explicit zero per state");

        table.set(&"b", 2.5);
        assert_eq!(table.get(&"b"), 2.5);
        assert_eq!(table.get(&"nowhere"), 0.0, "unknown state reads as zero");

        table.set(&"d", 1.0);
        assert_eq!(table.len(), 4, "unknown state appended on write");
        assert_eq!(table.get(&"d"), 1.0);
        assert_eq!(table.total(), 3.5);
        assert_eq!(table.states(), ["a", "b", "c", "d"]);
        assert_eq!(
            table.iter().collect::<Vec<_>>(),
            vec![(&"a", 0.0), (&"b", 2.5), (&"c", 0.0), (&"d", 1.0)]
        );
    }

    #[test]
    fn tables_sharing_an_index_diverge_on_write() {
        let shared = index();
        let mut first = ValueTable::new(Arc::clone(&shared));
        let second = ValueTable::new(Arc::clone(&shared));
        first.set(&"new", 1.0);
        assert_eq!(first.len(), 4);
        assert_eq!(second.len(), 3, "other table keeps the original index");
        assert_eq!(shared.len(), 3);
    }

    #[test]
    fn q_table_functional() {
        let mut q = QTable::new(index(), 3);
        assert_eq!(q.action_values(&"a"), [0.0, 0.0, 0.0]);
        assert_eq!(q.best_action(&"a"), (0, 0.0), "all-zero row picks the first action");

        q.set(&"a", 1, 4.0);
        q.set(&"a", 2, 4.0);
        assert_eq!(q.best_action(&"a"), (1, 4.0), "lowest index wins ties");
        assert_eq!(q.get(&"a", 2), 4.0);
        assert_eq!(q.get(&"a", 9), 0.0, "out of range action reads as zero");

        q.set(&"z", 0, -1.0);
        assert_eq!(q.action_values(&"z"), [-1.0, 0.0, 0.0], "new state gets a zero row");
        assert_eq!(q.best_action(&"z"), (1, 0.0));
        assert_eq!(q.best_action(&"nowhere"), (0, 0.0));
    }

    #[test]
    #[should_panic(expected = "Invalid action")]
    fn q_table_rejects_out_of_range_write() {
        let mut q = QTable::new(index(), 2);
        q.set(&"a", 2, 1.0);
    }

    #[test]
    fn q_table_to_value_table() {
        let mut q = QTable::new(index(), 2);
        q.set(&"a", 1, 3.0);
        q.set(&"b", 0, -2.0);
        q.set(&"b", 1, -1.0);
        q.set(&"c", 0, 7.0);

        let v = q.to_value_table(|s| *s == "c");
        assert_eq!(v.get(&"a"), 3.0);
        assert_eq!(v.get(&"b"), -1.0);
        assert_eq!(v.get(&"c"), 0.0, "terminal pinned to zero");
    }
}
