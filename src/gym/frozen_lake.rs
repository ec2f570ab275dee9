use strum::{EnumIter, VariantArray};

use crate::{
    env::Mdp,
    error::{Error, Result},
};

/// The 4x4 lake from Python [gymnasium](https://gymnasium.farama.org/environments/toy_text/frozen_lake/)
pub const MAP_4X4: [&str; 4] = ["SFFF", "FHFH", "FFFH", "HFFG"];

/// The 8x8 lake from Python gymnasium
pub const MAP_8X8: [&str; 8] = [
    "SFFFFFFF", "FFFFFFFF", "FFFHFFFF", "FFFFFHFF", "FFFHFFFF", "FHHFFFHF", "FHFFHFHF", "FFFHFFFG",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Square {
    Frozen = 0,
    Hole = 1,
    Start = 2,
    Goal = 3,
}

impl Square {
    fn parse(c: char) -> Option<Self> {
        match c {
            'F' => Some(Square::Frozen),
            'H' => Some(Square::Hole),
            'S' => Some(Square::Start),
            'G' => Some(Square::Goal),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, EnumIter, VariantArray)]
pub enum FLAction {
    Left = 0,
    Down = 1,
    Right = 2,
    Up = 3,
}

impl FLAction {
    /// The action at index `action`, if any
    pub fn from_index(action: usize) -> Option<Self> {
        Self::VARIANTS.get(action).copied()
    }

    /// The intended direction followed by the two perpendicular ones a slippery lake may substitute
    fn slips(self) -> [Self; 3] {
        let i = self as usize;
        [(i + 3) % 4, i, (i + 1) % 4].map(|j| Self::VARIANTS[j])
    }
}

/// A grid of frozen squares with holes, modeled as an MDP over square indices
///
/// Holes and the goal are terminal; arriving on the goal is worth 1 and everything else 0. Moving into an
/// edge leaves the agent where it is. On a slippery lake the intended move happens with probability 1/3,
/// and each perpendicular move with probability 1/3.
///
/// Intended for use with any of the solvers, e.g. [`value_iteration`](crate::value_iteration)
#[derive(Debug, Clone)]
pub struct FrozenLake {
    map: Vec<Square>,
    width: usize,
    slippery: bool,
}

impl FrozenLake {
    /// The deterministic 4x4 lake
    pub fn new() -> Self {
        Self::from_map(&MAP_4X4).expect("built-in map is valid")
    }

    /// Parse a lake from rows of `S`, `F`, `H` and `G`
    pub fn from_map(rows: &[&str]) -> Result<Self> {
        let width = rows.first().map_or(0, |row| row.chars().count());
        if width == 0 {
            return Err(Error::EmptyMap);
        }

        let mut map = Vec::with_capacity(width * rows.len());
        for (row, line) in rows.iter().enumerate() {
            let len = line.chars().count();
            if len != width {
                return Err(Error::RaggedMap {
                    row,
                    width: len,
                    expected: width,
                });
            }
            for (col, c) in line.chars().enumerate() {
                let square = Square::parse(c).ok_or(Error::UnknownSquare { square: c, row, col })?;
                map.push(square);
            }
        }

        if !map.contains(&Square::Start) {
            return Err(Error::NoStart);
        }

        Ok(Self {
            map,
            width,
            slippery: false,
        })
    }

    /// Make moves slip to a perpendicular direction two times out of three
    pub fn slippery(mut self, slippery: bool) -> Self {
        self.slippery = slippery;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.map.len() / self.width
    }

    pub fn square(&self, pos: usize) -> Square {
        self.map[pos]
    }

    fn step(&self, pos: usize, action: FLAction) -> usize {
        let (row, col) = (pos / self.width, pos % self.width);
        match action {
            FLAction::Left if col > 0 => pos - 1,
            FLAction::Down if row + 1 < self.height() => pos + self.width,
            FLAction::Right if col + 1 < self.width => pos + 1,
            FLAction::Up if row > 0 => pos - self.width,
            _ => pos,
        }
    }
}

impl Default for FrozenLake {
    fn default() -> Self {
        Self::new()
    }
}

impl Mdp for FrozenLake {
    type State = usize;

    fn states(&self) -> Vec<usize> {
        (0..self.map.len()).collect()
    }

    fn num_actions(&self) -> usize {
        FLAction::VARIANTS.len()
    }

    fn is_terminal(&self, state: &usize) -> bool {
        match self.map[*state] {
            Square::Frozen | Square::Start => false,
            Square::Hole | Square::Goal => true,
        }
    }

    fn start_states(&self) -> Vec<usize> {
        (0..self.map.len())
            .filter(|&pos| self.map[pos] == Square::Start)
            .collect()
    }

    fn transitions(&self, state: &usize, action: usize) -> Vec<(usize, f64)> {
        let Some(action) = FLAction::from_index(action) else {
            return vec![];
        };
        if self.is_terminal(state) {
            return vec![];
        }
        if !self.slippery {
            return vec![(self.step(*state, action), 1.0)];
        }

        let mut outcomes: Vec<(usize, f64)> = Vec::with_capacity(3);
        for direction in action.slips() {
            let next = self.step(*state, direction);
            match outcomes.iter_mut().find(|(s, _)| *s == next) {
                Some((_, p)) => *p += 1.0 / 3.0,
                None => outcomes.push((next, 1.0 / 3.0)),
            }
        }
        outcomes
    }

    fn reward(&self, state: &usize) -> f64 {
        if self.map[*state] == Square::Goal {
            1.0
        } else {
            0.0
        }
    }
}
