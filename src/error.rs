use thiserror::Error;

/// Errors raised by fallible constructors
///
/// The solvers themselves never fail; they degrade to a defined fallback and report through `log`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A decay schedule whose rate disagrees with the direction from `vi` to `vf`
    #[error("`vi - vf` must have the same sign as `rate` (rate = {rate}, vi = {vi}, vf = {vf})")]
    InvalidDecay { rate: f64, vi: f64, vf: f64 },

    /// A map row contains a character that is not a known square
    #[error("unknown square `{square}` at row {row}, column {col}")]
    UnknownSquare { square: char, row: usize, col: usize },

    /// A map whose rows do not all have the same width
    #[error("map must be rectangular, row {row} has width {width} (expected {expected})")]
    RaggedMap {
        row: usize,
        width: usize,
        expected: usize,
    },

    /// A map with no squares at all
    #[error("map is empty")]
    EmptyMap,

    /// A map without a start square
    #[error("map has no start square")]
    NoStart,

    /// An invalid parameter for a generated model
    #[error("invalid value for `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
