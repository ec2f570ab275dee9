pub mod chain;
pub mod frozen_lake;
pub mod random;

pub use chain::chain;
pub use frozen_lake::{FLAction, FrozenLake};
pub use random::RandomMdp;
