pub mod board;
pub mod remote;

pub use board::TestBoard;
pub use remote::{InMemoryEntityStore, StageWrite};
