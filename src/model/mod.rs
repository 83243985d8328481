pub mod board;
pub mod config;
pub mod stats;
pub mod task;

pub use board::*;
pub use config::*;
pub use stats::*;
pub use task::*;
