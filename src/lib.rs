pub mod cluster;
pub mod command;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod pacing;
pub mod random;
pub mod shutdown;
pub mod sink;
pub mod topology;

pub use error::{Result, SimError};
