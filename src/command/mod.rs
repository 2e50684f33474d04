//! Command surface of the replay.
//!
//! Script lines are parsed once into [`TopologyCommand`] or [`ClusterCommand`]
//! and then replayed in order. Malformed lines never reach the engine.

pub mod parse;
pub mod scenario;
pub mod script;

pub use parse::{ClusterCommand, CommandParseError, TopologyCommand};
pub use scenario::RandomScenario;
pub use script::{parse_script, read_script, replay_cluster, ReplaySummary, TopologyReplay};
