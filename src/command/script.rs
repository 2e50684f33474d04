use std::path::Path;
use std::str::FromStr;

use crate::cluster::ClusterController;
use crate::config::ReplayConfig;
use crate::error::Result;
use crate::pacing::Pacer;
use crate::topology::TopologyStore;

use super::parse::{ClusterCommand, CommandParseError, TopologyCommand};

/// Parse every line of a script up front.
///
/// Blank lines are dropped quietly; malformed lines and unknown actions are
/// logged at debug level and skipped.
pub fn parse_script<C>(text: &str) -> Vec<C>
where
    C: FromStr<Err = CommandParseError>,
{
    text.lines()
        .enumerate()
        .filter_map(|(index, line)| match line.parse::<C>() {
            Ok(command) => Some(command),
            Err(CommandParseError::Empty) => None,
            Err(e) => {
                tracing::debug!(line = index + 1, text = line.trim(), error = %e, "Skipping script line");
                None
            }
        })
        .collect()
}

pub fn read_script<C>(path: &Path) -> Result<Vec<C>>
where
    C: FromStr<Err = CommandParseError>,
{
    let text = std::fs::read_to_string(path)?;
    let commands = parse_script(&text);
    tracing::info!(path = %path.display(), commands = commands.len(), "Loaded script");
    Ok(commands)
}

/// Outcome counts of one replay.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: usize,
    pub failed: usize,
}

impl ReplaySummary {
    fn record(&mut self, command: &dyn std::fmt::Display, result: Result<()>) {
        match result {
            Ok(()) => self.applied += 1,
            Err(e) => {
                tracing::warn!(command = %command, error = %e, "Command failed, continuing");
                self.failed += 1;
            }
        }
    }
}

/// Drives topology-level commands straight into a [`TopologyStore`].
pub struct TopologyReplay {
    store: TopologyStore,
    pacer: Box<dyn Pacer>,
    replay: ReplayConfig,
}

impl TopologyReplay {
    pub fn new(store: TopologyStore, pacer: Box<dyn Pacer>, replay: ReplayConfig) -> Self {
        Self {
            store,
            pacer,
            replay,
        }
    }

    pub fn apply(&mut self, command: &TopologyCommand) -> Result<()> {
        match command {
            TopologyCommand::New(id) => self.store.add_node(id)?,
            TopologyCommand::Connect(a, b) => self.store.add_edge(a, b, true),
            TopologyCommand::Color { target, color } => self.store.set_color(target, color.clone()),
            TopologyCommand::Kill(id) => self.store.remove_node(id),
            TopologyCommand::Sleep(duration) => self.pacer.pause(*duration),
        }
        Ok(())
    }

    /// Apply every command, then hold the final frame for the configured delay.
    pub fn run(&mut self, commands: &[TopologyCommand]) -> ReplaySummary {
        let mut summary = ReplaySummary::default();
        for command in commands {
            summary.record(command, self.apply(command));
        }
        self.pacer.pause(self.replay.final_delay());
        self.store.finish();
        tracing::info!(
            applied = summary.applied,
            failed = summary.failed,
            frames = self.store.frame(),
            "Topology replay finished"
        );
        summary
    }

    pub fn store(&self) -> &TopologyStore {
        &self.store
    }
}

/// Feed cluster-level commands into `controller`, then hold the final frame.
pub fn replay_cluster(
    controller: &mut ClusterController,
    commands: &[ClusterCommand],
    replay: &ReplayConfig,
) -> ReplaySummary {
    let mut summary = ReplaySummary::default();
    for command in commands {
        summary.record(command, controller.apply(command));
    }
    controller.wait(replay.final_delay());
    controller.finish();
    tracing::info!(
        applied = summary.applied,
        failed = summary.failed,
        members = controller.nodes().len(),
        leader = ?controller.leader(),
        "Cluster replay finished"
    );
    summary
}
