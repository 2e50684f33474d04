use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::topology::{Color, ColorTarget, NodeId};

/// Why a script line was not turned into a command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("blank line")]
    Empty,

    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("'{action}' expects {expected} argument(s), got {found}")]
    Arity {
        action: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("invalid duration '{0}'")]
    InvalidDuration(String),
}

/// Commands addressed straight to the topology.
#[derive(Debug, Clone, PartialEq)]
pub enum TopologyCommand {
    /// `new <id>`
    New(NodeId),
    /// `connect <id1> <id2>`
    Connect(NodeId, NodeId),
    /// `color <target> <colorname>`
    Color { target: ColorTarget, color: Color },
    /// `kill <id>`
    Kill(NodeId),
    /// `sleep <seconds>`
    Sleep(Duration),
}

/// Commands addressed to the election state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterCommand {
    /// `new <id>`
    New(NodeId),
    /// `election`
    Election,
    /// `kill <id>`
    Kill(NodeId),
    /// `kill_leader`
    KillLeader,
}

fn split(line: &str) -> Result<(&str, Vec<&str>), CommandParseError> {
    let mut parts = line.split_whitespace();
    let action = parts.next().ok_or(CommandParseError::Empty)?;
    Ok((action, parts.collect()))
}

fn expect_args(action: &'static str, args: &[&str], expected: usize) -> Result<(), CommandParseError> {
    if args.len() != expected {
        return Err(CommandParseError::Arity {
            action,
            expected,
            found: args.len(),
        });
    }
    Ok(())
}

fn parse_seconds(text: &str) -> Result<Duration, CommandParseError> {
    text.parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| CommandParseError::InvalidDuration(text.to_string()))
}

impl FromStr for TopologyCommand {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (action, args) = split(line)?;
        match action {
            "new" => {
                expect_args("new", &args, 1)?;
                Ok(TopologyCommand::New(args[0].to_string()))
            }
            "connect" => {
                expect_args("connect", &args, 2)?;
                Ok(TopologyCommand::Connect(
                    args[0].to_string(),
                    args[1].to_string(),
                ))
            }
            "color" => {
                expect_args("color", &args, 2)?;
                Ok(TopologyCommand::Color {
                    target: ColorTarget::parse(args[0]),
                    color: Color::new(args[1]),
                })
            }
            "kill" => {
                expect_args("kill", &args, 1)?;
                Ok(TopologyCommand::Kill(args[0].to_string()))
            }
            "sleep" => {
                expect_args("sleep", &args, 1)?;
                Ok(TopologyCommand::Sleep(parse_seconds(args[0])?))
            }
            other => Err(CommandParseError::UnknownAction(other.to_string())),
        }
    }
}

impl FromStr for ClusterCommand {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (action, args) = split(line)?;
        match action {
            "new" => {
                expect_args("new", &args, 1)?;
                Ok(ClusterCommand::New(args[0].to_string()))
            }
            "election" => {
                expect_args("election", &args, 0)?;
                Ok(ClusterCommand::Election)
            }
            "kill" => {
                expect_args("kill", &args, 1)?;
                Ok(ClusterCommand::Kill(args[0].to_string()))
            }
            "kill_leader" => {
                expect_args("kill_leader", &args, 0)?;
                Ok(ClusterCommand::KillLeader)
            }
            other => Err(CommandParseError::UnknownAction(other.to_string())),
        }
    }
}

impl std::fmt::Display for TopologyCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopologyCommand::New(id) => write!(f, "new {}", id),
            TopologyCommand::Connect(a, b) => write!(f, "connect {} {}", a, b),
            TopologyCommand::Color { target, color } => write!(f, "color {} {}", target, color),
            TopologyCommand::Kill(id) => write!(f, "kill {}", id),
            TopologyCommand::Sleep(d) => write!(f, "sleep {}", d.as_secs_f64()),
        }
    }
}

impl std::fmt::Display for ClusterCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClusterCommand::New(id) => write!(f, "new {}", id),
            ClusterCommand::Election => write!(f, "election"),
            ClusterCommand::Kill(id) => write!(f, "kill {}", id),
            ClusterCommand::KillLeader => write!(f, "kill_leader"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_topology_commands() {
        assert_eq!(
            "new n1".parse::<TopologyCommand>(),
            Ok(TopologyCommand::New("n1".to_string()))
        );
        assert_eq!(
            "  connect   n1 n2 ".parse::<TopologyCommand>(),
            Ok(TopologyCommand::Connect("n1".to_string(), "n2".to_string()))
        );
        assert_eq!(
            "color all-n1 red".parse::<TopologyCommand>(),
            Ok(TopologyCommand::Color {
                target: ColorTarget::AllExcept("n1".to_string()),
                color: Color::new("red"),
            })
        );
        assert_eq!(
            "kill n2".parse::<TopologyCommand>(),
            Ok(TopologyCommand::Kill("n2".to_string()))
        );
        assert_eq!(
            "sleep 2".parse::<TopologyCommand>(),
            Ok(TopologyCommand::Sleep(Duration::from_secs(2)))
        );
        assert_eq!(
            "sleep 0.5".parse::<TopologyCommand>(),
            Ok(TopologyCommand::Sleep(Duration::from_millis(500)))
        );
    }

    #[test]
    fn test_parse_cluster_commands() {
        assert_eq!(
            "new node1".parse::<ClusterCommand>(),
            Ok(ClusterCommand::New("node1".to_string()))
        );
        assert_eq!("election".parse::<ClusterCommand>(), Ok(ClusterCommand::Election));
        assert_eq!(
            "kill node1".parse::<ClusterCommand>(),
            Ok(ClusterCommand::Kill("node1".to_string()))
        );
        assert_eq!(
            "kill_leader".parse::<ClusterCommand>(),
            Ok(ClusterCommand::KillLeader)
        );
    }

    #[test]
    fn test_blank_line() {
        assert_eq!("   ".parse::<ClusterCommand>(), Err(CommandParseError::Empty));
        assert_eq!("".parse::<TopologyCommand>(), Err(CommandParseError::Empty));
    }

    #[test]
    fn test_unknown_action() {
        assert_eq!(
            "explode n1".parse::<ClusterCommand>(),
            Err(CommandParseError::UnknownAction("explode".to_string()))
        );
        // Topology-only actions are unknown at the cluster level and vice versa.
        assert!(matches!(
            "connect a b".parse::<ClusterCommand>(),
            Err(CommandParseError::UnknownAction(_))
        ));
        assert!(matches!(
            "election".parse::<TopologyCommand>(),
            Err(CommandParseError::UnknownAction(_))
        ));
    }

    #[test]
    fn test_wrong_arity() {
        assert_eq!(
            "new".parse::<ClusterCommand>(),
            Err(CommandParseError::Arity {
                action: "new",
                expected: 1,
                found: 0
            })
        );
        assert_eq!(
            "election now".parse::<ClusterCommand>(),
            Err(CommandParseError::Arity {
                action: "election",
                expected: 0,
                found: 1
            })
        );
        assert!(matches!(
            "connect a".parse::<TopologyCommand>(),
            Err(CommandParseError::Arity { .. })
        ));
    }

    #[test]
    fn test_invalid_sleep() {
        for line in ["sleep soon", "sleep -1", "sleep NaN"] {
            assert!(matches!(
                line.parse::<TopologyCommand>(),
                Err(CommandParseError::InvalidDuration(_))
            ));
        }
    }

    #[test]
    fn test_display_round_trips() {
        for line in ["new n1", "connect a b", "color all-a blue", "kill b", "sleep 1.5"] {
            let cmd: TopologyCommand = line.parse().unwrap();
            assert_eq!(cmd.to_string(), line);
        }
        for line in ["new n1", "election", "kill n1", "kill_leader"] {
            let cmd: ClusterCommand = line.parse().unwrap();
            assert_eq!(cmd.to_string(), line);
        }
    }
}
