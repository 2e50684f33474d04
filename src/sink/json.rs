use std::io::Write;

use crate::topology::TopologySnapshot;

use super::SnapshotSink;

/// Writes each frame as a single line of JSON.
///
/// Write failures are logged and the frame is dropped; the replay keeps going.
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_frame(&mut self, snapshot: &TopologySnapshot) -> crate::error::Result<()> {
        serde_json::to_writer(&mut self.writer, snapshot)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

impl JsonLinesSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> SnapshotSink for JsonLinesSink<W> {
    fn publish(&mut self, snapshot: &TopologySnapshot) {
        if let Err(e) = self.write_frame(snapshot) {
            tracing::warn!(frame = snapshot.frame, error = %e, "Failed to write snapshot");
        }
    }

    fn finish(&mut self) {
        if let Err(e) = self.writer.flush() {
            tracing::warn!(error = %e, "Failed to flush snapshot output");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{Color, NodeView, Position};

    #[test]
    fn test_one_line_per_frame() {
        let mut sink = JsonLinesSink::new(Vec::new());
        let snapshot = TopologySnapshot {
            frame: 1,
            nodes: vec![NodeView {
                id: "n1".to_string(),
                position: Position::new(2.0, 7.0),
                color: Color::gray(),
            }],
            ..TopologySnapshot::empty(20)
        };
        sink.publish(&snapshot);
        sink.publish(&TopologySnapshot {
            frame: 2,
            ..snapshot.clone()
        });
        sink.finish();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: TopologySnapshot = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.frame, 1);
        assert_eq!(parsed.nodes, snapshot.nodes);
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["frame"], 2);
    }
}
