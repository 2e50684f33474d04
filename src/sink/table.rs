use std::io::Write;

use crate::topology::TopologySnapshot;

use super::SnapshotSink;

/// Prints each frame as a small text table.
pub struct TableSink<W> {
    writer: W,
}

impl<W: Write + Send> TableSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_frame(&mut self, snapshot: &TopologySnapshot) -> std::io::Result<()> {
        writeln!(
            self.writer,
            "Frame {} (canvas {}x{})",
            snapshot.frame, snapshot.canvas_size, snapshot.canvas_size
        )?;
        writeln!(self.writer, "{}", "=".repeat(40))?;

        if snapshot.nodes.is_empty() {
            writeln!(self.writer, "No nodes.")?;
        } else {
            writeln!(self.writer, "{:<16} {:<12} COLOR", "NODE", "POSITION")?;
            writeln!(self.writer, "{}", "-".repeat(40))?;
            for node in &snapshot.nodes {
                let position = format!("({}, {})", node.position.x, node.position.y);
                writeln!(self.writer, "{:<16} {:<12} {}", node.id, position, node.color)?;
            }
        }

        if !snapshot.edges.is_empty() {
            let edges: Vec<String> = snapshot
                .edges
                .iter()
                .map(|e| format!("{}-{}", e.source, e.target))
                .collect();
            writeln!(self.writer, "Edges: {}", edges.join(", "))?;
        }
        writeln!(self.writer)?;
        Ok(())
    }
}

impl TableSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> SnapshotSink for TableSink<W> {
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
