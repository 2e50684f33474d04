use std::thread::JoinHandle;

use tokio::sync::{mpsc, oneshot};

use crate::command::ClusterCommand;
use crate::error::{Result, SimError};

use super::controller::ClusterController;
use super::state::ClusterStatus;

/// Requests processed by the cluster service loop.
#[derive(Debug)]
pub enum ClusterMessage {
    /// Apply a command and report the outcome.
    Apply {
        command: ClusterCommand,
        response_tx: oneshot::Sender<Result<ClusterStatus>>,
    },
    /// Report the current membership.
    Status {
        response_tx: oneshot::Sender<ClusterStatus>,
    },
}

/// Cloneable handle for submitting work to a running [`ClusterService`].
#[derive(Debug, Clone)]
pub struct ClusterHandle {
    message_tx: mpsc::Sender<ClusterMessage>,
}

impl ClusterHandle {
    /// Queue a command and wait until it has been fully applied.
    pub async fn apply(&self, command: ClusterCommand) -> Result<ClusterStatus> {
        let (response_tx, response_rx) = oneshot::channel();
        self.message_tx
            .send(ClusterMessage::Apply {
                command,
                response_tx,
            })
            .await
            .map_err(|_| SimError::ServiceClosed)?;
        response_rx.await.map_err(|_| SimError::ServiceClosed)?
    }

    pub async fn status(&self) -> Result<ClusterStatus> {
        let (response_tx, response_rx) = oneshot::channel();
        self.message_tx
            .send(ClusterMessage::Status { response_tx })
            .await
            .map_err(|_| SimError::ServiceClosed)?;
        response_rx.await.map_err(|_| SimError::ServiceClosed)
    }
}

/// Single writer in front of a [`ClusterController`].
///
/// The controller pauses with blocking sleeps, so the loop runs on its own OS
/// thread and drains an mpsc queue: callers on any task get strictly
/// sequential, one-at-a-time command processing.
pub struct ClusterService {
    controller: ClusterController,
    message_rx: mpsc::Receiver<ClusterMessage>,
}

impl ClusterService {
    pub fn new(controller: ClusterController) -> (Self, ClusterHandle) {
        let (message_tx, message_rx) = mpsc::channel(100);
        (
            Self {
                controller,
                message_rx,
            },
            ClusterHandle { message_tx },
        )
    }

    /// Start the loop on a dedicated thread and return a handle to it.
    ///
    /// The thread exits, flushing the sink, once every handle is dropped.
    pub fn spawn(controller: ClusterController) -> Result<(ClusterHandle, JoinHandle<()>)> {
        let (service, handle) = Self::new(controller);
        let join = std::thread::Builder::new()
            .name("cluster-service".to_string())
            .spawn(move || service.run())?;
        Ok((handle, join))
    }

    /// Process messages until all handles are gone.
    pub fn run(mut self) {
        tracing::info!("Cluster service started");
        while let Some(msg) = self.message_rx.blocking_recv() {
            match msg {
                ClusterMessage::Apply {
                    command,
                    response_tx,
                } => {
                    tracing::debug!(command = %command, "Applying command");
                    let result = self
                        .controller
                        .apply(&command)
                        .map(|()| self.controller.status());
                    if let Err(e) = &result {
                        tracing::warn!(command = %command, error = %e, "Command failed");
                    }
                    let _ = response_tx.send(result);
                }
                ClusterMessage::Status { response_tx } => {
                    let _ = response_tx.send(self.controller.status());
                }
            }
        }
        self.controller.finish();
        tracing::info!("Cluster service stopped");
    }
}
