pub mod controller;
pub mod service;
pub mod state;

pub use controller::ClusterController;
pub use service::{ClusterHandle, ClusterMessage, ClusterService};
pub use state::{ClusterPhase, ClusterStatus};
