use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_stream::{wrappers::WatchStream, Stream};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};

use crate::cluster::{ClusterHandle, ClusterStatus};
use crate::command::ClusterCommand;
use crate::error::SimError;
use crate::topology::TopologySnapshot;

#[derive(Clone)]
pub struct DashboardState {
    pub cluster: ClusterHandle,
    pub topology: watch::Receiver<TopologySnapshot>,
    /// Cancelled on shutdown; ends open event streams so the server can drain.
    pub shutdown: CancellationToken,
}

#[derive(Deserialize)]
struct CommandRequest {
    command: String,
}

#[derive(Serialize)]
struct CommandResponse {
    success: bool,
    status: Option<ClusterStatus>,
    error: Option<String>,
}

impl CommandResponse {
    fn failed(code: StatusCode, error: String) -> (StatusCode, Json<Self>) {
        (
            code,
            Json(Self {
                success: false,
                status: None,
                error: Some(error),
            }),
        )
    }
}

/// Routes served by the dashboard, without binding a listener.
pub fn router(state: DashboardState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/cluster", get(cluster_status_handler))
        .route("/api/topology", get(topology_handler))
        .route("/api/events", get(events_handler))
        .route("/api/commands", post(command_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn run_dashboard(addr: SocketAddr, state: DashboardState) {
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Failed to bind dashboard server");
            return;
        }
    };
    serve_dashboard(listener, state).await;
}

/// Serve the dashboard on an already bound listener until `state.shutdown` fires.
pub async fn serve_dashboard(listener: TcpListener, state: DashboardState) {
    let shutdown = state.shutdown.clone();
    let app = router(state);

    match listener.local_addr() {
        Ok(addr) => tracing::info!(addr = %addr, "Starting dashboard server"),
        Err(e) => tracing::warn!(error = %e, "Dashboard listener has no local address"),
    }

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
    {
        tracing::error!(error = %e, "Dashboard server failed");
    }
    tracing::info!("Dashboard server stopped");
}

async fn cluster_status_handler(State(state): State<DashboardState>) -> impl IntoResponse {
    match state.cluster.status().await {
        Ok(status) => (StatusCode::OK, Json(Some(status))),
        Err(e) => {
            tracing::warn!(error = %e, "Cluster status unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, Json(None))
        }
    }
}

async fn topology_handler(State(state): State<DashboardState>) -> impl IntoResponse {
    let snapshot = state.topology.borrow().clone();
    Json(snapshot)
}

async fn events_handler(
    State(state): State<DashboardState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = WatchStream::new(state.topology)
        .take_until(state.shutdown.cancelled_owned())
        .map(|snapshot| {
            let event = Event::default()
                .event("snapshot")
                .id(snapshot.frame.to_string());
            Ok(event.json_data(&snapshot).unwrap_or_else(|e| {
                tracing::warn!(frame = snapshot.frame, error = %e, "Failed to encode snapshot event");
                Event::default().event("error")
            }))
        });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn command_handler(
    State(state): State<DashboardState>,
    Json(payload): Json<CommandRequest>,
) -> impl IntoResponse {
    let result = match payload.command.parse::<ClusterCommand>() {
        Ok(command) => state.cluster.apply(command).await,
        Err(e) => Err(SimError::from(e)),
    };

    match result {
        Ok(status) => (
            StatusCode::OK,
            Json(CommandResponse {
                success: true,
                status: Some(status),
                error: None,
            }),
        ),
        Err(e @ SimError::InvalidCommand(_)) => {
            CommandResponse::failed(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e @ SimError::CapacityExceeded { .. }) => {
            CommandResponse::failed(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        Err(e @ SimError::ServiceClosed) => {
            CommandResponse::failed(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
        Err(e) => CommandResponse::failed(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
