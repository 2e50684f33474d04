use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use election_sim::cluster::{ClusterController, ClusterService};
use election_sim::command::{
    read_script, replay_cluster, ClusterCommand, RandomScenario, ReplaySummary, TopologyCommand,
    TopologyReplay,
};
use election_sim::config::{SimConfig, TopologyConfig, DEFAULT_MIN_DISTANCE};
use election_sim::dashboard::{run_dashboard, DashboardState};
use election_sim::random::{rng_for, source_for, PLACEMENT_STREAM, SCENARIO_STREAM};
use election_sim::shutdown::install_shutdown_handler;
use election_sim::sink::{FanoutSink, JsonLinesSink, PacedSink, SnapshotSink, TableSink, WatchSink};
use election_sim::topology::TopologyStore;

#[derive(Parser, Debug)]
#[command(name = "election-sim")]
#[command(version)]
#[command(about = "Step-by-step replay of a cluster leader-election lifecycle")]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Replay a topology script (new, connect, color, kill, sleep)
    Topology {
        /// Path to the script, one command per line
        script: PathBuf,

        #[command(flatten)]
        sim: SimArgs,
    },

    /// Replay a cluster script (new, election, kill, kill_leader)
    Cluster {
        /// Path to the script, one command per line
        script: PathBuf,

        #[command(flatten)]
        sim: SimArgs,
    },

    /// Generate and replay a random churn scenario
    Random {
        /// Number of generated commands after the initial members
        #[arg(long, default_value = "50")]
        commands: usize,

        /// Size of the node name pool (node1..nodeN)
        #[arg(long, default_value = "10")]
        max_nodes: usize,

        #[command(flatten)]
        sim: SimArgs,
    },

    /// Run a live cluster behind the web dashboard
    Serve(ServeArgs),
}

// =============================================================================
// Shared Arguments
// =============================================================================

#[derive(Parser, Debug)]
struct SimArgs {
    /// Side length of the canvas (defaults to 20 for topology, 40 for cluster replays)
    #[arg(long)]
    canvas_size: Option<u32>,

    /// Minimum distance between any two nodes
    #[arg(long, default_value_t = DEFAULT_MIN_DISTANCE)]
    min_distance: f64,

    /// Seed for placement, elections and scenarios
    #[arg(long)]
    seed: Option<u64>,

    /// Skip every pause
    #[arg(long)]
    fast: bool,

    /// Pause after each published frame, in milliseconds (default 500)
    #[arg(long)]
    frame_pause_ms: Option<u64>,

    /// Hold the final frame for this many milliseconds
    #[arg(long)]
    final_delay_ms: Option<u64>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

impl SimArgs {
    fn config(&self, mut topology: TopologyConfig) -> SimConfig {
        if let Some(size) = self.canvas_size {
            topology.canvas_size = size;
        }
        topology.min_distance = self.min_distance;

        let mut config = SimConfig::new(topology);
        config.seed = self.seed;
        if let Some(ms) = self.frame_pause_ms {
            config.replay.frame_pause_ms = ms;
        }
        if let Some(ms) = self.final_delay_ms {
            config.replay.final_delay_ms = ms;
        }
        if self.fast {
            config = config.without_pauses();
        }
        config
    }

    fn output_sink(&self, config: &SimConfig) -> Box<dyn SnapshotSink> {
        let sink: Box<dyn SnapshotSink> = match self.output {
            OutputFormat::Table => Box::new(TableSink::stdout()),
            OutputFormat::Json => Box::new(JsonLinesSink::stdout()),
        };
        let pause = config.replay.frame_pause();
        if pause.is_zero() {
            sink
        } else {
            Box::new(PacedSink::new(sink, config.pacer(), pause))
        }
    }
}

// =============================================================================
// Serve Arguments
// =============================================================================

#[derive(Parser, Debug)]
struct ServeArgs {
    /// Port for the web dashboard
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Cluster script to feed into the live cluster on startup
    #[arg(long)]
    script: Option<PathBuf>,

    /// Also print every frame to stdout
    #[arg(long)]
    echo: bool,

    #[command(flatten)]
    sim: SimArgs,
}

// =============================================================================
// Replay Implementations
// =============================================================================

fn run_topology(script: PathBuf, sim: SimArgs) -> election_sim::Result<ReplaySummary> {
    let config = sim.config(TopologyConfig::default());
    let commands: Vec<TopologyCommand> = read_script(&script)?;

    tracing::info!(
        script = %script.display(),
        canvas_size = config.topology.canvas_size,
        seed = ?config.seed,
        "Starting topology replay"
    );

    let store = TopologyStore::new(
        &config.topology,
        source_for(config.seed, PLACEMENT_STREAM),
        sim.output_sink(&config),
    );
    let mut replay = TopologyReplay::new(store, config.pacer(), config.replay.clone());
    Ok(replay.run(&commands))
}

fn run_cluster(commands: Vec<ClusterCommand>, sim: SimArgs) -> ReplaySummary {
    let config = sim.config(TopologyConfig::cluster());

    tracing::info!(
        commands = commands.len(),
        canvas_size = config.topology.canvas_size,
        seed = ?config.seed,
        "Starting cluster replay"
    );

    let mut controller =
        ClusterController::from_config(&config, sim.output_sink(&config), config.pacer());
    replay_cluster(&mut controller, &commands, &config.replay)
}

fn run_random(
    commands: usize,
    max_nodes: usize,
    sim: SimArgs,
) -> election_sim::Result<ReplaySummary> {
    let mut rng = rng_for(sim.seed, SCENARIO_STREAM);
    let scenario = RandomScenario::new(commands, max_nodes).generate(&mut rng)?;
    tracing::info!(commands, max_nodes, "Generated random scenario");
    Ok(run_cluster(scenario, sim))
}

fn print_summary(summary: &ReplaySummary, output: &OutputFormat) {
    if let OutputFormat::Table = output {
        println!(
            "Replay finished: {} applied, {} failed",
            summary.applied, summary.failed
        );
    }
}

// =============================================================================
// Server Implementation
// =============================================================================

async fn run_serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.sim.config(TopologyConfig::cluster());
    let dashboard_addr: SocketAddr = format!("0.0.0.0:{}", args.port).parse()?;

    let (watch_sink, topology_rx) = WatchSink::new(config.topology.canvas_size);
    let mut sink = FanoutSink::new().with(watch_sink);
    if args.echo {
        sink = sink.with(args.sim.output_sink(&config));
    }

    let controller = ClusterController::from_config(&config, Box::new(sink), config.pacer());
    let (handle, service_thread) = ClusterService::spawn(controller)?;
    let shutdown = install_shutdown_handler();

    tracing::info!(
        dashboard_addr = %dashboard_addr,
        canvas_size = config.topology.canvas_size,
        seed = ?config.seed,
        "Starting election-sim server"
    );

    let script_task = match &args.script {
        Some(path) => {
            let commands: Vec<ClusterCommand> = read_script(path)?;
            let handle = handle.clone();
            Some(tokio::spawn(async move {
                for command in commands {
                    if let Err(e) = handle.apply(command.clone()).await {
                        tracing::warn!(command = %command, error = %e, "Scripted command failed");
                    }
                }
                tracing::info!("Startup script finished");
            }))
        }
        None => None,
    };

    let state = DashboardState {
        cluster: handle,
        topology: topology_rx,
        shutdown,
    };
    run_dashboard(dashboard_addr, state).await;

    if let Some(task) = script_task {
        task.abort();
        let _ = task.await;
    }

    // The service thread exits once the last handle is gone; a command that is
    // mid-pause still completes first.
    tokio::task::spawn_blocking(move || {
        if service_thread.join().is_err() {
            tracing::error!("Cluster service thread panicked");
        }
    })
    .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // stdout carries the frames, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Commands::Topology { script, sim } => {
            let output = sim.output.clone();
            let summary = tokio::task::spawn_blocking(move || run_topology(script, sim)).await??;
            print_summary(&summary, &output);
        }
        Commands::Cluster { script, sim } => {
            let output = sim.output.clone();
            let summary = tokio::task::spawn_blocking(move || {
                let commands: Vec<ClusterCommand> = read_script(&script)?;
                Ok::<_, election_sim::SimError>(run_cluster(commands, sim))
            })
            .await??;
            print_summary(&summary, &output);
        }
        Commands::Random {
            commands,
            max_nodes,
            sim,
        } => {
            let output = sim.output.clone();
            let summary =
                tokio::task::spawn_blocking(move || run_random(commands, max_nodes, sim)).await??;
            print_summary(&summary, &output);
        }
        Commands::Serve(serve_args) => {
            run_serve(serve_args).await?;
        }
    }

    Ok(())
}
