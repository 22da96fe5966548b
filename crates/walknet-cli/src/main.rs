use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use walknet_cli::commands::loops::{handle_loop, handle_loop_estimate, LoopArgs, LoopEstimateArgs};
use walknet_cli::commands::route::{handle_route, RouteArgs};
use walknet_cli::commands::stats::{handle_stats, StatsArgs};
use walknet_cli::commands::open_engine;
use walknet_cli::output::OutputFormat;
use walknet_lib::{EngineConfig, ResolverKind};

#[derive(Parser, Debug)]
#[command(author, version, about = "Walking route and loop planner")]
struct Cli {
    /// SQLite network catalog with walking_nodes and walking_links tables.
    #[arg(long, env = "WALKNET_DATABASE", global = true, required = false)]
    database: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Rows fetched per catalog page while building the graph.
    #[arg(long, global = true)]
    page_size: Option<usize>,

    /// Nearest-node strategy: linear or kd-tree.
    #[arg(long, global = true)]
    resolver: Option<ResolverKind>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report node and edge counts, or list the nodes of one district.
    Stats(StatsArgs),
    /// Compute the shortest walking route between two coordinates.
    Route(RouteArgs),
    /// Check whether a loop through a via point is possible and suggest a length.
    LoopEstimate(LoopEstimateArgs),
    /// Generate a closed walking loop of roughly the requested length.
    Loop(LoopArgs),
}

impl Cli {
    fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::from_env();
        if let Some(page_size) = self.page_size {
            config = config.with_page_size(page_size);
        }
        if let Some(resolver) = self.resolver {
            config = config.with_resolver(resolver);
        }
        config
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let engine = open_engine(&cli.database, cli.engine_config())?;
    match &cli.command {
        Command::Stats(args) => handle_stats(&engine, args, cli.format),
        Command::Route(args) => handle_route(&engine, args, cli.format),
        Command::LoopEstimate(args) => handle_loop_estimate(&engine, args, cli.format),
        Command::Loop(args) => handle_loop(&engine, args, cli.format),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
