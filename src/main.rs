//! xcgraph CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod manifest;

use commands::{GraphFormat, QueryKind};

#[derive(Parser)]
#[command(name = "xcgraph")]
#[command(about = "Load and query project dependency graphs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Manifest declaring the projects and an optional workspace
    #[arg(
        short,
        long,
        global = true,
        env = "XCGRAPH_MANIFEST",
        default_value = "xcgraph.yaml"
    )]
    manifest: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the graph and print a summary
    Load,
    /// Print the loaded graph
    Graph {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = GraphFormat::Json)]
        format: GraphFormat,
    },
    /// Run a traversal query and print the result as JSON
    Query {
        /// The query to run
        #[arg(value_enum)]
        kind: QueryKind,

        /// Project directory owning the target
        #[arg(short, long)]
        project: PathBuf,

        /// Target name, required by target-scoped queries
        #[arg(short, long)]
        target: Option<String>,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("xcgraph={}", log_level)));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("xcgraph v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Manifest: {}", cli.manifest.display());

    match cli.command {
        Commands::Load => commands::load(&cli.manifest).await,
        Commands::Graph { format } => commands::graph(&cli.manifest, format).await,
        Commands::Query {
            kind,
            project,
            target,
        } => commands::query(&cli.manifest, kind, &project, target.as_deref()).await,
        Commands::Version => {
            println!("xcgraph v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
