//! RefGraph command line
//!
//! - `build`: load the journal data directory, traverse from a seed paper,
//!   assemble the citation graph and write a snapshot
//! - `venues`: rank venues for an existing snapshot

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use refgraph_common::config::{AppConfig, ObservabilityConfig};
use refgraph_common::errors::{AppError, Result};
use refgraph_common::{metrics, JournalDataStore, PaperId, VenueIndex, VERSION};
use refgraph_engine::popularity::{rank_venues, VenueRanking};
use refgraph_engine::{build_citation_graph, AssemblerConfig, GraphSnapshot};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "refgraph", version, about = "Build citation graphs from local journal data")]
struct Cli {
    /// Configuration file (defaults to config/{default,APP_ENV,local})
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Traverse references from a seed paper and write a graph snapshot
    Build(BuildArgs),
    /// Rank venues by unresolved papers in a snapshot
    Venues(VenuesArgs),
}

#[derive(Debug, Args)]
struct BuildArgs {
    /// Seed paper DOI
    #[arg(long)]
    seed: String,

    /// Maximum traversal depth
    #[arg(long)]
    depth: Option<u32>,

    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Drop self-citation edges
    #[arg(long)]
    drop_self_loops: bool,

    /// Venues to list after the build
    #[arg(long)]
    top_venues: Option<usize>,
}

#[derive(Debug, Args)]
struct VenuesArgs {
    #[arg(long)]
    snapshot: PathBuf,

    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[arg(long)]
    top: Option<usize>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("refgraph: {}", e);
            return exit_code(&e);
        }
    };

    init_tracing(&config.observability);
    info!(
        service = %config.observability.service_name,
        "Starting RefGraph v{}",
        VERSION
    );

    if let Err(e) = init_metrics(&config.observability) {
        e.log();
        return exit_code(&e);
    }

    let outcome = match cli.command {
        Command::Build(args) => run_build(args, config).await,
        Command::Venues(args) => run_venues(args, config).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.log();
            exit_code(&e)
        }
    }
}

fn load_config(path: Option<&str>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::load(),
    }
}

fn init_tracing(observability: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&observability.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn init_metrics(observability: &ObservabilityConfig) -> Result<()> {
    if observability.metrics_port == 0 {
        return Ok(());
    }

    let addr: SocketAddr = ([0, 0, 0, 0], observability.metrics_port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets(metrics::STAGE_BUCKETS)
        .context("Invalid histogram buckets")?
        .install()
        .context("Failed to install Prometheus exporter")?;

    metrics::register_metrics();
    info!(%addr, "Prometheus exporter listening");
    Ok(())
}

async fn load_store(config: &AppConfig, data_dir: Option<PathBuf>) -> Result<JournalDataStore> {
    let data_dir = data_dir.unwrap_or_else(|| config.store.data_dir.clone());

    let venues = match &config.store.venue_names_file {
        Some(path) => VenueIndex::load_names(path).await?,
        None => VenueIndex::new(),
    };

    info!(data_dir = %data_dir.display(), "Loading journal data");
    JournalDataStore::load(&data_dir, venues).await
}

async fn run_build(args: BuildArgs, config: AppConfig) -> Result<()> {
    let seed = PaperId::parse(&args.seed)?;
    let max_depth = args.depth.unwrap_or(config.traversal.max_depth);
    if max_depth > refgraph_common::config::MAX_TRAVERSAL_DEPTH {
        return Err(AppError::Validation {
            message: format!(
                "depth {} exceeds limit {}",
                max_depth,
                refgraph_common::config::MAX_TRAVERSAL_DEPTH
            ),
            field: Some("depth".to_string()),
        });
    }

    let mut assembler_config = AssemblerConfig::from(&config.traversal);
    if args.drop_self_loops {
        assembler_config.retain_self_loops = false;
    }

    let store = load_store(&config, args.data_dir).await?;
    let graph = build_citation_graph(&seed, max_depth, &store, assembler_config)?;

    let snapshot = GraphSnapshot::from_graph(&graph)?;
    let output_dir = args.output_dir.unwrap_or_else(|| config.output.dir.clone());
    let path = snapshot.write(&output_dir, config.output.pretty).await?;

    println!("snapshot: {}", path.display());
    println!(
        "nodes: {}  edges: {}  missing: {}",
        snapshot.stats.nodes, snapshot.stats.edges, snapshot.stats.missing
    );

    let top = args.top_venues.unwrap_or(config.output.top_venues);
    let ranking = rank_snapshot(&snapshot, store.venues(), top);
    print_ranking(&ranking);

    Ok(())
}

async fn run_venues(args: VenuesArgs, config: AppConfig) -> Result<()> {
    let snapshot = read_verified(&args.snapshot).await?;
    let store = load_store(&config, args.data_dir).await?;

    let top = args.top.unwrap_or(config.output.top_venues);
    let ranking = rank_snapshot(&snapshot, store.venues(), top);
    print_ranking(&ranking);

    Ok(())
}

async fn read_verified(path: &Path) -> Result<GraphSnapshot> {
    let snapshot = GraphSnapshot::read(path).await?;
    if !snapshot.verify_digest()? {
        return Err(AppError::Validation {
            message: format!("snapshot {} does not match its digest", path.display()),
            field: Some("digest".to_string()),
        });
    }
    Ok(snapshot)
}

fn rank_snapshot(snapshot: &GraphSnapshot, venues: &VenueIndex, limit: usize) -> VenueRanking {
    rank_venues(
        snapshot.nodes.iter().map(|node| node.venue.as_str()),
        snapshot.missing.iter(),
        venues,
        limit,
    )
}

fn print_ranking(ranking: &VenueRanking) {
    println!("{:>8} {:>8}  venue", "missing", "nodes");
    for score in &ranking.venues {
        println!("{:>8} {:>8}  {}", score.missing, score.nodes, score.venue);
    }
    if ranking.unattributed > 0 {
        println!("{:>8} {:>8}  (no matching venue)", ranking.unattributed, "-");
    }
    if let Some(next) = ranking.next_fetch() {
        println!("next venue to fetch: {}", next.venue);
    }
}

fn exit_code(err: &AppError) -> ExitCode {
    ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
}
