#![forbid(unsafe_code)]

mod cmd;
mod output;

use std::env;
use std::path::PathBuf;
use std::time::Instant;

use clap::{CommandFactory, Parser, Subcommand};
use output::OutputMode;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Config file read when `--config` is not given; optional.
const DEFAULT_CONFIG_FILE: &str = "railnet.toml";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "railnet: railway network graphs and robustness simulation",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// TOML config file (defaults to ./railnet.toml when present).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags.
    const fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Construction",
        about = "Build a railway graph from stations and segments",
        long_about = "Group station records into clusters, snap track segments onto them and \
                      write the resulting undirected graph as a binary snapshot.",
        after_help = "EXAMPLES:\n    # Build a snapshot\n    railnet build --stations stations.json --segments segments.json --out graph.bin\n\n    # Also export plain JSON and link nearby nodes\n    railnet build --stations stations.json --segments segments.json --out graph.bin --export graph.json --link\n\n    # Emit machine-readable output\n    railnet build --stations stations.json --segments segments.json --out graph.bin --json"
    )]
    Build(cmd::build::BuildArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "Report topological metrics for a graph",
        long_about = "Compute components, degree distribution, efficiency, clustering, path \
                      lengths and a centrality ranking for a graph snapshot.",
        after_help = "EXAMPLES:\n    # Baseline report\n    railnet metrics --graph graph.bin\n\n    # Closeness ranking over hops, top 20\n    railnet metrics --graph graph.bin --centrality closeness --metric hops --top 20\n\n    # Emit machine-readable output\n    railnet metrics --graph graph.bin --json"
    )]
    Metrics(cmd::metrics::MetricsArgs),

    #[command(
        next_help_heading = "Robustness",
        about = "Run one node-removal simulation",
        long_about = "Remove nodes one at a time in the order given by an attack strategy and \
                      record connectivity and efficiency after every removal.",
        after_help = "EXAMPLES:\n    # Random failures with a fixed seed\n    railnet simulate --graph graph.bin --strategy random --seed 7\n\n    # Adaptive betweenness attack, save the trace\n    railnet simulate --graph graph.bin --strategy betweenness_adaptive --out trace.json\n\n    # Emit machine-readable output\n    railnet simulate --graph graph.bin --json"
    )]
    Simulate(cmd::simulate::SimulateArgs),

    #[command(
        next_help_heading = "Robustness",
        about = "Run repeated simulations and strategy sweeps",
        long_about = "Repeat random runs over consecutive seeds, run deterministic strategies \
                      once, and aggregate the curves into mean and variance per step.",
        after_help = "EXAMPLES:\n    # 100 random runs\n    railnet campaign --graph graph.bin --strategy random --repetitions 100\n\n    # Compare several strategies\n    railnet campaign --graph graph.bin -s random -s degree -s betweenness_adaptive\n\n    # Every strategy, saved for later\n    railnet campaign --graph graph.bin --all --out sweep.json"
    )]
    Campaign(cmd::campaign::CampaignArgs),

    #[command(
        next_help_heading = "Robustness",
        about = "Compare saved traces and campaign reports",
        long_about = "Print robustness summaries (areas under the efficiency and largest \
                      component curves) of saved runs side by side.",
        after_help = "EXAMPLES:\n    # Two saved traces\n    railnet compare random=random.json targeted=degree.json\n\n    # A saved sweep\n    railnet compare sweep.json --json"
    )]
    Compare(cmd::compare::CompareArgs),

    #[command(
        next_help_heading = "Project Maintenance",
        about = "Generate shell completion scripts",
        long_about = "Generate shell completion scripts for supported shells.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    railnet completions bash\n\n    # Generate zsh completions\n    railnet completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

impl Commands {
    const fn name(&self) -> &'static str {
        match self {
            Self::Build(_) => "build",
            Self::Metrics(_) => "metrics",
            Self::Simulate(_) => "simulate",
            Self::Campaign(_) => "campaign",
            Self::Compare(_) => "compare",
            Self::Completions(_) => "completions",
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("RAILNET_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "railnet=debug,info"
        } else {
            "railnet=info,warn"
        })
    });

    let format = env::var("RAILNET_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_ansi(false)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let output = cli.output_mode();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = Some(config_path.as_path());
    let started = Instant::now();
    let name = cli.command.name();

    let result = match &cli.command {
        Commands::Build(args) => cmd::build::run_build(args, config, output),
        Commands::Metrics(args) => cmd::metrics::run_metrics(args, output),
        Commands::Simulate(args) => cmd::simulate::run_simulate(args, config, output),
        Commands::Campaign(args) => cmd::campaign::run_campaign_cmd(args, config, output),
        Commands::Compare(args) => cmd::compare::run_compare(args, output),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    };

    debug!(
        command = name,
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        ok = result.is_ok(),
        "command finished"
    );
    result
}
