#![forbid(unsafe_code)]

mod cmd;
mod output;

use std::env;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use output::OutputMode;
use roadcent_core::config::{self, RunConfig};
use roadcent_core::timing;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "roadcent: sampled betweenness centrality for road networks",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit stage timing report to stderr.
    #[arg(long, global = true)]
    timing: bool,

    /// Output format (default: pretty on a terminal, text when piped).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Config file (default: ./roadcent.toml, then the user config dir).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Estimate betweenness centrality",
        long_about = "Load an edge list, build the road graph and estimate betweenness \
                      centrality from a random sample of pivot vertices.",
        after_help = "EXAMPLES:\n    # Default input (data/road_graph.csv), 1000 pivots\n    roadcent estimate\n\n    # Reproducible run on another file\n    roadcent estimate roads.csv -k 500 --seed 42\n\n    # Exact, hop-count weighting, top 25 as JSON\n    roadcent estimate --exact --weight hops --top 25 --format json"
    )]
    Estimate(cmd::estimate::EstimateArgs),

    #[command(
        about = "Show road graph statistics",
        long_about = "Load an edge list and build the road graph without estimating.",
        after_help = "EXAMPLES:\n    # Inspect the default input\n    roadcent stats\n\n    # First 10k rows only\n    roadcent stats roads.csv --max-rows 10000"
    )]
    Stats(cmd::stats::StatsArgs),

    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Bash\n    roadcent completions bash > ~/.local/share/bash-completion/completions/roadcent"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("ROADCENT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "roadcent=debug,info"
        } else {
            "roadcent=info,warn"
        })
    });

    let format = env::var("ROADCENT_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so stdout stays parseable.
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Resolve the config file, rendering any failure before returning it.
fn load_run_config(
    explicit: Option<&Path>,
    working_dir: &Path,
    output: OutputMode,
) -> anyhow::Result<RunConfig> {
    let (run_config, source) = config::resolve_config(explicit, working_dir)
        .map_err(|e| output::fail(output, e.code(), e))?;
    match source {
        Some(path) => info!(path = %path.display(), "loaded config"),
        None => debug!("no config file, using defaults"),
    }
    Ok(run_config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let timing_enabled = cli.timing || timing::timing_enabled_from_env();
    timing::set_timing_enabled(timing_enabled);
    timing::clear_timings();

    let output = cli.output_mode();
    let working_dir = env::current_dir()?;

    let command_result = match cli.command {
        Commands::Estimate(ref args) => timing::timed("cmd.estimate", || {
            let run_config = load_run_config(cli.config.as_deref(), &working_dir, output)?;
            cmd::estimate::run_estimate(args, run_config, output)
        }),
        Commands::Stats(ref args) => timing::timed("cmd.stats", || {
            let run_config = load_run_config(cli.config.as_deref(), &working_dir, output)?;
            cmd::stats::run_stats(args, run_config, output)
        }),
        Commands::Completions(ref args) => timing::timed("cmd.completions", || {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }),
    };

    if timing_enabled {
        let report = timing::collect_report();
        if report.is_empty() {
            eprintln!("timing report: no samples recorded");
        } else {
            eprintln!("timing report:");
            eprintln!("{}", report.display_table());
            eprintln!("timing report (json):");
            eprintln!("{}", serde_json::to_string_pretty(&report.to_json())?);
        }
    }

    command_result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_flag_parses_before_subcommand() {
        let cli = Cli::parse_from(["roadcent", "--timing", "stats"]);
        assert!(cli.timing);
        assert!(matches!(cli.command, Commands::Stats(_)));
    }

    #[test]
    fn timing_flag_parses_after_subcommand() {
        let cli = Cli::parse_from(["roadcent", "estimate", "--timing"]);
        assert!(cli.timing);
    }

    #[test]
    fn json_flag_sets_output_mode() {
        let cli = Cli::parse_from(["roadcent", "--json", "stats"]);
        assert!(cli.json);
        assert!(cli.output_mode().is_json());
    }

    #[test]
    fn format_flag_after_subcommand() {
        let cli = Cli::parse_from(["roadcent", "estimate", "--format", "text"]);
        assert_eq!(cli.format, Some(OutputMode::Text));
        assert_eq!(cli.output_mode(), OutputMode::Text);
    }

    #[test]
    fn config_flag_parsed() {
        let cli = Cli::parse_from(["roadcent", "--config", "alt.toml", "stats"]);
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));
    }

    #[test]
    fn estimate_subcommand_parses_all_flags() {
        let cli = Cli::parse_from([
            "roadcent",
            "estimate",
            "roads.csv",
            "--max-rows",
            "500",
            "-k",
            "64",
            "--seed",
            "7",
            "--raw",
            "--weight",
            "hops",
            "--endpoints",
            "--top",
            "3",
        ]);
        let Commands::Estimate(args) = cli.command else {
            panic!("expected estimate");
        };
        assert_eq!(args.path, Some(PathBuf::from("roads.csv")));
        assert_eq!(args.max_rows, Some(500));
        assert_eq!(args.pivots, Some(64));
        assert_eq!(args.seed, Some(7));
        assert!(args.raw);
        assert_eq!(args.weight, Some(cmd::estimate::WeightArg::Hops));
        assert!(args.endpoints);
        assert_eq!(args.top, Some(3));
    }

    #[test]
    fn pivots_conflict_with_exact() {
        let result = Cli::try_parse_from(["roadcent", "estimate", "-k", "10", "--exact"]);
        assert!(result.is_err());
    }

    #[test]
    fn completions_subcommand_parses() {
        let cli = Cli::parse_from(["roadcent", "completions", "zsh"]);
        assert!(matches!(cli.command, Commands::Completions(_)));
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
