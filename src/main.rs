// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! trace-metrics main entry point - CLI and commands.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use trace_metrics::config::{self, CliOptions, Preferences};
use trace_metrics::links::metric_link;
use trace_metrics::query::fetch_counts;
use trace_metrics::telemetry::{init_telemetry, TelemetryConfig, GLOBAL_METRICS};
use trace_metrics::traces::{SortOrder, Trace, TraceScanner, TraceTable};
use trace_metrics::types::{MetricCounts, ProgressSink};

/// trace-metrics version string.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Show how often the New Relic traces in your code base fire.
#[derive(Parser)]
#[command(name = "trace-metrics")]
#[command(author, version, about = "Show how often your New Relic traces fire", long_about = None)]
struct Cli {
    /// New Relic account ID
    #[arg(short, long, env = "NEW_RELIC_ACCOUNT_ID", global = true)]
    account_id: Option<String>,

    /// Query key (Insights) or user key (NerdGraph)
    #[arg(short = 'k', long, env = "NEW_RELIC_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Application name as reported to New Relic
    #[arg(short = 'n', long, global = true)]
    app_name: Option<String>,

    /// Number of days to query
    #[arg(short, long, global = true)]
    days: Option<String>,

    /// Last day of the window (YYYY-MM-DD); empty for "up to now"
    #[arg(short, long, global = true)]
    until: Option<String>,

    /// Remote API generation
    #[arg(long, value_enum, global = true)]
    api: Option<Api>,

    /// Base URL for the API
    #[arg(long, env = "TRACE_METRICS_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Project root to scan and to read workspace config from
    #[arg(short = 'C', long, global = true)]
    root: Option<PathBuf>,

    /// Print query metrics after the command
    #[arg(long, global = true)]
    stats: bool,

    /// Show verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Show debug output
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Remote API generations.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Api {
    /// Insights query API (GET)
    Insights,
    /// NerdGraph GraphQL API (POST)
    Nerdgraph,
}

impl std::fmt::Display for Api {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Api::Insights => write!(f, "insights"),
            Api::Nerdgraph => write!(f, "nerdgraph"),
        }
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Table orderings.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Sort {
    File,
    Name,
    Hits,
}

impl From<Sort> for SortOrder {
    fn from(sort: Sort) -> Self {
        match sort {
            Sort::File => SortOrder::File,
            Sort::Name => SortOrder::Name,
            Sort::Hits => SortOrder::Hits,
        }
    }
}

/// Subcommands for trace-metrics.
#[derive(Subcommand)]
enum Commands {
    /// Scan traces, query their counts and print the table (default)
    Refresh {
        /// Row order
        #[arg(short, long, value_enum, default_value = "file")]
        sort: Sort,
    },

    /// Print the aggregated counts without scanning sources
    Query {
        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List the traces found in the project
    Scan,

    /// Print the Insights link for one metric
    Link {
        /// Metric name as given in the annotation
        metric: String,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Initialize a new configuration file
    Init,
}

/// Config subcommand actions.
#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _guard = init_telemetry(&TelemetryConfig::from_flags(cli.verbose, cli.debug))?;

    let root = match &cli.root {
        Some(root) => root.clone(),
        None => {
            let cwd = std::env::current_dir()?;
            config::find_workspace_root(&cwd).unwrap_or(cwd)
        }
    };

    let cli_options = CliOptions {
        account_id: cli.account_id.clone(),
        app_name: cli.app_name.clone(),
        num_days: cli.days.clone(),
        until_date: cli.until.clone(),
        api_generation: cli.api.map(|a| a.to_string()),
        api_base_url: cli.base_url.clone(),
    };
    let api_key = cli.api_key.clone().unwrap_or_default();
    let command = cli.command.unwrap_or(Commands::Refresh { sort: Sort::File });

    handle_command(command, &root, cli_options, api_key).await?;

    if cli.stats {
        eprintln!("\n{}", GLOBAL_METRICS.snapshot().format_report().dimmed());
    }

    Ok(())
}

async fn handle_command(
    command: Commands,
    root: &Path,
    cli_options: CliOptions,
    api_key: String,
) -> anyhow::Result<()> {
    match command {
        Commands::Refresh { sort } => {
            let prefs = config::load_config(root, cli_options)?;
            let traces = scan(root, &prefs)?;
            let counts = refresh(&prefs, api_key.clone()).await?;

            let mut table = TraceTable::new(traces);
            table.apply_counts(&counts);
            table.sort(sort.into());
            print_table(&table, root);

            let unmatched = table.unmatched(&counts);
            if !unmatched.is_empty() {
                println!("\n{}", "Counted but not found in sources:".dimmed());
                for (name, count) in unmatched {
                    println!("  {:<40} {:>12}", name, count);
                }
            }
            if counts.is_empty() {
                print_no_data_hint(&prefs, &api_key);
            }
        }
        Commands::Query { format } => {
            let prefs = config::load_config(root, cli_options)?;
            let counts = refresh(&prefs, api_key.clone()).await?;

            let mut sorted: Vec<_> = counts.iter().collect();
            sorted.sort();
            match format {
                OutputFormat::Json => {
                    let map: std::collections::BTreeMap<_, _> = sorted.into_iter().collect();
                    println!("{}", serde_json::to_string_pretty(&map)?);
                }
                OutputFormat::Text => {
                    for (name, count) in sorted {
                        println!("{:<40} {:>12}", name, count);
                    }
                    if counts.is_empty() {
                        print_no_data_hint(&prefs, &api_key);
                    }
                }
            }
        }
        Commands::Scan => {
            let prefs = config::load_config(root, cli_options)?;
            let traces = scan(root, &prefs)?;
            for trace in &traces {
                println!(
                    "{}:{}  {}",
                    trace.relative_to(root).display(),
                    trace.line,
                    trace.metric_name.bright_white()
                );
            }
            println!("\n{} traces", traces.len());
        }
        Commands::Link { metric } => {
            let prefs = config::load_config(root, cli_options)?;
            if prefs.account_id.is_empty() {
                anyhow::bail!("No account ID configured (use --account-id or accountId)");
            }
            let link = metric_link(&prefs.account_id, &prefs.app_name, &metric, prefs.num_days)
                .context("Failed to build link")?;
            println!("{}", link);
        }
        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                let prefs = config::load_config(root, cli_options)?;
                println!("{}", serde_json::to_string_pretty(&prefs)?);
            }
        },
        Commands::Init => {
            let path = config::init_config(root, None)?;
            println!("Created config file: {}", path.display());
        }
    }
    Ok(())
}

fn scan(root: &Path, prefs: &Preferences) -> anyhow::Result<Vec<Trace>> {
    let scanner = TraceScanner::with_patterns(root, prefs.include.as_slice())?;
    Ok(scanner.scan()?)
}

/// Run one refresh as a background task and wait for its result.
async fn refresh(prefs: &Preferences, api_key: String) -> anyhow::Result<MetricCounts> {
    let query_config = prefs.query_config(api_key);
    let generation = prefs.api_generation;
    let base_url = prefs.api_base_url.clone();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));

    let sink = spinner.clone();
    let task = tokio::spawn(async move {
        let report = move |message: &str| sink.set_message(message.to_string());
        let progress: &dyn ProgressSink = &report;
        fetch_counts(&query_config, generation, base_url.as_deref(), Some(progress)).await
    });

    let counts = task.await.context("Refresh task failed")?;
    spinner.finish_and_clear();
    Ok(counts)
}

fn print_table(table: &TraceTable, root: &Path) {
    println!(
        "{}",
        format!("{:<32} {:<40} {:>12} {:>6}", "File", "Trace", "Hits", "Line").bold()
    );
    for row in table.rows() {
        let hits = row.hits_display();
        let hits = match row.hits {
            Some(0) => hits.dimmed(),
            Some(_) => hits.bright_green(),
            None => hits.normal(),
        };
        println!(
            "{:<32} {:<40} {:>12} {:>6}",
            row.trace.file_name(),
            row.trace.metric_name,
            hits,
            row.trace.line
        );
    }
    if table.is_empty() {
        println!("{}", format!("No traces found under {}", root.display()).dimmed());
    }
}

fn print_no_data_hint(prefs: &Preferences, api_key: &str) {
    if prefs.query_config(api_key).is_inert() {
        println!(
            "\n{}",
            "No data: set accountId, appName and numDays, and pass --api-key or NEW_RELIC_API_KEY"
                .yellow()
        );
    } else {
        println!("\n{}", format!("No data returned (trace-metrics {})", VERSION).yellow());
    }
}
