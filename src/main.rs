//! NDCG Evaluation CLI
//!
//! Computes NDCG@K for a ranked run against relevance judgments.
//!
//! ## Quick Start
//!
//! ```bash
//! # BM25 report with default paths
//! ./ndcg-eval run
//!
//! # Evaluate another run with the textbook DCG formula
//! ./ndcg-eval run \
//!     --results ./runs/lm.res \
//!     --qrels ./input/qrels.adhoc.txt \
//!     --label lm \
//!     --formula standard
//!
//! # Check both input files parse
//! ./ndcg-eval validate --results ./runs/lm.res
//! ```
//!
//! ## Configuration
//!
//! Settings are read from `ndcg-eval.toml` when present (or `--config`);
//! flags override file values. `init-config` writes the defaults.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use ndcg_eval::benchmark::{evaluate, render, render_per_query, write_report};
use ndcg_eval::config::{DcgFormula, EvalConfig, OutputFormat, WindowStrategy, DEFAULT_CONFIG_FILE};
use ndcg_eval::qrels::Qrels;
use ndcg_eval::runs::RunFile;

/// DCG formula for CLI
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormulaArg {
    /// rel[0] + sum(rel[i]/log2(i)) from i=2
    Reference,
    /// sum(rel[i]/log2(i+2)) from i=0
    Standard,
}

impl From<FormulaArg> for DcgFormula {
    fn from(arg: FormulaArg) -> Self {
        match arg {
            FormulaArg::Reference => DcgFormula::Reference,
            FormulaArg::Standard => DcgFormula::Standard,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum WindowArg {
    /// Fixed blocks per query id with gap correction
    Blocks,
    /// Where each query's results begin in the file
    Offsets,
}

impl From<WindowArg> for WindowStrategy {
    fn from(arg: WindowArg) -> Self {
        match arg {
            WindowArg::Blocks => WindowStrategy::Blocks,
            WindowArg::Offsets => WindowStrategy::Offsets,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Table,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Table => OutputFormat::Table,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Parser)]
#[command(name = "ndcg-eval")]
#[command(about = "NDCG@K evaluation of ranked runs against qrels")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a run and write the NDCG@K report
    Run {
        /// Path to config file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Ranked results file
        #[arg(short, long)]
        results: Option<PathBuf>,

        /// Relevance judgments file
        #[arg(short, long)]
        qrels: Option<PathBuf>,

        /// Report output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Run label for the first report line
        #[arg(short, long)]
        label: Option<String>,

        /// Cutoffs to evaluate (comma-separated, e.g. "1,5,10")
        #[arg(short = 'k', long, value_delimiter = ',')]
        cutoffs: Option<Vec<usize>>,

        /// Keep results with rank below this value
        #[arg(long)]
        rank_threshold: Option<i64>,

        /// Query ids missing from the results (comma-separated)
        #[arg(long, value_delimiter = ',')]
        gaps: Option<Vec<i64>>,

        /// DCG formula
        #[arg(long, value_enum)]
        formula: Option<FormulaArg>,

        /// Window strategy
        #[arg(long, value_enum)]
        window: Option<WindowArg>,

        /// Report format
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Print per-query scores
        #[arg(long)]
        per_query: bool,
    },

    /// Parse the results and qrels files without scoring
    Validate {
        /// Path to config file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Ranked results file
        #[arg(short, long)]
        results: Option<PathBuf>,

        /// Relevance judgments file
        #[arg(short, long)]
        qrels: Option<PathBuf>,
    },

    /// Write the default configuration to a TOML file
    InitConfig {
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            results,
            qrels,
            output,
            label,
            cutoffs,
            rank_threshold,
            gaps,
            formula,
            window,
            format,
            per_query,
        } => {
            let mut config = load_config(config)?;
            if let Some(results) = results {
                config.results = results;
            }
            if let Some(qrels) = qrels {
                config.qrels = qrels;
            }
            if let Some(output) = output {
                config.output = output;
            }
            if let Some(label) = label {
                config.label = label;
            }
            if let Some(cutoffs) = cutoffs {
                config.cutoffs = cutoffs;
            }
            if let Some(threshold) = rank_threshold {
                config.rank_threshold = threshold;
            }
            if let Some(gaps) = gaps {
                config.gap_query_ids = gaps;
            }
            if let Some(formula) = formula {
                config.formula = formula.into();
            }
            if let Some(window) = window {
                config.window = window.into();
            }
            if let Some(format) = format {
                config.format = format.into();
            }
            config.per_query |= per_query;

            run_evaluation(config)?;
        }

        Commands::Validate {
            config,
            results,
            qrels,
        } => {
            let mut config = load_config(config)?;
            if let Some(results) = results {
                config.results = results;
            }
            if let Some(qrels) = qrels {
                config.qrels = qrels;
            }
            validate_inputs(&config)?;
        }

        Commands::InitConfig { path } => {
            EvalConfig::default().save(&path)?;
            println!("Wrote default config to {}", path.display());
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<EvalConfig> {
    match path {
        Some(path) => EvalConfig::load(&path),
        None => EvalConfig::load_default(),
    }
}

/// Load inputs, score every query and write the report
fn run_evaluation(mut config: EvalConfig) -> Result<()> {
    config.validate()?;

    eprintln!("Loading results from {:?}...", config.results);
    let run = RunFile::load(&config.results, config.rank_threshold)?;
    eprintln!(
        "  {} results kept (rank < {}), {} queries",
        run.len(),
        config.rank_threshold,
        run.query_ids.len()
    );

    eprintln!("Loading qrels from {:?}...", config.qrels);
    let qrels = Qrels::load(&config.qrels)?;
    eprintln!("  {} judgments", qrels.len());

    eprintln!(
        "Scoring with {} DCG ({}), {} windows",
        config.formula.name(),
        config.formula.description(),
        config.window.name()
    );
    let report = evaluate(&run, &qrels, &config)
        .with_context(|| format!("Failed to evaluate {:?}", config.results))?;

    let rendered = render(&report, config.format)?;
    write_report(&config.output, &rendered)?;

    println!("{}", rendered);
    if config.per_query {
        println!();
        print!("{}", render_per_query(&report));
    }
    println!("\nSaved results to file at path: '{}'", config.output.display());

    Ok(())
}

/// Parse both input files and print what was found
fn validate_inputs(config: &EvalConfig) -> Result<()> {
    let run = RunFile::load(&config.results, config.rank_threshold)?;
    let qrels = Qrels::load(&config.qrels)?;

    println!("✓ Results: {:?}", config.results);
    println!("  Kept results: {}", run.len());
    println!("  Queries: {}", run.query_ids.len());
    println!("✓ Qrels: {:?}", config.qrels);
    println!("  Judgments: {}", qrels.len());

    let unjudged: Vec<&str> = run
        .query_ids
        .iter()
        .filter(|q| !qrels.has_query(q))
        .map(String::as_str)
        .collect();
    if !unjudged.is_empty() {
        println!("⚠ Queries without judgments: {}", unjudged.join(", "));
    }
    if !run.non_contiguous.is_empty() {
        println!(
            "⚠ Queries with non-contiguous results: {}",
            run.non_contiguous.join(", ")
        );
    }

    Ok(())
}
