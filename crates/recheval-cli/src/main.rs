//! Recheval CLI - offline evaluation of recommender output.
//!
//! # Usage
//!
//! ```bash
//! # Split a ratings file into five per-user folds
//! recheval split --input ratings.tsv --output-dir splits
//!
//! # Run your recommender on splits/train_<i>.tsv, write recs/recs_<i>.tsv, then
//! recheval evaluate --splits splits --recommendations recs
//! recheval evaluate --splits splits --recommendations recs --strategy rel-plus-n --sample-size 100 --json
//!
//! # Keep only the candidate items a strategy allows
//! recheval filter --splits splits --recommendations recs --output-dir filtered
//! ```

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::StrategyArgs;
use recheval_core::io::ParsePolicy;
use recheval_core::Evaluator;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Recheval recommender evaluation CLI.
///
/// Splits rating data into cross-validation folds and scores recommender
/// output for each fold with ranking and error metrics.
#[derive(Parser)]
#[command(name = "recheval", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Split a ratings file into train/test folds
    Split {
        /// Ratings file (tab-separated or bracket form)
        #[arg(long)]
        input: PathBuf,

        /// Directory receiving train_<i>.tsv and test_<i>.tsv
        #[arg(long)]
        output_dir: PathBuf,

        /// Number of folds
        #[arg(long)]
        folds: Option<usize>,

        /// Split seed
        #[arg(long)]
        seed: Option<u64>,

        /// Split all ratings together instead of per user
        #[arg(long)]
        global: bool,

        /// Skip malformed lines instead of aborting
        #[arg(long)]
        skip_malformed: bool,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Apply a candidate strategy to recommendation files
    Filter {
        /// Directory holding train_<i>.tsv and test_<i>.tsv
        #[arg(long)]
        splits: PathBuf,

        /// Directory holding recs_<i>.tsv
        #[arg(long)]
        recommendations: PathBuf,

        /// Directory receiving strategy_<i>.tsv
        #[arg(long)]
        output_dir: PathBuf,

        #[command(flatten)]
        strategy: StrategyArgs,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Score recommendation files against the held-out ratings
    Evaluate {
        /// Directory holding train_<i>.tsv and test_<i>.tsv
        #[arg(long)]
        splits: PathBuf,

        /// Directory holding recs_<i>.tsv
        #[arg(long)]
        recommendations: PathBuf,

        /// Number of folds (default: every train_<i>.tsv found)
        #[arg(long)]
        folds: Option<usize>,

        /// Ranking cutoffs (comma-separated)
        #[arg(long, value_delimiter = ',')]
        cutoffs: Option<Vec<usize>>,

        /// Minimum test rating counted as relevant
        #[arg(long)]
        relevance_threshold: Option<f64>,

        #[command(flatten)]
        strategy: StrategyArgs,

        /// Output results as JSON
        #[arg(long)]
        json: bool,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Split {
            input,
            output_dir,
            folds,
            seed,
            global,
            skip_malformed,
            config,
        } => {
            let mut config = config::load_config(config.as_deref())?;
            config::apply_split_flags(&mut config, folds, seed, global);
            let policy = if skip_malformed {
                ParsePolicy::Skip
            } else {
                ParsePolicy::Abort
            };

            let written = commands::split(&input, &output_dir, &config, policy)?;
            println!("Wrote {} folds to {}", written, output_dir.display());
        }
        Command::Filter {
            splits,
            recommendations,
            output_dir,
            strategy,
            config,
        } => {
            let mut config = config::load_config(config.as_deref())?;
            strategy.apply(&mut config);
            let folds = config::count_folds(&splits)?;

            commands::filter(&splits, &recommendations, &output_dir, folds, &config)?;
            println!(
                "Filtered {} folds with {} into {}",
                folds,
                config.strategy.name,
                output_dir.display()
            );
        }
        Command::Evaluate {
            splits,
            recommendations,
            folds,
            cutoffs,
            relevance_threshold,
            strategy,
            json,
            config,
        } => {
            let mut config = config::load_config(config.as_deref())?;
            strategy.apply(&mut config);
            if let Some(cutoffs) = cutoffs {
                config.cutoffs = cutoffs;
            }
            if let Some(threshold) = relevance_threshold {
                config.relevance_threshold = threshold;
            }
            let folds = match folds {
                Some(folds) => folds,
                None => config::count_folds(&splits)?,
            };
            config.folds = folds;

            let evaluator = Evaluator::new(config)?;
            let report = commands::evaluate(&evaluator, &splits, &recommendations, folds, !json)?;

            let output = if json {
                output::format_json(evaluator.config(), &report)
            } else {
                output::format_human(evaluator.config(), &report)
            };
            println!("{}", output);
        }
    }

    Ok(())
}
