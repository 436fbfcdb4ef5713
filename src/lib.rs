//! Cocoprep: turn an annotation-tool COCO export into training-ready datasets.
//!
//! Cocoprep filters a COCO document down to a chosen set of categories,
//! renumbers everything densely, and lays the result out for YOLO
//! (Ultralytics), COCO and RF-DETR training.
//!
//! # Modules
//!
//! - [`coco`]: COCO document types, parsing and validation
//! - [`filter`]: Category filter and id renumbering engine
//! - [`dataset`]: Staged documents and image-folder binding
//! - [`stats`]: Dataset and per-split summaries
//! - [`split`]: Seeded stratified train/val/test assignment
//! - [`export`]: Per-split YOLO and COCO writers
//! - [`layout`]: Ultralytics and RF-DETR directory layouts
//! - [`pipeline`]: The end-to-end `prepare` flow
//! - [`error`]: Error types for cocoprep operations

pub mod coco;
pub mod dataset;
pub mod error;
pub mod export;
pub mod filter;
pub mod layout;
pub mod pipeline;
pub mod split;
pub mod stats;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use error::CocoprepError;

/// The cocoprep CLI application.
#[derive(Parser)]
#[command(name = "cocoprep")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// More log output (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Filter, split and export a dataset as YOLO, COCO and RF-DETR.
    Prepare(PrepareArgs),
    /// Keep only the given categories of a COCO file and renumber ids.
    Filter(FilterArgs),
    /// Print image, class and annotation counts of a COCO file.
    Stats(StatsArgs),
}

/// Arguments for the prepare subcommand.
#[derive(clap::Args)]
struct PrepareArgs {
    /// Folder exported by the annotation tool (holds result.json and images/).
    #[arg(short = 'f', long)]
    download_folder: PathBuf,

    /// Folder that receives yolo/, coco/ and rf_detr/.
    #[arg(short = 'o', long, env = "COCOPREP_OUTPUT")]
    output_folder: PathBuf,

    /// Category names to keep. A value that is not a category name is split on spaces.
    #[arg(short = 'c', long, num_args = 1.., required = true)]
    categories: Vec<String>,

    /// Train, val and test percentages.
    #[arg(
        short = 's',
        long = "split",
        num_args = 3,
        value_names = ["TRAIN", "VAL", "TEST"],
        default_values_t = [80u32, 10, 10]
    )]
    split: Vec<u32>,

    /// Seed for a reproducible split.
    #[arg(long, env = "COCOPREP_SEED")]
    seed: Option<u64>,

    /// Consecutive images (by file name) kept in the same split.
    #[arg(long, default_value_t = 1)]
    group_size: usize,

    /// Write labels and annotations only.
    #[arg(long)]
    no_copy_images: bool,
}

/// Arguments for the filter subcommand.
#[derive(clap::Args)]
struct FilterArgs {
    /// COCO JSON file to filter.
    input: PathBuf,

    /// Category names to keep. A value that is not a category name is split on spaces.
    #[arg(short = 'c', long, num_args = 1.., required = true)]
    categories: Vec<String>,

    /// Where to write the filtered COCO JSON.
    #[arg(short = 'o', long)]
    output: PathBuf,
}

/// Arguments for the stats subcommand.
#[derive(clap::Args)]
struct StatsArgs {
    /// COCO JSON file to summarize.
    input: PathBuf,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Run the cocoprep CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), CocoprepError> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Some(Commands::Prepare(args)) => run_prepare(args),
        Some(Commands::Filter(args)) => run_filter(args),
        Some(Commands::Stats(args)) => run_stats(args),
        None => {
            println!("cocoprep {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Filter COCO exports and lay them out for YOLO, COCO and RF-DETR.");
            println!();
            println!("Run 'cocoprep --help' for usage information.");
            Ok(())
        }
    }
}

/// `RUST_LOG` wins over the flags when set.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

/// Execute the prepare subcommand.
fn run_prepare(args: PrepareArgs) -> Result<(), CocoprepError> {
    let ratios = match args.split.as_slice() {
        [train, val, test] => split::SplitRatios::from_percentages(*train, *val, *test)?,
        other => {
            return Err(CocoprepError::InvalidSplit {
                message: format!("expected 3 percentages, got {}", other.len()),
            })
        }
    };

    let mut opts = pipeline::PrepareOptions::new(
        &args.download_folder,
        &args.output_folder,
        args.categories,
        ratios,
    );
    opts.seed = args.seed;
    opts.group_size = args.group_size;
    opts.copy_images = !args.no_copy_images;

    let report = pipeline::prepare(&opts)?;

    print!("{}", report.filter);
    println!();
    print!("{}", report.dataset);
    println!();
    print!("{}", report.splits);
    println!();
    println!("Wrote datasets to {}", args.output_folder.display());
    Ok(())
}

/// Execute the filter subcommand.
fn run_filter(args: FilterArgs) -> Result<(), CocoprepError> {
    let source = coco::read_coco_json(&args.input)?;
    let categories = filter::expand_category_args(&source, &args.categories);
    let (document, summary) = filter::filter_document_with_summary(&source, &categories)?;
    coco::write_coco_json(&args.output, &document)?;

    print!("{}", summary);
    println!("Wrote {}", args.output.display());
    Ok(())
}

/// Execute the stats subcommand.
fn run_stats(args: StatsArgs) -> Result<(), CocoprepError> {
    let document = coco::read_coco_json(&args.input)?;
    let report = stats::dataset_stats(&document);

    match args.output.as_str() {
        "text" => print!("{}", report),
        "json" => {
            let json = serde_json::to_string_pretty(&report).map_err(|source| {
                CocoprepError::CocoJsonWrite {
                    path: PathBuf::from("<stdout>"),
                    source,
                }
            })?;
            println!("{}", json);
        }
        other => {
            return Err(CocoprepError::UnsupportedFormat(format!(
                "'{}' (supported: text, json)",
                other
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn prepare_parses_split_percentages() {
        let cli = Cli::try_parse_from([
            "cocoprep", "prepare", "-f", "in", "-o", "out", "-c", "phone", "-s", "70", "20", "10",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Prepare(args)) => {
                assert_eq!(args.split, vec![70, 20, 10]);
                assert_eq!(args.group_size, 1);
                assert!(!args.no_copy_images);
            }
            _ => panic!("expected prepare"),
        }
    }

    #[test]
    fn prepare_defaults_to_80_10_10() {
        let cli = Cli::try_parse_from([
            "cocoprep", "prepare", "-f", "in", "-o", "out", "-c", "phone",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Prepare(args)) => assert_eq!(args.split, vec![80, 10, 10]),
            _ => panic!("expected prepare"),
        }
    }
}
