//! sly2yolo: Supervisely annotation exports to YOLO datasets.
//!
//! sly2yolo converts per-image Supervisely JSON annotation files into the
//! directory-based label format consumed by Ultralytics YOLO trainers,
//! splits the result into train/val subsets, and can hand the dataset off
//! to an external trainer.
//!
//! # Modules
//!
//! - [`sly`]: Supervisely annotation schema and reader
//! - [`yolo`]: label-line rendering, class mapping, dataset manifests
//! - [`convert`]: the batch conversion pipeline and its report
//! - [`split`]: train/val splitting
//! - [`train`]: external trainer launcher
//! - [`error`]: error types for sly2yolo operations

pub mod convert;
pub mod error;
pub mod geom;
pub mod sly;
pub mod split;
pub mod train;
pub mod yolo;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use error::Sly2YoloError;

/// The sly2yolo CLI application.
#[derive(Parser)]
#[command(name = "sly2yolo")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Convert a Supervisely export into a YOLO dataset.
    Convert(ConvertArgs),
    /// Split a converted dataset into train/val subsets.
    Split(SplitArgs),
    /// Launch the external YOLO trainer on a converted dataset.
    Train(TrainArgs),
}

/// Arguments for the convert subcommand.
#[derive(clap::Args)]
struct ConvertArgs {
    /// Directory of Supervisely JSON annotation files.
    #[arg(long)]
    ann_dir: PathBuf,

    /// Directory of image files, matched to annotations by filename stem.
    #[arg(long)]
    img_dir: PathBuf,

    /// Output dataset root.
    #[arg(long, default_value = "yolo_dataset")]
    output: PathBuf,

    /// Output format for the run report ('text' or 'json').
    #[arg(long, default_value = "text")]
    report: String,
}

/// Arguments for the split subcommand.
#[derive(clap::Args)]
struct SplitArgs {
    /// Converted dataset root (contains images/ and labels/).
    #[arg(long)]
    input: PathBuf,

    /// Output root for the train/ and val/ subtrees.
    #[arg(long)]
    output: PathBuf,

    /// Fraction of images assigned to validation.
    #[arg(long, default_value_t = 0.2)]
    val_fraction: f64,

    /// Seed for the shuffle (omit for a random split).
    #[arg(long)]
    seed: Option<u64>,
}

/// Arguments for the train subcommand.
#[derive(clap::Args)]
struct TrainArgs {
    /// Dataset manifest passed to the trainer.
    #[arg(long, default_value = "data.yaml")]
    data: PathBuf,

    /// Base model weights.
    #[arg(long, default_value = "yolov8n.pt")]
    model: String,

    #[arg(long, default_value_t = 100)]
    epochs: u32,

    #[arg(long, default_value_t = 640)]
    imgsz: u32,

    #[arg(long, default_value_t = 8)]
    batch: u32,

    /// Run name under the trainer's output directory.
    #[arg(long, default_value = "stain_detection")]
    name: String,

    /// Early-stopping patience in epochs.
    #[arg(long, default_value_t = 15)]
    patience: u32,

    /// Trainer executable to invoke.
    #[arg(long, default_value = "yolo")]
    program: String,

    /// Print the trainer command line without running it.
    #[arg(long)]
    dry_run: bool,
}

/// Run the sly2yolo CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), Sly2YoloError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Convert(args)) => run_convert(args),
        Some(Commands::Split(args)) => run_split(args),
        Some(Commands::Train(args)) => run_train(args),
        None => {
            println!("sly2yolo {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Convert Supervisely annotation exports into YOLO datasets.");
            println!();
            println!("Run 'sly2yolo --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the convert subcommand.
fn run_convert(args: ConvertArgs) -> Result<(), Sly2YoloError> {
    let opts = convert::ConvertOptions {
        ann_dir: args.ann_dir,
        img_dir: args.img_dir,
        output: args.output,
    };
    let report = convert::convert_dataset(&opts)?;

    match args.report.as_str() {
        "json" => {
            let json =
                serde_json::to_string_pretty(&report).expect("report serialization cannot fail");
            println!("{}", json);
        }
        _ => {
            println!("Converted dataset written to {}", opts.output.display());
            print!("{}", report);
        }
    }

    Ok(())
}

/// Execute the split subcommand.
fn run_split(args: SplitArgs) -> Result<(), Sly2YoloError> {
    let opts = split::SplitOptions {
        input: args.input,
        output: args.output,
        val_fraction: args.val_fraction,
        seed: args.seed,
    };
    let summary = split::split_dataset(&opts)?;

    println!("Split dataset written to {}", opts.output.display());
    print!("{}", summary);

    Ok(())
}

/// Execute the train subcommand.
fn run_train(args: TrainArgs) -> Result<(), Sly2YoloError> {
    let opts = train::TrainOptions {
        data: args.data,
        model: args.model,
        epochs: args.epochs,
        imgsz: args.imgsz,
        batch: args.batch,
        name: args.name,
        patience: args.patience,
        program: args.program,
        dry_run: args.dry_run,
    };

    train::run_training(&opts)
}
