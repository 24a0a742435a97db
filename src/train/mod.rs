//! External trainer launcher.
//!
//! Training is fully delegated to the Ultralytics `yolo` CLI; this module
//! only assembles the fixed hyperparameter set and spawns the process.

use std::path::PathBuf;
use std::process::Command;

use crate::error::Sly2YoloError;

/// Options for launching a training run.
///
/// Defaults (applied at the CLI layer): yolov8n.pt, 100 epochs, 640 image
/// size, batch 8, patience 15.
#[derive(Clone, Debug)]
pub struct TrainOptions {
    /// Path to the dataset manifest (`data.yaml`).
    pub data: PathBuf,
    /// Base model weights.
    pub model: String,
    pub epochs: u32,
    pub imgsz: u32,
    pub batch: u32,
    /// Run name under the trainer's output directory.
    pub name: String,
    /// Early-stopping patience in epochs.
    pub patience: u32,
    /// Trainer executable to invoke.
    pub program: String,
    /// Print the command line instead of spawning it.
    pub dry_run: bool,
}

/// The exact argument vector passed to the trainer.
pub fn training_args(opts: &TrainOptions) -> Vec<String> {
    vec![
        "detect".to_string(),
        "train".to_string(),
        format!("data={}", opts.data.display()),
        format!("model={}", opts.model),
        format!("epochs={}", opts.epochs),
        format!("imgsz={}", opts.imgsz),
        format!("batch={}", opts.batch),
        format!("name={}", opts.name),
        format!("patience={}", opts.patience),
        "save=True".to_string(),
        "plots=True".to_string(),
    ]
}

/// Launch the external trainer and wait for it to finish.
pub fn run_training(opts: &TrainOptions) -> Result<(), Sly2YoloError> {
    let args = training_args(opts);

    if opts.dry_run {
        println!("{} {}", opts.program, args.join(" "));
        return Ok(());
    }

    let status = Command::new(&opts.program)
        .args(&args)
        .status()
        .map_err(|source| Sly2YoloError::TrainerSpawn {
            program: opts.program.clone(),
            source,
        })?;

    if !status.success() {
        return Err(Sly2YoloError::TrainerExit {
            program: opts.program.clone(),
            status,
        });
    }

    Ok(())
}
