use std::path::PathBuf;
use thiserror::Error;

/// The main error type for sly2yolo operations.
#[derive(Debug, Error)]
pub enum Sly2YoloError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input directory does not exist: {path}")]
    MissingInputDir { path: PathBuf },

    #[error("Failed to parse annotation JSON from {path}: {source}")]
    AnnotationParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse data.yaml at {path}: {source}")]
    DataYamlParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid split parameters: {message}")]
    InvalidSplitParams { message: String },

    #[error("Split failed: {message}")]
    SplitFailed { message: String },

    #[error("Failed to launch trainer '{program}': {source}")]
    TrainerSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Trainer '{program}' exited with {status}")]
    TrainerExit {
        program: String,
        status: std::process::ExitStatus,
    },
}
