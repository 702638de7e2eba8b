use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    ImageProcessing(#[from] image::ImageError),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("No conversion tool available for {0} input")]
    NoAvailableTool(String),

    #[error("Tool '{tool}' failed: {reason}")]
    ToolInvocationFailed { tool: String, reason: String },

    #[error("All conversion pipelines failed for {0}")]
    AllPipelinesFailed(PathBuf),

    #[error("Failed to write output file: {0}")]
    OutputWriteFailed(PathBuf),

    #[error("Invalid quality value: {0}. Must be between 1 and 100")]
    InvalidQuality(u8),

    #[error("Invalid target size: {0}. Must be a positive pixel count")]
    InvalidTargetSize(u32),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to create output directory: {0}")]
    DirectoryCreationFailed(PathBuf),

    #[error("No image files found in input path: {0}")]
    NoImageFilesFound(String),

    #[error("Walkdir error: {0}")]
    WalkdirError(#[from] walkdir::Error),

    #[error("Report serialization error: {0}")]
    ReportSerialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CompressionError>;
