pub mod batch;
pub mod cli;
pub mod constants;
pub mod detect;
pub mod error;
pub mod executor;
pub mod info;
pub mod logger;
pub mod pipeline;
pub mod report;
pub mod tools;

pub use batch::{batch_compress_images, collect_image_files, is_image_file, BatchOptions};
pub use detect::{detect_format, has_alpha, SniffedFormat};
pub use error::{CompressionError, Result};
pub use executor::{execute_job, ConversionOutcome};
pub use info::print_image_info;
pub use pipeline::{select_chains, ConversionJob, PipelineChain, PipelineStep, TargetFormat};
pub use report::{CompressionReport, ConversionResult, FailureKind, ReportBuilder};
pub use tools::{ExternalTool, ToolCapability};
