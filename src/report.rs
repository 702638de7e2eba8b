/// Per-file outcome collection and the final compression report.
///
/// Aggregation is commutative over counts and byte sums, so arrival
/// order never changes the report. Failed jobs contribute zero bytes
/// to both totals: no compressed artifact exists, and an unprocessed
/// original does not count as processed volume, so failures cannot
/// skew the compression ratio.
use crate::error::{CompressionError, Result};
use chrono::Local;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Why a job failed, for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    UnsupportedFormat,
    NoAvailableTool,
    ToolInvocationFailed,
    AllPipelinesFailed,
    OutputWriteFailed,
    Io,
}

impl FailureKind {
    pub fn from_error(err: &CompressionError) -> Self {
        match err {
            CompressionError::UnsupportedFormat(_) => FailureKind::UnsupportedFormat,
            CompressionError::NoAvailableTool(_) => FailureKind::NoAvailableTool,
            CompressionError::ToolInvocationFailed { .. } => FailureKind::ToolInvocationFailed,
            CompressionError::AllPipelinesFailed(_) => FailureKind::AllPipelinesFailed,
            CompressionError::OutputWriteFailed(_) => FailureKind::OutputWriteFailed,
            _ => FailureKind::Io,
        }
    }
}

/// Outcome of one conversion job. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionResult {
    pub file: PathBuf,
    pub success: bool,
    pub original_bytes: u64,
    pub compressed_bytes: u64,
    pub output_format: Option<String>,
    pub error_kind: Option<FailureKind>,
}

impl ConversionResult {
    pub fn succeeded(
        file: PathBuf,
        original_bytes: u64,
        compressed_bytes: u64,
        output_format: String,
    ) -> Self {
        Self {
            file,
            success: true,
            original_bytes,
            compressed_bytes,
            output_format: Some(output_format),
            error_kind: None,
        }
    }

    pub fn failed(file: PathBuf, kind: FailureKind) -> Self {
        Self {
            file,
            success: false,
            original_bytes: 0,
            compressed_bytes: 0,
            output_format: None,
            error_kind: Some(kind),
        }
    }
}

/// Aggregate statistics over a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct CompressionReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub original_bytes: u64,
    pub compressed_bytes: u64,
    /// 1 - compressed/original, as a percentage. 0 when nothing succeeded.
    pub compression_ratio: f64,
    /// Mean compressed output size over successful jobs. 0 when none.
    pub average_compressed_bytes: u64,
}

/// Collects results in arrival order and produces the report on demand.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    results: Vec<ConversionResult>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: ConversionResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[ConversionResult] {
        &self.results
    }

    pub fn build(&self) -> CompressionReport {
        let total = self.results.len();
        let successful = self.results.iter().filter(|r| r.success).count();
        let original_bytes: u64 = self.results.iter().map(|r| r.original_bytes).sum();
        let compressed_bytes: u64 = self.results.iter().map(|r| r.compressed_bytes).sum();

        let compression_ratio = if original_bytes > 0 {
            (1.0 - compressed_bytes as f64 / original_bytes as f64) * 100.0
        } else {
            0.0
        };
        let average_compressed_bytes = if successful > 0 {
            compressed_bytes / successful as u64
        } else {
            0
        };

        CompressionReport {
            total,
            successful,
            failed: total - successful,
            original_bytes,
            compressed_bytes,
            compression_ratio,
            average_compressed_bytes,
        }
    }
}

/// Run configuration echoed into the saved report.
#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    pub input: String,
    pub output: PathBuf,
    pub target_size: u32,
    pub quality: u8,
    pub available_tools: Vec<&'static str>,
}

#[derive(Serialize)]
struct SavedReport<'a> {
    timestamp: String,
    configuration: &'a RunConfig,
    summary: CompressionReport,
    results: &'a [ConversionResult],
}

/// Persist the full run report (summary plus per-file detail) as JSON.
pub fn save_report(path: &Path, config: &RunConfig, builder: &ReportBuilder) -> Result<()> {
    let saved = SavedReport {
        timestamp: Local::now().to_rfc3339(),
        configuration: config,
        summary: builder.build(),
        results: builder.results(),
    };
    let json = serde_json::to_string_pretty(&saved)?;
    fs::write(path, json).map_err(|_| CompressionError::OutputWriteFailed(path.to_path_buf()))?;
    Ok(())
}

pub fn print_report(report: &CompressionReport) {
    crate::info!("\n📊 Compression Summary:");
    crate::info!("  📁 Total files: {}", report.total);
    crate::info!("  ✅ Successful: {}", report.successful);
    crate::info!("  ❌ Failed: {}", report.failed);
    crate::info!("  📊 Original size: {} bytes", report.original_bytes);
    crate::info!("  📈 Compressed size: {} bytes", report.compressed_bytes);
    crate::info!("  🎯 Compression ratio: {:.1}%", report.compression_ratio);
    crate::info!(
        "  📏 Average output size: {} bytes",
        report.average_compressed_bytes
    );
}
