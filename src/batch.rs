use crate::constants::{
    DEFAULT_QUALITY, DEFAULT_TARGET_SIZE, MAX_QUALITY, MIN_QUALITY, SUPPORTED_IMAGE_EXTENSIONS,
};
use crate::detect::{detect_format, has_alpha};
use crate::error::{CompressionError, Result};
use crate::executor::execute_job;
use crate::pipeline::{select_chains, ConversionJob};
use crate::report::{
    print_report, save_report, CompressionReport, ConversionResult, FailureKind, ReportBuilder,
    RunConfig,
};
use crate::tools::ToolCapability;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use walkdir::WalkDir;

/// Validated batch configuration, one per run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub target_size: u32,
    pub quality: u8,
    pub recursive: bool,
    pub report_path: Option<PathBuf>,
}

impl BatchOptions {
    pub fn new(
        target_size: Option<u32>,
        quality: Option<u8>,
        recursive: bool,
        report_path: Option<PathBuf>,
    ) -> Result<Self> {
        let target_size = target_size.unwrap_or(DEFAULT_TARGET_SIZE);
        if target_size == 0 {
            return Err(CompressionError::InvalidTargetSize(target_size));
        }
        let quality = quality.unwrap_or(DEFAULT_QUALITY);
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
            return Err(CompressionError::InvalidQuality(quality));
        }

        Ok(Self {
            target_size,
            quality,
            recursive,
            report_path,
        })
    }
}

/// Compress every image under `input` into `output`, sequentially, and
/// report aggregate statistics. One file's failure never aborts the
/// batch; only an unusable output directory does.
pub fn batch_compress_images(
    input: String,
    output: PathBuf,
    options: BatchOptions,
) -> Result<CompressionReport> {
    crate::info!("🚀 Starting emoji compression...");
    crate::info!("📁 Input: {}", input);
    crate::info!("📁 Output: {:?}", output);
    crate::info!(
        "🎯 Target: {0}x{0} pixels, quality {1}",
        options.target_size,
        options.quality
    );

    let start_time = Instant::now();

    let image_files = collect_image_files(&input, options.recursive)?;
    if image_files.is_empty() {
        crate::warn!("No image files found in the input path");
        return Ok(ReportBuilder::new().build());
    }
    crate::info!("📊 Found {} image files to process", image_files.len());

    // Fatal environment check: without an output directory nothing can run.
    fs::create_dir_all(&output)
        .map_err(|_| CompressionError::DirectoryCreationFailed(output.clone()))?;

    // Probed once; read-only for the rest of the run.
    let caps = ToolCapability::probe();
    crate::info!("🔧 Available tools: {}", caps.names().join(", "));
    if caps.is_empty() {
        crate::warn!("No external converters found; using the image library for everything");
        crate::warn!("For better results install libavif (avifenc/avifdec) and webp (dwebp/cwebp)");
    }

    // A user interrupt stops taking new jobs but still flushes the
    // statistics accumulated so far.
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let flag = interrupted.clone();
        let _ = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst));
    }

    let progress = ProgressBar::new(image_files.len() as u64);
    progress.set_style(ProgressStyle::default_bar());

    let mut builder = ReportBuilder::new();
    for input_path in &image_files {
        if interrupted.load(Ordering::SeqCst) {
            crate::warn!("Interrupted; reporting partial results");
            break;
        }

        let result = process_single_image(input_path, &output, &options, &caps);
        if let (false, Some(kind)) = (result.success, result.error_kind) {
            crate::error!("{:?}: {:?}", input_path, kind);
        }
        builder.record(result);
        progress.inc(1);
    }
    progress.finish_and_clear();

    let report = builder.build();
    print_report(&report);
    crate::info!("  ⏱️  Total time: {:?}", start_time.elapsed());

    if let Some(report_path) = &options.report_path {
        let config = RunConfig {
            input,
            output,
            target_size: options.target_size,
            quality: options.quality,
            available_tools: caps.names(),
        };
        save_report(report_path, &config, &builder)?;
        crate::info!("💾 Detailed report saved to {:?}", report_path);
    }

    Ok(report)
}

/// Detect, plan, and execute one job. Always yields exactly one
/// `ConversionResult`, success or failure.
fn process_single_image(
    input_path: &Path,
    output_dir: &Path,
    options: &BatchOptions,
    caps: &ToolCapability,
) -> ConversionResult {
    crate::verbose!("processing {:?}", input_path);

    let bytes = match fs::read(input_path) {
        Ok(bytes) => bytes,
        Err(_) => return ConversionResult::failed(input_path.to_path_buf(), FailureKind::Io),
    };

    let format = detect_format(&bytes);
    if !format.is_known() {
        // Unknown bytes never reach the pipeline.
        return ConversionResult::failed(input_path.to_path_buf(), FailureKind::UnsupportedFormat);
    }
    let needs_alpha = has_alpha(&bytes, format);
    crate::verbose!("detected {} (alpha: {})", format, needs_alpha);

    let job = ConversionJob {
        input: input_path.to_path_buf(),
        format,
        target_size: options.target_size,
        quality: options.quality,
        needs_alpha,
    };

    let chains = select_chains(format, needs_alpha, caps);
    let output_stem = match output_stem_for(input_path, output_dir) {
        Ok(stem) => stem,
        Err(err) => {
            return ConversionResult::failed(
                input_path.to_path_buf(),
                FailureKind::from_error(&err),
            )
        }
    };

    match execute_job(&job, &chains, &output_stem) {
        Ok(outcome) => {
            crate::verbose!(
                "{} -> {} bytes ({})",
                outcome.original_bytes,
                outcome.compressed_bytes,
                outcome.output_format
            );
            ConversionResult::succeeded(
                input_path.to_path_buf(),
                outcome.original_bytes,
                outcome.compressed_bytes,
                outcome.output_format.name().to_string(),
            )
        }
        Err(err) => {
            ConversionResult::failed(input_path.to_path_buf(), FailureKind::from_error(&err))
        }
    }
}

/// Destination path minus extension; the executor appends the winning
/// chain's extension.
fn output_stem_for(input_path: &Path, output_dir: &Path) -> Result<PathBuf> {
    let file_stem = input_path
        .file_stem()
        .ok_or_else(|| CompressionError::UnsupportedFormat("Invalid file name".to_string()))?;
    Ok(output_dir.join(file_stem))
}

/// Gather candidate files from a file path, a directory, or a glob
/// pattern, in directory-listing order. Hidden files are skipped.
pub fn collect_image_files(input: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut image_files = Vec::new();
    let input_path = Path::new(input);

    if input_path.is_file() {
        image_files.push(input_path.to_path_buf());
    } else if input_path.is_dir() {
        let walker = if recursive {
            WalkDir::new(input_path).into_iter()
        } else {
            WalkDir::new(input_path).max_depth(1).into_iter()
        };

        // The root is exempt from the hidden filter: a dot-named input
        // directory was named explicitly by the user.
        for entry in walker.filter_entry(|e| {
            e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.')
        }) {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && is_image_file(path) {
                image_files.push(path.to_path_buf());
            }
        }
    } else if let Ok(glob_pattern) = glob(input) {
        for entry in glob_pattern.flatten() {
            if entry.is_file() && is_image_file(&entry) {
                image_files.push(entry);
            }
        }
    } else {
        return Err(CompressionError::NoImageFilesFound(input.to_string()));
    }

    Ok(image_files)
}

/// Extension-based pre-filter for directory walking. Final
/// classification still happens on file content.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| SUPPORTED_IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
