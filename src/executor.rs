/// Chain execution: runs planned pipeline chains step by step, routing
/// temp artifacts between stages, falling through to the next chain on
/// the first hard failure.
///
/// Every chain attempt owns its own temp directory, so intermediate
/// artifacts cannot leak past the attempt no matter how it exits.
/// External tools run under a mandatory timeout.
use crate::constants::{AVIF_ENCODER_SPEED, TOOL_TIMEOUT, WEBP_METHOD, WEBP_QUALITY_BOOST};
use crate::error::{CompressionError, Result};
use crate::pipeline::{ConversionJob, PipelineChain, PipelineStep, TargetFormat};
use crate::tools::ExternalTool;
use image::codecs::avif::AvifEncoder;
use image::codecs::webp::WebPEncoder;
use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageReader};
use std::fs::{self, File};
use std::io::{BufWriter, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

/// Outcome of one successfully executed job. Byte counts come straight
/// from the filesystem, never from encoder estimates.
#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    pub output_path: PathBuf,
    pub output_format: TargetFormat,
    pub original_bytes: u64,
    pub compressed_bytes: u64,
}

/// Try each candidate chain in order until one produces a valid output
/// file. `output_stem` is the destination path without an extension;
/// the winning chain's target format decides the extension.
pub fn execute_job(
    job: &ConversionJob,
    chains: &[PipelineChain],
    output_stem: &Path,
) -> Result<ConversionOutcome> {
    if chains.is_empty() {
        return Err(CompressionError::NoAvailableTool(
            job.format.name().to_string(),
        ));
    }

    let original_bytes = fs::metadata(&job.input)?.len();

    for chain in chains {
        let output_path = output_stem.with_extension(chain.target.extension());
        match run_chain(job, chain, &output_path) {
            Ok(()) => {
                let compressed_bytes = fs::metadata(&output_path)
                    .map_err(|_| CompressionError::OutputWriteFailed(output_path.clone()))?
                    .len();
                crate::verbose!("chain succeeded: {}", chain);
                return Ok(ConversionOutcome {
                    output_path,
                    output_format: chain.target,
                    original_bytes,
                    compressed_bytes,
                });
            }
            Err(err) => {
                crate::verbose!("chain failed ({}): {}", chain, err);
            }
        }
    }

    Err(CompressionError::AllPipelinesFailed(job.input.clone()))
}

/// Run one chain attempt inside a scoped temp directory. The directory
/// (and every intermediate artifact in it) is removed when the attempt
/// ends, on success and failure alike.
fn run_chain(job: &ConversionJob, chain: &PipelineChain, output_path: &Path) -> Result<()> {
    let workdir = tempfile::tempdir()?;
    let mut current = job.input.clone();

    for (index, step) in chain.steps.iter().enumerate() {
        let extension = match step.output_kind() {
            crate::pipeline::ArtifactKind::Png => "png",
            _ => chain.target.extension(),
        };
        let next = workdir
            .path()
            .join(format!("stage-{}.{}", index, extension));

        run_step(step, job, &current, &next)?;

        // A tool that exits zero but writes nothing still failed.
        let produced = fs::metadata(&next).map(|m| m.len()).unwrap_or(0);
        if produced == 0 {
            return Err(CompressionError::ToolInvocationFailed {
                tool: step.to_string(),
                reason: "produced no output artifact".to_string(),
            });
        }
        current = next;
    }

    fs::copy(&current, output_path)
        .map_err(|_| CompressionError::OutputWriteFailed(output_path.to_path_buf()))?;
    Ok(())
}

fn run_step(step: &PipelineStep, job: &ConversionJob, input: &Path, output: &Path) -> Result<()> {
    match step {
        PipelineStep::DecodeToPng(ExternalTool::Dwebp) => {
            let mut cmd = Command::new("dwebp");
            cmd.arg(input).arg("-o").arg(output);
            run_with_timeout(cmd, "dwebp")
        }
        PipelineStep::DecodeToPng(ExternalTool::Avifdec) => {
            let mut cmd = Command::new("avifdec");
            cmd.arg(input).arg(output);
            run_with_timeout(cmd, "avifdec")
        }
        PipelineStep::DecodeToPng(ExternalTool::Sips) => {
            let mut cmd = Command::new("sips");
            cmd.arg("-s")
                .arg("format")
                .arg("png")
                .arg(input)
                .arg("--out")
                .arg(output);
            run_with_timeout(cmd, "sips")
        }
        PipelineStep::ResizeWithTool(ExternalTool::Sips) => {
            let mut cmd = Command::new("sips");
            cmd.arg("-Z")
                .arg(job.target_size.to_string())
                .arg(input)
                .arg("--out")
                .arg(output);
            run_with_timeout(cmd, "sips")
        }
        PipelineStep::ResizeWithTool(ExternalTool::Magick) => {
            let mut cmd = Command::new("magick");
            cmd.arg(input)
                .arg("-resize")
                .arg(format!("{0}x{0}", job.target_size))
                .arg(output);
            run_with_timeout(cmd, "magick")
        }
        PipelineStep::EncodeFromPng(ExternalTool::Avifenc) => {
            let mut cmd = Command::new("avifenc");
            cmd.arg("-q")
                .arg(job.quality.to_string())
                .arg("-s")
                .arg(AVIF_ENCODER_SPEED.to_string())
                .arg(input)
                .arg(output);
            run_with_timeout(cmd, "avifenc")
        }
        PipelineStep::EncodeFromPng(ExternalTool::Cwebp) => {
            let quality = job.quality.saturating_add(WEBP_QUALITY_BOOST).min(100);
            let mut cmd = Command::new("cwebp");
            cmd.arg("-q")
                .arg(quality.to_string())
                .arg("-m")
                .arg(WEBP_METHOD.to_string())
                .arg(input)
                .arg("-o")
                .arg(output);
            run_with_timeout(cmd, "cwebp")
        }
        PipelineStep::LibraryResize => {
            let img = ImageReader::open(input)?.decode()?;
            let resized = resize_to_fit(&img, job.target_size);
            resized.save_with_format(output, image::ImageFormat::Png)?;
            Ok(())
        }
        PipelineStep::LibraryEncode(target) => {
            // The intermediate PNG was already resized upstream.
            let img = ImageReader::open(input)?.decode()?;
            encode_with_library(&img, output, *target, job.quality)
        }
        PipelineStep::LibraryConvert(target) => {
            let img = ImageReader::open(input)?
                .with_guessed_format()?
                .decode()?;
            let resized = resize_to_fit(&img, job.target_size);
            encode_with_library(&resized, output, *target, job.quality)
        }
        // Remaining tool/step pairings are never planned by the selector.
        PipelineStep::DecodeToPng(tool)
        | PipelineStep::ResizeWithTool(tool)
        | PipelineStep::EncodeFromPng(tool) => Err(CompressionError::ToolInvocationFailed {
            tool: tool.to_string(),
            reason: "no invocation defined for this stage".to_string(),
        }),
    }
}

/// Fit within a size x size box, preserving aspect ratio (the same
/// semantics as `sips -Z`). Images already small enough pass through.
fn resize_to_fit(img: &DynamicImage, size: u32) -> DynamicImage {
    if img.width() <= size && img.height() <= size {
        img.clone()
    } else {
        img.resize(size, size, FilterType::Lanczos3)
    }
}

fn encode_with_library(
    img: &DynamicImage,
    output: &Path,
    target: TargetFormat,
    quality: u8,
) -> Result<()> {
    let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
    let writer = BufWriter::new(File::create(output)?);
    match target {
        TargetFormat::Avif => {
            let encoder = AvifEncoder::new_with_speed_quality(writer, AVIF_ENCODER_SPEED, quality);
            rgba.write_with_encoder(encoder)?;
        }
        TargetFormat::WebP => {
            // The library's WebP encoder is lossless-only; quality is
            // handled by the resize, not the encode.
            let encoder = WebPEncoder::new_lossless(writer);
            rgba.write_with_encoder(encoder)?;
        }
    }
    Ok(())
}

/// Run an external tool, killing it if it exceeds the per-step timeout.
/// A hung encoder must not stall the whole batch.
fn run_with_timeout(mut cmd: Command, tool: &str) -> Result<()> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| CompressionError::ToolInvocationFailed {
            tool: tool.to_string(),
            reason: e.to_string(),
        })?;

    // Drained on its own thread: a tool writing more than the pipe
    // buffer to stderr would otherwise block and read as a timeout.
    let mut stderr_thread = child.stderr.take().map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = String::new();
            let _ = pipe.read_to_string(&mut buf);
            buf
        })
    });

    let deadline = Instant::now() + TOOL_TIMEOUT;
    loop {
        match child.try_wait()? {
            Some(status) if status.success() => return Ok(()),
            Some(status) => {
                let stderr = collect_stderr(stderr_thread.take());
                return Err(CompressionError::ToolInvocationFailed {
                    tool: tool.to_string(),
                    reason: format!("exit status {}: {}", status, stderr.trim()),
                });
            }
            None => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = collect_stderr(stderr_thread.take());
                    return Err(CompressionError::ToolInvocationFailed {
                        tool: tool.to_string(),
                        reason: format!("timed out after {:?}", TOOL_TIMEOUT),
                    });
                }
                std::thread::sleep(std::time::Duration::from_millis(25));
            }
        }
    }
}

fn collect_stderr(handle: Option<std::thread::JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}
