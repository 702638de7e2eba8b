/// Conversion pipeline planning.
///
/// A pipeline chain is data: an ordered list of tool invocations that
/// the executor interprets step by step. Adding a tool or format means
/// adding chain descriptors here, not new control flow in the executor.
use crate::detect::SniffedFormat;
use crate::tools::{ExternalTool, ToolCapability};
use std::fmt;
use std::path::PathBuf;

/// Format the final encode stage produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    Avif,
    WebP,
}

impl TargetFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::Avif => "avif",
            TargetFormat::WebP => "webp",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TargetFormat::Avif => "AVIF",
            TargetFormat::WebP => "WebP",
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Artifact passed between chain steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// The untouched input file.
    Source,
    /// Intermediate PNG (the alpha-safe interchange format).
    Png,
    /// The compressed output artifact.
    Final,
}

/// One tool invocation within a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStep {
    /// Decode the source into a PNG via an external decoder (dwebp, avifdec).
    DecodeToPng(ExternalTool),
    /// Resize a PNG in place via an external resizer (sips, magick).
    ResizeWithTool(ExternalTool),
    /// Resize a PNG via the image library.
    LibraryResize,
    /// Encode a PNG into the target format via an external encoder
    /// (avifenc, cwebp).
    EncodeFromPng(ExternalTool),
    /// Encode a PNG into the target format via the image library.
    LibraryEncode(TargetFormat),
    /// Single-stage fallback: open the source with the image library,
    /// resize, and encode directly.
    LibraryConvert(TargetFormat),
}

impl PipelineStep {
    pub fn input_kind(&self) -> ArtifactKind {
        match self {
            PipelineStep::DecodeToPng(_) | PipelineStep::LibraryConvert(_) => ArtifactKind::Source,
            PipelineStep::ResizeWithTool(_)
            | PipelineStep::LibraryResize
            | PipelineStep::EncodeFromPng(_)
            | PipelineStep::LibraryEncode(_) => ArtifactKind::Png,
        }
    }

    pub fn output_kind(&self) -> ArtifactKind {
        match self {
            PipelineStep::DecodeToPng(_)
            | PipelineStep::ResizeWithTool(_)
            | PipelineStep::LibraryResize => ArtifactKind::Png,
            PipelineStep::EncodeFromPng(_)
            | PipelineStep::LibraryEncode(_)
            | PipelineStep::LibraryConvert(_) => ArtifactKind::Final,
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStep::DecodeToPng(tool)
            | PipelineStep::ResizeWithTool(tool)
            | PipelineStep::EncodeFromPng(tool) => write!(f, "{}", tool),
            PipelineStep::LibraryResize => write!(f, "library-resize"),
            PipelineStep::LibraryEncode(target) => {
                write!(f, "library-encode-{}", target.extension())
            }
            PipelineStep::LibraryConvert(target) => {
                write!(f, "library-{}", target.extension())
            }
        }
    }
}

/// Ordered sequence of steps from source file to compressed output.
#[derive(Debug, Clone)]
pub struct PipelineChain {
    pub steps: Vec<PipelineStep>,
    pub target: TargetFormat,
    pub preserves_alpha: bool,
}

impl PipelineChain {
    fn tool_chain(steps: Vec<PipelineStep>, target: TargetFormat) -> Self {
        Self {
            steps,
            target,
            preserves_alpha: true,
        }
    }

    fn library_chain(target: TargetFormat, preserves_alpha: bool) -> Self {
        Self {
            steps: vec![PipelineStep::LibraryConvert(target)],
            target,
            preserves_alpha,
        }
    }
}

impl fmt::Display for PipelineChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{}", step)?;
        }
        Ok(())
    }
}

/// One input file with everything the pipeline needs to know about it.
/// Created per file, consumed whole, never mutated.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub input: PathBuf,
    pub format: SniffedFormat,
    pub target_size: u32,
    pub quality: u8,
    pub needs_alpha: bool,
}

/// Plan the candidate chains for one job, most preferred first. Pure:
/// no I/O, no probing; the capability set was established at startup.
///
/// Policy: WebP with alpha goes through dwebp's PNG round-trip so the
/// alpha channel survives; AVIF is decoded and re-encoded around an
/// OS-native resize; PNG/JPEG go straight through the image library.
/// Chains that preserve transparency always outrank chains that do not
/// when the input has transparency.
pub fn select_chains(
    format: SniffedFormat,
    needs_alpha: bool,
    caps: &ToolCapability,
) -> Vec<PipelineChain> {
    let mut chains = match format {
        SniffedFormat::WebP => webp_chains(caps),
        SniffedFormat::Avif => avif_chains(caps),
        SniffedFormat::Png | SniffedFormat::Jpeg => library_chains(),
        SniffedFormat::Unknown => Vec::new(),
    };

    if needs_alpha {
        // Stable sort keeps the per-group preference order intact.
        chains.sort_by_key(|chain| !chain.preserves_alpha);
    }

    chains
}

/// Resize stages in preference order: OS-native first, then
/// ImageMagick, then the library.
fn resize_steps(caps: &ToolCapability) -> Vec<PipelineStep> {
    let mut steps = Vec::new();
    if caps.has(ExternalTool::Sips) {
        steps.push(PipelineStep::ResizeWithTool(ExternalTool::Sips));
    }
    if caps.has(ExternalTool::Magick) {
        steps.push(PipelineStep::ResizeWithTool(ExternalTool::Magick));
    }
    steps.push(PipelineStep::LibraryResize);
    steps
}

/// Final encode stages in preference order: AVIF, degrading to WebP,
/// ending with the library encoder so a decode chain stays viable on
/// hosts with no external encoder at all.
fn encode_steps(caps: &ToolCapability) -> Vec<PipelineStep> {
    let mut steps = Vec::new();
    if caps.has(ExternalTool::Avifenc) {
        steps.push(PipelineStep::EncodeFromPng(ExternalTool::Avifenc));
    }
    if caps.has(ExternalTool::Cwebp) {
        steps.push(PipelineStep::EncodeFromPng(ExternalTool::Cwebp));
    }
    steps.push(PipelineStep::LibraryEncode(TargetFormat::Avif));
    steps
}

fn webp_chains(caps: &ToolCapability) -> Vec<PipelineChain> {
    let mut chains = Vec::new();

    if caps.has(ExternalTool::Dwebp) {
        for encode in encode_steps(caps) {
            let target = encode_target(encode);
            for resize in resize_steps(caps) {
                chains.push(PipelineChain::tool_chain(
                    vec![
                        PipelineStep::DecodeToPng(ExternalTool::Dwebp),
                        resize,
                        encode,
                    ],
                    target,
                ));
            }
        }
    }

    // The library opens WebP directly but its lossless re-encode path
    // does not round-trip alpha as faithfully as dwebp's PNG decode.
    chains.push(PipelineChain::library_chain(TargetFormat::Avif, false));
    chains
}

fn avif_chains(caps: &ToolCapability) -> Vec<PipelineChain> {
    let mut chains = Vec::new();

    // The library cannot decode AVIF, so every real chain starts with
    // an external decoder: avifdec, or sips (which reads AVIF natively
    // on hosts without libavif).
    let mut decoders = Vec::new();
    if caps.has(ExternalTool::Avifdec) {
        decoders.push(PipelineStep::DecodeToPng(ExternalTool::Avifdec));
    }
    if caps.has(ExternalTool::Sips) {
        decoders.push(PipelineStep::DecodeToPng(ExternalTool::Sips));
    }

    for decode in decoders {
        for encode in encode_steps(caps) {
            let target = encode_target(encode);
            for resize in resize_steps(caps) {
                chains.push(PipelineChain::tool_chain(vec![decode, resize, encode], target));
            }
        }
    }

    // Last resort; the decode fails unless the library gains AVIF
    // support, and the executor reports AllPipelinesFailed.
    chains.push(PipelineChain::library_chain(TargetFormat::Avif, true));
    chains
}

/// PNG and JPEG either lack alpha or carry it losslessly through the
/// library, so a single-stage chain is enough.
fn library_chains() -> Vec<PipelineChain> {
    vec![
        PipelineChain::library_chain(TargetFormat::Avif, true),
        PipelineChain::library_chain(TargetFormat::WebP, true),
    ]
}

fn encode_target(step: PipelineStep) -> TargetFormat {
    match step {
        PipelineStep::EncodeFromPng(ExternalTool::Cwebp) => TargetFormat::WebP,
        PipelineStep::LibraryEncode(target) => target,
        _ => TargetFormat::Avif,
    }
}
