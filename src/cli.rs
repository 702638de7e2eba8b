use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "emoji-squash",
    about = "Batch emoji/sticker compressor with format-aware AVIF/WebP conversion pipelines",
    long_about = "emoji-squash converts directories of emoji and sticker images (PNG, JPEG, WebP, AVIF) \
                  to compact AVIF output at a target pixel size, preserving transparency. It detects each \
                  file's real format from its bytes, drives external converters (avifenc, avifdec, dwebp, \
                  cwebp, sips, magick) when available, and falls back to a built-in image library path \
                  when they are not.",
    version = "0.1.0",
    after_help = "EXAMPLES:\n  \
    emoji-squash compress origins output -s 60 -q 50\n  \
    emoji-squash compress ./stickers ./compressed -r --report run.json\n  \
    emoji-squash tools\n  \
    emoji-squash info sticker.webp"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(
        about = "Compress a directory of emoji images",
        long_about = "Compress every image under the input path to the target size and quality. \
                      Transparent WebP goes through an alpha-preserving dwebp/avifenc chain when \
                      those tools are present; each file falls back to less preferred chains until \
                      one succeeds."
    )]
    Compress {
        #[arg(help = "Input directory, file, or glob pattern")]
        input: String,

        #[arg(help = "Output directory path")]
        output: PathBuf,

        #[arg(
            short = 's',
            long,
            help = "Target size in pixels (default: 60)",
            long_help = "Target square bounding box in pixels. Images are resized to fit within \
                         size x size, preserving aspect ratio."
        )]
        size: Option<u32>,

        #[arg(
            short = 'q',
            long,
            help = "Compression quality (1-100, default: 50)",
            long_help = "Encoder quality passed through to whichever tool performs the final encode. \
                         The cwebp degradation path uses quality+30 capped at 100."
        )]
        quality: Option<u8>,

        #[arg(short = 'r', long, help = "Process subdirectories recursively")]
        recursive: bool,

        #[arg(
            long,
            help = "Write a detailed JSON report to this path",
            long_help = "Save a JSON report with the run configuration, probed tools, aggregate \
                         summary, and per-file results."
        )]
        report: Option<PathBuf>,

        #[arg(short = 'v', long, help = "Show per-file pipeline details")]
        verbose: bool,

        #[arg(long, help = "Suppress all non-error output")]
        quiet: bool,
    },

    #[command(about = "Show which external conversion tools are available")]
    Tools,

    #[command(
        about = "Show detected format and transparency for one file",
        long_about = "Inspect a single file: detected format (from magic bytes, not the extension), \
                      transparency flag, file size, and dimensions where decodable."
    )]
    Info {
        #[arg(help = "Image file path to analyze")]
        input: PathBuf,
    },
}
