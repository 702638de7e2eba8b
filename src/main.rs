use anyhow::Result;
use clap::Parser;
use emoji_squash::batch::{batch_compress_images, BatchOptions};
use emoji_squash::cli::{Args, Commands};
use emoji_squash::info::print_image_info;
use emoji_squash::logger;
use emoji_squash::tools::{print_probe_result, ToolCapability};

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Commands::Compress {
            input,
            output,
            size,
            quality,
            recursive,
            report,
            verbose,
            quiet,
        } => {
            logger::set_verbosity(quiet, verbose);
            let options = BatchOptions::new(size, quality, recursive, report)?;
            batch_compress_images(input, output, options)?;
        }
        Commands::Tools => {
            let caps = ToolCapability::probe();
            print_probe_result(&caps);
        }
        Commands::Info { input } => {
            print_image_info(&input)?;
        }
    }

    Ok(())
}
