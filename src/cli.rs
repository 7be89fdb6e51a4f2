use crate::constants::{MAX_JOBS, MIN_JOBS};
use crate::selection::Selection;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "webp-batch",
    about = "Batch convert images to WebP and bundle them into a ZIP archive",
    long_about = "webp-batch converts a selection of images (PNG, JPEG, GIF, BMP, TIFF, WebP) to WebP \
                  entirely on the local machine. Results are written one file per image, or bundled \
                  into a single timestamped ZIP archive.",
    version,
    after_help = "EXAMPLES:\n  \
    webp-batch convert photo.png scan.jpg -o ./webp\n  \
    webp-batch convert \"./shots/*.png\" -o ./webp --zip\n  \
    webp-batch folder ./album -o ./webp --zip -j 4"
)]
pub struct Args {
    #[arg(short, long, global = true, help = "Only print errors")]
    pub quiet: bool,

    #[arg(short, long, global = true, help = "Print per-file details")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(
        about = "Convert selected image files",
        long_about = "Convert an explicit selection of files. Each input may be a file path or a \
                      glob pattern. Files whose type is not an image are ignored."
    )]
    Convert {
        #[arg(
            required = true,
            help = "Image files or glob patterns",
            long_help = "Image files or glob patterns, converted in the order given. \
                         Examples: photo.png, './shots/*.{png,jpg}'"
        )]
        inputs: Vec<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    #[command(
        about = "Convert every image in a folder",
        long_about = "Walk a folder recursively and convert every image found in it. \
                      Hidden files and folders are skipped."
    )]
    Folder {
        #[arg(help = "Folder to convert recursively")]
        dir: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct OutputArgs {
    #[arg(short = 'o', long, help = "Output directory")]
    pub output: PathBuf,

    #[arg(
        short = 'z',
        long,
        help = "Bundle all results into one ZIP archive",
        long_help = "Write a single archive named webp-images-<timestamp>.zip instead of \
                     one .webp file per image."
    )]
    pub zip: bool,

    #[arg(
        short = 'j',
        long,
        value_parser = clap::value_parser!(u16).range(MIN_JOBS as i64..=MAX_JOBS as i64),
        help = "Number of images converted at once (default: 1)",
        long_help = "Number of images converted at the same time. The default of 1 converts \
                     strictly one image after another. Results keep the selection order either way."
    )]
    pub jobs: Option<u16>,
}

impl Commands {
    pub fn selection(&self) -> Selection {
        match self {
            Commands::Convert { inputs, .. } => Selection::Files(inputs.clone()),
            Commands::Folder { dir, .. } => Selection::Directory(dir.clone()),
        }
    }

    pub fn output(&self) -> &OutputArgs {
        match self {
            Commands::Convert { output, .. } | Commands::Folder { output, .. } => output,
        }
    }
}
