use anyhow::{Context, Result};
use clap::Parser;
use webp_batch::batch::BatchOptions;
use webp_batch::cli::{Args, Commands};
use webp_batch::logger::{self, Verbosity};
use webp_batch::progress::BarProgress;
use webp_batch::report;
use webp_batch::session::Session;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    logger::set_verbosity(Verbosity::from_flags(args.quiet, args.verbose));

    if let Err(e) = run(args.command).await {
        webp_batch::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> Result<()> {
    let selection = command.selection();
    let output = command.output().clone();
    let options = BatchOptions::new(output.jobs.map(usize::from));

    webp_batch::info!("🚀 Starting WebP conversion...");
    webp_batch::info!("📁 Input: {}", selection.describe());
    webp_batch::info!("📁 Output: {:?}", output.output);

    let session = Session::new(options).context("failed to prepare preview storage")?;

    let count = session
        .select(&selection)
        .with_context(|| format!("nothing to convert in {}", selection.describe()))?;
    if count == 0 {
        webp_batch::warn!("No files found in the selection");
        return Ok(());
    }
    report::print_selection(count);

    let progress = BarProgress::new(count);
    let summary = session.convert(&progress).await?;

    {
        let state = session.state();
        report::print_cards(state.results());
        report::print_summary(&summary, state.total_saved(), state.results());
    }

    if output.zip {
        let archive = session
            .download_all(&output.output)
            .await
            .context("failed to create ZIP archive")?;
        report::print_written(&archive);
    } else {
        let converted = session.state().results().len();
        for index in 0..converted {
            let path = session
                .download_one(index, &output.output)
                .with_context(|| format!("failed to write result {}", index + 1))?;
            webp_batch::verbose!("Wrote {}", path.display());
        }
        report::print_written(&output.output);
    }

    session.reset();
    Ok(())
}
