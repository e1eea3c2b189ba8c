use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use storyreel::{
    CaptureConfig, CaptureSession, FfmpegEncoder, Storyboard, StripViewport, is_ffmpeg_on_path,
    total_duration,
};

#[derive(Parser, Debug)]
#[command(name = "storyreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the resolved playback schedule of a storyboard.
    Plan(PlanArgs),
    /// Play a storyboard back and record it as an MP4 (requires `ffmpeg` on PATH).
    Record(RecordArgs),
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// Storyboard rows JSON.
    #[arg(long)]
    storyboard: PathBuf,
}

#[derive(Parser, Debug)]
struct RecordArgs {
    /// Storyboard rows JSON.
    #[arg(long)]
    storyboard: PathBuf,

    /// Capture configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory to save the recording into (overrides the config).
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Plan(args) => cmd_plan(args),
        Command::Record(args) => cmd_record(args).await,
    }
}

fn secs(d: Duration) -> String {
    format!("{:.3}s", d.as_secs_f64())
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let storyboard = Storyboard::load(&args.storyboard)?;
    let items = storyboard.items();

    let mut start = Duration::ZERO;
    for item in &items {
        println!(
            "#{:<3} start {:>9}  duration {:>9}",
            item.sequence_index,
            secs(start),
            secs(item.duration())
        );
        start += item.duration();
    }
    println!("{} items, total {}", items.len(), secs(total_duration(&items)));
    Ok(())
}

async fn cmd_record(args: RecordArgs) -> anyhow::Result<()> {
    let storyboard = Storyboard::load(&args.storyboard)?;
    if storyboard.is_empty() {
        anyhow::bail!("storyboard '{}' has no rows", args.storyboard.display());
    }

    let cfg = match &args.config {
        Some(path) => CaptureConfig::load(path)?,
        None => CaptureConfig::default(),
    };
    if !is_ffmpeg_on_path(&cfg.ffmpeg.program) {
        anyhow::bail!(
            "ffmpeg is required for MP4 encoding, but '{}' could not be run",
            cfg.ffmpeg.program.display()
        );
    }

    let assets_root = args.storyboard.parent().unwrap_or_else(|| Path::new("."));
    let viewport = StripViewport::new(&storyboard, assets_root, cfg.viewport)?;
    let session = CaptureSession::new(
        Arc::new(viewport),
        Arc::new(FfmpegEncoder::new(cfg.ffmpeg.clone())),
    );

    let items = storyboard.items();
    eprintln!(
        "recording {} items ({}); press Ctrl-C to stop early",
        items.len(),
        secs(total_duration(&items))
    );
    session.start(items)?;

    let stopper = session.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stopper.stop().await;
        }
    });
    let outcome = session.finished().await;
    ctrl_c.abort();

    let artifact = outcome.context("recording failed")?;
    let out_dir = args.out_dir.unwrap_or(cfg.output_dir);
    let path = artifact.save_to(&out_dir).await?;

    let stats = session.stats();
    eprintln!(
        "wrote {} ({} bytes, {} frames, {} skipped ticks, {} failed snapshots)",
        path.display(),
        artifact.len(),
        stats.frames,
        stats.skipped_ticks,
        stats.failed_snapshots
    );
    Ok(())
}
