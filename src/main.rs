use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;

use frame_annotator::api::console::{print_manual, ConsolePrompt};
use frame_annotator::api::window::MinifbDisplayFactory;
use frame_annotator::core::config::{AnnotatorConfig, DEFAULT_CONFIG_FILE};
use frame_annotator::core::driver::{DriverSettings, DriverSummary, SessionDriver};
use frame_annotator::core::export::FfmpegGifExporter;
use frame_annotator::core::overlay::OverlayRenderer;
use frame_annotator::core::tasks::{AnnotationLog, JsonProgressStore, TsvTaskQueue};
use frame_annotator::core::video::FfmpegMediaOpener;
use frame_annotator::init_logging;

#[derive(Parser, Debug)]
#[command(name = "frame-annotator", version, about = "Frame-accurate video segment annotation")]
struct Cli {
    #[clap(flatten)]
    verbose: clap_verbosity_flag::Verbosity<clap_verbosity_flag::InfoLevel>,

    /// Config file, created with defaults when missing
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Use a shorter rewind window for machines with little memory
    #[arg(long)]
    low_memory: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Work through the task list and append results to the annotation log
    Annotate,
    /// Browse the given videos, saving frames or exporting GIF segments
    Export {
        #[arg(required = true)]
        videos: Vec<PathBuf>,
    },
    /// Print the keyboard controls
    Keys,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose.log_level_filter());

    if let Command::Keys = cli.command {
        print_manual();
        return Ok(());
    }

    let mut config = AnnotatorConfig::load_or_create(&cli.config)
        .with_context(|| format!("loading config {:?}", cli.config))?;
    if cli.low_memory {
        config.use_low_memory_playback();
    }

    let opener = FfmpegMediaOpener::new(&config.ffmpeg.ffmpeg_path, &config.ffmpeg.ffprobe_path);
    let exporter = FfmpegGifExporter::from_config(&config.ffmpeg, &config.capture);
    let renderer = OverlayRenderer::from_config(&config.overlay);
    let mut displays = MinifbDisplayFactory;
    let mut prompt = ConsolePrompt::stdio();

    let mut driver = SessionDriver::new(
        &opener,
        &mut displays,
        &exporter,
        &renderer,
        &mut prompt,
        DriverSettings::from(&config),
    );

    let summary = match cli.command {
        Command::Annotate => {
            let log = AnnotationLog::new(&config.annotation.annotations_path);
            let mut queue = TsvTaskQueue::open(&config.annotation.task_list_path, log)
                .with_context(|| format!("reading task list {:?}", config.annotation.task_list_path))?;
            let mut progress = JsonProgressStore::open(&config.annotation.progress_path)?;
            driver.run_tasks(&mut queue, &mut progress)?
        }
        Command::Export { videos } => driver.run_export(&videos)?,
        Command::Keys => DriverSummary::default(),
    };

    info!(
        "🏁 annotated {}, skipped {}, exported {}, not found {}{}",
        summary.annotated,
        summary.skipped,
        summary.exported,
        summary.not_found,
        if summary.cancelled { " (stopped early)" } else { "" }
    );
    Ok(())
}
