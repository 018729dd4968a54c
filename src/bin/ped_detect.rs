use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use ped_detect::annotate::AnnotateStyle;
use ped_detect::args::ModelArgs;
use ped_detect::pipeline::{detect_on_image, FrameSink, ImageFileSink, SinkChain};

/// Draws boxes around pedestrians in an image or a video.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect pedestrians in a still image
    Image(ImageCmd),
    /// Detect pedestrians frame by frame in a video (needs the `viewer` feature)
    Video(VideoCmd),
}

#[derive(Args, Debug)]
struct ImageCmd {
    /// Input image
    #[arg(default_value = "images/image.jpg")]
    path: PathBuf,

    /// Save the annotated image here
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Do not open a window
    #[arg(long)]
    no_window: bool,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Args, Debug)]
#[cfg_attr(not(feature = "viewer"), allow(dead_code))]
struct VideoCmd {
    /// Input video
    #[arg(default_value = "videos/video.mp4")]
    path: PathBuf,

    /// Save every annotated frame, numbered after the first
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Do not open a window
    #[arg(long)]
    no_window: bool,

    #[command(flatten)]
    model: ModelArgs,
}

/// Written when there is no window to show the result in and no `--output`.
/// Video frames after the first are numbered next to it.
const FALLBACK_OUTPUT: &str = "detected_pedestrians.jpg";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Image(cmd) => run_image(cmd),
        Command::Video(cmd) => run_video(cmd),
    }
}

fn run_image(cmd: ImageCmd) -> Result<()> {
    let model_config = cmd.model.model_config()?;
    let mut detector = ped_detect::init_detector(&model_config)?;
    let style = AnnotateStyle::discover();

    let annotated = detect_on_image(&mut detector, &cmd.path, &style)?;

    let mut sinks = SinkChain::new();
    if let Some(output) = &cmd.output {
        sinks = sinks.with_sink(Box::new(ImageFileSink::new(output)));
    }
    if !cmd.no_window {
        sinks = with_window(sinks, false)?;
    }
    let mut sinks = sinks.or_fallback(FALLBACK_OUTPUT);

    sinks.show(&annotated)?;
    sinks.finish()?;

    for det in annotated.person_detections() {
        let (x1, y1, x2, y2) = det.bbox.as_x1y1_x2y2_i32();
        log::info!("Person {:.2} at ({x1}, {y1}) - ({x2}, {y2})", det.confidence);
    }
    Ok(())
}

#[cfg(feature = "viewer")]
fn with_window(sinks: SinkChain, video: bool) -> Result<SinkChain> {
    use ped_detect::viewer::{WaitMode, WindowSink};

    let mode = if video { WaitMode::Frame } else { WaitMode::AnyKey };
    Ok(sinks.with_sink(Box::new(WindowSink::new(mode)?)))
}

#[cfg(not(feature = "viewer"))]
fn with_window(sinks: SinkChain, _video: bool) -> Result<SinkChain> {
    log::warn!("Built without the `viewer` feature, no window will be shown");
    Ok(sinks)
}

#[cfg(feature = "viewer")]
fn run_video(cmd: VideoCmd) -> Result<()> {
    use ped_detect::pipeline::run_frames;
    use ped_detect::viewer::VideoFrames;

    let model_config = cmd.model.model_config()?;
    let mut detector = ped_detect::init_detector(&model_config)?;
    let style = AnnotateStyle::discover();

    let frames = VideoFrames::open(&cmd.path)?;

    let mut sinks = SinkChain::new();
    if let Some(output) = &cmd.output {
        sinks = sinks.with_sink(Box::new(ImageFileSink::new(output)));
    }
    if !cmd.no_window {
        sinks = with_window(sinks, true)?;
    }
    let mut sinks = sinks.or_fallback(FALLBACK_OUTPUT);

    let stats = run_frames(&mut detector, frames, &mut sinks, &style)?;
    if stats.quit_early {
        log::info!("Quit after {} frame(s)", stats.frames);
    }
    Ok(())
}

#[cfg(not(feature = "viewer"))]
fn run_video(cmd: VideoCmd) -> Result<()> {
    anyhow::bail!(
        "Cannot read {}: video input needs the `viewer` feature (cargo build --features viewer)",
        cmd.path.display()
    )
}
