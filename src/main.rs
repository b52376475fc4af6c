use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};

use clipgif::config::{CropFallback, DEFAULT_FPS, RecorderConfig, TrimRange};
use clipgif::editor::{EditorState, export_from_editor};
use clipgif::geometry::Rect;
use clipgif::recording::{Recorder, RecorderEvent};
use clipgif::session::CaptureDriver;
use clipgif::{capture, screen, selection};

#[derive(Parser, Debug)]
#[command(name = "clipgif", version, about = "Record a screen region to an animated GIF")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a region of the screen
    Record {
        /// Region in global points, bottom-left origin: x,y,width,height
        #[arg(long, allow_hyphen_values = true)]
        region: Rect,

        /// Frames per second (3-30)
        #[arg(long, default_value_t = DEFAULT_FPS)]
        fps: u32,

        /// Recording length in seconds
        #[arg(long, default_value_t = 5.0)]
        duration: f64,

        /// Output GIF path
        #[arg(long, short, default_value = "clipgif.gif")]
        output: PathBuf,

        /// Keep only frames start..=end, both ends included
        #[arg(long)]
        trim: Option<TrimRange>,

        /// What to append when a frame cannot be cropped: uncropped or repeat-previous
        #[arg(long, default_value_t = CropFallback::Uncropped)]
        fallback: CropFallback,
    },
    /// List displays and their frames in global points
    Displays,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Record {
            region,
            fps,
            duration,
            output,
            trim,
            fallback,
        } => record(region, fps, duration, output, trim, fallback),
        Command::Displays => list_displays(),
    }
}

fn record(
    region: Rect,
    fps: u32,
    duration: f64,
    output: PathBuf,
    trim: Option<TrimRange>,
    fallback: CropFallback,
) -> anyhow::Result<()> {
    let config = RecorderConfig {
        fps,
        crop_fallback: fallback,
        ..Default::default()
    };
    config.validate()?;
    if !duration.is_finite() || duration <= 0.0 {
        bail!("Duration must be a positive number of seconds, got {}", duration);
    }

    let selection = selection::validate_selection(region, config.min_selection)?;
    let displays = screen::active_displays().context("Failed to enumerate displays")?;
    let display = screen::display_for_selection(&displays, selection)?.clone();
    let source = capture::display_source(display.id)?;

    let recorder = Arc::new(Recorder::new(config));
    let events = recorder.subscribe()?;

    let driver = CaptureDriver::start(source, Arc::clone(&recorder), selection, display)?;
    log::info!("Recording {:.1}s to {:?}", duration, output);
    std::thread::sleep(Duration::from_secs_f64(duration));
    let (_, report) = driver.stop()?;

    for event in events.try_iter() {
        if let RecorderEvent::CropFellBack { index, fallback } = event {
            log::warn!("Frame {} was not cropped ({})", index, fallback);
        }
    }
    if report.failed_ticks > 0 {
        log::warn!("{} capture ticks produced no frame", report.failed_ticks);
    }

    let sequence = recorder.take_sequence()?;
    let mut editor = EditorState::new(sequence).context("No frames were captured")?;
    if let Some(range) = trim {
        let last = editor.total_frames() - 1;
        if range.start > range.end || range.end > last {
            bail!(
                "Trim range {}..={} is outside the recorded frames 0..={}",
                range.start,
                range.end,
                last
            );
        }
        editor.set_trim_end(range.end);
        editor.set_trim_start(range.start);
    }

    let summary = export_from_editor(&editor, &output)
        .with_context(|| format!("Failed to export {:?}", output))?;
    println!(
        "Saved {} frames ({}x{}, {:.1}s) to {}",
        summary.frames,
        summary.width,
        summary.height,
        editor.duration().as_secs_f64(),
        summary.path.display()
    );
    Ok(())
}

fn list_displays() -> anyhow::Result<()> {
    let displays = screen::active_displays().context("Failed to enumerate displays")?;
    for d in displays {
        println!(
            "{}{}\t{}\tscale {:.1}",
            d.id,
            if d.is_primary { " (primary)" } else { "" },
            d.frame,
            d.backing_scale
        );
    }
    Ok(())
}
