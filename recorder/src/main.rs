mod capture;
mod filter;
mod selection;
mod stop;
mod storage;
mod watch;

use std::path::{Path, PathBuf};

use capture::{CaptureError, Scale, ScreenSource, XcapScreen};
use filter::SsimComparator;
use image::Rgb;
use selection::window::MinifbPreview;
use selection::{Overlay, RegionSelector, SelectionError, SelectionOutcome};
use slidewatch_common::config::{Config, SelectionConfig};
use slidewatch_common::frame::Rectangle;
use stop::StopSignal;
use storage::FrameStore;
use tracing::{debug, error, info, warn};
use watch::{WatchError, Watcher};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("failed to create output directory {0}: {1}")]
    OutputDir(String, std::io::Error),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error("selected region {0} is empty")]
    EmptySelection(Rectangle),
    #[error(transparent)]
    Watch(#[from] WatchError),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("slidewatch.toml"));

    let config = match Config::load_or_default(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", config_path.display());
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.effective_level().parse().unwrap_or_default()),
        )
        .init();

    info!(
        output = config.output.directory,
        delay_secs = config.capture.delay_secs,
        similarity_threshold = config.filter.similarity_threshold,
        preview_scale = config.selection.preview_scale_factor,
        "starting slidewatch"
    );

    if let Err(e) = run(&config).await {
        error!(error = %e, "slidewatch failed");
        std::process::exit(1);
    }
}

async fn run(config: &Config) -> Result<(), AppError> {
    let output_dir = Path::new(&config.output.directory);
    std::fs::create_dir_all(output_dir)
        .map_err(|e| AppError::OutputDir(output_dir.display().to_string(), e))?;
    info!(path = %output_dir.display(), "frames will be saved here");

    let mut screen = XcapScreen::primary()?;

    // Give the user a moment to bring the content to watch to the front.
    std::thread::sleep(config.capture.startup_delay());

    let Some(region) = select_region(&mut screen, &config.selection)? else {
        return Ok(());
    };

    let stop = StopSignal::new();
    let ctrl_c = stop.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl+C received, stopping after the current tick");
                ctrl_c.trigger();
            }
            Err(e) => warn!(error = %e, "failed to listen for Ctrl+C"),
        }
    });

    let mut watcher = Watcher::new(
        screen,
        region,
        SsimComparator::from_config(&config.filter),
        FrameStore::new(output_dir),
        config.capture.delay(),
    );
    let summary = watcher.run(&stop).await?;
    info!(
        ticks = summary.ticks,
        saved = summary.saved,
        failed = summary.failed,
        "watch finished"
    );
    Ok(())
}

/// Let the user draw the region on a scaled-down screenshot and return it in
/// full-resolution screen coordinates. `None` means the user quit.
fn select_region(
    screen: &mut XcapScreen,
    config: &SelectionConfig,
) -> Result<Option<Rectangle>, AppError> {
    let scale = match config.preview_size {
        Some([width, height]) => Scale::Exact { width, height },
        None => Scale::Factor(config.preview_scale_factor),
    };
    let full = screen.grab()?;
    let (factor_x, factor_y) = scale.axis_factors(full.dimensions());
    let preview = capture::rescale(&full, scale)?;
    drop(full);
    let (width, height) = preview.dimensions();
    debug!(width, height, ?scale, "preview captured");

    let mut window = MinifbPreview::open(&config.window_title, width, height)?;
    let mut selector = RegionSelector::new(
        preview,
        Overlay {
            color: Rgb([0, 0, 0]),
            alpha: config.overlay_alpha,
        },
    );

    info!("drag a rectangle over the area to watch (Q or Esc to quit)");
    let outcome = selection::run_selection(&mut selector, &mut window)?;
    let rect = match outcome {
        SelectionOutcome::Selected(rect) => rect,
        SelectionOutcome::Cancelled => {
            info!("no region selected, exiting");
            return Ok(None);
        }
    };

    std::thread::sleep(config.settle_delay());
    drop(window);

    let region = rect.unscale_axes(factor_x, factor_y);
    debug!(preview = %rect, screen = %region, "selection rescaled to screen coordinates");
    if region.is_empty() {
        return Err(AppError::EmptySelection(region));
    }
    Ok(Some(region))
}
