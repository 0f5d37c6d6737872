//! Display script for the 7.5" e-paper HAT
//!
//! Initializes and clears the panel, shows a picture centered on a black
//! frame with an optional caption, then puts the panel to sleep.
//!
//! ```bash
//! epaper-frame photo.jpg --caption "casi horneado"
//! epaper-frame logo.png --fit pad --size 440 --init fast --clear-passes 2 -v
//! epaper-frame portrait.jpg --dither
//! ```
//!
//! Ctrl-C is honoured between steps: the bus is released, the supply switched
//! off and the process exits with status 130.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use env_logger::Env;
use thiserror::Error;

use epaper_frame::epd7in5::{pack_image, rpi::RpiBus, Config, Epd7in5, PackOutcome};
use epaper_frame::frame::{self, Composition, Fit};

/// Exit status after Ctrl-C
const EXIT_INTERRUPTED: u8 = 130;

/// Slice of the hold period between two interrupt checks
const HOLD_SLICE_MS: u64 = 100;

/// Show a picture on the Waveshare 7.5" e-paper HAT
#[derive(Parser)]
#[command(name = "epaper-frame")]
#[command(version)]
#[command(about = "Show a picture on a 7.5\" 800x480 e-paper panel")]
struct Cli {
    /// Picture to show (PNG, JPEG or BMP)
    #[arg(default_value = "image.jpg")]
    image: PathBuf,

    /// White text drawn centered at the top
    #[arg(long)]
    caption: Option<String>,

    /// Side of the square the picture is fitted into
    #[arg(long, default_value_t = 360, value_parser = clap::value_parser!(u32).range(1..))]
    size: u32,

    /// How the picture is scaled into the square
    #[arg(long, value_enum, default_value_t = FitArg::Stretch)]
    fit: FitArg,

    /// Luma below this becomes black (0-255)
    #[arg(long, default_value_t = 128)]
    threshold: u8,

    /// Floyd-Steinberg dither instead of a plain threshold, better for photos
    #[arg(long)]
    dither: bool,

    /// Initialization sequence
    #[arg(long, value_enum, default_value_t = InitMode::Partial)]
    init: InitMode,

    /// Give up waiting on the BUSY line after this long
    #[arg(long, default_value_t = 30_000)]
    busy_timeout_ms: u32,

    /// Keep the picture up this long before the clear passes and sleep
    #[arg(long, default_value_t = 2000)]
    hold_ms: u64,

    /// Legacy init + clear cycles after the hold, to wipe ghosting
    #[arg(long, default_value_t = 0)]
    clear_passes: u32,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum FitArg {
    /// Resize to the square, ignoring aspect ratio
    Stretch,
    /// Keep aspect ratio, pad with black
    Pad,
}

impl From<FitArg> for Fit {
    fn from(arg: FitArg) -> Self {
        match arg {
            FitArg::Stretch => Fit::Stretch,
            FitArg::Pad => Fit::Pad,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum InitMode {
    /// Register LUTs, slow full refresh
    Legacy,
    /// "All fresh" waveform, full quality
    Fast,
    /// Partial waveform, quick with some ghosting
    Partial,
}

#[derive(Debug, Error)]
#[error("interrupted")]
struct Interrupted;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let running = Arc::new(AtomicBool::new(true));
    if let Err(e) = ctrlc_handler(running.clone()) {
        log::error!("{:#}", e);
        return ExitCode::FAILURE;
    }

    let config = Config::default().with_busy_timeout_ms(cli.busy_timeout_ms);
    let mut epd = Epd7in5::with_config(RpiBus::new(), config);

    let result = run(&cli, &mut epd, &running);
    let code = match &result {
        Ok(()) => return ExitCode::SUCCESS,
        Err(e) if e.is::<Interrupted>() => {
            log::info!("ctrl + c: powering down");
            ExitCode::from(EXIT_INTERRUPTED)
        }
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    };

    if let Err(e) = epd.shutdown() {
        log::error!("could not release the bus: {}", e);
    }
    code
}

/// Setup Ctrl+C signal handler
fn ctrlc_handler(running: Arc<AtomicBool>) -> Result<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .with_context(|| "Failed to set Ctrl+C handler")
}

fn check(running: &AtomicBool) -> Result<()> {
    if running.load(Ordering::SeqCst) {
        Ok(())
    } else {
        Err(Interrupted.into())
    }
}

fn hold(ms: u64, running: &AtomicBool) -> Result<()> {
    let mut left = ms;
    while left > 0 {
        check(running)?;
        let slice = left.min(HOLD_SLICE_MS);
        thread::sleep(Duration::from_millis(slice));
        left -= slice;
    }
    check(running)
}

fn run(cli: &Cli, epd: &mut Epd7in5<RpiBus>, running: &AtomicBool) -> Result<()> {
    let picture = frame::open_grayscale(&cli.image)
        .with_context(|| format!("cannot read picture {}", cli.image.display()))?;
    log::info!(
        "loaded {} ({}x{})",
        cli.image.display(),
        picture.width(),
        picture.height()
    );

    log::info!("init and Clear");
    match cli.init {
        InitMode::Legacy => epd.init(),
        InitMode::Fast => epd.init_fast(),
        InitMode::Partial => epd.init_part(),
    }
    .context("panel init failed")?;
    check(running)?;
    epd.clear().context("clear failed")?;
    check(running)?;

    let layout = Composition {
        image_size: cli.size,
        fit: cli.fit.into(),
        threshold: cli.threshold,
        dither: cli.dither,
        caption: cli.caption.clone(),
        ..Composition::default()
    };
    let packed = pack_image(&frame::compose(&picture, &layout));
    if packed.outcome != PackOutcome::Native {
        log::warn!("frame packed as {:?}", packed.outcome);
    }

    log::info!("Drawing picture");
    epd.display(&packed.data).context("display failed")?;
    hold(cli.hold_ms, running)?;

    for pass in 1..=cli.clear_passes {
        log::info!("Clear... ({}/{})", pass, cli.clear_passes);
        epd.init().context("panel init failed")?;
        epd.clear().context("clear failed")?;
        check(running)?;
    }

    log::info!("Goto Sleep...");
    epd.sleep().context("sleep failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_must_be_positive() {
        assert!(Cli::try_parse_from(["epaper-frame", "--fit", "pad", "--size", "0"]).is_err());

        let cli = Cli::try_parse_from(["epaper-frame", "--size", "1", "--dither"]).unwrap();
        assert_eq!(cli.size, 1);
        assert!(cli.dither);
    }
}
