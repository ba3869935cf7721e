//! Photo Booth CLI
//!
//! Runs one capture end to end: resolves camera permission, opens the
//! selected camera, counts down, composites the frame overlay and saves
//! the PNG.

use clap::Parser;
use photo_booth::{
    capture::{list_cameras, FileConfig, MediaPlatform},
    countdown::{TickOutcome, TICK_INTERVAL},
    frames::DirAssetStore,
    metrics::{MetricsRegistry, MetricsSnapshot},
    BoothError, CaptureCoordinator,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Camera photo booth.
#[derive(Debug, Parser)]
#[command(name = "photo-booth", version, about)]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// List cameras and exit.
    #[arg(long)]
    list_cameras: bool,

    /// Camera device id to use instead of the first one.
    #[arg(short, long)]
    device: Option<String>,

    /// Frame overlay id.
    #[arg(short, long)]
    frame: Option<String>,

    /// Countdown length in seconds (5 or 10).
    #[arg(long)]
    countdown: Option<u32>,

    /// Where to save the captured photo.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt().with_env_filter(env_filter()).init();

    let args = Args::parse();
    info!("Photo Booth v{}", photo_booth::VERSION);

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    #[cfg(feature = "camera")]
    let platform = photo_booth::capture::NativePlatform::new();
    #[cfg(not(feature = "camera"))]
    let platform = {
        info!("Built without the camera feature, using a simulated camera");
        photo_booth::MockPlatform::with_default_devices()
    };

    if let Err(e) = run(platform, &args, &config) {
        error!("{}", e);
        std::process::exit(if e.is_blocking() { 1 } else { 3 });
    }
}

/// `RUST_LOG` if set and valid, `info` otherwise.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn load_config(args: &Args) -> Result<FileConfig, BoothError> {
    let mut config = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };

    if let Some(device) = &args.device {
        config.capture.preferred_device = Some(device.clone());
    }
    if let Some(frame) = &args.frame {
        config.frames.default_frame = frame.clone();
    }
    if let Some(seconds) = args.countdown {
        config.capture.countdown_seconds = seconds;
    }
    if let Some(output) = &args.output {
        config.output.path = output.clone();
    }

    config.validate()?;
    Ok(config)
}

fn run<P: MediaPlatform>(mut platform: P, args: &Args, config: &FileConfig) -> Result<(), BoothError> {
    if args.list_cameras {
        for camera in list_cameras(&mut platform) {
            println!("{}\t{}", camera.id, camera.display_label());
        }
        return Ok(());
    }

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        warn!("Failed to install Ctrl-C handler: {}", e);
    }

    let assets = DirAssetStore::new(&config.frames.assets_dir);
    let mut booth = CaptureCoordinator::from_config(platform, assets, config)?;
    let metrics = MetricsReporter::start(config.output.metrics_port);

    booth.startup()?;
    metrics.publish(booth.stats().into());

    let state = booth.state();
    if state.cameras.is_empty() {
        warn!("No cameras found");
        return Ok(());
    }
    info!(
        camera = state.selected_label(),
        frame = %state.frames.active().id,
        seconds = state.countdown_duration.seconds(),
        "Starting countdown"
    );

    let token = booth.trigger_capture()?;
    loop {
        std::thread::sleep(TICK_INTERVAL);
        if interrupted.load(Ordering::SeqCst) {
            info!("Interrupted, cancelling countdown");
            booth.shutdown();
            return Ok(());
        }

        let outcome = booth.tick(token)?;
        metrics.publish(booth.stats().into());
        match outcome {
            TickOutcome::Running { remaining, .. } => println!("{}", remaining),
            TickOutcome::Expired => break,
            TickOutcome::Ignored => return Ok(()),
        }
    }

    booth.save_capture(&config.output.path)?;
    info!(path = %config.output.path.display(), "Photo saved");

    booth.shutdown();
    metrics.publish(booth.stats().into());
    Ok(())
}

/// Keeps the registry current and, with the `metrics` feature, serves it.
struct MetricsReporter {
    registry: Option<MetricsRegistry>,
    #[cfg(feature = "metrics")]
    served: Option<Arc<tokio::sync::RwLock<photo_booth::metrics::MetricsState>>>,
}

impl MetricsReporter {
    fn start(port: u16) -> Self {
        let registry = match MetricsRegistry::new() {
            Ok(registry) => Some(registry),
            Err(e) => {
                warn!("Metrics disabled: {}", e);
                None
            }
        };
        Self::with_registry(registry, port)
    }

    #[cfg(feature = "metrics")]
    fn with_registry(registry: Option<MetricsRegistry>, port: u16) -> Self {
        match registry {
            Some(registry) if port != 0 => Self {
                registry: None,
                served: Some(serve_metrics(port, registry)),
            },
            registry => Self {
                registry,
                served: None,
            },
        }
    }

    #[cfg(not(feature = "metrics"))]
    fn with_registry(registry: Option<MetricsRegistry>, port: u16) -> Self {
        if port != 0 {
            warn!(port, "Metrics port set but built without the metrics feature");
        }
        Self { registry }
    }

    fn publish(&self, snapshot: MetricsSnapshot) {
        if let Some(registry) = &self.registry {
            registry.update(&snapshot);
        }
        #[cfg(feature = "metrics")]
        if let Some(state) = &self.served {
            state.blocking_write().update(&snapshot);
        }
    }
}

#[cfg(feature = "metrics")]
fn serve_metrics(
    port: u16,
    registry: MetricsRegistry,
) -> Arc<tokio::sync::RwLock<photo_booth::metrics::MetricsState>> {
    use photo_booth::metrics::{MetricsServer, MetricsServerConfig};

    let server = MetricsServer::new(MetricsServerConfig::with_port(port), registry);
    let state = server.state();

    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Runtime::new() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("Failed to start metrics runtime: {}", e);
                return;
            }
        };
        if let Err(e) = runtime.block_on(server.run()) {
            warn!("Metrics server stopped: {}", e);
        }
    });

    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn test_env_filter_levels() {
        std::env::set_var("RUST_LOG", "debug");
        assert_eq!(env_filter().max_level_hint(), Some(LevelFilter::DEBUG));

        std::env::remove_var("RUST_LOG");
        assert_eq!(env_filter().max_level_hint(), Some(LevelFilter::INFO));
    }
}
