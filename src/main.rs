use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use picframe::{
    AppState, ControlServer, Controller, DiskLoader, DisplayConfig, FrameEvent, ImageSet, Playlist,
    PowerControl, ServerConfig, SharedPlaylist, SystemPower, ThumbnailStore, create_event_loop,
    run_display,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(name = "picframe", about = "Fullscreen picture frame with an HTTP remote control")]
struct Args {
    /// Port the control server listens on
    #[arg(value_name = "PORT", default_value_t = 80)]
    port: u16,

    /// Directory holding the pictures (png, jpeg, jpg)
    #[arg(value_name = "PICTURES", default_value = "pictures")]
    pictures: PathBuf,

    /// Address the control server binds to
    #[arg(long, value_name = "ADDR", default_value = "0.0.0.0")]
    host: String,

    /// Thumbnail directory, defaults to `thumbnails` next to the picture directory
    #[arg(long, value_name = "DIR")]
    thumbnails: Option<PathBuf>,

    /// Seconds between automatic picture changes
    #[arg(long, value_name = "SECS", default_value_t = 1800)]
    cycle_time: u64,

    /// Milliseconds per render tick (a cross-fade takes ten ticks)
    #[arg(long, value_name = "MS", default_value_t = 100)]
    tick_ms: u64,

    /// Always run fullscreen (the default on a Raspberry Pi)
    #[arg(long, conflicts_with = "windowed")]
    fullscreen: bool,

    /// Always run in a window, even on a Raspberry Pi
    #[arg(long)]
    windowed: bool,
}

fn main() {
    // Initialize logging (honors RUST_LOG if present)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info,axum::rejection=trace"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();

    let args = Args::parse();
    if let Err(err) = run(args) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> picframe::Result<()> {
    let images = ImageSet::scan(&args.pictures)?;
    info!(dir = %args.pictures.display(), count = images.len(), "Loaded pictures");
    if images.is_empty() {
        warn!("Picture directory is empty, showing a blank frame");
    }

    let thumbnails = ThumbnailStore::new(
        args.thumbnails
            .clone()
            .unwrap_or_else(|| default_thumbnail_dir(&args.pictures)),
    );
    if let Err(e) = thumbnails.sweep_orphans(&args.pictures) {
        warn!(dir = %thumbnails.dir().display(), error = %e, "Thumbnail sweep failed");
    }

    let power = SystemPower::detect();
    let fullscreen = args.fullscreen || (!args.windowed && power.is_supported());
    let playlist = SharedPlaylist::new(Playlist::with_random_start(images));

    let event_loop = create_event_loop()?;
    let proxy = event_loop.create_proxy();
    let server_config = ServerConfig {
        host: args.host.clone(),
        port: args.port,
    };
    let state = AppState::new(playlist.clone(), thumbnails, Arc::new(power));
    let server = ControlServer::spawn(&server_config, state, move || {
        let _ = proxy.send_event(FrameEvent::Shutdown);
    })?;
    info!(address = %server.local_addr(), "Control server ready");

    let config = DisplayConfig {
        cycle_time: Duration::from_secs(args.cycle_time),
        tick: Duration::from_millis(args.tick_ms.max(1)),
        fullscreen,
        ..DisplayConfig::default()
    };
    let controller = Controller::new(playlist, DiskLoader, config.cycle_time, Instant::now());

    // window closes first, then the listener stops and its thread is joined
    let displayed = run_display(event_loop, config, controller);
    server.stop()?;
    displayed?;

    info!("Clean exit");
    Ok(())
}

fn default_thumbnail_dir(pictures: &Path) -> PathBuf {
    let parent = pictures
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    parent.join("thumbnails")
}
