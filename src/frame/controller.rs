use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use image::RgbaImage;
use tracing::{debug, info, warn};

use super::common::{Canvas, Placement, ScaleMode, load_image_respecting_exif, resize_for_placement};
use super::error::Result;
use super::playlist::SharedPlaylist;

/// Draw ticks needed to fade a new picture fully in.
pub const BLEND_STEPS: u8 = 10;

pub struct DisplayConfig {
    pub title: String,
    pub cycle_time: Duration,
    pub tick: Duration,
    pub fullscreen: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: "PictureFrame".into(),
            cycle_time: Duration::from_secs(30 * 60),
            tick: Duration::from_millis(100),
            fullscreen: false,
        }
    }
}

pub trait ImageLoader {
    fn load(&mut self, path: &Path) -> Result<RgbaImage>;
}

/// Decodes pictures from disk, honouring EXIF orientation.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiskLoader;

impl ImageLoader for DiskLoader {
    fn load(&mut self, path: &Path) -> Result<RgbaImage> {
        Ok(load_image_respecting_exif(path)?.to_rgba8())
    }
}

struct Layer {
    source: RgbaImage,
    scaled: Option<ScaledLayer>,
}

struct ScaledLayer {
    mode: ScaleMode,
    canvas: (u32, u32),
    placement: Placement,
    image: RgbaImage,
}

impl Layer {
    fn new(source: RgbaImage) -> Self {
        Self {
            source,
            scaled: None,
        }
    }

    fn prepare(&mut self, mode: ScaleMode, canvas: (u32, u32)) -> &ScaledLayer {
        let scaled = match self.scaled.take() {
            Some(s) if s.mode == mode && s.canvas == canvas => s,
            _ => {
                let placement = mode.place(canvas, self.source.dimensions());
                let image = resize_for_placement(&self.source, &placement);
                ScaledLayer {
                    mode,
                    canvas,
                    placement,
                    image,
                }
            }
        };
        self.scaled.insert(scaled)
    }
}

/// Render-thread side of the frame: which picture is showing, which one is fading in.
pub struct Controller<L = DiskLoader> {
    playlist: SharedPlaylist,
    loader: L,
    cycle_time: Duration,
    current_index: Option<usize>,
    current_path: Option<PathBuf>,
    current: Option<Layer>,
    target: Option<Layer>,
    blend_step: u8,
    last_cycle: Instant,
    failures: usize,
    drawn: Option<(ScaleMode, (u32, u32))>,
}

impl<L: ImageLoader> Controller<L> {
    pub fn new(playlist: SharedPlaylist, loader: L, cycle_time: Duration, now: Instant) -> Self {
        Self {
            playlist,
            loader,
            cycle_time,
            current_index: None,
            current_path: None,
            current: None,
            target: None,
            blend_step: 0,
            last_cycle: now,
            failures: 0,
            drawn: None,
        }
    }

    pub fn playlist(&self) -> &SharedPlaylist {
        &self.playlist
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// Fade-in progress of the pending picture, in `[0, 1)`; 0 when settled.
    pub fn blend(&self) -> f32 {
        self.blend_step as f32 / BLEND_STEPS as f32
    }

    pub fn is_transitioning(&self) -> bool {
        self.target.is_some()
    }

    /// Start a transition when the target moved, and auto-advance once the cycle time is up.
    /// Nothing happens while a transition is still pending.
    pub fn update(&mut self, now: Instant) {
        if self.target.is_some() {
            return;
        }

        let (index, path) = {
            let playlist = self.playlist.lock();
            (
                playlist.target_index(),
                playlist.target_path().map(Path::to_path_buf),
            )
        };
        if let Some(path) = path {
            if self.current_path.as_deref() != Some(path.as_path()) {
                self.begin_transition(index, path, now);
            } else if self.current_index != Some(index) {
                // a refresh moved the picture on screen to another slot
                self.current_index = Some(index);
            }
        }

        if now.saturating_duration_since(self.last_cycle) > self.cycle_time {
            debug!("Cycle time elapsed, advancing");
            self.last_cycle = now;
            self.playlist.lock().next_image();
        }
    }

    fn begin_transition(&mut self, index: usize, path: PathBuf, now: Instant) {
        self.last_cycle = now;
        self.current_index = Some(index);
        let loaded = self.loader.load(&path);
        match loaded {
            Ok(image) => {
                info!(path = %path.display(), width = image.width(), height = image.height(), "Fading in picture");
                self.failures = 0;
                self.target = Some(Layer::new(image));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable picture");
                self.failures += 1;
                let mut playlist = self.playlist.lock();
                // stop once every picture has failed in a row
                if self.failures < playlist.images().len() {
                    playlist.skip(index);
                }
            }
        }
        self.current_path = Some(path);
    }

    /// Whether the next `draw` would change what is on screen.
    pub fn needs_redraw(&self, canvas: (u32, u32)) -> bool {
        let mode = self.playlist.lock().scale_mode();
        self.target.is_some() || self.drawn != Some((mode, canvas))
    }

    /// Composite the outgoing and incoming pictures, then step the fade.
    pub fn draw(&mut self, canvas: &mut Canvas<'_>) {
        let mode = self.playlist.lock().scale_mode();
        let size = canvas.dimensions();
        let blend = self.blend();

        canvas.clear();
        if let Some(current) = self.current.as_mut() {
            let scaled = current.prepare(mode, size);
            canvas.blend(&scaled.image, scaled.placement.x, scaled.placement.y, 1.0 - blend);
        }
        self.drawn = Some((mode, size));
        if let Some(target) = self.target.as_mut() {
            let scaled = target.prepare(mode, size);
            canvas.blend(&scaled.image, scaled.placement.x, scaled.placement.y, blend);
            self.blend_step += 1;
            if self.blend_step >= BLEND_STEPS {
                self.settle();
            }
        }
    }

    fn settle(&mut self) {
        // dropping the old layer frees both its decoded and scaled buffers
        self.current = self.target.take();
        self.blend_step = 0;
        // the screen still shows the last partial blend
        self.drawn = None;
        debug!(index = ?self.current_index, "Transition settled");
    }
}
