pub mod frame;
pub mod web;
pub mod window;

pub use frame::{
    BLEND_STEPS, Canvas, Controller, DiskLoader, DisplayConfig, FrameError, ImageLoader, ImageSet,
    Placement, Playlist, PowerControl, Result, ScaleMode, SharedPlaylist, SystemPower,
    THUMBNAIL_SIZE, Thumbnail, ThumbnailStore, validate_basename,
};
pub use web::{AppState, ControlServer, ServerConfig, router};
pub use window::{FrameEvent, create_event_loop, run_display};
