pub mod common;
pub mod controller;
pub mod error;
pub mod library;
pub mod playlist;
pub mod power;
pub mod thumbnail;

pub use common::{Canvas, Placement, ScaleMode, clamp_aspect_resize, load_image_respecting_exif};
pub use controller::{BLEND_STEPS, Controller, DiskLoader, DisplayConfig, ImageLoader};
pub use error::{FrameError, Result};
pub use library::{ImageSet, validate_basename};
pub use playlist::{Playlist, SharedPlaylist};
pub use power::{PowerControl, SystemPower};
pub use thumbnail::{THUMBNAIL_SIZE, Thumbnail, ThumbnailStore};
