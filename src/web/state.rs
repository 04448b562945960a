use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::frame::{PowerControl, ScaleMode, SharedPlaylist, ThumbnailStore};

#[derive(Clone)]
pub struct AppState {
    pub playlist: SharedPlaylist,
    pub thumbnails: ThumbnailStore,
    pub power: Arc<dyn PowerControl>,
}

impl AppState {
    pub fn new(
        playlist: SharedPlaylist,
        thumbnails: ThumbnailStore,
        power: Arc<dyn PowerControl>,
    ) -> Self {
        Self {
            playlist,
            thumbnails,
            power,
        }
    }
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub count: usize,
    pub target_index: Option<usize>,
    pub target: Option<String>,
    pub scale_mode: ScaleMode,
}

#[derive(Deserialize)]
pub struct ShowQuery {
    #[serde(default)]
    pub image: Option<String>,
}
