use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::Rng;
use tracing::info;

use super::common::ScaleMode;
use super::error::Result;
use super::library::ImageSet;

/// The part of the frame state the control server is allowed to touch.
#[derive(Debug)]
pub struct Playlist {
    images: ImageSet,
    target_index: usize,
    scale_mode: ScaleMode,
}

impl Playlist {
    pub fn new(images: ImageSet) -> Self {
        Self {
            images,
            target_index: 0,
            scale_mode: ScaleMode::default(),
        }
    }

    /// Start on a random picture so a restarted frame doesn't always open on the same one.
    pub fn with_random_start(images: ImageSet) -> Self {
        let mut playlist = Self::new(images);
        if !playlist.images.is_empty() {
            playlist.target_index = rand::thread_rng().gen_range(0..playlist.images.len());
        }
        playlist
    }

    pub fn images(&self) -> &ImageSet {
        &self.images
    }

    pub fn target_index(&self) -> usize {
        self.target_index
    }

    pub fn target_path(&self) -> Option<&Path> {
        self.images.path(self.target_index)
    }

    pub fn scale_mode(&self) -> ScaleMode {
        self.scale_mode
    }

    pub fn set_scale_mode(&mut self, mode: ScaleMode) {
        self.scale_mode = mode;
    }

    pub fn next_image(&mut self) {
        let len = self.images.len();
        if len == 0 {
            return;
        }
        self.target_index = (self.target_index + 1) % len;
    }

    pub fn previous_image(&mut self) {
        let len = self.images.len();
        if len == 0 {
            return;
        }
        self.target_index = (self.target_index + len - 1) % len;
    }

    /// Target the picture called `name`. Unknown names leave the target alone.
    pub fn show_image(&mut self, name: &str) -> bool {
        match self.images.position(name) {
            Some(index) => {
                self.target_index = index;
                true
            }
            None => false,
        }
    }

    pub fn list_images(&self) -> Vec<String> {
        self.images.names()
    }

    /// Move past `index` if it is still the target, e.g. after it failed to decode.
    pub fn skip(&mut self, index: usize) {
        if self.target_index == index {
            self.next_image();
        }
    }

    /// Swap in a fresh scan, keeping the same picture targeted when it still exists.
    pub fn replace_images(&mut self, images: ImageSet) {
        let target_name = self.images.name(self.target_index).map(str::to_owned);
        self.images = images;
        self.target_index = match target_name.and_then(|n| self.images.position(&n)) {
            Some(index) => index,
            None if self.target_index < self.images.len() => self.target_index,
            None => 0,
        };
    }
}

/// Cloneable handle shared by the render loop and the control server.
#[derive(Clone, Debug)]
pub struct SharedPlaylist {
    inner: Arc<Mutex<Playlist>>,
}

impl SharedPlaylist {
    pub fn new(playlist: Playlist) -> Self {
        Self {
            inner: Arc::new(Mutex::new(playlist)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, Playlist> {
        // plain data, a panicked holder cannot leave it half-written
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Re-scan the picture directory; the scan itself runs outside the lock.
    pub fn refresh(&self) -> Result<usize> {
        let dir: PathBuf = self.lock().images().dir().to_path_buf();
        let images = ImageSet::scan(&dir)?;
        let count = images.len();
        self.lock().replace_images(images);
        info!(count, "Refreshed picture list");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn set_with(names: &[&str]) -> (tempfile::TempDir, ImageSet) {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        let set = ImageSet::scan(dir.path()).unwrap();
        (dir, set)
    }

    #[test]
    fn next_and_previous_are_inverse() {
        let (_dir, set) = set_with(&["a.png", "b.jpg", "c.jpeg", "d.png"]);
        let mut playlist = Playlist::new(set);
        for start in 0..4 {
            playlist.target_index = start;
            playlist.next_image();
            playlist.previous_image();
            assert_eq!(playlist.target_index(), start);
            playlist.previous_image();
            playlist.next_image();
            assert_eq!(playlist.target_index(), start);
        }
    }

    #[test]
    fn three_nexts_wrap_a_three_image_set() {
        let (_dir, set) = set_with(&["a.png", "b.jpg", "c.jpeg"]);
        let mut playlist = Playlist::new(set);
        assert_eq!(playlist.list_images(), vec!["a.png", "b.jpg", "c.jpeg"]);
        let start = playlist.target_index();
        playlist.next_image();
        playlist.next_image();
        playlist.next_image();
        assert_eq!(playlist.target_index(), start);
    }

    #[test]
    fn previous_wraps_to_the_end() {
        let (_dir, set) = set_with(&["a.png", "b.jpg", "c.jpeg"]);
        let mut playlist = Playlist::new(set);
        playlist.previous_image();
        assert_eq!(playlist.target_index(), 2);
    }

    #[test]
    fn show_unknown_name_is_a_no_op() {
        let (_dir, set) = set_with(&["a.png", "b.jpg"]);
        let mut playlist = Playlist::new(set);
        assert!(playlist.show_image("b.jpg"));
        assert_eq!(playlist.target_index(), 1);
        assert!(!playlist.show_image("zzz.png"));
        assert_eq!(playlist.target_index(), 1);
    }

    #[test]
    fn navigation_on_empty_set_does_nothing() {
        let (_dir, set) = set_with(&[]);
        let mut playlist = Playlist::with_random_start(set);
        playlist.next_image();
        playlist.previous_image();
        playlist.skip(0);
        assert_eq!(playlist.target_index(), 0);
        assert!(playlist.target_path().is_none());
    }

    #[test]
    fn random_start_lands_inside_the_set() {
        let (_dir, set) = set_with(&["a.png", "b.jpg", "c.jpeg"]);
        for _ in 0..20 {
            let playlist = Playlist::with_random_start(set.clone());
            assert!(playlist.target_index() < 3);
            assert!(playlist.target_path().is_some());
        }
    }

    #[test]
    fn refresh_keeps_target_by_name() {
        let (dir, set) = set_with(&["b.jpg", "c.jpeg"]);
        let shared = SharedPlaylist::new(Playlist::new(set));
        shared.lock().show_image("c.jpeg");

        fs::write(dir.path().join("a.png"), b"").unwrap();
        assert_eq!(shared.refresh().unwrap(), 3);
        let playlist = shared.lock();
        assert_eq!(playlist.target_index(), 2);
        assert_eq!(playlist.images().name(2), Some("c.jpeg"));
    }

    #[test]
    fn refresh_clamps_when_target_disappears() {
        let (dir, set) = set_with(&["a.png", "b.jpg", "c.jpeg"]);
        let shared = SharedPlaylist::new(Playlist::new(set));
        shared.lock().show_image("c.jpeg");

        fs::remove_file(dir.path().join("c.jpeg")).unwrap();
        shared.refresh().unwrap();
        assert_eq!(shared.lock().target_index(), 0);
    }
}
