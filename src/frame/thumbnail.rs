use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};
use tracing::{info, warn};

use super::common::{clamp_aspect_resize, load_image_respecting_exif};
use super::error::{FrameError, Result};

pub const THUMBNAIL_SIZE: u32 = 100;

/// Square thumbnails stored next to the pictures, one file per picture basename.
#[derive(Clone, Debug)]
pub struct ThumbnailStore {
    dir: PathBuf,
    size: u32,
}

#[derive(Debug)]
pub struct Thumbnail {
    pub path: PathBuf,
    pub regenerated: bool,
}

impl ThumbnailStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            size: THUMBNAIL_SIZE,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, source: &Path) -> Result<PathBuf> {
        let name = source
            .file_name()
            .ok_or_else(|| FrameError::InvalidName(source.display().to_string()))?;
        Ok(self.dir.join(name))
    }

    /// Return a thumbnail for `source`, regenerating it when missing or older than the source.
    pub fn ensure(&self, source: &Path) -> Result<Thumbnail> {
        let path = self.path_for(source)?;
        if is_fresh(source, &path)? {
            return Ok(Thumbnail {
                path,
                regenerated: false,
            });
        }

        fs::create_dir_all(&self.dir)?;
        let image = load_image_respecting_exif(source)?;
        let thumb = DynamicImage::ImageRgb8(clamp_aspect_resize(&image, self.size, self.size));

        // each call encodes into its own staging file, and the rename swaps whole files in
        let format = ImageFormat::from_path(&path)?;
        let mut staging = tempfile::Builder::new()
            .prefix(".")
            .suffix(".part")
            .tempfile_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(staging.as_file_mut());
            thumb.write_to(&mut writer, format)?;
            writer.flush()?;
        }
        staging.persist(&path).map_err(|e| e.error)?;
        info!(path = %path.display(), "Wrote thumbnail");

        Ok(Thumbnail {
            path,
            regenerated: true,
        })
    }

    /// Delete thumbnails whose picture is gone from `pictures`. Returns how many were removed.
    pub fn sweep_orphans(&self, pictures: &Path) -> Result<usize> {
        fs::create_dir_all(&self.dir)?;
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            if pictures.join(&name).exists() {
                continue;
            }
            match fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %entry.path().display(), error = %e, "Failed removing orphaned thumbnail"),
            }
        }
        if removed > 0 {
            info!(removed, dir = %self.dir.display(), "Removed orphaned thumbnails");
        }
        Ok(removed)
    }
}

fn is_fresh(source: &Path, thumbnail: &Path) -> Result<bool> {
    let thumb_modified = match fs::metadata(thumbnail) {
        Ok(meta) => meta.modified()?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    let source_modified = fs::metadata(source)?.modified()?;
    Ok(thumb_modified >= source_modified)
}
