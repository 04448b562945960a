use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::{FrameError, Result};

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpeg", "jpg"];

/// The pictures the frame cycles through, in scan order.
#[derive(Clone, Debug, Default)]
pub struct ImageSet {
    dir: PathBuf,
    files: Vec<PathBuf>,
}

impl ImageSet {
    /// Scan `dir` for png/jpeg/jpg files (extension match ignores case).
    pub fn scan(dir: &Path) -> Result<Self> {
        let entries = fs::read_dir(dir).map_err(|source| FrameError::PictureDirectory {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && has_image_extension(&path) {
                files.push(path);
            }
        }
        files.sort();
        debug!(dir = %dir.display(), count = files.len(), "Scanned pictures");

        Ok(Self {
            dir: dir.to_path_buf(),
            files,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn path(&self, index: usize) -> Option<&Path> {
        self.files.get(index).map(PathBuf::as_path)
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.path(index).and_then(basename)
    }

    pub fn names(&self) -> Vec<String> {
        self.files
            .iter()
            .filter_map(|p| basename(p))
            .map(str::to_owned)
            .collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.files.iter().position(|p| basename(p) == Some(name))
    }
}

pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|known| e.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}

fn basename(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

/// Accept only bare file names; anything that could walk out of a directory is refused.
pub fn validate_basename(name: &str) -> Result<&str> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if bad {
        return Err(FrameError::InvalidName(name.to_owned()));
    }
    Ok(name)
}
