use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Cannot read picture directory {path}: {source}")]
    PictureDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid image name {0:?}")]
    InvalidName(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("Control server stopped before it was ready")]
    ServerStartup,

    #[error("Control server thread panicked")]
    ServerPanicked,

    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("Window error: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("Surface error: {0}")]
    Surface(#[from] pixels::Error),

    #[error("Surface resize error: {0}")]
    SurfaceResize(#[from] pixels::TextureError),

    #[error("{action} exited with {status}")]
    Power {
        action: &'static str,
        status: std::process::ExitStatus,
    },
}

pub type Result<T> = std::result::Result<T, FrameError>;
