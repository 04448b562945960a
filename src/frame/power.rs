use std::fs;
use std::path::Path;
use std::process::Command;

use tracing::info;

use super::error::{FrameError, Result};

const DEVICE_TREE_MODEL: &str = "/proc/device-tree/model";

/// Host power actions, only meaningful on the frame hardware itself.
pub trait PowerControl: Send + Sync {
    fn is_supported(&self) -> bool;
    fn shutdown(&self) -> Result<()>;
    fn reboot(&self) -> Result<()>;
}

/// Shells out to the system `shutdown`/`reboot` commands on a Raspberry Pi.
#[derive(Clone, Copy, Debug)]
pub struct SystemPower {
    supported: bool,
}

impl SystemPower {
    pub fn detect() -> Self {
        let supported = is_raspberry_pi();
        info!(supported, "Power control");
        Self { supported }
    }
}

impl PowerControl for SystemPower {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn shutdown(&self) -> Result<()> {
        run("shutdown", &["-h", "now"])
    }

    fn reboot(&self) -> Result<()> {
        run("reboot", &[])
    }
}

fn run(action: &'static str, args: &[&str]) -> Result<()> {
    info!(action, "Running power action");
    let status = Command::new(action).args(args).status()?;
    if status.success() {
        Ok(())
    } else {
        Err(FrameError::Power { action, status })
    }
}

pub fn is_raspberry_pi() -> bool {
    cfg!(target_os = "linux") && model_is_raspberry_pi(Path::new(DEVICE_TREE_MODEL))
}

fn model_is_raspberry_pi(model_path: &Path) -> bool {
    fs::read(model_path)
        .map(|raw| String::from_utf8_lossy(&raw).contains("Raspberry Pi"))
        .unwrap_or(false)
}
