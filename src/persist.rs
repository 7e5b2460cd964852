//! Result persistence.
//!
//! Makes sure the log directory exists, then asks the tracker for its two
//! trajectory exports, key frames first. Runs once, after shutdown.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::tracker::Tracker;

pub const KEYFRAME_TRAJECTORY_FILE: &str = "KeyFrameTrajectory.txt";
pub const CAMERA_TRAJECTORY_FILE: &str = "CameraTrajectory.txt";

/// Files written by a successful `persist`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersistedOutputs {
    pub dir: PathBuf,
    pub keyframe_trajectory: PathBuf,
    pub camera_trajectory: PathBuf,
}

/// Create `dir` if absent. Existing directories are left untouched.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))
}

pub fn persist(tracker: &dyn Tracker, dir: &Path) -> Result<PersistedOutputs> {
    ensure_dir(dir)?;
    let outputs = PersistedOutputs {
        dir: dir.to_path_buf(),
        keyframe_trajectory: dir.join(KEYFRAME_TRAJECTORY_FILE),
        camera_trajectory: dir.join(CAMERA_TRAJECTORY_FILE),
    };
    tracker
        .save_keyframe_trajectory(&outputs.keyframe_trajectory)
        .context("key frame trajectory export failed")?;
    tracker
        .save_camera_trajectory(&outputs.camera_trajectory)
        .context("camera trajectory export failed")?;
    Ok(outputs)
}
