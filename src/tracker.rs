//! Tracker boundary.
//!
//! The driver only needs four things from a tracker: feed it frames, shut it
//! down, and ask it for its two trajectory exports. What it computes and how
//! it lays out the files is its own business.
//!
//! `TrajectoryRecorder` is the tracker bundled with the binary. It loads the
//! vocabulary and settings files, records one pose per frame and writes
//! trajectories as `timestamp tx ty tz qx qy qz qw` lines.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fmt::Write as _;
use std::path::Path;

use crate::frame::FrameRecord;

pub trait Tracker {
    /// Consume one frame. Runs synchronously on the loop thread.
    fn process_frame(&mut self, record: FrameRecord);

    /// Finalize; frames arriving afterwards are ignored.
    fn shutdown(&mut self);

    fn save_keyframe_trajectory(&self, path: &Path) -> Result<()>;

    fn save_camera_trajectory(&self, path: &Path) -> Result<()>;
}

const DEFAULT_KEYFRAME_INTERVAL: u64 = 10;
const DEFAULT_TRACKER_NAME: &str = "trajectory-recorder";

#[derive(Debug, Deserialize, Default)]
struct SettingsFile {
    tracker: Option<TrackerSection>,
}

#[derive(Debug, Deserialize, Default)]
struct TrackerSection {
    name: Option<String>,
    keyframe_interval: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackerSettings {
    pub name: String,
    /// Every n-th processed frame becomes a key frame.
    pub keyframe_interval: u64,
}

impl TrackerSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read settings file {}: {}", path.display(), e))?;
        Self::parse(&raw).with_context(|| format!("invalid settings file {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let file: SettingsFile = toml::from_str(raw)?;
        let section = file.tracker.unwrap_or_default();
        let keyframe_interval = section.keyframe_interval.unwrap_or(DEFAULT_KEYFRAME_INTERVAL);
        if keyframe_interval == 0 {
            return Err(anyhow!("tracker.keyframe_interval must be at least 1"));
        }
        Ok(Self {
            name: section
                .name
                .unwrap_or_else(|| DEFAULT_TRACKER_NAME.to_string()),
            keyframe_interval,
        })
    }
}

/// Camera pose: position and unit quaternion orientation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub timestamp: f64,
    pub translation: [f64; 3],
    /// `[qx, qy, qz, qw]`
    pub rotation: [f64; 4],
}

impl Pose {
    pub fn identity(timestamp: f64) -> Self {
        Self {
            timestamp,
            translation: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
        }
    }

    pub fn to_line(&self) -> String {
        let [tx, ty, tz] = self.translation;
        let [qx, qy, qz, qw] = self.rotation;
        format!(
            "{:.6} {:.9} {:.9} {:.9} {:.9} {:.9} {:.9} {:.9}",
            self.timestamp, tx, ty, tz, qx, qy, qz, qw
        )
    }
}

pub struct TrajectoryRecorder {
    settings: TrackerSettings,
    poses: Vec<Pose>,
    keyframes: Vec<usize>,
    shut_down: bool,
}

impl TrajectoryRecorder {
    /// Load the vocabulary and settings files.
    pub fn open(vocabulary: &Path, settings: &Path) -> Result<Self> {
        let meta = std::fs::metadata(vocabulary)
            .with_context(|| format!("failed to read vocabulary {}", vocabulary.display()))?;
        if !meta.is_file() || meta.len() == 0 {
            return Err(anyhow!(
                "vocabulary {} is not a non-empty file",
                vocabulary.display()
            ));
        }
        let settings = TrackerSettings::load(settings)?;
        log::info!(
            "tracker {} ready (vocabulary {} bytes, key frame every {} frames)",
            settings.name,
            meta.len(),
            settings.keyframe_interval
        );
        Ok(Self::with_settings(settings))
    }

    pub fn with_settings(settings: TrackerSettings) -> Self {
        Self {
            settings,
            poses: Vec::new(),
            keyframes: Vec::new(),
            shut_down: false,
        }
    }

    pub fn poses(&self) -> &[Pose] {
        &self.poses
    }

    pub fn keyframe_poses(&self) -> impl Iterator<Item = &Pose> {
        self.keyframes.iter().map(|&index| &self.poses[index])
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

impl Tracker for TrajectoryRecorder {
    fn process_frame(&mut self, record: FrameRecord) {
        if self.shut_down {
            log::warn!(
                "tracker {}: frame at {:.6} after shutdown ignored",
                self.settings.name,
                record.timestamp
            );
            return;
        }
        if self.poses.len() as u64 % self.settings.keyframe_interval == 0 {
            self.keyframes.push(self.poses.len());
        }
        self.poses.push(Pose::identity(record.timestamp));
    }

    fn shutdown(&mut self) {
        if !self.shut_down {
            log::info!(
                "tracker {} shut down ({} poses, {} key frames)",
                self.settings.name,
                self.poses.len(),
                self.keyframes.len()
            );
        }
        self.shut_down = true;
    }

    fn save_keyframe_trajectory(&self, path: &Path) -> Result<()> {
        write_trajectory(path, self.keyframe_poses())?;
        log::info!(
            "key frame trajectory ({} poses) saved to {}",
            self.keyframes.len(),
            path.display()
        );
        Ok(())
    }

    fn save_camera_trajectory(&self, path: &Path) -> Result<()> {
        write_trajectory(path, self.poses.iter())?;
        log::info!(
            "camera trajectory ({} poses) saved to {}",
            self.poses.len(),
            path.display()
        );
        Ok(())
    }
}

fn write_trajectory<'a>(path: &Path, poses: impl Iterator<Item = &'a Pose>) -> Result<()> {
    let mut out = String::new();
    for pose in poses {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{}", pose.to_line());
    }
    std::fs::write(path, out)
        .with_context(|| format!("failed to write trajectory {}", path.display()))
}
