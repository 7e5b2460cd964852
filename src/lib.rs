//! mono_video
//!
//! Feeds a recorded video or a live camera to a tracker one frame at a time,
//! paced to the source's native rate, then reports per-frame processing times
//! and has the tracker save its trajectories.
//!
//! # Flow
//!
//! 1. **Opening**: the input token is classified (single digit = camera
//!    index, anything else = path/URI) and resolved against an ordered
//!    `BackendCatalog`. Every attempt is logged; only exhausting all of them
//!    is fatal.
//! 2. **Running**: `FrameLoop` reads a frame, stamps it (wall clock for
//!    cameras, decoder position for files), hands it to the `Tracker`, times
//!    the call, shows the frame while polling for the exit key, and sleeps
//!    for whatever is left of the frame interval.
//! 3. **Shutdown**: the source is released and the tracker shut down.
//! 4. **Persisted**: timing summary printed, log directory ensured, both
//!    trajectory exports written.
//!
//! # Module Structure
//!
//! - `ingest`: backend catalog, resolver, video sources
//! - `timestamp`, `pacing`, `stats`: per-frame policies
//! - `frame_loop`, `driver`: orchestration
//! - `tracker`, `persist`, `display`: collaborator boundaries
//! - `cli`, `config`, `ui`: ambient surface

pub mod cli;
pub mod config;
pub mod display;
pub mod driver;
pub mod frame;
pub mod frame_loop;
pub mod ingest;
pub mod pacing;
pub mod persist;
pub mod stats;
pub mod timestamp;
pub mod tracker;
pub mod ui;

pub use cli::{parse_args, ArgumentError, Args, USAGE};
pub use config::DriverConfig;
pub use display::{ConsoleDisplay, FrameDisplay, ESC_KEY};
pub use driver::{run_cli, Driver, DriverError, RunReport};
pub use frame::{Frame, FrameRecord};
pub use frame_loop::{FrameLoop, LoopExit, LoopOutcome};
pub use ingest::{
    AttemptOutcome, BackendCandidate, BackendCatalog, BackendId, OpenAttempt, OpenError,
    SourceDescriptor, SourceKind, SourceOpener, SourceResolver, SystemOpener, VideoSource,
};
pub use pacing::{compute_sleep, RateConfig, FALLBACK_FPS, MAX_FPS};
pub use persist::{persist, PersistedOutputs, CAMERA_TRAJECTORY_FILE, KEYFRAME_TRAJECTORY_FILE};
pub use stats::{StatsCollector, TimingSummary};
pub use timestamp::TimestampPolicy;
pub use tracker::{Pose, Tracker, TrackerSettings, TrajectoryRecorder};
pub use ui::{Ui, UiMode};
