//! End-to-end runs of the driver against simulated sources and trackers.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use mono_video::ingest::{SyntheticConfig, SyntheticSource};
use mono_video::{
    parse_args, run_cli, BackendCatalog, BackendId, Driver, DriverConfig, DriverError, Frame,
    FrameDisplay, FrameRecord, LoopExit, SourceOpener, SystemOpener, Tracker, TrajectoryRecorder,
    VideoSource, CAMERA_TRAJECTORY_FILE, ESC_KEY, KEYFRAME_TRAJECTORY_FILE,
};

#[derive(Clone, Debug, PartialEq)]
enum Event {
    Frame(f64),
    Shutdown,
    SaveKeyFrames { path: PathBuf, dir_existed: bool },
    SaveCamera { path: PathBuf },
}

#[derive(Clone, Default)]
struct RecordingTracker {
    events: Rc<RefCell<Vec<Event>>>,
}

impl Tracker for RecordingTracker {
    fn process_frame(&mut self, record: FrameRecord) {
        self.events
            .borrow_mut()
            .push(Event::Frame(record.timestamp));
    }

    fn shutdown(&mut self) {
        self.events.borrow_mut().push(Event::Shutdown);
    }

    fn save_keyframe_trajectory(&self, path: &Path) -> Result<()> {
        let dir_existed = path.parent().is_some_and(Path::is_dir);
        self.events.borrow_mut().push(Event::SaveKeyFrames {
            path: path.to_path_buf(),
            dir_existed,
        });
        Ok(())
    }

    fn save_camera_trajectory(&self, path: &Path) -> Result<()> {
        self.events.borrow_mut().push(Event::SaveCamera {
            path: path.to_path_buf(),
        });
        Ok(())
    }
}

/// A webcam at index 0 that reports no frame rate and delivers `frames`
/// frames; no file can be opened.
struct SimulatedCamera {
    frames: u64,
    calls: Vec<String>,
}

impl SimulatedCamera {
    fn new(frames: u64) -> Self {
        Self {
            frames,
            calls: Vec::new(),
        }
    }
}

impl SourceOpener for SimulatedCamera {
    fn open_camera(&mut self, index: u32, backend: BackendId) -> Result<Box<dyn VideoSource>> {
        self.calls.push(format!("camera:{}:{}", index, backend));
        if index != 0 {
            return Err(anyhow!("no camera at index {}", index));
        }
        Ok(Box::new(SyntheticSource::new(SyntheticConfig {
            name: "webcam0".to_string(),
            frames: self.frames,
            fps: 0.0,
            width: 8,
            height: 6,
        })))
    }

    fn open_path(&mut self, target: &str, backend: BackendId) -> Result<Box<dyn VideoSource>> {
        self.calls.push(format!("path:{}:{}", target, backend));
        Err(anyhow!("{}: cannot open {}", backend, target))
    }
}

/// Never reports a key unless `esc_on` is reached.
struct ScriptedDisplay {
    shown: u64,
    esc_on: Option<u64>,
    closed: bool,
}

impl ScriptedDisplay {
    fn quiet() -> Self {
        Self {
            shown: 0,
            esc_on: None,
            closed: false,
        }
    }

    fn esc_on(frame: u64) -> Self {
        Self {
            esc_on: Some(frame),
            ..Self::quiet()
        }
    }
}

impl FrameDisplay for ScriptedDisplay {
    fn show(&mut self, _frame: &Frame, _timeout: Duration) -> Option<i32> {
        self.shown += 1;
        (Some(self.shown) == self.esc_on).then_some(ESC_KEY)
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

fn config(log_dir: &Path) -> DriverConfig {
    DriverConfig {
        log_dir: log_dir.to_path_buf(),
        ..DriverConfig::default()
    }
}

fn catalog() -> BackendCatalog {
    BackendCatalog::new([BackendId::Ffmpeg, BackendId::V4l2])
}

fn argv(input: &str) -> [&str; 4] {
    ["mono_video", "ORBvoc.txt", "settings.toml", input]
}

fn args(input: &str) -> mono_video::Args {
    parse_args(argv(input)).expect("valid argv")
}

#[test]
fn camera_run_records_every_frame_and_persists() -> Result<()> {
    let root = tempfile::tempdir()?;
    let log_dir = root.path().join("log");
    let tracker = RecordingTracker::default();
    let events = Rc::clone(&tracker.events);

    let mut driver = Driver::new(
        config(&log_dir),
        catalog(),
        SimulatedCamera::new(5),
        ScriptedDisplay::quiet(),
    );
    let report = driver
        .run(&args("0"), move |_, _| Ok(tracker))
        .expect("camera run succeeds");

    assert_eq!(report.frames, 5);
    assert_eq!(report.exit, LoopExit::EndOfStream);
    assert_eq!(report.backend, "camera 0 via CAP_ANY");
    assert_eq!(report.summary.map(|s| s.count), Some(5));
    assert!(log_dir.is_dir());
    assert_eq!(driver.opener().calls, vec!["camera:0:ANY"]);
    assert!(driver.display().closed);

    let events = events.borrow();
    let stamps: Vec<f64> = events
        .iter()
        .filter_map(|e| match e {
            Event::Frame(t) => Some(*t),
            _ => None,
        })
        .collect();
    assert_eq!(stamps.len(), 5);
    assert!(stamps.windows(2).all(|w| w[1] >= w[0]));
    assert_eq!(
        events[5..],
        [
            Event::Shutdown,
            Event::SaveKeyFrames {
                path: log_dir.join(KEYFRAME_TRAJECTORY_FILE),
                dir_existed: true,
            },
            Event::SaveCamera {
                path: log_dir.join(CAMERA_TRAJECTORY_FILE),
            },
        ]
    );
    Ok(())
}

#[test]
fn unopenable_input_fails_without_output() -> Result<()> {
    let root = tempfile::tempdir()?;
    let log_dir = root.path().join("log");
    let tracker_built = Cell::new(false);

    let mut driver = Driver::new(
        config(&log_dir),
        catalog(),
        SimulatedCamera::new(5),
        ScriptedDisplay::quiet(),
    );
    let result = driver.run(&args("/nonexistent/clip.mp4"), |_, _| {
        tracker_built.set(true);
        Ok(RecordingTracker::default())
    });

    let err = match result {
        Ok(_) => panic!("nothing can open the input"),
        Err(err) => err,
    };
    assert_eq!(err.exit_code(), 1);
    let DriverError::SourceOpen(open_err) = &err else {
        panic!("expected a source open error, got {}", err);
    };
    let tried: Vec<&str> = open_err
        .attempts
        .iter()
        .map(|a| a.candidate.as_str())
        .collect();
    assert_eq!(tried, vec!["CAP_FFMPEG", "CAP_V4L2", "CAP_ANY"]);
    assert!(open_err.attempts.iter().all(|a| !a.succeeded()));
    assert!(driver.opener().calls.iter().all(|c| c.starts_with("path:")));
    assert!(!tracker_built.get());
    assert!(!log_dir.exists());
    Ok(())
}

#[test]
fn system_opener_reports_missing_files() -> Result<()> {
    let root = tempfile::tempdir()?;
    let log_dir = root.path().join("log");

    let mut driver = Driver::new(
        config(&log_dir),
        BackendCatalog::for_target(),
        SystemOpener,
        ScriptedDisplay::quiet(),
    );
    let input = root.path().join("missing.mp4").display().to_string();
    let result = driver.run(&args(&input), |_, _| Ok(RecordingTracker::default()));

    assert!(matches!(result, Err(DriverError::SourceOpen(_))));
    assert!(!log_dir.exists());
    Ok(())
}

#[test]
fn wrong_arity_never_reaches_the_resolver() -> Result<()> {
    let root = tempfile::tempdir()?;
    let log_dir = root.path().join("log");
    let tracker_built = Cell::new(false);
    let mut driver = Driver::new(
        config(&log_dir),
        catalog(),
        SimulatedCamera::new(5),
        ScriptedDisplay::quiet(),
    );

    let short = ["mono_video", "ORBvoc.txt", "settings.toml"];
    let code = run_cli(short, &mut driver, |_, _| {
        tracker_built.set(true);
        Ok(RecordingTracker::default())
    });

    assert_eq!(code, 1);
    assert!(driver.opener().calls.is_empty());
    assert_eq!(driver.display().shown, 0);
    assert!(!tracker_built.get());
    assert!(!log_dir.exists());
    Ok(())
}

#[test]
fn cli_exit_codes_follow_the_run() -> Result<()> {
    let root = tempfile::tempdir()?;
    let log_dir = root.path().join("log");
    let mut driver = Driver::new(
        config(&log_dir),
        catalog(),
        SimulatedCamera::new(3),
        ScriptedDisplay::quiet(),
    );

    let failed = run_cli(argv("/nonexistent/clip.mp4"), &mut driver, |_, _| {
        Ok(RecordingTracker::default())
    });
    assert_eq!(failed, 1);
    assert!(!log_dir.exists());

    let succeeded = run_cli(argv("0"), &mut driver, |_, _| {
        Ok(RecordingTracker::default())
    });
    assert_eq!(succeeded, 0);
    assert_eq!(driver.display().shown, 3);
    assert!(log_dir.is_dir());
    Ok(())
}

#[test]
fn zero_reported_rate_paces_at_thirty_fps() -> Result<()> {
    let root = tempfile::tempdir()?;
    let mut driver = Driver::new(
        config(&root.path().join("log")),
        BackendCatalog::for_target(),
        SystemOpener,
        ScriptedDisplay::quiet(),
    );

    let args = args("stub://still?frames=2&fps=0&width=4&height=4");
    let report = driver
        .run(&args, |_, _| Ok(RecordingTracker::default()))
        .expect("synthetic run succeeds");

    assert_eq!(report.rate.reported_fps, 0.0);
    assert_eq!(report.rate.effective_fps, 30.0);
    assert!((report.rate.frame_interval_secs - 0.0333).abs() < 1e-3);
    Ok(())
}

#[test]
fn vanishing_reported_rate_does_not_panic() -> Result<()> {
    let root = tempfile::tempdir()?;
    let log_dir = root.path().join("log");
    let mut driver = Driver::new(
        config(&log_dir),
        BackendCatalog::for_target(),
        SystemOpener,
        ScriptedDisplay::quiet(),
    );

    let args = args("stub://empty?frames=0&fps=1e-300");
    let report = driver
        .run(&args, |_, _| Ok(RecordingTracker::default()))
        .expect("run succeeds");

    assert_eq!(report.rate.effective_fps, 1e-300);
    assert_eq!(report.rate.frame_interval(), Duration::MAX);
    assert_eq!(report.frames, 0);
    assert!(report.summary.is_none());
    assert!(log_dir.is_dir());
    Ok(())
}

#[test]
fn exit_key_still_persists_results() -> Result<()> {
    let root = tempfile::tempdir()?;
    let log_dir = root.path().join("log");
    let tracker = RecordingTracker::default();
    let events = Rc::clone(&tracker.events);

    let mut driver = Driver::new(
        config(&log_dir),
        BackendCatalog::for_target(),
        SystemOpener,
        ScriptedDisplay::esc_on(2),
    );
    let args = args("stub://clip?frames=100&fps=120");
    let report = driver
        .run(&args, move |_, _| Ok(tracker))
        .expect("run succeeds");

    assert_eq!(report.exit, LoopExit::ExitKey);
    assert_eq!(report.frames, 2);
    let events = events.borrow();
    assert_eq!(events.len(), 2 + 3);
    assert_eq!(events[2], Event::Shutdown);
    Ok(())
}

#[test]
fn bundled_tracker_writes_both_trajectories() -> Result<()> {
    let root = tempfile::tempdir()?;
    let log_dir = root.path().join("log");
    let vocabulary = root.path().join("ORBvoc.txt");
    let settings = root.path().join("settings.toml");
    std::fs::write(&vocabulary, "vocabulary\n")?;
    std::fs::write(&settings, "[tracker]\nkeyframe_interval = 3\n")?;

    let argv = [
        "mono_video".to_string(),
        vocabulary.display().to_string(),
        settings.display().to_string(),
        "stub://clip?frames=6&fps=120&width=4&height=4".to_string(),
    ];
    let args = parse_args(argv).expect("valid argv");
    let mut driver = Driver::new(
        config(&log_dir),
        BackendCatalog::for_target(),
        SystemOpener,
        ScriptedDisplay::quiet(),
    );

    let report = driver
        .run(&args, TrajectoryRecorder::open)
        .expect("run succeeds");

    let camera = std::fs::read_to_string(&report.outputs.camera_trajectory)?;
    let keyframes = std::fs::read_to_string(&report.outputs.keyframe_trajectory)?;
    assert_eq!(camera.lines().count(), 6);
    assert_eq!(keyframes.lines().count(), 2);
    for line in camera.lines() {
        assert_eq!(line.split_whitespace().count(), 8);
    }
    let second = camera.lines().nth(1).unwrap_or_default();
    assert!(second.starts_with("0.008333 "));
    Ok(())
}

#[test]
fn missing_vocabulary_is_a_tracker_error() -> Result<()> {
    let root = tempfile::tempdir()?;
    let log_dir = root.path().join("log");
    let mut driver = Driver::new(
        config(&log_dir),
        BackendCatalog::for_target(),
        SystemOpener,
        ScriptedDisplay::quiet(),
    );

    let result = driver.run(&args("stub://clip?frames=2"), TrajectoryRecorder::open);

    assert!(matches!(result, Err(DriverError::Tracker(_))));
    assert!(!log_dir.exists());
    Ok(())
}
