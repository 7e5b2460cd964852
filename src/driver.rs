//! Run orchestration.
//!
//! `Driver::run` walks the run states in order:
//! 1. Opening: classify the input token and resolve a source
//! 2. Running: build the tracker, then drive the `FrameLoop`
//! 3. Shutdown: the loop releases the source, then the tracker is shut down
//! 4. Persisted: print the timing summary and export both trajectories
//!
//! An `OpenError` ends the run before any tracker exists or any file is
//! written.

use anyhow::Result;
use std::ffi::OsString;
use std::path::Path;

use crate::cli::{parse_args, ArgumentError, Args};
use crate::config::DriverConfig;
use crate::display::FrameDisplay;
use crate::frame_loop::{FrameLoop, LoopExit};
use crate::ingest::{BackendCatalog, OpenError, SourceDescriptor, SourceOpener, SourceResolver};
use crate::pacing::RateConfig;
use crate::persist::{persist, PersistedOutputs};
use crate::stats::TimingSummary;
use crate::tracker::Tracker;
use crate::ui::Ui;

#[derive(Debug)]
pub enum DriverError {
    /// Every backend candidate failed.
    SourceOpen(OpenError),
    /// The tracker could not be constructed from its vocabulary/settings.
    Tracker(anyhow::Error),
    /// Output directory or trajectory export failed.
    Persist(anyhow::Error),
}

impl DriverError {
    pub fn exit_code(&self) -> u8 {
        1
    }
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverError::SourceOpen(err) => write!(f, "{}", err),
            DriverError::Tracker(err) => write!(f, "failed to start tracker: {:#}", err),
            DriverError::Persist(err) => write!(f, "failed to save results: {:#}", err),
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DriverError::SourceOpen(err) => Some(err),
            DriverError::Tracker(err) | DriverError::Persist(err) => Some(&**err),
        }
    }
}

/// What a completed run did.
#[derive(Debug)]
pub struct RunReport {
    pub backend: String,
    pub rate: RateConfig,
    pub frames: u64,
    pub exit: LoopExit,
    pub summary: Option<TimingSummary>,
    pub outputs: PersistedOutputs,
}

pub struct Driver<O: SourceOpener, D: FrameDisplay> {
    config: DriverConfig,
    catalog: BackendCatalog,
    opener: O,
    display: D,
    ui: Ui,
}

impl<O: SourceOpener, D: FrameDisplay> Driver<O, D> {
    /// Stage output is plain until `with_ui` says otherwise.
    pub fn new(config: DriverConfig, catalog: BackendCatalog, opener: O, display: D) -> Self {
        Self {
            config,
            catalog,
            opener,
            display,
            ui: Ui::plain(),
        }
    }

    pub fn with_ui(mut self, ui: Ui) -> Self {
        self.ui = ui;
        self
    }

    pub fn opener(&self) -> &O {
        &self.opener
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// Run one session. `make_tracker` receives the vocabulary and settings
    /// paths and is only called once a source is open.
    pub fn run<T, F>(&mut self, args: &Args, make_tracker: F) -> Result<RunReport, DriverError>
    where
        T: Tracker,
        F: FnOnce(&Path, &Path) -> Result<T>,
    {
        println!();
        println!("-------");
        println!(
            "mono_video {} {} {}",
            args.vocabulary.display(),
            args.settings.display(),
            args.input
        );

        let descriptor = SourceDescriptor::classify(&args.input);
        let resolved = {
            let _stage = self.ui.stage("open input");
            SourceResolver::new(&self.catalog, &mut self.opener)
                .resolve(&descriptor)
                .map_err(DriverError::SourceOpen)?
        };

        let frame_loop = FrameLoop::new(resolved.source, &descriptor, self.config.key_poll);
        let rate = frame_loop.rate();
        println!("Input: {} ({})", args.input, resolved.backend);
        println!(
            "FPS (reported): {}   effective: {}   frame interval T = {:.6} s",
            rate.reported_fps, rate.effective_fps, rate.frame_interval_secs
        );
        println!();

        let mut tracker =
            make_tracker(&args.vocabulary, &args.settings).map_err(DriverError::Tracker)?;

        let outcome = frame_loop.run(&mut tracker, &mut self.display);
        tracker.shutdown();

        let summary = outcome.stats.summarize();
        if let Some(summary) = &summary {
            println!("-------");
            println!("{}", summary);
        }

        let outputs = {
            let _stage = self.ui.stage("save trajectories");
            persist(&tracker, &self.config.log_dir).map_err(DriverError::Persist)?
        };
        println!(
            "Finished. Trajectories saved in {}/ folder.",
            outputs.dir.display()
        );

        Ok(RunReport {
            backend: resolved.backend,
            rate,
            frames: outcome.frames,
            exit: outcome.exit,
            summary,
            outputs,
        })
    }
}

/// Parse `argv`, run one session and map the result to a process exit code.
///
/// Usage errors return before the driver is touched.
pub fn run_cli<I, A, O, D, T, F>(argv: I, driver: &mut Driver<O, D>, make_tracker: F) -> u8
where
    I: IntoIterator<Item = A>,
    A: Into<OsString> + Clone,
    O: SourceOpener,
    D: FrameDisplay,
    T: Tracker,
    F: FnOnce(&Path, &Path) -> Result<T>,
{
    let args = match parse_args(argv) {
        Ok(args) => args,
        Err(ArgumentError::Informational(err)) => {
            if let Err(io_err) = err.print() {
                log::warn!("failed to print help: {}", io_err);
            }
            return 0;
        }
        Err(err) => {
            eprintln!();
            eprintln!("{}", err);
            return err.exit_code();
        }
    };

    match driver.run(&args, make_tracker) {
        Ok(_) => 0,
        Err(err) => {
            eprintln!("{}", err);
            if matches!(err, DriverError::SourceOpen(_)) {
                eprintln!("{}", OpenError::SUGGESTIONS);
            }
            err.exit_code()
        }
    }
}
