//! Frame display and exit-key polling.
//!
//! `FrameDisplay::show` is the loop's render step and its only cooperative
//! yield: it presents the frame and waits at most `timeout` for a key.
//!
//! `ConsoleDisplay` is the headless implementation used by the binary. It
//! reports progress on stderr and turns Ctrl-C into the exit key.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::frame::Frame;

/// Key code that ends the run.
pub const ESC_KEY: i32 = 27;

pub trait FrameDisplay {
    /// Render `frame`, then wait up to `timeout` for a key press.
    fn show(&mut self, frame: &Frame, timeout: Duration) -> Option<i32>;

    /// Called once after the loop ends.
    fn close(&mut self) {}
}

pub struct ConsoleDisplay {
    interrupted: Arc<AtomicBool>,
    spinner: Option<ProgressBar>,
    frames: u64,
}

impl ConsoleDisplay {
    /// Install the Ctrl-C handler and build the display.
    ///
    /// The handler is process-wide; call this at most once.
    pub fn install(pretty: bool) -> Result<Self> {
        let interrupted = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&interrupted);
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
        })
        .context("error setting Ctrl-C handler")?;
        Ok(Self::with_flag(interrupted, pretty))
    }

    /// Build a display polling an externally owned interrupt flag.
    pub fn with_flag(interrupted: Arc<AtomicBool>, pretty: bool) -> Self {
        let spinner = pretty.then(|| {
            let spinner = ProgressBar::new_spinner();
            spinner.set_draw_target(ProgressDrawTarget::stderr());
            let style = ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            spinner.set_style(style);
            spinner
        });
        Self {
            interrupted,
            spinner,
            frames: 0,
        }
    }

    pub fn frames_shown(&self) -> u64 {
        self.frames
    }

    fn poll(&self) -> Option<i32> {
        self.interrupted.load(Ordering::SeqCst).then_some(ESC_KEY)
    }
}

impl FrameDisplay for ConsoleDisplay {
    fn show(&mut self, frame: &Frame, timeout: Duration) -> Option<i32> {
        self.frames += 1;
        match &self.spinner {
            Some(spinner) => {
                spinner.set_message(format!(
                    "frame {} ({}x{}) - Ctrl-C to stop",
                    self.frames, frame.width, frame.height
                ));
                spinner.tick();
            }
            None => log::debug!(
                "frame {} ({}x{}, {} bytes)",
                self.frames,
                frame.width,
                frame.height,
                frame.byte_len()
            ),
        }

        if let Some(key) = self.poll() {
            return Some(key);
        }
        std::thread::sleep(timeout);
        self.poll()
    }

    fn close(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} frames shown", self.frames));
        }
    }
}
