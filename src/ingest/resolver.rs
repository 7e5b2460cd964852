//! Input classification and source opening.
//!
//! A single ASCII digit selects a camera index and is tried first with the
//! `ANY` backend. Anything else (or a camera that failed to open) is treated as
//! a file path or stream URI and offered to every catalog candidate in order.
//!
//! Each attempt yields an `OpenAttempt`; a failed attempt never aborts
//! resolution. Only when every candidate has failed does `resolve` return an
//! `OpenError` listing all of them.

use super::catalog::{BackendCatalog, BackendId};
use super::{SourceOpener, VideoSource};

/// What the input token refers to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Camera(u32),
    File(String),
}

/// Classified input token. Fixed for the whole run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub token: String,
    pub kind: SourceKind,
}

impl SourceDescriptor {
    pub fn classify(token: &str) -> Self {
        let mut chars = token.chars();
        let kind = match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_digit() => SourceKind::Camera(c as u32 - '0' as u32),
            _ => SourceKind::File(token.to_string()),
        };
        Self {
            token: token.to_string(),
            kind,
        }
    }

    /// Live sources have no embedded timeline.
    pub fn is_live(&self) -> bool {
        matches!(self.kind, SourceKind::Camera(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    Opened,
    Failed(String),
}

/// One backend tried against the input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenAttempt {
    /// Candidate label, e.g. `camera 0 via CAP_ANY` or `CAP_FFMPEG`.
    pub candidate: String,
    pub outcome: AttemptOutcome,
}

impl OpenAttempt {
    pub fn succeeded(&self) -> bool {
        self.outcome == AttemptOutcome::Opened
    }
}

/// Every candidate failed.
#[derive(Clone, Debug)]
pub struct OpenError {
    pub token: String,
    pub attempts: Vec<OpenAttempt>,
}

impl OpenError {
    pub const SUGGESTIONS: &'static str = "Suggestions: for a webcam use its index (e.g. '0'); \
for a video file check the path, make sure a decoder for its codec is available \
(build with --features ingest-file-ffmpeg), or re-encode it.";
}

impl std::fmt::Display for OpenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "failed to open input '{}' ({} candidates tried)",
            self.token,
            self.attempts.len()
        )?;
        for attempt in &self.attempts {
            if let AttemptOutcome::Failed(reason) = &attempt.outcome {
                write!(f, "\n  {}: {}", attempt.candidate, reason)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for OpenError {}

/// A successfully opened source and how it was obtained.
pub struct Resolved {
    pub source: Box<dyn VideoSource>,
    /// Label of the candidate that opened it.
    pub backend: String,
    /// Every attempt made, the successful one last.
    pub attempts: Vec<OpenAttempt>,
}

/// Opens sources by walking a `BackendCatalog`.
pub struct SourceResolver<'a, O: SourceOpener> {
    catalog: &'a BackendCatalog,
    opener: &'a mut O,
}

impl<'a, O: SourceOpener> SourceResolver<'a, O> {
    pub fn new(catalog: &'a BackendCatalog, opener: &'a mut O) -> Self {
        Self { catalog, opener }
    }

    pub fn resolve(&mut self, descriptor: &SourceDescriptor) -> Result<Resolved, OpenError> {
        let mut attempts = Vec::new();

        if let SourceKind::Camera(index) = descriptor.kind {
            let candidate = format!("camera {} via CAP_{}", index, BackendId::Any);
            log::info!("trying to open webcam index {} ...", index);
            let result = self.opener.open_camera(index, BackendId::Any);
            if let Some(source) = record(&mut attempts, candidate.clone(), result) {
                log::info!("opened webcam index {}", index);
                return Ok(Resolved {
                    source,
                    backend: candidate,
                    attempts,
                });
            }
        }

        for candidate in self.catalog.iter() {
            let result = self.opener.open_path(&descriptor.token, candidate.id);
            if let Some(source) = record(&mut attempts, candidate.name.clone(), result) {
                log::info!("opened video with backend: {}", candidate.name);
                return Ok(Resolved {
                    source,
                    backend: candidate.name.clone(),
                    attempts,
                });
            }
        }

        Err(OpenError {
            token: descriptor.token.clone(),
            attempts,
        })
    }
}

fn record(
    attempts: &mut Vec<OpenAttempt>,
    candidate: String,
    result: anyhow::Result<Box<dyn VideoSource>>,
) -> Option<Box<dyn VideoSource>> {
    match result {
        Ok(source) => {
            attempts.push(OpenAttempt {
                candidate,
                outcome: AttemptOutcome::Opened,
            });
            Some(source)
        }
        Err(err) => {
            log::warn!("failed to open with {}: {:#}", candidate, err);
            attempts.push(OpenAttempt {
                candidate,
                outcome: AttemptOutcome::Failed(format!("{:#}", err)),
            });
            None
        }
    }
}
