//! Ordered decoding backend candidates.
//!
//! The catalog is plain data assembled once at startup from what this build
//! compiled in (or from configuration). The resolver walks it in order. The
//! universal `ANY` fallback is appended when the order does not name it.

use anyhow::{anyhow, Result};

/// Identifies a decoding/capture implementation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BackendId {
    /// FFmpeg demuxer + decoder (feature: ingest-file-ffmpeg).
    Ffmpeg,
    /// Video4Linux2 capture devices (feature: ingest-v4l2).
    V4l2,
    /// Generated frames for `stub://` inputs.
    Synthetic,
    /// Auto-select from the input and what was compiled in.
    Any,
}

impl BackendId {
    pub fn name(self) -> &'static str {
        match self {
            BackendId::Ffmpeg => "FFMPEG",
            BackendId::V4l2 => "V4L2",
            BackendId::Synthetic => "SYNTHETIC",
            BackendId::Any => "ANY",
        }
    }

    /// Parse a configured backend name (case-insensitive).
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "FFMPEG" => Ok(BackendId::Ffmpeg),
            "V4L2" => Ok(BackendId::V4l2),
            "SYNTHETIC" | "STUB" => Ok(BackendId::Synthetic),
            "ANY" => Ok(BackendId::Any),
            other => Err(anyhow!("unknown backend '{}'", other)),
        }
    }

    /// True when this build can actually use the backend.
    pub fn is_compiled_in(self) -> bool {
        match self {
            BackendId::Ffmpeg => cfg!(feature = "ingest-file-ffmpeg"),
            BackendId::V4l2 => cfg!(all(feature = "ingest-v4l2", target_os = "linux")),
            BackendId::Synthetic | BackendId::Any => true,
        }
    }
}

impl std::fmt::Display for BackendId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A backend entry in probe order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendCandidate {
    pub id: BackendId,
    pub name: String,
}

impl BackendCandidate {
    pub fn new(id: BackendId) -> Self {
        Self {
            id,
            name: format!("CAP_{}", id.name()),
        }
    }
}

/// Ordered list of backend candidates. Order is probe priority.
#[derive(Clone, Debug)]
pub struct BackendCatalog {
    candidates: Vec<BackendCandidate>,
}

impl BackendCatalog {
    /// Build a catalog from an explicit order.
    ///
    /// Duplicates keep their first position and `ANY` is appended when absent,
    /// so every candidate is tried at most once. An explicit `ANY` stays where
    /// it was declared.
    pub fn new(ids: impl IntoIterator<Item = BackendId>) -> Self {
        let mut candidates: Vec<BackendCandidate> = Vec::new();
        for id in ids {
            if !candidates.iter().any(|c| c.id == id) {
                candidates.push(BackendCandidate::new(id));
            }
        }
        if !candidates.iter().any(|c| c.id == BackendId::Any) {
            candidates.push(BackendCandidate::new(BackendId::Any));
        }
        Self { candidates }
    }

    /// Catalog for the current build and platform.
    pub fn for_target() -> Self {
        let ids = [BackendId::Ffmpeg, BackendId::V4l2]
            .into_iter()
            .filter(|id| id.is_compiled_in());
        Self::new(ids)
    }

    /// Catalog from configured names, e.g. `["FFMPEG", "ANY"]`.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let ids = names
            .iter()
            .map(|name| BackendId::parse(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        for id in &ids {
            if !id.is_compiled_in() {
                log::warn!(
                    "backend {} is configured but not compiled into this build",
                    id
                );
            }
        }
        Ok(Self::new(ids))
    }

    pub fn iter(&self) -> impl Iterator<Item = &BackendCandidate> {
        self.candidates.iter()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.name.as_str()).collect()
    }
}

impl Default for BackendCatalog {
    fn default() -> Self {
        Self::for_target()
    }
}
