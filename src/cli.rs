//! Command line: exactly three positionals.
//!
//! Wrong arity is reported with the fixed usage block and exit code 1, not
//! clap's own error output and exit code 2.

use clap::error::ErrorKind;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

pub const USAGE: &str = "Usage: mono_video path_to_vocabulary path_to_settings path_to_video_or_camera
       Example with file:   mono_video ORBvoc.txt settings.toml video.mp4
       Example with webcam: mono_video ORBvoc.txt settings.toml 0";

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "mono_video",
    version,
    about = "Feed a video file or webcam to the tracker at its native rate"
)]
pub struct Args {
    /// Path to the tracker vocabulary.
    pub vocabulary: PathBuf,
    /// Path to the tracker settings (TOML).
    pub settings: PathBuf,
    /// Camera index (single digit) or video file path / stream URI.
    #[arg(allow_hyphen_values = true)]
    pub input: String,
}

#[derive(Debug)]
pub enum ArgumentError {
    /// Wrong number of arguments or unparseable input.
    Usage,
    /// `--help` / `--version`; clap prints these itself.
    Informational(clap::Error),
}

impl ArgumentError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ArgumentError::Usage => 1,
            ArgumentError::Informational(_) => 0,
        }
    }
}

impl std::fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArgumentError::Usage => f.write_str(USAGE),
            ArgumentError::Informational(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ArgumentError {}

/// Parse `argv` (program name first).
pub fn parse_args<I, T>(argv: I) -> Result<Args, ArgumentError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Args::try_parse_from(argv).map_err(|err| match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ArgumentError::Informational(err),
        _ => ArgumentError::Usage,
    })
}
