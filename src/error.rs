//! Error types for counter readers and monitor setup.
//!
//! Readers never panic on a missing or malformed source; they return a
//! [`ReadError`] and the caller decides whether the failure is benign churn
//! (a process that exited mid-scan), a degraded source (keep the previous
//! value) or fatal (a mandatory sensor missing at start-up).

use std::path::{Path, PathBuf};

/// Failure to read a single counter source.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("source unavailable: {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {source_name}: {reason}")]
    ParseMalformed { source_name: String, reason: String },

    #[error("process {0} vanished during scan")]
    ProcessVanished(u32),
}

impl ReadError {
    pub fn unavailable(path: &Path, source: std::io::Error) -> Self {
        ReadError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn malformed(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        ReadError::ParseMalformed {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

/// Start-up failure. The monitor refuses to run rather than show zeros.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("{sensor} sensor unavailable: {source}")]
    SensorUnavailable {
        sensor: &'static str,
        #[source]
        source: ReadError,
    },

    #[error("no {0} sensor found")]
    NoSensorFound(&'static str),

    #[error("cannot seed {what}: {source}")]
    Seed {
        what: &'static str,
        #[source]
        source: ReadError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ReadError::unavailable(
            Path::new("/proc/stat"),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(err.to_string().starts_with("source unavailable: /proc/stat"));

        let err = ReadError::malformed("/proc/net/dev", "missing header");
        assert_eq!(err.to_string(), "malformed /proc/net/dev: missing header");

        let err = SetupError::NoSensorFound("fan");
        assert_eq!(err.to_string(), "no fan sensor found");
    }
}
