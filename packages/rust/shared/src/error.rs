//! Error types for Curricle.
//!
//! Library crates use [`CurricleError`] via `thiserror`.
//! The CLI app wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Curricle operations.
#[derive(Debug, thiserror::Error)]
pub enum CurricleError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP failure talking to the catalog backend or the encyclopedia.
    /// `status` carries the HTTP status code when one was received.
    #[error("transport error: {message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// A remote reply arrived but did not have the promised shape.
    #[error("decode error: {message}")]
    Decode { message: String },

    /// A search was attempted with a blank query.
    #[error("empty search query")]
    EmptyQuery,

    /// One fetch of the enrichment fan-out failed; `stage` names which one.
    #[error("enrichment incomplete at {stage}: {message}")]
    PartialData { stage: String, message: String },

    /// Login rejected or session not established.
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CurricleError>;

impl CurricleError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a transport error, with the HTTP status when one exists.
    pub fn transport(status: Option<u16>, msg: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: msg.into(),
        }
    }

    /// Create a decode error from any displayable message.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode {
            message: msg.into(),
        }
    }

    /// Wrap a failed fan-out stage, keeping the underlying error text.
    pub fn partial(stage: impl Into<String>, source: impl std::fmt::Display) -> Self {
        Self::PartialData {
            stage: stage.into(),
            message: source.to_string(),
        }
    }

    /// Create an auth error from any displayable message.
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The HTTP status behind this error, if any. Only transport errors
    /// carry one.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = CurricleError::config("missing institution");
        assert_eq!(err.to_string(), "config error: missing institution");

        let err = CurricleError::transport(Some(404), "http://x/api/units: HTTP 404");
        assert!(err.to_string().contains("HTTP 404"));

        let err = CurricleError::EmptyQuery;
        assert_eq!(err.to_string(), "empty search query");
    }

    #[test]
    fn partial_keeps_stage_and_source() {
        let source = CurricleError::transport(Some(503), "metadata fetch: HTTP 503");
        let err = CurricleError::partial("metadata", &source);
        let text = err.to_string();
        assert!(text.contains("metadata"));
        assert!(text.contains("HTTP 503"));
    }

    #[test]
    fn http_status_only_on_transport() {
        assert_eq!(
            CurricleError::transport(Some(401), "login").http_status(),
            Some(401)
        );
        assert_eq!(CurricleError::transport(None, "refused").http_status(), None);
        assert_eq!(CurricleError::EmptyQuery.http_status(), None);
    }
}
