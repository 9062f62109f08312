//! Error types for triage-rs.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed notification or tracker payload.
    #[error("malformed payload: {0}")]
    Parse(String),

    #[error("issue not found: {0}")]
    NotFound(String),

    #[error("tracker rejected credentials: {0}")]
    Unauthorized(String),

    #[error("tracker transport error: {0}")]
    Transport(String),

    #[error("tracker call timed out after {0:?}")]
    Timeout(Duration),

    #[error("report error: {0}")]
    Report(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether redelivering the notification could succeed where this failed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Cut `s` to at most `max` characters for inclusion in an error or log line.
pub(crate) fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("zażółć", 3), "zaż");
        assert_eq!(truncate("short", 100), "short");
    }
}
