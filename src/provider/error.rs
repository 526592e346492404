//! Error type for catalog provider operations.

use thiserror::Error;

/// Errors raised by a [`CatalogProvider`](super::CatalogProvider).
///
/// Each variant carries the action that was being performed so the message
/// reads as a complete sentence naming the failing step.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The service responded with a non-success HTTP status.
    #[error("could not {action} - service responded with status code {status}")]
    Status {
        /// The action being performed, e.g. `get podcasts for COMP101`.
        action: String,
        /// The HTTP status code returned.
        status: u16,
    },

    /// Transport-level failure (DNS, connect, TLS, mid-body read).
    #[error("could not {action} - {source}")]
    Network {
        /// The action being performed.
        action: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The response did not have the expected structure.
    #[error("could not {action} - {detail}")]
    Malformed {
        /// The action being performed.
        action: String,
        /// What was missing or unexpected.
        detail: String,
    },
}

impl ProviderError {
    /// Creates a status error.
    pub fn status(action: impl Into<String>, status: u16) -> Self {
        Self::Status {
            action: action.into(),
            status,
        }
    }

    /// Creates a network error from a reqwest error.
    pub fn network(action: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            action: action.into(),
            source,
        }
    }

    /// Creates a malformed-response error.
    pub fn malformed(action: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Malformed {
            action: action.into(),
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_names_action_and_code() {
        let err = ProviderError::status("get podcasts for COMP101", 503);
        let msg = err.to_string();
        assert!(msg.contains("get podcasts for COMP101"), "got: {msg}");
        assert!(msg.contains("503"), "got: {msg}");
    }

    #[test]
    fn test_malformed_display_names_detail() {
        let err = ProviderError::malformed("open download for Week 1", "no download link found");
        let msg = err.to_string();
        assert!(msg.contains("Week 1"), "got: {msg}");
        assert!(msg.contains("no download link"), "got: {msg}");
    }
}
