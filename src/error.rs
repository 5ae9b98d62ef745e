//! Error types for the transfer pipeline.
//!
//! Remote client implementations report failures as [`RemoteError`]. Everything
//! above the client boundary speaks [`TransferError`].

use crate::config::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Coarse classification attached to a remote failure by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteErrorKind {
    /// Rate limiting, network trouble, server errors. Worth retrying.
    Transient,
    /// Malformed range, missing table, permission denied. Retrying cannot help.
    Permanent,
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => write!(f, "transient"),
            Self::Permanent => write!(f, "permanent"),
        }
    }
}

/// Failure reported by a [`RemoteTableClient`](crate::client::RemoteTableClient) call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} remote error: {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: RemoteErrorKind::Transient,
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: RemoteErrorKind::Permanent,
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind == RemoteErrorKind::Transient
    }
}

#[derive(Debug, Error)]
pub enum TransferError {
    /// Every attempt allowed by the retry policy failed.
    #[error("{operation} failed after {attempts} attempt(s): {source}")]
    RetryExhausted {
        operation: String,
        attempts: u32,
        #[source]
        source: RemoteError,
    },

    /// The retry predicate rejected the error, so no further attempts were made.
    #[error("{operation} failed permanently on attempt {attempt}: {source}")]
    PermanentRemoteFailure {
        operation: String,
        attempt: u32,
        #[source]
        source: RemoteError,
    },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Invalid range '{range}': {reason}")]
    InvalidRange { range: String, reason: String },

    #[error("Invalid job configuration row {row}: {reason}")]
    InvalidJobRow { row: usize, reason: String },

    #[error("Invalid pipeline state transition from {from} to {to}")]
    StateTransition { from: String, to: String },

    #[error("Job task failed to complete: {0}")]
    TaskJoin(String),
}

impl TransferError {
    pub fn invalid_range(range: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRange {
            range: range.into(),
            reason: reason.into(),
        }
    }

    /// True when the failure came out of the retry executor, either by
    /// running out of attempts or by hitting a non-retryable error.
    pub fn is_remote_failure(&self) -> bool {
        matches!(
            self,
            Self::RetryExhausted { .. } | Self::PermanentRemoteFailure { .. }
        )
    }

    pub fn is_retry_exhausted(&self) -> bool {
        matches!(self, Self::RetryExhausted { .. })
    }

    /// The underlying remote cause, if this error wraps one.
    pub fn remote_cause(&self) -> Option<&RemoteError> {
        match self {
            Self::RetryExhausted { source, .. } | Self::PermanentRemoteFailure { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}

pub type TransferResult<T> = std::result::Result<T, TransferError>;
