//! Errors surfaced by core operations.

use thiserror::Error;

use crate::types::{RuleId, ValidationError};

/// Errors returned synchronously by core operations.
///
/// Collaborator failures (audio, notification, persistence) never appear here;
/// they are logged and swallowed where they happen.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The request was rejected before any state changed.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ValidationError),

    /// An update, toggle, snooze, or removal named a rule that does not exist.
    #[error("no alarm rule with id {0}")]
    UnknownRule(RuleId),
}
