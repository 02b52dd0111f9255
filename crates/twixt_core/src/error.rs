//! Core error types

use thiserror::Error;

/// Errors raised while building tween targets from textual input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Assignment did not have the `name=value` shape
    #[error("Invalid field assignment '{0}': expected name=value")]
    InvalidAssignment(String),

    /// Assignment had an empty field name
    #[error("Empty field name in assignment '{0}'")]
    EmptyField(String),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
