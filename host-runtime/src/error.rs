//! Error types for the script host boundary

use thiserror::Error;

use crate::{bridge::RegistrationError, validate::ImageError};

/// Result type for host boundary operations
pub type Result<T> = std::result::Result<T, HostError>;

/// Exit codes reported by [`ScriptHost::run`](crate::ScriptHost::run)
///
/// Negative codes identify host-side rejections; any other non-zero code is
/// the script's own termination status, passed through verbatim.
pub mod exit_code {
    /// Script ran to normal completion
    pub const OK: i32 = 0;
    /// No program image was supplied
    pub const NULL_IMAGE: i32 = -1;
    /// Image shorter than the configured minimum
    pub const TOO_SMALL: i32 = -2;
    /// Image longer than the configured maximum
    pub const TOO_LARGE: i32 = -3;
    /// Image header does not carry the expected magic tag
    pub const BAD_HEADER: i32 = -4;
    /// Interpreter failed to create an execution task
    pub const TASK_CREATE_FAILED: i32 = -5;
}

/// Errors that can occur in the host boundary layer
#[derive(Debug, Error)]
pub enum HostError {
    /// Program image rejected before reaching the interpreter
    #[error(transparent)]
    InvalidImage(#[from] ImageError),

    /// Capability registration rejected
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// Interpreter could not create an execution task
    #[error("task creation failed (memory pool of {pool_size} bytes)")]
    TaskCreation {
        /// Configured arena capacity, for diagnostics
        pool_size: usize,
    },
}
