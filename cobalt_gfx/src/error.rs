//! Error types for the Cobalt graphics HAL
//!
//! Most recoverable conditions in the HAL are reported through the logger and
//! surface as `bool` (object initialization) or `Result` (device factories,
//! command recording). This enum is what those `Result`s carry.

use std::fmt;

/// Result type for HAL operations
pub type Result<T> = std::result::Result<T, Error>;

/// HAL errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Backend-specific error (GL, headless driver, ...)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource description or resource in the wrong state
    InvalidResource(String),

    /// Device or backend initialization failed
    InitializationFailed(String),

    /// Command recorded in a state where it is not legal
    InvalidOperation(String),

    /// Feature not supported by the active backend
    Unsupported(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::InvalidOperation(msg) => write!(f, "Invalid operation: {}", msg),
            Error::Unsupported(msg) => write!(f, "Unsupported: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Log an error and build an `Error::BackendError` from the same message
///
/// # Example
///
/// ```ignore
/// let err = gfx_err!("cobalt::gles::Backend", "glCreateBuffer failed: {}", reason);
/// ```
#[macro_export]
macro_rules! gfx_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::log::log_detailed(
            $crate::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!(),
        );
        $crate::cobalt::Error::BackendError(message)
    }};
}

/// Log an error and return `Err(Error::BackendError)` from the current function
#[macro_export]
macro_rules! gfx_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::gfx_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
