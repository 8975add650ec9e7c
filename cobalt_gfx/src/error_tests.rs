//! Unit tests for error.rs

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("glCreateBuffer returned 0".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("glCreateBuffer returned 0"));
}

#[test]
fn test_out_of_memory_display() {
    assert_eq!(format!("{}", Error::OutOfMemory), "Out of GPU memory");
}

#[test]
fn test_invalid_resource_display() {
    let err = Error::InvalidResource("input assembler has no vertex buffer".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid resource"));
    assert!(display.contains("no vertex buffer"));
}

#[test]
fn test_invalid_operation_display() {
    let err = Error::InvalidOperation("draw outside render pass".to_string());
    assert_eq!(format!("{}", err), "Invalid operation: draw outside render pass");
}

#[test]
fn test_unsupported_display() {
    let err = Error::Unsupported("depth bounds".to_string());
    assert_eq!(format!("{}", err), "Unsupported: depth bounds");
}

// ============================================================================
// TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::OutOfMemory;
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_clone_and_eq() {
    let err = Error::InitializationFailed("no context".to_string());
    assert_eq!(err.clone(), err);
    assert_ne!(err, Error::OutOfMemory);
}

// ============================================================================
// MACROS
// ============================================================================

#[test]
fn test_gfx_err_builds_backend_error() {
    let err = crate::gfx_err!("cobalt::test", "code {}", 42);
    assert_eq!(err, Error::BackendError("code 42".to_string()));
}

#[test]
fn test_gfx_bail_returns_early() {
    fn fails(flag: bool) -> Result<u32> {
        if flag {
            crate::gfx_bail!("cobalt::test", "bailing out");
        }
        Ok(7)
    }

    assert_eq!(fails(false), Ok(7));
    assert!(matches!(fails(true), Err(Error::BackendError(msg)) if msg == "bailing out"));
}
