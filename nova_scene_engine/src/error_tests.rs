//! Unit tests for error.rs

use super::*;

// ============================================================================
// DISPLAY TESTS
// ============================================================================

#[test]
fn test_initialization_failed_display() {
    let err = Error::InitializationFailed("worker pool".to_string());
    assert_eq!(format!("{}", err), "Initialization failed: worker pool");
}

#[test]
fn test_frame_failed_display() {
    let err = Error::FrameFailed("task 'BVH': index out of bounds".to_string());
    assert_eq!(
        format!("{}", err),
        "Frame failed: task 'BVH': index out of bounds"
    );
}

// ============================================================================
// TRAIT TESTS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err: Box<dyn std::error::Error> =
        Box::new(Error::InitializationFailed("x".to_string()));
    assert!(err.source().is_none());
}

#[test]
fn test_error_clone() {
    let err = Error::FrameFailed("boom".to_string());
    let cloned = err.clone();
    assert_eq!(format!("{}", err), format!("{}", cloned));
}

#[test]
fn test_result_alias() {
    fn produces() -> Result<u32> {
        Ok(7)
    }
    assert_eq!(produces().unwrap(), 7);
}
