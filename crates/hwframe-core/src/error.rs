//! Error types for hwframe.

use crate::config::SurfaceType;
use thiserror::Error;

/// Main error type for allocator and buffer operations.
#[derive(Error, Debug)]
pub enum HwFrameError {
    #[error("Allocator has no frames context configured")]
    NotConfigured,

    #[error("Allocator is already committed")]
    AlreadyCommitted,

    #[error("Allocator is not committed")]
    NotCommitted,

    #[error("No free surface available")]
    Timeout,

    #[error("Unsupported surface view: {0} (only view 0 is implemented)")]
    UnsupportedView(u32),

    #[error("Allocation failure: {0}")]
    AllocationFailure(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Surface type {0:?} rejected by renderer")]
    SurfaceTypeRejected(SurfaceType),

    #[error("Surface type is locked while an allocator is bound")]
    SurfaceTypeLocked,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for hwframe operations.
pub type Result<T> = std::result::Result<T, HwFrameError>;
