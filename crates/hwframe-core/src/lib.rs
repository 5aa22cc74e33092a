//! hwframe Core - Foundation types for the hardware surface allocator
//!
//! This crate provides the types shared by the backend and the pool:
//! - Error taxonomy and `Result` alias
//! - Surface formats, descriptors and system-memory frames
//! - Pool configuration and surface type negotiation

pub mod config;
pub mod error;
pub mod frame;

pub use config::{PoolConfig, RendererMemoryConfig, SurfaceType, VideoMemoryConfiguration};
pub use error::{HwFrameError, Result};
pub use frame::{
    FramePlane, SharedSystemFrame, SurfaceDesc, SurfaceFormat, SystemFrame, TextureId,
};

/// Timing constants for surface acquisition.
pub mod timing {
    use std::time::Duration;

    /// Default wait between attempts to draw a free surface.
    pub const POLL_INTERVAL: Duration = Duration::from_millis(1);
}
