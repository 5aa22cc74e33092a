//! hwframe Context - the hardware backend boundary
//!
//! Defines what the allocator needs from a decoding backend's frames
//! context, and ships a texture-array implementation for builds and tests
//! without a GPU decoder.

pub mod context;
pub mod texture_array;

pub use context::{HwFramesContext, SharedFramesContext, SurfaceHandle, SurfaceSlot};
pub use texture_array::TextureArrayContext;
