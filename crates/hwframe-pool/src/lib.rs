//! hwframe Pool - pooled hardware surface allocator
//!
//! Bridges two ownership models: pipeline stages pass samples around and
//! release them whenever they are done, while the decoding backend
//! recycles physical surfaces through its frames context. A
//! [`PooledBuffer`] owns exactly one surface and gives it back on drop;
//! the [`HwFramePool`] decides when new buffers may be drawn.

pub mod allocator;
pub mod sample;

pub use allocator::{AcquireMode, HwFramePool, PoolId, PoolStats};
pub use sample::{BufferKind, PipelineSample, PooledBuffer, PRIMARY_VIEW};
