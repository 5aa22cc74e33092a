//! Pooled buffers and the pipeline-facing sample type.

use crate::allocator::{PoolId, PoolShared};
use hwframe_context::SurfaceHandle;
use hwframe_core::{HwFrameError, Result, SharedSystemFrame, SurfaceDesc, TextureId};
use std::fmt;
use std::sync::{Arc, Weak};

/// The only surface view implemented. Stereo layouts would add more.
pub const PRIMARY_VIEW: u32 = 0;

/// What a sample carries, checked by consumers instead of probing for
/// optional capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    /// System-memory frame from the generic path.
    Generic,
    /// One slice of a GPU texture array.
    HardwareSurface {
        texture: TextureId,
        array_slice: u32,
    },
}

/// A hardware surface on loan from a [`HwFramePool`](crate::HwFramePool).
///
/// Move-only. Dropping it, directly or through
/// [`HwFramePool::release_buffer`](crate::HwFramePool::release_buffer),
/// returns the surface to its frames context and updates the pool's
/// outstanding count if the pool still exists.
pub struct PooledBuffer {
    surface: SurfaceHandle,
    owner: Weak<PoolShared>,
    pool_id: PoolId,
}

impl PooledBuffer {
    /// Wrap `surface`. On error the surface is dropped, which releases it.
    pub(crate) fn new(surface: SurfaceHandle, owner: &Arc<PoolShared>) -> Result<Self> {
        let desc = surface.desc();
        if surface.array_slice() >= desc.array_size {
            return Err(HwFrameError::AllocationFailure(format!(
                "surface slice {} outside texture array of {}",
                surface.array_slice(),
                desc.array_size
            )));
        }
        if desc.width == 0 || desc.height == 0 {
            return Err(HwFrameError::AllocationFailure(
                "surface has zero dimensions".to_string(),
            ));
        }

        Ok(Self {
            surface,
            owner: Arc::downgrade(owner),
            pool_id: owner.id(),
        })
    }

    /// Texture and array slice of `view`.
    pub fn surface(&self, view: u32) -> Result<(TextureId, u32)> {
        if view != PRIMARY_VIEW {
            return Err(HwFrameError::UnsupportedView(view));
        }
        Ok(self.surface.key())
    }

    pub fn array_slice(&self) -> u32 {
        self.surface.array_slice()
    }

    pub fn desc(&self) -> SurfaceDesc {
        self.surface.desc()
    }

    pub fn kind(&self) -> BufferKind {
        BufferKind::HardwareSurface {
            texture: self.surface.texture(),
            array_slice: self.surface.array_slice(),
        }
    }

    /// Pool that allocated this buffer.
    pub fn pool_id(&self) -> PoolId {
        self.pool_id
    }
}

impl fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("pool", &self.pool_id)
            .field("surface", &self.surface)
            .finish()
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        // The surface itself goes back through `SurfaceHandle`'s drop,
        // which holds its own context reference.
        if let Some(pool) = self.owner.upgrade() {
            pool.on_buffer_released(self.surface.array_slice());
        }
    }
}

/// A frame as exchanged between pipeline stages.
///
/// Clones share the underlying buffer; the hardware surface is released
/// when the last clone goes away.
#[derive(Debug, Clone)]
pub enum PipelineSample {
    Generic(SharedSystemFrame),
    Hardware(Arc<PooledBuffer>),
}

impl PipelineSample {
    pub fn kind(&self) -> BufferKind {
        match self {
            Self::Generic(_) => BufferKind::Generic,
            Self::Hardware(buffer) => buffer.kind(),
        }
    }

    /// Texture and array slice of `view`, for hardware samples only.
    pub fn hardware_surface(&self, view: u32) -> Result<(TextureId, u32)> {
        match self {
            Self::Generic(_) => Err(HwFrameError::InvalidArgument(
                "sample is not a hardware surface".to_string(),
            )),
            Self::Hardware(buffer) => buffer.surface(view),
        }
    }
}

impl From<PooledBuffer> for PipelineSample {
    fn from(buffer: PooledBuffer) -> Self {
        Self::Hardware(Arc::new(buffer))
    }
}

impl From<SharedSystemFrame> for PipelineSample {
    fn from(frame: SharedSystemFrame) -> Self {
        Self::Generic(frame)
    }
}
