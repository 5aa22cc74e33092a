//! The decoding backend's frames context, seen from the allocator.
//!
//! A frames context owns a fixed set of physical surfaces. The allocator
//! never creates or destroys surfaces: it draws free ones and hands them
//! back. Context lifetime is plain `Arc` reference counting.

use hwframe_core::{SurfaceDesc, TextureId};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// One physical surface: a slice of a texture array.
///
/// Backends build slots when handing surfaces out. Outside a backend the
/// only way to hold one is through [`SurfaceHandle::draw`], so every live
/// handle wraps a surface its context actually gave out.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct SurfaceSlot {
    pub texture: TextureId,
    pub array_slice: u32,
}

impl SurfaceSlot {
    pub fn new(texture: TextureId, array_slice: u32) -> Self {
        Self {
            texture,
            array_slice,
        }
    }

    /// Copyable identity of the slot, for bookkeeping and comparisons.
    pub fn key(&self) -> (TextureId, u32) {
        (self.texture, self.array_slice)
    }
}

/// Backend-owned pool of decode surfaces.
pub trait HwFramesContext: Send + Sync {
    /// Shape shared by every surface of this context.
    fn desc(&self) -> SurfaceDesc;

    /// Take a free surface without blocking.
    fn try_get_surface(&self) -> Option<SurfaceSlot>;

    /// Return a surface to the free set.
    fn release_surface(&self, slot: SurfaceSlot);

    /// Number of free surfaces, when the backend can tell.
    fn free_count(&self) -> Option<usize> {
        None
    }

    /// Block for at most `timeout` or until a surface may have been freed.
    ///
    /// Backends without a release signal keep the default, which just
    /// sleeps; callers must re-check availability either way.
    fn wait_for_free_surface(&self, timeout: Duration) {
        std::thread::sleep(timeout);
    }
}

/// Reference-counted handle to a frames context.
pub type SharedFramesContext = Arc<dyn HwFramesContext>;

/// Exclusive ownership of one surface plus a reference to the context it
/// came from. Dropping the handle releases the surface.
pub struct SurfaceHandle {
    context: SharedFramesContext,
    slot: Option<SurfaceSlot>,
}

impl SurfaceHandle {
    /// Draw a free surface from `context`, if one is available.
    pub fn draw(context: &SharedFramesContext) -> Option<Self> {
        context.try_get_surface().map(|slot| Self {
            context: Arc::clone(context),
            slot: Some(slot),
        })
    }

    fn slot(&self) -> &SurfaceSlot {
        // Only `Drop` takes the slot.
        self.slot
            .as_ref()
            .unwrap_or_else(|| unreachable!("surface handle used after release"))
    }

    pub fn texture(&self) -> TextureId {
        self.slot().texture
    }

    pub fn array_slice(&self) -> u32 {
        self.slot().array_slice
    }

    pub fn key(&self) -> (TextureId, u32) {
        self.slot().key()
    }

    pub fn desc(&self) -> SurfaceDesc {
        self.context.desc()
    }
}

impl fmt::Debug for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceHandle")
            .field("slot", &self.slot)
            .field("desc", &self.context.desc())
            .finish()
    }
}

impl Drop for SurfaceHandle {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            self.context.release_surface(slot);
        }
    }
}
