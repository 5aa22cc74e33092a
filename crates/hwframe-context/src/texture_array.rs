//! Texture-array frames context.
//!
//! Models a decoder's surface pool as the slices of one texture array,
//! the layout D3D11 decoders allocate. Free slices live on a free list;
//! releasing a slice wakes any thread blocked in
//! [`HwFramesContext::wait_for_free_surface`] unless the context was built
//! without a release signal.

use crate::context::{HwFramesContext, SharedFramesContext, SurfaceSlot};
use hwframe_core::{SurfaceDesc, TextureId};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

struct SliceState {
    /// Free slice indices, reused LIFO.
    free: Vec<u32>,
    /// Which slices are currently handed out.
    in_use: Vec<bool>,
}

/// Frames context backed by the slices of a single texture array.
pub struct TextureArrayContext {
    texture: TextureId,
    desc: SurfaceDesc,
    state: Mutex<SliceState>,
    freed: Condvar,
    signal_release: bool,
}

impl TextureArrayContext {
    /// Create a context with `desc.array_size` free slices and a release
    /// signal.
    pub fn new(desc: SurfaceDesc) -> Self {
        let count = desc.array_size;
        debug!(
            format = ?desc.format,
            width = desc.width,
            height = desc.height,
            slices = count,
            bytes = desc.memory_size(),
            "Creating texture array context"
        );
        Self {
            texture: TextureId(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed)),
            desc,
            state: Mutex::new(SliceState {
                // Reversed so slice 0 is handed out first
                free: (0..count).rev().collect(),
                in_use: vec![false; count as usize],
            }),
            freed: Condvar::new(),
            signal_release: true,
        }
    }

    /// Same as [`new`](Self::new) but without a release signal, so waiters
    /// fall back to sleeping.
    pub fn without_release_signal(desc: SurfaceDesc) -> Self {
        Self {
            signal_release: false,
            ..Self::new(desc)
        }
    }

    pub fn into_shared(self) -> SharedFramesContext {
        Arc::new(self)
    }

    pub fn texture(&self) -> TextureId {
        self.texture
    }

    /// Number of slices currently handed out.
    pub fn in_flight(&self) -> usize {
        self.state.lock().in_use.iter().filter(|used| **used).count()
    }
}

impl HwFramesContext for TextureArrayContext {
    fn desc(&self) -> SurfaceDesc {
        self.desc
    }

    fn try_get_surface(&self) -> Option<SurfaceSlot> {
        let mut state = self.state.lock();
        let slice = state.free.pop()?;
        state.in_use[slice as usize] = true;
        Some(SurfaceSlot::new(self.texture, slice))
    }

    fn release_surface(&self, slot: SurfaceSlot) {
        if slot.texture != self.texture {
            warn!(?slot, "Surface released to a context that does not own it");
            return;
        }

        let mut state = self.state.lock();
        match state.in_use.get_mut(slot.array_slice as usize) {
            Some(used) if *used => {
                *used = false;
                state.free.push(slot.array_slice);
            }
            _ => {
                warn!(slice = slot.array_slice, "Surface released twice or out of range");
                return;
            }
        }
        drop(state);

        if self.signal_release {
            self.freed.notify_one();
        }
    }

    fn free_count(&self) -> Option<usize> {
        Some(self.state.lock().free.len())
    }

    fn wait_for_free_surface(&self, timeout: Duration) {
        if !self.signal_release {
            std::thread::sleep(timeout);
            return;
        }

        let mut state = self.state.lock();
        if state.free.is_empty() {
            let _ = self.freed.wait_for(&mut state, timeout);
        }
    }
}
