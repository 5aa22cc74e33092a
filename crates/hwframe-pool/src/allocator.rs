//! Hardware frame pool.
//!
//! Hands out [`PooledBuffer`]s backed by surfaces drawn from a shared
//! frames context. The context decides how many surfaces exist and which
//! are free; the pool only gates acquisition on its committed state and
//! keeps diagnostic counts.
//!
//! Buffers carry their own reference to the frames context, so they stay
//! valid (and still return their surface) after every pool handle is gone.

use crate::sample::PooledBuffer;
use hwframe_context::{SharedFramesContext, SurfaceHandle};
use hwframe_core::{HwFrameError, PoolConfig, Result};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

/// Unique identity of a pool instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolId(pub Uuid);

impl PoolId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What [`HwFramePool::acquire_buffer`] does when no surface is free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcquireMode {
    /// Wait until the frames context frees a surface.
    #[default]
    Blocking,
    /// Fail with [`HwFrameError::Timeout`] right away.
    NoWait,
}

/// Point-in-time view of pool state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub committed: bool,
    /// Live buffers drawn through this pool.
    pub outstanding: usize,
    pub acquired_total: u64,
    pub released_total: u64,
    /// Non-blocking acquisitions that found no free surface.
    pub timeouts: u64,
    /// Free surfaces in the bound context, when it reports them.
    pub free_surfaces: Option<usize>,
}

struct PoolState {
    committed: bool,
    frames_context: Option<SharedFramesContext>,
    outstanding: usize,
}

#[derive(Default)]
struct PoolCounters {
    acquired_total: AtomicU64,
    released_total: AtomicU64,
    timeouts: AtomicU64,
}

/// State shared between pool handles and the weak back-references held
/// by buffers.
pub(crate) struct PoolShared {
    id: PoolId,
    label: String,
    poll_interval: Duration,
    state: Mutex<PoolState>,
    counters: PoolCounters,
}

impl PoolShared {
    pub(crate) fn id(&self) -> PoolId {
        self.id
    }

    /// Called exactly once per buffer, from its destructor.
    pub(crate) fn on_buffer_released(&self, array_slice: u32) {
        let mut state = self.state.lock();
        debug_assert!(state.outstanding > 0, "outstanding count underflow");
        state.outstanding = state.outstanding.saturating_sub(1);
        let outstanding = state.outstanding;
        drop(state);

        self.counters.released_total.fetch_add(1, Ordering::Relaxed);
        debug!(pool = %self.label, slice = array_slice, outstanding, "Buffer released");
    }
}

/// Pooled allocator of hardware decode surfaces.
///
/// Cloning yields another handle to the same pool.
#[derive(Clone)]
pub struct HwFramePool {
    shared: Arc<PoolShared>,
}

impl Default for HwFramePool {
    fn default() -> Self {
        Self::new()
    }
}

impl HwFramePool {
    /// Create an uncommitted pool with default settings.
    pub fn new() -> Self {
        Self::build(PoolConfig::default())
    }

    /// Create an uncommitted pool from a validated configuration.
    pub fn with_config(config: PoolConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: PoolConfig) -> Self {
        let poll_interval = config.poll_interval();
        Self {
            shared: Arc::new(PoolShared {
                id: PoolId::new(),
                label: config.label,
                poll_interval,
                state: Mutex::new(PoolState {
                    committed: false,
                    frames_context: None,
                    outstanding: 0,
                }),
                counters: PoolCounters::default(),
            }),
        }
    }

    pub fn id(&self) -> PoolId {
        self.shared.id
    }

    pub fn label(&self) -> &str {
        &self.shared.label
    }

    /// Bind (or with `None`, unbind) the frames context surfaces are drawn
    /// from. Any previous context reference is released.
    pub fn set_frames_context(&self, context: Option<SharedFramesContext>) -> Result<()> {
        let mut state = self.shared.state.lock();
        if state.committed {
            return Err(HwFrameError::AlreadyCommitted);
        }

        let desc = context.as_ref().map(|ctx| ctx.desc());
        // Old reference drops after the lock is released
        let previous = std::mem::replace(&mut state.frames_context, context);
        drop(state);
        drop(previous);

        match desc {
            Some(desc) => info!(
                pool = %self.shared.label,
                format = ?desc.format,
                width = desc.width,
                height = desc.height,
                slices = desc.array_size,
                "Frames context set"
            ),
            None => info!(pool = %self.shared.label, "Frames context cleared"),
        }
        Ok(())
    }

    /// Allow acquisitions. Requires a frames context.
    pub fn commit(&self) -> Result<()> {
        let mut state = self.shared.state.lock();
        if state.committed {
            return Ok(());
        }
        if state.frames_context.is_none() {
            return Err(HwFrameError::NotConfigured);
        }
        state.committed = true;
        info!(pool = %self.shared.label, outstanding = state.outstanding, "Pool committed");
        Ok(())
    }

    /// Stop new acquisitions. Outstanding buffers keep their surfaces and
    /// the frames context stays bound.
    pub fn decommit(&self) {
        let mut state = self.shared.state.lock();
        if state.committed {
            state.committed = false;
            info!(pool = %self.shared.label, outstanding = state.outstanding, "Pool decommitted");
        }
    }

    pub fn is_committed(&self) -> bool {
        self.shared.state.lock().committed
    }

    /// Number of live buffers drawn through this pool.
    pub fn outstanding(&self) -> usize {
        self.shared.state.lock().outstanding
    }

    /// Draw a free surface and wrap it in a buffer.
    ///
    /// With [`AcquireMode::Blocking`] this retries until a surface frees up,
    /// waiting one poll interval between attempts with the pool lock
    /// released. A decommit during the wait ends it with
    /// [`HwFrameError::NotCommitted`].
    pub fn acquire_buffer(&self, mode: AcquireMode) -> Result<PooledBuffer> {
        loop {
            let context = {
                let mut state = self.shared.state.lock();
                if !state.committed {
                    return Err(HwFrameError::NotCommitted);
                }
                let Some(context) = state.frames_context.as_ref() else {
                    return Err(HwFrameError::NotConfigured);
                };

                if let Some(surface) = SurfaceHandle::draw(context) {
                    // On failure the surface handle is dropped, which
                    // returns the surface to the context.
                    let buffer = PooledBuffer::new(surface, &self.shared).map_err(|e| {
                        warn!(pool = %self.shared.label, error = %e, "Failed to wrap drawn surface");
                        e
                    })?;
                    state.outstanding += 1;
                    let outstanding = state.outstanding;
                    drop(state);

                    self.shared
                        .counters
                        .acquired_total
                        .fetch_add(1, Ordering::Relaxed);
                    debug!(
                        pool = %self.shared.label,
                        slice = buffer.array_slice(),
                        outstanding,
                        "Buffer acquired"
                    );
                    return Ok(buffer);
                }

                if mode == AcquireMode::NoWait {
                    self.shared.counters.timeouts.fetch_add(1, Ordering::Relaxed);
                    return Err(HwFrameError::Timeout);
                }
                Arc::clone(context)
            };

            trace!(pool = %self.shared.label, "No free surface, waiting");
            context.wait_for_free_surface(self.shared.poll_interval);
        }
    }

    /// Wrap a surface the decoder drew itself with [`SurfaceHandle::draw`].
    /// Works whether or not the pool is committed; the pool only does the
    /// accounting.
    pub fn acquire_buffer_for_existing_frame(&self, surface: SurfaceHandle) -> Result<PooledBuffer> {
        let buffer = PooledBuffer::new(surface, &self.shared)?;

        let outstanding = {
            let mut state = self.shared.state.lock();
            state.outstanding += 1;
            state.outstanding
        };
        self.shared
            .counters
            .acquired_total
            .fetch_add(1, Ordering::Relaxed);
        debug!(
            pool = %self.shared.label,
            slice = buffer.array_slice(),
            outstanding,
            "Existing frame wrapped"
        );
        Ok(buffer)
    }

    /// Destroy `buffer`, returning its surface to the frames context.
    ///
    /// A buffer from another pool is rejected with
    /// [`HwFrameError::InvalidArgument`]; it is destroyed anyway and
    /// accounted to the pool that created it.
    pub fn release_buffer(&self, buffer: PooledBuffer) -> Result<()> {
        if buffer.pool_id() != self.shared.id {
            warn!(
                pool = %self.shared.label,
                owner = %buffer.pool_id(),
                "Buffer released to a pool that did not allocate it"
            );
            return Err(HwFrameError::InvalidArgument(format!(
                "buffer belongs to pool {}",
                buffer.pool_id()
            )));
        }
        drop(buffer);
        Ok(())
    }

    pub fn stats(&self) -> PoolStats {
        let (committed, outstanding, context) = {
            let state = self.shared.state.lock();
            (
                state.committed,
                state.outstanding,
                state.frames_context.clone(),
            )
        };
        let counters = &self.shared.counters;
        PoolStats {
            committed,
            outstanding,
            acquired_total: counters.acquired_total.load(Ordering::Relaxed),
            released_total: counters.released_total.load(Ordering::Relaxed),
            timeouts: counters.timeouts.load(Ordering::Relaxed),
            free_surfaces: context.and_then(|ctx| ctx.free_count()),
        }
    }
}

impl fmt::Debug for HwFramePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HwFramePool")
            .field("id", &self.id())
            .field("label", &self.shared.label)
            .field("stats", &self.stats())
            .finish()
    }
}
