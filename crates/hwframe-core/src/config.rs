//! Pool configuration and decoder/renderer surface negotiation.

use crate::error::{HwFrameError, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Upper bound for the acquisition wait quantum.
const MAX_POLL_INTERVAL_US: u64 = 1_000_000;

/// Runtime settings for a hardware frame pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Name used in log output.
    pub label: String,
    /// Fixed wait between surface draw attempts, in microseconds.
    pub poll_interval_us: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            label: "hwframe".to_string(),
            poll_interval_us: crate::timing::POLL_INTERVAL.as_micros() as u64,
        }
    }
}

impl PoolConfig {
    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_us == 0 || self.poll_interval_us > MAX_POLL_INTERVAL_US {
            return Err(HwFrameError::InvalidConfig(format!(
                "poll_interval_us must be in 1..={}, got {}",
                MAX_POLL_INTERVAL_US, self.poll_interval_us
            )));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_micros(self.poll_interval_us)
    }
}

/// Surface types a decoder can deliver to a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceType {
    /// Slice of a D3D11 texture array.
    D3D11Texture,
}

/// Negotiation surface a renderer exposes to the decoder upstream of it.
///
/// The surface type can only change before an allocator is bound to the
/// connection. Switching type, or switching the adapter, requires the
/// pipeline to reconnect the two stages.
pub trait VideoMemoryConfiguration: Send + Sync {
    /// Announce the surface type the decoder is going to send.
    fn set_surface_type(&self, surface_type: SurfaceType) -> Result<()>;

    /// Adapter index the renderer currently prefers for decoding.
    fn adapter_index(&self) -> u32;
}

#[derive(Debug, Default)]
struct NegotiationState {
    selected: Option<SurfaceType>,
    bound: bool,
}

/// Renderer-side [`VideoMemoryConfiguration`].
#[derive(Debug)]
pub struct RendererMemoryConfig {
    accepted: Vec<SurfaceType>,
    adapter_index: Mutex<u32>,
    state: Mutex<NegotiationState>,
}

impl Default for RendererMemoryConfig {
    fn default() -> Self {
        Self::new(vec![SurfaceType::D3D11Texture], 0)
    }
}

impl RendererMemoryConfig {
    pub fn new(accepted: Vec<SurfaceType>, adapter_index: u32) -> Self {
        Self {
            accepted,
            adapter_index: Mutex::new(adapter_index),
            state: Mutex::new(NegotiationState::default()),
        }
    }

    /// The surface type agreed on so far, if any.
    pub fn surface_type(&self) -> Option<SurfaceType> {
        self.state.lock().selected
    }

    /// Freeze the negotiated type once the allocator for this connection
    /// has been chosen.
    pub fn bind_allocator(&self) -> Option<SurfaceType> {
        let mut state = self.state.lock();
        state.bound = true;
        debug!(surface_type = ?state.selected, "Allocator bound");
        state.selected
    }

    pub fn is_bound(&self) -> bool {
        self.state.lock().bound
    }

    /// Tear down the negotiation; the next connection starts from scratch.
    pub fn reconnect(&self) {
        let mut state = self.state.lock();
        *state = NegotiationState::default();
        info!("Surface negotiation reset for reconnect");
    }

    /// Change the preferred adapter. Takes effect for the decoder on its
    /// next reconnect.
    pub fn set_adapter_index(&self, index: u32) {
        *self.adapter_index.lock() = index;
    }
}

impl VideoMemoryConfiguration for RendererMemoryConfig {
    fn set_surface_type(&self, surface_type: SurfaceType) -> Result<()> {
        let mut state = self.state.lock();
        if state.bound {
            return Err(HwFrameError::SurfaceTypeLocked);
        }
        if !self.accepted.contains(&surface_type) {
            return Err(HwFrameError::SurfaceTypeRejected(surface_type));
        }
        state.selected = Some(surface_type);
        info!(?surface_type, "Surface type accepted");
        Ok(())
    }

    fn adapter_index(&self) -> u32 {
        *self.adapter_index.lock()
    }
}
