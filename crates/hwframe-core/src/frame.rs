//! Surface formats and frame descriptors.
//!
//! Hardware surfaces are described by a [`SurfaceDesc`]; the generic
//! (system memory) path carries a [`SystemFrame`] instead.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;

/// Opaque identifier of a GPU texture (or texture array) owned by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureId(pub u64);

/// Pixel layout of a decode target surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SurfaceFormat {
    /// 8-bit 4:2:0, Y plane + interleaved UV
    #[default]
    Nv12,
    /// 10-bit 4:2:0 in 16-bit containers
    P010,
    /// 16-bit 4:2:0
    P016,
    /// 8-bit packed 4:2:2
    Yuy2,
    /// 8-bit packed 4:4:4 with alpha
    Ayuv,
    /// 8-bit BGRA
    Bgra8,
}

impl SurfaceFormat {
    /// Number of planes for this format.
    pub fn plane_count(self) -> usize {
        match self {
            Self::Nv12 | Self::P010 | Self::P016 => 2,
            Self::Yuy2 | Self::Ayuv | Self::Bgra8 => 1,
        }
    }

    /// Bytes per luma sample.
    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::Nv12 => 1,
            Self::P010 | Self::P016 => 2,
            Self::Yuy2 => 2,
            Self::Ayuv | Self::Bgra8 => 4,
        }
    }

    /// Total bytes of one surface of this format.
    pub fn frame_size(self, width: u32, height: u32) -> usize {
        let luma = width as usize * height as usize * self.bytes_per_sample();
        match self {
            // Chroma plane is half height at full row width
            Self::Nv12 | Self::P010 | Self::P016 => luma + luma / 2,
            Self::Yuy2 | Self::Ayuv | Self::Bgra8 => luma,
        }
    }
}

/// Metadata of a hardware frames context: every surface it hands out
/// shares this shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceDesc {
    pub format: SurfaceFormat,
    pub width: u32,
    pub height: u32,
    /// Number of slices in the backing texture array.
    pub array_size: u32,
}

impl SurfaceDesc {
    pub fn new(format: SurfaceFormat, width: u32, height: u32, array_size: u32) -> Self {
        Self {
            format,
            width,
            height,
            array_size,
        }
    }

    /// Bytes of a single slice.
    pub fn slice_size(&self) -> usize {
        self.format.frame_size(self.width, self.height)
    }

    /// Bytes of the whole texture array.
    pub fn memory_size(&self) -> usize {
        self.slice_size() * self.array_size as usize
    }
}

/// A plane of pixel data in system memory.
#[derive(Debug, Clone)]
pub struct FramePlane {
    pub data: Vec<u8>,
    /// Bytes per row (includes padding)
    pub stride: usize,
    pub height: u32,
}

impl FramePlane {
    /// Allocate a zeroed plane with a 64-byte aligned stride.
    pub fn new(row_bytes: usize, height: u32) -> Self {
        let stride = (row_bytes + 63) & !63;
        Self {
            data: vec![0u8; stride * height as usize],
            stride,
            height,
        }
    }

    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.stride]
    }
}

/// A decoded frame in system memory, produced by the generic buffer path.
#[derive(Debug, Clone)]
pub struct SystemFrame {
    pub format: SurfaceFormat,
    pub width: u32,
    pub height: u32,
    pub planes: SmallVec<[FramePlane; 2]>,
}

impl SystemFrame {
    pub fn new(format: SurfaceFormat, width: u32, height: u32) -> Self {
        let row = width as usize * format.bytes_per_sample();
        let planes = match format {
            SurfaceFormat::Nv12 | SurfaceFormat::P010 | SurfaceFormat::P016 => {
                smallvec::smallvec![
                    FramePlane::new(row, height),     // Y
                    FramePlane::new(row, height / 2), // UV interleaved
                ]
            }
            SurfaceFormat::Yuy2 | SurfaceFormat::Ayuv | SurfaceFormat::Bgra8 => {
                smallvec::smallvec![FramePlane::new(row, height)]
            }
        };
        Self {
            format,
            width,
            height,
            planes,
        }
    }

    /// Total memory usage of this frame in bytes.
    pub fn memory_size(&self) -> usize {
        self.planes.iter().map(|p| p.data.len()).sum()
    }
}

/// Arc-wrapped system frame for shared ownership.
pub type SharedSystemFrame = Arc<SystemFrame>;
