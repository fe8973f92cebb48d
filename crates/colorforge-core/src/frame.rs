//! Pixel buffer types for decoded images.
//!
//! A `PixelBuffer` is the unit the render pipeline hands around between
//! stages: it is filled once by the producer and treated as immutable after
//! that. Sharing goes through `SharedPixelBuffer`.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;

/// Row alignment in bytes, matching what GPU upload paths expect.
const ROW_ALIGNMENT: usize = 64;

/// Pixel format enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 8-bit BGRA (32 bits per pixel), the native display format
    #[default]
    Bgra8,
    /// 8-bit RGBA (32 bits per pixel)
    Rgba8,
    /// 16-bit RGBA half-float (64 bits per pixel), working space for grading
    Rgba16F,
    /// 32-bit RGBA float (128 bits per pixel)
    Rgba32F,
    /// 8-bit single channel, used for masks
    Gray8,
    /// 16-bit single channel half-float
    Gray16F,
    /// Bi-planar 4:2:0 YCbCr (luma plane + interleaved chroma plane)
    YCbCr420BiPlanar,
}

impl PixelFormat {
    /// Bytes per pixel for packed formats, or 0 for planar.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Bgra8 | Self::Rgba8 => 4,
            Self::Rgba16F => 8,
            Self::Rgba32F => 16,
            Self::Gray8 => 1,
            Self::Gray16F => 2,
            Self::YCbCr420BiPlanar => 0,
        }
    }
}

/// A plane of pixel data with stride information.
#[derive(Debug, Clone)]
pub struct PixelPlane {
    data: Vec<u8>,
    stride: usize,
    width: u32,
    height: u32,
}

impl PixelPlane {
    /// Create a zeroed plane with a 64-byte aligned stride.
    pub fn new(width: u32, height: u32, bytes_per_pixel: usize) -> Self {
        let min_stride = width as usize * bytes_per_pixel;
        let stride = (min_stride + ROW_ALIGNMENT - 1) & !(ROW_ALIGNMENT - 1);
        Self {
            data: vec![0u8; stride * height as usize],
            stride,
            width,
            height,
        }
    }

    /// Bytes per row (may include padding).
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get a row of pixel data, without padding.
    #[inline]
    pub fn row(&self, y: u32, bytes_per_pixel: usize) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.width as usize * bytes_per_pixel]
    }

    #[inline]
    fn row_mut(&mut self, y: u32, bytes_per_pixel: usize) -> &mut [u8] {
        let start = y as usize * self.stride;
        &mut self.data[start..start + self.width as usize * bytes_per_pixel]
    }
}

/// A decoded image in memory.
///
/// Contents are only writable through [`PixelBufferBuilder`]; once built the
/// buffer is immutable, so sharing it behind an `Arc` is safe.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    format: PixelFormat,
    width: u32,
    height: u32,
    planes: SmallVec<[PixelPlane; 2]>,
}

impl PixelBuffer {
    /// Create a zeroed pixel buffer.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        PixelBufferBuilder::new(width, height, format).build()
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// All planes (1 for packed formats, 2 for bi-planar).
    pub fn planes(&self) -> &[PixelPlane] {
        &self.planes
    }

    /// Get the primary plane (plane 0).
    #[inline]
    pub fn primary_plane(&self) -> &PixelPlane {
        &self.planes[0]
    }

    /// Size of the backing store in bytes, padding included.
    ///
    /// This is the figure caches charge for holding the buffer.
    pub fn memory_size(&self) -> usize {
        self.planes.iter().map(|p| p.data.len()).sum()
    }

    /// Create a horizontal grey ramp, handy for previews and tests.
    pub fn test_pattern(width: u32, height: u32) -> Self {
        let mut builder = PixelBufferBuilder::new(width, height, PixelFormat::Bgra8);
        for y in 0..height {
            let row = builder.row_mut(0, y);
            for x in 0..width {
                let level = if width > 1 {
                    (x * 255 / (width - 1)) as u8
                } else {
                    0
                };
                let i = x as usize * 4;
                row[i..i + 4].copy_from_slice(&[level, level, level, 255]);
            }
        }
        builder.build()
    }
}

/// Write access to a pixel buffer before it is frozen.
pub struct PixelBufferBuilder {
    buffer: PixelBuffer,
}

impl PixelBufferBuilder {
    /// Allocate planes for the given dimensions and format.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let planes = match format {
            PixelFormat::YCbCr420BiPlanar => smallvec::smallvec![
                PixelPlane::new(width, height, 1),                     // Y
                PixelPlane::new(width.div_ceil(2), height.div_ceil(2), 2), // CbCr
            ],
            packed => smallvec::smallvec![PixelPlane::new(width, height, packed.bytes_per_pixel())],
        };

        Self {
            buffer: PixelBuffer {
                format,
                width,
                height,
                planes,
            },
        }
    }

    /// Mutable access to a row of the given plane.
    pub fn row_mut(&mut self, plane: usize, y: u32) -> &mut [u8] {
        let bpp = match self.buffer.format {
            PixelFormat::YCbCr420BiPlanar => plane + 1,
            packed => packed.bytes_per_pixel(),
        };
        self.buffer.planes[plane].row_mut(y, bpp)
    }

    /// Freeze the buffer.
    pub fn build(self) -> PixelBuffer {
        self.buffer
    }
}

/// Arc-wrapped pixel buffer for shared ownership.
pub type SharedPixelBuffer = Arc<PixelBuffer>;
