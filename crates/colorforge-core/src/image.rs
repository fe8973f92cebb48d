//! Image handle consumed by the renderer.

use crate::frame::{PixelFormat, SharedPixelBuffer};

/// Pixel extent of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

/// Lightweight image view over a pixel buffer.
///
/// Building one never copies pixels; it holds another reference to the same
/// buffer the cache returned.
#[derive(Debug, Clone)]
pub struct RenderImage {
    buffer: SharedPixelBuffer,
}

impl RenderImage {
    pub fn from_buffer(buffer: SharedPixelBuffer) -> Self {
        Self { buffer }
    }

    pub fn extent(&self) -> Extent {
        Extent {
            width: self.buffer.width(),
            height: self.buffer.height(),
        }
    }

    pub fn format(&self) -> PixelFormat {
        self.buffer.format()
    }

    /// The underlying pixel buffer.
    pub fn buffer(&self) -> &SharedPixelBuffer {
        &self.buffer
    }
}

impl From<SharedPixelBuffer> for RenderImage {
    fn from(buffer: SharedPixelBuffer) -> Self {
        Self::from_buffer(buffer)
    }
}
