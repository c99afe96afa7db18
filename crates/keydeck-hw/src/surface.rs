//! Render surfaces that key images are painted into.

/// Width and height of a render surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    /// Creates a square size.
    pub fn square(side: u32) -> Self {
        Self {
            width: side,
            height: side,
        }
    }
}

/// A fixed-size surface that can be painted into and read back as flat bytes.
///
/// Implementations must return tightly packed rows (no padding) with
/// 3 bytes per pixel, since the key slices the buffer without a stride.
pub trait RenderSurface: Sized {
    /// Allocates a surface, or `None` when the backend cannot provide one.
    fn allocate(width: u32, height: u32) -> Option<Self>;

    /// Returns the surface dimensions.
    fn size(&self) -> Size;

    /// Consumes the surface and returns its pixel bytes, or `None` when
    /// the backing memory is unavailable.
    fn into_bytes(self) -> Option<Vec<u8>>;
}

/// Bytes per pixel of [`RgbSurface`].
pub const RGB_BYTES_PER_PIXEL: usize = 3;

/// In-memory 8-bit RGB surface, row-major with stride `width * 3`.
#[derive(Debug, Clone)]
pub struct RgbSurface {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl RgbSurface {
    /// Returns the row stride in bytes.
    pub fn stride(&self) -> usize {
        self.width as usize * RGB_BYTES_PER_PIXEL
    }

    /// Returns the raw pixel data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the raw pixel data mutably.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Fills the whole surface with one color.
    pub fn fill(&mut self, r: u8, g: u8, b: u8) {
        for pixel in self.data.chunks_exact_mut(RGB_BYTES_PER_PIXEL) {
            pixel.copy_from_slice(&[r, g, b]);
        }
    }

    /// Sets a pixel. Out of bounds coordinates are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, r: u8, g: u8, b: u8) {
        if let Some(idx) = self.index(x, y) {
            self.data[idx..idx + RGB_BYTES_PER_PIXEL].copy_from_slice(&[r, g, b]);
        }
    }

    /// Gets a pixel as `(r, g, b)`.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<(u8, u8, u8)> {
        self.index(x, y)
            .map(|idx| (self.data[idx], self.data[idx + 1], self.data[idx + 2]))
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| y as usize * self.stride() + x as usize * RGB_BYTES_PER_PIXEL)
    }
}

impl RenderSurface for RgbSurface {
    fn allocate(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let len = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(RGB_BYTES_PER_PIXEL)?;
        Some(Self {
            data: vec![0; len],
            width,
            height,
        })
    }

    fn size(&self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }

    fn into_bytes(self) -> Option<Vec<u8>> {
        Some(self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate() {
        let surface = RgbSurface::allocate(72, 72).unwrap();
        assert_eq!(surface.size(), Size::square(72));
        assert_eq!(surface.stride(), 72 * 3);
        assert_eq!(surface.data().len(), 72 * 72 * 3);

        assert!(RgbSurface::allocate(0, 72).is_none());
        assert!(RgbSurface::allocate(72, 0).is_none());
    }

    #[test]
    fn test_pixel_ops() {
        let mut surface = RgbSurface::allocate(4, 2).unwrap();
        surface.fill(1, 2, 3);
        assert_eq!(surface.get_pixel(3, 1), Some((1, 2, 3)));

        surface.set_pixel(1, 1, 255, 0, 128);
        assert_eq!(surface.get_pixel(1, 1), Some((255, 0, 128)));
        assert_eq!(&surface.data()[15..18], &[255, 0, 128]);

        surface.set_pixel(4, 0, 9, 9, 9);
        assert_eq!(surface.get_pixel(4, 0), None);
    }

    #[test]
    fn test_into_bytes_row_major() {
        let mut surface = RgbSurface::allocate(2, 2).unwrap();
        surface.set_pixel(0, 1, 7, 8, 9);
        let bytes = surface.into_bytes().unwrap();
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[6..9], &[7, 8, 9]);
    }
}
