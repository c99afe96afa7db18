//! tiny-skia backed key surface.

use anyhow::Result;
use image::RgbImage;
use keydeck_hw::{RenderSurface, Size};
use tiny_skia::{Color, Pixmap, PremultipliedColorU8};

use super::rgb_components;

/// Key surface backed by a tiny-skia pixmap.
///
/// Reads back as tightly packed RGB, dropping alpha.
pub struct PixmapSurface {
    pixmap: Pixmap,
}

impl PixmapSurface {
    /// Returns the underlying pixmap for direct drawing.
    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// Fills the surface with a 0xRRGGBB color.
    pub fn fill(&mut self, color: u32) {
        let (r, g, b) = rgb_components(color);
        self.pixmap.fill(Color::from_rgba8(r, g, b, 255));
    }

    /// Copies an RGB image onto the surface at the origin, clipping overflow.
    pub fn draw_rgb_image(&mut self, image: &RgbImage) {
        let width = self.pixmap.width();
        let height = self.pixmap.height();
        let pixels = self.pixmap.pixels_mut();

        for (x, y, pixel) in image.enumerate_pixels() {
            if x < width && y < height {
                let [r, g, b] = pixel.0;
                if let Some(color) = PremultipliedColorU8::from_rgba(r, g, b, 255) {
                    pixels[(y * width + x) as usize] = color;
                }
            }
        }
    }

    /// Encodes the surface as PNG bytes.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let rgba: Vec<u8> = self
            .pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect();

        let mut png_data = Vec::new();
        {
            let mut encoder =
                png::Encoder::new(&mut png_data, self.pixmap.width(), self.pixmap.height());
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&rgba)?;
        }

        Ok(png_data)
    }
}

impl RenderSurface for PixmapSurface {
    fn allocate(width: u32, height: u32) -> Option<Self> {
        Pixmap::new(width, height).map(|pixmap| Self { pixmap })
    }

    fn size(&self) -> Size {
        Size {
            width: self.pixmap.width(),
            height: self.pixmap.height(),
        }
    }

    fn into_bytes(self) -> Option<Vec<u8>> {
        let bytes = self
            .pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue()]
            })
            .collect();
        Some(bytes)
    }
}
