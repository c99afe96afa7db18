//! Text rendering using fontdue.

use anyhow::{anyhow, Context, Result};
use fontdue::{Font, FontSettings};
use std::path::Path;
use tiny_skia::{Pixmap, PremultipliedColorU8};

use super::rgb_components;

/// Text renderer using fontdue for rasterization.
pub struct TextRenderer {
    font: Font,
}

impl TextRenderer {
    /// Creates a text renderer from font file bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let font = Font::from_bytes(data, FontSettings::default())
            .map_err(|e| anyhow!("Failed to load font: {}", e))?;
        Ok(Self { font })
    }

    /// Creates a text renderer from a font file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read font {}", path.display()))?;
        Self::from_bytes(&data)
    }

    /// Draws text onto a pixmap with its top-left corner at `(x, y)`.
    ///
    /// Glyphs are blended over the existing pixels, which are assumed opaque.
    pub fn draw_text(
        &self,
        pixmap: &mut Pixmap,
        x: i32,
        y: i32,
        text: &str,
        size: f32,
        color: u32,
    ) {
        let ink = rgb_components(color);
        let width = pixmap.width() as i32;
        let height = pixmap.height() as i32;
        let pixels = pixmap.pixels_mut();
        let baseline = y + size as i32;

        let mut pen_x = x;
        for ch in text.chars() {
            let (metrics, bitmap) = self.font.rasterize(ch, size);
            let left = pen_x + metrics.xmin;
            let top = baseline - metrics.ymin - metrics.height as i32;

            if metrics.width > 0 {
                for (row, coverage_row) in bitmap.chunks_exact(metrics.width).enumerate() {
                    let py = top + row as i32;
                    if !(0..height).contains(&py) {
                        continue;
                    }
                    for (col, &coverage) in coverage_row.iter().enumerate() {
                        let px = left + col as i32;
                        if coverage == 0 || !(0..width).contains(&px) {
                            continue;
                        }
                        let pixel = &mut pixels[(py * width + px) as usize];
                        *pixel = blend(*pixel, ink, coverage);
                    }
                }
            }

            pen_x += metrics.advance_width as i32;
        }
    }

    /// Draws text centered on the pixmap.
    pub fn draw_centered(&self, pixmap: &mut Pixmap, text: &str, size: f32, color: u32) {
        let x = (pixmap.width() as i32 - self.text_width(text, size)) / 2;
        let y = (pixmap.height() as i32 - size as i32) / 2;
        self.draw_text(pixmap, x, y, text, size, color);
    }

    /// Returns the width of text when rendered at the specified size.
    pub fn text_width(&self, text: &str, size: f32) -> i32 {
        text.chars()
            .map(|ch| self.font.metrics(ch, size).advance_width as i32)
            .sum()
    }
}

/// Mixes `ink` over an opaque pixel by glyph `coverage`.
fn blend(dst: PremultipliedColorU8, ink: (u8, u8, u8), coverage: u8) -> PremultipliedColorU8 {
    let a = coverage as u16;
    let mix = |src: u8, dst: u8| ((src as u16 * a + dst as u16 * (255 - a) + 127) / 255) as u8;
    PremultipliedColorU8::from_rgba(
        mix(ink.0, dst.red()),
        mix(ink.1, dst.green()),
        mix(ink.2, dst.blue()),
        255,
    )
    .unwrap_or(dst)
}
