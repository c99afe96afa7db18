//! Rendering module for key images.

mod pixmap;
mod text;

pub use pixmap::PixmapSurface;
pub use text::TextRenderer;

/// Parses a hex color string (`#RRGGBB` or `RRGGBB`) to 0xRRGGBB.
pub fn parse_hex_color(hex: &str) -> Option<u32> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

/// Splits 0xRRGGBB into components.
#[inline]
pub fn rgb_components(color: u32) -> (u8, u8, u8) {
    (
        ((color >> 16) & 0xFF) as u8,
        ((color >> 8) & 0xFF) as u8,
        (color & 0xFF) as u8,
    )
}
