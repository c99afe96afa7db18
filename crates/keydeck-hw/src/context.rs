//! The device side of a key write.

use crate::deck::protocol::Frame;
use crate::Result;

/// Device services a [`Key`](crate::Key) relies on.
///
/// The device owns the transport, the pressed-state table and page
/// framing; keys only hand it pixel runs and forward the resulting frames.
pub trait DeviceContext {
    /// Returns true if the last known state of `key_index` is pressed.
    /// Unknown keys read as not pressed.
    fn is_key_pressed(&self, key_index: usize) -> bool;

    /// Number of addressable keys. Valid indices are `0..key_count()`.
    fn key_count(&self) -> usize;

    /// Side length of a key icon in pixels.
    fn icon_size(&self) -> u32;

    /// Frames the first pixel run of a key image.
    fn build_page_one(&self, key_index: usize, pixel_data: &[u8]) -> Frame;

    /// Frames the second pixel run of a key image.
    fn build_page_two(&self, key_index: usize, pixel_data: &[u8]) -> Frame;

    /// Writes a frame to the device, blocking until the transport accepts it.
    fn transmit(&self, frame: &Frame) -> Result<()>;
}
