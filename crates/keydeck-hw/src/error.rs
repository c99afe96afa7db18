//! Error types for the keydeck hardware library.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when driving a key surface.
#[derive(Error, Debug)]
pub enum Error {
    /// Color channel outside 0-255.
    #[error("RGB value out of range (expected 0-255, got {0})")]
    InvalidChannelValue(i32),

    /// Rendered key image is smaller than both pages together.
    #[error("Render buffer too short: expected at least {expected} bytes, got {actual}")]
    RenderBufferTooShort { expected: usize, actual: usize },

    /// No matching device attached or it could not be opened.
    #[error("Stream Deck not found (VID:PID 0FD9:0060)")]
    DeviceNotFound,

    /// Key index beyond the device's key count.
    #[error("Invalid key index: {0}")]
    InvalidKeyIndex(usize),

    /// USB HID communication error.
    #[error("USB HID error: {0}")]
    Hid(#[from] hidapi::HidError),
}
