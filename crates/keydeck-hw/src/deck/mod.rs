//! Stream Deck device module.
//!
//! Provides the HID-backed device context for the 15 key, 72x72 px model.

mod device;
mod product;

pub mod protocol;

pub use device::{DeviceInfo, StreamDeck};
pub use product::{Product, STREAM_DECK_ORIGINAL};
pub use protocol::Frame;
