//! keydeck Hardware Library
//!
//! Drives the LCD keys of Stream Deck style control surfaces over USB HID:
//! solid colors and rendered images, split into the device's two-page
//! image transfer.

pub mod context;
pub mod deck;
pub mod error;
pub mod key;
pub mod surface;

pub use context::DeviceContext;
pub use deck::{DeviceInfo, Frame, Product, StreamDeck, STREAM_DECK_ORIGINAL};
pub use error::{Error, Result};
pub use key::Key;
pub use surface::{RenderSurface, RgbSurface, Size};
