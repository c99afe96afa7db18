//! Supported device models.

/// Static description of a device model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Product {
    /// Marketing name.
    pub name: &'static str,
    /// USB vendor id.
    pub vendor_id: u16,
    /// USB product id.
    pub product_id: u16,
    /// Number of keys.
    pub key_count: usize,
    /// Key icon side length in pixels.
    pub icon_size: u32,
}

/// Stream Deck Original (15 keys, 72x72 px).
pub const STREAM_DECK_ORIGINAL: Product = Product {
    name: "Stream Deck",
    vendor_id: 0x0FD9,
    product_id: 0x0060,
    key_count: 15,
    icon_size: 72,
};

impl Product {
    /// Looks up a supported product by USB ids.
    pub fn from_ids(vendor_id: u16, product_id: u16) -> Option<Self> {
        [STREAM_DECK_ORIGINAL]
            .into_iter()
            .find(|p| p.vendor_id == vendor_id && p.product_id == product_id)
    }

    /// Pixels in one key icon.
    pub fn icon_pixel_count(&self) -> usize {
        self.icon_size as usize * self.icon_size as usize
    }
}
