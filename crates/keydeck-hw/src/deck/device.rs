//! Stream Deck communication via USB HID.

use crate::context::DeviceContext;
use crate::key::Key;
use crate::{Error, Result};
use hidapi::{HidApi, HidDevice};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use super::product::{Product, STREAM_DECK_ORIGINAL};
use super::protocol::{
    build_brightness_report, build_page_one, build_page_two, build_reset_report,
    parse_key_states, Frame,
};

/// An attached device found during enumeration.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    /// Platform HID path.
    pub path: String,
    /// USB serial number, if the device reports one.
    pub serial: Option<String>,
    /// Device model.
    pub product: Product,
}

/// Stream Deck controller.
pub struct StreamDeck {
    device: Mutex<HidDevice>,
    product: Product,
    serial: Option<String>,
    pressed: Mutex<Vec<bool>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl StreamDeck {
    /// Lists all attached, supported devices.
    pub fn list() -> Result<Vec<DeviceInfo>> {
        let api = HidApi::new()?;
        let devices = api
            .device_list()
            .filter_map(|d| {
                Product::from_ids(d.vendor_id(), d.product_id()).map(|product| DeviceInfo {
                    path: d.path().to_string_lossy().into_owned(),
                    serial: d.serial_number().map(str::to_string),
                    product,
                })
            })
            .collect();
        Ok(devices)
    }

    /// Opens the first attached device.
    pub fn open() -> Result<Self> {
        Self::open_matching(|_| true)
    }

    /// Opens the device with the given USB serial number.
    pub fn open_serial(serial: &str) -> Result<Self> {
        Self::open_matching(|s| s == Some(serial))
    }

    fn open_matching(matches: impl Fn(Option<&str>) -> bool) -> Result<Self> {
        let api = HidApi::new()?;

        let device_info = api
            .device_list()
            .filter(|d| Product::from_ids(d.vendor_id(), d.product_id()).is_some())
            .inspect(|d| {
                debug!(
                    "Found HID device: path={:?}, serial={:?}",
                    d.path(),
                    d.serial_number()
                )
            })
            .find(|d| matches(d.serial_number()))
            .ok_or(Error::DeviceNotFound)?;

        let product = Product::from_ids(device_info.vendor_id(), device_info.product_id())
            .unwrap_or(STREAM_DECK_ORIGINAL);
        let serial = device_info.serial_number().map(str::to_string);

        let device = device_info.open_device(&api).map_err(|e| {
            debug!("Failed to open device: {}", e);
            Error::DeviceNotFound
        })?;

        info!(
            "{} opened (VID:{:04X} PID:{:04X}, serial={})",
            product.name,
            product.vendor_id,
            product.product_id,
            serial.as_deref().unwrap_or("unknown")
        );

        Ok(Self {
            device: Mutex::new(device),
            product,
            serial,
            pressed: Mutex::new(vec![false; product.key_count]),
        })
    }

    /// Returns the device model.
    pub fn product(&self) -> Product {
        self.product
    }

    /// Returns the USB serial number, if known.
    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    /// Returns the number of keys.
    pub fn key_count(&self) -> usize {
        self.product.key_count
    }

    /// Returns a handle to one key.
    pub fn key(&self, index: usize) -> Result<Key<'_, Self>> {
        Key::new(self, index)
    }

    /// Returns handles to every key, in index order.
    pub fn keys(&self) -> Vec<Key<'_, Self>> {
        (0..self.key_count())
            .filter_map(|i| Key::new(self, i).ok())
            .collect()
    }

    /// Waits up to `timeout_ms` for a key state report and records it.
    ///
    /// A negative timeout blocks. Returns false if no report arrived.
    pub fn poll_keys(&self, timeout_ms: i32) -> Result<bool> {
        let mut report = vec![0u8; self.key_count() + 1];
        let len = lock(&self.device).read_timeout(&mut report, timeout_ms)?;
        if len == 0 {
            return Ok(false);
        }

        let Some(states) = parse_key_states(&report[..len], self.key_count()) else {
            debug!("Ignoring input report: {:02X?}", &report[..len]);
            return Ok(false);
        };

        let mut pressed = lock(&self.pressed);
        for (index, (old, new)) in pressed.iter_mut().zip(states).enumerate() {
            if *old != new {
                debug!("Key {} {}", index, if new { "pressed" } else { "released" });
                *old = new;
            }
        }
        Ok(true)
    }

    /// Sets the backlight brightness in percent (clamped to 100).
    pub fn set_brightness(&self, percent: u8) -> Result<()> {
        let report = build_brightness_report(percent);
        lock(&self.device).send_feature_report(&report)?;
        debug!("Set brightness to {}%", report[5]);
        Ok(())
    }

    /// Resets the device to its boot logo.
    pub fn reset(&self) -> Result<()> {
        lock(&self.device).send_feature_report(&build_reset_report())?;
        debug!("Device reset");
        Ok(())
    }
}

impl DeviceContext for StreamDeck {
    fn is_key_pressed(&self, key_index: usize) -> bool {
        lock(&self.pressed).get(key_index).copied().unwrap_or(false)
    }

    fn key_count(&self) -> usize {
        self.product.key_count
    }

    fn icon_size(&self) -> u32 {
        self.product.icon_size
    }

    fn build_page_one(&self, key_index: usize, pixel_data: &[u8]) -> Frame {
        build_page_one(key_index, self.product.icon_size, pixel_data)
    }

    fn build_page_two(&self, key_index: usize, pixel_data: &[u8]) -> Frame {
        build_page_two(key_index, pixel_data)
    }

    fn transmit(&self, frame: &Frame) -> Result<()> {
        lock(&self.device).write(frame.as_bytes())?;
        Ok(())
    }
}
