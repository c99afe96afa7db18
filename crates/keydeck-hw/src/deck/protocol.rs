//! Stream Deck protocol definitions and encoding.
//!
//! A key image is written as two output reports of [`REPORT_LENGTH`] bytes:
//! - Page one: 16 byte page header, 54 byte BMP header, first pixel run
//! - Page two: 16 byte page header, second pixel run
//!
//! Brightness and reset are 17 byte feature reports.

use tracing::warn;

/// Size of every image output report.
pub const REPORT_LENGTH: usize = 8191;

/// Page header size.
pub const PAGE_HEADER_SIZE: usize = 16;

/// BMP file + info header size.
pub const BMP_HEADER_SIZE: usize = 54;

/// Bytes per pixel on the wire (BGR, 8 bits per channel).
pub const BYTES_PER_PIXEL: usize = 3;

/// Pixels carried by the first page.
pub const FIRST_PAGE_PIXEL_COUNT: usize = 2583;

/// Pixels carried by the second page.
///
/// Together with [`FIRST_PAGE_PIXEL_COUNT`] this covers one 72x72 icon;
/// the two must only ever change together with the icon size.
pub const SECOND_PAGE_PIXEL_COUNT: usize = 2601;

/// Feature report size.
pub const FEATURE_REPORT_LENGTH: usize = 17;

/// Report id of the key state input report.
pub const KEY_STATE_REPORT_ID: u8 = 0x01;

/// Image output report id.
const IMAGE_REPORT_ID: u8 = 0x02;

/// Horizontal and vertical resolution written to the BMP header (96 DPI).
const BMP_PIXELS_PER_METER: u32 = 3780;

/// A fully framed output report, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame(Vec<u8>);

impl Frame {
    /// Wraps an already framed report.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the raw report bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the report length.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for an empty report.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Image page within a key write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Page {
    /// Carries the BMP header and first pixel run.
    One = 0x01,
    /// Carries the remaining pixels.
    Two = 0x02,
}

impl Page {
    /// Returns the "last page" flag byte.
    fn last_flag(self) -> u8 {
        match self {
            Page::One => 0x00,
            Page::Two => 0x01,
        }
    }
}

/// Feature report commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FeatureCommand {
    /// Set backlight brightness.
    Brightness = 0x05,
    /// Reset to the boot logo.
    Reset = 0x0B,
}

/// Builds the 16 byte page header.
fn page_header(page: Page, key_index: usize) -> [u8; PAGE_HEADER_SIZE] {
    let mut header = [0u8; PAGE_HEADER_SIZE];
    header[0] = IMAGE_REPORT_ID;
    header[1] = 0x01;
    header[2] = page as u8;
    header[4] = page.last_flag();
    // Keys are 1-based on the wire
    header[5] = (key_index + 1) as u8;
    header
}

/// Builds the BMP header for a 24-bit square bitmap of `icon_size` pixels.
pub fn bmp_header(icon_size: u32) -> [u8; BMP_HEADER_SIZE] {
    let row_stride = (icon_size * BYTES_PER_PIXEL as u32 + 3) & !3;
    let image_size = row_stride * icon_size;
    let file_size = image_size + BMP_HEADER_SIZE as u32;

    let mut header = [0u8; BMP_HEADER_SIZE];
    header[0] = b'B';
    header[1] = b'M';
    header[2..6].copy_from_slice(&file_size.to_le_bytes());
    header[10..14].copy_from_slice(&(BMP_HEADER_SIZE as u32).to_le_bytes());

    // BITMAPINFOHEADER
    header[14..18].copy_from_slice(&40u32.to_le_bytes());
    header[18..22].copy_from_slice(&icon_size.to_le_bytes());
    header[22..26].copy_from_slice(&icon_size.to_le_bytes());
    header[26..28].copy_from_slice(&1u16.to_le_bytes());
    header[28..30].copy_from_slice(&24u16.to_le_bytes());
    header[34..38].copy_from_slice(&image_size.to_le_bytes());
    header[38..42].copy_from_slice(&BMP_PIXELS_PER_METER.to_le_bytes());
    header[42..46].copy_from_slice(&BMP_PIXELS_PER_METER.to_le_bytes());
    header
}

/// Copies pixel data into the report after `offset`, truncating to capacity.
fn copy_payload(buffer: &mut [u8], offset: usize, pixel_data: &[u8]) {
    let capacity = buffer.len() - offset;
    if pixel_data.len() > capacity {
        warn!(
            "Page payload of {} bytes truncated to {} bytes",
            pixel_data.len(),
            capacity
        );
    }
    let len = pixel_data.len().min(capacity);
    buffer[offset..offset + len].copy_from_slice(&pixel_data[..len]);
}

/// Builds the first image page for a key.
pub fn build_page_one(key_index: usize, icon_size: u32, pixel_data: &[u8]) -> Frame {
    let mut buffer = vec![0u8; REPORT_LENGTH];
    buffer[..PAGE_HEADER_SIZE].copy_from_slice(&page_header(Page::One, key_index));

    let bmp_start = PAGE_HEADER_SIZE;
    let data_start = bmp_start + BMP_HEADER_SIZE;
    buffer[bmp_start..data_start].copy_from_slice(&bmp_header(icon_size));

    copy_payload(&mut buffer, data_start, pixel_data);
    Frame(buffer)
}

/// Builds the second image page for a key.
pub fn build_page_two(key_index: usize, pixel_data: &[u8]) -> Frame {
    let mut buffer = vec![0u8; REPORT_LENGTH];
    buffer[..PAGE_HEADER_SIZE].copy_from_slice(&page_header(Page::Two, key_index));
    copy_payload(&mut buffer, PAGE_HEADER_SIZE, pixel_data);
    Frame(buffer)
}

/// Builds a brightness feature report. Values above 100 are clamped.
pub fn build_brightness_report(percent: u8) -> [u8; FEATURE_REPORT_LENGTH] {
    let mut buffer = [0u8; FEATURE_REPORT_LENGTH];
    buffer[0] = FeatureCommand::Brightness as u8;
    buffer[1] = 0x55;
    buffer[2] = 0xAA;
    buffer[3] = 0xD1;
    buffer[4] = 0x01;
    buffer[5] = percent.min(100);
    buffer
}

/// Builds a reset feature report.
pub fn build_reset_report() -> [u8; FEATURE_REPORT_LENGTH] {
    let mut buffer = [0u8; FEATURE_REPORT_LENGTH];
    buffer[0] = FeatureCommand::Reset as u8;
    buffer[1] = 0x63;
    buffer
}

/// Parses a key state input report into one flag per key.
///
/// Returns `None` for reports with a different id or too few bytes.
pub fn parse_key_states(report: &[u8], key_count: usize) -> Option<Vec<bool>> {
    if report.first() != Some(&KEY_STATE_REPORT_ID) || report.len() < key_count + 1 {
        return None;
    }
    Some(report[1..=key_count].iter().map(|&b| b != 0).collect())
}
