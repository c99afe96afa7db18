//! A single LCD key on a device.
//!
//! Solid colors are sent as a BGR pixel replicated across both pages.
//! Images are rendered into a caller-chosen [`RenderSurface`] and the
//! flat buffer is cut into the two page runs as-is.

use crate::context::DeviceContext;
use crate::deck::protocol::{FIRST_PAGE_PIXEL_COUNT, SECOND_PAGE_PIXEL_COUNT};
use crate::surface::{RenderSurface, Size};
use crate::{Error, Result};
use tracing::debug;

/// Handle to one key. Borrows the device; never owns it.
#[derive(Debug)]
pub struct Key<'a, D: DeviceContext + ?Sized> {
    device: &'a D,
    index: usize,
}

impl<D: DeviceContext + ?Sized> Clone for Key<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: DeviceContext + ?Sized> Copy for Key<'_, D> {}

impl<'a, D: DeviceContext + ?Sized> Key<'a, D> {
    /// Creates a handle for key `index` on `device`.
    ///
    /// Fails with [`Error::InvalidKeyIndex`] unless `index < device.key_count()`.
    pub fn new(device: &'a D, index: usize) -> Result<Self> {
        if index >= device.key_count() {
            return Err(Error::InvalidKeyIndex(index));
        }
        Ok(Self { device, index })
    }

    /// Returns the zero-based key index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns true if the device last reported this key as pressed.
    pub fn is_pressed(&self) -> bool {
        self.device.is_key_pressed(self.index)
    }

    /// Sets the key to black.
    pub fn clear(&self) -> Result<()> {
        self.set_color(0, 0, 0)
    }

    /// Sets the key to a solid color. Each channel must be within 0-255.
    pub fn set_color(&self, red: i32, green: i32, blue: i32) -> Result<()> {
        let red = channel(red)?;
        let green = channel(green)?;
        let blue = channel(blue)?;

        let pixel = [blue, green, red];
        let first = pixel.repeat(FIRST_PAGE_PIXEL_COUNT);
        let second = pixel.repeat(SECOND_PAGE_PIXEL_COUNT);

        self.write_pages(&first, &second)?;
        debug!("Key {} set to color ({}, {}, {})", self.index, red, green, blue);
        Ok(())
    }

    /// Renders an image onto the key.
    ///
    /// `render` receives a square surface of the device's icon size.
    ///
    /// # Panics
    ///
    /// Panics if the surface cannot be allocated or its pixel data cannot be
    /// read back; both mean the rendering backend is unusable.
    pub fn set_image<S, F>(&self, render: F) -> Result<()>
    where
        S: RenderSurface,
        F: FnOnce(&mut S, Size),
    {
        let size = Size::square(self.device.icon_size());
        let mut surface = S::allocate(size.width, size.height).unwrap_or_else(|| {
            panic!(
                "Could not allocate a {}x{} key surface",
                size.width, size.height
            )
        });

        render(&mut surface, size);

        let Some(data) = surface.into_bytes() else {
            panic!("Could not read back key surface data");
        };

        let expected = FIRST_PAGE_PIXEL_COUNT + SECOND_PAGE_PIXEL_COUNT;
        if data.len() < expected {
            return Err(Error::RenderBufferTooShort {
                expected,
                actual: data.len(),
            });
        }

        let (first, rest) = data.split_at(FIRST_PAGE_PIXEL_COUNT);
        let second = &rest[..SECOND_PAGE_PIXEL_COUNT];

        self.write_pages(first, second)?;
        debug!("Key {} image written", self.index);
        Ok(())
    }

    /// Frames both runs, then transmits page one before page two.
    fn write_pages(&self, first: &[u8], second: &[u8]) -> Result<()> {
        let page_one = self.device.build_page_one(self.index, first);
        let page_two = self.device.build_page_two(self.index, second);

        self.device.transmit(&page_one)?;
        self.device.transmit(&page_two)
    }
}

fn channel(value: i32) -> Result<u8> {
    u8::try_from(value).map_err(|_| Error::InvalidChannelValue(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::protocol::{Frame, BYTES_PER_PIXEL};
    use crate::surface::RgbSurface;
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        PageOne(usize, Vec<u8>),
        PageTwo(usize, Vec<u8>),
        Transmit(Vec<u8>),
    }

    /// Records every device call; frames are tagged payload copies.
    struct MockDevice {
        key_count: usize,
        icon_size: u32,
        pressed: RefCell<Vec<bool>>,
        calls: RefCell<Vec<Call>>,
        fail_transmit: bool,
    }

    impl MockDevice {
        fn new() -> Self {
            Self {
                key_count: 15,
                icon_size: 72,
                // Shorter than key_count: keys 10-14 have no entry
                pressed: RefCell::new(vec![false; 10]),
                calls: RefCell::new(Vec::new()),
                fail_transmit: false,
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        fn page_payloads(&self) -> (Vec<u8>, Vec<u8>) {
            let calls = self.calls();
            let first = calls.iter().find_map(|c| match c {
                Call::PageOne(_, data) => Some(data.clone()),
                _ => None,
            });
            let second = calls.iter().find_map(|c| match c {
                Call::PageTwo(_, data) => Some(data.clone()),
                _ => None,
            });
            (first.unwrap(), second.unwrap())
        }
    }

    impl DeviceContext for MockDevice {
        fn is_key_pressed(&self, key_index: usize) -> bool {
            self.pressed.borrow().get(key_index).copied().unwrap_or(false)
        }

        fn key_count(&self) -> usize {
            self.key_count
        }

        fn icon_size(&self) -> u32 {
            self.icon_size
        }

        fn build_page_one(&self, key_index: usize, pixel_data: &[u8]) -> Frame {
            self.calls
                .borrow_mut()
                .push(Call::PageOne(key_index, pixel_data.to_vec()));
            Frame::from_bytes(vec![1, key_index as u8])
        }

        fn build_page_two(&self, key_index: usize, pixel_data: &[u8]) -> Frame {
            self.calls
                .borrow_mut()
                .push(Call::PageTwo(key_index, pixel_data.to_vec()));
            Frame::from_bytes(vec![2, key_index as u8])
        }

        fn transmit(&self, frame: &Frame) -> Result<()> {
            self.calls
                .borrow_mut()
                .push(Call::Transmit(frame.as_bytes().to_vec()));
            if self.fail_transmit {
                return Err(Error::DeviceNotFound);
            }
            Ok(())
        }
    }

    /// Surface returning `N` patterned bytes regardless of icon size.
    struct FixedSurface<const N: usize>;

    impl<const N: usize> RenderSurface for FixedSurface<N> {
        fn allocate(_width: u32, _height: u32) -> Option<Self> {
            Some(Self)
        }

        fn size(&self) -> Size {
            Size::square(0)
        }

        fn into_bytes(self) -> Option<Vec<u8>> {
            Some(pattern(N))
        }
    }

    /// Surface that allocates but loses its backing memory.
    struct LostSurface;

    impl RenderSurface for LostSurface {
        fn allocate(_width: u32, _height: u32) -> Option<Self> {
            Some(Self)
        }

        fn size(&self) -> Size {
            Size::square(0)
        }

        fn into_bytes(self) -> Option<Vec<u8>> {
            None
        }
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    struct NoSurface;

    impl RenderSurface for NoSurface {
        fn allocate(_width: u32, _height: u32) -> Option<Self> {
            None
        }

        fn size(&self) -> Size {
            Size::square(0)
        }

        fn into_bytes(self) -> Option<Vec<u8>> {
            None
        }
    }

    fn assert_solid(data: &[u8], pixels: usize, bgr: [u8; 3]) {
        assert_eq!(data.len(), pixels * BYTES_PER_PIXEL);
        for pixel in data.chunks_exact(3) {
            assert_eq!(pixel, &bgr[..]);
        }
    }

    #[test]
    fn test_set_color_bgr_pages() {
        let device = MockDevice::new();
        let key = Key::new(&device, 3).unwrap();

        key.set_color(255, 0, 128).unwrap();

        let (first, second) = device.page_payloads();
        assert_solid(&first, 2583, [128, 0, 255]);
        assert_solid(&second, 2601, [128, 0, 255]);
    }

    #[test]
    fn test_set_color_channel_positions() {
        for (r, g, b) in [(0, 0, 0), (1, 2, 3), (255, 255, 255), (10, 200, 30)] {
            let device = MockDevice::new();
            Key::new(&device, 0).unwrap().set_color(r, g, b).unwrap();

            let (first, second) = device.page_payloads();
            for data in [first, second] {
                for (i, &byte) in data.iter().enumerate() {
                    let expected = match i % 3 {
                        0 => b,
                        1 => g,
                        _ => r,
                    };
                    assert_eq!(byte as i32, expected);
                }
            }
        }
    }

    #[test]
    fn test_call_order() {
        let device = MockDevice::new();
        Key::new(&device, 7).unwrap().set_color(10, 20, 30).unwrap();

        let calls = device.calls();
        assert_eq!(calls.len(), 4);
        assert!(matches!(calls[0], Call::PageOne(7, _)));
        assert!(matches!(calls[1], Call::PageTwo(7, _)));
        assert_eq!(calls[2], Call::Transmit(vec![1, 7]));
        assert_eq!(calls[3], Call::Transmit(vec![2, 7]));
    }

    #[test]
    fn test_invalid_channel_first_offender() {
        let cases = [
            ((256, 0, 0), 256),
            ((0, -1, 0), -1),
            ((0, 0, 300), 300),
            ((-5, 999, -7), -5),
            ((10, 256, -1), 256),
        ];

        for ((r, g, b), offender) in cases {
            let device = MockDevice::new();
            let err = Key::new(&device, 0)
                .unwrap()
                .set_color(r, g, b)
                .unwrap_err();
            assert!(matches!(err, Error::InvalidChannelValue(v) if v == offender));
            assert!(device.calls().is_empty());
        }
    }

    #[test]
    fn test_clear_matches_black() {
        let cleared = MockDevice::new();
        Key::new(&cleared, 2).unwrap().clear().unwrap();

        let black = MockDevice::new();
        Key::new(&black, 2).unwrap().set_color(0, 0, 0).unwrap();

        assert_eq!(cleared.calls(), black.calls());
    }

    #[test]
    fn test_transmit_error_propagates() {
        let mut device = MockDevice::new();
        device.fail_transmit = true;

        let result = Key::new(&device, 0).unwrap().set_color(1, 2, 3);
        assert!(matches!(result, Err(Error::DeviceNotFound)));
        // Page two is never sent after page one fails
        let transmits = device
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::Transmit(_)))
            .count();
        assert_eq!(transmits, 1);
    }

    #[test]
    fn test_is_pressed_reads_through() {
        let device = MockDevice::new();
        let key = Key::new(&device, 4).unwrap();
        assert!(!key.is_pressed());

        device.pressed.borrow_mut()[4] = true;
        assert!(key.is_pressed());

        device.pressed.borrow_mut()[4] = false;
        assert!(!key.is_pressed());

        // No entry in the pressed table
        assert!(!Key::new(&device, 12).unwrap().is_pressed());
    }

    #[test]
    fn test_out_of_range_key_rejected() {
        let device = MockDevice::new();
        for index in [15, 255, 270, usize::MAX] {
            assert!(matches!(
                Key::new(&device, index),
                Err(Error::InvalidKeyIndex(i)) if i == index
            ));
        }
        assert!(Key::new(&device, 14).is_ok());
        assert!(device.calls().is_empty());
    }

    #[test]
    fn test_set_image_slices_pages() {
        let device = MockDevice::new();
        let key = Key::new(&device, 5).unwrap();

        key.set_image(|surface: &mut RgbSurface, size| {
            assert_eq!(size, Size::square(72));
            surface.data_mut().copy_from_slice(&pattern(72 * 72 * 3));
        })
        .unwrap();

        let rendered = pattern(72 * 72 * 3);
        let (first, second) = device.page_payloads();
        assert_eq!(first, &rendered[..2583]);
        assert_eq!(second, &rendered[2583..2583 + 2601]);

        let calls = device.calls();
        assert_eq!(calls[2], Call::Transmit(vec![1, 5]));
        assert_eq!(calls[3], Call::Transmit(vec![2, 5]));
    }

    #[test]
    fn test_set_image_exact_buffer() {
        let device = MockDevice::new();
        Key::new(&device, 1)
            .unwrap()
            .set_image(|_: &mut FixedSurface<5184>, _| {})
            .unwrap();

        let rendered = pattern(5184);
        let (first, second) = device.page_payloads();
        assert_eq!(first, &rendered[..2583]);
        assert_eq!(second, &rendered[2583..]);
        assert_eq!(second.last(), rendered.last());
    }

    #[test]
    fn test_set_image_short_buffer() {
        let device = MockDevice::new();
        let key = Key::new(&device, 0).unwrap();

        let err = key
            .set_image(|_: &mut FixedSurface<5183>, _| {})
            .unwrap_err();
        assert!(matches!(
            err,
            Error::RenderBufferTooShort {
                expected: 5184,
                actual: 5183
            }
        ));

        let err = key
            .set_image(|_: &mut FixedSurface<100>, _| {})
            .unwrap_err();
        assert!(matches!(
            err,
            Error::RenderBufferTooShort {
                expected: 5184,
                actual: 100
            }
        ));
        assert!(device.calls().is_empty());
    }

    #[test]
    #[should_panic(expected = "Could not allocate")]
    fn test_set_image_allocation_failure_panics() {
        let device = MockDevice::new();
        let _ = Key::new(&device, 0)
            .unwrap()
            .set_image(|_: &mut NoSurface, _| {});
    }

    #[test]
    #[should_panic(expected = "Could not read back")]
    fn test_set_image_read_back_failure_panics() {
        let device = MockDevice::new();
        let _ = Key::new(&device, 0)
            .unwrap()
            .set_image(|_: &mut LostSurface, _| {});
    }
}
