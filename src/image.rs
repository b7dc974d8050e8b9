use std::fmt;
use std::io::{Read, Write};

/// Largest width or height a PNG header can carry.
pub const MAX_DIMENSION: u32 = i32::MAX as u32;

/// Bytes per pixel of the only layout this crate handles: 8-bit, three channels.
pub const CHANNELS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    width: u32,
    height: u32,
}

impl ImageDimensions {
    /// Both sides must be in `1..=MAX_DIMENSION` and the RGB buffer size must fit in memory addressing.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return None;
        }
        let dims = ImageDimensions { width, height };
        dims.buffer_len()?;
        Some(dims)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn nb_pixels(&self) -> Option<usize> {
        (self.width as usize).checked_mul(self.height as usize)
    }

    pub fn scanline_len(&self) -> usize {
        self.width as usize * CHANNELS
    }

    pub fn buffer_len(&self) -> Option<usize> {
        self.nb_pixels()?.checked_mul(CHANNELS)
    }
}

impl fmt::Display for ImageDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Per-channel maximum declared by a text image, always in `1..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorMaxValue(u8);

impl ColorMaxValue {
    pub fn new(value: i64) -> Option<Self> {
        if value <= 0 || value >= 256 {
            return None;
        }
        Some(ColorMaxValue(value as u8))
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

/// Order in which the three channel tokens of a text pixel are stored in the output pixel.
///
/// The text format lists red, green, blue. `Rgb` keeps that order, which is what a PNG
/// truecolor pixel expects. `Bgr` swaps the first and last channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

impl ChannelOrder {
    pub fn arrange(&self, triple: [u8; 3]) -> [u8; 3] {
        match self {
            ChannelOrder::Rgb => triple,
            ChannelOrder::Bgr => [triple[2], triple[1], triple[0]],
        }
    }
}

/// Flat, row-major RGB bytes, `width * height * 3` long, no padding between rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Zero filled buffer sized for `dims`.
    pub fn zeroed(dims: &ImageDimensions) -> Option<Self> {
        let len = dims.buffer_len()?;
        debug!("pixel buffer: {} bytes for a {} image", len, dims);
        // zeroed allocation, pages are only committed once written
        Some(PixelBuffer { data: vec![0u8; len] })
    }

    /// Wraps raw bytes, checking the length against `dims`.
    pub fn from_vec(dims: &ImageDimensions, data: Vec<u8>) -> Option<Self> {
        if Some(data.len()) != dims.buffer_len() {
            return None;
        }
        Some(PixelBuffer { data })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Top to bottom row slices of `width * 3` bytes each.
    pub fn rows(&self, dims: &ImageDimensions) -> std::slice::Chunks<'_, u8> {
        self.data.chunks(dims.scanline_len())
    }

    pub fn pixel(&self, dims: &ImageDimensions, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= dims.width() || y >= dims.height() {
            return None;
        }
        let at = (y as usize * dims.width() as usize + x as usize) * CHANNELS;
        let p = self.data.get(at..at + CHANNELS)?;
        Some([p[0], p[1], p[2]])
    }
}

/// A decoded or about to be encoded 8-bit RGB image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbImage {
    pub dimensions: ImageDimensions,
    pub pixels: PixelBuffer,
}

pub trait ReadImage<R: Read> {
    type Error;

    fn read_image(reader: R) -> Result<RgbImage, Self::Error>;
}

pub trait WriteImage<W: Write> {
    type Error;

    fn write_image(&self, writer: W, image: &RgbImage) -> Result<(), Self::Error>;
}

#[test]
fn test_dimensions_reject_zero() {
    assert!(ImageDimensions::new(0, 1).is_none());
    assert!(ImageDimensions::new(1, 0).is_none());
    assert!(ImageDimensions::new(1, 1).is_some());
}

#[test]
fn test_dimensions_reject_png_limit() {
    assert!(ImageDimensions::new(MAX_DIMENSION + 1, 1).is_none());
}

#[test]
fn test_color_max_value_bounds() {
    assert!(ColorMaxValue::new(0).is_none());
    assert!(ColorMaxValue::new(256).is_none());
    assert!(ColorMaxValue::new(-3).is_none());
    assert_eq!(ColorMaxValue::new(255).map(|m| m.get()), Some(255));
    assert_eq!(ColorMaxValue::new(1).map(|m| m.get()), Some(1));
}

#[test]
fn test_channel_order() {
    assert_eq!(ChannelOrder::Rgb.arrange([1, 2, 3]), [1, 2, 3]);
    assert_eq!(ChannelOrder::Bgr.arrange([1, 2, 3]), [3, 2, 1]);
    assert_eq!(ChannelOrder::default(), ChannelOrder::Rgb);
}

#[test]
fn test_pixel_buffer_rows() {
    let dims = ImageDimensions::new(2, 3).unwrap();
    let buf = PixelBuffer::from_vec(&dims, (0..18).collect()).unwrap();
    let rows: Vec<&[u8]> = buf.rows(&dims).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1], &[6, 7, 8, 9, 10, 11]);
    assert_eq!(buf.pixel(&dims, 1, 2), Some([15, 16, 17]));
    assert_eq!(buf.pixel(&dims, 2, 0), None);
}

#[test]
fn test_pixel_buffer_length_checked() {
    let dims = ImageDimensions::new(2, 2).unwrap();
    assert!(PixelBuffer::from_vec(&dims, vec![0; 11]).is_none());
    assert_eq!(PixelBuffer::zeroed(&dims).unwrap().len(), 12);
}
