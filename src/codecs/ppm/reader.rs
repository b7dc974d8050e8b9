use std::fs;
use std::path::Path;

use super::tokens::{channel, integer, Tokens};
use crate::error::{PpmFault, ReadError};
use crate::image::{ChannelOrder, ColorMaxValue, ImageDimensions, PixelBuffer, RgbImage, CHANNELS};

pub const MAGIC: &[u8] = b"P3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PpmImage {
    pub dimensions: ImageDimensions,
    pub max_value: ColorMaxValue,
    pub pixels: PixelBuffer,
}

impl From<PpmImage> for RgbImage {
    fn from(img: PpmImage) -> Self {
        RgbImage {
            dimensions: img.dimensions,
            pixels: img.pixels,
        }
    }
}

/// Reads and validates the text image at `path`.
pub fn read<P: AsRef<Path>>(path: P, order: ChannelOrder) -> Result<PpmImage, ReadError> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|source| ReadError::NotFound {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("ppm: {} bytes read from {}", data.len(), path.display());

    parse(&data, order).map_err(|fault| fault.at(path))
}

/// Parses a text image held in memory.
///
/// Channel values are stored as found, without rescaling to 255. When the data runs out before
/// every pixel is filled, the remaining bytes stay zero.
pub fn parse(data: &[u8], order: ChannelOrder) -> Result<PpmImage, PpmFault> {
    let mut tokens = Tokens::new(data);

    match tokens.next() {
        Some(magic) if magic == MAGIC => {}
        _ => return Err(PpmFault::BadHeader),
    }

    let width = tokens.next().and_then(integer);
    let height = tokens.next().and_then(integer);
    let dimensions = match (width, height) {
        (Some(w), Some(h)) => u32::try_from(w)
            .ok()
            .zip(u32::try_from(h).ok())
            .and_then(|(w, h)| ImageDimensions::new(w, h)),
        _ => None,
    }
    .ok_or(PpmFault::BadDimensions)?;

    let max_value = tokens
        .next()
        .and_then(integer)
        .and_then(ColorMaxValue::new)
        .ok_or(PpmFault::BadColorRange)?;

    info!("ppm: {} image, max value {}", dimensions, max_value.get());

    let mut pixels = PixelBuffer::zeroed(&dimensions).ok_or(PpmFault::BadDimensions)?;
    let mut filled = 0;

    for pixel in pixels.as_bytes_mut().chunks_exact_mut(CHANNELS) {
        let mut triple = [0u8; 3];
        let mut found = 0;
        for slot in triple.iter_mut() {
            let index = tokens.consumed();
            let t = match tokens.next() {
                Some(t) => t,
                None => break,
            };
            *slot = channel(t)
                .filter(|v| *v <= max_value.get())
                .ok_or(PpmFault::BadPixelData { index })?;
            found += 1;
        }
        if found == 0 {
            break;
        }
        pixel.copy_from_slice(&order.arrange(triple));
        filled += found;
        if found < CHANNELS {
            break;
        }
    }

    if filled < pixels.len() {
        warn!("ppm: only {} of {} channel values present, rest left at zero", filled, pixels.len());
    } else if tokens.next().is_some() {
        warn!("ppm: trailing data after {} channel values ignored", filled);
    }

    Ok(PpmImage {
        dimensions,
        max_value,
        pixels,
    })
}

#[test]
fn test_parse_two_pixels() {
    let img = parse(b"P3\n2 1\n255\n255 0 0 0 255 0\n", ChannelOrder::Rgb).unwrap();
    assert_eq!(img.dimensions, ImageDimensions::new(2, 1).unwrap());
    assert_eq!(img.max_value.get(), 255);
    assert_eq!(img.pixels.as_bytes(), &[255, 0, 0, 0, 255, 0]);
}

#[test]
fn test_parse_bgr_order() {
    let img = parse(b"P3 1 1 255 10 20 30", ChannelOrder::Bgr).unwrap();
    assert_eq!(img.pixels.as_bytes(), &[30, 20, 10]);
}

#[test]
fn test_bad_header() {
    assert_eq!(parse(b"P2\n2 1\n255\n", ChannelOrder::Rgb), Err(PpmFault::BadHeader));
    assert_eq!(parse(b"P3x 2 1 255", ChannelOrder::Rgb), Err(PpmFault::BadHeader));
    assert_eq!(parse(b"", ChannelOrder::Rgb), Err(PpmFault::BadHeader));
}

#[test]
fn test_bad_dimensions() {
    let inputs: [&[u8]; 6] = [b"P3 0 1 255", b"P3 1 0 255", b"P3 -2 1 255", b"P3 two 1 255", b"P3 1", b"P3 4294967296 1 255"];
    for input in inputs {
        assert_eq!(parse(input, ChannelOrder::Rgb), Err(PpmFault::BadDimensions), "{:?}", input);
    }
}

#[test]
fn test_bad_color_range() {
    let inputs: [&[u8]; 5] = [b"P3 1 1 300", b"P3 1 1 256", b"P3 1 1 0", b"P3 1 1", b"P3 1 1 max"];
    for input in inputs {
        assert_eq!(parse(input, ChannelOrder::Rgb), Err(PpmFault::BadColorRange), "{:?}", input);
    }
}

#[test]
fn test_channel_above_max_value() {
    assert_eq!(
        parse(b"P3 1 1 15 1 16 1", ChannelOrder::Rgb),
        Err(PpmFault::BadPixelData { index: 5 })
    );
}

#[test]
fn test_channel_not_a_number() {
    assert_eq!(
        parse(b"P3 1 1 255 1 2 x", ChannelOrder::Rgb),
        Err(PpmFault::BadPixelData { index: 6 })
    );
    assert_eq!(
        parse(b"P3 1 1 255 -1 2 3", ChannelOrder::Rgb),
        Err(PpmFault::BadPixelData { index: 4 })
    );
}

#[test]
fn test_short_data_is_zero_filled() {
    let img = parse(b"P3 2 2 255 1 2 3 4", ChannelOrder::Rgb).unwrap();
    assert_eq!(img.pixels.len(), 12);
    assert_eq!(img.pixels.as_bytes(), &[1, 2, 3, 4, 0, 0, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn test_trailing_data_ignored() {
    let img = parse(b"P3 1 1 255 1 2 3 4 5 6", ChannelOrder::Rgb).unwrap();
    assert_eq!(img.pixels.as_bytes(), &[1, 2, 3]);
}

#[test]
fn test_header_only_large_image() {
    let img = parse(b"P3 8000 8000 255", ChannelOrder::Rgb).unwrap();
    assert_eq!(img.pixels.len(), 192_000_000);
    assert_eq!(img.pixels.pixel(&img.dimensions, 7999, 7999), Some([0, 0, 0]));
}

#[test]
fn test_read_missing_file() {
    let e = read("/nonexistent/dir/input.ppm", ChannelOrder::Rgb).unwrap_err();
    assert!(matches!(e, ReadError::NotFound { .. }));
}
