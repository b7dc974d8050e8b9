use std::io::{self, Write};
use std::str;

use nom::bytes::complete::take;
use nom::number::complete::{be_u32, u8};
use nom::sequence::tuple;

use crate::error::DecodingError;
use crate::image::ImageDimensions;

pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

pub const IHDR_LEN: usize = 13;

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[repr(u8)]
pub enum ColorType {
    GrayScale = 0,
    TrueColor = 2,
    IndexedColor = 3,
    GrayScaleAlpha = 4,
    TrueColorAlpha = 6,
}

impl ColorType {
    pub fn from_u8(val: u8) -> Option<Self> {
        match val {
            0 => Some(ColorType::GrayScale),
            2 => Some(ColorType::TrueColor),
            3 => Some(ColorType::IndexedColor),
            4 => Some(ColorType::GrayScaleAlpha),
            6 => Some(ColorType::TrueColorAlpha),
            _ => None,
        }
    }
}

fn crc(name: &[u8], data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(name);
    hasher.update(data);
    hasher.finalize()
}

#[derive(Debug)]
pub struct Chunk<'a> {
    pub len: u32,
    pub name: &'a str,
    pub data: &'a [u8],
    pub crc: u32,
}

impl Chunk<'_> {
    pub fn check_crc(&self) -> bool {
        crc(self.name.as_bytes(), self.data) == self.crc
    }

    /// Critical chunks start with an uppercase letter.
    pub fn is_critical(&self) -> bool {
        self.name.as_bytes()[0].is_ascii_uppercase()
    }
}

pub fn parse_chunk(input: &[u8]) -> Result<(&[u8], Chunk), DecodingError> {
    let (r, len): (&[u8], u32) = be_u32(input)?;
    let (r, name_bytes): (&[u8], &[u8]) = take(4usize)(r)?;
    let (r, data): (&[u8], &[u8]) = take(len)(r)?;
    let (r, crc): (&[u8], u32) = be_u32(r)?;

    if !name_bytes.iter().all(|c| c.is_ascii_alphabetic()) {
        return Err(DecodingError::Format(format!("invalid chunk name {:?}", name_bytes)));
    }
    let name = str::from_utf8(name_bytes).map_err(|e| DecodingError::Format(e.to_string()))?;

    debug!("\tChunk name: {}, size: {}, crc: {}", name, len, crc);

    let chunk = Chunk { len, name, data, crc };

    if !chunk.check_crc() {
        return Err(DecodingError::Crc {
            name: name.to_string(),
        });
    }

    Ok((r, chunk))
}

/// Length, type, data, then the CRC of type and data.
pub fn write_chunk<W: Write>(w: &mut W, name: &[u8; 4], data: &[u8]) -> io::Result<()> {
    let len = u32::try_from(data.len())
        .ok()
        .filter(|l| *l <= i32::MAX as u32)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "chunk too large"))?;

    w.write_all(&len.to_be_bytes())?;
    w.write_all(name)?;
    w.write_all(data)?;
    w.write_all(&crc(name, data).to_be_bytes())?;

    debug!("\tChunk written: {}, size: {}", String::from_utf8_lossy(name), len);
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ihdr {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: ColorType,
    pub compression_method: u8,
    pub filter_method: u8,
    pub interlace_method: u8,
}

impl Ihdr {
    /// 8-bit truecolor, deflate, adaptive filtering, no interlace.
    pub fn truecolor(dims: &ImageDimensions) -> Self {
        Ihdr {
            width: dims.width(),
            height: dims.height(),
            bit_depth: 8,
            color_type: ColorType::TrueColor,
            compression_method: 0,
            filter_method: 0,
            interlace_method: 0,
        }
    }

    pub fn to_bytes(&self) -> [u8; IHDR_LEN] {
        let mut b = [0u8; IHDR_LEN];
        b[0..4].copy_from_slice(&self.width.to_be_bytes());
        b[4..8].copy_from_slice(&self.height.to_be_bytes());
        b[8] = self.bit_depth;
        b[9] = self.color_type as u8;
        b[10] = self.compression_method;
        b[11] = self.filter_method;
        b[12] = self.interlace_method;
        b
    }

    pub fn dimensions(&self) -> Option<ImageDimensions> {
        ImageDimensions::new(self.width, self.height)
    }
}

pub fn parse_ihdr(ihdr_chunk: Chunk) -> Result<Ihdr, DecodingError> {
    if ihdr_chunk.len as usize != IHDR_LEN {
        return Err(DecodingError::Format(format!("IHDR length {}", ihdr_chunk.len)));
    }

    let (
        _i,
        (width, height, bit_depth, color_type, compression_method, filter_method, interlace_method),
    ) = tuple((be_u32, be_u32, u8, u8, u8, u8, u8))(ihdr_chunk.data)?;

    if ![1, 2, 4, 8, 16].contains(&bit_depth) {
        return Err(DecodingError::Format(format!("Wrong bit depht {}", bit_depth)));
    }
    let color_type = ColorType::from_u8(color_type)
        .ok_or_else(|| DecodingError::Format(format!("Unknown color type {}", color_type)))?;
    if ![0, 1].contains(&interlace_method) {
        return Err(DecodingError::Format(format!("Unknown interlace method {}", interlace_method)));
    }
    if compression_method != 0 {
        return Err(DecodingError::Format(format!("Unknown compression method {}", compression_method)));
    }
    if filter_method != 0 {
        return Err(DecodingError::Format(format!("Unknown filter method {}", filter_method)));
    }

    Ok(Ihdr {
        width,
        height,
        bit_depth,
        color_type,
        compression_method,
        filter_method,
        interlace_method,
    })
}

#[test]
fn test_write_iend() {
    let mut out: Vec<u8> = Vec::new();
    write_chunk(&mut out, b"IEND", &[]).unwrap();
    assert_eq!(out, vec![0, 0, 0, 0, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82]);
}

#[test]
fn test_chunk_write_then_parse() {
    let mut out: Vec<u8> = Vec::new();
    write_chunk(&mut out, b"tEXt", b"Comment\0hello").unwrap();
    let (rest, chunk) = parse_chunk(&out).unwrap();
    assert!(rest.is_empty());
    assert_eq!(chunk.name, "tEXt");
    assert_eq!(chunk.data, b"Comment\0hello");
    assert!(!chunk.is_critical());
}

#[test]
fn test_chunk_crc_mismatch() {
    let mut out: Vec<u8> = Vec::new();
    write_chunk(&mut out, b"IDAT", &[1, 2, 3]).unwrap();
    out[9] ^= 0xff;
    assert!(matches!(parse_chunk(&out), Err(DecodingError::Crc { .. })));
}

#[test]
fn test_chunk_truncated() {
    assert!(parse_chunk(&[0, 0, 0, 5, b'I', b'D']).is_err());
}

#[test]
fn test_ihdr_layout() {
    let dims = ImageDimensions::new(2, 1).unwrap();
    let bytes = Ihdr::truecolor(&dims).to_bytes();
    assert_eq!(bytes, [0, 0, 0, 2, 0, 0, 0, 1, 8, 2, 0, 0, 0]);

    let mut out: Vec<u8> = Vec::new();
    write_chunk(&mut out, b"IHDR", &bytes).unwrap();
    let (_, chunk) = parse_chunk(&out).unwrap();
    let ihdr = parse_ihdr(chunk).unwrap();
    assert_eq!(ihdr, Ihdr::truecolor(&dims));
    assert_eq!(ihdr.dimensions(), Some(dims));
}

#[test]
fn test_ihdr_unknown_color_type() {
    let mut bytes = Ihdr::truecolor(&ImageDimensions::new(1, 1).unwrap()).to_bytes();
    bytes[9] = 5;
    let mut out: Vec<u8> = Vec::new();
    write_chunk(&mut out, b"IHDR", &bytes).unwrap();
    let (_, chunk) = parse_chunk(&out).unwrap();
    assert!(parse_ihdr(chunk).is_err());
}
