use miniz_oxide::deflate::compress_to_vec_zlib;
use miniz_oxide::inflate::decompress_to_vec_zlib;

use crate::error::DecodingError;

/// zlib effort, `0` stores, `10` is the slowest miniz level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    pub const NONE: CompressionLevel = CompressionLevel(0);
    pub const FAST: CompressionLevel = CompressionLevel(1);
    pub const BEST: CompressionLevel = CompressionLevel(10);

    pub fn new(level: u8) -> Option<Self> {
        if level > 10 {
            return None;
        }
        Some(CompressionLevel(level))
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        CompressionLevel(6)
    }
}

/// Full zlib stream: CMF/FLG header, deflate blocks, adler32 trailer.
pub fn encode(data: &[u8], level: CompressionLevel) -> Vec<u8> {
    let ret = compress_to_vec_zlib(data, level.get());
    debug!("zlib: {} bytes in, {} bytes out, level {}", data.len(), ret.len(), level.get());
    ret
}

pub fn decode(data: &[u8]) -> Result<Vec<u8>, DecodingError> {
    Ok(decompress_to_vec_zlib(data)?)
}

#[test]
fn test_roundtrip_text() {
    let message = b"Hello blah blah blah! Hello blah blah blah blah! dop dop";
    let code = encode(message, CompressionLevel::default());
    assert_eq!(decode(&code).unwrap(), message);
}

#[test]
fn test_stored_level_is_valid_zlib() {
    let code = encode(b"Hello test 123", CompressionLevel::NONE);
    assert_eq!(code[0] & 0b1111, 8);
    assert_eq!(((code[0] as u16) << 8 | code[1] as u16) % 31, 0);
    assert_eq!(decode(&code).unwrap(), b"Hello test 123");
}

#[test]
fn test_decode_known_stream() {
    let code = vec!(120, 156, 243, 72, 205, 201, 201, 87, 40, 73, 45, 46, 81, 48, 52, 50, 6, 0, 37, 76, 4, 139);
    assert_eq!(decode(&code).unwrap(), b"Hello test 123");
}

#[test]
fn test_decode_garbage() {
    assert!(decode(&[1, 2, 3, 4, 5]).is_err());
}

#[test]
fn test_level_bounds() {
    assert!(CompressionLevel::new(11).is_none());
    assert_eq!(CompressionLevel::new(10), Some(CompressionLevel::BEST));
    assert_eq!(CompressionLevel::FAST.get(), 1);
}
