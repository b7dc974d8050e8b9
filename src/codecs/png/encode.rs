use std::io::{BufWriter, Write};
use std::path::Path;

use super::chunk::{write_chunk, Ihdr, PNG_SIGNATURE};
use super::filter::{encode_scanline, FilterStrategy};
use crate::compress::zlib::{self, CompressionLevel};
use crate::error::{EncodingError, WriteError};
use crate::image::{RgbImage, WriteImage, CHANNELS};
use crate::output::AtomicFile;

/// libpng's default IDAT buffer size.
pub const DEFAULT_IDAT_CHUNK_SIZE: usize = 8192;

/// A chunk length field is a 31-bit value.
pub const MAX_IDAT_CHUNK_SIZE: usize = i32::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderOptions {
    pub compression: CompressionLevel,
    pub filter: FilterStrategy,
    /// Upper bound for the data of a single IDAT chunk.
    pub idat_chunk_size: usize,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        EncoderOptions {
            compression: CompressionLevel::default(),
            filter: FilterStrategy::default(),
            idat_chunk_size: DEFAULT_IDAT_CHUNK_SIZE,
        }
    }
}

pub struct PngEncoder {
    options: EncoderOptions,
}

impl PngEncoder {
    pub fn new(options: EncoderOptions) -> Self {
        PngEncoder { options }
    }

    /// Filter byte plus filtered row, for every row top to bottom.
    fn filtered_scanlines(&self, image: &RgbImage) -> Result<Vec<u8>, EncodingError> {
        let dims = &image.dimensions;
        let scanline_len = dims.scanline_len();

        if Some(image.pixels.len()) != dims.buffer_len() {
            return Err(EncodingError::Init(format!(
                "pixel buffer holds {} bytes, {} image needs {}",
                image.pixels.len(),
                dims,
                scanline_len * dims.height() as usize
            )));
        }

        let raw_len = (scanline_len + 1)
            .checked_mul(dims.height() as usize)
            .ok_or_else(|| EncodingError::Init(format!("{} image too large", dims)))?;

        let mut ret: Vec<u8> = Vec::new();
        ret.try_reserve_exact(raw_len)
            .map_err(|e| EncodingError::Init(format!("cannot allocate scanlines: {}", e)))?;
        let mut scratch: Vec<u8> = Vec::new();
        scratch
            .try_reserve_exact(scanline_len * 2)
            .map_err(|e| EncodingError::Init(format!("cannot allocate scanline buffer: {}", e)))?;
        scratch.resize(scanline_len * 2, 0);
        let (out, trial) = scratch.split_at_mut(scanline_len);

        let sl0: Vec<u8> = vec![0u8; scanline_len];
        let mut prev_scanline: &[u8] = sl0.as_ref();

        for sl in image.pixels.rows(dims) {
            let filter = encode_scanline(self.options.filter, prev_scanline, sl, out, trial, CHANNELS);
            ret.push(filter as u8);
            ret.extend_from_slice(out);
            prev_scanline = sl;
        }

        Ok(ret)
    }
}

impl<W: Write> WriteImage<W> for PngEncoder {
    type Error = EncodingError;

    /// Writes a complete PNG stream: signature, IHDR, IDAT chunks, IEND.
    fn write_image(&self, writer: W, image: &RgbImage) -> Result<(), EncodingError> {
        if !(1..=MAX_IDAT_CHUNK_SIZE).contains(&self.options.idat_chunk_size) {
            return Err(EncodingError::Init(format!(
                "IDAT chunk size {} outside 1..={}",
                self.options.idat_chunk_size, MAX_IDAT_CHUNK_SIZE
            )));
        }

        let scanlines = self.filtered_scanlines(image)?;
        let compressed = zlib::encode(&scanlines, self.options.compression);
        drop(scanlines);

        let mut buf = BufWriter::new(writer);
        buf.write_all(&PNG_SIGNATURE)?;
        write_chunk(&mut buf, b"IHDR", &Ihdr::truecolor(&image.dimensions).to_bytes())?;
        for idat in compressed.chunks(self.options.idat_chunk_size) {
            write_chunk(&mut buf, b"IDAT", idat)?;
        }
        write_chunk(&mut buf, b"IEND", &[])?;
        buf.flush()?;

        info!(
            "png: {} image encoded, {} bytes of image data in {} IDAT chunks",
            image.dimensions,
            compressed.len(),
            compressed.len().div_ceil(self.options.idat_chunk_size)
        );
        Ok(())
    }
}

/// Encodes `image` to `path`. The file only appears once it is complete.
pub fn write<P: AsRef<Path>>(path: P, image: &RgbImage, options: &EncoderOptions) -> Result<(), WriteError> {
    let path = path.as_ref();
    let mut file = AtomicFile::create(path).map_err(|source| WriteError::CannotCreate {
        path: path.to_path_buf(),
        source,
    })?;

    PngEncoder::new(*options)
        .write_image(&mut file, image)
        .map_err(|e| e.at(path))?;

    file.persist().map_err(|source| WriteError::WriteFailed {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("png: {} written", path.display());
    Ok(())
}
