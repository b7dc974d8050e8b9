use std::io::Read;

use nom::bytes::complete::tag;

use super::chunk::{parse_chunk, parse_ihdr, ColorType, Ihdr, PNG_SIGNATURE};
use super::filter::{unfilter_scanline, FilterType};
use crate::compress::zlib;
use crate::error::DecodingError;
use crate::image::{PixelBuffer, ReadImage, RgbImage, CHANNELS};

/// Chunks collected from a PNG stream before the image data is reconstructed.
#[derive(Debug, Default)]
pub struct PngImage {
    ihdr: Option<Ihdr>,
    idat: Vec<u8>,
    has_end: bool,
}

impl PngImage {
    pub fn parse(data: &[u8]) -> Result<PngImage, DecodingError> {
        debug!("Parsing png");
        let (r, _) = tag(&PNG_SIGNATURE[..])(data)?;
        let mut suite = r;
        let mut image = PngImage::default();

        while !suite.is_empty() && !image.has_end {
            let (r, chunk) = parse_chunk(suite)?;
            match chunk.name {
                "IHDR" => {
                    if image.ihdr.is_some() {
                        return Err(DecodingError::new("IHDR repeated"));
                    }
                    image.ihdr = Some(parse_ihdr(chunk)?);
                    info!("IHDR: {:?}", image.ihdr);
                }
                "IDAT" => {
                    if image.ihdr.is_none() {
                        return Err(DecodingError::new("IDAT before IHDR"));
                    }
                    image.idat.extend_from_slice(chunk.data);
                    debug!("IDAT: new chunk added");
                }
                "IEND" => {
                    if chunk.len != 0 {
                        return Err(DecodingError::new("IEND is not empty"));
                    }
                    image.has_end = true;
                }
                name => {
                    if chunk.is_critical() {
                        return Err(DecodingError::Format(format!("No parsing for mandatory chunk {}", name)));
                    }
                    warn!("no parsing for chunk: {}", name);
                }
            }
            suite = r;
        }

        if !suite.is_empty() {
            warn!("{} bytes after IEND ignored", suite.len());
        }
        if !image.has_end {
            return Err(DecodingError::new("missing IEND chunk"));
        }
        debug!("End of parsing");
        Ok(image)
    }

    fn ihdr(&self) -> Result<&Ihdr, DecodingError> {
        self.ihdr.as_ref().ok_or_else(|| DecodingError::new("missing IHDR chunk"))
    }

    /// Inflates and unfilters the image data into an 8-bit RGB image.
    pub fn to_rgb(&self) -> Result<RgbImage, DecodingError> {
        let ihdr = self.ihdr()?;
        if ihdr.bit_depth != 8 || ihdr.color_type != ColorType::TrueColor {
            return Err(DecodingError::Format(format!(
                "Unsupported layout: bit depth {}, color type {:?}",
                ihdr.bit_depth, ihdr.color_type
            )));
        }
        if ihdr.interlace_method != 0 {
            return Err(DecodingError::Format(format!(
                "Unsupported interlace method {}",
                ihdr.interlace_method
            )));
        }
        let dims = ihdr
            .dimensions()
            .ok_or_else(|| DecodingError::Format(format!("bad dimensions {}x{}", ihdr.width, ihdr.height)))?;
        if self.idat.is_empty() {
            return Err(DecodingError::new("missing IDAT chunk"));
        }

        let mut decoded = zlib::decode(&self.idat)?;
        let scanline_len = dims.scanline_len();
        if Some(decoded.len()) != (scanline_len + 1).checked_mul(dims.height() as usize) {
            return Err(DecodingError::Format(format!(
                "{} bytes of scanlines for a {} image",
                decoded.len(),
                dims
            )));
        }

        let mut ret: Vec<u8> = Vec::with_capacity(scanline_len * dims.height() as usize);
        let sl0: Vec<u8> = vec![0u8; scanline_len];
        let mut prev_scanline: &[u8] = sl0.as_ref();

        for scanline in decoded.chunks_mut(scanline_len + 1) {
            let (head, sl) = scanline.split_at_mut(1);
            let filter = FilterType::from_u8(head[0])
                .ok_or_else(|| DecodingError::Format(format!("unknown filter type {}", head[0])))?;
            unfilter_scanline(filter, prev_scanline, sl, CHANNELS);
            ret.extend_from_slice(sl);
            prev_scanline = sl;
        }

        let pixels = PixelBuffer::from_vec(&dims, ret).ok_or_else(|| DecodingError::new("pixel count mismatch"))?;
        Ok(RgbImage {
            dimensions: dims,
            pixels,
        })
    }
}

/// Decodes an in-memory PNG stream.
pub fn decode(data: &[u8]) -> Result<RgbImage, DecodingError> {
    PngImage::parse(data)?.to_rgb()
}

impl<R: Read> ReadImage<R> for PngImage {
    type Error = DecodingError;

    fn read_image(mut reader: R) -> Result<RgbImage, DecodingError> {
        let mut data: Vec<u8> = Vec::new();
        reader.read_to_end(&mut data)?;
        decode(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::png::chunk::write_chunk;
    use crate::compress::zlib::CompressionLevel;
    use crate::image::ImageDimensions;

    fn stream(ihdr: &Ihdr, scanlines: &[u8], extra: Option<(&[u8; 4], &[u8])>) -> Vec<u8> {
        let mut out: Vec<u8> = PNG_SIGNATURE.to_vec();
        write_chunk(&mut out, b"IHDR", &ihdr.to_bytes()).unwrap();
        if let Some((name, data)) = extra {
            write_chunk(&mut out, name, data).unwrap();
        }
        write_chunk(&mut out, b"IDAT", &zlib::encode(scanlines, CompressionLevel::default())).unwrap();
        write_chunk(&mut out, b"IEND", &[]).unwrap();
        out
    }

    #[test]
    fn test_decode_unfiltered() {
        let ihdr = Ihdr::truecolor(&ImageDimensions::new(2, 1).unwrap());
        let img = decode(&stream(&ihdr, &[0, 255, 0, 0, 0, 255, 0], None)).unwrap();
        assert_eq!(img.pixels.as_bytes(), &[255, 0, 0, 0, 255, 0]);
    }

    #[test]
    fn test_ancillary_chunk_skipped() {
        let ihdr = Ihdr::truecolor(&ImageDimensions::new(1, 1).unwrap());
        let png = stream(&ihdr, &[0, 1, 2, 3], Some((b"tEXt", &b"Comment\0hi"[..])));
        assert_eq!(decode(&png).unwrap().pixels.as_bytes(), &[1, 2, 3]);
    }

    #[test]
    fn test_unknown_critical_chunk() {
        let ihdr = Ihdr::truecolor(&ImageDimensions::new(1, 1).unwrap());
        let png = stream(&ihdr, &[0, 1, 2, 3], Some((b"ABCD", &[][..])));
        assert!(decode(&png).is_err());
    }

    #[test]
    fn test_bad_signature() {
        assert!(decode(b"\x89PNG\r\n\x1a\x0bxxxx").is_err());
    }

    #[test]
    fn test_bad_filter_type() {
        let ihdr = Ihdr::truecolor(&ImageDimensions::new(1, 1).unwrap());
        assert!(decode(&stream(&ihdr, &[7, 1, 2, 3], None)).is_err());
    }

    #[test]
    fn test_short_scanlines() {
        let ihdr = Ihdr::truecolor(&ImageDimensions::new(2, 2).unwrap());
        assert!(decode(&stream(&ihdr, &[0, 1, 2, 3, 4, 5, 6], None)).is_err());
    }

    #[test]
    fn test_missing_iend() {
        let ihdr = Ihdr::truecolor(&ImageDimensions::new(1, 1).unwrap());
        let mut png = stream(&ihdr, &[0, 1, 2, 3], None);
        png.truncate(png.len() - 12);
        assert!(decode(&png).is_err());
    }

    #[test]
    fn test_rejects_palette_images() {
        let mut ihdr = Ihdr::truecolor(&ImageDimensions::new(1, 1).unwrap());
        ihdr.color_type = ColorType::IndexedColor;
        assert!(decode(&stream(&ihdr, &[0, 0], None)).is_err());
    }

    #[test]
    fn test_read_image_from_reader() {
        let ihdr = Ihdr::truecolor(&ImageDimensions::new(1, 1).unwrap());
        let png = stream(&ihdr, &[0, 9, 8, 7], None);
        let img = PngImage::read_image(png.as_slice()).unwrap();
        assert_eq!(img.pixels.as_bytes(), &[9, 8, 7]);
    }
}
