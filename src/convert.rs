use std::path::Path;

use crate::codecs::{png, ppm};
use crate::error::ConvertError;
use crate::image::{ChannelOrder, ImageDimensions, RgbImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConvertOptions {
    pub channel_order: ChannelOrder,
    pub encoder: png::EncoderOptions,
}

/// Reads the text image at `source` and writes it as a PNG to `dest`.
///
/// The read completes before anything is created at `dest`; the destination is either a complete
/// PNG or untouched.
pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    dest: Q,
    options: &ConvertOptions,
) -> Result<ImageDimensions, ConvertError> {
    let (source, dest) = (source.as_ref(), dest.as_ref());

    let image: RgbImage = ppm::read(source, options.channel_order)?.into();
    let dimensions = image.dimensions;
    png::write(dest, &image, &options.encoder)?;

    info!("{} -> {} ({})", source.display(), dest.display(), dimensions);
    Ok(dimensions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ReadError, WriteError};
    use crate::image::ReadImage;
    use std::fs;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("polms_convert_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_convert_two_pixels() {
        let dir = scratch_dir("two");
        let src = dir.join("in.ppm");
        let dst = dir.join("out.png");
        fs::write(&src, "P3\n2 1\n255\n255 0 0 0 255 0\n").unwrap();

        let dims = convert(&src, &dst, &ConvertOptions::default()).unwrap();
        assert_eq!((dims.width(), dims.height()), (2, 1));

        let img = png::PngImage::read_image(fs::File::open(&dst).unwrap()).unwrap();
        assert_eq!(img.pixels.pixel(&dims, 0, 0), Some([255, 0, 0]));
        assert_eq!(img.pixels.pixel(&dims, 1, 0), Some([0, 255, 0]));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_bad_source_creates_nothing() {
        let dir = scratch_dir("bad");
        let src = dir.join("in.ppm");
        let dst = dir.join("out.png");
        fs::write(&src, "P3\n0 1\n255\n").unwrap();

        let e = convert(&src, &dst, &ConvertOptions::default()).unwrap_err();
        assert!(matches!(e, ConvertError::Read(ReadError::BadDimensions { .. })));
        assert!(!dst.exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_unwritable_destination() {
        let dir = scratch_dir("unwritable");
        let src = dir.join("in.ppm");
        fs::write(&src, "P3 1 1 255 1 2 3").unwrap();
        let dst = dir.join("missing").join("out.png");

        let e = convert(&src, &dst, &ConvertOptions::default()).unwrap_err();
        assert!(matches!(e, ConvertError::Write(WriteError::CannotCreate { .. })));
        assert!(!dst.exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_destination_under_regular_file() {
        let dir = scratch_dir("under_file");
        let src = dir.join("in.ppm");
        fs::write(&src, "P3 1 1 255 1 2 3").unwrap();
        let blocker = dir.join("blocker");
        fs::write(&blocker, "").unwrap();
        let dst = blocker.join("out.png");

        let e = convert(&src, &dst, &ConvertOptions::default()).unwrap_err();
        assert!(matches!(e, ConvertError::Write(WriteError::CannotCreate { .. })));
        assert!(!dst.exists());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 2);
        fs::remove_dir_all(&dir).unwrap();
    }
}
