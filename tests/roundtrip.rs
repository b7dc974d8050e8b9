use std::fs::{self, File};
use std::path::PathBuf;

use polms_ppm2png::codecs::png::{self as png_codec, EncoderOptions, FilterStrategy, FilterType};
use polms_ppm2png::codecs::ppm;
use polms_ppm2png::compress::zlib::CompressionLevel;
use polms_ppm2png::image::{ChannelOrder, ReadImage, RgbImage, WriteImage};
use polms_ppm2png::{convert, ConvertOptions};
use proptest::prelude::*;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("polms_roundtrip_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn ppm_text(width: u32, height: u32, data: &[u8]) -> String {
    let mut s = format!("P3\n{} {}\n255\n", width, height);
    for (i, px) in data.chunks(3).enumerate() {
        s.push_str(&format!("{} {} {}", px[0], px[1], px[2]));
        s.push(if (i + 1) % width as usize == 0 { '\n' } else { ' ' });
    }
    s
}

/// Decodes with the `png` crate: (width, height, rgb bytes).
fn decode_reference(path: &PathBuf) -> (u32, u32, Vec<u8>) {
    let decoder = png::Decoder::new(File::open(path).unwrap());
    let mut reader = decoder.read_info().unwrap();
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).unwrap();
    assert_eq!(info.color_type, png::ColorType::Rgb);
    assert_eq!(info.bit_depth, png::BitDepth::Eight);
    buf.truncate(info.buffer_size());
    (info.width, info.height, buf)
}

#[test]
fn red_then_green() {
    let dir = scratch_dir("red_green");
    let src = dir.join("in.ppm");
    let dst = dir.join("out.png");
    fs::write(&src, "P3\n2 1\n255\n255 0 0 0 255 0\n").unwrap();

    convert(&src, &dst, &ConvertOptions::default()).unwrap();

    let (w, h, data) = decode_reference(&dst);
    assert_eq!((w, h), (2, 1));
    assert_eq!(&data[0..3], &[255, 0, 0]);
    assert_eq!(&data[3..6], &[0, 255, 0]);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn bgr_order_swaps_outer_channels() {
    let dir = scratch_dir("bgr");
    let src = dir.join("in.ppm");
    let dst = dir.join("out.png");
    fs::write(&src, "P3 1 1 255 200 100 50").unwrap();

    let options = ConvertOptions {
        channel_order: ChannelOrder::Bgr,
        ..ConvertOptions::default()
    };
    convert(&src, &dst, &options).unwrap();

    let (_, _, data) = decode_reference(&dst);
    assert_eq!(data, vec![50, 100, 200]);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn larger_image_with_split_idat() {
    let dir = scratch_dir("large");
    let src = dir.join("in.ppm");
    let dst = dir.join("out.png");
    let (width, height) = (64u32, 48u32);
    let data: Vec<u8> = (0..width * height * 3).map(|i| ((i / 3) % 256) as u8 ^ (i % 3) as u8 * 85).collect();
    fs::write(&src, ppm_text(width, height, &data)).unwrap();

    let options = ConvertOptions {
        encoder: EncoderOptions {
            compression: CompressionLevel::FAST,
            filter: FilterStrategy::Fixed(FilterType::Paeth),
            idat_chunk_size: 512,
        },
        ..ConvertOptions::default()
    };
    convert(&src, &dst, &options).unwrap();

    let (w, h, decoded) = decode_reference(&dst);
    assert_eq!((w, h), (width, height));
    assert_eq!(decoded, data);

    let own = png_codec::PngImage::read_image(File::open(&dst).unwrap()).unwrap();
    assert_eq!(own.pixels.as_bytes(), data.as_slice());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn truncated_source_is_zero_filled() {
    let dir = scratch_dir("truncated");
    let src = dir.join("in.ppm");
    let dst = dir.join("out.png");
    fs::write(&src, "P3 2 2 255\n9 8 7\n6 5 4\n").unwrap();

    convert(&src, &dst, &ConvertOptions::default()).unwrap();

    let (_, _, data) = decode_reference(&dst);
    assert_eq!(data, vec![9, 8, 7, 6, 5, 4, 0, 0, 0, 0, 0, 0]);
    fs::remove_dir_all(&dir).unwrap();
}

fn image_strategy() -> impl Strategy<Value = (u32, u32, Vec<u8>)> {
    (1u32..12, 1u32..12).prop_flat_map(|(w, h)| {
        (
            Just(w),
            Just(h),
            prop::collection::vec(any::<u8>(), (w * h * 3) as usize),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn reader_fills_exact_buffer((w, h, data) in image_strategy()) {
        let img = ppm::parse(ppm_text(w, h, &data).as_bytes(), ChannelOrder::Rgb).unwrap();
        prop_assert_eq!(img.pixels.len(), (w * h * 3) as usize);
        prop_assert_eq!(img.pixels.as_bytes(), data.as_slice());
    }

    #[test]
    fn encode_then_reference_decode((w, h, data) in image_strategy()) {
        let img: RgbImage =
            ppm::parse(ppm_text(w, h, &data).as_bytes(), ChannelOrder::Rgb).unwrap().into();
        let mut out: Vec<u8> = Vec::new();
        png_codec::PngEncoder::new(EncoderOptions::default()).write_image(&mut out, &img).unwrap();

        let decoder = png::Decoder::new(out.as_slice());
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        prop_assert_eq!((info.width, info.height), (w, h));
        prop_assert_eq!(&buf[..info.buffer_size()], data.as_slice());

        let own = png_codec::decode(&out).unwrap();
        prop_assert_eq!(own, img);
    }
}
