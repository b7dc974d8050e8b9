//! PNG container: chunk framing, scanline filters, the truecolor encoder and a matching reader.

mod chunk;
mod decode;
mod encode;
mod filter;

pub use self::chunk::{ColorType, PNG_SIGNATURE};
pub use self::decode::{decode, PngImage};
pub use self::encode::{write, EncoderOptions, PngEncoder, DEFAULT_IDAT_CHUNK_SIZE, MAX_IDAT_CHUNK_SIZE};
pub use self::filter::{FilterStrategy, FilterType};
