//! Converts plain text `P3` pixmaps into 8-bit truecolor PNG files.

#[macro_use]
extern crate log;

pub mod codecs;
pub mod compress;
pub mod convert;
pub mod error;
pub mod image;
pub mod output;

pub use crate::convert::{convert, ConvertOptions};
pub use crate::error::{ConvertError, ReadError, WriteError};
