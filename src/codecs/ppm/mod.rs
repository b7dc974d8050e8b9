//! Plain text (`P3`) portable pixmap reading.

mod reader;
mod tokens;

pub use self::reader::{parse, read, PpmImage, MAGIC};
