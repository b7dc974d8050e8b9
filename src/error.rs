use std::io;
use std::path::PathBuf;

use miniz_oxide::inflate::TINFLStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Failed to read {}: {source}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to read {}, bad header!", path.display())]
    BadHeader { path: PathBuf },
    #[error("Failed to read {}, bad dimensions!", path.display())]
    BadDimensions { path: PathBuf },
    #[error("Failed to read {}, bad color size!", path.display())]
    BadColorRange { path: PathBuf },
    #[error("Failed to read {}, bad channel value at token {index}!", path.display())]
    BadPixelData { path: PathBuf, index: usize },
}

/// Text image faults found before the source path is known to the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PpmFault {
    BadHeader,
    BadDimensions,
    BadColorRange,
    BadPixelData { index: usize },
}

impl PpmFault {
    pub fn at(self, path: impl Into<PathBuf>) -> ReadError {
        let path = path.into();
        match self {
            PpmFault::BadHeader => ReadError::BadHeader { path },
            PpmFault::BadDimensions => ReadError::BadDimensions { path },
            PpmFault::BadColorRange => ReadError::BadColorRange { path },
            PpmFault::BadPixelData { index } => ReadError::BadPixelData { path, index },
        }
    }
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to create {}: {source}", path.display())]
    CannotCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to create {}, encoder setup failed: {reason}", path.display())]
    EncoderInitFailed { path: PathBuf, reason: String },
    #[error("Failed to write {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Encoder faults raised while serialising into an arbitrary writer.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("{0}")]
    Init(String),
    #[error(transparent)]
    IO(#[from] io::Error),
}

impl EncodingError {
    pub fn at(self, path: impl Into<PathBuf>) -> WriteError {
        let path = path.into();
        match self {
            EncodingError::Init(reason) => WriteError::EncoderInitFailed { path, reason },
            EncodingError::IO(source) => WriteError::WriteFailed { path, source },
        }
    }
}

#[derive(Debug, Error)]
pub enum DecodingError {
    #[error("Decoding Error: {0}")]
    Format(String),
    #[error("Decoding Error: chunk {name} crc mismatch")]
    Crc { name: String },
    #[error("Decoding Error: inflate failed with {0:?}")]
    Compression(TINFLStatus),
    #[error(transparent)]
    IO(#[from] io::Error),
}

impl DecodingError {
    pub fn new(s: &str) -> Self {
        DecodingError::Format(String::from(s))
    }
}

impl From<TINFLStatus> for DecodingError {
    fn from(e: TINFLStatus) -> Self {
        DecodingError::Compression(e)
    }
}

impl From<nom::Err<nom::error::Error<&[u8]>>> for DecodingError {
    fn from(e: nom::Err<nom::error::Error<&[u8]>>) -> Self {
        DecodingError::Format(format!("nom error: {:?}", e.map(|inner| inner.code)))
    }
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error(transparent)]
    Write(#[from] WriteError),
}

#[test]
fn test_fault_carries_path() {
    let e = PpmFault::BadHeader.at("in.ppm");
    assert!(matches!(&e, ReadError::BadHeader { path } if path.to_str() == Some("in.ppm")));
    assert_eq!(e.to_string(), "Failed to read in.ppm, bad header!");
}

#[test]
fn test_encoding_error_mapping() {
    let e = EncodingError::Init("no memory".to_string()).at("out.png");
    assert!(matches!(e, WriteError::EncoderInitFailed { .. }));
    let e = EncodingError::from(io::Error::new(io::ErrorKind::Other, "disk full")).at("out.png");
    assert!(matches!(e, WriteError::WriteFailed { .. }));
}
