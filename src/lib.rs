//! # Squeezer
//!
//! Streaming gzip, zlib and raw deflate compression.
//!
//! Callers write arbitrarily sized chunks into a `stream::DeflateStream`, which batches them
//! into blocks, hands each block to a deflate primitive (anything implementing
//! `block::DeflatePart`), threads the bit pointer from one block to the next, and wraps the
//! result in a gzip or zlib container.  One-shot helpers are in `compress`.  The `png` module
//! re-optimizes the deflate stream inside a PNG file.
//!
//! ```
//! use std::io::Write;
//! let mut enc = squeezer::DeflateStream::new(Vec::new(),squeezer::Format::GZip);
//! enc.write_all(b"hello hello hello").unwrap();
//! let gz = enc.finish().unwrap();
//! assert_eq!(&gz[0..2],&[0x1f,0x8b]);
//! ```

mod tools;
pub mod checksum;
pub mod container;
pub mod block;
pub mod engines;
pub mod stream;
pub mod compress;
pub mod png;

pub use compress::{compress,compress_ex,compress_with,compress_reader};
pub use stream::DeflateStream;
pub use png::{PngStream,PngOptions};

use num_derive::FromPrimitive;

/// Size of the pieces a long input is cut into before each call to the deflate primitive
pub const DEFAULT_MASTER_BLOCK_SIZE: usize = 1 << 20;

/// Library errors
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("final data is already written out")]
    AlreadyFinalized,
    #[error("stream is unusable after an earlier error")]
    StreamFailed,
    #[error("required capacity is too large")]
    CapacityOverflow,
    #[error("block range {start}..{end} is outside a buffer of {len} bytes")]
    InvalidRange { start: usize, end: usize, len: usize },
    #[error("deflate primitive failed: {0}")]
    Primitive(String),
    #[error("png optimizer error {code}: {message}")]
    Png { code: u32, message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error)
}

impl From<Error> for std::io::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Io(inner) => inner,
            other => std::io::Error::new(std::io::ErrorKind::Other,other)
        }
    }
}

/// Container wrapped around the deflate stream
#[derive(FromPrimitive,Clone,Copy,Debug,PartialEq,Eq)]
pub enum Format {
    /// 10 byte header, CRC-32 and size footer
    GZip = 0,
    /// 2 byte header, Adler-32 footer
    ZLib = 1,
    /// raw deflate, no framing
    Deflate = 2
}

/// Kind of deflate block requested from the primitive
#[derive(FromPrimitive,Clone,Copy,Debug,PartialEq,Eq)]
pub enum BlockType {
    NoCompress = 0,
    Fixed = 1,
    Dynamic = 2
}

/// Options passed through to the deflate primitive
#[derive(Clone,Debug,PartialEq)]
pub struct Options {
    /// log what the primitive is doing
    pub verbose: bool,
    /// log even more
    pub verbose_more: bool,
    /// iterations of the optimizing parser, more is slower and smaller
    pub num_iterations: u32,
    /// whether the primitive may split its input into several deflate blocks
    pub block_splitting: bool,
    /// maximum number of blocks to split into, 0 means unlimited
    pub block_splitting_max: u32
}

pub const STD_OPTIONS: Options = Options {
    verbose: false,
    verbose_more: false,
    num_iterations: 15,
    block_splitting: true,
    block_splitting_max: 15
};

impl Default for Options {
    fn default() -> Self {
        STD_OPTIONS
    }
}

// *************** TESTS *****************

#[test]
fn numeric_codes() {
    use num_traits::FromPrimitive;
    assert_eq!(Format::from_u8(0),Some(Format::GZip));
    assert_eq!(Format::from_u8(2),Some(Format::Deflate));
    assert_eq!(Format::from_u8(3),None);
    assert_eq!(BlockType::from_i32(1),Some(BlockType::Fixed));
}

#[test]
fn io_error_conversion() {
    let e: std::io::Error = Error::AlreadyFinalized.into();
    assert_eq!(e.kind(),std::io::ErrorKind::Other);
    assert_eq!(e.to_string(),"final data is already written out");
    let e: std::io::Error = Error::StreamFailed.into();
    assert_eq!(e.to_string(),"stream is unusable after an earlier error");
    let inner = std::io::Error::new(std::io::ErrorKind::WriteZero,"full");
    let e: std::io::Error = Error::Io(inner).into();
    assert_eq!(e.kind(),std::io::ErrorKind::WriteZero);
}
