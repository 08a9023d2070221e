//! Checksums carried in container footers
//!
//! gzip uses CRC-32, zlib uses Adler-32, raw deflate has none.  `ChecksumState` tracks
//! whichever one the container needs while data is written.

pub mod crc32;
pub mod adler32;

use crate::Format;

/// Running checksum accumulator for one stream
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum ChecksumState {
    Crc32(u32),
    Adler32(u32),
    None
}

impl ChecksumState {
    /// Fresh accumulator at the initial value of the algorithm `format` uses
    pub fn for_format(format: Format) -> Self {
        match format {
            Format::GZip => Self::Crc32(crc32::INITIAL_VALUE),
            Format::ZLib => Self::Adler32(adler32::INITIAL_VALUE),
            Format::Deflate => Self::None
        }
    }
    /// Feed bytes in the order they were written
    pub fn update(&mut self,buf: &[u8]) {
        match self {
            Self::Crc32(crc) => *crc = crc32::update(*crc,buf),
            Self::Adler32(adler) => *adler = adler32::update(*adler,buf),
            Self::None => {}
        }
    }
    /// Finalized checksum of everything fed so far, the accumulator is left alone
    pub fn value(&self) -> u32 {
        match self {
            Self::Crc32(crc) => crc32::finalize(*crc),
            Self::Adler32(adler) => adler32::finalize(*adler),
            Self::None => 0
        }
    }
}

#[test]
fn state_per_format() {
    let mut gz = ChecksumState::for_format(Format::GZip);
    let mut z = ChecksumState::for_format(Format::ZLib);
    let mut raw = ChecksumState::for_format(Format::Deflate);
    assert_eq!(gz.value(),0);
    assert_eq!(z.value(),1);
    for s in [&mut gz,&mut z,&mut raw] {
        s.update(b"12345");
        s.update(b"6789");
    }
    assert_eq!(gz.value(),0xCBF43926);
    assert_eq!(gz.value(),0xCBF43926);
    assert_eq!(z.value(),adler32::compute(b"123456789"));
    assert_eq!(raw,ChecksumState::None);
    assert_eq!(raw.value(),0);
}
