//! Container framing
//!
//! Fixed gzip (RFC 1952) and zlib (RFC 1950) headers and footers.  Raw deflate has neither.
//! The writers work on any `std::io::Write`, so a `&mut [u8]` window into a pre-sized buffer
//! serves as well as a file or a `Vec`.

use std::io::Write;
use crate::Format;

/// compression method, always deflate
const ZLIB_CM: u8 = 8;
/// log2 of the window size minus 8
const ZLIB_CINFO: u8 = 7;
/// compression level hint, 3 is maximum
const ZLIB_FLEVEL: u8 = 3;
/// no preset dictionary
const ZLIB_FDICT: u8 = 0;

const GZIP_ID1: u8 = 0x1f;
const GZIP_ID2: u8 = 0x8b;
const GZIP_CM: u8 = 8;
/// extra flags, 2 means slowest compression
const GZIP_XFL: u8 = 2;
/// operating system, always Unix
const GZIP_OS: u8 = 3;

pub fn header_size(format: Format) -> usize {
    match format {
        Format::GZip => 10,
        Format::ZLib => 2,
        Format::Deflate => 0
    }
}

pub fn footer_size(format: Format) -> usize {
    match format {
        Format::GZip => 8,
        Format::ZLib => 4,
        Format::Deflate => 0
    }
}

/// CMF and FLG bytes, FCHECK makes the big-endian pair a multiple of 31
pub fn zlib_header() -> [u8;2] {
    let cmf = ZLIB_CM | (ZLIB_CINFO << 4);
    let flg = (ZLIB_FLEVEL << 6) | (ZLIB_FDICT << 5);
    let fcheck = 31 - (((cmf as u16) << 8 | flg as u16) % 31);
    [cmf,flg | fcheck as u8]
}

/// no name, no comment, no timestamp
pub fn gzip_header() -> [u8;10] {
    [GZIP_ID1,GZIP_ID2,GZIP_CM,0,0,0,0,0,GZIP_XFL,GZIP_OS]
}

/// Write the header `format` needs, returns bytes written
pub fn write_header<W: Write>(sink: &mut W,format: Format) -> std::io::Result<usize> {
    match format {
        Format::GZip => sink.write_all(&gzip_header())?,
        Format::ZLib => sink.write_all(&zlib_header())?,
        Format::Deflate => {}
    }
    Ok(header_size(format))
}

/// Write the footer `format` needs, returns bytes written.
/// `checksum` must already be finalized, `size` is the uncompressed size mod 2^32.
pub fn write_footer<W: Write>(sink: &mut W,format: Format,checksum: u32,size: u32) -> std::io::Result<usize> {
    match format {
        Format::GZip => {
            sink.write_all(&checksum.to_le_bytes())?;
            sink.write_all(&size.to_le_bytes())?;
        },
        Format::ZLib => sink.write_all(&checksum.to_be_bytes())?,
        Format::Deflate => {}
    }
    Ok(footer_size(format))
}

// *************** TESTS *****************

#[test]
fn zlib_header_bytes() {
    let hdr = zlib_header();
    assert_eq!(hdr,[0x78,0xda]);
    assert_eq!(((hdr[0] as u16) << 8 | hdr[1] as u16) % 31,0);
}

#[test]
fn headers() {
    let mut v = Vec::new();
    assert_eq!(write_header(&mut v,Format::GZip).unwrap(),10);
    assert_eq!(v,hex::decode("1f8b0800 00000000 0203".replace(" ","")).unwrap());
    let mut v = Vec::new();
    assert_eq!(write_header(&mut v,Format::Deflate).unwrap(),0);
    assert!(v.is_empty());
}

#[test]
fn footers() {
    let mut v = Vec::new();
    assert_eq!(write_footer(&mut v,Format::GZip,0xCBF43926,9).unwrap(),8);
    assert_eq!(v,hex::decode("2639f4cb 09000000".replace(" ","")).unwrap());
    let mut v = Vec::new();
    assert_eq!(write_footer(&mut v,Format::ZLib,0x091E01DE,9).unwrap(),4);
    assert_eq!(v,hex::decode("091e01de").unwrap());
    let mut v = Vec::new();
    assert_eq!(write_footer(&mut v,Format::Deflate,1,1).unwrap(),0);
    assert!(v.is_empty());
}

#[test]
fn into_window() {
    let mut buf = [0u8;16];
    let n = write_header(&mut &mut buf[3..],Format::ZLib).unwrap();
    assert_eq!(n,header_size(Format::ZLib));
    assert_eq!(&buf[3..5],&[0x78,0xda]);
    let mut too_small = [0u8;4];
    assert!(write_footer(&mut &mut too_small[..],Format::GZip,0,0).is_err());
}
