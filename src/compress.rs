//! One-shot compression
//!
//! The whole input is in memory, so the header, the master blocks and the footer are
//! assembled into one `Vec`.  `compress_reader` is the streaming counterpart used by the CLI.

use std::io::{Read,Write};
use crate::block::{self,DeflatePart};
use crate::checksum::ChecksumState;
use crate::engines::Engine;
use crate::stream::DeflateStream;
use crate::{container,BlockType,Error,Format,Options,DEFAULT_MASTER_BLOCK_SIZE};

/// Compress `data` into `format` with dynamic blocks and the default master block size
pub fn compress(data: &[u8],options: &Options,format: Format) -> Result<Vec<u8>,Error> {
    compress_ex(data,options,format,BlockType::Dynamic,DEFAULT_MASTER_BLOCK_SIZE)
}

/// Compress with an explicit block type and master block size, 0 disables splitting
pub fn compress_ex(data: &[u8],options: &Options,format: Format,block_type: BlockType,master_block_size: usize) -> Result<Vec<u8>,Error> {
    compress_with(&mut Engine::new(),data,options,format,block_type,master_block_size)
}

/// Same as `compress_ex` with a caller supplied primitive
pub fn compress_with<E: DeflatePart + ?Sized>(engine: &mut E,data: &[u8],options: &Options,format: Format,block_type: BlockType,master_block_size: usize) -> Result<Vec<u8>,Error> {
    let mut ans = Vec::with_capacity(container::header_size(format) + data.len() / 2 + container::footer_size(format) + 64);
    container::write_header(&mut ans,format)?;
    let mut bit_pointer = 0;
    block::compress_range(engine,options,block_type,data,master_block_size,&mut bit_pointer,&mut ans)?;
    let mut checksum = ChecksumState::for_format(format);
    checksum.update(data);
    container::write_footer(&mut ans,format,checksum.value(),data.len() as u32)?;
    log::debug!("compressed {} bytes into {}",data.len(),ans.len());
    Ok(ans)
}

/// Stream everything from `reader` through a `DeflateStream` into `writer`.
/// Returns (bytes read, bytes written).
pub fn compress_reader<R,W>(reader: &mut R,writer: &mut W,options: &Options,format: Format,stream_options: &crate::stream::Options) -> Result<(u64,u64),Error>
where R: Read, W: Write {
    let mut enc = DeflateStream::with_options(&mut *writer,options,format,stream_options);
    let in_size = std::io::copy(reader,&mut enc)?;
    enc.finalize()?;
    Ok((in_size,enc.bytes_out()))
}

// *************** TESTS *****************

#[cfg(test)]
use proptest::prelude::*;

#[cfg(test)]
fn decode(format: Format,buf: &[u8]) -> Vec<u8> {
    let mut ans = Vec::new();
    match format {
        Format::GZip => flate2::read::GzDecoder::new(buf).read_to_end(&mut ans).unwrap(),
        Format::ZLib => flate2::read::ZlibDecoder::new(buf).read_to_end(&mut ans).unwrap(),
        Format::Deflate => flate2::read::DeflateDecoder::new(buf).read_to_end(&mut ans).unwrap()
    };
    ans
}

#[test]
fn empty_gzip() {
    let out = compress(&[],&crate::STD_OPTIONS,Format::GZip).unwrap();
    assert_eq!(&out[..10],&hex::decode("1f8b08000000000002 03".replace(" ","")).unwrap()[..]);
    assert_eq!(&out[out.len()-8..],&[0;8]);
    assert!(decode(Format::GZip,&out).is_empty());
}

#[test]
fn stored_zlib_exact() {
    let out = compress_ex(b"123456789",&crate::STD_OPTIONS,Format::ZLib,BlockType::NoCompress,0).unwrap();
    let expected = hex::decode("78da 01 0900 f6ff 313233343536373839 091e01de".replace(" ","")).unwrap();
    assert_eq!(out,expected);
}

#[test]
fn gzip_footer_fields() {
    let data = vec![0x5a;70000];
    let out = compress_ex(&data,&crate::STD_OPTIONS,Format::GZip,BlockType::Dynamic,30000).unwrap();
    let n = out.len();
    assert_eq!(out[n-8..n-4],crate::checksum::crc32::compute(&data).to_le_bytes());
    assert_eq!(out[n-4..],70000u32.to_le_bytes());
    assert_eq!(decode(Format::GZip,&out),data);
}

#[test]
fn block_types_round_trip() {
    let data: Vec<u8> = (0..200000u32).map(|i| ((i / 3) % 256) as u8 ^ (i % 7) as u8).collect();
    for block_type in [BlockType::NoCompress,BlockType::Fixed,BlockType::Dynamic] {
        for format in [Format::GZip,Format::ZLib,Format::Deflate] {
            let out = compress_ex(&data,&crate::STD_OPTIONS,format,block_type,65536).unwrap();
            assert_eq!(decode(format,&out),data);
        }
    }
}

#[test]
fn options_reach_the_engine() {
    let data: Vec<u8> = (0..200000u32).map(|i| b"abcdefghij"[(i.wrapping_mul(2654435761) >> 28) as usize % 10]).collect();
    let quick = Options { num_iterations: 1, block_splitting: false, ..crate::STD_OPTIONS };
    let thorough = Options { num_iterations: 1000, block_splitting_max: 0, ..crate::STD_OPTIONS };
    let a = compress(&data,&quick,Format::GZip).unwrap();
    let b = compress(&data,&thorough,Format::GZip).unwrap();
    assert_ne!(a,b);
    assert_eq!(decode(Format::GZip,&a),data);
    assert_eq!(decode(Format::GZip,&b),data);
}

#[test]
fn reader_to_writer() {
    let data = b"compress me, compress me, compress me".repeat(100);
    let mut out = Vec::new();
    let (in_size,out_size) = compress_reader(&mut &data[..],&mut out,&crate::STD_OPTIONS,Format::ZLib,&crate::stream::STD_OPTIONS).unwrap();
    assert_eq!(in_size,data.len() as u64);
    assert_eq!(out_size,out.len() as u64);
    assert_eq!(decode(Format::ZLib,&out),data);
}

#[cfg(test)]
proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]
    #[test]
    fn round_trip(data in proptest::collection::vec(any::<u8>(),0..5000),master in 0usize..3000) {
        for format in [Format::GZip,Format::ZLib,Format::Deflate] {
            for block_type in [BlockType::NoCompress,BlockType::Fixed,BlockType::Dynamic] {
                let out = compress_ex(&data,&crate::STD_OPTIONS,format,block_type,master).unwrap();
                prop_assert_eq!(decode(format,&out),data.clone());
            }
        }
    }
}
