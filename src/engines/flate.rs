//! Dynamic Huffman blocks from `flate2`
//!
//! Each call runs a fresh raw deflate compressor over its span.  The span may be cut into
//! several pieces, each ended by a sync flush, which forces a new block with its own code
//! tables while keeping the history of the earlier pieces.  Non-final spans also end with a
//! sync flush so the stream is byte aligned when the next span starts.

use flate2::{Compress,Compression,FlushCompress,Status};
use crate::Error;
use super::stored;

/// Pieces shorter than this are not split off
pub const MIN_SPLIT_LEN: usize = 16384;

/// `flate2` level standing in for an iteration count, at least 1 and at most 9
pub fn level_for_iterations(num_iterations: u32) -> Compression {
    Compression::new(num_iterations.clamp(1,9))
}

/// Number of pieces a span of `len` bytes is cut into, `max` of 0 means unlimited
pub fn piece_count(len: usize,splitting: bool,max: u32) -> usize {
    if !splitting {
        return 1;
    }
    let count = (len / MIN_SPLIT_LEN).max(1);
    match max {
        0 => count,
        m => count.min(m as usize)
    }
}

fn run(comp: &mut Compress,input: &[u8],flush: FlushCompress,out: &mut Vec<u8>) -> Result<(),Error> {
    let base = comp.total_in();
    let finishing = matches!(flush,FlushCompress::Finish);
    loop {
        let consumed = (comp.total_in() - base) as usize;
        out.reserve(input.len() - consumed + input.len() / 16 + 64);
        let status = comp.compress_vec(&input[consumed..],out,flush).map_err(|e| Error::Primitive(e.to_string()))?;
        match status {
            Status::StreamEnd => return Ok(()),
            Status::Ok | Status::BufError => {
                if !finishing && (comp.total_in() - base) as usize == input.len() && out.len() < out.capacity() {
                    return Ok(());
                }
            }
        }
    }
}

/// Append `data` as `pieces` or more dynamic blocks, always leaves `bit_pointer` at 0.
pub fn add_flate_blocks(level: Compression,pieces: usize,is_final: bool,data: &[u8],bit_pointer: &mut u8,out: &mut Vec<u8>) -> Result<(),Error> {
    if *bit_pointer != 0 {
        // flate2 can only start on a byte boundary
        stored::add_stored_blocks(false,&[],bit_pointer,out);
    }
    let pieces = pieces.max(1);
    let piece_len = data.len().div_ceil(pieces).max(1);
    let last_flush = match is_final {
        true => FlushCompress::Finish,
        false => FlushCompress::Sync
    };
    let mut comp = Compress::new(level,false);
    let mut chunks = data.chunks(piece_len).peekable();
    if chunks.peek().is_none() {
        run(&mut comp,&[],last_flush,out)?;
    }
    while let Some(chunk) = chunks.next() {
        let flush = match chunks.peek() {
            Some(_) => FlushCompress::Sync,
            None => last_flush
        };
        run(&mut comp,chunk,flush,out)?;
    }
    *bit_pointer = 0;
    Ok(())
}

#[cfg(test)]
use std::io::Read;

#[cfg(test)]
fn inflate(buf: &[u8]) -> Vec<u8> {
    let mut ans = Vec::new();
    flate2::read::DeflateDecoder::new(buf).read_to_end(&mut ans).unwrap();
    ans
}

#[test]
fn sync_then_finish() {
    let mut out = Vec::new();
    let mut bp = 0;
    add_flate_blocks(Compression::best(),1,false,b"abcabcabc",&mut bp,&mut out).unwrap();
    assert_eq!(&out[out.len()-4..],&[0x00,0x00,0xff,0xff]);
    add_flate_blocks(Compression::best(),1,true,b"abc",&mut bp,&mut out).unwrap();
    assert_eq!(inflate(&out),b"abcabcabcabc");
}

#[test]
fn empty_final() {
    let mut out = Vec::new();
    let mut bp = 0;
    add_flate_blocks(Compression::best(),1,true,&[],&mut bp,&mut out).unwrap();
    assert!(inflate(&out).is_empty());
    let mut out = Vec::new();
    add_flate_blocks(Compression::best(),4,true,&[],&mut bp,&mut out).unwrap();
    assert!(inflate(&out).is_empty());
}

#[test]
fn pieces() {
    assert_eq!(piece_count(200000,false,15),1);
    assert_eq!(piece_count(200000,true,15),12);
    assert_eq!(piece_count(200000,true,4),4);
    assert_eq!(piece_count(200000,true,0),12);
    assert_eq!(piece_count(100,true,15),1);
    assert_eq!(level_for_iterations(0).level(),1);
    assert_eq!(level_for_iterations(5).level(),5);
    assert_eq!(level_for_iterations(15).level(),9);
}

#[test]
fn split_span_decodes() {
    let data: Vec<u8> = (0..100000u32).map(|i| (i % 251) as u8 ^ (i / 1000) as u8).collect();
    let mut whole = Vec::new();
    let mut bp = 0;
    add_flate_blocks(Compression::best(),1,true,&data,&mut bp,&mut whole).unwrap();
    let mut split = Vec::new();
    add_flate_blocks(Compression::best(),6,true,&data,&mut bp,&mut split).unwrap();
    assert_ne!(whole,split);
    assert_eq!(inflate(&whole),data);
    assert_eq!(inflate(&split),data);
    // bit pointer left inside a byte by earlier output
    let mut out = Vec::new();
    let mut bp = 0;
    // empty fixed block, 3 header bits and a 7 bit end code
    crate::tools::bit_writer::add_bits(0b010,3,&mut bp,&mut out);
    crate::tools::bit_writer::add_bits(0,7,&mut bp,&mut out);
    add_flate_blocks(Compression::fast(),3,true,&data,&mut bp,&mut out).unwrap();
    assert_eq!(bp,0);
    assert_eq!(inflate(&out),data);
}
