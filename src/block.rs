//! Block compression driver
//!
//! Deflate blocks are not byte aligned.  Each call into the primitive continues at the bit
//! pointer left by the previous call and returns the new one, and the driver threads it
//! through.  `compress_range` cuts long inputs into master blocks so no single call sees
//! more than `master_block_size` bytes, which gives the same stream as one large call but
//! bounds memory.

use crate::{Options,BlockType,Error};

/// Something that can compress part of a buffer into a growing deflate stream.
pub trait DeflatePart {
    /// Compress `data[start..end]` and append the bits to `out`.
    /// Bytes before `start` may be used as history.  If `bit_pointer` is nonzero the first
    /// bits go into the unused high bits of the last byte of `out`.  On return `bit_pointer`
    /// gives the position after the last bit written.
    #[allow(clippy::too_many_arguments)]
    fn deflate_part(&mut self,options: &Options,block_type: BlockType,is_final: bool,data: &[u8],start: usize,end: usize,bit_pointer: &mut u8,out: &mut Vec<u8>) -> Result<(),Error>;
}

impl<T: DeflatePart + ?Sized> DeflatePart for &mut T {
    fn deflate_part(&mut self,options: &Options,block_type: BlockType,is_final: bool,data: &[u8],start: usize,end: usize,bit_pointer: &mut u8,out: &mut Vec<u8>) -> Result<(),Error> {
        (**self).deflate_part(options,block_type,is_final,data,start,end,bit_pointer,out)
    }
}

/// Check the span and make one call into the primitive, returns the number of bytes `out` grew by.
#[allow(clippy::too_many_arguments)]
pub fn compress_block<E: DeflatePart + ?Sized>(engine: &mut E,options: &Options,block_type: BlockType,is_final: bool,data: &[u8],start: usize,end: usize,bit_pointer: &mut u8,out: &mut Vec<u8>) -> Result<usize,Error> {
    if start > end || end > data.len() {
        return Err(Error::InvalidRange { start, end, len: data.len() });
    }
    let before = out.len();
    engine.deflate_part(options,block_type,is_final,data,start,end,bit_pointer,out)?;
    let produced = out.len().saturating_sub(before);
    log::debug!("block {}..{} final={} produced {} bytes, bit pointer {}",start,end,is_final,produced,*bit_pointer);
    Ok(produced)
}

/// Compress all of `data` in pieces of at most `master_block_size` bytes (0 means one piece).
/// Only the last piece is final.  Empty input still makes one final call with an empty span,
/// so the stream is always terminated.
#[allow(clippy::too_many_arguments)]
pub fn compress_range<E: DeflatePart + ?Sized>(engine: &mut E,options: &Options,block_type: BlockType,data: &[u8],master_block_size: usize,bit_pointer: &mut u8,out: &mut Vec<u8>) -> Result<(),Error> {
    let mut start = 0;
    loop {
        let remaining = data.len() - start;
        let size = match master_block_size {
            0 => remaining,
            master => remaining.min(master)
        };
        let is_final = remaining - size == 0;
        compress_block(engine,options,block_type,is_final,data,start,start + size,bit_pointer,out)?;
        start += size;
        if is_final {
            return Ok(());
        }
    }
}

// *************** TESTS *****************

/// Records each call and writes a 3 bit marker so the bit pointer moves
#[cfg(test)]
struct Recorder {
    calls: Vec<(usize,usize,bool,u8)>
}

#[cfg(test)]
impl DeflatePart for Recorder {
    fn deflate_part(&mut self,_options: &Options,_block_type: BlockType,is_final: bool,_data: &[u8],start: usize,end: usize,bit_pointer: &mut u8,out: &mut Vec<u8>) -> Result<(),Error> {
        self.calls.push((start,end,is_final,*bit_pointer));
        crate::tools::bit_writer::add_bits(0b101,3,bit_pointer,out);
        Ok(())
    }
}

#[test]
fn master_block_split() {
    let data = [0u8;10];
    let mut rec = Recorder { calls: Vec::new() };
    let mut bp = 0;
    let mut out = Vec::new();
    compress_range(&mut rec,&crate::STD_OPTIONS,BlockType::Dynamic,&data,4,&mut bp,&mut out).unwrap();
    assert_eq!(rec.calls,vec![(0,4,false,0),(4,8,false,3),(8,10,true,6)]);
    assert_eq!(bp,1);
    assert_eq!(out.len(),2);
}

#[test]
fn exact_multiple() {
    let data = [0u8;8];
    let mut rec = Recorder { calls: Vec::new() };
    let mut bp = 0;
    compress_range(&mut rec,&crate::STD_OPTIONS,BlockType::Dynamic,&data,4,&mut bp,&mut Vec::new()).unwrap();
    assert_eq!(rec.calls,vec![(0,4,false,0),(4,8,true,3)]);
}

#[test]
fn empty_and_unsplit() {
    let mut rec = Recorder { calls: Vec::new() };
    let mut bp = 0;
    compress_range(&mut rec,&crate::STD_OPTIONS,BlockType::Dynamic,&[],4,&mut bp,&mut Vec::new()).unwrap();
    assert_eq!(rec.calls,vec![(0,0,true,0)]);
    let mut rec = Recorder { calls: Vec::new() };
    compress_range(&mut rec,&crate::STD_OPTIONS,BlockType::Dynamic,&[1,2,3,4,5],0,&mut bp,&mut Vec::new()).unwrap();
    assert_eq!(rec.calls,vec![(0,5,true,3)]);
}

#[test]
fn bad_range() {
    let mut rec = Recorder { calls: Vec::new() };
    let mut bp = 0;
    let res = compress_block(&mut rec,&crate::STD_OPTIONS,BlockType::Fixed,true,&[1,2,3],2,5,&mut bp,&mut Vec::new());
    assert!(matches!(res,Err(Error::InvalidRange { start: 2, end: 5, len: 3 })));
    assert!(rec.calls.is_empty());
}
