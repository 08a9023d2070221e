//! Deflate primitives that ship with the crate
//!
//! `Engine` picks a backend by block type:
//! * `NoCompress` writes stored blocks
//! * `Fixed` writes one fixed Huffman block of literals
//! * `Dynamic` hands the span to `flate2`
//!
//! For dynamic blocks `Options::num_iterations` selects the `flate2` level, unless the engine
//! was built with a fixed level.  With `Options::block_splitting` the span is cut into up to
//! `block_splitting_max` pieces of at least `flate::MIN_SPLIT_LEN` bytes, each its own block.
//!
//! None of them look at bytes before `start`, so every call is independent apart from the
//! bit pointer.  Anything else implementing `block::DeflatePart` can be used instead.

pub mod stored;
pub mod fixed;
pub mod flate;

use flate2::Compression;
use crate::block::DeflatePart;
use crate::{Options,BlockType,Error};

/// Default deflate primitive
#[derive(Clone,Debug)]
pub struct Engine {
    level: Option<Compression>
}

impl Engine {
    /// Engine taking the `flate2` level for dynamic blocks from the iteration count
    pub fn new() -> Self {
        Self {
            level: None
        }
    }
    /// Engine using `level` (0-9) for dynamic blocks whatever the iteration count
    pub fn with_level(level: u32) -> Self {
        Self {
            level: Some(Compression::new(level.min(9)))
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl DeflatePart for Engine {
    fn deflate_part(&mut self,options: &Options,block_type: BlockType,is_final: bool,data: &[u8],start: usize,end: usize,bit_pointer: &mut u8,out: &mut Vec<u8>) -> Result<(),Error> {
        let span = match data.get(start..end) {
            Some(s) => s,
            None => return Err(Error::InvalidRange { start, end, len: data.len() })
        };
        if options.verbose {
            log::info!("deflate {} bytes as {:?}, final={}",span.len(),block_type,is_final);
        }
        if options.verbose_more {
            log::info!("incoming bit pointer {}, output so far {}",*bit_pointer,out.len());
        }
        match block_type {
            BlockType::NoCompress => stored::add_stored_blocks(is_final,span,bit_pointer,out),
            BlockType::Fixed => fixed::add_fixed_block(is_final,span,bit_pointer,out),
            BlockType::Dynamic => {
                let level = self.level.unwrap_or_else(|| flate::level_for_iterations(options.num_iterations));
                let pieces = flate::piece_count(span.len(),options.block_splitting,options.block_splitting_max);
                log::trace!("flate2 level {}, {} pieces",level.level(),pieces);
                flate::add_flate_blocks(level,pieces,is_final,span,bit_pointer,out)?
            }
        }
        Ok(())
    }
}

// *************** TESTS *****************

#[cfg(test)]
use std::io::Read;

#[test]
fn mixed_blocks_decode() {
    let data = b"the quick brown fox jumps over the lazy dog, the quick brown fox";
    let mut engine = Engine::new();
    let mut out = Vec::new();
    let mut bp = 0;
    let opt = crate::STD_OPTIONS;
    engine.deflate_part(&opt,BlockType::Fixed,false,data,0,10,&mut bp,&mut out).unwrap();
    assert_ne!(bp,0);
    engine.deflate_part(&opt,BlockType::Fixed,false,data,10,21,&mut bp,&mut out).unwrap();
    engine.deflate_part(&opt,BlockType::NoCompress,false,data,21,30,&mut bp,&mut out).unwrap();
    assert_eq!(bp,0);
    engine.deflate_part(&opt,BlockType::Fixed,false,data,30,33,&mut bp,&mut out).unwrap();
    engine.deflate_part(&opt,BlockType::Dynamic,true,data,33,data.len(),&mut bp,&mut out).unwrap();
    let mut ans = Vec::new();
    flate2::read::DeflateDecoder::new(&out[..]).read_to_end(&mut ans).unwrap();
    assert_eq!(ans,data.to_vec());
}

#[test]
fn options_change_dynamic_output() {
    let words = ["deflate ","stream ","block ","huffman ","literal ","distance ","length\n"];
    let mut seed = 12345u32;
    let mut data = Vec::new();
    while data.len() < 200000 {
        seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
        data.extend_from_slice(words[(seed >> 16) as usize % words.len()].as_bytes());
    }
    let run = |engine: &mut Engine,opt: &Options| {
        let mut out = Vec::new();
        let mut bp = 0;
        engine.deflate_part(opt,BlockType::Dynamic,true,&data,0,data.len(),&mut bp,&mut out).unwrap();
        let mut ans = Vec::new();
        flate2::read::DeflateDecoder::new(&out[..]).read_to_end(&mut ans).unwrap();
        assert_eq!(ans,data);
        out
    };
    let fast = Options { num_iterations: 1, block_splitting: false, ..crate::STD_OPTIONS };
    let slow = Options { num_iterations: 1000, block_splitting: false, ..crate::STD_OPTIONS };
    let split = Options { num_iterations: 1000, block_splitting: true, block_splitting_max: 0, ..crate::STD_OPTIONS };
    let fast_out = run(&mut Engine::new(),&fast);
    let slow_out = run(&mut Engine::new(),&slow);
    let split_out = run(&mut Engine::new(),&split);
    assert_ne!(fast_out,slow_out);
    assert_ne!(slow_out,split_out);
    // a fixed level ignores the iteration count
    assert_eq!(run(&mut Engine::with_level(9),&fast),slow_out);
}

#[test]
fn out_of_range() {
    let mut out = Vec::new();
    let mut bp = 0;
    let res = Engine::new().deflate_part(&crate::STD_OPTIONS,BlockType::Fixed,true,&[0;4],3,9,&mut bp,&mut out);
    assert!(matches!(res,Err(Error::InvalidRange { .. })));
}
