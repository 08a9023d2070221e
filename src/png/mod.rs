//! PNG optimizer adapter
//!
//! A PNG optimizer takes a whole file and gives back a whole file, or a numeric error code
//! (see `errors`).  Anything implementing `PngOptimizer` can be used; the crate ships
//! `recompress::IdatRecompressor`.  `PngStream` collects written data and optimizes it once.

pub mod errors;
pub mod recompress;
pub mod stream;

pub use recompress::IdatRecompressor;
pub use stream::PngStream;

use num_derive::FromPrimitive;
use crate::Error;

/// Row filter strategies an optimizer may try
#[derive(FromPrimitive,Clone,Copy,Debug,PartialEq,Eq)]
pub enum FilterStrategy {
    Zero = 0,
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    MinSum = 5,
    Entropy = 6,
    Predefined = 7,
    BruteForce = 8
}

/// Options handed to the optimizer as they are
#[derive(Clone,Debug,PartialEq)]
pub struct PngOptions {
    /// allow altering hidden colors of fully transparent pixels
    pub lossy_transparent: bool,
    /// convert 16-bit per channel images to 8-bit per channel
    pub lossy_8bit: bool,
    /// filter strategies to try
    pub filter_strategies: Vec<FilterStrategy>,
    /// automatically choose filter strategies
    pub auto_filter_strategy: bool,
    /// keep the original color type
    pub keep_color_type: bool,
    /// names of ancillary chunks to keep, everything else is dropped
    pub keep_chunks: Vec<String>,
    /// use the crate's own deflate encoder for image data
    pub use_zopfli: bool,
    /// iterations for small images
    pub num_iterations: u32,
    /// iterations for large images
    pub num_iterations_large: u32
}

pub const STD_PNG_OPTIONS: PngOptions = PngOptions {
    lossy_transparent: false,
    lossy_8bit: false,
    filter_strategies: Vec::new(),
    auto_filter_strategy: true,
    keep_color_type: false,
    keep_chunks: Vec::new(),
    use_zopfli: true,
    num_iterations: 15,
    num_iterations_large: 5
};

impl Default for PngOptions {
    fn default() -> Self {
        STD_PNG_OPTIONS
    }
}

/// Whole file PNG optimizer
pub trait PngOptimizer {
    /// Optimize a complete PNG, the error is a code understood by `errors::describe`
    fn optimize(&self,png: &[u8],options: &PngOptions,verbose: bool) -> Result<Vec<u8>,u32>;
}

/// Optimize with the default optimizer
pub fn optimize_png(png: &[u8],options: &PngOptions) -> Result<Vec<u8>,Error> {
    optimize_png_with(&IdatRecompressor,png,options,false)
}

/// Optimize with any optimizer, codes become `Error::Png`
pub fn optimize_png_with<P: PngOptimizer + ?Sized>(optimizer: &P,png: &[u8],options: &PngOptions,verbose: bool) -> Result<Vec<u8>,Error> {
    optimizer.optimize(png,options,verbose).map_err(errors::to_error)
}

// *************** TESTS *****************

/// PNG from a list of chunks, CRCs filled in
#[cfg(test)]
pub(crate) fn build_png(chunks: &[(&[u8;4],&[u8])]) -> Vec<u8> {
    let mut ans = recompress::SIGNATURE.to_vec();
    for (name,data) in chunks {
        recompress::write_chunk(&mut ans,name,data);
    }
    ans
}

/// 16x16 grayscale image, image data stored uncompressed across two IDAT chunks,
/// `extra` chunks go right after IHDR
#[cfg(test)]
pub(crate) fn sample_png(extra: &[(&[u8;4],&[u8])]) -> (Vec<u8>,Vec<u8>) {
    let mut raw = Vec::new();
    for row in 0..16u8 {
        raw.push(0);
        raw.extend((0..16u8).map(|x| x.wrapping_mul(row) & 0xf0));
    }
    let zdata = crate::compress_ex(&raw,&crate::STD_OPTIONS,crate::Format::ZLib,crate::BlockType::NoCompress,0).unwrap();
    let ihdr = hex::decode("00000010 00000010 08 00 00 00 00".replace(" ","")).unwrap();
    let mut chunks: Vec<(&[u8;4],&[u8])> = vec![(b"IHDR",&ihdr[..])];
    chunks.extend_from_slice(extra);
    chunks.push((b"IDAT",&zdata[..100]));
    chunks.push((b"IDAT",&zdata[100..]));
    chunks.push((b"IEND",&[][..]));
    (build_png(&chunks),raw)
}

#[test]
fn defaults() {
    let opt = PngOptions::default();
    assert!(opt.auto_filter_strategy);
    assert!(opt.use_zopfli);
    assert_eq!(opt.num_iterations,15);
    assert_eq!(opt.num_iterations_large,5);
    assert!(opt.keep_chunks.is_empty());
}

#[test]
fn strategy_codes() {
    use num_traits::FromPrimitive;
    assert_eq!(FilterStrategy::from_u8(5),Some(FilterStrategy::MinSum));
    assert_eq!(FilterStrategy::from_u8(8),Some(FilterStrategy::BruteForce));
    assert_eq!(FilterStrategy::from_u8(9),None);
}

#[test]
fn error_codes_surface() {
    let opt = PngOptions::default();
    match optimize_png(&[1,2,3],&opt) {
        Err(Error::Png { code, message }) => {
            assert_eq!(code,27);
            assert_eq!(message,"PNG file is smaller than a PNG header");
        },
        _ => panic!("expected code 27")
    }
    let mut bad = sample_png(&[]).0;
    bad[1] = b'Q';
    assert!(matches!(optimize_png(&bad,&opt),Err(Error::Png { code: 28, .. })));
    assert!(matches!(optimize_png(&[],&opt),Err(Error::Png { code: 48, .. })));
}

#[test]
fn custom_optimizer() {
    struct Reverse;
    impl PngOptimizer for Reverse {
        fn optimize(&self,png: &[u8],_options: &PngOptions,_verbose: bool) -> Result<Vec<u8>,u32> {
            match png.len() {
                0 => Err(1000),
                _ => Ok(png.iter().rev().copied().collect())
            }
        }
    }
    let opt = PngOptions::default();
    assert_eq!(optimize_png_with(&Reverse,&[1,2,3],&opt,false).unwrap(),vec![3,2,1]);
    match optimize_png_with(&Reverse,&[],&opt,false) {
        Err(Error::Png { code, message }) => {
            assert_eq!(code,1000);
            assert_eq!(message,"unknown error code");
        },
        _ => panic!("expected code 1000")
    }
}
