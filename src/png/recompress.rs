//! Default PNG optimizer
//!
//! Checks the chunk structure, joins the IDAT chunks, inflates the image data and deflates
//! it again.  The output keeps IHDR, PLTE, tRNS and IEND, one IDAT at the position of the
//! first one, and the ancillary chunks named in `keep_chunks`, all in their original order.
//! Pixel level settings (filters, color type, lossy modes) are left to richer optimizers.

use std::io::{Read,Write};
use crate::checksum::crc32;
use crate::Format;
use super::{PngOptimizer,PngOptions};

pub const SIGNATURE: [u8;8] = [0x89,b'P',b'N',b'G',0x0d,0x0a,0x1a,0x0a];
const MAX_CHUNK_LEN: u32 = 0x7fffffff;
/// signature plus a complete IHDR chunk
const MIN_PNG_LEN: usize = 33;
/// inflated image data above this size counts as a large image
pub const LARGE_IMAGE: usize = 250000;

/// Optimizer that only recompresses the image data
#[derive(Clone,Copy,Debug,Default)]
pub struct IdatRecompressor;

struct Chunk<'a> {
    name: [u8;4],
    data: &'a [u8]
}

impl Chunk<'_> {
    fn is_critical(&self) -> bool {
        self.name[0] & 0x20 == 0
    }
}

fn be32(buf: &[u8]) -> u32 {
    u32::from_be_bytes([buf[0],buf[1],buf[2],buf[3]])
}

/// Append a chunk with its length and CRC
pub(crate) fn write_chunk(out: &mut Vec<u8>,name: &[u8;4],data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(name);
    out.extend_from_slice(data);
    let crc = crc32::update(crc32::update(crc32::INITIAL_VALUE,name),data);
    out.extend_from_slice(&crc32::finalize(crc).to_be_bytes());
}

/// Split the file into chunks up to and including IEND
fn parse(png: &[u8]) -> Result<Vec<Chunk<'_>>,u32> {
    if png.is_empty() {
        return Err(48);
    }
    if png.len() < MIN_PNG_LEN {
        return Err(27);
    }
    if png[0..8] != SIGNATURE {
        return Err(28);
    }
    if &png[12..16] != b"IHDR" {
        return Err(29);
    }
    if be32(&png[8..12]) != 13 {
        return Err(94);
    }
    if be32(&png[16..20]) == 0 || be32(&png[20..24]) == 0 {
        return Err(93);
    }
    let mut ans = Vec::new();
    let mut pos = 8;
    loop {
        if pos + 12 > png.len() {
            return Err(30);
        }
        let len = be32(&png[pos..pos+4]);
        if len > MAX_CHUNK_LEN {
            return Err(63);
        }
        let end = pos + 12 + len as usize;
        if end > png.len() {
            return Err(30);
        }
        if crc32::compute(&png[pos+4..end-4]) != be32(&png[end-4..end]) {
            return Err(57);
        }
        let chunk = Chunk {
            name: [png[pos+4],png[pos+5],png[pos+6],png[pos+7]],
            data: &png[pos+8..end-4]
        };
        if chunk.is_critical() && !matches!(&chunk.name,b"IHDR" | b"PLTE" | b"IDAT" | b"IEND") {
            return Err(69);
        }
        log::trace!("chunk {} with {} bytes",String::from_utf8_lossy(&chunk.name),len);
        let last = &chunk.name == b"IEND";
        ans.push(chunk);
        pos = end;
        if last {
            return Ok(ans);
        }
    }
}

fn inflate(zdata: &[u8]) -> Result<Vec<u8>,u32> {
    if zdata.len() < 2 {
        return Err(53);
    }
    let (cmf,flg) = (zdata[0],zdata[1]);
    if ((cmf as u16) << 8 | flg as u16) % 31 != 0 {
        return Err(24);
    }
    if cmf & 0x0f != 8 || cmf >> 4 > 7 {
        return Err(25);
    }
    if flg & 0x20 != 0 {
        return Err(26);
    }
    let mut ans = Vec::new();
    match flate2::read::ZlibDecoder::new(zdata).read_to_end(&mut ans) {
        Ok(_) => Ok(ans),
        Err(_) => Err(110)
    }
}

fn deflate(raw: &[u8],options: &PngOptions,verbose: bool) -> Result<Vec<u8>,u32> {
    let num_iterations = match raw.len() > LARGE_IMAGE {
        true => options.num_iterations_large,
        false => options.num_iterations
    };
    if options.use_zopfli {
        let opt = crate::Options {
            verbose,
            num_iterations,
            ..crate::STD_OPTIONS
        };
        return crate::compress(raw,&opt,Format::ZLib).map_err(|_| 111);
    }
    let mut enc = flate2::write::ZlibEncoder::new(Vec::new(),flate2::Compression::default());
    if enc.write_all(raw).is_err() {
        return Err(111);
    }
    enc.finish().map_err(|_| 111)
}

impl PngOptimizer for IdatRecompressor {
    fn optimize(&self,png: &[u8],options: &PngOptions,verbose: bool) -> Result<Vec<u8>,u32> {
        let chunks = parse(png)?;
        let zdata: Vec<u8> = chunks.iter()
            .filter(|c| &c.name == b"IDAT")
            .flat_map(|c| c.data.iter().copied())
            .collect();
        let raw = inflate(&zdata)?;
        let idat = deflate(&raw,options,verbose)?;
        if verbose {
            log::info!("image data {} bytes, deflated from {} to {}",raw.len(),zdata.len(),idat.len());
        }
        let mut ans = SIGNATURE.to_vec();
        let mut idat_written = false;
        for chunk in &chunks {
            match &chunk.name {
                b"IDAT" => {
                    if !idat_written {
                        write_chunk(&mut ans,b"IDAT",&idat);
                        idat_written = true;
                    }
                },
                b"IHDR" | b"PLTE" | b"tRNS" | b"IEND" => write_chunk(&mut ans,&chunk.name,chunk.data),
                name => {
                    if options.keep_chunks.iter().any(|k| k.as_bytes() == &name[..]) {
                        write_chunk(&mut ans,name,chunk.data);
                    } else {
                        log::debug!("dropping chunk {}",String::from_utf8_lossy(name));
                    }
                }
            }
        }
        Ok(ans)
    }
}

// *************** TESTS *****************

#[cfg(test)]
use super::{build_png,sample_png,STD_PNG_OPTIONS};

#[cfg(test)]
fn optimize(png: &[u8]) -> Result<Vec<u8>,u32> {
    IdatRecompressor.optimize(png,&STD_PNG_OPTIONS,false)
}

#[cfg(test)]
fn chunk_names(png: &[u8]) -> Vec<String> {
    parse(png).unwrap().iter().map(|c| String::from_utf8_lossy(&c.name).to_string()).collect()
}

#[test]
fn recompress_and_strip() {
    let (png,raw) = sample_png(&[(b"tEXt",&b"Comment\0hello"[..]),(b"gAMA",&[0,0,0xb1,0x8f])]);
    let out = optimize(&png).unwrap();
    assert!(out.len() < png.len());
    assert_eq!(chunk_names(&out),vec!["IHDR","IDAT","IEND"]);
    let chunks = parse(&out).unwrap();
    assert_eq!(inflate(chunks[1].data).unwrap(),raw);
}

#[test]
fn keep_listed_chunks() {
    let (png,_raw) = sample_png(&[(b"tEXt",&b"Comment\0hello"[..]),(b"gAMA",&[0,0,0xb1,0x8f])]);
    let opt = PngOptions { keep_chunks: vec!["gAMA".to_string()], use_zopfli: false, ..STD_PNG_OPTIONS };
    let out = IdatRecompressor.optimize(&png,&opt,true).unwrap();
    assert_eq!(chunk_names(&out),vec!["IHDR","gAMA","IDAT","IEND"]);
}

#[test]
fn container_errors() {
    let (png,_raw) = sample_png(&[]);
    assert_eq!(optimize(&[]),Err(48));
    assert_eq!(optimize(&png[..32]),Err(27));
    let mut bad = png.clone();
    bad[0] = 0x88;
    assert_eq!(optimize(&bad),Err(28));
    let mut bad = png.clone();
    bad[20] ^= 1;
    assert_eq!(optimize(&bad),Err(57));
    assert_eq!(optimize(&png[..png.len()-12]),Err(30));
    assert_eq!(optimize(&png[..png.len()-3]),Err(30));
}

#[test]
fn header_errors() {
    let not_ihdr = build_png(&[(b"tEXt",&b"0123456789abc"[..]),(b"IEND",&[])]);
    assert_eq!(optimize(&not_ihdr),Err(29));
    let short_ihdr = build_png(&[(b"IHDR",&b"0123456789ab"[..]),(b"IEND",&[]),(b"IEND",&[])]);
    assert_eq!(optimize(&short_ihdr),Err(94));
    let zero = build_png(&[(b"IHDR",&[0,0,0,0,0,0,0,1,8,0,0,0,0]),(b"IEND",&[])]);
    assert_eq!(optimize(&zero),Err(93));
}

#[test]
fn chunk_errors() {
    let ihdr: [u8;13] = [0,0,0,1,0,0,0,1,8,0,0,0,0];
    let unknown = build_png(&[(b"IHDR",&ihdr),(b"ABCD",&[1]),(b"IEND",&[])]);
    assert_eq!(optimize(&unknown),Err(69));
    let no_idat = build_png(&[(b"IHDR",&ihdr),(b"IEND",&[])]);
    assert_eq!(optimize(&no_idat),Err(53));
    let bad_check = build_png(&[(b"IHDR",&ihdr),(b"IDAT",&[0x78,0xdb,0,0]),(b"IEND",&[])]);
    assert_eq!(optimize(&bad_check),Err(24));
    let bad_method = build_png(&[(b"IHDR",&ihdr),(b"IDAT",&[0x79,0x18,0,0]),(b"IEND",&[])]);
    assert_eq!(optimize(&bad_method),Err(25));
    let dict = build_png(&[(b"IHDR",&ihdr),(b"IDAT",&[0x78,0xbb,0,0]),(b"IEND",&[])]);
    assert_eq!(optimize(&dict),Err(26));
    let garbage = build_png(&[(b"IHDR",&ihdr),(b"IDAT",&[0x78,0xda,0xff,0xff,0xff]),(b"IEND",&[])]);
    assert_eq!(optimize(&garbage),Err(110));
}

#[test]
fn large_image_iterations() {
    let mut seed = 7u32;
    let raw: Vec<u8> = (0..LARGE_IMAGE + 1000).map(|_| {
        seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
        b"\x00\x10\x20\x30\x40"[(seed >> 16) as usize % 5]
    }).collect();
    let quick = PngOptions { num_iterations_large: 1, ..STD_PNG_OPTIONS };
    let thorough = PngOptions { num_iterations_large: 15, ..STD_PNG_OPTIONS };
    assert_ne!(deflate(&raw,&quick,false).unwrap(),deflate(&raw,&thorough,false).unwrap());
    // small images use num_iterations only
    let small = &raw[..1000];
    assert_eq!(deflate(small,&quick,false).unwrap(),deflate(small,&thorough,false).unwrap());
    assert_eq!(inflate(&deflate(&raw,&quick,false).unwrap()).unwrap(),raw);
}
