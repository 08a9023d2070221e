//! Streaming encoder
//!
//! `DeflateStream` is a `std::io::Write` that produces a gzip, zlib or raw deflate stream
//! on the sink it owns.
//!
//! * The header goes to the sink on the first write (or at finalization if nothing was written).
//! * Written bytes update the checksum immediately, then collect in a cache.  When the cache
//!   is full and more data arrives the cache is compressed as a non-final block.
//! * With `cache_size == 0` every write is compressed as it arrives.
//! * `finalize` compresses what is left as the final block, sends the compressed data and
//!   writes the footer.  Dropping the stream finalizes it if that has not happened.
//!
//! Compressed data normally stays in memory until finalization.  With `write_immediately`
//! each block goes to the sink as soon as it is produced, except a trailing partial byte,
//! which the next block still has to write into.
//!
//! An error from the primitive or the sink is fatal.  The cached bytes are already in the
//! checksum, so the stream cannot be completed.  Every later write, flush or finalize fails
//! with `Error::StreamFailed` and dropping the stream writes nothing more.

use std::io::Write;
use crate::block::{self,DeflatePart};
use crate::checksum::ChecksumState;
use crate::engines::Engine;
use crate::tools::growth;
use crate::{container,BlockType,Error,Format};

pub const DEFAULT_CACHE_SIZE: usize = crate::DEFAULT_MASTER_BLOCK_SIZE;

/// Encoder configuration
#[derive(Clone,Debug,PartialEq)]
pub struct Options {
    /// ceiling of the input cache, 0 compresses each write as it comes
    pub cache_size: usize,
    /// send compressed blocks to the sink as they are produced
    pub write_immediately: bool,
    /// block type requested from the primitive
    pub block_type: BlockType
}

pub const STD_OPTIONS: Options = Options {
    cache_size: DEFAULT_CACHE_SIZE,
    write_immediately: false,
    block_type: BlockType::Dynamic
};

impl Default for Options {
    fn default() -> Self {
        STD_OPTIONS
    }
}

#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum WriteState {
    NoDataWritten,
    HeaderWritten,
    FinalBlockWritten
}

/// Compressing writer, see the module docs
pub struct DeflateStream<W: Write,E: DeflatePart = Engine> {
    sink: Option<W>,
    engine: E,
    options: crate::Options,
    format: Format,
    block_type: BlockType,
    write_immediately: bool,
    cache_size: usize,
    cache: Vec<u8>,
    position: usize,
    compressed: Vec<u8>,
    bit_pointer: u8,
    checksum: ChecksumState,
    /// uncompressed size mod 2^32, as gzip wants it
    inflated_size: u32,
    bytes_in: u64,
    bytes_out: u64,
    state: WriteState,
    is_final: bool,
    finalized: bool,
    failed: bool
}

impl<W: Write> DeflateStream<W,Engine> {
    /// Encoder with default options and the default engine
    pub fn new(sink: W,format: Format) -> Self {
        Self::with_options(sink,&crate::STD_OPTIONS,format,&STD_OPTIONS)
    }
    pub fn with_options(sink: W,options: &crate::Options,format: Format,stream_options: &Options) -> Self {
        Self::with_engine(sink,Engine::new(),options,format,stream_options)
    }
}

impl<W: Write,E: DeflatePart> DeflateStream<W,E> {
    /// Encoder using a caller supplied deflate primitive
    pub fn with_engine(sink: W,engine: E,options: &crate::Options,format: Format,stream_options: &Options) -> Self {
        Self {
            sink: Some(sink),
            engine,
            options: options.clone(),
            format,
            block_type: stream_options.block_type,
            write_immediately: stream_options.write_immediately,
            cache_size: stream_options.cache_size,
            cache: Vec::new(),
            position: 0,
            compressed: Vec::new(),
            bit_pointer: 0,
            checksum: ChecksumState::for_format(format),
            inflated_size: 0,
            bytes_in: 0,
            bytes_out: 0,
            state: WriteState::NoDataWritten,
            is_final: false,
            finalized: false,
            failed: false
        }
    }
    pub fn format(&self) -> Format {
        self.format
    }
    pub fn state(&self) -> WriteState {
        self.state
    }
    /// uncompressed bytes accepted so far
    pub fn bytes_in(&self) -> u64 {
        self.bytes_in
    }
    /// bytes handed to the sink so far, including header and footer
    pub fn bytes_out(&self) -> u64 {
        self.bytes_out
    }
    /// the sink, `None` only while it is being handed back by `finish`
    pub fn get_ref(&self) -> Option<&W> {
        self.sink.as_ref()
    }
    /// Without a cache, mark the next write as the last one, so it is compressed as the
    /// final block.  Has no effect when caching.
    pub fn set_final(&mut self,is_final: bool) {
        self.is_final = is_final;
    }
    fn sink_write(&mut self,buf: &[u8]) -> Result<(),Error> {
        match self.sink.as_mut() {
            Some(sink) => sink.write_all(buf)?,
            None => return Err(Error::AlreadyFinalized)
        }
        self.bytes_out += buf.len() as u64;
        Ok(())
    }
    fn write_header(&mut self) -> Result<(),Error> {
        self.state = WriteState::HeaderWritten;
        self.checksum = ChecksumState::for_format(self.format);
        let mut hdr = Vec::with_capacity(container::header_size(self.format));
        container::write_header(&mut hdr,self.format)?;
        self.sink_write(&hdr)
    }
    /// true once an error has made the stream unusable
    pub fn is_failed(&self) -> bool {
        self.failed
    }
    /// Pass `res` through, marking the stream failed if it is an error
    fn guard<T>(&mut self,res: Result<T,Error>) -> Result<T,Error> {
        if res.is_err() {
            self.failed = true;
        }
        res
    }
    /// Accept bytes, this is what `Write::write` calls
    fn accept(&mut self,buf: &[u8]) -> Result<(),Error> {
        if self.failed {
            return Err(Error::StreamFailed);
        }
        if self.finalized || self.state == WriteState::FinalBlockWritten {
            return Err(Error::AlreadyFinalized);
        }
        let res = self.accept_data(buf);
        self.guard(res)
    }
    fn accept_data(&mut self,buf: &[u8]) -> Result<(),Error> {
        if self.state == WriteState::NoDataWritten {
            self.write_header()?;
        }
        self.checksum.update(buf);
        self.bytes_in += buf.len() as u64;
        if self.cache_size == 0 {
            return self.compress(buf,self.is_final);
        }
        let mut rest = buf;
        while !rest.is_empty() {
            growth::ensure_capacity(&mut self.cache,self.position.checked_add(rest.len()),self.cache_size)?;
            if self.position == self.cache.len() {
                self.flush_cache(false)?;
            }
            let n = rest.len().min(self.cache.len() - self.position);
            self.cache[self.position..self.position + n].copy_from_slice(&rest[..n]);
            self.position += n;
            rest = &rest[n..];
        }
        Ok(())
    }
    fn flush_cache(&mut self,is_final: bool) -> Result<(),Error> {
        let cache = std::mem::take(&mut self.cache);
        let res = self.compress(&cache[..self.position],is_final);
        self.cache = cache;
        self.position = 0;
        res
    }
    fn compress(&mut self,data: &[u8],is_final: bool) -> Result<(),Error> {
        block::compress_block(&mut self.engine,&self.options,self.block_type,is_final,data,0,data.len(),&mut self.bit_pointer,&mut self.compressed)?;
        self.inflated_size = self.inflated_size.wrapping_add(data.len() as u32);
        if is_final {
            self.state = WriteState::FinalBlockWritten;
        }
        if self.write_immediately {
            self.send_compressed(false)?;
        }
        Ok(())
    }
    /// Move compressed bytes to the sink.  Unless `all`, a partial last byte stays behind.
    fn send_compressed(&mut self,all: bool) -> Result<(),Error> {
        let keep = match (all,self.bit_pointer) {
            (false,bp) if bp != 0 => 1,
            _ => 0
        };
        let n = self.compressed.len().saturating_sub(keep);
        if n == 0 {
            return Ok(());
        }
        match self.sink.as_mut() {
            Some(sink) => sink.write_all(&self.compressed[..n])?,
            None => return Err(Error::AlreadyFinalized)
        }
        self.bytes_out += n as u64;
        self.compressed.drain(..n);
        log::trace!("sent {} compressed bytes, {} held back",n,self.compressed.len());
        Ok(())
    }
    /// Compress the rest as the final block, send everything and write the footer.
    /// A second call does nothing.  After an error every call fails with `StreamFailed`.
    pub fn finalize(&mut self) -> Result<(),Error> {
        if self.failed {
            return Err(Error::StreamFailed);
        }
        if self.finalized {
            return Ok(());
        }
        self.finalized = true;
        let res = self.close();
        self.guard(res)
    }
    fn close(&mut self) -> Result<(),Error> {
        if self.state == WriteState::NoDataWritten {
            self.write_header()?;
        }
        if self.cache_size > 0 {
            self.flush_cache(true)?;
        } else if self.state != WriteState::FinalBlockWritten {
            self.compress(&[],true)?;
        }
        self.cache = Vec::new();
        self.send_compressed(true)?;
        self.compressed = Vec::new();
        let mut ftr = Vec::with_capacity(container::footer_size(self.format));
        container::write_footer(&mut ftr,self.format,self.checksum.value(),self.inflated_size)?;
        self.sink_write(&ftr)?;
        if let Some(sink) = self.sink.as_mut() {
            sink.flush()?;
        }
        log::debug!("finalized {} bytes into {}",self.bytes_in,self.bytes_out);
        Ok(())
    }
    fn flush_pending(&mut self) -> Result<(),Error> {
        if self.cache_size > 0 && self.position > 0 {
            self.flush_cache(false)?;
        }
        if self.write_immediately {
            if let Some(sink) = self.sink.as_mut() {
                sink.flush()?;
            }
        }
        Ok(())
    }
    /// Finalize and hand back the sink
    pub fn finish(mut self) -> Result<W,Error> {
        self.finalize()?;
        self.sink.take().ok_or(Error::AlreadyFinalized)
    }
}

impl<W: Write,E: DeflatePart> Write for DeflateStream<W,E> {
    fn write(&mut self,buf: &[u8]) -> std::io::Result<usize> {
        self.accept(buf)?;
        Ok(buf.len())
    }
    /// Compress pending cached bytes as a non-final block, nothing happens if there are none
    fn flush(&mut self) -> std::io::Result<()> {
        if self.failed {
            return Err(Error::StreamFailed.into());
        }
        if self.finalized {
            return Ok(());
        }
        let res = self.flush_pending();
        Ok(self.guard(res)?)
    }
}

impl<W: Write,E: DeflatePart> Drop for DeflateStream<W,E> {
    fn drop(&mut self) {
        if !self.finalized && !self.failed && self.sink.is_some() {
            if let Err(e) = self.finalize() {
                log::warn!("could not finalize stream on drop: {}",e);
            }
        }
    }
}

// *************** TESTS *****************

#[cfg(test)]
use std::io::Read;

#[cfg(test)]
fn sample(len: usize) -> Vec<u8> {
    let words = ["alpha ","beta ","gamma ","delta ","epsilon ","zeta\n"];
    let mut ans = Vec::new();
    let mut i = 0;
    while ans.len() < len {
        ans.extend_from_slice(words[(i * 7 + i / 3) % words.len()].as_bytes());
        i += 1;
    }
    ans.truncate(len);
    ans
}

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

#[cfg(test)]
fn is_already_finalized(e: &std::io::Error) -> bool {
    matches!(e.get_ref().and_then(|inner| inner.downcast_ref::<Error>()),Some(Error::AlreadyFinalized))
}

#[test]
fn round_trip_all_formats() {
    let data = sample(50000);
    for format in [Format::GZip,Format::ZLib,Format::Deflate] {
        let mut enc = DeflateStream::new(Vec::new(),format);
        enc.write_all(&data[..20000]).unwrap();
        enc.write_all(&data[20000..]).unwrap();
        let out = enc.finish().unwrap();
        assert_eq!(decode(format,&out),data);
    }
}

#[test]
fn byte_at_a_time_matches_one_shot() {
    let data = sample(3500);
    let stream_opt = Options { cache_size: 1000, ..STD_OPTIONS };
    for format in [Format::GZip,Format::ZLib,Format::Deflate] {
        let expected = crate::compress_ex(&data,&crate::STD_OPTIONS,format,BlockType::Dynamic,1000).unwrap();
        let mut enc = DeflateStream::with_options(Vec::new(),&crate::STD_OPTIONS,format,&stream_opt);
        for b in &data {
            enc.write_all(&[*b]).unwrap();
        }
        assert_eq!(enc.finish().unwrap(),expected);
        let mut enc = DeflateStream::with_options(Vec::new(),&crate::STD_OPTIONS,format,&stream_opt);
        enc.write_all(&data).unwrap();
        assert_eq!(enc.finish().unwrap(),expected);
    }
}

#[test]
fn default_cache_matches_one_shot() {
    let data = sample(100000);
    let expected = crate::compress(&data,&crate::STD_OPTIONS,Format::GZip).unwrap();
    let mut enc = DeflateStream::new(Vec::new(),Format::GZip);
    for chunk in data.chunks(777) {
        enc.write_all(chunk).unwrap();
    }
    assert_eq!(enc.finish().unwrap(),expected);
}

#[test]
fn exact_cache_multiple() {
    let data = sample(3000);
    let stream_opt = Options { cache_size: 1000, block_type: BlockType::Fixed, ..STD_OPTIONS };
    let expected = crate::compress_ex(&data,&crate::STD_OPTIONS,Format::ZLib,BlockType::Fixed,1000).unwrap();
    let mut enc = DeflateStream::with_options(Vec::new(),&crate::STD_OPTIONS,Format::ZLib,&stream_opt);
    for chunk in data.chunks(250) {
        enc.write_all(chunk).unwrap();
    }
    let out = enc.finish().unwrap();
    assert_eq!(out,expected);
    assert_eq!(decode(Format::ZLib,&out),data);
}

#[test]
fn empty_gzip() {
    let enc = DeflateStream::new(Vec::new(),Format::GZip);
    let out = enc.finish().unwrap();
    assert_eq!(&out[..10],&crate::container::gzip_header());
    assert_eq!(&out[out.len()-8..],&[0;8]);
    assert!(decode(Format::GZip,&out).is_empty());
}

#[test]
fn empty_write_then_finish() {
    let mut enc = DeflateStream::new(Vec::new(),Format::ZLib);
    enc.write_all(&[]).unwrap();
    assert_eq!(enc.state(),WriteState::NoDataWritten);
    let out = enc.finish().unwrap();
    assert_eq!(&out[..2],&[0x78,0xda]);
    assert_eq!(&out[out.len()-4..],&[0,0,0,1]);
}

#[test]
fn write_after_finalize() {
    let mut enc = DeflateStream::new(Vec::new(),Format::GZip);
    enc.write_all(b"some data").unwrap();
    enc.finalize().unwrap();
    let len = enc.get_ref().map(|v| v.len());
    enc.finalize().unwrap();
    assert_eq!(enc.get_ref().map(|v| v.len()),len);
    let e = enc.write(b"more").unwrap_err();
    assert!(is_already_finalized(&e));
    enc.flush().unwrap();
    assert_eq!(enc.get_ref().map(|v| v.len()),len);
}

#[test]
fn finalize_on_drop() {
    let data = sample(5000);
    let mut out = Vec::new();
    {
        let mut enc = DeflateStream::new(&mut out,Format::ZLib);
        enc.write_all(&data).unwrap();
    }
    assert_eq!(decode(Format::ZLib,&out),data);
}

#[test]
fn explicit_flush() {
    let data = sample(4000);
    let mut enc = DeflateStream::new(Vec::new(),Format::Deflate);
    enc.write_all(&data[..1500]).unwrap();
    enc.flush().unwrap();
    enc.flush().unwrap();
    enc.write_all(&data[1500..]).unwrap();
    let out = enc.finish().unwrap();
    assert_eq!(decode(Format::Deflate,&out),data);
}

#[test]
fn uncached_writes() {
    let data = sample(9000);
    let stream_opt = Options { cache_size: 0, ..STD_OPTIONS };
    for block_type in [BlockType::Dynamic,BlockType::Fixed,BlockType::NoCompress] {
        let opt = Options { block_type, ..stream_opt.clone() };
        let mut enc = DeflateStream::with_options(Vec::new(),&crate::STD_OPTIONS,Format::GZip,&opt);
        for chunk in data.chunks(1234) {
            enc.write_all(chunk).unwrap();
        }
        let out = enc.finish().unwrap();
        assert_eq!(decode(Format::GZip,&out),data);
    }
}

#[test]
fn uncached_final_write() {
    let data = sample(2000);
    let stream_opt = Options { cache_size: 0, ..STD_OPTIONS };
    let mut enc = DeflateStream::with_options(Vec::new(),&crate::STD_OPTIONS,Format::ZLib,&stream_opt);
    enc.write_all(&data[..1000]).unwrap();
    enc.set_final(true);
    enc.write_all(&data[1000..]).unwrap();
    assert_eq!(enc.state(),WriteState::FinalBlockWritten);
    assert!(is_already_finalized(&enc.write(b"x").unwrap_err()));
    let out = enc.finish().unwrap();
    assert_eq!(decode(Format::ZLib,&out),data);
}

#[test]
fn immediate_mode_streams_out() {
    let data = sample(30000);
    let stream_opt = Options { cache_size: 4096, write_immediately: true, block_type: BlockType::Fixed };
    let mut enc = DeflateStream::with_options(Vec::new(),&crate::STD_OPTIONS,Format::GZip,&stream_opt);
    enc.write_all(&data[..10000]).unwrap();
    // two full caches went out, minus at most one partial byte
    let sent = enc.get_ref().map(|v| v.len()).unwrap();
    assert!(sent > 10);
    assert_eq!(sent as u64,enc.bytes_out());
    enc.write_all(&data[10000..]).unwrap();
    let out = enc.finish().unwrap();
    let buffered = crate::compress_ex(&data,&crate::STD_OPTIONS,Format::GZip,BlockType::Fixed,4096).unwrap();
    assert_eq!(out,buffered);
    assert_eq!(decode(Format::GZip,&out),data);
}

/// Fails on the given call, otherwise writes stored blocks
#[cfg(test)]
struct Flaky {
    calls: usize,
    fail_on: usize
}

#[cfg(test)]
impl DeflatePart for Flaky {
    fn deflate_part(&mut self,_options: &crate::Options,_block_type: BlockType,is_final: bool,data: &[u8],start: usize,end: usize,bit_pointer: &mut u8,out: &mut Vec<u8>) -> Result<(),Error> {
        self.calls += 1;
        if self.calls == self.fail_on {
            return Err(Error::Primitive("out of memory".to_string()));
        }
        crate::engines::stored::add_stored_blocks(is_final,&data[start..end],bit_pointer,out);
        Ok(())
    }
}

#[cfg(test)]
fn stream_failed(e: &std::io::Error) -> bool {
    matches!(e.get_ref().and_then(|inner| inner.downcast_ref::<Error>()),Some(Error::StreamFailed))
}

#[test]
fn primitive_error_is_fatal() {
    let data = sample(3000);
    let stream_opt = Options { cache_size: 1000, ..STD_OPTIONS };
    let mut out = Vec::new();
    {
        let engine = Flaky { calls: 0, fail_on: 2 };
        let mut enc = DeflateStream::with_engine(&mut out,engine,&crate::STD_OPTIONS,Format::GZip,&stream_opt);
        let mut errors = 0;
        for chunk in data.chunks(500) {
            if let Err(e) = enc.write(chunk) {
                errors += 1;
                if errors > 1 {
                    assert!(stream_failed(&e));
                }
            }
        }
        assert_eq!(errors,2);
        assert!(enc.is_failed());
        assert!(stream_failed(&enc.flush().unwrap_err()));
        assert!(matches!(enc.finalize(),Err(Error::StreamFailed)));
        assert!(matches!(enc.finish(),Err(Error::StreamFailed)));
    }
    // only the header reached the sink, no footer was written on drop
    assert_eq!(out,crate::container::gzip_header().to_vec());
}

#[test]
fn final_block_error_is_fatal() {
    let mut out = Vec::new();
    {
        let engine = Flaky { calls: 0, fail_on: 1 };
        let mut enc = DeflateStream::with_engine(&mut out,engine,&crate::STD_OPTIONS,Format::ZLib,&STD_OPTIONS);
        enc.write_all(b"abc").unwrap();
        assert!(matches!(enc.finalize(),Err(Error::Primitive(_))));
        assert!(matches!(enc.finalize(),Err(Error::StreamFailed)));
    }
    assert_eq!(out,vec![0x78,0xda]);
}
