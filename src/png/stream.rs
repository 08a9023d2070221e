//! Writer that optimizes a PNG once all of it has arrived
//!
//! An optimizer needs the whole file, so everything written is kept in memory.  The first
//! `flush`, `finish` or drop runs the optimizer and writes the result to the sink.  After
//! that, writes fail and further flushes do nothing.

use std::io::Write;
use crate::tools::growth;
use crate::Error;
use super::{errors,IdatRecompressor,PngOptimizer,PngOptions};

pub struct PngStream<W: Write,P: PngOptimizer = IdatRecompressor> {
    sink: Option<W>,
    optimizer: P,
    options: PngOptions,
    verbose: bool,
    buffer: Vec<u8>,
    position: usize,
    flushed: bool
}

impl<W: Write> PngStream<W,IdatRecompressor> {
    pub fn new(sink: W) -> Self {
        Self::with_optimizer(sink,IdatRecompressor,&super::STD_PNG_OPTIONS,false)
    }
    pub fn with_options(sink: W,options: &PngOptions) -> Self {
        Self::with_optimizer(sink,IdatRecompressor,options,false)
    }
}

impl<W: Write,P: PngOptimizer> PngStream<W,P> {
    pub fn with_optimizer(sink: W,optimizer: P,options: &PngOptions,verbose: bool) -> Self {
        Self {
            sink: Some(sink),
            optimizer,
            options: options.clone(),
            verbose,
            buffer: Vec::new(),
            position: 0,
            flushed: false
        }
    }
    pub fn options(&self) -> &PngOptions {
        &self.options
    }
    /// Change the options, only useful before the first flush
    pub fn set_options(&mut self,options: &PngOptions) {
        self.options = options.clone();
    }
    pub fn get_ref(&self) -> Option<&W> {
        self.sink.as_ref()
    }
    fn accept(&mut self,buf: &[u8]) -> Result<(),Error> {
        if self.flushed {
            return Err(Error::AlreadyFinalized);
        }
        growth::ensure_capacity(&mut self.buffer,self.position.checked_add(buf.len()),usize::MAX)?;
        self.buffer[self.position..self.position + buf.len()].copy_from_slice(buf);
        self.position += buf.len();
        Ok(())
    }
    /// Run the optimizer over everything written and send the result, only the first call does anything
    pub fn optimize(&mut self) -> Result<(),Error> {
        if self.flushed {
            return Ok(());
        }
        self.flushed = true;
        let input = std::mem::take(&mut self.buffer);
        log::debug!("optimizing {} bytes of PNG",self.position);
        let result = self.optimizer.optimize(&input[..self.position],&self.options,self.verbose);
        drop(input);
        let png = result.map_err(errors::to_error)?;
        match self.sink.as_mut() {
            Some(sink) => {
                sink.write_all(&png)?;
                sink.flush()?;
            },
            None => return Err(Error::AlreadyFinalized)
        }
        log::debug!("optimized PNG is {} bytes",png.len());
        Ok(())
    }
    /// Optimize and hand back the sink
    pub fn finish(mut self) -> Result<W,Error> {
        self.optimize()?;
        self.sink.take().ok_or(Error::AlreadyFinalized)
    }
}

impl<W: Write,P: PngOptimizer> Write for PngStream<W,P> {
    fn write(&mut self,buf: &[u8]) -> std::io::Result<usize> {
        self.accept(buf)?;
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(self.optimize()?)
    }
}

impl<W: Write,P: PngOptimizer> Drop for PngStream<W,P> {
    fn drop(&mut self) {
        if !self.flushed && self.sink.is_some() {
            if let Err(e) = self.optimize() {
                log::warn!("could not optimize PNG on drop: {}",e);
            }
        }
    }
}

// *************** TESTS *****************

#[cfg(test)]
use super::sample_png;

#[cfg(test)]
fn code_of(e: &std::io::Error) -> Option<u32> {
    match e.get_ref().and_then(|inner| inner.downcast_ref::<Error>()) {
        Some(Error::Png { code, .. }) => Some(*code),
        _ => None
    }
}

#[test]
fn chunked_writes() {
    let (png,_raw) = sample_png(&[(b"tIME",&[7,0xe6,1,1,0,0,0])]);
    let expected = super::optimize_png(&png,&super::STD_PNG_OPTIONS).unwrap();
    let mut stream = PngStream::new(Vec::new());
    for chunk in png.chunks(17) {
        stream.write_all(chunk).unwrap();
    }
    assert_eq!(stream.finish().unwrap(),expected);
}

#[test]
fn flush_once() {
    let (png,_raw) = sample_png(&[]);
    let mut stream = PngStream::new(Vec::new());
    stream.write_all(&png).unwrap();
    stream.flush().unwrap();
    let len = stream.get_ref().map(|v| v.len());
    stream.flush().unwrap();
    assert_eq!(stream.get_ref().map(|v| v.len()),len);
    let e = stream.write(&[0]).unwrap_err();
    assert!(matches!(e.get_ref().and_then(|inner| inner.downcast_ref::<Error>()),Some(Error::AlreadyFinalized)));
}

#[test]
fn optimizer_codes() {
    let mut stream = PngStream::new(Vec::new());
    stream.write_all(b"GIF89a, definitely not a PNG file").unwrap();
    assert_eq!(code_of(&stream.flush().unwrap_err()),Some(28));
    let mut stream = PngStream::new(Vec::new());
    stream.write_all(b"\x89PNG").unwrap();
    assert_eq!(code_of(&stream.flush().unwrap_err()),Some(27));
    let mut stream = PngStream::new(Vec::new());
    assert_eq!(code_of(&stream.flush().unwrap_err()),Some(48));
}

#[test]
fn optimize_on_drop() {
    let (png,_raw) = sample_png(&[]);
    let mut out = Vec::new();
    {
        let mut stream = PngStream::new(&mut out);
        stream.write_all(&png).unwrap();
    }
    assert_eq!(&out[..8],&super::recompress::SIGNATURE);
    assert!(out.len() < png.len());
}
