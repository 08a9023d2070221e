//! Stored (uncompressed) deflate blocks

use crate::tools::bit_writer;

/// LEN is 16 bits
pub const MAX_STORED_LEN: usize = 65535;

/// Append `data` as stored blocks, splitting at `MAX_STORED_LEN`.
/// Empty input still gives one (empty) block.  Always ends byte aligned.
pub fn add_stored_blocks(is_final: bool,data: &[u8],bit_pointer: &mut u8,out: &mut Vec<u8>) {
    let mut chunks: Vec<&[u8]> = data.chunks(MAX_STORED_LEN).collect();
    if chunks.is_empty() {
        chunks.push(&[]);
    }
    let last = chunks.len() - 1;
    for (i,chunk) in chunks.into_iter().enumerate() {
        bit_writer::add_bit((is_final && i == last) as u8,bit_pointer,out);
        // BTYPE 00
        bit_writer::add_bit(0,bit_pointer,out);
        bit_writer::add_bit(0,bit_pointer,out);
        bit_writer::align(bit_pointer);
        let len = chunk.len() as u16;
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(&(!len).to_le_bytes());
        out.extend_from_slice(chunk);
    }
}

#[test]
fn empty_final() {
    let mut out = Vec::new();
    let mut bp = 0;
    add_stored_blocks(true,&[],&mut bp,&mut out);
    assert_eq!(out,hex::decode("01 0000 ffff".replace(" ","")).unwrap());
    assert_eq!(bp,0);
}

#[test]
fn after_partial_byte() {
    let mut out = vec![0x05];
    let mut bp = 3;
    add_stored_blocks(false,b"hi",&mut bp,&mut out);
    assert_eq!(out,hex::decode("05 0200 fdff 6869".replace(" ","")).unwrap());
    assert_eq!(bp,0);
}

#[test]
fn long_input_splits() {
    let data = vec![7u8;MAX_STORED_LEN + 10];
    let mut out = Vec::new();
    let mut bp = 0;
    add_stored_blocks(true,&data,&mut bp,&mut out);
    assert_eq!(out.len(),data.len() + 10);
    assert_eq!(out[0],0);
    assert_eq!(out[5 + MAX_STORED_LEN],1);
}
