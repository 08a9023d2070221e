//! Fixed Huffman deflate blocks holding literals only

use crate::tools::bit_writer;

const END_OF_BLOCK_LEN: u32 = 7;

/// Fixed code for a literal byte: 0-143 use 8 bits from 0x30, 144-255 use 9 bits from 0x190
fn literal_code(val: u8) -> (u32,u32) {
    match val {
        0..=143 => (0x30 + val as u32,8),
        _ => (0x190 + val as u32 - 144,9)
    }
}

/// Append one fixed block starting at `bit_pointer`, which is generally left nonzero
pub fn add_fixed_block(is_final: bool,data: &[u8],bit_pointer: &mut u8,out: &mut Vec<u8>) {
    bit_writer::add_bit(is_final as u8,bit_pointer,out);
    bit_writer::add_bits(1,2,bit_pointer,out);
    for b in data {
        let (code,len) = literal_code(*b);
        bit_writer::add_huffman_bits(code,len,bit_pointer,out);
    }
    // symbol 256 has the all zero 7 bit code
    bit_writer::add_huffman_bits(0,END_OF_BLOCK_LEN,bit_pointer,out);
}

#[test]
fn empty_final() {
    let mut out = Vec::new();
    let mut bp = 0;
    add_fixed_block(true,&[],&mut bp,&mut out);
    assert_eq!(out,vec![0x03,0x00]);
    assert_eq!(bp,2);
}

#[test]
fn codes() {
    assert_eq!(literal_code(0),(0x30,8));
    assert_eq!(literal_code(143),(0xbf,8));
    assert_eq!(literal_code(144),(0x190,9));
    assert_eq!(literal_code(255),(0x1ff,9));
}
