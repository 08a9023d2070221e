//! Bit level output for deflate blocks
//!
//! Deflate packs bits LSB first, so a block can end partway through a byte.  The position
//! inside the last byte is the bit pointer (0-7), 0 meaning the last byte is complete.
//! Every function here appends to a plain `Vec<u8>` and updates the bit pointer in place,
//! so a block written later can continue in the same byte.

/// Append one bit
pub fn add_bit(bit: u8,bit_pointer: &mut u8,out: &mut Vec<u8>) {
    if *bit_pointer == 0 {
        out.push(0);
    }
    if let Some(last) = out.last_mut() {
        *last |= (bit & 1) << *bit_pointer;
    }
    *bit_pointer = (*bit_pointer + 1) & 7;
}

/// Append the low `length` bits of `symbol`, least significant first
pub fn add_bits(symbol: u32,length: u32,bit_pointer: &mut u8,out: &mut Vec<u8>) {
    for i in 0..length {
        add_bit(((symbol >> i) & 1) as u8,bit_pointer,out);
    }
}

/// Append a Huffman code, most significant bit first
pub fn add_huffman_bits(symbol: u32,length: u32,bit_pointer: &mut u8,out: &mut Vec<u8>) {
    for i in (0..length).rev() {
        add_bit(((symbol >> i) & 1) as u8,bit_pointer,out);
    }
}

/// Pad the partial byte with zeros
pub fn align(bit_pointer: &mut u8) {
    *bit_pointer = 0;
}

#[test]
fn continues_partial_byte() {
    let mut out = vec![0x01];
    let mut bp = 1;
    add_bits(0b11,2,&mut bp,&mut out);
    assert_eq!(out,vec![0b111]);
    assert_eq!(bp,3);
    add_bits(0x1f,5,&mut bp,&mut out);
    assert_eq!(out,vec![0xff]);
    assert_eq!(bp,0);
    add_bit(1,&mut bp,&mut out);
    assert_eq!(out,vec![0xff,0x01]);
}

#[test]
fn huffman_order() {
    let mut out = Vec::new();
    let mut bp = 0;
    add_huffman_bits(0b0011_0000,8,&mut bp,&mut out);
    assert_eq!(out,vec![0b0000_1100]);
    add_huffman_bits(0b101,3,&mut bp,&mut out);
    align(&mut bp);
    assert_eq!(out,vec![0b0000_1100,0b101]);
    assert_eq!(bp,0);
}
