//! CRC-32 as used by gzip (reflected polynomial `0xEDB88320`)
//!
//! The accumulator starts at `INITIAL_VALUE` and is only complemented by `finalize`.
//! Intermediate accumulator values are never valid checksums.

use std::sync::OnceLock;

pub const POLYNOMIAL: u32 = 0xEDB88320;
pub const INITIAL_VALUE: u32 = 0xFFFFFFFF;

static TABLE: OnceLock<[u32;256]> = OnceLock::new();

/// The byte lookup table, built on first use and shared by every caller
pub fn table() -> &'static [u32;256] {
    TABLE.get_or_init(|| {
        let mut ans = [0u32;256];
        for (n,entry) in ans.iter_mut().enumerate() {
            let mut c = n as u32;
            for _k in 0..8 {
                c = match c & 1 {
                    1 => POLYNOMIAL ^ (c >> 1),
                    _ => c >> 1
                };
            }
            *entry = c;
        }
        ans
    })
}

/// Feed `buf` into the accumulator `crc`
pub fn update(crc: u32,buf: &[u8]) -> u32 {
    let table = table();
    buf.iter().fold(crc,|c,b| table[((c ^ *b as u32) & 0xff) as usize] ^ (c >> 8))
}

pub fn update_byte(crc: u32,x: u8) -> u32 {
    table()[((crc ^ x as u32) & 0xff) as usize] ^ (crc >> 8)
}

/// Turn an accumulator into the checksum that goes in the footer
pub fn finalize(crc: u32) -> u32 {
    !crc
}

/// Checksum of a complete buffer
pub fn compute(buf: &[u8]) -> u32 {
    finalize(update(INITIAL_VALUE,buf))
}

// *************** TESTS *****************

#[cfg(test)]
use proptest::prelude::*;

#[test]
fn check_value() {
    assert_eq!(compute(b"123456789"),0xCBF43926);
    assert_eq!(compute(b"The quick brown fox jumps over the lazy dog"),0x414FA339);
}

#[test]
fn empty_input() {
    assert_eq!(compute(&[]),0);
    assert_eq!(update(INITIAL_VALUE,&[]),INITIAL_VALUE);
}

#[test]
fn table_entries() {
    let t = table();
    assert_eq!(t[0],0);
    assert_eq!(t[1],0x77073096);
    assert_eq!(t[255],0x2D02EF8D);
}

#[test]
fn byte_at_a_time() {
    let data = b"squeeze me";
    let mut crc = INITIAL_VALUE;
    for b in data {
        crc = update_byte(crc,*b);
    }
    assert_eq!(crc,update(INITIAL_VALUE,data));
}

#[test]
fn matches_flate2() {
    let data: Vec<u8> = (0..10000u32).map(|i| (i*7 % 251) as u8).collect();
    let mut reference = flate2::Crc::new();
    reference.update(&data);
    assert_eq!(compute(&data),reference.sum());
}

#[cfg(test)]
proptest! {
    #[test]
    fn split_anywhere(data in proptest::collection::vec(any::<u8>(),0..2000),split in any::<prop::sample::Index>()) {
        let at = split.index(data.len()+1);
        let (a,b) = data.split_at(at);
        prop_assert_eq!(update(update(INITIAL_VALUE,a),b),update(INITIAL_VALUE,&data));
    }
}
