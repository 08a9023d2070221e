//! Adler-32 as used by zlib
//!
//! Two sums are kept, `s1` (bytes) and `s2` (running sum of `s1`), packed as `(s2 << 16) | s1`.
//! Both are reduced modulo `BASE` once per `NMAX` bytes, which is the longest run that
//! cannot overflow 32 bits.
//!
//! On x86 targets with SSSE3 the bulk of the input is summed 32 bytes at a time.  The choice
//! is made on each call to `update` from a cached CPU feature check, and both paths give
//! identical results.

pub const BASE: u32 = 65521;
pub const NMAX: usize = 5552;
pub const INITIAL_VALUE: u32 = 1;

/// Feed `buf` into the accumulator `adler`, using SIMD if the CPU has it
pub fn update(adler: u32,buf: &[u8]) -> u32 {
    match simd_update(adler,buf) {
        Some(ans) => ans,
        None => update_scalar(adler,buf)
    }
}

/// Portable path
pub fn update_scalar(adler: u32,buf: &[u8]) -> u32 {
    let mut s1 = adler & 0xffff;
    let mut s2 = adler >> 16;
    for chunk in buf.chunks(NMAX) {
        for b in chunk {
            s1 += *b as u32;
            s2 += s1;
        }
        s1 %= BASE;
        s2 %= BASE;
    }
    (s2 << 16) | s1
}

pub fn update_byte(adler: u32,x: u8) -> u32 {
    let mut s1 = (adler & 0xffff) + x as u32;
    if s1 >= BASE {
        s1 -= BASE;
    }
    let mut s2 = (adler >> 16) + s1;
    if s2 >= BASE {
        s2 -= BASE;
    }
    (s2 << 16) | s1
}

/// Adler-32 needs no final transformation, this is the identity
pub fn finalize(adler: u32) -> u32 {
    adler
}

pub fn compute(buf: &[u8]) -> u32 {
    finalize(update(INITIAL_VALUE,buf))
}

/// true if `update` will take the vectorized path on this machine
pub fn simd_available() -> bool {
    #[cfg(any(target_arch = "x86",target_arch = "x86_64"))]
    {
        x86::available()
    }
    #[cfg(not(any(target_arch = "x86",target_arch = "x86_64")))]
    {
        false
    }
}

fn simd_update(adler: u32,buf: &[u8]) -> Option<u32> {
    #[cfg(any(target_arch = "x86",target_arch = "x86_64"))]
    {
        x86::try_update(adler,buf)
    }
    #[cfg(not(any(target_arch = "x86",target_arch = "x86_64")))]
    {
        let _ = (adler,buf);
        None
    }
}

#[cfg(any(target_arch = "x86",target_arch = "x86_64"))]
#[allow(unsafe_code)]
mod x86 {
    #[cfg(target_arch = "x86")]
    use std::arch::x86::*;
    #[cfg(target_arch = "x86_64")]
    use std::arch::x86_64::*;
    use std::sync::OnceLock;
    use super::{BASE,NMAX};

    const BLOCK_SIZE: usize = 32;
    /// 32 byte blocks that fit in one reduction interval
    const BATCH: usize = NMAX / BLOCK_SIZE;

    static SSSE3: OnceLock<bool> = OnceLock::new();

    pub(super) fn available() -> bool {
        *SSSE3.get_or_init(|| is_x86_feature_detected!("ssse3"))
    }

    pub(super) fn try_update(adler: u32,buf: &[u8]) -> Option<u32> {
        if !available() {
            return None;
        }
        // SAFETY: the ssse3 feature was detected at runtime
        Some(unsafe { update_ssse3(adler,buf) })
    }

    #[target_feature(enable = "ssse3")]
    unsafe fn update_ssse3(adler: u32,buf: &[u8]) -> u32 {
        let mut s1 = adler & 0xffff;
        let mut s2 = adler >> 16;
        let mut blocks = buf.len() / BLOCK_SIZE;
        let mut offset = 0;

        // weights for the running sum, first byte of a block counts 32 times
        let tap1 = _mm_setr_epi8(32,31,30,29,28,27,26,25,24,23,22,21,20,19,18,17);
        let tap2 = _mm_setr_epi8(16,15,14,13,12,11,10,9,8,7,6,5,4,3,2,1);
        let zero = _mm_setzero_si128();
        let ones = _mm_set1_epi16(1);

        while blocks > 0 {
            let n = blocks.min(BATCH);
            blocks -= n;
            // vps collects s1 at the start of every block, it is scaled by 32 at the end
            let mut vps = _mm_set_epi32(0,0,0,(s1 * n as u32) as i32);
            let mut vs2 = _mm_set_epi32(0,0,0,s2 as i32);
            let mut vs1 = _mm_setzero_si128();
            for _i in 0..n {
                let ptr = buf.as_ptr().add(offset);
                let bytes1 = _mm_loadu_si128(ptr as *const __m128i);
                let bytes2 = _mm_loadu_si128(ptr.add(16) as *const __m128i);
                vps = _mm_add_epi32(vps,vs1);
                vs1 = _mm_add_epi32(vs1,_mm_sad_epu8(bytes1,zero));
                let mad1 = _mm_maddubs_epi16(bytes1,tap1);
                vs2 = _mm_add_epi32(vs2,_mm_madd_epi16(mad1,ones));
                vs1 = _mm_add_epi32(vs1,_mm_sad_epu8(bytes2,zero));
                let mad2 = _mm_maddubs_epi16(bytes2,tap2);
                vs2 = _mm_add_epi32(vs2,_mm_madd_epi16(mad2,ones));
                offset += BLOCK_SIZE;
            }
            vs2 = _mm_add_epi32(vs2,_mm_slli_epi32(vps,5));

            vs1 = _mm_add_epi32(vs1,_mm_shuffle_epi32(vs1,0b10_11_00_01));
            vs1 = _mm_add_epi32(vs1,_mm_shuffle_epi32(vs1,0b01_00_11_10));
            s1 += _mm_cvtsi128_si32(vs1) as u32;
            vs2 = _mm_add_epi32(vs2,_mm_shuffle_epi32(vs2,0b10_11_00_01));
            vs2 = _mm_add_epi32(vs2,_mm_shuffle_epi32(vs2,0b01_00_11_10));
            s2 = _mm_cvtsi128_si32(vs2) as u32;

            s1 %= BASE;
            s2 %= BASE;
        }

        // fewer than 32 bytes remain
        for b in &buf[offset..] {
            s1 += *b as u32;
            s2 += s1;
        }
        if s1 >= BASE {
            s1 -= BASE;
        }
        s2 %= BASE;
        (s2 << 16) | s1
    }

    #[cfg(test)]
    pub(super) fn update_for_tests(adler: u32,buf: &[u8]) -> Option<u32> {
        try_update(adler,buf)
    }
}

// *************** TESTS *****************

#[cfg(test)]
use proptest::prelude::*;

#[cfg(test)]
fn simd_for_tests(adler: u32,buf: &[u8]) -> Option<u32> {
    #[cfg(any(target_arch = "x86",target_arch = "x86_64"))]
    {
        x86::update_for_tests(adler,buf)
    }
    #[cfg(not(any(target_arch = "x86",target_arch = "x86_64")))]
    {
        let _ = (adler,buf);
        None
    }
}

#[cfg(test)]
fn pattern(len: usize) -> Vec<u8> {
    let mut x: u32 = 0x12345678;
    (0..len).map(|_| {
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        (x >> 24) as u8
    }).collect()
}

#[test]
fn known_values() {
    assert_eq!(compute(&[]),1);
    assert_eq!(compute(b"a"),0x00620062);
    assert_eq!(compute(b"abc"),0x024d0127);
    assert_eq!(compute(b"Wikipedia"),0x11E60398);
}

#[test]
fn scalar_matches_simd_at_boundaries() {
    for len in [0,1,31,32,33,63,64,65,5551,5552,5553,NMAX*2+17,100_000] {
        let data = pattern(len);
        let scalar = update_scalar(INITIAL_VALUE,&data);
        if let Some(simd) = simd_for_tests(INITIAL_VALUE,&data) {
            assert_eq!(simd,scalar,"length {}",len);
        }
        assert_eq!(update(INITIAL_VALUE,&data),scalar);
    }
}

#[test]
fn scalar_matches_simd_worst_case() {
    // all 0xff forces the largest sums between reductions
    for len in [5552,5553,3*1024*1024+7] {
        let data = vec![0xff;len];
        let scalar = update_scalar(INITIAL_VALUE,&data);
        if let Some(simd) = simd_for_tests(INITIAL_VALUE,&data) {
            assert_eq!(simd,scalar,"length {}",len);
        }
    }
}

#[test]
fn nonzero_start() {
    let data = pattern(70_000);
    let start = update_scalar(INITIAL_VALUE,b"prefix");
    if let Some(simd) = simd_for_tests(start,&data) {
        assert_eq!(simd,update_scalar(start,&data));
    }
}

#[test]
fn byte_at_a_time() {
    let data = pattern(12000);
    let mut adler = INITIAL_VALUE;
    for b in &data {
        adler = update_byte(adler,*b);
    }
    assert_eq!(adler,update(INITIAL_VALUE,&data));
}

#[cfg(test)]
proptest! {
    #[test]
    fn split_anywhere(data in proptest::collection::vec(any::<u8>(),0..20000),split in any::<prop::sample::Index>()) {
        let at = split.index(data.len()+1);
        let (a,b) = data.split_at(at);
        prop_assert_eq!(update(update(INITIAL_VALUE,a),b),update(INITIAL_VALUE,&data));
        prop_assert_eq!(update_scalar(update_scalar(INITIAL_VALUE,a),b),update_scalar(INITIAL_VALUE,&data));
    }

    #[test]
    fn simd_equals_scalar(data in proptest::collection::vec(any::<u8>(),0..40000)) {
        if let Some(simd) = simd_for_tests(INITIAL_VALUE,&data) {
            prop_assert_eq!(simd,update_scalar(INITIAL_VALUE,&data));
        }
    }
}
