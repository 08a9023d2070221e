//! Growth policy for the caches that collect written data
//!
//! A cache starts empty and, when more room is required, jumps to 64 KiB, then at least
//! doubles, and never exceeds its ceiling.

use crate::Error;

/// Smallest allocation once a cache holds anything
pub const INITIAL_CAPACITY: usize = 1 << 16;

/// Capacity to grow to so that `required` bytes fit, limited to `max`.
/// `required` is `None` when computing it overflowed.
pub fn next_capacity(current: usize,required: Option<usize>,max: usize) -> Result<usize,Error> {
    let required = required.ok_or(Error::CapacityOverflow)?;
    if current >= max || required <= current {
        return Ok(current);
    }
    let target = if required < INITIAL_CAPACITY {
        INITIAL_CAPACITY
    } else if required < current.saturating_mul(2) {
        current.saturating_mul(2)
    } else {
        required
    };
    Ok(target.min(max))
}

/// Resize `buf` according to `next_capacity`, returns true if its length changed
pub fn ensure_capacity(buf: &mut Vec<u8>,required: Option<usize>,max: usize) -> Result<bool,Error> {
    let new_len = next_capacity(buf.len(),required,max)?;
    if new_len == buf.len() {
        return Ok(false);
    }
    if buf.try_reserve_exact(new_len - buf.len()).is_err() {
        return Err(Error::CapacityOverflow);
    }
    log::trace!("cache grows from {} to {}",buf.len(),new_len);
    buf.resize(new_len,0);
    Ok(true)
}

#[test]
fn policy() {
    assert_eq!(next_capacity(0,Some(10),1<<20).unwrap(),65536);
    assert_eq!(next_capacity(65536,Some(65537),1<<20).unwrap(),131072);
    assert_eq!(next_capacity(65536,Some(500000),1<<20).unwrap(),500000);
    assert_eq!(next_capacity(524288,Some(600000),1<<20).unwrap(),1<<20);
    assert_eq!(next_capacity(1<<20,Some(2<<20),1<<20).unwrap(),1<<20);
    assert_eq!(next_capacity(0,Some(10),100).unwrap(),100);
    assert!(matches!(next_capacity(0,None,100),Err(Error::CapacityOverflow)));
}

#[test]
fn resize() {
    let mut buf = Vec::new();
    assert!(ensure_capacity(&mut buf,Some(1),1000).unwrap());
    assert_eq!(buf.len(),1000);
    assert!(!ensure_capacity(&mut buf,Some(5000),1000).unwrap());
    assert!(!ensure_capacity(&mut buf,Some(20),1000).unwrap());
}

#[test]
fn overflowing_request() {
    let mut buf = vec![0;100];
    let position = usize::MAX - 1;
    assert!(matches!(ensure_capacity(&mut buf,position.checked_add(2),1000),Err(Error::CapacityOverflow)));
    assert_eq!(buf.len(),100);
}
