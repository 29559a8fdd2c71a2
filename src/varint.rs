//! Marker-based variable-length unsigned integers.
//!
//! The count of leading zero bits in the first byte says how many bytes follow it. The bits
//! after the first set bit hold the most significant part of the value, and the following bytes
//! hold the rest, big-endian. A first byte of zero is followed by all 8 bytes of a `u64`.
//!
//! | Leading zeros | Total bytes | Value bits |
//! | --            | --          | --         |
//! | 0             | 1           | 7          |
//! | 1             | 2           | 14         |
//! | 2             | 3           | 21         |
//! | ...           | ...         | ...        |
//! | 7             | 8           | 56         |
//! | 8             | 9           | 64         |

use crate::error::{Error, Result};

/// Longest possible encoding.
pub const MAX_VARINT_LEN: usize = 9;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VarInt {
    n: [u8; MAX_VARINT_LEN],
}

impl VarInt {
    pub fn from_u64(i: u64) -> VarInt {
        let mut n = [0u8; MAX_VARINT_LEN];
        let extra = extra_bytes(i);
        if extra == 8 {
            n[1..].copy_from_slice(&i.to_be_bytes());
        } else {
            let be = i.to_be_bytes();
            n[1..=extra].copy_from_slice(&be[8 - extra..]);
            let high = if extra == 7 { 0 } else { (i >> (8 * extra)) as u8 };
            n[0] = (0x80u8 >> extra) | high;
        }
        VarInt { n }
    }

    pub fn to_u64(self) -> u64 {
        let extra = Self::extra_from_first(self.n[0]);
        let mut v = if extra >= 7 {
            0
        } else {
            (self.n[0] & (0x7Fu8 >> extra)) as u64
        };
        for b in &self.n[1..=extra] {
            v = (v << 8) | (*b as u64);
        }
        v
    }

    fn extra_from_first(first: u8) -> usize {
        first.leading_zeros() as usize
    }

    /// Number of bytes in this encoding.
    pub fn len(&self) -> usize {
        Self::extra_from_first(self.n[0]) + 1
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.n[..self.len()]
    }

    pub fn write(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.as_bytes());
    }

    /// Decode from the start of a slice, returning the value and how many bytes it took.
    pub fn read(buf: &[u8]) -> Result<(VarInt, usize)> {
        let first = *buf.first().ok_or(Error::OutOfBounds {
            step: "decode varint marker",
            offset: 0,
            len: 1,
        })?;
        let len = Self::extra_from_first(first) + 1;
        if buf.len() < len {
            return Err(Error::OutOfBounds {
                step: "decode varint body",
                offset: 0,
                len,
            });
        }
        let mut n = [0u8; MAX_VARINT_LEN];
        n[..len].copy_from_slice(&buf[..len]);
        Ok((VarInt { n }, len))
    }
}

impl From<u64> for VarInt {
    fn from(n: u64) -> Self {
        VarInt::from_u64(n)
    }
}

impl From<VarInt> for u64 {
    fn from(v: VarInt) -> Self {
        v.to_u64()
    }
}

fn extra_bytes(i: u64) -> usize {
    for extra in 0..8 {
        let bits = 7 + 7 * extra;
        if bits >= 64 || i < (1u64 << bits) {
            return extra;
        }
    }
    8
}

/// Bytes needed to encode `value`.
pub fn encoded_len(value: u64) -> usize {
    extra_bytes(value) + 1
}

/// Decode a varint from the start of `buf`, returning the value and its encoded length.
pub fn decode(buf: &[u8]) -> Result<(u64, usize)> {
    let (v, len) = VarInt::read(buf)?;
    Ok((v.to_u64(), len))
}

/// Encoded length of the varint at the start of `buf`, without decoding it.
pub fn peek_len(buf: &[u8]) -> Result<usize> {
    let first = *buf.first().ok_or(Error::OutOfBounds {
        step: "peek varint marker",
        offset: 0,
        len: 1,
    })?;
    Ok(first.leading_zeros() as usize + 1)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn encode_decode_2() {
        for s in 0..=63 {
            let mut buf = Vec::new();
            let i = 1u64 << s;
            let i = VarInt::from_u64(i);
            i.write(&mut buf);
            let (o, len) = VarInt::read(&buf[..]).unwrap();
            assert_eq!(i, o, "VarInt should match");
            assert_eq!(len, buf.len());
            assert_eq!(1u64 << s, o.to_u64(), "u64 results should match");
        }
    }

    #[test]
    fn boundaries() {
        let cases: Vec<(u64, usize)> = vec![
            (0, 1),
            (127, 1),
            (128, 2),
            ((1 << 14) - 1, 2),
            (1 << 14, 3),
            ((1 << 56) - 1, 8),
            (1 << 56, 9),
            (u64::MAX, 9),
        ];
        for (value, len) in cases {
            assert_eq!(encoded_len(value), len, "length of {}", value);
            let v = VarInt::from_u64(value);
            assert_eq!(v.len(), len);
            assert_eq!(decode(v.as_bytes()).unwrap(), (value, len));
            assert_eq!(peek_len(v.as_bytes()).unwrap(), len);
        }
    }

    #[test]
    fn spec_bytes() {
        assert_eq!(VarInt::from_u64(5).as_bytes(), &[0x85]);
        assert_eq!(VarInt::from_u64(300).as_bytes(), &[0x41, 0x2c]);
    }

    #[test]
    fn truncated() {
        assert!(decode(&[]).is_err());
        assert!(decode(&[0x41]).is_err());
        assert!(decode(&[0x00, 1, 2, 3]).is_err());
    }
}
