//! A growable, seekable byte arena.
//!
//! All document state lives in one `MemFile`. Cursors and iterators never hold pointers into it,
//! only offsets, and every read or write is bounds-checked.

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};

use crate::error::{Error, Result};
use crate::varint::{self, VarInt};

#[derive(Clone, Debug, Default)]
pub struct MemFile {
    buf: Vec<u8>,
    pos: usize,
    saved: Vec<usize>,
}

// Cursor state isn't part of the contents.
impl PartialEq for MemFile {
    fn eq(&self, other: &Self) -> bool {
        self.buf == other.buf
    }
}

impl Eq for MemFile {}

macro_rules! read_le {
    ($name:ident, $peek:ident, $ty:ty, $len:expr, $read:ident) => {
        pub fn $name(&mut self) -> Result<$ty> {
            let v = self.$peek()?;
            self.pos += $len;
            Ok(v)
        }

        pub fn $peek(&self) -> Result<$ty> {
            let mut data = self.peek($len)?;
            data.$read::<LittleEndian>().map_err(|_| Error::OutOfBounds {
                step: stringify!($name),
                offset: self.pos,
                len: $len,
            })
        }
    };
}

macro_rules! write_le {
    ($name:ident, $ty:ty, $len:expr, $write:ident) => {
        pub fn $name(&mut self, v: $ty) -> Result<()> {
            let mut bytes = [0u8; $len];
            LittleEndian::$write(&mut bytes, v);
            self.write(&bytes)
        }
    };
}

impl MemFile {
    /// Create an empty arena with room for `capacity` bytes before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            pos: 0,
            saved: Vec::new(),
        }
    }

    pub fn from_vec(buf: Vec<u8>) -> Self {
        Self {
            buf,
            pos: 0,
            saved: Vec::new(),
        }
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Bytes in use.
    pub fn size(&self) -> usize {
        self.buf.len()
    }

    pub fn tell(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, offset: usize) -> Result<()> {
        if offset > self.buf.len() {
            return Err(Error::OutOfBounds {
                step: "seek",
                offset,
                len: 0,
            });
        }
        self.pos = offset;
        Ok(())
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.seek(self.pos + len)
    }

    pub fn save_position(&mut self) {
        self.saved.push(self.pos);
    }

    pub fn restore_position(&mut self) -> Result<()> {
        let pos = self
            .saved
            .pop()
            .ok_or_else(|| Error::internal("restore_position without a saved position"))?;
        self.seek(pos)
    }

    /// Borrow `len` bytes at the current position without advancing.
    pub fn peek(&self, len: usize) -> Result<&[u8]> {
        self.buf
            .get(self.pos..self.pos + len)
            .ok_or(Error::OutOfBounds {
                step: "peek",
                offset: self.pos,
                len,
            })
    }

    /// Borrow `len` bytes at the current position and advance past them.
    pub fn read(&mut self, len: usize) -> Result<&[u8]> {
        let start = self.pos;
        if start + len > self.buf.len() {
            return Err(Error::OutOfBounds {
                step: "read",
                offset: start,
                len,
            });
        }
        self.pos += len;
        Ok(&self.buf[start..start + len])
    }

    pub fn peek_u8(&self) -> Result<u8> {
        self.buf.get(self.pos).copied().ok_or(Error::OutOfBounds {
            step: "peek u8",
            offset: self.pos,
            len: 1,
        })
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let v = self.peek_u8()?;
        self.pos += 1;
        Ok(v)
    }

    read_le!(read_u16, peek_u16, u16, 2, read_u16);
    read_le!(read_u32, peek_u32, u32, 4, read_u32);
    read_le!(read_u64, peek_u64, u64, 8, read_u64);
    read_le!(read_i16, peek_i16, i16, 2, read_i16);
    read_le!(read_i32, peek_i32, i32, 4, read_i32);
    read_le!(read_i64, peek_i64, i64, 8, read_i64);
    read_le!(read_f32, peek_f32, f32, 4, read_f32);

    /// Make sure `len` more bytes can be appended without reallocating on the way.
    pub fn ensure_space(&mut self, len: usize) -> Result<()> {
        let needed = (self.pos + len).saturating_sub(self.buf.len());
        self.buf.try_reserve(needed).map_err(|_| Error::Malloc(needed))
    }

    /// Write over the bytes at the current position and advance. Writing past the end extends
    /// the arena.
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let end = self.pos + bytes.len();
        if end > self.buf.len() {
            self.ensure_space(bytes.len())?;
            self.buf.resize(end, 0);
        }
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    pub fn write_u8(&mut self, v: u8) -> Result<()> {
        self.write(&[v])
    }

    write_le!(write_u16, u16, 2, write_u16);
    write_le!(write_u32, u32, 4, write_u32);
    write_le!(write_u64, u64, 8, write_u64);
    write_le!(write_i16, i16, 2, write_i16);
    write_le!(write_i32, i32, 4, write_i32);
    write_le!(write_i64, i64, 8, write_i64);
    write_le!(write_f32, f32, 4, write_f32);

    /// Open a zeroed gap of `len` bytes at the current position, moving everything after it
    /// forward. The position doesn't move.
    pub fn insert_space(&mut self, len: usize) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        if self.pos > self.buf.len() {
            return Err(Error::internal("insert_space past end of buffer"));
        }
        self.buf.try_reserve(len).map_err(|_| Error::Malloc(len))?;
        let tail = self.buf.len() - self.pos;
        tracing::trace!(offset = self.pos, len, tail, "shift tail forward");
        self.buf
            .splice(self.pos..self.pos, std::iter::repeat(0u8).take(len));
        Ok(())
    }

    /// Insert bytes at the current position, shifting the tail, and advance past them.
    pub fn insert(&mut self, bytes: &[u8]) -> Result<()> {
        self.insert_space(bytes.len())?;
        self.write(bytes)
    }

    /// Remove `len` bytes at the current position, pulling the tail back.
    pub fn remove(&mut self, len: usize) -> Result<()> {
        if self.pos + len > self.buf.len() {
            return Err(Error::OutOfBounds {
                step: "remove",
                offset: self.pos,
                len,
            });
        }
        tracing::trace!(offset = self.pos, len, "shift tail back");
        self.buf.drain(self.pos..self.pos + len);
        Ok(())
    }

    pub fn peek_varuint(&self) -> Result<(u64, usize)> {
        varint::decode(&self.buf[self.pos.min(self.buf.len())..]).map_err(|_| {
            Error::OutOfBounds {
                step: "decode varint",
                offset: self.pos,
                len: 1,
            }
        })
    }

    pub fn read_varuint(&mut self) -> Result<u64> {
        let (v, len) = self.peek_varuint()?;
        self.pos += len;
        Ok(v)
    }

    pub fn skip_varuint(&mut self) -> Result<()> {
        let len = varint::peek_len(&self.buf[self.pos.min(self.buf.len())..])?;
        self.skip(len)
    }

    /// Overwrite at the current position with a varint, advancing past it.
    pub fn write_varuint(&mut self, v: u64) -> Result<()> {
        self.write(VarInt::from_u64(v).as_bytes())
    }

    /// Replace the varint at the current position with `v`, growing or shrinking the arena when
    /// the encoded width changes. Returns the change in width, and leaves the position just past
    /// the new encoding.
    pub fn update_varuint(&mut self, v: u64) -> Result<isize> {
        let (_, old_len) = self.peek_varuint()?;
        let new = VarInt::from_u64(v);
        let new_len = new.len();
        if new_len > old_len {
            self.save_position();
            self.skip(old_len)?;
            self.insert_space(new_len - old_len)?;
            self.restore_position()?;
        } else if new_len < old_len {
            self.remove(old_len - new_len)?;
        }
        self.write(new.as_bytes())?;
        Ok(new_len as isize - old_len as isize)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn write_then_read() {
        let mut file = MemFile::with_capacity(4);
        file.write_u8(7).unwrap();
        file.write_u16(0x0102).unwrap();
        file.write_i64(-5).unwrap();
        file.write_f32(1.5).unwrap();
        assert_eq!(file.size(), 1 + 2 + 8 + 4);
        file.seek(0).unwrap();
        assert_eq!(file.read_u8().unwrap(), 7);
        assert_eq!(file.read_u16().unwrap(), 0x0102);
        assert_eq!(file.read_i64().unwrap(), -5);
        assert_eq!(file.read_f32().unwrap(), 1.5);
        assert!(file.read_u8().is_err());
    }

    #[test]
    fn insert_shifts_tail() {
        let mut file = MemFile::from_vec(vec![1, 2, 3, 4]);
        file.seek(2).unwrap();
        file.insert(&[9, 9]).unwrap();
        assert_eq!(file.as_slice(), &[1, 2, 9, 9, 3, 4]);
        assert_eq!(file.tell(), 4);
        file.seek(1).unwrap();
        file.remove(3).unwrap();
        assert_eq!(file.as_slice(), &[1, 3, 4]);
    }

    #[test]
    fn saved_positions_are_a_stack() {
        let mut file = MemFile::from_vec(vec![0; 10]);
        file.seek(3).unwrap();
        file.save_position();
        file.seek(6).unwrap();
        file.save_position();
        file.seek(9).unwrap();
        file.restore_position().unwrap();
        assert_eq!(file.tell(), 6);
        file.restore_position().unwrap();
        assert_eq!(file.tell(), 3);
    }

    #[test]
    fn varuint_update_changes_width() {
        let mut file = MemFile::default();
        file.write_u8(0xAA).unwrap();
        file.write_varuint(5).unwrap();
        file.write_u8(0xBB).unwrap();
        file.seek(1).unwrap();
        let delta = file.update_varuint(300).unwrap();
        assert_eq!(delta, 1);
        assert_eq!(file.tell(), 3);
        assert_eq!(file.as_slice(), &[0xAA, 0x41, 0x2c, 0xBB]);
        file.seek(1).unwrap();
        assert_eq!(file.read_varuint().unwrap(), 300);
        file.seek(1).unwrap();
        let delta = file.update_varuint(1).unwrap();
        assert_eq!(delta, -1);
        assert_eq!(file.as_slice(), &[0xAA, 0x81, 0xBB]);
    }

    #[test]
    fn out_of_bounds() {
        let mut file = MemFile::from_vec(vec![1]);
        assert!(file.seek(2).is_err());
        assert!(file.peek(2).is_err());
        assert!(file.read_u32().is_err());
        file.seek(1).unwrap();
        assert!(file.remove(1).is_err());
    }
}
