//! Byte layout of fields and containers.
//!
//! ```text
//! scalar  = tag body
//! array   = tag field* END
//! object  = tag (key field)* END
//! column  = tag count:varint capacity:varint slot{capacity}
//! key     = len:varint utf8
//! ```
//!
//! Scalar bodies are empty for null, true and false; little-endian fixed-width values for
//! numbers; `len:varint utf8` for strings; `mime:varint len:varint bytes` for binary; and
//! `type_len:varint utf8 len:varint bytes` for custom binary.
//!
//! Everything here works on plain byte slices. The skip functions only look at as much of a
//! field as is needed to find where it ends, and on failure they leave the reader where it was.

use std::convert::TryFrom;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::depth_tracking::{DepthTracker, Frame};
use crate::error::{Error, Result};
use crate::field_type::*;
use crate::varint::{self, VarInt};
use crate::MAX_DEPTH;

/// A bounds-checked read cursor over a byte slice.
#[derive(Clone, Copy, Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
    max_depth: usize,
}

macro_rules! reader_le {
    ($name:ident, $ty:ty, $len:expr, $read:ident) => {
        pub fn $name(&mut self) -> Result<$ty> {
            let mut rem = self.remaining();
            let v = rem.$read::<LittleEndian>().map_err(|_| Error::OutOfBounds {
                step: stringify!($name),
                offset: self.pos,
                len: $len,
            })?;
            self.pos += $len;
            Ok(v)
        }
    };
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8], pos: usize) -> Self {
        Self {
            data,
            pos,
            max_depth: MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos.min(self.data.len())..]
    }

    pub fn peek_u8(&self) -> Result<u8> {
        self.data.get(self.pos).copied().ok_or(Error::OutOfBounds {
            step: "peek tag",
            offset: self.pos,
            len: 1,
        })
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let v = self.peek_u8()?;
        self.pos += 1;
        Ok(v)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.read_u8().map(|v| v as i8)
    }

    reader_le!(read_u16, u16, 2, read_u16);
    reader_le!(read_u32, u32, 4, read_u32);
    reader_le!(read_u64, u64, 8, read_u64);
    reader_le!(read_i16, i16, 2, read_i16);
    reader_le!(read_i32, i32, 4, read_i32);
    reader_le!(read_i64, i64, 8, read_i64);
    reader_le!(read_f32, f32, 4, read_f32);

    pub fn read_bytes(&mut self, len: usize, step: &'static str) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or(Error::OutOfBounds {
            step,
            offset: self.pos,
            len,
        })?;
        let bytes = self.data.get(self.pos..end).ok_or(Error::OutOfBounds {
            step,
            offset: self.pos,
            len,
        })?;
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_varuint(&mut self) -> Result<u64> {
        let (v, len) = varint::decode(self.remaining()).map_err(|_| Error::OutOfBounds {
            step: "decode varint",
            offset: self.pos,
            len: 1,
        })?;
        self.pos += len;
        Ok(v)
    }

    /// Read a varint that counts bytes or slots.
    pub fn read_len(&mut self) -> Result<usize> {
        let offset = self.pos;
        let v = self.read_varuint()?;
        usize::try_from(v).map_err(|_| Error::OutOfBounds {
            step: "length varint",
            offset,
            len: usize::MAX,
        })
    }

    /// Read a `len:varint utf8` string, as used for keys, strings and custom binary types.
    pub fn read_str(&mut self, step: &'static str) -> Result<&'a str> {
        let len = self.read_len()?;
        let offset = self.pos;
        let bytes = self.read_bytes(len, step)?;
        std::str::from_utf8(bytes).map_err(|_| Error::BadUtf8 { offset })
    }

    /// The type of the field starting at the current position.
    pub fn peek_type(&self) -> Result<FieldType> {
        type_of(self.peek_u8()?, self.pos)
    }

    /// Is the reader sitting on a container end marker?
    pub fn at_end_marker(&self) -> Result<bool> {
        Ok(self.peek_u8()? == CONTAINER_END)
    }
}

/// A scalar field value, borrowed from wherever it came from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scalar<'a> {
    Null,
    True,
    False,
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Float(f32),
    String(&'a str),
    Binary { mime: u32, data: &'a [u8] },
    CustomBinary { ty: &'a str, data: &'a [u8] },
}

impl<'a> Scalar<'a> {
    pub fn bool(v: bool) -> Self {
        if v {
            Scalar::True
        } else {
            Scalar::False
        }
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            Scalar::Null => FieldType::Null,
            Scalar::True => FieldType::True,
            Scalar::False => FieldType::False,
            Scalar::U8(_) => FieldType::U8,
            Scalar::U16(_) => FieldType::U16,
            Scalar::U32(_) => FieldType::U32,
            Scalar::U64(_) => FieldType::U64,
            Scalar::I8(_) => FieldType::I8,
            Scalar::I16(_) => FieldType::I16,
            Scalar::I32(_) => FieldType::I32,
            Scalar::I64(_) => FieldType::I64,
            Scalar::Float(_) => FieldType::Float,
            Scalar::String(_) => FieldType::String,
            Scalar::Binary { .. } => FieldType::Binary,
            Scalar::CustomBinary { .. } => FieldType::BinaryCustom,
        }
    }
}

/// Append a tagged scalar onto a byte vector.
pub fn serialize_scalar(buf: &mut Vec<u8>, scalar: Scalar) {
    buf.push(scalar.field_type().into());
    match scalar {
        Scalar::Null | Scalar::True | Scalar::False => (),
        Scalar::U8(v) => buf.push(v),
        Scalar::U16(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Scalar::U32(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Scalar::U64(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Scalar::I8(v) => buf.push(v as u8),
        Scalar::I16(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Scalar::I32(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Scalar::I64(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Scalar::Float(v) => buf.extend_from_slice(&v.to_bits().to_le_bytes()),
        Scalar::String(v) => encode_str(buf, v),
        Scalar::Binary { mime, data } => {
            VarInt::from_u64(mime as u64).write(buf);
            encode_bytes(buf, data);
        }
        Scalar::CustomBinary { ty, data } => {
            encode_str(buf, ty);
            encode_bytes(buf, data);
        }
    }
}

fn encode_bytes(buf: &mut Vec<u8>, data: &[u8]) {
    VarInt::from_u64(data.len() as u64).write(buf);
    buf.extend_from_slice(data);
}

fn encode_str(buf: &mut Vec<u8>, v: &str) {
    encode_bytes(buf, v.as_bytes());
}

/// Append an object property key.
pub fn encode_key(buf: &mut Vec<u8>, key: &str) {
    encode_str(buf, key);
}

/// Append an empty array.
pub fn encode_array(buf: &mut Vec<u8>, derivation: ListDerivation) {
    buf.push(FieldType::Array(derivation).into());
    buf.push(CONTAINER_END);
}

/// Append an empty object.
pub fn encode_object(buf: &mut Vec<u8>, derivation: MapDerivation) {
    buf.push(FieldType::Object(derivation).into());
    buf.push(CONTAINER_END);
}

/// Append an empty column with `capacity` null slots.
pub fn encode_column(
    buf: &mut Vec<u8>,
    ty: ColumnType,
    derivation: ListDerivation,
    capacity: usize,
) {
    buf.push(tag_for_column(derivation, ty).into());
    VarInt::from_u64(0).write(buf);
    VarInt::from_u64(capacity as u64).write(buf);
    let sentinel = ty.null_sentinel();
    for _ in 0..capacity {
        buf.extend_from_slice(&sentinel[..ty.width()]);
    }
}

/// The raw slot bytes for storing `scalar` in a column of type `ty`. Only the first
/// `ty.width()` bytes are meaningful. Null is stored as the type's sentinel; a non-null value
/// that encodes to the sentinel is refused with `InsertTooDangerous`.
pub fn column_slot(ty: ColumnType, scalar: Scalar) -> Result<[u8; 8]> {
    let mut out = [0u8; 8];
    match (ty, scalar) {
        (_, Scalar::Null) => return Ok(ty.null_sentinel()),
        (ColumnType::U8, Scalar::U8(v)) => out[0] = v,
        (ColumnType::U16, Scalar::U16(v)) => out[..2].copy_from_slice(&v.to_le_bytes()),
        (ColumnType::U32, Scalar::U32(v)) => out[..4].copy_from_slice(&v.to_le_bytes()),
        (ColumnType::U64, Scalar::U64(v)) => out.copy_from_slice(&v.to_le_bytes()),
        (ColumnType::I8, Scalar::I8(v)) => out[0] = v as u8,
        (ColumnType::I16, Scalar::I16(v)) => out[..2].copy_from_slice(&v.to_le_bytes()),
        (ColumnType::I32, Scalar::I32(v)) => out[..4].copy_from_slice(&v.to_le_bytes()),
        (ColumnType::I64, Scalar::I64(v)) => out.copy_from_slice(&v.to_le_bytes()),
        (ColumnType::Float, Scalar::Float(v)) => {
            out[..4].copy_from_slice(&v.to_bits().to_le_bytes())
        }
        (ColumnType::Boolean, Scalar::True) => out[0] = COLUMN_BOOLEAN_TRUE,
        (ColumnType::Boolean, Scalar::False) => out[0] = COLUMN_BOOLEAN_FALSE,
        (_, other) => {
            return Err(Error::TypeMismatch {
                step: "encode column slot",
                expected: ty.name(),
                actual: other.field_type().into(),
            })
        }
    }
    if ty.is_null_slot(&out) {
        return Err(Error::InsertTooDangerous("value is the column null sentinel"));
    }
    Ok(out)
}

/// Decode one raw column slot. Null slots come back as [`Scalar::Null`].
pub fn decode_column_slot(ty: ColumnType, slot: &[u8]) -> Scalar<'static> {
    if ty.is_null_slot(slot) {
        return Scalar::Null;
    }
    let mut raw = [0u8; 8];
    raw[..ty.width()].copy_from_slice(&slot[..ty.width()]);
    match ty {
        ColumnType::U8 => Scalar::U8(raw[0]),
        ColumnType::U16 => Scalar::U16(u16::from_le_bytes([raw[0], raw[1]])),
        ColumnType::U32 => Scalar::U32(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]])),
        ColumnType::U64 => Scalar::U64(u64::from_le_bytes(raw)),
        ColumnType::I8 => Scalar::I8(raw[0] as i8),
        ColumnType::I16 => Scalar::I16(i16::from_le_bytes([raw[0], raw[1]])),
        ColumnType::I32 => Scalar::I32(i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]])),
        ColumnType::I64 => Scalar::I64(i64::from_le_bytes(raw)),
        ColumnType::Float => Scalar::Float(f32::from_bits(u32::from_le_bytes([
            raw[0], raw[1], raw[2], raw[3],
        ]))),
        ColumnType::Boolean => Scalar::bool(raw[0] == COLUMN_BOOLEAN_TRUE),
    }
}

/// Decoded header of a column container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnHeader {
    pub ty: ColumnType,
    pub derivation: ListDerivation,
    /// Offset of the column's tag.
    pub start: usize,
    /// Offset of the count varint.
    pub count_offset: usize,
    pub count: usize,
    pub capacity: usize,
    /// Offset of the first slot.
    pub payload: usize,
}

impl ColumnHeader {
    /// Read the header of the column starting at `offset`, checking that the whole payload is
    /// present.
    pub fn read(data: &[u8], offset: usize) -> Result<ColumnHeader> {
        let mut r = Reader::new(data, offset);
        let tag = r.read_u8()?;
        let (ty, derivation) = match FieldType::from_u8(tag) {
            Some(FieldType::Column(ty, derivation)) => (ty, derivation),
            _ => {
                return Err(Error::TypeMismatch {
                    step: "read column header",
                    expected: "column",
                    actual: tag,
                })
            }
        };
        let count_offset = r.pos();
        let count = r.read_len()?;
        let capacity = r.read_len()?;
        if count > capacity {
            return Err(Error::Corrupted { offset, tag });
        }
        let payload = r.pos();
        let payload_len = capacity.checked_mul(ty.width()).ok_or(Error::OutOfBounds {
            step: "column payload",
            offset: payload,
            len: usize::MAX,
        })?;
        r.read_bytes(payload_len, "column payload")?;
        Ok(ColumnHeader {
            ty,
            derivation,
            start: offset,
            count_offset,
            count,
            capacity,
            payload,
        })
    }

    pub fn slot_offset(&self, index: usize) -> usize {
        self.payload + index * self.ty.width()
    }

    /// Offset just past the last slot, including unused capacity.
    pub fn end(&self) -> usize {
        self.slot_offset(self.capacity)
    }

    pub fn field_type(&self) -> FieldType {
        tag_for_column(self.derivation, self.ty)
    }
}

/// Where a container starts in a document, and how deeply it is nested. The root array is at
/// depth 1.
///
/// Positions are plain offsets: any insert ahead of the container invalidates them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub offset: usize,
    pub depth: usize,
}

/// Read a full scalar at the reader's position, advancing past it. Fails with `TypeMismatch` on
/// a container tag.
pub fn read_scalar<'a>(r: &mut Reader<'a>) -> Result<Scalar<'a>> {
    let offset = r.pos();
    let tag = r.peek_u8()?;
    let ty = type_of(tag, offset)?;
    let mut p = *r;
    p.pos += 1;
    let scalar = match ty {
        FieldType::Null => Scalar::Null,
        FieldType::True => Scalar::True,
        FieldType::False => Scalar::False,
        FieldType::U8 => Scalar::U8(p.read_u8()?),
        FieldType::U16 => Scalar::U16(p.read_u16()?),
        FieldType::U32 => Scalar::U32(p.read_u32()?),
        FieldType::U64 => Scalar::U64(p.read_u64()?),
        FieldType::I8 => Scalar::I8(p.read_i8()?),
        FieldType::I16 => Scalar::I16(p.read_i16()?),
        FieldType::I32 => Scalar::I32(p.read_i32()?),
        FieldType::I64 => Scalar::I64(p.read_i64()?),
        FieldType::Float => Scalar::Float(p.read_f32()?),
        FieldType::String => Scalar::String(p.read_str("string content")?),
        FieldType::Binary => {
            let mime = p.read_varuint()?;
            let mime = u32::try_from(mime).map_err(|_| Error::Corrupted { offset, tag })?;
            let len = p.read_len()?;
            let data = p.read_bytes(len, "binary content")?;
            Scalar::Binary { mime, data }
        }
        FieldType::BinaryCustom => {
            let ty = p.read_str("custom binary type")?;
            let len = p.read_len()?;
            let data = p.read_bytes(len, "custom binary content")?;
            Scalar::CustomBinary { ty, data }
        }
        FieldType::Array(_) | FieldType::Object(_) | FieldType::Column(..) => {
            return Err(Error::TypeMismatch {
                step: "read scalar",
                expected: "scalar",
                actual: tag,
            })
        }
    };
    *r = p;
    Ok(scalar)
}

/// Offset just past the field at `at`, with nesting counted from `at.depth`.
pub(crate) fn field_end(data: &[u8], at: Position, max_depth: usize) -> Result<usize> {
    let budget = (max_depth + 1).saturating_sub(at.depth);
    let mut r = Reader::new(data, at.offset).with_max_depth(budget);
    skip_field(&mut r)?;
    Ok(r.pos())
}

fn expect_tag(
    r: &Reader,
    step: &'static str,
    expected: &'static str,
    accept: fn(FieldType) -> bool,
) -> Result<FieldType> {
    let tag = r.peek_u8()?;
    match FieldType::from_u8(tag) {
        Some(ty) if accept(ty) => Ok(ty),
        _ => Err(Error::TypeMismatch {
            step,
            expected,
            actual: tag,
        }),
    }
}

// Advance past the body of a scalar whose tag has already been consumed.
fn skip_scalar_body(p: &mut Reader, ty: FieldType) -> Result<()> {
    if let Some(len) = ty.fixed_body_len() {
        p.read_bytes(len, "skip scalar body")?;
        return Ok(());
    }
    match ty {
        FieldType::String => {
            let len = p.read_len()?;
            p.read_bytes(len, "skip string content")?;
        }
        FieldType::Binary => {
            p.read_varuint()?;
            let len = p.read_len()?;
            p.read_bytes(len, "skip binary content")?;
        }
        FieldType::BinaryCustom => {
            let len = p.read_len()?;
            p.read_bytes(len, "skip custom binary type")?;
            let len = p.read_len()?;
            p.read_bytes(len, "skip custom binary content")?;
        }
        other => {
            return Err(Error::internal(format!(
                "skip_scalar_body called on {}",
                other.name()
            )))
        }
    }
    Ok(())
}

fn skip_key(p: &mut Reader) -> Result<()> {
    let len = p.read_len()?;
    p.read_bytes(len, "skip key")?;
    Ok(())
}

// Advance past one field of any kind. Nested arrays and objects are walked with an explicit
// stack, so the only limit on nesting is the reader's max depth.
fn skip_any(p: &mut Reader) -> Result<()> {
    let mut tracker = DepthTracker::new(p.max_depth);
    loop {
        if let Some(frame) = tracker.top() {
            if p.at_end_marker()? {
                p.pos += 1;
                tracker.pop();
                if tracker.is_empty() {
                    return Ok(());
                }
                continue;
            }
            if frame == Frame::Object {
                skip_key(p)?;
            }
        }
        let offset = p.pos;
        let ty = p.peek_type()?;
        match ty {
            FieldType::Array(_) => {
                p.pos += 1;
                tracker.push(Frame::Array)?;
            }
            FieldType::Object(_) => {
                p.pos += 1;
                tracker.push(Frame::Object)?;
            }
            FieldType::Column(..) => {
                let header = ColumnHeader::read(p.data, offset)?;
                p.pos = header.end();
            }
            scalar => {
                p.pos += 1;
                skip_scalar_body(p, scalar)?;
            }
        }
        if tracker.is_empty() {
            return Ok(());
        }
    }
}

/// Skip one field of any type.
pub fn skip_field(r: &mut Reader) -> Result<()> {
    let mut p = *r;
    skip_any(&mut p)?;
    *r = p;
    Ok(())
}

fn skip_expected(
    r: &mut Reader,
    step: &'static str,
    expected: &'static str,
    accept: fn(FieldType) -> bool,
) -> Result<()> {
    expect_tag(r, step, expected, accept)?;
    skip_field(r)
}

pub fn skip_null(r: &mut Reader) -> Result<()> {
    skip_expected(r, "skip null", "null", FieldType::is_null)
}

pub fn skip_boolean(r: &mut Reader) -> Result<()> {
    skip_expected(r, "skip boolean", "boolean", FieldType::is_boolean)
}

/// Skip any integer or float.
pub fn skip_number(r: &mut Reader) -> Result<()> {
    skip_expected(r, "skip number", "number", FieldType::is_number)
}

pub fn skip_float(r: &mut Reader) -> Result<()> {
    skip_expected(r, "skip float", "float", FieldType::is_floating)
}

pub fn skip_string(r: &mut Reader) -> Result<()> {
    skip_expected(r, "skip string", "string", FieldType::is_string)
}

/// Skip a binary or custom binary field.
pub fn skip_binary(r: &mut Reader) -> Result<()> {
    skip_expected(r, "skip binary", "binary", FieldType::is_binary)
}

pub fn skip_array(r: &mut Reader) -> Result<()> {
    skip_expected(r, "skip array", "array", FieldType::is_array_or_subtype)
}

pub fn skip_object(r: &mut Reader) -> Result<()> {
    skip_expected(r, "skip object", "object", FieldType::is_object_or_subtype)
}

pub fn skip_column(r: &mut Reader) -> Result<()> {
    skip_expected(r, "skip column", "column", FieldType::is_column_or_subtype)
}

/// Skip an object property: its key, then its field.
pub fn skip_property(r: &mut Reader) -> Result<()> {
    let mut p = *r;
    skip_key(&mut p)?;
    skip_any(&mut p)?;
    *r = p;
    Ok(())
}
