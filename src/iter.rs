//! Read cursors over containers.
//!
//! Each iterator starts before the first element. [`next`][ArrayIter::next] moves onto the next
//! element and returns `false` once the container is exhausted, after which the iterator stays
//! at the end. While on an element, the typed getters decode it; asking for the wrong type fails
//! with `TypeMismatch`.
//!
//! Iterators borrow the document immutably, so nothing can change underneath them. Descending
//! into a nested container returns an independent iterator; the parent skips over the whole
//! container on its next call to `next`.

use crate::depth_tracking::check_depth;
use crate::encode::*;
use crate::error::{Error, Result};
use crate::field_type::*;
use crate::integer::Integer;
use crate::mime::mime_by_id;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    BeforeFirst,
    OnElement,
    Terminal,
}

/// A binary blob along with its type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Binary<'a> {
    pub ty: BinaryType<'a>,
    pub data: &'a [u8],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryType<'a> {
    /// Index into the MIME table.
    Mime(u32),
    Custom(&'a str),
}

impl<'a> Binary<'a> {
    /// The MIME type or custom type name.
    pub fn type_name(&self) -> &'a str {
        match self.ty {
            BinaryType::Mime(id) => mime_by_id(id),
            BinaryType::Custom(name) => name,
        }
    }
}

/// One decoded element: a scalar, or an iterator over a nested container.
#[derive(Clone, Debug)]
pub enum Field<'a> {
    Scalar(Scalar<'a>),
    Array(ArrayIter<'a>),
    Object(ObjectIter<'a>),
    Column(ColumnIter<'a>),
}

impl<'a> Field<'a> {
    pub fn field_type(&self) -> FieldType {
        match self {
            Field::Scalar(s) => s.field_type(),
            Field::Array(a) => FieldType::Array(a.derivation()),
            Field::Object(o) => FieldType::Object(o.derivation()),
            Field::Column(c) => c.column_field_type(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Field::Scalar(Scalar::Null))
    }
}

fn mismatch(step: &'static str, expected: &'static str, actual: FieldType) -> Error {
    Error::TypeMismatch {
        step,
        expected,
        actual: actual.into(),
    }
}

fn not_on_element() -> Error {
    Error::IllegalArgument("iterator is not on an element".into())
}

// Typed getters shared by every iterator. Each iterator provides `scalar()`.
macro_rules! value_getters {
    ($($name:ident, $ty:ty, $variant:ident;)*) => {
        $(
            pub fn $name(&self) -> Result<$ty> {
                match self.scalar()? {
                    Scalar::$variant(v) => Ok(v),
                    other => Err(mismatch(
                        stringify!($name),
                        stringify!($variant),
                        other.field_type(),
                    )),
                }
            }
        )*

        pub fn is_null(&self) -> Result<bool> {
            Ok(self.field_type()?.is_null())
        }

        pub fn bool_value(&self) -> Result<bool> {
            match self.scalar()? {
                Scalar::True => Ok(true),
                Scalar::False => Ok(false),
                other => Err(mismatch("bool_value", "boolean", other.field_type())),
            }
        }

        /// Any unsigned integer, widened to `u64`.
        pub fn unsigned_value(&self) -> Result<u64> {
            match self.scalar()? {
                Scalar::U8(v) => Ok(v as u64),
                Scalar::U16(v) => Ok(v as u64),
                Scalar::U32(v) => Ok(v as u64),
                Scalar::U64(v) => Ok(v),
                other => Err(mismatch("unsigned_value", "unsigned", other.field_type())),
            }
        }

        /// Any signed integer, widened to `i64`.
        pub fn signed_value(&self) -> Result<i64> {
            match self.scalar()? {
                Scalar::I8(v) => Ok(v as i64),
                Scalar::I16(v) => Ok(v as i64),
                Scalar::I32(v) => Ok(v as i64),
                Scalar::I64(v) => Ok(v),
                other => Err(mismatch("signed_value", "signed", other.field_type())),
            }
        }

        /// Any integer, signed or unsigned.
        pub fn integer_value(&self) -> Result<Integer> {
            match self.scalar()? {
                Scalar::U8(v) => Ok(v.into()),
                Scalar::U16(v) => Ok(v.into()),
                Scalar::U32(v) => Ok(v.into()),
                Scalar::U64(v) => Ok(v.into()),
                Scalar::I8(v) => Ok(v.into()),
                Scalar::I16(v) => Ok(v.into()),
                Scalar::I32(v) => Ok(v.into()),
                Scalar::I64(v) => Ok(v.into()),
                other => Err(mismatch("integer_value", "integer", other.field_type())),
            }
        }
    };
}

// Getters for elements that can be variable-length or nested, i.e. array and object members.
macro_rules! member_getters {
    ($lt:lifetime) => {
        pub fn string_value(&self) -> Result<&$lt str> {
            match self.scalar()? {
                Scalar::String(v) => Ok(v),
                other => Err(mismatch("string_value", "string", other.field_type())),
            }
        }

        pub fn binary_value(&self) -> Result<Binary<$lt>> {
            match self.scalar()? {
                Scalar::Binary { mime, data } => Ok(Binary {
                    ty: BinaryType::Mime(mime),
                    data,
                }),
                Scalar::CustomBinary { ty, data } => Ok(Binary {
                    ty: BinaryType::Custom(ty),
                    data,
                }),
                other => Err(mismatch("binary_value", "binary", other.field_type())),
            }
        }

        pub fn field_type(&self) -> Result<FieldType> {
            self.walk.field_type()
        }

        /// Decode the current element, which must be a scalar.
        pub fn scalar(&self) -> Result<Scalar<$lt>> {
            self.walk.scalar()
        }

        /// The current element, descending into it if it's a container.
        pub fn field(&self) -> Result<Field<$lt>> {
            self.walk.field()
        }

        pub fn array_value(&self) -> Result<ArrayIter<$lt>> {
            ArrayIter::new(self.walk.data, self.walk.child()?, self.walk.max_depth)
        }

        pub fn object_value(&self) -> Result<ObjectIter<$lt>> {
            ObjectIter::new(self.walk.data, self.walk.child()?, self.walk.max_depth)
        }

        pub fn column_value(&self) -> Result<ColumnIter<$lt>> {
            ColumnIter::new(self.walk.data, self.walk.child()?, self.walk.max_depth)
        }

        /// Where the current element starts. For container elements this can be handed to the
        /// document to open an inserter on it.
        pub fn element_position(&self) -> Result<Position> {
            self.walk.child()
        }

        /// Where this container starts.
        pub fn position(&self) -> Position {
            self.walk.at
        }

        pub(crate) fn data(&self) -> &$lt [u8] {
            self.walk.data
        }

        pub(crate) fn max_depth(&self) -> usize {
            self.walk.max_depth
        }

        /// Advance to the next element. Returns false once there are no more.
        pub fn next(&mut self) -> Result<bool> {
            self.walk.advance()
        }

        /// Run to the end of the container without decoding anything, returning the offset just
        /// past it.
        pub fn fast_forward(&mut self) -> Result<usize> {
            while self.walk.advance()? {}
            Ok(self.walk.next)
        }
    };
}

// Walks the terminated sequence inside an array or object.
#[derive(Clone, Debug)]
struct Walk<'a> {
    data: &'a [u8],
    at: Position,
    max_depth: usize,
    keyed: bool,
    state: State,
    /// The next entry, or just past the end marker once terminal.
    next: usize,
    key: &'a str,
    value: usize,
}

impl<'a> Walk<'a> {
    fn new(data: &'a [u8], at: Position, max_depth: usize, keyed: bool) -> Self {
        Self {
            data,
            at,
            max_depth,
            keyed,
            state: State::BeforeFirst,
            next: at.offset + 1,
            key: "",
            value: 0,
        }
    }

    fn reader(&self, pos: usize) -> Reader<'a> {
        Reader::new(self.data, pos).with_max_depth(self.max_depth.saturating_sub(self.at.depth))
    }

    fn advance(&mut self) -> Result<bool> {
        match self.state {
            State::Terminal => return Ok(false),
            State::OnElement => {
                let mut r = self.reader(self.value);
                skip_field(&mut r)?;
                self.next = r.pos();
            }
            State::BeforeFirst => (),
        }
        let mut r = self.reader(self.next);
        if r.at_end_marker()? {
            self.state = State::Terminal;
            self.next += 1;
            return Ok(false);
        }
        if self.keyed {
            self.key = r.read_str("object key")?;
        }
        self.value = r.pos();
        self.state = State::OnElement;
        Ok(true)
    }

    fn current(&self) -> Result<usize> {
        match self.state {
            State::OnElement => Ok(self.value),
            _ => Err(not_on_element()),
        }
    }

    fn child(&self) -> Result<Position> {
        Ok(Position {
            offset: self.current()?,
            depth: self.at.depth + 1,
        })
    }

    fn field_type(&self) -> Result<FieldType> {
        let r = self.reader(self.current()?);
        r.peek_type()
    }

    fn scalar(&self) -> Result<Scalar<'a>> {
        let mut r = self.reader(self.current()?);
        read_scalar(&mut r)
    }

    fn field(&self) -> Result<Field<'a>> {
        let (data, at, depth) = (self.data, self.child()?, self.max_depth);
        Ok(match self.field_type()? {
            FieldType::Array(_) => Field::Array(ArrayIter::new(data, at, depth)?),
            FieldType::Object(_) => Field::Object(ObjectIter::new(data, at, depth)?),
            FieldType::Column(..) => Field::Column(ColumnIter::new(data, at, depth)?),
            _ => Field::Scalar(self.scalar()?),
        })
    }
}

fn expect_container(
    data: &[u8],
    at: Position,
    max_depth: usize,
    expected: &'static str,
    accept: fn(FieldType) -> bool,
) -> Result<FieldType> {
    check_depth(at.depth, max_depth)?;
    let r = Reader::new(data, at.offset);
    let ty = r.peek_type()?;
    if !accept(ty) {
        return Err(mismatch("open iterator", expected, ty));
    }
    Ok(ty)
}

/// Iterator over the elements of an array.
#[derive(Clone, Debug)]
pub struct ArrayIter<'a> {
    walk: Walk<'a>,
    derivation: ListDerivation,
}

impl<'a> ArrayIter<'a> {
    pub(crate) fn new(data: &'a [u8], at: Position, max_depth: usize) -> Result<Self> {
        let derivation = match expect_container(
            data,
            at,
            max_depth,
            "array",
            FieldType::is_array_or_subtype,
        )? {
            FieldType::Array(d) => d,
            other => return Err(Error::internal(format!("array check passed {:?}", other))),
        };
        Ok(Self {
            walk: Walk::new(data, at, max_depth, false),
            derivation,
        })
    }

    pub fn derivation(&self) -> ListDerivation {
        self.derivation
    }

    /// True if the array holds exactly one element. Doesn't move this iterator.
    pub fn is_unit(&self) -> Result<bool> {
        let mut probe = Walk::new(self.walk.data, self.walk.at, self.walk.max_depth, false);
        Ok(probe.advance()? && !probe.advance()?)
    }

    member_getters!('a);

    value_getters! {
        u8_value, u8, U8;
        u16_value, u16, U16;
        u32_value, u32, U32;
        u64_value, u64, U64;
        i8_value, i8, I8;
        i16_value, i16, I16;
        i32_value, i32, I32;
        i64_value, i64, I64;
        float_value, f32, Float;
    }
}

/// Iterator over the properties of an object.
#[derive(Clone, Debug)]
pub struct ObjectIter<'a> {
    walk: Walk<'a>,
    derivation: MapDerivation,
}

impl<'a> ObjectIter<'a> {
    pub(crate) fn new(data: &'a [u8], at: Position, max_depth: usize) -> Result<Self> {
        let derivation = match expect_container(
            data,
            at,
            max_depth,
            "object",
            FieldType::is_object_or_subtype,
        )? {
            FieldType::Object(d) => d,
            other => return Err(Error::internal(format!("object check passed {:?}", other))),
        };
        Ok(Self {
            walk: Walk::new(data, at, max_depth, true),
            derivation,
        })
    }

    pub fn derivation(&self) -> MapDerivation {
        self.derivation
    }

    /// The current property's key.
    pub fn key(&self) -> Result<&'a str> {
        self.walk.current()?;
        Ok(self.walk.key)
    }

    member_getters!('a);

    value_getters! {
        u8_value, u8, U8;
        u16_value, u16, U16;
        u32_value, u32, U32;
        u64_value, u64, U64;
        i8_value, i8, I8;
        i16_value, i16, I16;
        i32_value, i32, I32;
        i64_value, i64, I64;
        float_value, f32, Float;
    }
}

/// Bulk view of a column's used slots.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnValues<'a> {
    pub ty: ColumnType,
    pub count: usize,
    /// `count * ty.width()` little-endian bytes. Null slots hold the type's sentinel.
    pub raw: &'a [u8],
}

impl<'a> ColumnValues<'a> {
    pub fn iter(&self) -> impl Iterator<Item = Scalar<'static>> + 'a {
        let ty = self.ty;
        let raw = self.raw;
        raw.chunks_exact(ty.width())
            .map(move |slot| decode_column_slot(ty, slot))
    }
}

/// Iterator over the values of a column.
#[derive(Clone, Debug)]
pub struct ColumnIter<'a> {
    data: &'a [u8],
    header: ColumnHeader,
    depth: usize,
    state: State,
    index: usize,
}

impl<'a> ColumnIter<'a> {
    pub(crate) fn new(data: &'a [u8], at: Position, max_depth: usize) -> Result<Self> {
        expect_container(
            data,
            at,
            max_depth,
            "column",
            FieldType::is_column_or_subtype,
        )?;
        Ok(Self {
            data,
            header: ColumnHeader::read(data, at.offset)?,
            depth: at.depth,
            state: State::BeforeFirst,
            index: 0,
        })
    }

    pub fn column_type(&self) -> ColumnType {
        self.header.ty
    }

    pub fn derivation(&self) -> ListDerivation {
        self.header.derivation
    }

    /// The column's own tag type.
    pub fn column_field_type(&self) -> FieldType {
        self.header.field_type()
    }

    pub fn len(&self) -> usize {
        self.header.count
    }

    pub fn is_empty(&self) -> bool {
        self.header.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.header.capacity
    }

    pub fn position(&self) -> Position {
        Position {
            offset: self.header.start,
            depth: self.depth,
        }
    }

    /// Index of the current value.
    pub fn index(&self) -> Result<usize> {
        match self.state {
            State::OnElement => Ok(self.index),
            _ => Err(not_on_element()),
        }
    }

    pub fn next(&mut self) -> Result<bool> {
        let next = match self.state {
            State::Terminal => return Ok(false),
            State::BeforeFirst => 0,
            State::OnElement => self.index + 1,
        };
        if next < self.header.count {
            self.index = next;
            self.state = State::OnElement;
            Ok(true)
        } else {
            self.state = State::Terminal;
            Ok(false)
        }
    }

    /// Jump to the end, returning the offset just past the column's last slot.
    pub fn fast_forward(&mut self) -> Result<usize> {
        self.state = State::Terminal;
        Ok(self.header.end())
    }

    fn slot(&self, index: usize) -> &'a [u8] {
        let start = self.header.slot_offset(index);
        &self.data[start..start + self.header.ty.width()]
    }

    /// The value at `index`, or `None` past the end of the column.
    pub fn get(&self, index: usize) -> Option<Scalar<'static>> {
        (index < self.header.count).then(|| decode_column_slot(self.header.ty, self.slot(index)))
    }

    /// Whether the value at `index` is null, or `None` past the end of the column.
    pub fn is_null_at(&self, index: usize) -> Option<bool> {
        (index < self.header.count).then(|| self.header.ty.is_null_slot(self.slot(index)))
    }

    pub fn values(&self) -> ColumnValues<'a> {
        let width = self.header.ty.width();
        let start = self.header.payload;
        ColumnValues {
            ty: self.header.ty,
            count: self.header.count,
            raw: &self.data[start..start + self.header.count * width],
        }
    }

    /// The scalar type of the current value, as if it were an array element.
    pub fn field_type(&self) -> Result<FieldType> {
        let slot = self.slot(self.index()?);
        let is_null = self.header.ty.is_null_slot(slot);
        let is_true = self.header.ty == ColumnType::Boolean && slot[0] == COLUMN_BOOLEAN_TRUE;
        regular_type_of_column_entry(self.column_field_type(), is_null, is_true)
    }

    pub fn scalar(&self) -> Result<Scalar<'a>> {
        Ok(decode_column_slot(self.header.ty, self.slot(self.index()?)))
    }

    pub fn field(&self) -> Result<Field<'a>> {
        self.scalar().map(Field::Scalar)
    }

    value_getters! {
        u8_value, u8, U8;
        u16_value, u16, U16;
        u32_value, u32, U32;
        u64_value, u64, U64;
        i8_value, i8, I8;
        i16_value, i16, I16;
        i32_value, i32, I32;
        i64_value, i64, I64;
        float_value, f32, Float;
    }
}
