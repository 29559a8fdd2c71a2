//! In-place insertion into containers.
//!
//! An [`Inserter`] is bound to one container and appends fields at its end. Arrays and objects
//! grow by shifting everything after the insertion point forward. Columns write into their next
//! free slot, growing their capacity by [`COLUMN_GROWTH_FACTOR`] when full.
//!
//! Nested containers get their own inserter, which mutably borrows the parent for as long as it
//! lives. When it ends (or is dropped) the parent's insertion point moves to just past the
//! nested container.

use std::convert::TryFrom;

use crate::depth_tracking::check_depth;
use crate::encode::*;
use crate::error::{Error, Result};
use crate::field_type::*;
use crate::integer::{minimal_type_for_signed, minimal_type_for_unsigned, Integer};
use crate::memfile::MemFile;
use crate::mime::mime_id_for_ext;
use crate::options::DocumentOptions;
use crate::{COLUMN_GROWTH_FACTOR, DEFAULT_COLUMN_CAPACITY, MAX_DEPTH};

/// The kind of container an [`Inserter`] is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Context {
    Array(ListDerivation),
    Object(MapDerivation),
    Column(ColumnType, ListDerivation),
}

impl Context {
    pub fn name(&self) -> &'static str {
        match self {
            Context::Array(_) => "array",
            Context::Object(_) => "object",
            Context::Column(..) => "column",
        }
    }

    pub fn field_type(&self) -> FieldType {
        match *self {
            Context::Array(d) => FieldType::Array(d),
            Context::Object(d) => FieldType::Object(d),
            Context::Column(ty, d) => FieldType::Column(ty, d),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Limits {
    pub max_depth: usize,
    pub column_capacity: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            column_capacity: DEFAULT_COLUMN_CAPACITY,
        }
    }
}

impl From<&DocumentOptions> for Limits {
    fn from(opts: &DocumentOptions) -> Self {
        Self {
            max_depth: opts.max_depth,
            column_capacity: opts.column_capacity.max(1),
        }
    }
}

struct ParentLink<'a> {
    pos: &'a mut usize,
    written: &'a mut usize,
}

/// Capacity of a column after one growth step: the old capacity times
/// [`COLUMN_GROWTH_FACTOR`], rounded up, and always at least one more slot.
pub fn grown_capacity(capacity: usize) -> usize {
    let grown = (capacity as f64 * COLUMN_GROWTH_FACTOR).ceil() as usize;
    grown.max(capacity + 1)
}

/// Convert an integer into a scalar of a specific integer type, failing if it doesn't fit.
pub(crate) fn integer_scalar(n: Integer, ty: FieldType) -> Result<Scalar<'static>> {
    let overflow = |_| Error::IllegalArgument(format!("{} does not fit in {}", n, ty.name()));
    Ok(match ty {
        FieldType::U8 => Scalar::U8(u8::try_from(n).map_err(overflow)?),
        FieldType::U16 => Scalar::U16(u16::try_from(n).map_err(overflow)?),
        FieldType::U32 => Scalar::U32(u32::try_from(n).map_err(overflow)?),
        FieldType::U64 => Scalar::U64(u64::try_from(n).map_err(overflow)?),
        FieldType::I8 => Scalar::I8(i8::try_from(n).map_err(overflow)?),
        FieldType::I16 => Scalar::I16(i16::try_from(n).map_err(overflow)?),
        FieldType::I32 => Scalar::I32(i32::try_from(n).map_err(overflow)?),
        FieldType::I64 => Scalar::I64(i64::try_from(n).map_err(overflow)?),
        other => {
            return Err(Error::TypeMismatch {
                step: "convert integer",
                expected: "integer",
                actual: other.into(),
            })
        }
    })
}

fn unsupported(op: &'static str, context: Context) -> Error {
    Error::UnsupportedContainer {
        op,
        container: context.name(),
    }
}

/// A write cursor bound to one container.
pub struct Inserter<'a> {
    file: &'a mut MemFile,
    context: Context,
    start: usize,
    /// Where the next array or object field goes, which is always the end marker's offset.
    pos: usize,
    written: usize,
    depth: usize,
    limits: Limits,
    parent: Option<ParentLink<'a>>,
    closed: bool,
}

macro_rules! typed_inserts {
    ($($name:ident, $prop:ident, $ty:ty, $variant:ident;)*) => {
        $(
            pub fn $name(&mut self, v: $ty) -> Result<()> {
                self.insert(Scalar::$variant(v))
            }

            pub fn $prop(&mut self, key: &str, v: $ty) -> Result<usize> {
                self.insert_prop(key, Scalar::$variant(v))
            }
        )*
    };
}

impl<'a> Inserter<'a> {
    /// Bind to the container at `at`, which must already be in the file.
    pub(crate) fn open(file: &'a mut MemFile, at: Position, limits: Limits) -> Result<Self> {
        check_depth(at.depth, limits.max_depth)?;
        let data = file.as_slice();
        let tag = *data.get(at.offset).ok_or(Error::OutOfBounds {
            step: "open inserter",
            offset: at.offset,
            len: 1,
        })?;
        let (context, pos) = match type_of(tag, at.offset)? {
            FieldType::Array(d) => (Context::Array(d), field_end(data, at, limits.max_depth)? - 1),
            FieldType::Object(d) => {
                (Context::Object(d), field_end(data, at, limits.max_depth)? - 1)
            }
            FieldType::Column(ty, d) => {
                (Context::Column(ty, d), ColumnHeader::read(data, at.offset)?.end())
            }
            _ => {
                return Err(Error::TypeMismatch {
                    step: "open inserter",
                    expected: "container",
                    actual: tag,
                })
            }
        };
        Ok(Self {
            file,
            context,
            start: at.offset,
            pos,
            written: 0,
            depth: at.depth,
            limits,
            parent: None,
            closed: false,
        })
    }

    pub fn context(&self) -> Context {
        self.context
    }

    pub fn position(&self) -> Position {
        Position {
            offset: self.start,
            depth: self.depth,
        }
    }

    /// Bytes this inserter has added to the document so far, including everything written
    /// through nested inserters that have ended.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Number of values in the column. Only valid on a column.
    pub fn len(&self) -> Result<usize> {
        self.column_header("column length").map(|h| h.count)
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|n| n == 0)
    }

    /// Number of slots reserved in the column. Only valid on a column.
    pub fn capacity(&self) -> Result<usize> {
        self.column_header("column capacity").map(|h| h.capacity)
    }

    fn column_header(&self, op: &'static str) -> Result<ColumnHeader> {
        match self.context {
            Context::Column(..) => ColumnHeader::read(self.file.as_slice(), self.start),
            other => Err(unsupported(op, other)),
        }
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.file.seek(self.pos)?;
        self.file.insert(bytes)?;
        self.pos += bytes.len();
        self.written += bytes.len();
        Ok(())
    }

    /// Append one scalar. Arrays take any scalar. Columns take nulls and values of exactly
    /// their element type. Objects need a key, so use [`insert_prop`][Self::insert_prop].
    pub fn insert(&mut self, scalar: Scalar) -> Result<()> {
        match self.context {
            Context::Array(_) => {
                let mut buf = Vec::new();
                serialize_scalar(&mut buf, scalar);
                self.write_raw(&buf)
            }
            Context::Column(ty, _) => match scalar {
                Scalar::String(_) | Scalar::Binary { .. } | Scalar::CustomBinary { .. } => {
                    Err(unsupported("insert variable-length value", self.context))
                }
                _ => self.column_push(ty, scalar),
            },
            Context::Object(_) => Err(unsupported("insert without a key", self.context)),
        }
    }

    /// Append a key and scalar to an object, returning the bytes written.
    pub fn insert_prop(&mut self, key: &str, scalar: Scalar) -> Result<usize> {
        if !matches!(self.context, Context::Object(_)) {
            return Err(unsupported("insert property", self.context));
        }
        let mut buf = Vec::new();
        encode_key(&mut buf, key);
        serialize_scalar(&mut buf, scalar);
        self.write_raw(&buf)?;
        Ok(buf.len())
    }

    pub fn insert_null(&mut self) -> Result<()> {
        self.insert(Scalar::Null)
    }

    pub fn insert_true(&mut self) -> Result<()> {
        self.insert(Scalar::True)
    }

    pub fn insert_false(&mut self) -> Result<()> {
        self.insert(Scalar::False)
    }

    pub fn insert_bool(&mut self, v: bool) -> Result<()> {
        self.insert(Scalar::bool(v))
    }

    pub fn insert_prop_null(&mut self, key: &str) -> Result<usize> {
        self.insert_prop(key, Scalar::Null)
    }

    pub fn insert_prop_true(&mut self, key: &str) -> Result<usize> {
        self.insert_prop(key, Scalar::True)
    }

    pub fn insert_prop_false(&mut self, key: &str) -> Result<usize> {
        self.insert_prop(key, Scalar::False)
    }

    pub fn insert_prop_bool(&mut self, key: &str, v: bool) -> Result<usize> {
        self.insert_prop(key, Scalar::bool(v))
    }

    typed_inserts! {
        insert_u8, insert_prop_u8, u8, U8;
        insert_u16, insert_prop_u16, u16, U16;
        insert_u32, insert_prop_u32, u32, U32;
        insert_u64, insert_prop_u64, u64, U64;
        insert_i8, insert_prop_i8, i8, I8;
        insert_i16, insert_prop_i16, i16, I16;
        insert_i32, insert_prop_i32, i32, I32;
        insert_i64, insert_prop_i64, i64, I64;
        insert_float, insert_prop_float, f32, Float;
    }

    fn refuse_auto_width(&self) -> Result<()> {
        if let Context::Column(..) = self.context {
            return Err(Error::InsertTooDangerous(
                "automatic integer width inside a fixed-width column",
            ));
        }
        Ok(())
    }

    /// Append an unsigned integer in the narrowest width that holds it.
    pub fn insert_unsigned(&mut self, v: u64) -> Result<()> {
        self.refuse_auto_width()?;
        self.insert(integer_scalar(v.into(), minimal_type_for_unsigned(v))?)
    }

    /// Append a signed integer in the narrowest signed width that holds it.
    pub fn insert_signed(&mut self, v: i64) -> Result<()> {
        self.refuse_auto_width()?;
        self.insert(integer_scalar(v.into(), minimal_type_for_signed(v))?)
    }

    pub fn insert_prop_unsigned(&mut self, key: &str, v: u64) -> Result<usize> {
        self.insert_prop(key, integer_scalar(v.into(), minimal_type_for_unsigned(v))?)
    }

    pub fn insert_prop_signed(&mut self, key: &str, v: i64) -> Result<usize> {
        self.insert_prop(key, integer_scalar(v.into(), minimal_type_for_signed(v))?)
    }

    fn require_array(&self, op: &'static str) -> Result<()> {
        match self.context {
            Context::Array(_) => Ok(()),
            other => Err(unsupported(op, other)),
        }
    }

    pub fn insert_string(&mut self, v: &str) -> Result<()> {
        self.require_array("insert string")?;
        self.insert(Scalar::String(v))
    }

    /// Append the first `len` bytes of `v` as a string. `len` must land on a character
    /// boundary.
    pub fn insert_nchar(&mut self, v: &str, len: usize) -> Result<()> {
        self.require_array("insert string")?;
        let prefix = v.get(..len).ok_or_else(|| {
            Error::IllegalArgument(format!(
                "{} bytes is past the end or not on a character boundary of a {}-byte string",
                len,
                v.len()
            ))
        })?;
        self.insert(Scalar::String(prefix))
    }

    pub fn insert_prop_string(&mut self, key: &str, v: &str) -> Result<usize> {
        self.insert_prop(key, Scalar::String(v))
    }

    /// Append a binary blob. A non-empty `custom_type` stores the blob with that type name;
    /// otherwise the MIME type is looked up from `ext`.
    pub fn insert_binary(&mut self, data: &[u8], ext: &str, custom_type: &str) -> Result<()> {
        self.require_array("insert binary")?;
        self.insert(binary_scalar(data, ext, custom_type))
    }

    pub fn insert_prop_binary(
        &mut self,
        key: &str,
        data: &[u8],
        ext: &str,
        custom_type: &str,
    ) -> Result<usize> {
        self.insert_prop(key, binary_scalar(data, ext, custom_type))
    }

    fn column_push(&mut self, ty: ColumnType, scalar: Scalar) -> Result<()> {
        let slot = column_slot(ty, scalar)?;
        let before = self.file.size();
        let mut header = ColumnHeader::read(self.file.as_slice(), self.start)?;
        if header.count >= header.capacity {
            header = self.grow_column(header)?;
        }
        let width = ty.width();
        self.file.seek(header.slot_offset(header.count))?;
        self.file.write(&slot[..width])?;
        self.file.seek(header.count_offset)?;
        self.file.update_varuint(header.count as u64 + 1)?;
        self.written += self.file.size() - before;
        Ok(())
    }

    fn grow_column(&mut self, header: ColumnHeader) -> Result<ColumnHeader> {
        let old = header.capacity;
        let new = grown_capacity(old);
        let width = header.ty.width();
        self.file.seek(header.count_offset)?;
        self.file.skip_varuint()?;
        self.file.update_varuint(new as u64)?;
        let payload = self.file.tell();
        let sentinel = header.ty.null_sentinel();
        let mut fill = Vec::with_capacity((new - old) * width);
        for _ in old..new {
            fill.extend_from_slice(&sentinel[..width]);
        }
        self.file.seek(payload + old * width)?;
        self.file.insert(&fill)?;
        tracing::debug!(column = self.start, old, new, "grow column capacity");
        ColumnHeader::read(self.file.as_slice(), self.start)
    }

    fn begin_nested(
        &mut self,
        key: Option<&str>,
        context: Context,
        capacity: Option<usize>,
    ) -> Result<Inserter<'_>> {
        check_depth(self.depth + 1, self.limits.max_depth)?;
        let mut buf = Vec::new();
        if let Some(key) = key {
            encode_key(&mut buf, key);
        }
        let key_len = buf.len();
        let start = self.pos + key_len;
        match context {
            Context::Array(d) => encode_array(&mut buf, d),
            Context::Object(d) => encode_object(&mut buf, d),
            Context::Column(ty, d) => {
                let capacity = capacity.unwrap_or(self.limits.column_capacity);
                encode_column(&mut buf, ty, d, capacity)
            }
        }
        let inner_pos = match context {
            Context::Column(..) => self.pos + buf.len(),
            _ => self.pos + buf.len() - 1,
        };
        self.file.seek(self.pos)?;
        self.file.insert(&buf)?;
        self.pos = start;
        self.written += key_len;
        Ok(Inserter {
            file: &mut *self.file,
            context,
            start,
            pos: inner_pos,
            written: 0,
            depth: self.depth + 1,
            limits: self.limits,
            parent: Some(ParentLink {
                pos: &mut self.pos,
                written: &mut self.written,
            }),
            closed: false,
        })
    }

    pub fn begin_array(&mut self, derivation: ListDerivation) -> Result<Inserter<'_>> {
        self.require_array("begin array")?;
        self.begin_nested(None, Context::Array(derivation), None)
    }

    pub fn begin_object(&mut self, derivation: MapDerivation) -> Result<Inserter<'_>> {
        self.require_array("begin object")?;
        self.begin_nested(None, Context::Object(derivation), None)
    }

    /// Start a column. `capacity` of `None` uses the document's configured column capacity.
    pub fn begin_column(
        &mut self,
        ty: ColumnType,
        derivation: ListDerivation,
        capacity: Option<usize>,
    ) -> Result<Inserter<'_>> {
        self.require_array("begin column")?;
        self.begin_nested(None, Context::Column(ty, derivation), capacity)
    }

    fn require_object(&self, op: &'static str) -> Result<()> {
        match self.context {
            Context::Object(_) => Ok(()),
            other => Err(unsupported(op, other)),
        }
    }

    pub fn begin_prop_array(
        &mut self,
        key: &str,
        derivation: ListDerivation,
    ) -> Result<Inserter<'_>> {
        self.require_object("begin array property")?;
        self.begin_nested(Some(key), Context::Array(derivation), None)
    }

    pub fn begin_prop_object(
        &mut self,
        key: &str,
        derivation: MapDerivation,
    ) -> Result<Inserter<'_>> {
        self.require_object("begin object property")?;
        self.begin_nested(Some(key), Context::Object(derivation), None)
    }

    pub fn begin_prop_column(
        &mut self,
        key: &str,
        ty: ColumnType,
        derivation: ListDerivation,
        capacity: Option<usize>,
    ) -> Result<Inserter<'_>> {
        self.require_object("begin column property")?;
        self.begin_nested(Some(key), Context::Column(ty, derivation), capacity)
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if self.parent.is_none() {
            return Ok(());
        }
        let end = field_end(self.file.as_slice(), self.position(), self.limits.max_depth)?;
        if let Some(parent) = self.parent.as_mut() {
            *parent.written += end - *parent.pos;
            *parent.pos = end;
        }
        Ok(())
    }

    /// Finish this container. For a nested container, the parent resumes just past it.
    pub fn end(mut self) -> Result<()> {
        self.close()
    }
}

impl Drop for Inserter<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            tracing::warn!(%err, container = self.start, "failed to close inserter on drop");
        }
    }
}

fn binary_scalar<'b>(data: &'b [u8], ext: &str, custom_type: &'b str) -> Scalar<'b> {
    if custom_type.is_empty() {
        Scalar::Binary {
            mime: mime_id_for_ext(ext),
            data,
        }
    } else {
        Scalar::CustomBinary {
            ty: custom_type,
            data,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ErrKind;

    fn root() -> MemFile {
        let mut buf = Vec::new();
        encode_array(&mut buf, ListDerivation::UnsortedMultiset);
        MemFile::from_vec(buf)
    }

    fn open(file: &mut MemFile) -> Inserter<'_> {
        Inserter::open(file, Position { offset: 0, depth: 1 }, Limits::default()).unwrap()
    }

    mod array {
        use super::*;

        #[test]
        fn scalars() {
            let mut file = root();
            let mut ins = open(&mut file);
            ins.insert_u8(1).unwrap();
            ins.insert_string("a").unwrap();
            ins.insert_null().unwrap();
            assert_eq!(ins.written(), 2 + 3 + 1);
            ins.end().unwrap();
            assert_eq!(file.as_slice(), &[b'[', b'c', 1, b's', 0x81, b'a', b'n', 0]);
        }

        #[test]
        fn minimal_widths() {
            let mut file = root();
            let mut ins = open(&mut file);
            ins.insert_unsigned(300).unwrap();
            ins.insert_signed(-2).unwrap();
            ins.insert_signed(5).unwrap();
            ins.end().unwrap();
            assert_eq!(
                file.as_slice(),
                &[b'[', b'd', 0x2c, 0x01, b'C', 0xfe, b'C', 5, 0]
            );
        }

        #[test]
        fn nchar_and_binary() {
            let mut file = root();
            let mut ins = open(&mut file);
            ins.insert_nchar("hello", 2).unwrap();
            assert_eq!(
                ins.insert_nchar("héllo", 2).unwrap_err().kind(),
                ErrKind::IllegalArgument
            );
            ins.insert_binary(&[7], "json", "").unwrap();
            ins.insert_binary(&[8], "json", "my/type").unwrap();
            ins.end().unwrap();
            let mut r = Reader::new(file.as_slice(), 1);
            assert_eq!(read_scalar(&mut r).unwrap(), Scalar::String("he"));
            assert_eq!(
                read_scalar(&mut r).unwrap(),
                Scalar::Binary {
                    mime: mime_id_for_ext("json"),
                    data: &[7]
                }
            );
            assert_eq!(
                read_scalar(&mut r).unwrap(),
                Scalar::CustomBinary {
                    ty: "my/type",
                    data: &[8]
                }
            );
        }

        #[test]
        fn wrong_context() {
            let mut file = root();
            let mut ins = open(&mut file);
            let err = ins.insert_prop_u8("a", 1).unwrap_err();
            assert_eq!(err.kind(), ErrKind::UnsupportedContainer);
            assert!(ins.begin_prop_array("a", ListDerivation::SortedSet).is_err());
            assert_eq!(ins.len().unwrap_err().kind(), ErrKind::UnsupportedContainer);
        }
    }

    mod nesting {
        use super::*;

        #[test]
        fn object_then_sibling() {
            let mut file = root();
            let mut ins = open(&mut file);
            {
                let mut obj = ins.begin_object(MapDerivation::UnsortedMultimap).unwrap();
                obj.insert_prop_u8("a", 1).unwrap();
                let mut arr = obj
                    .begin_prop_array("b", ListDerivation::UnsortedMultiset)
                    .unwrap();
                arr.insert_true().unwrap();
                arr.end().unwrap();
                assert_eq!(
                    obj.insert_u8(5).unwrap_err().kind(),
                    ErrKind::UnsupportedContainer
                );
                obj.end().unwrap();
            }
            ins.insert_u8(2).unwrap();
            assert_eq!(ins.written(), 11 + 2);
            ins.end().unwrap();
            assert_eq!(
                file.as_slice(),
                &[
                    b'[', b'{', 0x81, b'a', b'c', 1, 0x81, b'b', b'[', b't', 0, 0, b'c', 2, 0
                ]
            );
        }

        #[test]
        fn drop_repositions_parent() {
            let mut file = root();
            let mut ins = open(&mut file);
            {
                let mut arr = ins.begin_array(ListDerivation::SortedSet).unwrap();
                arr.insert_false().unwrap();
            }
            ins.insert_true().unwrap();
            drop(ins);
            assert_eq!(file.as_slice(), &[b'[', b'=', b'f', 0, b't', 0]);
        }

        #[test]
        fn depth_limit() {
            let mut file = root();
            let limits = Limits {
                max_depth: 2,
                ..Limits::default()
            };
            let mut ins =
                Inserter::open(&mut file, Position { offset: 0, depth: 1 }, limits).unwrap();
            let mut inner = ins.begin_array(ListDerivation::UnsortedMultiset).unwrap();
            let err = inner
                .begin_object(MapDerivation::UnsortedMultimap)
                .err()
                .unwrap();
            assert_eq!(err.kind(), ErrKind::IllegalArgument);
        }

        #[test]
        fn reopen_nested() {
            let mut file = root();
            let mut ins = open(&mut file);
            ins.insert_u8(9).unwrap();
            let at = {
                let obj = ins.begin_object(MapDerivation::SortedMap).unwrap();
                obj.position()
            };
            ins.end().unwrap();
            assert_eq!(at, Position { offset: 3, depth: 2 });
            let mut obj = Inserter::open(&mut file, at, Limits::default()).unwrap();
            obj.insert_prop_string("k", "v").unwrap();
            obj.end().unwrap();
            assert_eq!(
                file.as_slice(),
                &[b'[', b'c', 9, b'#', 0x81, b'k', b's', 0x81, b'v', 0, 0]
            );
        }
    }

    mod column {
        use super::*;

        #[test]
        fn growth() {
            let mut file = root();
            let mut ins = open(&mut file);
            let mut col = ins
                .begin_column(ColumnType::U8, ListDerivation::UnsortedMultiset, Some(2))
                .unwrap();
            let mut last_capacity = col.capacity().unwrap();
            for n in 0..20u8 {
                col.insert_u8(n).unwrap();
                let capacity = col.capacity().unwrap();
                assert!(capacity >= (n as usize) + 1);
                if capacity != last_capacity {
                    let min = (last_capacity as f64 * 1.7).ceil() as usize;
                    assert!(capacity >= min);
                    last_capacity = capacity;
                }
            }
            assert_eq!(col.len().unwrap(), 20);
            col.end().unwrap();
            ins.insert_true().unwrap();
            ins.end().unwrap();
            let header = ColumnHeader::read(file.as_slice(), 1).unwrap();
            for i in 0..header.capacity {
                let slot = &file.as_slice()[header.slot_offset(i)..header.slot_offset(i + 1)];
                let expected = if i < 20 {
                    Scalar::U8(i as u8)
                } else {
                    Scalar::Null
                };
                assert_eq!(decode_column_slot(ColumnType::U8, slot), expected);
            }
            assert_eq!(file.as_slice()[header.end()], b't');
        }

        #[test]
        fn count_varint_widens() {
            let mut file = root();
            let mut ins = open(&mut file);
            let mut col = ins
                .begin_column(ColumnType::I16, ListDerivation::SortedMultiset, Some(1))
                .unwrap();
            for n in 0..300i16 {
                col.insert_i16(n - 150).unwrap();
            }
            col.insert_null().unwrap();
            col.end().unwrap();
            ins.end().unwrap();
            let header = ColumnHeader::read(file.as_slice(), 1).unwrap();
            assert_eq!(header.count, 301);
            for i in 0..300 {
                let slot = &file.as_slice()[header.slot_offset(i)..];
                assert_eq!(
                    decode_column_slot(ColumnType::I16, slot),
                    Scalar::I16(i as i16 - 150)
                );
            }
            let slot = &file.as_slice()[header.slot_offset(300)..];
            assert_eq!(decode_column_slot(ColumnType::I16, slot), Scalar::Null);
            assert_eq!(file.as_slice()[header.end()], CONTAINER_END);
            assert_eq!(header.end() + 1, file.size());
        }

        #[test]
        fn refuses_mismatches() {
            let mut file = root();
            let mut ins = open(&mut file);
            let mut col = ins
                .begin_column(ColumnType::Boolean, ListDerivation::UnsortedMultiset, None)
                .unwrap();
            assert_eq!(col.capacity().unwrap(), DEFAULT_COLUMN_CAPACITY);
            col.insert_true().unwrap();
            assert_eq!(
                col.insert_u16(1).unwrap_err().kind(),
                ErrKind::TypeMismatch
            );
            assert_eq!(
                col.insert_unsigned(1).unwrap_err().kind(),
                ErrKind::InsertTooDangerous
            );
            assert_eq!(
                col.insert_string("x").unwrap_err().kind(),
                ErrKind::UnsupportedContainer
            );
            assert_eq!(
                col.insert(Scalar::String("x")).unwrap_err().kind(),
                ErrKind::UnsupportedContainer
            );
            assert!(col.begin_array(ListDerivation::UnsortedMultiset).is_err());
            assert_eq!(col.len().unwrap(), 1);
        }

        #[test]
        fn refuses_sentinels() {
            let cases: [(ColumnType, Scalar); 9] = [
                (ColumnType::U8, Scalar::U8(u8::MAX)),
                (ColumnType::U16, Scalar::U16(u16::MAX)),
                (ColumnType::U32, Scalar::U32(u32::MAX)),
                (ColumnType::U64, Scalar::U64(u64::MAX)),
                (ColumnType::I8, Scalar::I8(i8::MIN + 1)),
                (ColumnType::I16, Scalar::I16(i16::MIN + 1)),
                (ColumnType::I32, Scalar::I32(i32::MIN + 1)),
                (ColumnType::I64, Scalar::I64(i64::MIN + 1)),
                (ColumnType::Float, Scalar::Float(f32::NAN)),
            ];
            for (ty, sentinel) in cases {
                let mut file = root();
                let mut ins = open(&mut file);
                let mut col = ins
                    .begin_column(ty, ListDerivation::UnsortedMultiset, Some(2))
                    .unwrap();
                let err = col.insert(sentinel).unwrap_err();
                assert_eq!(err.kind(), ErrKind::InsertTooDangerous, "{:?}", ty);
                assert_eq!(col.len().unwrap(), 0, "{:?}", ty);
                col.insert_null().unwrap();
                col.end().unwrap();
                ins.end().unwrap();
                let header = ColumnHeader::read(file.as_slice(), 1).unwrap();
                assert_eq!(header.count, 1);
            }

            let mut file = root();
            let mut ins = open(&mut file);
            let mut col = ins
                .begin_column(ColumnType::U8, ListDerivation::UnsortedMultiset, None)
                .unwrap();
            assert_eq!(col.insert_u8(255).unwrap_err().kind(), ErrKind::InsertTooDangerous);
            assert_eq!(col.insert_i8(-127).unwrap_err().kind(), ErrKind::TypeMismatch);
            col.insert_u8(254).unwrap();
            col.end().unwrap();
            ins.end().unwrap();
            let header = ColumnHeader::read(file.as_slice(), 1).unwrap();
            let slot = &file.as_slice()[header.slot_offset(0)..];
            assert_eq!(decode_column_slot(ColumnType::U8, slot), Scalar::U8(254));
        }
    }

    #[test]
    fn capacity_steps() {
        assert_eq!(grown_capacity(0), 1);
        assert_eq!(grown_capacity(1), 2);
        assert_eq!(grown_capacity(2), 4);
        assert_eq!(grown_capacity(4), 7);
        assert_eq!(grown_capacity(10), 17);
    }
}
