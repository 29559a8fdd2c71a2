//! Documents: a header and one root array, in one buffer.
//!
//! The header records the document's key and revision:
//!
//! ```text
//! document = key_type key? revision? root_array
//! ```
//!
//! | Key type        | Marker | Key encoding            |
//! | --------------- | ------ | ----------------------- |
//! | `NoKey`         | `?`    | none, and no revision   |
//! | `AutoIncrement` | `*`    | `u64` little-endian     |
//! | `Unsigned`      | `+`    | `u64` little-endian     |
//! | `Signed`        | `-`    | `i64` little-endian     |
//! | `String`        | `!`    | `len:varint utf8`       |
//!
//! The revision is a varint present whenever there is a key. [`Document::revise`] produces the
//! next revision as a new document and marks the old one as no longer the latest. Nothing here
//! resolves conflicts between revisions; callers that share documents across threads guard them
//! with their own lock.

use std::sync::atomic::{AtomicU64, Ordering};

use educe::Educe;
use serde::{Deserialize, Serialize};

use crate::encode::*;
use crate::error::{Error, Result};
use crate::field_type::*;
use crate::insert::{Inserter, Limits};
use crate::iter::{ArrayIter, ColumnIter, ObjectIter};
use crate::memfile::MemFile;
use crate::options::DocumentOptions;
use crate::varint::VarInt;

static NEXT_AUTO_KEY: AtomicU64 = AtomicU64::new(1);

/// The kind of key a document carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyType {
    #[default]
    NoKey,
    /// Unsigned keys handed out from a process-wide counter.
    AutoIncrement,
    Unsigned,
    Signed,
    String,
}

impl KeyType {
    pub fn into_u8(self) -> u8 {
        match self {
            KeyType::NoKey => b'?',
            KeyType::AutoIncrement => b'*',
            KeyType::Unsigned => b'+',
            KeyType::Signed => b'-',
            KeyType::String => b'!',
        }
    }

    pub fn from_u8(marker: u8) -> Option<KeyType> {
        Some(match marker {
            b'?' => KeyType::NoKey,
            b'*' => KeyType::AutoIncrement,
            b'+' => KeyType::Unsigned,
            b'-' => KeyType::Signed,
            b'!' => KeyType::String,
            _ => return None,
        })
    }

    pub fn has_revision(self) -> bool {
        self != KeyType::NoKey
    }

    fn accepts(self, key: &Key) -> bool {
        matches!(
            (self, key),
            (KeyType::NoKey, Key::None)
                | (KeyType::AutoIncrement, Key::Unsigned(_))
                | (KeyType::Unsigned, Key::Unsigned(_))
                | (KeyType::Signed, Key::Signed(_))
                | (KeyType::String, Key::String(_))
        )
    }
}

/// A document key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    None,
    Unsigned(u64),
    Signed(i64),
    String(String),
}

impl Key {
    fn encode(&self, buf: &mut Vec<u8>) {
        match self {
            Key::None => (),
            Key::Unsigned(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Key::Signed(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Key::String(v) => encode_key(buf, v),
        }
    }

    /// A fresh key for a new document of the given type.
    fn initial(key_type: KeyType) -> Key {
        match key_type {
            KeyType::NoKey => Key::None,
            KeyType::AutoIncrement => Key::Unsigned(NEXT_AUTO_KEY.fetch_add(1, Ordering::Relaxed)),
            KeyType::Unsigned => Key::Unsigned(0),
            KeyType::Signed => Key::Signed(0),
            KeyType::String => Key::String(String::new()),
        }
    }
}

#[derive(Clone, Debug)]
struct Header {
    key_type: KeyType,
    key: Key,
    /// Offset of the revision varint, if there is one.
    revision_at: Option<usize>,
    revision: u64,
    root: usize,
}

impl Header {
    fn read(data: &[u8]) -> Result<Header> {
        let mut r = Reader::new(data, 0);
        let marker = r.read_u8()?;
        let key_type = KeyType::from_u8(marker).ok_or(Error::Corrupted {
            offset: 0,
            tag: marker,
        })?;
        let key = match key_type {
            KeyType::NoKey => Key::None,
            KeyType::AutoIncrement | KeyType::Unsigned => Key::Unsigned(r.read_u64()?),
            KeyType::Signed => Key::Signed(r.read_i64()?),
            KeyType::String => Key::String(r.read_str("document key")?.to_owned()),
        };
        let (revision_at, revision) = if key_type.has_revision() {
            let at = r.pos();
            (Some(at), r.read_varuint()?)
        } else {
            (None, 0)
        };
        Ok(Header {
            key_type,
            key,
            revision_at,
            revision,
            root: r.pos(),
        })
    }
}

/// A mutable document.
///
/// All content lives under one root array. Use [`inserter`][Document::inserter] to add to it
/// and [`iter`][Document::iter] to read it back:
///
/// ```
/// # use carbon_pack::*;
/// let mut doc = Document::new(DocumentOptions::default());
/// let mut ins = doc.inserter()?;
/// ins.insert_string("hello")?;
/// let mut obj = ins.begin_object(MapDerivation::UnsortedMultimap)?;
/// obj.insert_prop_unsigned("n", 42)?;
/// obj.end()?;
/// ins.end()?;
///
/// let mut it = doc.iter()?;
/// assert!(it.next()?);
/// assert_eq!(it.string_value()?, "hello");
/// assert!(it.next()?);
/// let mut obj = it.object_value()?;
/// assert!(obj.next()?);
/// assert_eq!(obj.key()?, "n");
/// assert_eq!(obj.u8_value()?, 42);
/// # Ok::<(), Error>(())
/// ```
#[derive(Educe, Clone, Debug)]
#[educe(PartialEq)]
pub struct Document {
    file: MemFile,
    key_type: KeyType,
    root: usize,
    #[educe(PartialEq(ignore))]
    options: DocumentOptions,
    #[educe(PartialEq(ignore))]
    latest: bool,
}

impl Document {
    /// Create an empty document. The root array starts out empty.
    pub fn new(options: DocumentOptions) -> Self {
        let key_type = options.key_type;
        let mut buf = Vec::with_capacity(options.min_capacity);
        buf.push(key_type.into_u8());
        Key::initial(key_type).encode(&mut buf);
        if key_type.has_revision() {
            VarInt::from_u64(0).write(&mut buf);
        }
        let root = buf.len();
        encode_array(&mut buf, ListDerivation::UnsortedMultiset);
        tracing::debug!(?key_type, capacity = options.min_capacity, "create document");
        Self {
            file: MemFile::from_vec(buf),
            key_type,
            root,
            options,
            latest: true,
        }
    }

    /// Load a document from its encoded bytes, checking the header and the whole root array.
    pub fn from_bytes(buf: Vec<u8>) -> Result<Self> {
        Self::from_bytes_with(buf, DocumentOptions::default())
    }

    /// Like [`from_bytes`][Self::from_bytes], with options governing later edits. The key type
    /// always comes from the bytes.
    pub fn from_bytes_with(buf: Vec<u8>, mut options: DocumentOptions) -> Result<Self> {
        let header = Header::read(&buf)?;
        let tag = *buf.get(header.root).ok_or(Error::OutOfBounds {
            step: "root array",
            offset: header.root,
            len: 1,
        })?;
        if !type_of(tag, header.root)?.is_array_or_subtype() {
            return Err(Error::TypeMismatch {
                step: "root array",
                expected: "array",
                actual: tag,
            });
        }
        let at = Position {
            offset: header.root,
            depth: 1,
        };
        let end = field_end(&buf, at, options.max_depth)?;
        if end != buf.len() {
            return Err(Error::IllegalArgument(format!(
                "{} trailing bytes after the root array",
                buf.len() - end
            )));
        }
        options.key_type = header.key_type;
        Ok(Self {
            file: MemFile::from_vec(buf),
            key_type: header.key_type,
            root: header.root,
            options,
            latest: true,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.file.as_slice()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.file.into_vec()
    }

    /// Encoded size in bytes.
    pub fn len(&self) -> usize {
        self.file.size()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().len() == self.root + 2
    }

    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    fn header(&self) -> Result<Header> {
        Header::read(self.as_bytes())
    }

    pub fn key(&self) -> Result<Key> {
        Ok(self.header()?.key)
    }

    /// Replace the key. It must match the document's key type.
    pub fn set_key(&mut self, key: Key) -> Result<()> {
        if self.key_type == KeyType::NoKey || !self.key_type.accepts(&key) {
            return Err(Error::IllegalArgument(format!(
                "key {:?} doesn't fit key type {:?}",
                key, self.key_type
            )));
        }
        let header = self.header()?;
        let old_end = header.revision_at.unwrap_or(header.root);
        let mut payload = Vec::new();
        key.encode(&mut payload);
        self.file.seek(1)?;
        self.file.remove(old_end - 1)?;
        self.file.insert(&payload)?;
        self.root = self.root + payload.len() - (old_end - 1);
        Ok(())
    }

    /// The revision number, always 0 for documents without a key.
    pub fn revision(&self) -> Result<u64> {
        Ok(self.header()?.revision)
    }

    /// Is this the newest revision produced from this document?
    pub fn is_latest(&self) -> bool {
        self.latest
    }

    /// Make a copy with the revision bumped by one. This document stops being the latest.
    pub fn revise(&mut self) -> Result<Document> {
        let header = self.header()?;
        let revision_at = header.revision_at.ok_or_else(|| {
            Error::IllegalArgument("documents without a key have no revision".into())
        })?;
        let mut next = self.clone();
        next.file.seek(revision_at)?;
        let delta = next.file.update_varuint(header.revision + 1)?;
        next.root = (next.root as isize + delta) as usize;
        next.latest = true;
        self.latest = false;
        tracing::debug!(revision = header.revision + 1, "revise document");
        Ok(next)
    }

    pub fn root_position(&self) -> Position {
        Position {
            offset: self.root,
            depth: 1,
        }
    }

    /// Open an inserter that appends to the root array.
    pub fn inserter(&mut self) -> Result<Inserter<'_>> {
        let at = self.root_position();
        let limits = Limits::from(&self.options);
        Inserter::open(&mut self.file, at, limits)
    }

    fn inserter_at(
        &mut self,
        at: Position,
        expected: &'static str,
        accept: fn(FieldType) -> bool,
    ) -> Result<Inserter<'_>> {
        let tag = Reader::new(self.as_bytes(), at.offset).peek_u8()?;
        let ty = type_of(tag, at.offset)?;
        if !accept(ty) {
            return Err(Error::TypeMismatch {
                step: "open inserter at position",
                expected,
                actual: tag,
            });
        }
        let limits = Limits::from(&self.options);
        let ins = Inserter::open(&mut self.file, at, limits)?;
        debug_assert_eq!(ins.context().field_type(), ty);
        Ok(ins)
    }

    /// Open an inserter that appends to the array at `at`.
    pub fn array_inserter_at(&mut self, at: Position) -> Result<Inserter<'_>> {
        self.inserter_at(at, "array", FieldType::is_array_or_subtype)
    }

    pub fn object_inserter_at(&mut self, at: Position) -> Result<Inserter<'_>> {
        self.inserter_at(at, "object", FieldType::is_object_or_subtype)
    }

    pub fn column_inserter_at(&mut self, at: Position) -> Result<Inserter<'_>> {
        self.inserter_at(at, "column", FieldType::is_column_or_subtype)
    }

    /// Iterate over the root array.
    pub fn iter(&self) -> Result<ArrayIter<'_>> {
        ArrayIter::new(self.as_bytes(), self.root_position(), self.options.max_depth)
    }

    pub fn array_iter_at(&self, at: Position) -> Result<ArrayIter<'_>> {
        ArrayIter::new(self.as_bytes(), at, self.options.max_depth)
    }

    pub fn object_iter_at(&self, at: Position) -> Result<ObjectIter<'_>> {
        ObjectIter::new(self.as_bytes(), at, self.options.max_depth)
    }

    pub fn column_iter_at(&self, at: Position) -> Result<ColumnIter<'_>> {
        ColumnIter::new(self.as_bytes(), at, self.options.max_depth)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ErrKind;

    fn keyed(key_type: KeyType) -> Document {
        Document::new(DocumentOptions::default().key_type(key_type))
    }

    mod header {
        use super::*;

        #[test]
        fn no_key() {
            let doc = Document::new(DocumentOptions::default());
            assert_eq!(doc.as_bytes(), &[b'?', b'[', CONTAINER_END]);
            assert_eq!(doc.key().unwrap(), Key::None);
            assert_eq!(doc.revision().unwrap(), 0);
            assert!(doc.is_empty());
        }

        #[test]
        fn layouts() {
            let doc = keyed(KeyType::Signed);
            let mut expected = vec![b'-'];
            expected.extend_from_slice(&0i64.to_le_bytes());
            expected.extend_from_slice(&[0x80, b'[', 0]);
            assert_eq!(doc.as_bytes(), &expected[..]);

            let doc = keyed(KeyType::String);
            assert_eq!(doc.as_bytes(), &[b'!', 0x80, 0x80, b'[', 0]);
        }

        #[test]
        fn auto_keys_are_distinct() {
            let a = keyed(KeyType::AutoIncrement).key().unwrap();
            let b = keyed(KeyType::AutoIncrement).key().unwrap();
            match (a, b) {
                (Key::Unsigned(a), Key::Unsigned(b)) => assert_ne!(a, b),
                other => panic!("unexpected keys {:?}", other),
            }
        }

        #[test]
        fn set_key_shifts_root() {
            let mut doc = keyed(KeyType::String);
            doc.inserter().unwrap().insert_u8(7).unwrap();
            doc.set_key(Key::String("users/17".into())).unwrap();
            assert_eq!(doc.key().unwrap(), Key::String("users/17".into()));
            let mut it = doc.iter().unwrap();
            assert!(it.next().unwrap());
            assert_eq!(it.u8_value().unwrap(), 7);
            doc.set_key(Key::String("u".into())).unwrap();
            assert_eq!(doc.key().unwrap(), Key::String("u".into()));
            assert_eq!(doc.iter().unwrap().fast_forward().unwrap(), doc.len());

            let err = doc.set_key(Key::Unsigned(3)).unwrap_err();
            assert_eq!(err.kind(), ErrKind::IllegalArgument);
            let mut plain = keyed(KeyType::NoKey);
            assert!(plain.set_key(Key::None).is_err());
        }
    }

    mod revision {
        use super::*;

        #[test]
        fn revise() {
            let mut doc = keyed(KeyType::Unsigned);
            doc.set_key(Key::Unsigned(99)).unwrap();
            doc.inserter().unwrap().insert_true().unwrap();
            let mut prev = doc.clone();
            for rev in 1..=200u64 {
                let next = prev.revise().unwrap();
                assert!(!prev.is_latest());
                assert!(next.is_latest());
                assert_eq!(next.revision().unwrap(), rev);
                assert_eq!(next.key().unwrap(), Key::Unsigned(99));
                prev = next;
            }
            let mut it = prev.iter().unwrap();
            assert!(it.next().unwrap());
            assert!(it.bool_value().unwrap());
        }

        #[test]
        fn clone_is_equal() {
            let mut doc = keyed(KeyType::Signed);
            let copy = doc.clone();
            assert_eq!(doc, copy);
            doc.revise().unwrap();
            assert_eq!(doc, copy);
            doc.inserter().unwrap().insert_null().unwrap();
            assert_ne!(doc, copy);
        }

        #[test]
        fn unkeyed_has_none() {
            let mut doc = keyed(KeyType::NoKey);
            assert_eq!(doc.revise().unwrap_err().kind(), ErrKind::IllegalArgument);
        }
    }

    mod bytes {
        use super::*;

        #[test]
        fn round_trip() {
            let mut doc = keyed(KeyType::String);
            doc.set_key(Key::String("k".into())).unwrap();
            {
                let mut ins = doc.inserter().unwrap();
                ins.insert_string("v").unwrap();
                let mut col = ins
                    .begin_column(ColumnType::Float, ListDerivation::UnsortedMultiset, None)
                    .unwrap();
                col.insert_float(1.5).unwrap();
            }
            let back = Document::from_bytes(doc.as_bytes().to_vec()).unwrap();
            assert_eq!(back, doc);
            assert_eq!(back.key_type(), KeyType::String);
        }

        #[test]
        fn rejects_bad_input() {
            assert!(Document::from_bytes(vec![]).is_err());
            let err = Document::from_bytes(vec![b'Z', b'[', 0]).unwrap_err();
            assert_eq!(err.kind(), ErrKind::Corrupted);
            let err = Document::from_bytes(vec![b'?', b'[', 0, 0]).unwrap_err();
            assert_eq!(err.kind(), ErrKind::IllegalArgument);
            let err = Document::from_bytes(vec![b'?', b'[', b's', 0x85, b'a']).unwrap_err();
            assert_eq!(err.kind(), ErrKind::Corrupted);
            let err = Document::from_bytes(vec![b'?', b'c', 1]).unwrap_err();
            assert_eq!(err.kind(), ErrKind::TypeMismatch);
        }
    }

    mod positions {
        use super::*;

        #[test]
        fn insert_at_nested() {
            let mut doc = Document::new(DocumentOptions::default());
            {
                let mut ins = doc.inserter().unwrap();
                ins.begin_object(MapDerivation::UnsortedMultimap).unwrap();
                ins.begin_column(ColumnType::U8, ListDerivation::UnsortedMultiset, Some(1))
                    .unwrap();
            }
            let (obj_at, col_at) = {
                let mut it = doc.iter().unwrap();
                it.next().unwrap();
                let obj_at = it.element_position().unwrap();
                it.next().unwrap();
                (obj_at, it.element_position().unwrap())
            };
            assert_eq!(
                doc.array_inserter_at(obj_at).err().unwrap().kind(),
                ErrKind::TypeMismatch
            );
            // Append to the column first, since growing the object moves the column.
            {
                let mut col = doc.column_inserter_at(col_at).unwrap();
                col.insert_u8(1).unwrap();
                col.insert_u8(2).unwrap();
            }
            {
                let mut obj = doc.object_inserter_at(obj_at).unwrap();
                obj.insert_prop_true("ok").unwrap();
            }
            let mut it = doc.iter().unwrap();
            it.next().unwrap();
            let mut obj = it.object_value().unwrap();
            assert!(obj.next().unwrap());
            assert_eq!(obj.key().unwrap(), "ok");
            it.next().unwrap();
            let col = it.column_value().unwrap();
            assert_eq!(col.len(), 2);
            assert_eq!(col.get(1), Some(Scalar::U8(2)));
        }
    }
}
