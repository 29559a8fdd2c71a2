//! Serde export of decoded documents.
//!
//! Documents and decoded fields implement [`Serialize`], so they can be written out through
//! any serde data format. The mapping is:
//! - Null, booleans, integers, floats, and strings serialize as themselves
//! - Binary values serialize as a map: `{"type": <MIME or custom type>, "data": <bytes>}`,
//!   with the bytes going through `serde_bytes`
//! - Arrays and columns serialize as sequences, objects as maps in stored order
//! - A [`Document`] serializes as its root array, except that a unit root serializes as its
//!   single element, the same way [`CompactPrinter`][crate::printer::CompactPrinter] renders it
//!
//! Decoding failures partway through surface as the format's custom error.

use serde::ser::{Error as _, Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::document::Document;
use crate::encode::Scalar;
use crate::iter::{ArrayIter, Binary, ColumnIter, Field, ObjectIter};

impl Serialize for Scalar<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Scalar::Null => serializer.serialize_unit(),
            Scalar::True => serializer.serialize_bool(true),
            Scalar::False => serializer.serialize_bool(false),
            Scalar::U8(v) => serializer.serialize_u8(v),
            Scalar::U16(v) => serializer.serialize_u16(v),
            Scalar::U32(v) => serializer.serialize_u32(v),
            Scalar::U64(v) => serializer.serialize_u64(v),
            Scalar::I8(v) => serializer.serialize_i8(v),
            Scalar::I16(v) => serializer.serialize_i16(v),
            Scalar::I32(v) => serializer.serialize_i32(v),
            Scalar::I64(v) => serializer.serialize_i64(v),
            Scalar::Float(v) => serializer.serialize_f32(v),
            Scalar::String(v) => serializer.serialize_str(v),
            Scalar::Binary { mime, data } => Binary {
                ty: crate::iter::BinaryType::Mime(mime),
                data,
            }
            .serialize(serializer),
            Scalar::CustomBinary { ty, data } => Binary {
                ty: crate::iter::BinaryType::Custom(ty),
                data,
            }
            .serialize(serializer),
        }
    }
}

impl Serialize for Binary<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("type", self.type_name())?;
        map.serialize_entry("data", serde_bytes::Bytes::new(self.data))?;
        map.end()
    }
}

impl Serialize for Field<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Scalar(s) => s.serialize(serializer),
            Field::Array(a) => a.serialize(serializer),
            Field::Object(o) => o.serialize(serializer),
            Field::Column(c) => c.serialize(serializer),
        }
    }
}

impl Serialize for ArrayIter<'_> {
    /// Serializes the whole array from its first element, wherever this iterator currently is.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut it = ArrayIter::new(self.data(), self.position(), self.max_depth())
            .map_err(S::Error::custom)?;
        let mut seq = serializer.serialize_seq(None)?;
        while it.next().map_err(S::Error::custom)? {
            seq.serialize_element(&it.field().map_err(S::Error::custom)?)?;
        }
        seq.end()
    }
}

impl Serialize for ObjectIter<'_> {
    /// Serializes the whole object from its first property, wherever this iterator currently is.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut it = ObjectIter::new(self.data(), self.position(), self.max_depth())
            .map_err(S::Error::custom)?;
        let mut map = serializer.serialize_map(None)?;
        while it.next().map_err(S::Error::custom)? {
            map.serialize_entry(
                it.key().map_err(S::Error::custom)?,
                &it.field().map_err(S::Error::custom)?,
            )?;
        }
        map.end()
    }
}

impl Serialize for ColumnIter<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let values = self.values();
        let mut seq = serializer.serialize_seq(Some(values.count))?;
        for v in values.iter() {
            seq.serialize_element(&v)?;
        }
        seq.end()
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let root = self.iter().map_err(S::Error::custom)?;
        if root.is_unit().map_err(S::Error::custom)? {
            let mut root = root;
            root.next().map_err(S::Error::custom)?;
            root.field().map_err(S::Error::custom)?.serialize(serializer)
        } else {
            root.serialize(serializer)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::field_type::{ColumnType, ListDerivation};
    use crate::options::DocumentOptions;
    use serde_json::{json, Value};

    fn to_value(doc: &Document) -> Value {
        serde_json::to_value(doc).unwrap()
    }

    #[test]
    fn matches_ingested_json() {
        let input = json!({
            "a": [1, 2, 3],
            "b": {"c": "x", "d": [true, null]},
            "e": [-1, "mixed"],
            "f": 2.5
        });
        let doc = Document::from_json_value(&input, DocumentOptions::default()).unwrap();
        assert_eq!(to_value(&doc), input);
    }

    #[test]
    fn multi_element_root() {
        let mut doc = Document::new(DocumentOptions::default());
        {
            let mut ins = doc.inserter().unwrap();
            ins.insert_unsigned(5).unwrap();
            ins.insert_null().unwrap();
            let mut col = ins
                .begin_column(ColumnType::I16, ListDerivation::UnsortedMultiset, None)
                .unwrap();
            col.insert_i16(-2).unwrap();
        }
        assert_eq!(to_value(&doc), json!([5, null, [-2]]));
    }

    #[test]
    fn binary_entries() {
        let mut doc = Document::new(DocumentOptions::default());
        {
            let mut ins = doc.inserter().unwrap();
            ins.insert_binary(&[1, 2], "", "thing").unwrap();
            ins.insert_binary(&[3], "json", "").unwrap();
        }
        assert_eq!(
            to_value(&doc),
            json!([
                {"type": "thing", "data": [1, 2]},
                {"type": "application/json", "data": [3]}
            ])
        );
    }

    #[test]
    fn mid_iteration_serializes_whole_container() {
        let doc = Document::from_json("[[1, \"a\"], 2]", DocumentOptions::default()).unwrap();
        let mut root = doc.iter().unwrap();
        root.next().unwrap();
        let mut arr = root.array_value().unwrap();
        arr.next().unwrap();
        arr.next().unwrap();
        assert_eq!(serde_json::to_value(&arr).unwrap(), json!([[1, "a"], 2]));
    }
}
