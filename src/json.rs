//! JSON ingestion.
//!
//! A parsed JSON tree is written into a fresh document's root array as a single element. Each
//! JSON list becomes a column when all of its elements fit one fixed-width column type, and an
//! array otherwise. The column type is found by folding [`fitting_type`] over the elements.

use serde_json::{Map, Number, Value};

use crate::document::Document;
use crate::encode::Scalar;
use crate::error::{Error, Result};
use crate::field_type::{ColumnType, FieldType, ListDerivation, MapDerivation};
use crate::insert::{integer_scalar, Inserter};
use crate::integer::{
    column_type_for_signed, column_type_for_unsigned, minimal_type_for_signed,
    minimal_type_for_unsigned, Integer,
};
use crate::options::DocumentOptions;

/// The narrowest representation found so far for a list's elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FittingType {
    /// No elements seen yet.
    Empty,
    Null,
    Boolean,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    Float,
    /// Strings, containers, and anything that can't share one fixed width.
    VariableOrNested,
}

impl FittingType {
    fn unsigned_width(self) -> Option<u8> {
        match self {
            FittingType::U8 => Some(1),
            FittingType::U16 => Some(2),
            FittingType::U32 => Some(4),
            FittingType::U64 => Some(8),
            _ => None,
        }
    }

    fn signed_width(self) -> Option<u8> {
        match self {
            FittingType::I8 => Some(1),
            FittingType::I16 => Some(2),
            FittingType::I32 => Some(4),
            FittingType::I64 => Some(8),
            _ => None,
        }
    }

    /// Integers every value of which an `f32` holds exactly.
    fn fits_float(self) -> bool {
        matches!(
            self,
            FittingType::U8 | FittingType::U16 | FittingType::I8 | FittingType::I16
        )
    }

    /// The column type for a list of this fitting type. Lists of nothing but nulls have none.
    pub fn column_type(self) -> Option<ColumnType> {
        Some(match self {
            FittingType::Boolean => ColumnType::Boolean,
            FittingType::U8 => ColumnType::U8,
            FittingType::U16 => ColumnType::U16,
            FittingType::U32 => ColumnType::U32,
            FittingType::U64 => ColumnType::U64,
            FittingType::I8 => ColumnType::I8,
            FittingType::I16 => ColumnType::I16,
            FittingType::I32 => ColumnType::I32,
            FittingType::I64 => ColumnType::I64,
            FittingType::Float => ColumnType::Float,
            FittingType::Empty | FittingType::Null | FittingType::VariableOrNested => return None,
        })
    }
}

fn unsigned_of_width(width: u8) -> FittingType {
    match width {
        1 => FittingType::U8,
        2 => FittingType::U16,
        4 => FittingType::U32,
        _ => FittingType::U64,
    }
}

fn signed_of_width(width: u8) -> FittingType {
    match width {
        1 => FittingType::I8,
        2 => FittingType::I16,
        4 => FittingType::I32,
        _ => FittingType::I64,
    }
}

/// Combine the fitting type of a list so far with the type of its next element.
///
/// Mixing unsigned and signed integers needs a signed type one step wider than either, so
/// `U8` and `I8` give `I16`, while anything that would need more than 64 bits gives
/// `VariableOrNested`. Integers mixed with floats give `Float` only when they are at most 16
/// bits wide. Wider integers don't all survive a trip through an `f32`, so they give
/// `VariableOrNested`.
pub fn fitting_type(acc: FittingType, next: FittingType) -> FittingType {
    use FittingType::*;
    match (acc, next) {
        (Empty, x) | (x, Empty) => x,
        (VariableOrNested, _) | (_, VariableOrNested) => VariableOrNested,
        (Null, x) | (x, Null) => x,
        (a, b) if a == b => a,
        (Boolean, _) | (_, Boolean) => VariableOrNested,
        (Float, x) | (x, Float) if x.fits_float() => Float,
        (Float, _) | (_, Float) => VariableOrNested,
        (a, b) => match (a.unsigned_width(), b.unsigned_width()) {
            (Some(x), Some(y)) => unsigned_of_width(x.max(y)),
            (None, None) => match (a.signed_width(), b.signed_width()) {
                (Some(x), Some(y)) => signed_of_width(x.max(y)),
                _ => VariableOrNested,
            },
            (Some(u), None) => mixed(u, b.signed_width()),
            (None, Some(u)) => mixed(u, a.signed_width()),
        },
    }
}

fn mixed(unsigned: u8, signed: Option<u8>) -> FittingType {
    match signed {
        Some(s) if unsigned.max(s) < 8 => signed_of_width(unsigned.max(s) * 2),
        _ => FittingType::VariableOrNested,
    }
}

/// The fitting type of a single JSON value, choosing integer widths whose column null sentinel
/// can't be confused with the value. `u64::MAX` and `i64::MIN + 1` are the 64-bit sentinels and
/// have no column width at all.
pub fn fitting_type_of(value: &Value) -> FittingType {
    match value {
        Value::Null => FittingType::Null,
        Value::Bool(_) => FittingType::Boolean,
        Value::Number(n) => {
            let ty = if let Some(v) = n.as_u64() {
                if v == u64::MAX {
                    return FittingType::VariableOrNested;
                }
                column_type_for_unsigned(v)
            } else if let Some(v) = n.as_i64() {
                if v == i64::MIN + 1 {
                    return FittingType::VariableOrNested;
                }
                column_type_for_signed(v)
            } else {
                return FittingType::Float;
            };
            match ty {
                FieldType::U8 => FittingType::U8,
                FieldType::U16 => FittingType::U16,
                FieldType::U32 => FittingType::U32,
                FieldType::U64 => FittingType::U64,
                FieldType::I8 => FittingType::I8,
                FieldType::I16 => FittingType::I16,
                FieldType::I32 => FittingType::I32,
                _ => FittingType::I64,
            }
        }
        Value::String(_) | Value::Array(_) | Value::Object(_) => FittingType::VariableOrNested,
    }
}

/// Fold [`fitting_type`] over every element of a list.
pub fn list_fitting_type(items: &[Value]) -> FittingType {
    items
        .iter()
        .map(fitting_type_of)
        .fold(FittingType::Empty, fitting_type)
}

fn number_integer(n: &Number) -> Option<Integer> {
    n.as_u64()
        .map(Integer::from)
        .or_else(|| n.as_i64().map(Integer::from))
}

fn number_scalar(n: &Number) -> Result<Scalar<'static>> {
    if let Some(v) = n.as_u64() {
        integer_scalar(v.into(), minimal_type_for_unsigned(v))
    } else if let Some(v) = n.as_i64() {
        integer_scalar(v.into(), minimal_type_for_signed(v))
    } else {
        let v = n
            .as_f64()
            .ok_or_else(|| Error::internal(format!("JSON number {} has no f64 form", n)))?;
        Ok(Scalar::Float(v as f32))
    }
}

fn column_scalar(value: &Value, ty: ColumnType) -> Result<Scalar<'static>> {
    match (value, ty) {
        (Value::Null, _) => Ok(Scalar::Null),
        (Value::Bool(b), ColumnType::Boolean) => Ok(Scalar::bool(*b)),
        (Value::Number(n), ColumnType::Float) => n
            .as_f64()
            .map(|v| Scalar::Float(v as f32))
            .ok_or_else(|| Error::internal("float column element without an f64 form")),
        (Value::Number(n), _) => {
            let v = number_integer(n)
                .ok_or_else(|| Error::internal("integer column element is not an integer"))?;
            integer_scalar(v, ty.scalar_type())
        }
        (other, _) => Err(Error::internal(format!(
            "{} doesn't belong in a {} column",
            other,
            ty.name()
        ))),
    }
}

#[derive(Clone, Copy)]
struct Ingest {
    array_derivation: ListDerivation,
    object_derivation: MapDerivation,
}

// Where the next value goes: an array element, or an object property with a key.
#[derive(Clone, Copy)]
enum Slot<'k> {
    Element,
    Prop(&'k str),
}

impl Ingest {
    fn scalar(&self, ins: &mut Inserter, slot: Slot, scalar: Scalar) -> Result<()> {
        match slot {
            Slot::Element => ins.insert(scalar),
            Slot::Prop(key) => ins.insert_prop(key, scalar).map(|_| ()),
        }
    }

    fn value(&self, ins: &mut Inserter, slot: Slot, value: &Value) -> Result<()> {
        match value {
            Value::Null => self.scalar(ins, slot, Scalar::Null),
            Value::Bool(b) => self.scalar(ins, slot, Scalar::bool(*b)),
            Value::Number(n) => self.scalar(ins, slot, number_scalar(n)?),
            Value::String(s) => self.scalar(ins, slot, Scalar::String(s)),
            Value::Array(items) => self.list(ins, slot, items),
            Value::Object(map) => self.object(ins, slot, map),
        }
    }

    fn list(&self, ins: &mut Inserter, slot: Slot, items: &[Value]) -> Result<()> {
        let derivation = self.array_derivation;
        match list_fitting_type(items).column_type() {
            Some(ty) => {
                let mut col = match slot {
                    Slot::Element => ins.begin_column(ty, derivation, None)?,
                    Slot::Prop(key) => ins.begin_prop_column(key, ty, derivation, None)?,
                };
                for item in items {
                    col.insert(column_scalar(item, ty)?)?;
                }
                col.end()
            }
            None => {
                let mut arr = match slot {
                    Slot::Element => ins.begin_array(derivation)?,
                    Slot::Prop(key) => ins.begin_prop_array(key, derivation)?,
                };
                for item in items {
                    self.value(&mut arr, Slot::Element, item)?;
                }
                arr.end()
            }
        }
    }

    fn object(&self, ins: &mut Inserter, slot: Slot, map: &Map<String, Value>) -> Result<()> {
        let derivation = self.object_derivation;
        let mut obj = match slot {
            Slot::Element => ins.begin_object(derivation)?,
            Slot::Prop(key) => ins.begin_prop_object(key, derivation)?,
        };
        if derivation.is_sorted() {
            let mut props: Vec<_> = map.iter().collect();
            props.sort_by(|a, b| a.0.cmp(b.0));
            for (key, value) in props {
                self.value(&mut obj, Slot::Prop(key), value)?;
            }
        } else {
            for (key, value) in map {
                self.value(&mut obj, Slot::Prop(key), value)?;
            }
        }
        obj.end()
    }
}

/// Turn a serde_json parse failure into an error pointing at the offending text.
pub(crate) fn parse_error(input: &str, err: serde_json::Error) -> Error {
    let line = err.line();
    let column = err.column();
    let token = input
        .lines()
        .nth(line.saturating_sub(1))
        .map(|text| token_at(text, column.saturating_sub(1)))
        .unwrap_or_default();
    Error::JsonParse {
        msg: err.to_string(),
        token,
        line,
        column,
    }
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | ':' | '[' | ']' | '{' | '}')
}

// The token around a 0-based character index: the run of non-delimiters touching it.
fn token_at(text: &str, index: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    let index = index.min(chars.len());
    let mut start = index;
    while start > 0 && !is_delimiter(chars[start - 1]) {
        start -= 1;
    }
    let mut end = index;
    while end < chars.len() && !is_delimiter(chars[end]) {
        end += 1;
    }
    if start == end && index < chars.len() {
        end = index + 1;
    }
    chars[start..end].iter().collect()
}

impl Document {
    /// Parse JSON text and ingest it into a new document.
    ///
    /// ```
    /// # use carbon_pack::*;
    /// let doc = Document::from_json("[1, 2, 3]", DocumentOptions::default())?;
    /// let mut it = doc.iter()?;
    /// assert!(it.next()?);
    /// let col = it.column_value()?;
    /// assert_eq!(col.column_type(), ColumnType::U8);
    /// assert_eq!(col.len(), 3);
    /// # Ok::<(), Error>(())
    /// ```
    pub fn from_json(json: &str, options: DocumentOptions) -> Result<Document> {
        let value: Value = serde_json::from_str(json).map_err(|e| parse_error(json, e))?;
        Self::from_json_value(&value, options)
    }

    /// Ingest an already-parsed JSON tree into a new document.
    pub fn from_json_value(value: &Value, options: DocumentOptions) -> Result<Document> {
        let ingest = Ingest {
            array_derivation: options.array_derivation,
            object_derivation: options.object_derivation,
        };
        let mut doc = Document::new(options);
        {
            let mut ins = doc.inserter()?;
            ingest.value(&mut ins, Slot::Element, value)?;
            ins.end()?;
        }
        tracing::debug!(bytes = doc.len(), "ingest json");
        Ok(doc)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::encode::Position;
    use crate::ErrKind;
    use serde_json::json;
    use FittingType::*;

    const FIXED: [FittingType; 10] = [Boolean, U8, U16, U32, U64, I8, I16, I32, I64, Float];

    mod fitting {
        use super::*;

        #[test]
        fn null_absorption() {
            for t in FIXED {
                assert_eq!(fitting_type(Null, t), t);
                assert_eq!(fitting_type(t, Null), t);
            }
            assert_eq!(fitting_type(Null, Null), Null);
            assert_eq!(fitting_type(Null, Empty), Null);
            assert_eq!(fitting_type(Empty, Null), Null);
        }

        #[test]
        fn identity_and_absorbing() {
            for t in FIXED.iter().copied().chain([Null, Empty, VariableOrNested]) {
                assert_eq!(fitting_type(Empty, t), t);
                assert_eq!(fitting_type(t, Empty), t);
                assert_eq!(fitting_type(VariableOrNested, t), VariableOrNested);
                assert_eq!(fitting_type(t, VariableOrNested), VariableOrNested);
            }
            for t in FIXED {
                assert_eq!(fitting_type(t, t), t);
            }
        }

        #[test]
        fn widening() {
            assert_eq!(fitting_type(U8, I64), VariableOrNested);
            assert_eq!(fitting_type(U8, I8), I16);
            assert_eq!(fitting_type(U32, I8), I64);
            assert_eq!(fitting_type(U32, I32), I64);
            assert_eq!(fitting_type(U64, I8), VariableOrNested);
            assert_eq!(fitting_type(I8, U16), I32);
            assert_eq!(fitting_type(U8, U32), U32);
            assert_eq!(fitting_type(I16, I8), I16);
            assert_eq!(fitting_type(U16, Float), Float);
            assert_eq!(fitting_type(Float, I16), Float);
            assert_eq!(fitting_type(Float, U32), VariableOrNested);
            assert_eq!(fitting_type(I32, Float), VariableOrNested);
            assert_eq!(fitting_type(Float, I64), VariableOrNested);
            assert_eq!(fitting_type(U64, Float), VariableOrNested);
        }

        #[test]
        fn booleans_dont_mix() {
            for t in [U8, I64, Float] {
                assert_eq!(fitting_type(Boolean, t), VariableOrNested);
                assert_eq!(fitting_type(t, Boolean), VariableOrNested);
            }
        }

        #[test]
        fn commutative() {
            let all: Vec<_> = FIXED
                .iter()
                .copied()
                .chain([Null, Empty, VariableOrNested])
                .collect();
            for &a in &all {
                for &b in &all {
                    assert_eq!(fitting_type(a, b), fitting_type(b, a), "{:?} {:?}", a, b);
                }
            }
        }

        #[test]
        fn values() {
            assert_eq!(list_fitting_type(&[json!(1), json!(2), json!(3)]), U8);
            assert_eq!(list_fitting_type(&[json!(1), json!(null)]), U8);
            assert_eq!(list_fitting_type(&[json!(255)]), U16);
            assert_eq!(list_fitting_type(&[json!(-127)]), I16);
            assert_eq!(list_fitting_type(&[json!(-1), json!(200)]), I16);
            assert_eq!(list_fitting_type(&[json!(1), json!("x")]), VariableOrNested);
            assert_eq!(list_fitting_type(&[json!(null)]), Null);
            assert_eq!(list_fitting_type(&[]), Empty);
            assert_eq!(list_fitting_type(&[json!(1.5), json!(2)]), Float);
            assert_eq!(list_fitting_type(&[json!(0.5), json!(65534)]), Float);
            assert_eq!(list_fitting_type(&[json!(0.5), json!(16777217)]), VariableOrNested);
            assert_eq!(list_fitting_type(&[json!(1), json!(u64::MAX)]), VariableOrNested);
            assert_eq!(list_fitting_type(&[json!(-1), json!(i64::MIN + 1)]), VariableOrNested);
            assert_eq!(list_fitting_type(&[json!(i64::MIN)]), I64);
            assert_eq!(list_fitting_type(&[json!([1])]), VariableOrNested);
        }
    }

    mod ingest {
        use super::*;

        fn root_field(doc: &Document) -> crate::iter::Field<'_> {
            let mut it = doc.iter().unwrap();
            assert!(it.is_unit().unwrap());
            assert!(it.next().unwrap());
            it.field().unwrap()
        }

        #[test]
        fn packs_column() {
            let doc = Document::from_json("[1, 2, 3]", DocumentOptions::default()).unwrap();
            let mut it = doc.iter().unwrap();
            it.next().unwrap();
            assert_eq!(
                it.field_type().unwrap(),
                FieldType::Column(ColumnType::U8, ListDerivation::UnsortedMultiset)
            );
            let col = it.column_value().unwrap();
            assert_eq!(col.len(), 3);
            let values: Vec<_> = col.values().iter().collect();
            assert_eq!(values, vec![Scalar::U8(1), Scalar::U8(2), Scalar::U8(3)]);
        }

        #[test]
        fn column_packing_law() {
            use rand::{rngs::StdRng, Rng, SeedableRng};
            let mut rng = StdRng::seed_from_u64(0x5eed);
            for _ in 0..50 {
                let len = rng.gen_range(1..300);
                let input: Vec<u8> = (0..len).map(|_| rng.gen_range(0..=255)).collect();
                let json = serde_json::to_string(&input).unwrap();
                let doc = Document::from_json(&json, DocumentOptions::default()).unwrap();
                let widened = input.contains(&255);
                match root_field(&doc) {
                    crate::iter::Field::Column(col) => {
                        let back: Vec<_> = col.values().iter().collect();
                        let expected: Vec<_> = if widened {
                            assert_eq!(col.column_type(), ColumnType::U16);
                            input.iter().map(|&v| Scalar::U16(v as u16)).collect()
                        } else {
                            assert_eq!(col.column_type(), ColumnType::U8);
                            input.iter().map(|&v| Scalar::U8(v)).collect()
                        };
                        assert_eq!(back, expected);
                    }
                    other => panic!("expected column, got {:?}", other),
                }
            }
        }

        #[test]
        fn values_a_column_cant_hold() {
            let doc = Document::from_json("[0.5, 16777217]", DocumentOptions::default()).unwrap();
            assert!(matches!(root_field(&doc), crate::iter::Field::Array(_)));
            assert_eq!(doc.to_json_compact().unwrap(), "[0.5,16777217]");

            let doc = Document::from_json("[1, 18446744073709551615]", DocumentOptions::default())
                .unwrap();
            assert!(matches!(root_field(&doc), crate::iter::Field::Array(_)));
            assert_eq!(doc.to_json_compact().unwrap(), "[1,18446744073709551615]");

            let doc = Document::from_json("[0.5, -300]", DocumentOptions::default()).unwrap();
            match root_field(&doc) {
                crate::iter::Field::Column(col) => {
                    assert_eq!(col.column_type(), ColumnType::Float);
                    assert_eq!(col.get(1), Some(Scalar::Float(-300.0)));
                }
                other => panic!("expected column, got {:?}", other),
            }
        }

        #[test]
        fn object_in_order() {
            let doc =
                Document::from_json(r#"{"a": 1, "b": "x"}"#, DocumentOptions::default()).unwrap();
            let mut it = doc.iter().unwrap();
            it.next().unwrap();
            let mut obj = it.object_value().unwrap();
            assert_eq!(obj.derivation(), MapDerivation::UnsortedMultimap);
            assert!(obj.next().unwrap());
            assert_eq!(obj.key().unwrap(), "a");
            assert_eq!(obj.field_type().unwrap(), FieldType::U8);
            assert_eq!(obj.u8_value().unwrap(), 1);
            assert!(obj.next().unwrap());
            assert_eq!(obj.key().unwrap(), "b");
            assert_eq!(obj.string_value().unwrap(), "x");
            assert!(!obj.next().unwrap());
        }

        #[test]
        fn heterogeneous_array() {
            let doc = Document::from_json(r#"[1, "x"]"#, DocumentOptions::default()).unwrap();
            let mut it = doc.iter().unwrap();
            it.next().unwrap();
            let mut arr = it.array_value().unwrap();
            assert!(arr.next().unwrap());
            assert_eq!(arr.field_type().unwrap(), FieldType::U8);
            assert!(arr.next().unwrap());
            assert_eq!(arr.field_type().unwrap(), FieldType::String);
            assert!(!arr.next().unwrap());
        }

        #[test]
        fn lists_without_a_column_type() {
            for json in ["[]", "[null, null]", "[[1], [2]]", "[true, 1]"] {
                let doc = Document::from_json(json, DocumentOptions::default()).unwrap();
                assert!(
                    matches!(root_field(&doc), crate::iter::Field::Array(_)),
                    "{}",
                    json
                );
            }
        }

        #[test]
        fn column_widths() {
            let cases = [
                ("[1, null, 3]", ColumnType::U8),
                ("[255, 1]", ColumnType::U16),
                ("[-1, 200]", ColumnType::I16),
                ("[true, false, null]", ColumnType::Boolean),
                ("[1.5, 2]", ColumnType::Float),
                ("[-5, 70000]", ColumnType::I64),
            ];
            for (json, ty) in cases {
                let doc = Document::from_json(json, DocumentOptions::default()).unwrap();
                match root_field(&doc) {
                    crate::iter::Field::Column(col) => {
                        assert_eq!(col.column_type(), ty, "{}", json)
                    }
                    other => panic!("{}: expected column, got {:?}", json, other),
                }
            }
            let doc = Document::from_json("[1, null, 3]", DocumentOptions::default()).unwrap();
            if let crate::iter::Field::Column(col) = root_field(&doc) {
                assert_eq!(col.get(1), Some(Scalar::Null));
                assert_eq!(col.get(2), Some(Scalar::U8(3)));
            }
        }

        #[test]
        fn nested_props() {
            let doc = Document::from_json(
                r#"{"list": [1, 2], "obj": {"deep": [true]}, "mixed": [1, "a"]}"#,
                DocumentOptions::default(),
            )
            .unwrap();
            let mut it = doc.iter().unwrap();
            it.next().unwrap();
            let mut obj = it.object_value().unwrap();
            obj.next().unwrap();
            assert!(obj.field_type().unwrap().is_column_or_subtype());
            obj.next().unwrap();
            let mut inner = obj.object_value().unwrap();
            inner.next().unwrap();
            assert_eq!(inner.key().unwrap(), "deep");
            assert_eq!(
                inner.column_value().unwrap().column_type(),
                ColumnType::Boolean
            );
            obj.next().unwrap();
            assert!(obj.field_type().unwrap().is_array_or_subtype());
            assert!(!obj.next().unwrap());
        }

        #[test]
        fn sorted_objects() {
            let opts = DocumentOptions::default().object_derivation(MapDerivation::SortedMap);
            let doc = Document::from_json(r#"{"b": 1, "a": 2}"#, opts).unwrap();
            let mut obj = doc
                .object_iter_at(Position {
                    offset: doc.root_position().offset + 1,
                    depth: 2,
                })
                .unwrap();
            assert_eq!(obj.derivation(), MapDerivation::SortedMap);
            obj.next().unwrap();
            assert_eq!(obj.key().unwrap(), "a");
        }

        #[test]
        fn scalars_at_root() {
            let doc = Document::from_json("-300", DocumentOptions::default()).unwrap();
            let mut it = doc.iter().unwrap();
            it.next().unwrap();
            assert_eq!(it.field_type().unwrap(), FieldType::I16);
            assert_eq!(it.signed_value().unwrap(), -300);
        }

        #[test]
        fn depth_limit() {
            let opts = DocumentOptions::default().max_depth(3);
            assert!(Document::from_json("[[1]]", opts.clone()).is_ok());
            let err = Document::from_json("[[[1]]]", opts).unwrap_err();
            assert_eq!(err.kind(), ErrKind::IllegalArgument);
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn parse_error_token() {
            let err = Document::from_json("[1,\n  tru]", DocumentOptions::default()).unwrap_err();
            assert_eq!(err.kind(), ErrKind::JsonParseError);
            match err {
                Error::JsonParse { token, line, .. } => {
                    assert_eq!(line, 2);
                    assert_eq!(token, "tru");
                }
                other => panic!("unexpected error {:?}", other),
            }
        }

        #[test]
        fn tokens() {
            assert_eq!(token_at("[1, tru]", 7), "tru");
            assert_eq!(token_at("[1, tru]", 5), "tru");
            assert_eq!(token_at("{]", 1), "]");
            assert_eq!(token_at("", 0), "");
        }
    }
}
