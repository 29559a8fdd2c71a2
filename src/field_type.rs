//! The tag byte taxonomy.
//!
//! Every field in a document starts with one tag byte. Scalars get a single tag each; arrays and
//! objects get one tag per [`ListDerivation`]/[`MapDerivation`]; columns get one tag per
//! combination of derivation and [`ColumnType`]. Arrays and objects are closed by
//! [`CONTAINER_END`], which is never a valid field tag. Object keys are varint-prefixed, and a
//! varint only starts with a zero byte for values of 2^56 and up, so the marker can't be taken for
//! a key either.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Closes an array or object container.
pub const CONTAINER_END: u8 = 0x00;

const COLUMN_BASE: u8 = 0x80;

/// Sortedness and uniqueness of an array or column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListDerivation {
    #[default]
    UnsortedMultiset,
    SortedMultiset,
    UnsortedSet,
    SortedSet,
}

/// Sortedness and key uniqueness of an object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapDerivation {
    #[default]
    UnsortedMultimap,
    SortedMultimap,
    UnsortedMap,
    SortedMap,
}

impl ListDerivation {
    const ALL: [ListDerivation; 4] = [
        ListDerivation::UnsortedMultiset,
        ListDerivation::SortedMultiset,
        ListDerivation::UnsortedSet,
        ListDerivation::SortedSet,
    ];

    fn index(self) -> u8 {
        self as u8
    }

    pub fn is_sorted(self) -> bool {
        matches!(self, ListDerivation::SortedMultiset | ListDerivation::SortedSet)
    }

    pub fn is_distinct(self) -> bool {
        matches!(self, ListDerivation::UnsortedSet | ListDerivation::SortedSet)
    }
}

impl MapDerivation {
    pub fn is_sorted(self) -> bool {
        matches!(self, MapDerivation::SortedMultimap | MapDerivation::SortedMap)
    }

    pub fn is_distinct(self) -> bool {
        matches!(self, MapDerivation::UnsortedMap | MapDerivation::SortedMap)
    }
}

/// Element type of a column. Every slot of a column holds one raw value of this type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    Float,
    Boolean,
}

/// Boolean column slot holding `false`.
pub const COLUMN_BOOLEAN_FALSE: u8 = 0;
/// Boolean column slot holding `true`.
pub const COLUMN_BOOLEAN_TRUE: u8 = 1;
/// Boolean column slot holding null.
pub const COLUMN_BOOLEAN_NULL: u8 = 2;

impl ColumnType {
    const ALL: [ColumnType; 10] = [
        ColumnType::U8,
        ColumnType::U16,
        ColumnType::U32,
        ColumnType::U64,
        ColumnType::I8,
        ColumnType::I16,
        ColumnType::I32,
        ColumnType::I64,
        ColumnType::Float,
        ColumnType::Boolean,
    ];

    fn index(self) -> u8 {
        self as u8
    }

    /// Bytes occupied by one slot.
    pub fn width(self) -> usize {
        match self {
            ColumnType::U8 | ColumnType::I8 | ColumnType::Boolean => 1,
            ColumnType::U16 | ColumnType::I16 => 2,
            ColumnType::U32 | ColumnType::I32 | ColumnType::Float => 4,
            ColumnType::U64 | ColumnType::I64 => 8,
        }
    }

    /// The little-endian bytes marking an empty or null slot. Only the first [`width`] bytes are
    /// meaningful.
    ///
    /// [`width`]: ColumnType::width
    pub fn null_sentinel(self) -> [u8; 8] {
        let mut out = [0u8; 8];
        match self {
            ColumnType::U8 => out[0] = u8::MAX,
            ColumnType::U16 => out[..2].copy_from_slice(&u16::MAX.to_le_bytes()),
            ColumnType::U32 => out[..4].copy_from_slice(&u32::MAX.to_le_bytes()),
            ColumnType::U64 => out.copy_from_slice(&u64::MAX.to_le_bytes()),
            ColumnType::I8 => out[0] = (i8::MIN + 1) as u8,
            ColumnType::I16 => out[..2].copy_from_slice(&(i16::MIN + 1).to_le_bytes()),
            ColumnType::I32 => out[..4].copy_from_slice(&(i32::MIN + 1).to_le_bytes()),
            ColumnType::I64 => out.copy_from_slice(&(i64::MIN + 1).to_le_bytes()),
            ColumnType::Float => out[..4].copy_from_slice(&f32::NAN.to_bits().to_le_bytes()),
            ColumnType::Boolean => out[0] = COLUMN_BOOLEAN_NULL,
        }
        out
    }

    /// Checks a raw slot against this type's null sentinel. Any NaN counts as null in a float
    /// column.
    pub fn is_null_slot(self, slot: &[u8]) -> bool {
        match self {
            ColumnType::Float => {
                let mut bits = [0u8; 4];
                bits.copy_from_slice(&slot[..4]);
                f32::from_bits(u32::from_le_bytes(bits)).is_nan()
            }
            _ => slot[..self.width()] == self.null_sentinel()[..self.width()],
        }
    }

    /// The scalar tag a non-null slot of this column type decodes to. Booleans have no single
    /// answer and report `True`; see [`regular_type_of_column_entry`].
    pub fn scalar_type(self) -> FieldType {
        match self {
            ColumnType::U8 => FieldType::U8,
            ColumnType::U16 => FieldType::U16,
            ColumnType::U32 => FieldType::U32,
            ColumnType::U64 => FieldType::U64,
            ColumnType::I8 => FieldType::I8,
            ColumnType::I16 => FieldType::I16,
            ColumnType::I32 => FieldType::I32,
            ColumnType::I64 => FieldType::I64,
            ColumnType::Float => FieldType::Float,
            ColumnType::Boolean => FieldType::True,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ColumnType::U8 => "u8",
            ColumnType::U16 => "u16",
            ColumnType::U32 => "u32",
            ColumnType::U64 => "u64",
            ColumnType::I8 => "i8",
            ColumnType::I16 => "i16",
            ColumnType::I32 => "i32",
            ColumnType::I64 => "i64",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
        }
    }
}

/// Semantic class of a field type. Every tag belongs to exactly one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldClass {
    Constant,
    Number,
    CharacterString,
    BinaryString,
    Container,
}

/// The type of one field, as identified by its tag byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    Null,
    True,
    False,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    Float,
    String,
    Binary,
    BinaryCustom,
    Array(ListDerivation),
    Object(MapDerivation),
    Column(ColumnType, ListDerivation),
}

impl FieldType {
    /// Decode a tag byte read from a buffer. Unknown bytes, including the container end markers,
    /// are rejected as corruption.
    pub fn from_u8(tag: u8) -> Option<FieldType> {
        use self::FieldType::*;
        Some(match tag {
            b'n' => Null,
            b't' => True,
            b'f' => False,
            b'c' => U8,
            b'd' => U16,
            b'i' => U32,
            b'l' => U64,
            b'C' => I8,
            b'D' => I16,
            b'I' => I32,
            b'L' => I64,
            b'r' => Float,
            b's' => String,
            b'b' => Binary,
            b'x' => BinaryCustom,
            b'[' => Array(ListDerivation::UnsortedMultiset),
            b'<' => Array(ListDerivation::SortedMultiset),
            b'/' => Array(ListDerivation::UnsortedSet),
            b'=' => Array(ListDerivation::SortedSet),
            b'{' => Object(MapDerivation::UnsortedMultimap),
            b'~' => Object(MapDerivation::SortedMultimap),
            b':' => Object(MapDerivation::UnsortedMap),
            b'#' => Object(MapDerivation::SortedMap),
            0x80..=0xa7 => {
                let n = tag - COLUMN_BASE;
                let ty = ColumnType::ALL[(n % 10) as usize];
                let derivation = ListDerivation::ALL[(n / 10) as usize];
                Column(ty, derivation)
            }
            _ => return None,
        })
    }

    pub fn into_u8(self) -> u8 {
        use self::FieldType::*;
        match self {
            Null => b'n',
            True => b't',
            False => b'f',
            U8 => b'c',
            U16 => b'd',
            U32 => b'i',
            U64 => b'l',
            I8 => b'C',
            I16 => b'D',
            I32 => b'I',
            I64 => b'L',
            Float => b'r',
            String => b's',
            Binary => b'b',
            BinaryCustom => b'x',
            Array(ListDerivation::UnsortedMultiset) => b'[',
            Array(ListDerivation::SortedMultiset) => b'<',
            Array(ListDerivation::UnsortedSet) => b'/',
            Array(ListDerivation::SortedSet) => b'=',
            Object(MapDerivation::UnsortedMultimap) => b'{',
            Object(MapDerivation::SortedMultimap) => b'~',
            Object(MapDerivation::UnsortedMap) => b':',
            Object(MapDerivation::SortedMap) => b'#',
            Column(ty, derivation) => COLUMN_BASE + derivation.index() * 10 + ty.index(),
        }
    }

    pub fn class(self) -> FieldClass {
        use self::FieldType::*;
        match self {
            Null | True | False => FieldClass::Constant,
            U8 | U16 | U32 | U64 | I8 | I16 | I32 | I64 | Float => FieldClass::Number,
            String => FieldClass::CharacterString,
            Binary | BinaryCustom => FieldClass::BinaryString,
            Array(_) | Object(_) | Column(..) => FieldClass::Container,
        }
    }

    pub fn is_null(self) -> bool {
        matches!(self, FieldType::Null)
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            FieldType::I8 | FieldType::I16 | FieldType::I32 | FieldType::I64
        )
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            FieldType::U8 | FieldType::U16 | FieldType::U32 | FieldType::U64
        )
    }

    pub fn is_integer(self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    pub fn is_floating(self) -> bool {
        matches!(self, FieldType::Float)
    }

    pub fn is_number(self) -> bool {
        self.class() == FieldClass::Number
    }

    pub fn is_boolean(self) -> bool {
        matches!(self, FieldType::True | FieldType::False)
    }

    pub fn is_string(self) -> bool {
        matches!(self, FieldType::String)
    }

    pub fn is_binary(self) -> bool {
        matches!(self, FieldType::Binary | FieldType::BinaryCustom)
    }

    pub fn is_column_or_subtype(self) -> bool {
        matches!(self, FieldType::Column(..))
    }

    pub fn is_array_or_subtype(self) -> bool {
        matches!(self, FieldType::Array(_))
    }

    pub fn is_object_or_subtype(self) -> bool {
        matches!(self, FieldType::Object(_))
    }

    /// Containers an iterator can walk into.
    pub fn is_traversable(self) -> bool {
        self.class() == FieldClass::Container
    }

    /// Body length in bytes for fixed-size scalars, `None` for everything variable-length.
    pub fn fixed_body_len(self) -> Option<usize> {
        use self::FieldType::*;
        match self {
            Null | True | False => Some(0),
            U8 | I8 => Some(1),
            U16 | I16 => Some(2),
            U32 | I32 | Float => Some(4),
            U64 | I64 => Some(8),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        use self::FieldType::*;
        match self {
            Null => "null",
            True => "true",
            False => "false",
            U8 => "u8",
            U16 => "u16",
            U32 => "u32",
            U64 => "u64",
            I8 => "i8",
            I16 => "i16",
            I32 => "i32",
            I64 => "i64",
            Float => "float",
            String => "string",
            Binary => "binary",
            BinaryCustom => "custom binary",
            Array(_) => "array",
            Object(_) => "object",
            Column(..) => "column",
        }
    }
}

impl From<FieldType> for u8 {
    fn from(val: FieldType) -> u8 {
        val.into_u8()
    }
}

/// Validate a tag byte found at `offset`.
pub fn type_of(tag: u8, offset: usize) -> Result<FieldType> {
    FieldType::from_u8(tag).ok_or_else(|| {
        tracing::warn!(tag, offset, "unknown tag byte");
        Error::Corrupted { offset, tag }
    })
}

pub fn class_of(field: FieldType) -> FieldClass {
    field.class()
}

/// The column tag for a derivation and element type. Total over both inputs.
pub fn tag_for_column(derivation: ListDerivation, element: ColumnType) -> FieldType {
    FieldType::Column(element, derivation)
}

/// Map the decoded state of one column slot back to the scalar field type it would have as a
/// standalone array element.
pub fn regular_type_of_column_entry(
    column: FieldType,
    is_null: bool,
    is_true: bool,
) -> Result<FieldType> {
    let FieldType::Column(ty, _) = column else {
        return Err(Error::TypeMismatch {
            step: "map column entry to field type",
            expected: "column",
            actual: column.into_u8(),
        });
    };
    if is_null {
        return Ok(FieldType::Null);
    }
    Ok(match ty {
        ColumnType::Boolean if is_true => FieldType::True,
        ColumnType::Boolean => FieldType::False,
        other => other.scalar_type(),
    })
}
