use std::cmp::{self, Ordering};
use std::convert::TryFrom;
use std::fmt::{self, Debug, Display};

use serde::ser::{Serialize, Serializer};

use crate::field_type::FieldType;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum IntPriv {
    /// Always non-less than zero.
    PosInt(u64),
    /// Always less than zero.
    NegInt(i64),
}

/// An integer read from or headed into a document, whether signed or unsigned.
///
/// Non-negative values are always held as unsigned, so the same number compares equal no matter
/// which width or signedness it was stored with.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Integer {
    n: IntPriv,
}

/// The narrowest unsigned tag that holds `value`.
pub fn minimal_type_for_unsigned(value: u64) -> FieldType {
    if value <= u8::MAX as u64 {
        FieldType::U8
    } else if value <= u16::MAX as u64 {
        FieldType::U16
    } else if value <= u32::MAX as u64 {
        FieldType::U32
    } else {
        FieldType::U64
    }
}

/// The narrowest signed tag that holds `value`.
pub fn minimal_type_for_signed(value: i64) -> FieldType {
    if value >= i8::MIN as i64 && value <= i8::MAX as i64 {
        FieldType::I8
    } else if value >= i16::MIN as i64 && value <= i16::MAX as i64 {
        FieldType::I16
    } else if value >= i32::MIN as i64 && value <= i32::MAX as i64 {
        FieldType::I32
    } else {
        FieldType::I64
    }
}

/// Like [`minimal_type_for_unsigned`], but skips any width whose column null sentinel is equal
/// to the value, so the value survives being packed into a column.
pub fn column_type_for_unsigned(value: u64) -> FieldType {
    if value < u8::MAX as u64 {
        FieldType::U8
    } else if value < u16::MAX as u64 {
        FieldType::U16
    } else if value < u32::MAX as u64 {
        FieldType::U32
    } else {
        FieldType::U64
    }
}

/// Signed counterpart of [`column_type_for_unsigned`].
pub fn column_type_for_signed(value: i64) -> FieldType {
    let fits = |min: i64, max: i64| value >= min && value <= max && value != min + 1;
    if fits(i8::MIN as i64, i8::MAX as i64) {
        FieldType::I8
    } else if fits(i16::MIN as i64, i16::MAX as i64) {
        FieldType::I16
    } else if fits(i32::MIN as i64, i32::MAX as i64) {
        FieldType::I32
    } else {
        FieldType::I64
    }
}

impl Integer {
    /// Minimum possible integer that can be represented. Equivalent to `i64::MIN`.
    pub fn min_value() -> Integer {
        Integer {
            n: IntPriv::NegInt(i64::MIN),
        }
    }

    /// Maximum possible integer that can be represented. Equivalent to `u64::MAX`.
    pub fn max_value() -> Integer {
        Integer {
            n: IntPriv::PosInt(u64::MAX),
        }
    }

    /// Returns `true` if the integer can be represented as `i64`.
    #[inline]
    pub fn is_i64(&self) -> bool {
        match self.n {
            IntPriv::PosInt(n) => n <= i64::MAX as u64,
            IntPriv::NegInt(..) => true,
        }
    }

    /// Returns `true` if the integer can be represented as `u64`.
    #[inline]
    pub fn is_u64(&self) -> bool {
        matches!(self.n, IntPriv::PosInt(..))
    }

    /// Returns the integer represented as `i64` if possible, or else `None`.
    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match self.n {
            IntPriv::PosInt(n) => i64::try_from(n).ok(),
            IntPriv::NegInt(n) => Some(n),
        }
    }

    /// Returns the integer represented as `u64` if possible, or else `None`.
    #[inline]
    pub fn as_u64(&self) -> Option<u64> {
        match self.n {
            IntPriv::PosInt(n) => Some(n),
            IntPriv::NegInt(_) => None,
        }
    }

    /// Returns the integer as `f64`, rounding if it doesn't fit exactly.
    #[inline]
    pub fn as_f64(&self) -> f64 {
        match self.n {
            IntPriv::PosInt(n) => n as f64,
            IntPriv::NegInt(n) => n as f64,
        }
    }

    /// The narrowest tag that can hold this integer: unsigned for non-negative values, signed
    /// otherwise.
    pub fn minimal_type(&self) -> FieldType {
        match self.n {
            IntPriv::PosInt(n) => minimal_type_for_unsigned(n),
            IntPriv::NegInt(n) => minimal_type_for_signed(n),
        }
    }

    /// The narrowest column element tag that can hold this integer without colliding with the
    /// column's null sentinel.
    pub fn column_type(&self) -> FieldType {
        match self.n {
            IntPriv::PosInt(n) => column_type_for_unsigned(n),
            IntPriv::NegInt(n) => column_type_for_signed(n),
        }
    }
}

impl std::default::Default for Integer {
    fn default() -> Self {
        Self {
            n: IntPriv::PosInt(0),
        }
    }
}

impl cmp::Ord for Integer {
    fn cmp(&self, other: &Integer) -> Ordering {
        match (self.n, other.n) {
            (IntPriv::NegInt(lhs), IntPriv::NegInt(ref rhs)) => lhs.cmp(rhs),
            (IntPriv::NegInt(_), IntPriv::PosInt(_)) => Ordering::Less,
            (IntPriv::PosInt(_), IntPriv::NegInt(_)) => Ordering::Greater,
            (IntPriv::PosInt(lhs), IntPriv::PosInt(ref rhs)) => lhs.cmp(rhs),
        }
    }
}

impl cmp::PartialOrd for Integer {
    fn partial_cmp(&self, other: &Integer) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Debug for Integer {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        Debug::fmt(&self.n, fmt)
    }
}

impl Display for Integer {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self.n {
            IntPriv::PosInt(v) => Display::fmt(&v, fmt),
            IntPriv::NegInt(v) => Display::fmt(&v, fmt),
        }
    }
}

macro_rules! impl_from_unsigned {
    ($t: ty) => {
        impl From<$t> for Integer {
            fn from(n: $t) -> Self {
                Integer {
                    n: IntPriv::PosInt(n as u64),
                }
            }
        }
    };
}

macro_rules! impl_from_signed {
    ($t: ty) => {
        impl From<$t> for Integer {
            fn from(n: $t) -> Self {
                if n < 0 {
                    Integer {
                        n: IntPriv::NegInt(n as i64),
                    }
                } else {
                    Integer {
                        n: IntPriv::PosInt(n as u64),
                    }
                }
            }
        }
    };
}

impl_from_unsigned!(u8);
impl_from_unsigned!(u16);
impl_from_unsigned!(u32);
impl_from_unsigned!(u64);
impl_from_signed!(i8);
impl_from_signed!(i16);
impl_from_signed!(i32);
impl_from_signed!(i64);

macro_rules! impl_try_from {
    ($t: ty) => {
        impl TryFrom<Integer> for $t {
            type Error = Integer;
            fn try_from(v: Integer) -> Result<Self, Self::Error> {
                match v.n {
                    IntPriv::PosInt(n) => TryFrom::try_from(n).map_err(|_| v),
                    IntPriv::NegInt(n) => TryFrom::try_from(n).map_err(|_| v),
                }
            }
        }
    };
}

impl_try_from!(u8);
impl_try_from!(u16);
impl_try_from!(u32);
impl_try_from!(u64);
impl_try_from!(i8);
impl_try_from!(i16);
impl_try_from!(i32);
impl_try_from!(i64);

impl Serialize for Integer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.n {
            IntPriv::PosInt(v) => serializer.serialize_u64(v),
            IntPriv::NegInt(v) => serializer.serialize_i64(v),
        }
    }
}
