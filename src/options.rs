use educe::Educe;
use serde::{Deserialize, Serialize};

use crate::document::KeyType;
use crate::error::Result;
use crate::field_type::{ListDerivation, MapDerivation};
use crate::{DEFAULT_COLUMN_CAPACITY, DEFAULT_MIN_CAPACITY, MAX_DEPTH};

/// Settings for creating a [`Document`][crate::Document] and for ingesting JSON into one.
///
/// Options can be built in code or loaded from JSON. Missing fields take their defaults, and
/// unknown fields are rejected:
///
/// ```
/// # use carbon_pack::*;
/// let opts = DocumentOptions::from_json(r#"{ "key_type": "string", "column_capacity": 16 }"#)?;
/// assert_eq!(opts.key_type, KeyType::String);
/// assert_eq!(opts.max_depth, MAX_DEPTH);
/// # Ok::<(), Error>(())
/// ```
#[derive(Educe, Clone, Debug, Serialize, Deserialize)]
#[educe(PartialEq, Default)]
#[serde(deny_unknown_fields, default)]
pub struct DocumentOptions {
    /// The kind of key stored in the document header.
    pub key_type: KeyType,
    /// Bytes reserved for the document buffer up front.
    #[educe(PartialEq(ignore))]
    #[educe(Default = DEFAULT_MIN_CAPACITY)]
    pub min_capacity: usize,
    /// Slots reserved when a column is opened without an explicit capacity.
    #[educe(Default = DEFAULT_COLUMN_CAPACITY)]
    pub column_capacity: usize,
    /// Derivation used for arrays created while ingesting JSON.
    pub array_derivation: ListDerivation,
    /// Derivation used for objects created while ingesting JSON.
    pub object_derivation: MapDerivation,
    /// Deepest nesting allowed, counting the root array as depth 1.
    #[educe(Default = MAX_DEPTH)]
    pub max_depth: usize,
}

impl DocumentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn key_type(mut self, key_type: KeyType) -> Self {
        self.key_type = key_type;
        self
    }

    pub fn min_capacity(mut self, min_capacity: usize) -> Self {
        self.min_capacity = min_capacity;
        self
    }

    /// Initial slot count for columns. Zero is bumped to one.
    pub fn column_capacity(mut self, column_capacity: usize) -> Self {
        self.column_capacity = column_capacity.max(1);
        self
    }

    pub fn array_derivation(mut self, derivation: ListDerivation) -> Self {
        self.array_derivation = derivation;
        self
    }

    pub fn object_derivation(mut self, derivation: MapDerivation) -> Self {
        self.object_derivation = derivation;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
