//! carbon-pack is a mutable, self-describing binary document format. Documents can be built
//! up in place, read back without decoding the whole thing, and converted to and from JSON.
//!
//! It provides:
//!
//! - Tagged scalar fields: null, booleans, integers from 8 to 64 bits, floats, strings, and
//! 	binary blobs tagged with a MIME type or a custom type name
//! - Arrays and objects, each carrying a derivation that records whether it is sorted and
//! 	whether its members are distinct
//! - Columns: packed runs of one fixed-width type, with a null sentinel per type and capacity
//! 	that grows in place
//! - Insertion cursors that write into any container of an existing document, shifting
//! 	whatever comes after it
//! - Iterators that walk containers lazily, skipping over anything they aren't asked about
//! - JSON ingestion, which packs lists of numbers or booleans into the narrowest column that
//! 	holds them
//! - JSON rendering, dot-path lookup, and serde export
//! - Optional document keys with revisions
//!
//! ```
//! # use carbon_pack::*;
//! let mut doc = Document::from_json(r#"{"name": "probe", "readings": [3, 1, 4]}"#,
//!     DocumentOptions::default())?;
//!
//! // Append a value to the column in place
//! let at = doc.find("readings")?.map(|f| match f {
//!     Field::Column(col) => col.position(),
//!     _ => unreachable!(),
//! }).unwrap();
//! let mut col = doc.column_inserter_at(at)?;
//! col.insert_u8(1)?;
//! col.end()?;
//!
//! assert_eq!(doc.to_json_compact()?, r#"{"name":"probe","readings":[3,1,4,1]}"#);
//! # Ok::<(), Error>(())
//! ```
//!
//! See [`format`] for the byte layout.

mod depth_tracking;
pub mod document;
pub mod dot;
pub mod encode;
pub mod error;
pub mod field_type;
mod find;
pub mod format;
pub mod insert;
pub mod integer;
pub mod iter;
pub mod json;
pub mod memfile;
pub mod mime;
pub mod options;
pub mod printer;
mod ser;
pub mod varint;

pub use self::document::{Document, Key, KeyType};
pub use self::dot::{DotNode, DotPath};
pub use self::encode::{Position, Scalar};
pub use self::error::{ErrKind, Error, Result};
pub use self::field_type::{ColumnType, FieldType, ListDerivation, MapDerivation};
pub use self::insert::{Context, Inserter};
pub use self::integer::Integer;
pub use self::iter::{ArrayIter, Binary, BinaryType, ColumnIter, ColumnValues, Field, ObjectIter};
pub use self::json::{fitting_type, FittingType};
pub use self::options::DocumentOptions;
pub use self::printer::{CompactPrinter, ExtendedPrinter, Printer};

/// The deepest containers may nest, counting the root array as depth 1.
pub const MAX_DEPTH: usize = 100;
/// Bytes reserved for a new document's buffer.
pub const DEFAULT_MIN_CAPACITY: usize = 1024;
/// Slots reserved for a new column when no capacity is given.
pub const DEFAULT_COLUMN_CAPACITY: usize = 4;
/// How much a full column's capacity is multiplied by when it grows.
pub const COLUMN_GROWTH_FACTOR: f64 = 1.7;
