use crate::document::Document;
use crate::dot::{DotNode, DotPath};
use crate::error::{Error, Result};
use crate::iter::Field;

// One step down the path. Anything that doesn't line up is a miss.
fn step<'a>(field: Field<'a>, node: &DotNode) -> Result<Option<Field<'a>>> {
    match (field, node) {
        (Field::Array(mut it), DotNode::Index(index)) => {
            for _ in 0..=*index {
                if !it.next()? {
                    return Ok(None);
                }
            }
            it.field().map(Some)
        }
        (Field::Column(col), DotNode::Index(index)) => {
            Ok(col.get(*index as usize).map(Field::Scalar))
        }
        (Field::Object(mut it), DotNode::Key(key)) => {
            while it.next()? {
                if it.key()? == key {
                    return it.field().map(Some);
                }
            }
            Ok(None)
        }
        _ => Ok(None),
    }
}

impl Document {
    /// Look up the field at a dot path, returning `None` if nothing is there.
    ///
    /// Paths start at the root array, except when the root holds exactly one element: then
    /// they start at that element, matching how the document renders as JSON. Keys match the
    /// first property with that name.
    ///
    /// ```
    /// # use carbon_pack::*;
    /// let doc = Document::from_json(r#"{"a": [{"b": 7}]}"#, DocumentOptions::default())?;
    /// let found = doc.find("a.0.b")?.unwrap();
    /// assert_eq!(found.field_type(), FieldType::U8);
    /// assert!(doc.find("a.1")?.is_none());
    /// # Ok::<(), Error>(())
    /// ```
    pub fn find(&self, path: &str) -> Result<Option<Field<'_>>> {
        self.find_path(&DotPath::parse(path)?)
    }

    pub fn find_path(&self, path: &DotPath) -> Result<Option<Field<'_>>> {
        let mut root = self.iter()?;
        let mut current = if root.is_unit()? {
            root.next()?;
            root.field()?
        } else {
            Field::Array(root)
        };
        for node in path.nodes() {
            current = match step(current, node)? {
                Some(field) => field,
                None => return Ok(None),
            };
        }
        Ok(Some(current))
    }

    /// Like [`find`][Self::find], failing with `NotFound` on a miss.
    pub fn find_required(&self, path: &str) -> Result<Field<'_>> {
        let path = DotPath::parse(path)?;
        self.find_path(&path)?
            .ok_or_else(|| Error::NotFound(format!("nothing at path {}", path)))
    }
}
