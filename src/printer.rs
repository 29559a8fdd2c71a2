//! Rendering documents as JSON text.
//!
//! [`print`] walks a document's root array and calls into a [`Printer`] for every container
//! boundary, property name, and scalar. Two printers are provided: [`CompactPrinter`] writes
//! plain JSON, and [`ExtendedPrinter`] also records the document's key and revision.
//!
//! A root array holding exactly one element is a "unit" root and is rendered as that element
//! alone, which is how a document ingested from JSON prints back as the JSON it came from. A
//! root array with nothing in it is an empty record.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::document::{Document, Key};
use crate::encode::Scalar;
use crate::error::Result;
use crate::iter::{ArrayIter, Binary, BinaryType, ColumnIter, Field, ObjectIter};

/// Hooks called by [`print`] while walking a document.
///
/// Every hook appends to `out`. Separators between elements and properties are the printer's
/// job, through [`separator`][Printer::separator].
pub trait Printer {
    fn begin_document(
        &mut self,
        _out: &mut String,
        _key: &Key,
        _revision: Option<u64>,
    ) -> Result<()> {
        Ok(())
    }
    fn end_document(&mut self, _out: &mut String) -> Result<()> {
        Ok(())
    }

    fn begin_array(&mut self, out: &mut String) -> Result<()>;
    fn end_array(&mut self, out: &mut String) -> Result<()>;
    /// Called instead of `begin_array` for a unit root array.
    fn begin_unit_array(&mut self, out: &mut String) -> Result<()>;
    fn end_unit_array(&mut self, out: &mut String) -> Result<()>;
    fn begin_object(&mut self, out: &mut String) -> Result<()>;
    fn end_object(&mut self, out: &mut String) -> Result<()>;
    /// Called for a root array with no elements.
    fn empty_record(&mut self, out: &mut String) -> Result<()>;
    fn separator(&mut self, out: &mut String) -> Result<()>;
    fn prop_name(&mut self, out: &mut String, key: &str) -> Result<()>;

    fn null(&mut self, out: &mut String) -> Result<()>;
    fn boolean(&mut self, out: &mut String, v: bool) -> Result<()>;
    fn unsigned(&mut self, out: &mut String, v: u64) -> Result<()>;
    fn signed(&mut self, out: &mut String, v: i64) -> Result<()>;
    fn float(&mut self, out: &mut String, v: f32) -> Result<()>;
    fn string(&mut self, out: &mut String, v: &str) -> Result<()>;
    fn binary(&mut self, out: &mut String, v: Binary) -> Result<()>;
}

/// Walk a whole document, returning what the printer wrote.
pub fn print<P: Printer + ?Sized>(printer: &mut P, doc: &Document) -> Result<String> {
    let mut out = String::new();
    let revision = if doc.key_type().has_revision() {
        Some(doc.revision()?)
    } else {
        None
    };
    printer.begin_document(&mut out, &doc.key()?, revision)?;
    let root = doc.iter()?;
    if root.is_unit()? {
        let mut root = root;
        root.next()?;
        printer.begin_unit_array(&mut out)?;
        print_field(printer, &mut out, root.field()?)?;
        printer.end_unit_array(&mut out)?;
    } else {
        let mut probe = root.clone();
        if probe.next()? {
            print_array(printer, &mut out, root)?;
        } else {
            printer.empty_record(&mut out)?;
        }
    }
    printer.end_document(&mut out)?;
    Ok(out)
}

/// Print one field and everything nested in it.
pub fn print_field<P: Printer + ?Sized>(p: &mut P, out: &mut String, field: Field) -> Result<()> {
    match field {
        Field::Scalar(s) => print_scalar(p, out, s),
        Field::Array(a) => print_array(p, out, a),
        Field::Object(o) => print_object(p, out, o),
        Field::Column(c) => print_column(p, out, c),
    }
}

fn print_array<P>(p: &mut P, out: &mut String, mut it: ArrayIter) -> Result<()>
where
    P: Printer + ?Sized,
{
    p.begin_array(out)?;
    let mut first = true;
    while it.next()? {
        if !first {
            p.separator(out)?;
        }
        first = false;
        print_field(p, out, it.field()?)?;
    }
    p.end_array(out)
}

fn print_object<P>(p: &mut P, out: &mut String, mut it: ObjectIter) -> Result<()>
where
    P: Printer + ?Sized,
{
    p.begin_object(out)?;
    let mut first = true;
    while it.next()? {
        if !first {
            p.separator(out)?;
        }
        first = false;
        p.prop_name(out, it.key()?)?;
        print_field(p, out, it.field()?)?;
    }
    p.end_object(out)
}

fn print_column<P>(p: &mut P, out: &mut String, col: ColumnIter) -> Result<()>
where
    P: Printer + ?Sized,
{
    p.begin_array(out)?;
    for (i, v) in col.values().iter().enumerate() {
        if i > 0 {
            p.separator(out)?;
        }
        print_scalar(p, out, v)?;
    }
    p.end_array(out)
}

fn print_scalar<P: Printer + ?Sized>(p: &mut P, out: &mut String, s: Scalar) -> Result<()> {
    match s {
        Scalar::Null => p.null(out),
        Scalar::True => p.boolean(out, true),
        Scalar::False => p.boolean(out, false),
        Scalar::U8(v) => p.unsigned(out, v as u64),
        Scalar::U16(v) => p.unsigned(out, v as u64),
        Scalar::U32(v) => p.unsigned(out, v as u64),
        Scalar::U64(v) => p.unsigned(out, v),
        Scalar::I8(v) => p.signed(out, v as i64),
        Scalar::I16(v) => p.signed(out, v as i64),
        Scalar::I32(v) => p.signed(out, v as i64),
        Scalar::I64(v) => p.signed(out, v),
        Scalar::Float(v) => p.float(out, v),
        Scalar::String(v) => p.string(out, v),
        Scalar::Binary { mime, data } => p.binary(
            out,
            Binary {
                ty: BinaryType::Mime(mime),
                data,
            },
        ),
        Scalar::CustomBinary { ty, data } => p.binary(
            out,
            Binary {
                ty: BinaryType::Custom(ty),
                data,
            },
        ),
    }
}

fn push_json_str(out: &mut String, v: &str) -> Result<()> {
    out.push_str(&serde_json::to_string(v)?);
    Ok(())
}

// Floats always keep a decimal point so they read back as floats.
fn push_float(out: &mut String, v: f32) {
    if v.is_finite() {
        let text = v.to_string();
        let integral = !text.contains('.');
        out.push_str(&text);
        if integral {
            out.push_str(".0");
        }
    } else {
        out.push_str("null");
    }
}

/// Plain JSON with no extra whitespace.
///
/// Binary values become objects: `{"type":"image/png","encoding":"base64","binary-string":"..."}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct CompactPrinter;

impl Printer for CompactPrinter {
    fn begin_array(&mut self, out: &mut String) -> Result<()> {
        out.push('[');
        Ok(())
    }

    fn end_array(&mut self, out: &mut String) -> Result<()> {
        out.push(']');
        Ok(())
    }

    fn begin_unit_array(&mut self, _out: &mut String) -> Result<()> {
        Ok(())
    }

    fn end_unit_array(&mut self, _out: &mut String) -> Result<()> {
        Ok(())
    }

    fn begin_object(&mut self, out: &mut String) -> Result<()> {
        out.push('{');
        Ok(())
    }

    fn end_object(&mut self, out: &mut String) -> Result<()> {
        out.push('}');
        Ok(())
    }

    fn empty_record(&mut self, out: &mut String) -> Result<()> {
        out.push_str("{}");
        Ok(())
    }

    fn separator(&mut self, out: &mut String) -> Result<()> {
        out.push(',');
        Ok(())
    }

    fn prop_name(&mut self, out: &mut String, key: &str) -> Result<()> {
        push_json_str(out, key)?;
        out.push(':');
        Ok(())
    }

    fn null(&mut self, out: &mut String) -> Result<()> {
        out.push_str("null");
        Ok(())
    }

    fn boolean(&mut self, out: &mut String, v: bool) -> Result<()> {
        out.push_str(if v { "true" } else { "false" });
        Ok(())
    }

    fn unsigned(&mut self, out: &mut String, v: u64) -> Result<()> {
        out.push_str(&v.to_string());
        Ok(())
    }

    fn signed(&mut self, out: &mut String, v: i64) -> Result<()> {
        out.push_str(&v.to_string());
        Ok(())
    }

    fn float(&mut self, out: &mut String, v: f32) -> Result<()> {
        push_float(out, v);
        Ok(())
    }

    fn string(&mut self, out: &mut String, v: &str) -> Result<()> {
        push_json_str(out, v)
    }

    fn binary(&mut self, out: &mut String, v: Binary) -> Result<()> {
        out.push_str("{\"type\":");
        push_json_str(out, v.type_name())?;
        out.push_str(",\"encoding\":\"base64\",\"binary-string\":\"");
        out.push_str(&STANDARD.encode(v.data));
        out.push_str("\"}");
        Ok(())
    }
}

/// JSON that wraps the content with the document's metadata:
/// `{"meta":{"key":{"type":"unsigned","value":7},"rev":2},"doc":...}`.
///
/// Unlike [`CompactPrinter`], a unit root keeps its brackets, so the output always shows the
/// root array as stored.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExtendedPrinter {
    inner: CompactPrinter,
}

impl Printer for ExtendedPrinter {
    fn begin_document(&mut self, out: &mut String, key: &Key, revision: Option<u64>) -> Result<()> {
        let key_type = match key {
            Key::None => "nokey",
            Key::Unsigned(_) => "unsigned",
            Key::Signed(_) => "signed",
            Key::String(_) => "string",
        };
        out.push_str("{\"meta\":{\"key\":{\"type\":\"");
        out.push_str(key_type);
        out.push_str("\",\"value\":");
        out.push_str(&serde_json::to_string(key)?);
        out.push_str("},\"rev\":");
        match revision {
            Some(rev) => out.push_str(&rev.to_string()),
            None => out.push_str("null"),
        }
        out.push_str("},\"doc\":");
        Ok(())
    }

    fn end_document(&mut self, out: &mut String) -> Result<()> {
        out.push('}');
        Ok(())
    }

    fn begin_array(&mut self, out: &mut String) -> Result<()> {
        self.inner.begin_array(out)
    }

    fn end_array(&mut self, out: &mut String) -> Result<()> {
        self.inner.end_array(out)
    }

    fn begin_unit_array(&mut self, out: &mut String) -> Result<()> {
        self.inner.begin_array(out)
    }

    fn end_unit_array(&mut self, out: &mut String) -> Result<()> {
        self.inner.end_array(out)
    }

    fn begin_object(&mut self, out: &mut String) -> Result<()> {
        self.inner.begin_object(out)
    }

    fn end_object(&mut self, out: &mut String) -> Result<()> {
        self.inner.end_object(out)
    }

    fn empty_record(&mut self, out: &mut String) -> Result<()> {
        out.push_str("[]");
        Ok(())
    }

    fn separator(&mut self, out: &mut String) -> Result<()> {
        self.inner.separator(out)
    }

    fn prop_name(&mut self, out: &mut String, key: &str) -> Result<()> {
        self.inner.prop_name(out, key)
    }

    fn null(&mut self, out: &mut String) -> Result<()> {
        self.inner.null(out)
    }

    fn boolean(&mut self, out: &mut String, v: bool) -> Result<()> {
        self.inner.boolean(out, v)
    }

    fn unsigned(&mut self, out: &mut String, v: u64) -> Result<()> {
        self.inner.unsigned(out, v)
    }

    fn signed(&mut self, out: &mut String, v: i64) -> Result<()> {
        self.inner.signed(out, v)
    }

    fn float(&mut self, out: &mut String, v: f32) -> Result<()> {
        self.inner.float(out, v)
    }

    fn string(&mut self, out: &mut String, v: &str) -> Result<()> {
        self.inner.string(out, v)
    }

    fn binary(&mut self, out: &mut String, v: Binary) -> Result<()> {
        self.inner.binary(out, v)
    }
}

impl Document {
    /// Render as plain JSON.
    ///
    /// ```
    /// # use carbon_pack::*;
    /// let doc = Document::from_json(r#"{"a": [1, 2, 3]}"#, DocumentOptions::default())?;
    /// assert_eq!(doc.to_json_compact()?, r#"{"a":[1,2,3]}"#);
    /// # Ok::<(), Error>(())
    /// ```
    pub fn to_json_compact(&self) -> Result<String> {
        print(&mut CompactPrinter, self)
    }

    /// Render as JSON along with the key and revision.
    pub fn to_json_extended(&self) -> Result<String> {
        print(&mut ExtendedPrinter::default(), self)
    }
}
