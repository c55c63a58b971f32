//! Result row formatting.
//!
//! - [`FieldDescriptor`], column metadata sent in `RowDescription`
//! - [`RowValues`], a source of column values sent in `DataRow`
//! - [`writer_for`], per type value writer
use std::collections::{BTreeMap, HashMap};

use crate::{
    Value,
    codec::BufferWriter,
    common::ByteStr,
    postgres::{Oid, PgFormat, pg_type},
};

/// Result column metadata.
///
/// Type oid and size are resolved from the type name unless given explicitly.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// The field name.
    pub name: ByteStr,
    /// Logical type name, e.g. `"text"`, see [`pg_type::lookup`].
    pub type_name: Option<ByteStr>,
    /// If the field can be identified as a column of a specific table, the object ID of the table; otherwise zero.
    pub table_id: i32,
    /// If the field can be identified as a column of a specific table, the attribute number of the column; otherwise zero.
    pub column_id: i16,
    /// Explicit type oid.
    pub type_id: Option<Oid>,
    /// Explicit type size, negative values denote variable-width types.
    pub type_size: Option<i16>,
    /// The type modifier. The meaning of the modifier is type-specific.
    pub type_modifier: i32,
    /// The format code being used for the field.
    pub format: PgFormat,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<ByteStr>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            table_id: 0,
            column_id: 0,
            type_id: None,
            type_size: None,
            type_modifier: 0,
            format: PgFormat::Text,
        }
    }

    pub fn type_name(mut self, type_name: impl Into<ByteStr>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn type_id(mut self, oid: Oid) -> Self {
        self.type_id = Some(oid);
        self
    }

    pub fn type_size(mut self, size: i16) -> Self {
        self.type_size = Some(size);
        self
    }

    pub fn table(mut self, table_id: i32, column_id: i16) -> Self {
        self.table_id = table_id;
        self.column_id = column_id;
        self
    }

    pub fn type_modifier(mut self, type_modifier: i32) -> Self {
        self.type_modifier = type_modifier;
        self
    }

    /// Set the advertised format.
    ///
    /// Values are not converted into binary. With [`PgFormat::Binary`], [`Value::Bytes`]
    /// is written as is, so the delegate is responsible to pre-encode it. Other values
    /// are still written in text form.
    pub fn format(mut self, format: PgFormat) -> Self {
        self.format = format;
        self
    }

    fn lookup(&self) -> Option<pg_type::PgTypeInfo> {
        self.type_name.as_deref().and_then(pg_type::lookup)
    }

    /// Returns the resolved type oid, zero when unknown.
    pub fn oid(&self) -> Oid {
        self.type_id
            .or_else(|| self.lookup().map(|e| e.oid))
            .unwrap_or(0)
    }

    /// Returns the value writer for this field, see [`writer_for`].
    pub fn writer(&self) -> ValueWriter {
        match self.format {
            PgFormat::Binary => binary_writer,
            PgFormat::Text => writer_for(self.oid()),
        }
    }

    /// Returns the resolved type size, `-1` when unknown.
    pub fn size(&self) -> i16 {
        self.type_size
            .or_else(|| self.lookup().map(|e| e.size))
            .unwrap_or(-1)
    }
}

/// A source of column values for a single row.
///
/// Positional rows are indexed by column index, named rows by field name.
pub trait RowValues {
    /// Returns the value of column at `index` named `name`, [`None`] is written as `NULL`.
    fn value(&self, index: usize, name: &str) -> Option<&Value>;
}

impl RowValues for [Value] {
    fn value(&self, index: usize, _: &str) -> Option<&Value> {
        self.get(index)
    }
}

impl RowValues for Vec<Value> {
    fn value(&self, index: usize, _: &str) -> Option<&Value> {
        self.get(index)
    }
}

impl<const N: usize> RowValues for [Value; N] {
    fn value(&self, index: usize, _: &str) -> Option<&Value> {
        self.get(index)
    }
}

impl<S> RowValues for HashMap<String, Value, S>
where
    S: std::hash::BuildHasher,
{
    fn value(&self, _: usize, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl RowValues for BTreeMap<String, Value> {
    fn value(&self, _: usize, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl<R: RowValues + ?Sized> RowValues for &R {
    fn value(&self, index: usize, name: &str) -> Option<&Value> {
        R::value(self, index, name)
    }
}

/// Write a single column value of a `DataRow`, including its length prefix.
pub type ValueWriter = fn(Option<&Value>, &mut BufferWriter);

/// Select the value writer for type oid.
pub fn writer_for(oid: Oid) -> ValueWriter {
    const DATE: Oid = pg_type::DATE.oid;
    const BOOL: Oid = pg_type::BOOL.oid;
    const BYTEA: Oid = pg_type::BYTEA.oid;

    match oid {
        DATE => date_writer,
        BOOL => bool_writer,
        BYTEA => bytea_writer,
        _ => default_writer,
    }
}

/// `NULL` as `-1` length, otherwise the text form of the value.
pub fn default_writer(value: Option<&Value>, w: &mut BufferWriter) {
    match value {
        None | Some(Value::Null) => {
            w.add_pbytes(None);
        }
        Some(Value::Text(text)) => {
            w.add_pstring(Some(text.as_str()));
        }
        Some(Value::Int(i)) => {
            w.add_pstring(Some(itoa::Buffer::new().format(*i)));
        }
        Some(value) => {
            w.add_pstring(Some(&value.to_string()));
        }
    }
}

/// Date part only, as `YYYY-MM-DD`.
fn date_writer(value: Option<&Value>, w: &mut BufferWriter) {
    let text = match value {
        None | Some(Value::Null) => return default_writer(value, w),
        Some(value) => value.to_string(),
    };
    let end = text.char_indices().nth(10).map_or(text.len(), |(i, _)| i);
    w.add_pstring(Some(&text[..end]));
}

/// Boolean as `t` or `f`.
fn bool_writer(value: Option<&Value>, w: &mut BufferWriter) {
    match value {
        Some(Value::Bool(b)) => {
            w.add_pstring(Some(if *b { "t" } else { "f" }));
        }
        _ => default_writer(value, w),
    }
}

/// Binary in hex format, `\x` followed by two hex digits per byte.
fn bytea_writer(value: Option<&Value>, w: &mut BufferWriter) {
    match value {
        Some(Value::Text(text)) => {
            let bytes = Value::Bytes(text.clone().into_bytes());
            default_writer(Some(&bytes), w)
        }
        _ => default_writer(value, w),
    }
}

/// Pre-encoded binary value written as is.
fn binary_writer(value: Option<&Value>, w: &mut BufferWriter) {
    match value {
        Some(Value::Bytes(bytes)) => {
            w.add_pbytes(Some(&bytes[..]));
        }
        _ => default_writer(value, w),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn write(oid: Oid, value: Option<Value>) -> Vec<u8> {
        let mut w = BufferWriter::new();
        writer_for(oid)(value.as_ref(), &mut w);
        w.flush_untagged().to_vec()
    }

    #[test]
    fn resolve_type() {
        let field = FieldDescriptor::new("id").type_name("int");
        assert_eq!(field.oid(), 23);
        assert_eq!(field.size(), 4);

        let field = FieldDescriptor::new("id").type_name("int").type_id(20).type_size(8);
        assert_eq!(field.oid(), 20);
        assert_eq!(field.size(), 8);

        let field = FieldDescriptor::new("shape").type_name("geometry");
        assert_eq!(field.oid(), 0);
        assert_eq!(field.size(), -1);
    }

    #[test]
    fn text_form_writer() {
        assert_eq!(write(25, None), b"\xff\xff\xff\xff");
        assert_eq!(write(25, Some(Value::Null)), b"\xff\xff\xff\xff");
        assert_eq!(write(23, Some(Value::Int(-12))), b"\0\0\0\x03-12");
        assert_eq!(write(25, Some(Value::from("foo"))), b"\0\0\0\x03foo");
        assert_eq!(write(0, Some(Value::from(false))), b"\0\0\0\x05false");
    }

    #[test]
    fn typed_writers() {
        assert_eq!(write(16, Some(Value::from(true))), b"\0\0\0\x01t");
        assert_eq!(write(16, Some(Value::from(false))), b"\0\0\0\x01f");
        assert_eq!(write(17, Some(Value::from("A"))), b"\0\0\0\x04\\x41");
        assert_eq!(
            write(1082, Some(Value::from("2024-03-09T14:05:07Z"))),
            b"\0\0\0\x0a2024-03-09"
        );
        assert_eq!(write(1082, Some(Value::from("short"))), b"\0\0\0\x05short");
        assert_eq!(write(1082, None), b"\xff\xff\xff\xff");
    }

    #[test]
    fn binary_field() {
        let field = FieldDescriptor::new("id").type_name("int4").format(PgFormat::Binary);
        let mut w = BufferWriter::new();
        field.writer()(Some(&Value::from(bytes::Bytes::from_static(b"\0\0\0\x07"))), &mut w);
        field.writer()(Some(&Value::from(7)), &mut w);
        field.writer()(None, &mut w);
        assert_eq!(
            &w.flush_untagged()[..],
            b"\0\0\0\x04\0\0\0\x07\0\0\0\x017\xff\xff\xff\xff"
        );

        let field = FieldDescriptor::new("raw").type_name("bytea");
        let mut w = BufferWriter::new();
        field.writer()(Some(&Value::from(bytes::Bytes::from_static(b"A"))), &mut w);
        assert_eq!(&w.flush_untagged()[..], b"\0\0\0\x04\\x41");
    }

    #[test]
    fn row_sources() {
        let positional = vec![Value::from(1), Value::from("a")];
        assert_eq!(positional.value(1, "ignored"), Some(&Value::from("a")));
        assert_eq!(positional.value(2, "ignored"), None);

        let named = HashMap::from([("name".to_string(), Value::from("bob"))]);
        assert_eq!(named.value(0, "name"), Some(&Value::from("bob")));
        assert_eq!(named.value(0, "age"), None);
    }
}
