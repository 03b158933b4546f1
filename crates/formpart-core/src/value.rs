//! Form data model
//!
//! A [`Form`] is an ordered list of named fields. Each field holds either a
//! plain value rendered as a text part, a single file, or a list of files
//! sharing the field name.

use bytes::Bytes;
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::PathBuf;

/// Runtime kind of a text field value, used for converter dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    /// Get the kind of a JSON value
    pub fn of(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(_) => Self::Bool,
            serde_json::Value::Number(_) => Self::Number,
            serde_json::Value::String(_) => Self::String,
            serde_json::Value::Array(_) => Self::Array,
            serde_json::Value::Object(_) => Self::Object,
        }
    }

    /// Get the kind name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a file's bytes come from
pub enum FileSource {
    /// An already open stream
    Reader(Box<dyn Read + Send>),
    /// A file on disk, opened when its part is written
    Path(PathBuf),
    /// In-memory content
    Bytes(Bytes),
}

impl FileSource {
    /// Open the source for reading
    ///
    /// Path sources are opened here; the returned reader closes the file on drop.
    pub fn open(self) -> io::Result<Box<dyn Read + Send>> {
        match self {
            Self::Reader(reader) => Ok(reader),
            Self::Path(path) => Ok(Box::new(File::open(path)?)),
            Self::Bytes(bytes) => Ok(Box::new(Cursor::new(bytes))),
        }
    }
}

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reader(_) => f.write_str("Reader(..)"),
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
        }
    }
}

/// A file-like form value
#[derive(Debug)]
pub struct FormFile {
    /// Original file name
    pub filename: String,
    /// Declared size in bytes
    pub size: u64,
    /// Declared content type
    pub content_type: Option<String>,
    /// Content source
    pub source: FileSource,
}

impl FormFile {
    /// Create a file from an open stream with a declared size
    pub fn from_reader(
        filename: impl Into<String>,
        size: u64,
        reader: impl Read + Send + 'static,
    ) -> Self {
        Self {
            filename: filename.into(),
            size,
            content_type: None,
            source: FileSource::Reader(Box::new(reader)),
        }
    }

    /// Create a file from in-memory content
    pub fn from_bytes(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            filename: filename.into(),
            size: data.len() as u64,
            content_type: None,
            source: FileSource::Bytes(data),
        }
    }

    /// Create a file backed by a path on disk
    ///
    /// The file name and size are taken from the path's metadata; the file
    /// itself is not opened until the part is written.
    pub fn from_path(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let size = std::fs::metadata(&path)?.len();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            filename,
            size,
            content_type: None,
            source: FileSource::Path(path),
        })
    }

    /// Set the content type
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// A form field value
#[derive(Debug)]
pub enum FieldValue {
    /// Plain or structured value, written as a text part
    Text(serde_json::Value),
    /// Single file
    File(FormFile),
    /// Several files under one field name
    Files(Vec<FormFile>),
}

impl FieldValue {
    /// Create a text value
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(serde_json::Value::String(value.into()))
    }

    /// Create a text value from any serializable value
    pub fn json<T: Serialize>(value: &T) -> serde_json::Result<Self> {
        Ok(Self::Text(serde_json::to_value(value)?))
    }

    /// Check if this value produces file parts
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_) | Self::Files(_))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Text(value.into())
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Text(value.into())
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Text(value.into())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Text(value.into())
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        Self::Text(value.into())
    }
}

/// Non-finite floats have no JSON number form and are kept as text (`NaN`, `inf`)
impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        if value.is_finite() {
            Self::Text(value.into())
        } else {
            Self::text(value.to_string())
        }
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Text(value)
    }
}

impl From<FormFile> for FieldValue {
    fn from(file: FormFile) -> Self {
        Self::File(file)
    }
}

impl From<Vec<FormFile>> for FieldValue {
    fn from(files: Vec<FormFile>) -> Self {
        Self::Files(files)
    }
}

/// A named form field
#[derive(Debug)]
pub struct FormField {
    /// Field name
    pub name: String,
    /// Field value
    pub value: FieldValue,
}

/// An ordered form
///
/// Fields keep the order they were added in, and the same name may appear
/// more than once.
#[derive(Debug, Default)]
pub struct Form {
    fields: Vec<FormField>,
}

impl Form {
    /// Create an empty form
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.push(name, value);
        self
    }

    /// Add a text field
    pub fn text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.field(name, FieldValue::text(value))
    }

    /// Add a file field
    pub fn file(self, name: impl Into<String>, file: FormFile) -> Self {
        self.field(name, FieldValue::File(file))
    }

    /// Add several files under one name
    pub fn files(self, name: impl Into<String>, files: Vec<FormFile>) -> Self {
        self.field(name, FieldValue::Files(files))
    }

    /// Append a field in place
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.push(FormField {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the form has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over fields in order
    pub fn iter(&self) -> impl Iterator<Item = &FormField> {
        self.fields.iter()
    }
}

impl IntoIterator for Form {
    type Item = FormField;
    type IntoIter = std::vec::IntoIter<FormField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<K, V> FromIterator<(K, V)> for Form
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut form = Form::new();
        for (name, value) in iter {
            form.push(name, value);
        }
        form
    }
}
