//! Value converters for text parts
//!
//! Text parts are rendered by the first converter in a [`ConverterRegistry`]
//! that accepts the value's [`ValueKind`] and the part's content type.

use crate::{EncodeError, Result, value::ValueKind};
use mime::Mime;
use std::fmt;
use std::io::Write;
use std::sync::{Arc, OnceLock};

/// Renders a value into part body bytes
pub trait ValueConverter: Send + Sync + fmt::Debug {
    /// Converter name, used in logs
    fn name(&self) -> &'static str;

    /// Check whether this converter can write `kind` as `content_type`
    fn can_write(&self, kind: ValueKind, content_type: &Mime) -> bool;

    /// Write the value
    fn write(
        &self,
        value: &serde_json::Value,
        content_type: &Mime,
        out: &mut dyn Write,
    ) -> Result<()>;
}

fn kind_mismatch(converter: &dyn ValueConverter, value: &serde_json::Value) -> EncodeError {
    EncodeError::Serialization(format!(
        "{} converter cannot write a {} value",
        converter.name(),
        ValueKind::of(value)
    ))
}

/// Writes string values verbatim as UTF-8
#[derive(Debug, Default, Clone, Copy)]
pub struct StringConverter;

impl ValueConverter for StringConverter {
    fn name(&self) -> &'static str {
        "string"
    }

    fn can_write(&self, kind: ValueKind, content_type: &Mime) -> bool {
        kind == ValueKind::String && content_type.type_() == mime::TEXT
    }

    fn write(&self, value: &serde_json::Value, _: &Mime, out: &mut dyn Write) -> Result<()> {
        match value {
            serde_json::Value::String(s) => out.write_all(s.as_bytes())?,
            other => return Err(kind_mismatch(self, other)),
        }
        Ok(())
    }
}

/// Writes booleans and numbers in their display form
#[derive(Debug, Default, Clone, Copy)]
pub struct ScalarConverter;

impl ValueConverter for ScalarConverter {
    fn name(&self) -> &'static str {
        "scalar"
    }

    fn can_write(&self, kind: ValueKind, content_type: &Mime) -> bool {
        matches!(kind, ValueKind::Bool | ValueKind::Number) && content_type.type_() == mime::TEXT
    }

    fn write(&self, value: &serde_json::Value, _: &Mime, out: &mut dyn Write) -> Result<()> {
        match value {
            serde_json::Value::Bool(b) => write!(out, "{}", b)?,
            serde_json::Value::Number(n) => write!(out, "{}", n)?,
            other => return Err(kind_mismatch(self, other)),
        }
        Ok(())
    }
}

/// Writes objects and arrays as compact JSON
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonConverter;

impl JsonConverter {
    fn is_json(content_type: &Mime) -> bool {
        content_type.type_() == mime::APPLICATION
            && (content_type.subtype() == mime::JSON || content_type.suffix() == Some(mime::JSON))
    }
}

impl ValueConverter for JsonConverter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn can_write(&self, kind: ValueKind, content_type: &Mime) -> bool {
        matches!(kind, ValueKind::Object | ValueKind::Array)
            && (Self::is_json(content_type) || content_type.essence_str() == "text/plain")
    }

    fn write(&self, value: &serde_json::Value, _: &Mime, out: &mut dyn Write) -> Result<()> {
        serde_json::to_writer(out, value)?;
        Ok(())
    }
}

/// Ordered set of converters; the first match wins
#[derive(Debug, Clone, Default)]
pub struct ConverterRegistry {
    converters: Vec<Arc<dyn ValueConverter>>,
}

static GLOBAL: OnceLock<Arc<ConverterRegistry>> = OnceLock::new();

impl ConverterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in converters: string, scalar, json
    pub fn with_defaults() -> Self {
        Self::new()
            .with(StringConverter)
            .with(ScalarConverter)
            .with(JsonConverter)
    }

    /// Process-wide default registry, built once and never mutated
    pub fn global() -> Arc<ConverterRegistry> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::with_defaults())))
    }

    /// Append a converter after the existing ones
    pub fn with(mut self, converter: impl ValueConverter + 'static) -> Self {
        self.converters.push(Arc::new(converter));
        self
    }

    /// Insert a converter ahead of the existing ones
    pub fn with_first(mut self, converter: impl ValueConverter + 'static) -> Self {
        self.converters.insert(0, Arc::new(converter));
        self
    }

    /// Number of registered converters
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// Check if no converters are registered
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Find the first converter accepting `kind` as `content_type`
    pub fn find(&self, kind: ValueKind, content_type: &Mime) -> Option<&dyn ValueConverter> {
        self.converters
            .iter()
            .find(|c| c.can_write(kind, content_type))
            .map(|c| c.as_ref())
    }

    /// Render a value with the first matching converter
    pub fn write_value(&self, value: &serde_json::Value, content_type: &Mime) -> Result<Vec<u8>> {
        let kind = ValueKind::of(value);
        let converter = self.find(kind, content_type).ok_or_else(|| EncodeError::NoConverter {
            kind,
            content_type: content_type.to_string(),
        })?;

        tracing::trace!(converter = converter.name(), %kind, "writing text value");
        let mut buf = Vec::new();
        converter.write(value, content_type, &mut buf)?;
        Ok(buf)
    }
}
