//! Multipart form encoder

use crate::{
    ConverterRegistry, EncodeError, Result,
    multipart::{self, Part},
    template::{RequestTemplate, UTF_8},
    value::{FieldValue, Form},
};
use bytes::Bytes;
use http::{HeaderMap, header::CONTENT_TYPE};
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Request payload as declared by the caller
#[derive(Debug)]
pub enum RequestBody {
    /// Mapping of field name to value; `None` is a null form
    Form(Option<Form>),
    /// JSON document
    Json(serde_json::Value),
    /// Raw bytes
    Bytes(Bytes),
    /// Plain text
    Text(String),
}

impl RequestBody {
    /// Name of the declared shape
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Form(_) => "form",
            Self::Json(_) => "json",
            Self::Bytes(_) => "bytes",
            Self::Text(_) => "text",
        }
    }
}

impl From<Form> for RequestBody {
    fn from(form: Form) -> Self {
        Self::Form(Some(form))
    }
}

/// Writes a request body into a template
pub trait Encoder: Send + Sync {
    /// Encode `body` into `template`
    fn encode(&self, body: RequestBody, template: &mut RequestTemplate) -> Result<()>;
}

/// Encoded multipart body and the headers that describe it
#[derive(Clone, Debug)]
pub struct EncodedRequest {
    /// Outer headers, including `Content-Type` with the boundary
    pub headers: HeaderMap,
    /// Complete multipart body
    pub body: Bytes,
}

impl EncodedRequest {
    /// Get the outer content type
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// Get the boundary from the content type
    pub fn boundary(&self) -> Option<&str> {
        self.content_type()?
            .split(';')
            .find_map(|param| param.trim().strip_prefix("boundary="))
    }

    /// Copy headers and body onto a template
    ///
    /// Each header replaces whatever the template already carried under that name.
    pub fn apply_to(self, template: &mut RequestTemplate) {
        for name in self.headers.keys() {
            let values = self.headers.get_all(name).iter().cloned();
            template.header(name.clone(), values);
        }
        template.body(self.body, UTF_8);
    }
}

/// Encodes a [`Form`] as `multipart/form-data`
///
/// Text values become `text/plain` parts rendered by the first matching
/// converter; files become parts carrying their declared content type (or
/// `application/octet-stream`), file name and size. A file list produces one
/// part per file, all under the same field name.
#[derive(Clone, Debug)]
pub struct FormPartEncoder {
    converters: Arc<ConverterRegistry>,
}

impl Default for FormPartEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FormPartEncoder {
    /// Create an encoder using the process-wide converter registry
    pub fn new() -> Self {
        Self::with_converters(ConverterRegistry::global())
    }

    /// Create an encoder with a custom converter registry
    pub fn with_converters(converters: Arc<ConverterRegistry>) -> Self {
        info!(converters = converters.len(), "load multipart form encoder");
        Self { converters }
    }

    /// Get the converter registry
    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    /// Encode a form into an in-memory body
    #[instrument(skip_all)]
    pub fn encode_form(&self, form: Option<Form>) -> Result<EncodedRequest> {
        let form = form.ok_or_else(EncodeError::null_form)?;
        debug!(fields = form.len(), "start encode multipart form");

        let parts = self.parts(form)?;
        for part in &parts {
            debug!(name = %part.name, content_type = %part.content_type, file = part.is_file(), "adding part");
        }
        let part_count = parts.len();

        let (headers, body) = multipart::serialize(parts)?;
        debug!(parts = part_count, bytes = body.len(), "encoded multipart form");
        Ok(EncodedRequest { headers, body })
    }

    /// Encode a form and write the body into `sink`, returning the outer headers
    ///
    /// Nothing is written unless encoding succeeds, so a failed call leaves
    /// the sink untouched.
    pub fn encode_to<W: Write>(&self, form: Option<Form>, mut sink: W) -> Result<HeaderMap> {
        let encoded = self.encode_form(form)?;
        sink.write_all(&encoded.body)?;
        sink.flush()?;
        Ok(encoded.headers)
    }

    /// Classify form fields into parts, in form order
    pub fn parts(&self, form: Form) -> Result<Vec<Part>> {
        let mut parts = Vec::with_capacity(form.len());
        for field in form {
            match field.value {
                FieldValue::File(file) => {
                    parts.push(Part::file(field.name, file)?);
                }
                FieldValue::Files(files) => {
                    for file in files {
                        parts.push(Part::file(field.name.clone(), file)?);
                    }
                }
                FieldValue::Text(value) => {
                    let body = self.converters.write_value(&value, &mime::TEXT_PLAIN)?;
                    parts.push(Part::text(field.name, body));
                }
            }
        }
        Ok(parts)
    }
}

impl Encoder for FormPartEncoder {
    fn encode(&self, body: RequestBody, template: &mut RequestTemplate) -> Result<()> {
        let form = match body {
            RequestBody::Form(form) => form,
            other => {
                return Err(EncodeError::UnsupportedShape {
                    expected: "form",
                    actual: other.shape(),
                });
            }
        };

        self.encode_form(form)?.apply_to(template);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, value::FormFile};
    use serde_json::json;

    #[test]
    fn test_text_fields_are_plain_text() {
        let encoder = FormPartEncoder::new();
        let form = Form::new().text("name", "Alice").field("age", 30i64);

        let parts = encoder.parts(form).unwrap();
        assert_eq!(parts.len(), 2);
        assert!(parts.iter().all(|p| p.content_type == mime::TEXT_PLAIN));
        assert_eq!(parts[0].name, "name");
        assert_eq!(parts[1].name, "age");
    }

    #[test]
    fn test_file_list_shares_field_name() {
        let encoder = FormPartEncoder::new();
        let files = vec![
            FormFile::from_bytes("1.txt", &b"one"[..]),
            FormFile::from_bytes("2.txt", &b"two"[..]).with_content_type("text/markdown"),
            FormFile::from_bytes("3.txt", &b"three"[..]),
        ];
        let parts = encoder.parts(Form::new().files("attachments", files)).unwrap();

        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.name == "attachments"));
        let names: Vec<_> = parts.iter().map(|p| p.filename.as_deref().unwrap()).collect();
        assert_eq!(names, vec!["1.txt", "2.txt", "3.txt"]);
        assert_eq!(parts[1].content_type.essence_str(), "text/markdown");
    }

    #[test]
    fn test_empty_file_list_yields_no_parts() {
        let encoder = FormPartEncoder::new();
        let parts = encoder.parts(Form::new().files("none", vec![])).unwrap();
        assert!(parts.is_empty());
    }

    #[test]
    fn test_null_form_is_invalid_input() {
        let err = FormPartEncoder::new().encode_form(None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.to_string(), "invalid input: cannot encode null form");
    }

    #[test]
    fn test_null_text_value_fails() {
        let form = Form::new().field("missing", json!(null));
        let err = FormPartEncoder::new().encode_form(Some(form)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EncodeFailure);
    }

    #[test]
    fn test_headers_come_from_serializer() {
        let encoded = FormPartEncoder::new()
            .encode_form(Some(Form::new().text("k", "v")))
            .unwrap();

        let boundary = encoded.boundary().unwrap();
        assert_eq!(
            encoded.content_type(),
            Some(format!("multipart/form-data; boundary={}", boundary).as_str())
        );
        assert!(encoded.body.starts_with(format!("--{}\r\n", boundary).as_bytes()));
        assert!(encoded.body.ends_with(format!("--{}--\r\n", boundary).as_bytes()));
        assert_eq!(
            encoded.headers.get(http::header::CONTENT_LENGTH).unwrap().to_str().unwrap(),
            encoded.body.len().to_string()
        );
    }

    #[test]
    fn test_encoder_rejects_non_form_shapes() {
        let encoder = FormPartEncoder::new();
        let mut template = RequestTemplate::post("/upload");

        let err = encoder
            .encode(RequestBody::Json(json!({"a": 1})), &mut template)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedShape);
        assert!(template.body_bytes().is_none());
    }

    #[test]
    fn test_encoder_overwrites_template_content_type() {
        let encoder = FormPartEncoder::new();
        let mut template = RequestTemplate::post("/upload");
        template.header(CONTENT_TYPE, [http::HeaderValue::from_static("application/json")]);

        encoder
            .encode(Form::new().text("a", "b").into(), &mut template)
            .unwrap();

        let content_type = template.headers().get(CONTENT_TYPE).unwrap().to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        assert_eq!(template.headers().get_all(CONTENT_TYPE).iter().count(), 1);
        assert_eq!(template.charset(), Some(UTF_8));
        assert!(template.body_bytes().is_some());
    }

    #[test]
    fn test_encode_to_sink() {
        let mut sink = Vec::new();
        let headers = FormPartEncoder::new()
            .encode_to(Some(Form::new().text("x", "y")), &mut sink)
            .unwrap();

        assert!(headers.contains_key(CONTENT_TYPE));
        assert!(String::from_utf8(sink).unwrap().contains("\r\n\r\ny\r\n"));
    }

    #[test]
    fn test_failed_encode_leaves_sink_untouched() {
        let form = Form::new()
            .text("name", "Alice")
            .file("doc", FormFile::from_reader("short.bin", 10, &b"abc"[..]));

        let mut sink = Vec::new();
        let err = FormPartEncoder::new().encode_to(Some(form), &mut sink).unwrap_err();

        assert!(matches!(err, EncodeError::SizeMismatch { declared: 10, .. }));
        assert!(sink.is_empty());
    }
}
