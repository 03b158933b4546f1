//! # formpart-core
//!
//! `multipart/form-data` encoding for declarative HTTP clients.
//!
//! A [`Form`] maps field names to values. [`FormPartEncoder`] classifies each
//! field and assembles the body:
//!
//! - **Text values** become `text/plain` parts, rendered by the first matching
//!   converter in a [`ConverterRegistry`]
//! - **Files** become parts carrying their file name, size and content type
//!   (`application/octet-stream` when undeclared), read from their source in
//!   bounded chunks while the body is serialized by `reqwest::multipart`
//! - **File lists** become one part per file under the same field name
//!
//! ## Example
//!
//! ```rust
//! use formpart_core::{Form, FormFile, FormPartEncoder};
//!
//! let form = Form::new()
//!     .text("name", "Alice")
//!     .file("doc", FormFile::from_bytes("a.txt", &b"hello"[..]));
//!
//! let encoded = FormPartEncoder::new().encode_form(Some(form)).unwrap();
//! assert!(encoded.content_type().unwrap().starts_with("multipart/form-data; boundary="));
//! ```

pub mod converter;
pub mod encoder;
pub mod error;
pub mod multipart;
pub mod template;
pub mod value;

pub use converter::{ConverterRegistry, JsonConverter, ScalarConverter, StringConverter, ValueConverter};
pub use encoder::{EncodedRequest, Encoder, FormPartEncoder, RequestBody};
pub use error::{EncodeError, ErrorKind, Result};
pub use multipart::{Part, PartBody};
pub use template::{RequestTemplate, UTF_8};
pub use value::{FieldValue, FileSource, Form, FormField, FormFile, ValueKind};
