//! # formpart
//!
//! Multipart form encoding for declarative HTTP clients.
//!
//! - [`formpart_core`]: form model, converters, part assembly and encoder
//! - [`formpart_client`]: reqwest client that encodes and sends forms

pub use formpart_client::{ClientError, Config, FormClient};
pub use formpart_core::{
    EncodeError, EncodedRequest, Encoder, ErrorKind, FieldValue, Form, FormFile, FormPartEncoder,
    RequestBody, RequestTemplate,
};
