//! Multipart part assembly on top of `reqwest::multipart`
//!
//! Classified fields become [`Part`]s, which are turned into
//! `reqwest::multipart::Part`s and serialized by reqwest. File content is
//! pulled from its source in bounded chunks while the body is collected, and
//! must match the declared size exactly.

use crate::{EncodeError, Result, value::{FileSource, FormFile}};
use bytes::Bytes;
use http::HeaderMap;
use http_body_util::BodyExt;
use mime::Mime;
use reqwest::multipart;
use std::io::{self, Read};
use std::sync::{Arc, Mutex, OnceLock};
use tracing::debug;

/// Chunk size for file parts
const CHUNK_SIZE: usize = 8 * 1024;

/// Placeholder target for the serializing request; only its headers and body are kept
const SERIALIZE_URL: &str = "http://localhost/";

/// Body of a single part
#[derive(Debug)]
pub enum PartBody {
    /// Rendered text value
    Text(Bytes),
    /// File content, read from its source while the body is serialized
    File { source: FileSource, size: u64 },
}

/// A single named part of a multipart body
#[derive(Debug)]
pub struct Part {
    /// Field name
    pub name: String,
    /// Part content type
    pub content_type: Mime,
    /// File name, for file parts
    pub filename: Option<String>,
    /// Part body
    pub body: PartBody,
}

impl Part {
    /// Create a `text/plain` part
    pub fn text(name: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: mime::TEXT_PLAIN,
            filename: None,
            body: PartBody::Text(body.into()),
        }
    }

    /// Create a file part
    ///
    /// The content type is the file's declared type, or
    /// `application/octet-stream` when none was declared.
    pub fn file(name: impl Into<String>, file: FormFile) -> Result<Self> {
        let content_type = match file.content_type {
            Some(value) => value
                .parse::<Mime>()
                .map_err(|_| EncodeError::InvalidContentType { value })?,
            None => mime::APPLICATION_OCTET_STREAM,
        };

        Ok(Self {
            name: name.into(),
            content_type,
            filename: Some(file.filename),
            body: PartBody::File {
                source: file.source,
                size: file.size,
            },
        })
    }

    /// Check if this is a file part
    pub fn is_file(&self) -> bool {
        matches!(self.body, PartBody::File { .. })
    }

    /// Declared body length
    pub fn len(&self) -> u64 {
        match &self.body {
            PartBody::Text(bytes) => bytes.len() as u64,
            PartBody::File { size, .. } => *size,
        }
    }

    /// Check if the body is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn into_reqwest(self, failure: &FailureSlot) -> Result<(String, multipart::Part)> {
        let part = match self.body {
            PartBody::Text(bytes) => multipart::Part::bytes(bytes.to_vec()),
            PartBody::File { source, size } => {
                let chunks = SizedChunks {
                    filename: self.filename.clone().unwrap_or_default(),
                    declared: size,
                    read: 0,
                    source: Some(source),
                    reader: None,
                    failure: failure.clone(),
                };
                let body = reqwest::Body::wrap_stream(futures::stream::iter(chunks));
                multipart::Part::stream_with_length(body, size)
            }
        };

        let part = match self.filename {
            Some(filename) => part.file_name(filename),
            None => part,
        };
        let part = part
            .mime_str(self.content_type.as_ref())
            .map_err(|_| EncodeError::InvalidContentType {
                value: self.content_type.to_string(),
            })?;

        Ok((self.name, part))
    }
}

/// First failure raised by a file source during serialization
///
/// reqwest reports body errors as its own error type, so the typed error is
/// kept here and handed back once collection fails.
#[derive(Clone, Default)]
struct FailureSlot(Arc<Mutex<Option<EncodeError>>>);

impl FailureSlot {
    fn record(&self, err: EncodeError) {
        if let Ok(mut slot) = self.0.lock() {
            if slot.is_none() {
                *slot = Some(err);
            }
        }
    }

    fn take(&self) -> Option<EncodeError> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// Reads a file source in chunks, enforcing its declared size
///
/// The source is opened on the first pull and dropped as soon as it is
/// exhausted or fails.
struct SizedChunks {
    filename: String,
    declared: u64,
    read: u64,
    source: Option<FileSource>,
    reader: Option<Box<dyn Read + Send>>,
    failure: FailureSlot,
}

impl SizedChunks {
    fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        if self.reader.is_none() {
            let Some(source) = self.source.take() else {
                return Ok(None);
            };
            let reader = source.open().map_err(|e| file_read(&self.filename, e))?;
            self.reader = Some(reader);
        }
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        let remaining = self.declared - self.read;
        if remaining == 0 {
            let mut probe = [0u8; 1];
            let extra = read_retrying(reader, &mut probe).map_err(|e| file_read(&self.filename, e))?;
            self.reader = None;
            if extra > 0 {
                return Err(EncodeError::SizeMismatch {
                    filename: self.filename.clone(),
                    declared: self.declared,
                    actual: format!("holds more than {} bytes", self.declared),
                });
            }
            return Ok(None);
        }

        let mut buf = vec![0u8; remaining.min(CHUNK_SIZE as u64) as usize];
        let n = read_retrying(reader, &mut buf).map_err(|e| file_read(&self.filename, e))?;
        if n == 0 {
            return Err(EncodeError::SizeMismatch {
                filename: self.filename.clone(),
                declared: self.declared,
                actual: format!("ended after {} bytes", self.read),
            });
        }

        buf.truncate(n);
        self.read += n as u64;
        Ok(Some(Bytes::from(buf)))
    }
}

impl Iterator for SizedChunks {
    type Item = io::Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_chunk() {
            Ok(chunk) => chunk.map(Ok),
            Err(err) => {
                self.reader = None;
                self.source = None;
                let io_err = io::Error::other(err.to_string());
                self.failure.record(err);
                Some(Err(io_err))
            }
        }
    }
}

fn file_read(filename: &str, source: io::Error) -> EncodeError {
    EncodeError::FileRead {
        filename: filename.to_string(),
        source,
    }
}

fn read_retrying(reader: &mut Box<dyn Read + Send>, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

/// Shared client used only to build requests for serialization
fn serializer() -> Result<&'static reqwest::Client> {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

    if let Some(client) = CLIENT.get() {
        return Ok(client);
    }
    let client = reqwest::Client::builder()
        .build()
        .map_err(|e| EncodeError::Serialization(e.to_string()))?;
    Ok(CLIENT.get_or_init(|| client))
}

/// Serialize parts into the outer headers and the complete body
///
/// The headers are the ones reqwest attaches for a multipart body:
/// `Content-Type` with the generated boundary, and `Content-Length`.
pub fn serialize(parts: Vec<Part>) -> Result<(HeaderMap, Bytes)> {
    let failure = FailureSlot::default();
    let mut form = multipart::Form::new();
    for part in parts {
        let (name, part) = part.into_reqwest(&failure)?;
        form = form.part(name, part);
    }

    let mut request = serializer()?
        .post(SERIALIZE_URL)
        .multipart(form)
        .build()
        .map_err(|e| EncodeError::Serialization(e.to_string()))?;

    let headers = std::mem::take(request.headers_mut());
    let Some(body) = request.body_mut().take() else {
        return Ok((headers, Bytes::new()));
    };

    let collected = futures::executor::block_on(body.collect()).map_err(|e| {
        failure
            .take()
            .unwrap_or_else(|| EncodeError::Serialization(e.to_string()))
    })?;
    let body = collected.to_bytes();
    debug!(bytes = body.len(), "serialized multipart body");

    Ok((headers, body))
}
