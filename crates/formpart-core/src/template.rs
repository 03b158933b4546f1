//! Outgoing request template

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};

/// Charset used for every encoded body
pub const UTF_8: &str = "UTF-8";

/// Mutable model of an outgoing request that encoders write into
#[derive(Clone, Debug)]
pub struct RequestTemplate {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Option<Bytes>,
    charset: Option<&'static str>,
}

impl RequestTemplate {
    /// Create a template for `method` on `path`
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
            charset: None,
        }
    }

    /// Create a POST template
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Get the method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Get the path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Set a header, replacing any values it already had
    pub fn header(&mut self, name: HeaderName, values: impl IntoIterator<Item = HeaderValue>) {
        self.headers.remove(&name);
        for value in values {
            self.headers.append(name.clone(), value);
        }
    }

    /// Get the headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Set the body and its charset
    pub fn body(&mut self, body: impl Into<Bytes>, charset: &'static str) {
        self.body = Some(body.into());
        self.charset = Some(charset);
    }

    /// Get the body
    pub fn body_bytes(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Get the body charset
    pub fn charset(&self) -> Option<&'static str> {
        self.charset
    }

    /// Split into method, path, headers and body
    pub fn into_parts(self) -> (Method, String, HeaderMap, Option<Bytes>) {
        (self.method, self.path, self.headers, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{ACCEPT, CONTENT_TYPE};

    #[test]
    fn test_header_replaces_existing_values() {
        let mut template = RequestTemplate::post("/upload");
        template.header(CONTENT_TYPE, [HeaderValue::from_static("application/json")]);
        template.header(CONTENT_TYPE, [HeaderValue::from_static("multipart/form-data; boundary=b")]);

        let values: Vec<_> = template.headers().get_all(CONTENT_TYPE).iter().collect();
        assert_eq!(values, vec!["multipart/form-data; boundary=b"]);
    }

    #[test]
    fn test_header_keeps_multiple_values() {
        let mut template = RequestTemplate::post("/");
        template.header(
            ACCEPT,
            [HeaderValue::from_static("text/plain"), HeaderValue::from_static("application/json")],
        );
        assert_eq!(template.headers().get_all(ACCEPT).iter().count(), 2);
    }

    #[test]
    fn test_body_and_parts() {
        let mut template = RequestTemplate::new(Method::PUT, "/files");
        assert!(template.body_bytes().is_none());

        template.body(&b"data"[..], UTF_8);
        assert_eq!(template.charset(), Some("UTF-8"));
        assert_eq!(*template.method(), Method::PUT);
        assert_eq!(template.path(), "/files");

        let (method, path, _, body) = template.into_parts();
        assert_eq!(method, Method::PUT);
        assert_eq!(path, "/files");
        assert_eq!(body.unwrap(), Bytes::from_static(b"data"));
    }
}
