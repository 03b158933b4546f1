//! Form client implementation

use crate::{ClientError, Config, Result};
use formpart_core::{Encoder, Form, FormPartEncoder, RequestBody, RequestTemplate};
use reqwest::{Client, Method, Response, header};
use std::sync::Arc;
use tracing::{debug, instrument};

/// HTTP client that sends multipart forms
pub struct FormClient {
    config: Config,
    http: Client,
    encoder: Arc<dyn Encoder>,
}

impl FormClient {
    /// Create a new client with the default form encoder
    pub fn new(config: Config) -> Result<Self> {
        Self::with_encoder(config, Arc::new(FormPartEncoder::new()))
    }

    /// Create a client with a custom encoder
    pub fn with_encoder(config: Config, encoder: Arc<dyn Encoder>) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            config
                .user_agent
                .parse()
                .map_err(|_| ClientError::Config(format!("invalid user agent: {}", config.user_agent)))?,
        );

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(ClientError::Http)?;

        Ok(Self { config, http, encoder })
    }

    /// Create with endpoint URL
    pub fn with_endpoint(endpoint: &str) -> Result<Self> {
        Self::new(Config::new(endpoint))
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// POST a form
    #[instrument(skip(self, form), fields(fields = form.len()))]
    pub async fn post_form(&self, path: &str, form: Form) -> Result<Response> {
        let template = self.encode(Method::POST, path, form).await?;
        self.send(template).await
    }

    /// PUT a form
    #[instrument(skip(self, form), fields(fields = form.len()))]
    pub async fn put_form(&self, path: &str, form: Form) -> Result<Response> {
        let template = self.encode(Method::PUT, path, form).await?;
        self.send(template).await
    }

    /// Encode a form into a request template without sending it
    ///
    /// Encoding reads file sources, so it runs on the blocking thread pool.
    pub async fn encode(&self, method: Method, path: &str, form: Form) -> Result<RequestTemplate> {
        let encoder = Arc::clone(&self.encoder);
        let mut template = RequestTemplate::new(method, path);

        let template = tokio::task::spawn_blocking(move || {
            encoder
                .encode(RequestBody::Form(Some(form)), &mut template)
                .map(|_| template)
        })
        .await??;

        Ok(template)
    }

    /// Send an encoded template
    ///
    /// Template headers are applied after the client's own headers, so the
    /// encoder's `Content-Type` is what goes on the wire.
    pub async fn send(&self, template: RequestTemplate) -> Result<Response> {
        let (method, path, headers, body) = template.into_parts();
        let url = self.config.url(&path);

        let mut req = self.http.request(method.clone(), &url);

        // Add authorization
        if let Some(token) = &self.config.access_token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        req = req.headers(headers);

        if let Some(data) = body {
            debug!(bytes = data.len(), "attaching encoded body");
            req = req.body(data);
        }

        debug!("Sending {} request to {}", method, url);
        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}
