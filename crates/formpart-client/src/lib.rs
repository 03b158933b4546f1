//! # formpart client
//!
//! Sends forms encoded by `formpart-core` over HTTP.
//!
//! ## Example
//!
//! ```rust,ignore
//! use formpart_client::{Config, FormClient};
//! use formpart_core::{Form, FormFile};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = FormClient::new(Config::new("http://localhost:8080"))?;
//!
//!     let form = Form::new()
//!         .text("name", "Alice")
//!         .file("doc", FormFile::from_path("report.pdf")?.with_content_type("application/pdf"));
//!
//!     let response = client.post_form("/upload", form).await?;
//!     println!("{}", response.status());
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;

pub use client::FormClient;
pub use config::Config;
pub use error::{ClientError, Result};
