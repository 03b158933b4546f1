//! Form upload example
//!
//! This example demonstrates:
//! - Building a form with text fields, a file and a file list
//! - Sending it with `FormClient`
//! - Reading it back on an axum server with the `Multipart` extractor
//!
//! Run with: cargo run --example form_upload

use axum::{Json, Router, extract::Multipart, routing::post};
use formpart_client::{Config, FormClient};
use formpart_core::{FieldValue, Form, FormFile};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn echo(mut multipart: Multipart) -> Json<Value> {
    let mut parts = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let size = field.bytes().await.map(|b| b.len()).unwrap_or(0);
        parts.push(json!({
            "name": name,
            "file_name": file_name,
            "content_type": content_type,
            "size": size,
        }));
    }
    Json(json!({ "parts": parts }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "formpart_core=debug,formpart_client=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Local echo server standing in for a real upload endpoint
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new().route("/upload", post(echo));
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("echo server stopped: {}", e);
        }
    });

    let mut config = Config::from_env()?;
    config.endpoint = format!("http://{}", addr);
    let client = FormClient::new(config)?;

    let form = Form::new()
        .text("title", "Quarterly report")
        .field("pages", 12i64)
        .field("meta", FieldValue::json(&json!({"tags": ["finance", "q3"]}))?)
        .file(
            "cover",
            FormFile::from_bytes("cover.png", &b"\x89PNG\r\n\x1a\n"[..]).with_content_type("image/png"),
        )
        .files(
            "attachments",
            vec![
                FormFile::from_bytes("notes.txt", "first draft"),
                FormFile::from_bytes("data.csv", "a,b\n1,2\n"),
            ],
        );

    println!("📤 Uploading form to {}", client.config().url("/upload"));
    let response = client.post_form("/upload", form).await?;
    let echoed: Value = response.json().await?;

    println!("📥 Server saw:");
    println!("{}", serde_json::to_string_pretty(&echoed)?);

    Ok(())
}
