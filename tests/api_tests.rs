use axum::{Json, Router, extract::Multipart, http::StatusCode, routing::post};
use formpart_client::{Config, FormClient};
use formpart_core::{FieldValue, Form, FormFile};
use serde::Deserialize;
use serde_json::{Value, json};
use std::io::Write;
use tokio::net::TcpListener;

#[derive(Debug, Deserialize)]
struct ReceivedPart {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    data: String,
}

#[derive(Debug, Deserialize)]
struct Received {
    parts: Vec<ReceivedPart>,
    content_type: String,
}

async fn echo(headers: axum::http::HeaderMap, mut multipart: Multipart) -> Result<Json<Value>, StatusCode> {
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|_| StatusCode::BAD_REQUEST)? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
        parts.push(json!({
            "name": name,
            "file_name": file_name,
            "content_type": content_type,
            "data": String::from_utf8_lossy(&data),
        }));
    }

    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    Ok(Json(json!({ "parts": parts, "content_type": content_type })))
}

async fn reject() -> StatusCode {
    StatusCode::UNPROCESSABLE_ENTITY
}

// Helper to spawn a server on a random port
async fn spawn_server() -> String {
    let app = Router::new()
        .route("/upload", post(echo).put(echo))
        .route("/reject", post(reject));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_server_receives_all_parts() {
    let base_url = spawn_server().await;
    let client = FormClient::new(Config::new(base_url)).unwrap();

    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(b"from disk").unwrap();

    let form = Form::new()
        .text("name", "Alice")
        .field("age", 30i64)
        .field("meta", FieldValue::json(&json!({"role": "admin"})).unwrap())
        .file("doc", FormFile::from_reader("a.txt", 5, &b"hello"[..]))
        .files(
            "photos",
            vec![
                FormFile::from_bytes("1.jpg", "jpeg-1").with_content_type("image/jpeg"),
                FormFile::from_path(tmp.path()).unwrap().with_content_type("text/plain"),
            ],
        );

    let received: Received = client
        .post_form("/upload", form)
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(received.content_type.starts_with("multipart/form-data; boundary="));

    let summary: Vec<(&str, Option<&str>, Option<&str>, &str)> = received
        .parts
        .iter()
        .map(|p| {
            (
                p.name.as_str(),
                p.file_name.as_deref(),
                p.content_type.as_deref(),
                p.data.as_str(),
            )
        })
        .collect();

    let tmp_name = tmp.path().file_name().unwrap().to_str().unwrap();
    assert_eq!(
        summary,
        vec![
            ("name", None, Some("text/plain"), "Alice"),
            ("age", None, Some("text/plain"), "30"),
            ("meta", None, Some("text/plain"), r#"{"role":"admin"}"#),
            ("doc", Some("a.txt"), Some("application/octet-stream"), "hello"),
            ("photos", Some("1.jpg"), Some("image/jpeg"), "jpeg-1"),
            ("photos", Some(tmp_name), Some("text/plain"), "from disk"),
        ]
    );
}

#[tokio::test]
async fn test_put_form() {
    let base_url = spawn_server().await;
    let client = FormClient::new(Config::new(base_url)).unwrap();

    let received: Received = client
        .put_form("/upload", Form::new().text("k", "v"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(received.parts.len(), 1);
    assert_eq!(received.parts[0].data, "v");
}

#[tokio::test]
async fn test_rejected_request_reports_status() {
    let base_url = spawn_server().await;
    let client = FormClient::new(Config::new(base_url)).unwrap();

    let err = client
        .post_form("/reject", Form::new().text("a", "b"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(422));
}

#[tokio::test]
async fn test_encoded_template_can_be_sent_later() {
    let base_url = spawn_server().await;
    let client = FormClient::new(Config::new(base_url)).unwrap();

    let template = client
        .encode(reqwest::Method::POST, "/upload", Form::new().text("later", "yes"))
        .await
        .unwrap();
    let response = client.send(template).await.unwrap();

    let received: Received = response.json().await.unwrap();
    assert_eq!(received.parts[0].name, "later");
}
