use axum::http::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::api::client::{bearer_headers_no_json, connect_failed, EntityApi, UpstreamError};

#[derive(Deserialize)]
struct UploadResponse {
    file_url: String,
}

/// Upload a file to the remote store; returns the public `file_url`.
pub async fn upload(
    api: &EntityApi,
    token: Option<&str>,
    filename: &str,
    content_type: &str,
    bytes: Vec<u8>,
) -> Result<String, UpstreamError> {
    let url = api.files_url();

    let part = Part::bytes(bytes)
        .file_name(filename.to_string())
        .mime_str(content_type)
        .map_err(|e| UpstreamError::new(StatusCode::BAD_REQUEST, Some(serde_json::json!({
            "error": "invalid_content_type",
            "detail": e.to_string(),
        }))))?;
    let form = Form::new().part("file", part);

    let resp = api
        .http()
        .post(&url)
        .headers(bearer_headers_no_json(token))
        .multipart(form)
        .send()
        .await
        .map_err(|e| connect_failed(&url, e))?;

    let status = StatusCode::from_u16(resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    if !status.is_success() {
        let body = resp.json().await.ok();
        return Err(UpstreamError::new(status, body));
    }

    let parsed: UploadResponse = resp.json().await.map_err(|e| connect_failed(&url, e))?;
    Ok(parsed.file_url)
}
