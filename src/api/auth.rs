use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::client::{bearer_headers, connect_failed, UpstreamError};
use crate::models::User;

#[derive(Debug, Deserialize, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub mfa_required: bool,
}

// The auth service wraps payloads in a {success, data} envelope.
#[derive(Deserialize)]
struct AuthServiceResponse<T> {
    #[serde(rename = "success")]
    _success: bool,
    data: T,
}

fn auth_base_url() -> String {
    std::env::var("AUTH_API_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".to_string())
}

pub async fn login(email: &str, password: &str) -> Result<AuthTokens, UpstreamError> {
    let url = format!(
        "{}/api/v1/auth/login",
        auth_base_url().trim_end_matches('/')
    );

    let client = reqwest::Client::new();
    let resp = client
        .post(&url)
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .map_err(|e| connect_failed(&url, e))?;

    let status = StatusCode::from_u16(resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    if !status.is_success() {
        let body = resp.json().await.ok();
        return Err(UpstreamError::new(status, body));
    }

    let wrapper: AuthServiceResponse<AuthTokens> =
        resp.json().await.map_err(|e| connect_failed(&url, e))?;
    Ok(wrapper.data)
}

/// `me()` on the remote auth service; used when the local token decode is
/// not enough to establish the caller.
pub async fn me(token: &str) -> Result<User, UpstreamError> {
    let url = format!("{}/api/v1/auth/me", auth_base_url().trim_end_matches('/'));

    let client = reqwest::Client::new();
    let resp = client
        .get(&url)
        .headers(bearer_headers(Some(token)))
        .send()
        .await
        .map_err(|e| connect_failed(&url, e))?;

    let status = StatusCode::from_u16(resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    if !status.is_success() {
        let body = resp.json().await.ok();
        return Err(UpstreamError::new(status, body));
    }

    let wrapper: AuthServiceResponse<User> =
        resp.json().await.map_err(|e| connect_failed(&url, e))?;
    Ok(wrapper.data)
}
