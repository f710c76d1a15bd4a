use axum::http::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Failure reported by the remote entity store: upstream HTTP status plus
/// whatever JSON body came back, if any.
#[derive(Debug, Clone)]
pub struct UpstreamError {
    pub status: StatusCode,
    pub body: Option<Value>,
}

impl UpstreamError {
    pub fn new(status: StatusCode, body: Option<Value>) -> Self {
        Self { status, body }
    }
}

impl std::fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.body {
            Some(body) => write!(f, "upstream {}: {}", self.status, body),
            None => write!(f, "upstream {}", self.status),
        }
    }
}

impl std::error::Error for UpstreamError {}

pub(crate) fn connect_failed(url: &str, err: impl ToString) -> UpstreamError {
    UpstreamError::new(
        StatusCode::BAD_GATEWAY,
        Some(serde_json::json!({
            "error": "connect_failed",
            "detail": err.to_string(),
            "url": url
        })),
    )
}

pub(crate) fn bearer_headers(token: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(token) = token {
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
            headers.insert(AUTHORIZATION, value);
        }
    }
    headers
}

// Multipart requests set their own content type with the part boundary.
pub(crate) fn bearer_headers_no_json(token: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(token) = token {
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
            headers.insert(AUTHORIZATION, value);
        }
    }
    headers
}

/// Client for the remote entity store. All persistence is delegated there;
/// this side only shapes requests and decodes entity JSON.
#[derive(Clone)]
pub struct EntityApi {
    http: reqwest::Client,
    base_url: String,
    app_id: String,
}

impl EntityApi {
    pub fn new(base_url: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            app_id: app_id.into(),
        }
    }

    pub fn from_env() -> Self {
        let base_url =
            std::env::var("ENTITY_API_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());
        let app_id = std::env::var("ENTITY_APP_ID").unwrap_or_else(|_| "eventdesk-dev".to_string());
        Self::new(base_url, app_id)
    }

    fn entity_url(&self, entity: &str) -> String {
        format!(
            "{}/api/v1/apps/{}/entities/{}",
            self.base_url.trim_end_matches('/'),
            self.app_id,
            entity
        )
    }

    pub(crate) fn files_url(&self) -> String {
        format!(
            "{}/api/v1/apps/{}/files",
            self.base_url.trim_end_matches('/'),
            self.app_id
        )
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// `GET .../entities/{Entity}?sort=...` — full listing.
    pub async fn list<T: DeserializeOwned>(
        &self,
        entity: &str,
        token: Option<&str>,
        sort: Option<&str>,
    ) -> Result<Vec<T>, UpstreamError> {
        let mut url = self.entity_url(entity);
        if let Some(sort) = sort {
            url.push_str(&format!("?sort={}", urlencoding::encode(sort)));
        }
        self.get_rows(&url, token).await
    }

    /// `GET .../entities/{Entity}?field=value&...` — filtered listing.
    pub async fn filter<T: DeserializeOwned>(
        &self,
        entity: &str,
        token: Option<&str>,
        filters: &[(&str, &str)],
    ) -> Result<Vec<T>, UpstreamError> {
        let mut url = self.entity_url(entity);
        for (i, (field, value)) in filters.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            url.push_str(&format!(
                "{}{}={}",
                sep,
                field,
                urlencoding::encode(value)
            ));
        }
        self.get_rows(&url, token).await
    }

    async fn get_rows<T: DeserializeOwned>(
        &self,
        url: &str,
        token: Option<&str>,
    ) -> Result<Vec<T>, UpstreamError> {
        let resp = self
            .http
            .get(url)
            .headers(bearer_headers(token))
            .send()
            .await
            .map_err(|e| connect_failed(url, e))?;

        let status = StatusCode::from_u16(resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        if !status.is_success() {
            let body = resp.json().await.ok();
            return Err(UpstreamError::new(status, body));
        }
        resp.json().await.map_err(|e| connect_failed(url, e))
    }

    pub async fn create<T: DeserializeOwned>(
        &self,
        entity: &str,
        token: Option<&str>,
        fields: &Value,
    ) -> Result<T, UpstreamError> {
        let url = self.entity_url(entity);
        let resp = self
            .http
            .post(&url)
            .headers(bearer_headers(token))
            .json(fields)
            .send()
            .await
            .map_err(|e| connect_failed(&url, e))?;

        let status = StatusCode::from_u16(resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        if !status.is_success() {
            let body = resp.json().await.ok();
            return Err(UpstreamError::new(status, body));
        }
        resp.json().await.map_err(|e| connect_failed(&url, e))
    }

    pub async fn update<T: DeserializeOwned>(
        &self,
        entity: &str,
        token: Option<&str>,
        id: &str,
        patch: &Value,
    ) -> Result<T, UpstreamError> {
        let url = format!("{}/{}", self.entity_url(entity), id);
        let resp = self
            .http
            .patch(&url)
            .headers(bearer_headers(token))
            .json(patch)
            .send()
            .await
            .map_err(|e| connect_failed(&url, e))?;

        let status = StatusCode::from_u16(resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        if !status.is_success() {
            let body = resp.json().await.ok();
            return Err(UpstreamError::new(status, body));
        }
        resp.json().await.map_err(|e| connect_failed(&url, e))
    }

    pub async fn delete(
        &self,
        entity: &str,
        token: Option<&str>,
        id: &str,
    ) -> Result<(), UpstreamError> {
        let url = format!("{}/{}", self.entity_url(entity), id);
        let resp = self
            .http
            .delete(&url)
            .headers(bearer_headers(token))
            .send()
            .await
            .map_err(|e| connect_failed(&url, e))?;

        let status = StatusCode::from_u16(resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        if !status.is_success() {
            let body = resp.json().await.ok();
            return Err(UpstreamError::new(status, body));
        }
        Ok(())
    }
}
