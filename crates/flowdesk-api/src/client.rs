use crate::{ApiError, ApiRequest, Gateway};
use flowdesk_core::Connection;
use reqwest::Url;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// reqwest-backed [`Gateway`] bound to one [`Connection`].
pub struct ApiClient {
    connection: Connection,
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Fails only when no base URL can be derived; the API key is not
    /// checked until the first call.
    pub fn new(connection: Connection) -> Result<Self, ApiError> {
        let base_url = connection.base_url()?;
        Url::parse(&base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if !connection.has_api_key() {
            debug!("No API key configured; requests will be sent unauthenticated");
        }
        Ok(Self {
            connection,
            base_url,
            http: reqwest::Client::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL + "/" + endpoint, each endpoint segment percent-encoded.
    pub fn endpoint_url(&self, request: &ApiRequest) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidUrl(self.base_url.clone()))?;
            segments.pop_if_empty().extend(request.segments());
        }
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }

    /// Default headers with caller overrides applied.
    fn headers(&self, request: &ApiRequest) -> Vec<(String, String)> {
        let mut headers = vec![("accept".to_string(), "application/json".to_string())];
        if let Some(auth) = self.connection.auth_header() {
            headers.push(auth);
        }
        for (name, value) in &request.headers {
            headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
            headers.push((name.clone(), value.clone()));
        }
        headers
    }
}

impl Gateway for ApiClient {
    async fn request(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let url = self.endpoint_url(&request)?;
        debug!(method = %request.method, %url, has_body = request.body.is_some(), "API request");

        let mut builder = self.http.request(request.method.into(), url);
        for (name, value) in self.headers(&request) {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = error_message(&text, status);
            warn!(status = status.as_u16(), %message, "API request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        debug!(status = status.as_u16(), bytes = text.len(), "API response");

        if text.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Prefers the server's `message` field, then the raw body, then the
/// status reason.
fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        if let Some(Value::String(message)) = map.get("message") {
            return message.clone();
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("Unknown error")
        .to_string()
}
