use crate::ApiError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Verb used to write a whole workflow back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMethod {
    #[default]
    Patch,
    Put,
}

impl From<UpdateMethod> for Method {
    fn from(method: UpdateMethod) -> Self {
        match method {
            UpdateMethod::Patch => Method::Patch,
            UpdateMethod::Put => Method::Put,
        }
    }
}

/// One call to the workflow API, relative to the connection's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path segments below the base URL, e.g. `["workflows", "42"]`.
    pub path: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Replace the default header of the same name (case-insensitive).
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    /// `endpoint` is split on `/`; empty segments are dropped.
    pub fn new(method: Method, endpoint: &str) -> Self {
        Self {
            method,
            path: endpoint
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get(endpoint: &str) -> Self {
        Self::new(Method::Get, endpoint)
    }

    pub fn delete(endpoint: &str) -> Self {
        Self::new(Method::Delete, endpoint)
    }

    pub fn post(endpoint: &str, body: Value) -> Self {
        Self::new(Method::Post, endpoint).with_body(body)
    }

    pub fn patch(endpoint: &str, body: Value) -> Self {
        Self::new(Method::Patch, endpoint).with_body(body)
    }

    /// Appends one segment as given. A `/` inside it is encoded, never
    /// treated as a separator.
    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.path.push(segment.into());
        self
    }

    pub fn with_query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.iter().map(String::as_str)
    }

    /// Path joined with `/`, for logs and assertions.
    pub fn endpoint(&self) -> String {
        self.path.join("/")
    }
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    Ok(serde_json::from_value(value)?)
}

/// Entity echoed back by a mutation. The call already succeeded, so an
/// empty or partial body yields `None` instead of an error.
pub(crate) fn decode_optional<T: DeserializeOwned>(value: Value) -> Option<T> {
    if is_empty_response(&value) {
        return None;
    }
    match serde_json::from_value(value) {
        Ok(entity) => Some(entity),
        Err(e) => {
            debug!(error = %e, "Mutation response is not a full entity");
            None
        }
    }
}

pub fn is_empty_response(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
