use std::str::FromStr;

use axum::async_trait;
use axum::extract::{FromRequest, Request};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use quill_engine::EngineError;
use quill_types::TypeError;

use crate::error::{ApiError, ApiResult};

/// A successful response: `{success: true, message, <key>: data, ...}`.
#[derive(Debug)]
pub struct Reply {
    status: StatusCode,
    body: Map<String, Value>,
    cookie: Option<String>,
}

impl Reply {
    pub fn ok(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::OK, message)
    }

    pub fn created(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::CREATED, message)
    }

    fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        let mut body = Map::new();
        body.insert("success".into(), Value::Bool(true));
        body.insert("message".into(), Value::String(message.into()));
        Self {
            status,
            body,
            cookie: None,
        }
    }

    /// Attach `data` under `key`.
    pub fn with(mut self, key: &str, data: impl Serialize) -> ApiResult<Self> {
        let value = serde_json::to_value(data)
            .map_err(|e| EngineError::Internal(format!("response encoding: {e}")))?;
        self.body.insert(key.to_string(), value);
        Ok(self)
    }

    pub fn set_cookie(mut self, cookie: String) -> Self {
        self.cookie = Some(cookie);
        self
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(Value::Object(self.body))).into_response();
        if let Some(cookie) = self.cookie.and_then(|c| HeaderValue::from_str(&c).ok()) {
            response.headers_mut().insert(SET_COOKIE, cookie);
        }
        response
    }
}

/// JSON request body whose decode failures render as the error envelope.
#[derive(Debug)]
pub struct Payload<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Malformed(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Parse a path segment into a typed id.
pub fn parse_id<T>(raw: &str) -> ApiResult<T>
where
    T: FromStr<Err = TypeError>,
{
    Ok(raw.parse::<T>()?)
}
