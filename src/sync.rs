use crate::models::{UpdateRequest, UpdateResponse};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::debug;

pub const STATUS_PATH: &str = "/day/status";

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("status request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("status response could not be decoded: {0}")]
    Decode(String),

    #[error("invalid server url: {0}")]
    InvalidUrl(String),
}

/// Persists a day's status on the calendar server.
#[async_trait]
pub trait StatusApi: Send + Sync {
    async fn update_status(&self, request: &UpdateRequest) -> Result<UpdateResponse, SyncError>;
}

pub struct HttpStatusApi {
    client: Client,
    endpoint: Url,
}

impl HttpStatusApi {
    pub fn new(base_url: &str) -> Result<Self, SyncError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self, SyncError> {
        let endpoint = Url::parse(base_url)
            .and_then(|base| base.join(STATUS_PATH))
            .map_err(|err| SyncError::InvalidUrl(format!("{base_url}: {err}")))?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl StatusApi for HttpStatusApi {
    async fn update_status(&self, request: &UpdateRequest) -> Result<UpdateResponse, SyncError> {
        // The HTTP status is not inspected; rejections arrive as JSON bodies.
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;
        debug!(status = %response.status(), "status update answered");

        let body = response.bytes().await?;
        let value: Value =
            serde_json::from_slice(&body).map_err(|err| SyncError::Decode(err.to_string()))?;
        interpret_response(&value)
    }
}

/// Reads an update response leniently: `ok` counts only when it is `true`,
/// and `error` only when it is a non-empty string. Any JSON value other than
/// `null` is a response; arrays and scalars carry no fields and read as a
/// rejection without a message.
pub fn interpret_response(value: &Value) -> Result<UpdateResponse, SyncError> {
    match value {
        Value::Object(fields) => Ok(UpdateResponse {
            ok: fields.get("ok").and_then(Value::as_bool).unwrap_or(false),
            error: fields
                .get("error")
                .and_then(Value::as_str)
                .filter(|message| !message.is_empty())
                .map(str::to_string),
        }),
        Value::Null => Err(SyncError::Decode("response body was null".to_string())),
        Value::Array(_) | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            Ok(UpdateResponse { ok: false, error: None })
        }
    }
}
