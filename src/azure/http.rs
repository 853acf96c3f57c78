//! HTTP utilities for Azure Resource Manager REST calls

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

const USER_AGENT: &str = concat!("azurerm-pollers/", env!("CARGO_PKG_VERSION"));

/// Header ARM echoes back so a single request can be traced in support tickets
const CLIENT_REQUEST_ID_HEADER: &str = "x-ms-client-request-id";

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let char_count = body.chars().count();
    let truncated = if char_count > MAX_LOG_BODY_LENGTH {
        let head: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
        format!("{}... [truncated, {} bytes total]", head, body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Raw HTTP response, kept around for diagnostics and the not-found check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Deserialize the body, treating an empty body as "no model"
    pub fn json<T: DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
        if self.body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&self.body).map(Some)
    }
}

/// A typed response: the decoded model (if the body had one) plus the raw response
#[derive(Debug, Clone)]
pub struct Response<T> {
    pub model: Option<T>,
    pub http_response: RawResponse,
}

/// Every item of a paginated list, plus the response for the last page fetched
#[derive(Debug, Clone)]
pub struct ListResult<T> {
    pub items: Vec<T>,
    pub latest_http_response: Option<RawResponse>,
}

/// Errors returned by the ARM client
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service answered with a non-2xx status
    #[error("unexpected status {} with error: {code}: {message}", status_code(.response))]
    Status {
        code: String,
        message: String,
        response: RawResponse,
    },

    /// The request never produced an HTTP response (reset, refused, timed out)
    #[error("sending request: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("parsing response body: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        response: RawResponse,
    },

    #[error("building request url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("building HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ApiError {
    /// The HTTP response associated with this error, when one was received
    pub fn response(&self) -> Option<&RawResponse> {
        match self {
            Self::Status { response, .. } | Self::Decode { response, .. } => Some(response),
            Self::Transport(_) | Self::InvalidUrl(_) | Self::Client(_) => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.response().map(|r| r.status)
    }

    /// HTTP response present and status code 404
    pub fn was_not_found(&self) -> bool {
        was_not_found(self.response())
    }

    /// The connection dropped before any HTTP response arrived
    pub fn is_dropped_connection(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

fn status_code(response: &RawResponse) -> u16 {
    response.status.as_u16()
}

/// The "not found" predicate shared by every poller
pub fn was_not_found(response: Option<&RawResponse>) -> bool {
    response.is_some_and(|r| r.status == StatusCode::NOT_FOUND)
}

/// ARM error envelope: `{"error": {"code": "...", "message": "..."}}`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: Option<String>,
    message: Option<String>,
}

fn status_error(response: RawResponse) -> ApiError {
    let detail = serde_json::from_str::<ErrorEnvelope>(&response.body)
        .ok()
        .and_then(|e| e.error);

    let (code, message) = match detail {
        Some(d) => (
            d.code.unwrap_or_else(|| "Unknown".to_string()),
            d.message.unwrap_or_default(),
        ),
        None => (
            response
                .status
                .canonical_reason()
                .unwrap_or("Unknown")
                .to_string(),
            String::new(),
        ),
    };

    ApiError::Status {
        code,
        message,
        response,
    }
}

/// HTTP client wrapper for ARM API calls
#[derive(Clone)]
pub struct AzureHttpClient {
    client: Client,
}

impl AzureHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self { client })
    }

    /// Make a GET request to an ARM API
    ///
    /// Any non-2xx status becomes [`ApiError::Status`] carrying the raw response,
    /// so callers can still inspect a 404.
    pub async fn get(&self, url: &str, token: &str) -> Result<RawResponse, ApiError> {
        let request_id = Uuid::new_v4();
        tracing::debug!("GET {} ({})", url, request_id);

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .header(CLIENT_REQUEST_ID_HEADER, request_id.to_string())
            .send()
            .await
            .map_err(ApiError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(ApiError::Transport)?;
        let raw = RawResponse::new(status, body);

        if !status.is_success() {
            if status == StatusCode::NOT_FOUND {
                tracing::debug!("GET {} returned 404", url);
            } else {
                tracing::error!("API error: {} - {}", status, sanitize_for_log(&raw.body));
            }
            return Err(status_error(raw));
        }

        Ok(raw)
    }
}
