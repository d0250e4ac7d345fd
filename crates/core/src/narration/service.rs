//! Chat-completions client for the external narrative service.
//!
//! Requires the `service` feature for the HTTP client. Without it every
//! call reports [`ServiceError::Unavailable`] and the caller falls back.

use std::time::Duration;

#[cfg(feature = "service")]
use serde::{Deserialize, Serialize};

use super::request::NarrationRequest;
use super::NarrationConfig;

/// Environment variable holding the service credential.
pub const CREDENTIAL_ENV: &str = "OPENAI_API_KEY";

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// Default multi-modal model.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Response-size ceiling, in tokens.
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Sampling temperature: higher is more varied prose, 0 is near-deterministic.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

pub const DEFAULT_SERVICE_TIMEOUT: Duration = Duration::from_secs(120);

/// Initial backoff delay in milliseconds (doubles each retry).
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Tunables for the service request.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    /// Base URL; `/chat/completions` is appended.
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Bound on the whole request, connect to last byte.
    pub timeout: Duration,
    /// Extra attempts after a retryable failure. 0 sends exactly one request.
    pub max_retries: u32,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout: DEFAULT_SERVICE_TIMEOUT,
            max_retries: 0,
        }
    }
}

impl ServiceSettings {
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }
}

/// Why the service did not produce a narrative.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("narrative service client is not available")]
    Unavailable,
    #[error("{} is not set", CREDENTIAL_ENV)]
    MissingCredential,
    #[error("request failed: {0}")]
    Transport(String),
    #[error("service returned HTTP {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("response contained no narrative text")]
    EmptyResponse,
}

impl ServiceError {
    /// Rate limits, transient server errors and network failures.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Status(code) => matches!(code, 429 | 500 | 502 | 503),
            ServiceError::Transport(_) => true,
            _ => false,
        }
    }
}

#[cfg(feature = "service")]
#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a NarrationRequest,
    max_tokens: u32,
    temperature: f32,
}

#[cfg(feature = "service")]
#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[cfg(feature = "service")]
#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[cfg(feature = "service")]
#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// The credential to send, once the client is known to be usable.
///
/// Checks, in order, that the client is available and that a non-blank
/// credential is configured.
pub fn service_credential(config: &NarrationConfig) -> Result<&str, ServiceError> {
    if !config.service_available {
        return Err(ServiceError::Unavailable);
    }
    config
        .credential
        .as_deref()
        .filter(|key| !key.trim().is_empty())
        .ok_or(ServiceError::MissingCredential)
}

/// Ask the service for a narrative. Fails before any network traffic
/// when [`service_credential`] does.
pub fn request_narrative(
    config: &NarrationConfig,
    request: &NarrationRequest,
) -> Result<String, ServiceError> {
    let credential = service_credential(config)?;
    send_request(&config.service, credential, request)
}

pub(crate) fn send_request(
    settings: &ServiceSettings,
    credential: &str,
    request: &NarrationRequest,
) -> Result<String, ServiceError> {
    tracing::info!(
        model = %settings.model,
        images = request.image_count(),
        "requesting narrative from service"
    );
    with_retry(
        || call_once(settings, credential, request),
        settings.max_retries,
        INITIAL_BACKOFF_MS,
    )
}

#[cfg(feature = "service")]
fn call_once(
    settings: &ServiceSettings,
    credential: &str,
    request: &NarrationRequest,
) -> Result<String, ServiceError> {
    let body = CompletionRequest {
        model: &settings.model,
        messages: request,
        max_tokens: settings.max_tokens,
        temperature: settings.temperature,
    };

    let config = ureq::Agent::config_builder()
        .timeout_global(Some(settings.timeout))
        .build();
    let agent = ureq::Agent::new_with_config(config);

    let url = settings.completions_url();
    let response = agent
        .post(url.as_str())
        .header("authorization", format!("Bearer {}", credential))
        .header("content-type", "application/json")
        .send_json(&body)
        .map_err(|e| match e {
            ureq::Error::StatusCode(code) => ServiceError::Status(code),
            other => ServiceError::Transport(other.to_string()),
        })?;

    let parsed: CompletionResponse = response
        .into_body()
        .read_json()
        .map_err(|e| ServiceError::MalformedResponse(e.to_string()))?;

    extract_narrative(parsed)
}

#[cfg(not(feature = "service"))]
fn call_once(
    _settings: &ServiceSettings,
    _credential: &str,
    _request: &NarrationRequest,
) -> Result<String, ServiceError> {
    Err(ServiceError::Unavailable)
}

#[cfg(feature = "service")]
fn extract_narrative(response: CompletionResponse) -> Result<String, ServiceError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(ServiceError::EmptyResponse)
}

/// Retry a fallible call with exponential backoff.
///
/// Only retryable errors are retried; anything else returns immediately.
fn with_retry<T, F: Fn() -> Result<T, ServiceError>>(
    f: F,
    max_retries: u32,
    initial_backoff_ms: u64,
) -> Result<T, ServiceError> {
    let mut backoff_ms = initial_backoff_ms;
    let mut attempt = 0;
    loop {
        match f() {
            Ok(val) => return Ok(val),
            Err(e) if attempt < max_retries && e.is_retryable() => {
                tracing::warn!(
                    attempt = attempt + 1,
                    of = max_retries + 1,
                    error = %e,
                    backoff_ms,
                    "retryable service error"
                );
                std::thread::sleep(Duration::from_millis(backoff_ms));
                backoff_ms *= 2;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
