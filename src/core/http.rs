use std::time::Duration;

use reqwest::{
    header::USER_AGENT,
    Client,
};
use serde_json::Value;

use crate::core::FiszkiError;

pub const CLIENT_USER_AGENT: &str = "fiszki/0.1 (+reqwest)";

pub fn http_client() -> Result<Client, FiszkiError> {
    Client::builder()
        .timeout(Duration::from_secs(120))
        .default_headers({
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert(USER_AGENT, reqwest::header::HeaderValue::from_static(CLIENT_USER_AGENT));
            headers
        })
        .build()
        .map_err(FiszkiError::from)
}

/// Pulls a human-readable message out of an error body.
///
/// Understands `{"error": {"message": ..}}`, `{"error": ".."}` and `{"message": ".."}`.
pub fn error_message_from_body(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    let message = match value.get("error") {
        Some(Value::Object(error)) => error.get("message").and_then(Value::as_str),
        Some(Value::String(error)) => Some(error.as_str()),
        _ => None,
    }
    .or_else(|| value.get("message").and_then(Value::as_str))?;

    let message = message.trim();
    if message.is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}
