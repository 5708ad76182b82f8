use async_trait::async_trait;
use reqwest::{
    Client,
    StatusCode,
};
use tracing::{
    debug,
    error,
};

use super::types::{
    ChatCompletionRequest,
    ChatCompletionResponse,
};
use crate::core::{
    http::{
        error_message_from_body,
        http_client,
    },
    LlmError,
};

pub const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// One chat-completion round trip. Implementations never retry.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, LlmError>;
}

pub struct OpenRouterClient {
    http: Client,
    api_url: String,
    api_key: String,
}

impl OpenRouterClient {
    pub fn new(api_key: &str) -> Result<Self, LlmError> {
        Self::with_api_url(api_key, OPENROUTER_API_URL)
    }

    pub fn with_api_url(api_key: &str, api_url: &str) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::InvalidRequest("API key is required".to_string()));
        }

        let http = http_client().map_err(|e| LlmError::Transport(e.to_string()))?;
        Ok(Self { http, api_url: api_url.to_string(), api_key: api_key.to_string() })
    }

    fn validate(request: &ChatCompletionRequest) -> Result<(), LlmError> {
        if request.model.trim().is_empty() {
            return Err(LlmError::InvalidRequest("model must not be empty".to_string()));
        }
        if request.messages.is_empty() {
            return Err(LlmError::InvalidRequest("at least one message is required".to_string()));
        }
        Ok(())
    }

    fn api_error(status: StatusCode, body: &str) -> LlmError {
        let message = error_message_from_body(body).unwrap_or_else(|| {
            status.canonical_reason().unwrap_or("Unknown error").to_string()
        });
        error!(status = status.as_u16(), %message, "Chat completion API error");
        LlmError::from_status(status.as_u16(), message)
    }
}

#[async_trait]
impl ChatCompletion for OpenRouterClient {
    async fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, LlmError> {
        Self::validate(request)?;

        debug!(model = %request.model, messages = request.messages.len(), "Sending chat completion");

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Self::api_error(status, &body));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::MalformedResponse(format!("Failed to decode chat completion: {e}"))
        })?;

        // Syntactic check only; schema conformance is the caller's concern.
        if request.response_format.is_some() {
            if let Some(content) = parsed.first_content().filter(|c| !c.trim().is_empty()) {
                serde_json::from_str::<serde_json::Value>(content).map_err(|e| {
                    error!(error = %e, "Failed to parse JSON response from model");
                    LlmError::MalformedResponse(format!(
                        "Failed to parse JSON response from model: {e}"
                    ))
                })?;
            }
        }

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use mockito::{
        Matcher,
        Server,
    };
    use serde_json::json;

    use super::*;
    use crate::llm::types::{
        Message,
        ModelParams,
        ResponseFormat,
    };

    fn request(structured: bool) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "test/model".to_string(),
            messages: vec![Message::system("system"), Message::user("user")],
            response_format: structured
                .then(|| ResponseFormat::json_schema("FlashcardsResponse", true, json!({}))),
            params: ModelParams { temperature: Some(0.7), ..ModelParams::default() },
        }
    }

    fn completion_body(content: &str) -> String {
        json!({
            "id": "gen-1",
            "model": "test/model",
            "choices": [{"index": 0, "finish_reason": "stop", "message": {"role": "assistant", "content": content}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_successful_completion() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .match_header("authorization", "Bearer secret")
            .match_body(Matcher::PartialJson(json!({
                "model": "test/model",
                "temperature": 0.7,
                "response_format": {"type": "json_schema"}
            })))
            .with_status(200)
            .with_body(completion_body(r#"{"flashcards":[]}"#))
            .expect(1)
            .create_async()
            .await;

        let client =
            OpenRouterClient::with_api_url("secret", &format!("{}/chat", server.url())).unwrap();
        let response = client.complete(&request(true)).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.first_content(), Some(r#"{"flashcards":[]}"#));
        assert_eq!(response.usage.map(|u| u.total_tokens), Some(15));
    }

    #[tokio::test]
    async fn test_status_taxonomy_with_body_message() {
        let cases = [
            (401, "AuthenticationFailed"),
            (402, "PaymentRequired"),
            (403, "Forbidden"),
            (429, "RateLimited"),
            (502, "UpstreamServerError"),
            (404, "UpstreamError"),
        ];

        for (status, expected) in cases {
            let mut server = Server::new_async().await;
            let _mock = server
                .mock("POST", "/chat")
                .with_status(status)
                .with_body(r#"{"error":{"message":"upstream says no"}}"#)
                .create_async()
                .await;

            let client =
                OpenRouterClient::with_api_url("key", &format!("{}/chat", server.url())).unwrap();
            let err = client.complete(&request(false)).await.unwrap_err();

            assert_eq!(err.status(), Some(status as u16));
            assert!(format!("{err:?}").starts_with(expected), "{status}: {err:?}");
            assert!(err.to_string().contains("upstream says no"));
        }
    }

    #[tokio::test]
    async fn test_error_without_body_uses_reason() {
        let mut server = Server::new_async().await;
        let _mock = server.mock("POST", "/chat").with_status(503).create_async().await;

        let client =
            OpenRouterClient::with_api_url("key", &format!("{}/chat", server.url())).unwrap();
        let err = client.complete(&request(false)).await.unwrap_err();

        match err {
            LlmError::UpstreamServerError { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "Service Unavailable");
            }
            other => panic!("Expected UpstreamServerError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_structured_content_must_be_json() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat")
            .with_status(200)
            .with_body(completion_body("definitely not json"))
            .expect(2)
            .create_async()
            .await;

        let client =
            OpenRouterClient::with_api_url("key", &format!("{}/chat", server.url())).unwrap();

        let err = client.complete(&request(true)).await.unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)));

        // Plain requests pass the content through untouched.
        let response = client.complete(&request(false)).await.unwrap();
        assert_eq!(response.first_content(), Some("definitely not json"));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_malformed() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat")
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let client =
            OpenRouterClient::with_api_url("key", &format!("{}/chat", server.url())).unwrap();
        let err = client.complete(&request(false)).await.unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let client = OpenRouterClient::with_api_url("key", "http://127.0.0.1:1/chat").unwrap();
        let err = client.complete(&request(false)).await.unwrap_err();
        assert!(matches!(err, LlmError::Transport(_)));
    }

    #[tokio::test]
    async fn test_rejects_invalid_requests_without_calling() {
        let client = OpenRouterClient::with_api_url("key", "http://127.0.0.1:1/chat").unwrap();

        let mut no_messages = request(false);
        no_messages.messages.clear();
        assert!(matches!(
            client.complete(&no_messages).await,
            Err(LlmError::InvalidRequest(_))
        ));

        let mut no_model = request(false);
        no_model.model = " ".to_string();
        assert!(matches!(client.complete(&no_model).await, Err(LlmError::InvalidRequest(_))));
    }

    #[test]
    fn test_requires_api_key() {
        assert!(matches!(OpenRouterClient::new(""), Err(LlmError::InvalidRequest(_))));
        assert!(OpenRouterClient::new("key").is_ok());
    }
}
