use thiserror::Error;

#[derive(Error, Debug)]
pub enum FiszkiError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(Box<reqwest::Error>),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Review error: {0}")]
    Review(#[from] ReviewError),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid topic table: {0}")]
    InvalidTopic(String),
}

impl From<tokio::task::JoinError> for FiszkiError {
    fn from(error: tokio::task::JoinError) -> Self {
        FiszkiError::Task(error.to_string())
    }
}

impl From<std::io::Error> for FiszkiError {
    fn from(error: std::io::Error) -> Self {
        FiszkiError::Io(Box::new(error))
    }
}

impl From<reqwest::Error> for FiszkiError {
    fn from(error: reqwest::Error) -> Self {
        FiszkiError::Reqwest(Box::new(error))
    }
}

/// Failures of a single chat-completion call.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Invalid completion request: {0}")]
    InvalidRequest(String),

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { status: u16, message: String },

    #[error("Payment required: {message}")]
    PaymentRequired { status: u16, message: String },

    #[error("Forbidden: {message}")]
    Forbidden { status: u16, message: String },

    #[error("Rate limit exceeded: {message}")]
    RateLimited { status: u16, message: String },

    #[error("Server error ({status}): {message}")]
    UpstreamServerError { status: u16, message: String },

    #[error("API error ({status}): {message}")]
    UpstreamError { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Response does not match schema: {0}")]
    SchemaValidationFailed(String),
}

impl LlmError {
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => LlmError::AuthenticationFailed { status, message },
            402 => LlmError::PaymentRequired { status, message },
            403 => LlmError::Forbidden { status, message },
            429 => LlmError::RateLimited { status, message },
            500..=599 => LlmError::UpstreamServerError { status, message },
            _ => LlmError::UpstreamError { status, message },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::AuthenticationFailed { status, .. }
            | LlmError::PaymentRequired { status, .. }
            | LlmError::Forbidden { status, .. }
            | LlmError::RateLimited { status, .. }
            | LlmError::UpstreamServerError { status, .. }
            | LlmError::UpstreamError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(error: reqwest::Error) -> Self {
        LlmError::Transport(error.to_string())
    }
}

/// Outcomes of the storage collaborator other than a created record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{message}")]
    Conflict { message: String },

    #[error("Failed to persist flashcard {}", persistence_detail(.status, .message))]
    Persistence { status: Option<u16>, message: Option<String> },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Flashcard {0} not found")]
    NotFound(String),
}

fn persistence_detail(status: &Option<u16>, message: &Option<String>) -> String {
    let status = status.map(|s| s.to_string()).unwrap_or_else(|| "no status".to_string());
    format!("({}): {}", status, message.as_deref().unwrap_or("no details"))
}

impl From<reqwest::Error> for StoreError {
    fn from(error: reqwest::Error) -> Self {
        StoreError::Transport(error.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReviewError {
    #[error("No suggestion with client id {0}")]
    UnknownSuggestion(String),

    #[error("Cannot {action} a suggestion in state {from}")]
    InvalidTransition { from: String, action: &'static str },
}
