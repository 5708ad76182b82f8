pub mod api;
pub mod types;

pub use api::{
    ChatCompletion,
    OpenRouterClient,
    OPENROUTER_API_URL,
};
pub use types::{
    ChatCompletionRequest,
    ChatCompletionResponse,
    Message,
    ModelParams,
    ResponseFormat,
};
