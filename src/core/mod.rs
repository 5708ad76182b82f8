pub mod errors;
pub mod http;
pub mod models;
pub mod random;

pub use errors::{
    FiszkiError,
    LlmError,
    ReviewError,
    StoreError,
};
pub use models::{
    ClientId,
    CreateFlashcardCommand,
    FlashcardSuggestion,
    GenerateRequest,
    GenerateResponse,
    IdentifiedSuggestion,
    PersistedFlashcard,
};
pub use random::{
    RandomSource,
    SequenceRandom,
    SystemRandom,
};
