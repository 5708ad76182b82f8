pub mod core;
pub mod generation;
pub mod llm;
pub mod persistence;
pub mod review;
pub mod settings;
pub mod store;

pub use crate::{
    core::{
        ClientId,
        FiszkiError,
        FlashcardSuggestion,
        GenerateRequest,
        GenerateResponse,
        IdentifiedSuggestion,
    },
    generation::SuggestionGenerator,
    review::{
        ReviewSession,
        SuggestionStatus,
    },
    settings::Settings,
    store::{
        FlashcardStore,
        HttpFlashcardStore,
        LocalFlashcardStore,
    },
};
