pub mod generator;
pub mod mock;
pub mod prompt;

pub use generator::{
    GenerationOutcome,
    SuggestionGenerator,
    SuggestionSource,
    DEFAULT_MODEL,
};
pub use mock::{
    MockSuggestionSource,
    Topic,
    TopicTable,
};
