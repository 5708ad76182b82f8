pub mod session;
pub mod tracker;

pub use session::{
    ReviewSession,
    MAX_TEXT_CHARS,
};
pub use tracker::{
    ReviewTracker,
    SuggestionRecord,
    SuggestionStatus,
};
