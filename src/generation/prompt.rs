use serde_json::{
    json,
    Value,
};

pub const RESPONSE_SCHEMA_NAME: &str = "FlashcardsResponse";
pub const MIN_SUGGESTIONS: usize = 5;
pub const MAX_SUGGESTIONS: usize = 10;

/// Task contract handed to the model.
pub fn system_prompt() -> String {
    format!(
        "You are an expert Spanish language tutor, helping Polish speakers learn Spanish.
Your task is to analyze the provided text (which can be in any language) and generate {min}-{max} useful Spanish vocabulary items inspired by the text's themes or content. Provide Polish translations and example sentences for each.

You must follow these requirements:
1. Generate {min}-{max} Spanish words or phrases inspired by the input text, suitable for a learner.
2. For each word or phrase, provide:
   - word: the Spanish word or phrase. If it is a noun, include its definite article (el, la, los, las).
   - translation: the Polish translation.
   - example: an example sentence in Spanish showing its usage, inspired by the text's context if possible.
   - example_translation: the Polish translation of the example sentence.
3. Select a variety of useful vocabulary (nouns, verbs, adjectives, phrases).
4. Choose words that are useful for everyday conversation.
5. Ensure the Spanish example sentences are grammatically correct and natural.
6. Format your response as a valid JSON object following the {schema} schema.",
        min = MIN_SUGGESTIONS,
        max = MAX_SUGGESTIONS,
        schema = RESPONSE_SCHEMA_NAME,
    )
}

/// Embeds `text` verbatim. Length is bounded by the caller.
pub fn user_prompt(text: &str) -> String {
    format!(
        "Please analyze the following text and generate Spanish flashcards inspired by its content for a Polish speaker:\n\n{}",
        text
    )
}

/// JSON schema for the structured output named [`RESPONSE_SCHEMA_NAME`].
pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "flashcards": {
                "type": "array",
                "minItems": MIN_SUGGESTIONS,
                "maxItems": MAX_SUGGESTIONS,
                "items": {
                    "type": "object",
                    "properties": {
                        "word": {
                            "type": "string",
                            "description": "Spanish word or phrase, with its article if it is a noun"
                        },
                        "translation": {
                            "type": "string",
                            "description": "Polish translation of the word"
                        },
                        "example": {
                            "type": "string",
                            "description": "Example sentence in Spanish"
                        },
                        "example_translation": {
                            "type": "string",
                            "description": "Polish translation of the example sentence"
                        }
                    },
                    "required": ["word", "translation", "example", "example_translation"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["flashcards"],
        "additionalProperties": false
    })
}
