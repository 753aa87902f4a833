//! Parsing of the human's replies

use serde::{Deserialize, Serialize};

const YES_WORDS: &[&str] = &[
    "yes", "y", "yeah", "yep", "yup", "yea", "correct", "right", "true", "sure", "affirmative",
];
const NO_WORDS: &[&str] = &[
    "no", "n", "nope", "nah", "false", "wrong", "incorrect", "negative",
];

/// A human reply, reduced to yes/no where possible
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    Yes,
    No,
    /// Free text that is neither a yes nor a no
    Other(String),
}

impl Answer {
    /// Classify by the first word, ignoring case and punctuation
    pub fn parse(text: &str) -> Self {
        let first_word = text
            .split(|c: char| !c.is_alphanumeric())
            .find(|word| !word.is_empty())
            .map(str::to_lowercase)
            .unwrap_or_default();

        if YES_WORDS.contains(&first_word.as_str()) {
            Answer::Yes
        } else if NO_WORDS.contains(&first_word.as_str()) {
            Answer::No
        } else {
            Answer::Other(text.trim().to_string())
        }
    }

    /// Text to hand to the guesser for this answer
    pub fn as_reply(&self) -> &str {
        match self {
            Answer::Yes => "Yes",
            Answer::No => "No",
            Answer::Other(text) => text,
        }
    }

    /// Strict binary reading for the simulated human: only a bare "yes"
    /// (case and closing punctuation aside) is a yes, everything else is a no
    pub fn strict(text: &str) -> Self {
        let word = text.trim().trim_end_matches(['.', '!']).trim_end();
        if word.eq_ignore_ascii_case("yes") {
            Answer::Yes
        } else {
            Answer::No
        }
    }
}
