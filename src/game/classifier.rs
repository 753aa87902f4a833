//! Oracle reply classification
//!
//! Deciding whether free text from the oracle is a correct final guess, a
//! concession or just another question is inherently fuzzy. The heuristic
//! here is best-effort and replaceable through [`OutcomeClassifier`].

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Label for one oracle reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// The oracle got it. `celebration` is set when the reply is the closing
    /// "Hooray" after a confirmed guess rather than the guess itself.
    CorrectGuess { celebration: bool },
    /// The oracle gave up
    Conceded,
    /// Anything else, including ambiguous replies
    Continue,
}

impl Outcome {
    pub fn is_win(self) -> bool {
        matches!(self, Outcome::CorrectGuess { .. })
    }

    /// Whether the reply spends one of the twenty questions
    pub fn consumes_question(self) -> bool {
        match self {
            Outcome::CorrectGuess { celebration } => !celebration,
            Outcome::Continue => true,
            Outcome::Conceded => false,
        }
    }
}

pub trait OutcomeClassifier: Send + Sync {
    /// Label `reply`. `concept` is the hidden answer when the caller knows it
    /// (bulk tests, or a web game started with a hint).
    fn classify(&self, reply: &str, concept: Option<&str>) -> Outcome;
}

static CELEBRATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\W*hooray\b").expect("celebration pattern is valid"));

static CONCESSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        \bi\s+give\s+up\b
        | \bi\s+(?:couldn['’]?t|could\s+not|wasn['’]?t\s+able\s+to|was\s+not\s+able\s+to|failed\s+to)\s+guess\b
        | \bout\s+of\s+questions\b
        | \breveal\s+(?:the|your)\s+(?:object|answer|concept)\b",
    )
    .expect("concession pattern is valid")
});

/// Negation right before a giving-up phrase ("not out of questions")
static NEGATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\bnot|n['’]t|\bnever)\s+(?:\w+\s+){0,2}$")
        .expect("negation pattern is valid")
});

/// Reply that closes on a yes/no question, so the guesser is still playing
static OPEN_QUESTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:^|[.!?]\s+)\W*(?:is|are|was|were|do|does|did|can|could|would|will|has|have|should)\b[^.!?]*\?\W*$",
    )
    .expect("open question pattern is valid")
});

/// Keyword heuristic.
///
/// Checked in order: a reply opening with "Hooray" is a celebration; a reply
/// naming the known concept as a whole word (plural allowed) is a correct
/// guess; a reply with a giving-up phrase is a concession unless the phrase
/// is negated or the reply goes on to ask another yes/no question;
/// everything else continues the game.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self
    }

    fn mentions(reply: &str, concept: &str) -> bool {
        let concept = concept.trim();
        if concept.is_empty() {
            return false;
        }
        let words: Vec<String> = concept.split_whitespace().map(regex::escape).collect();
        let pattern = format!(r"(?i)\b{}(?:s|es)?\b", words.join(r"\s+"));
        Regex::new(&pattern).is_ok_and(|re| re.is_match(reply))
    }

    fn concedes(reply: &str) -> bool {
        if OPEN_QUESTION.is_match(reply) {
            return false;
        }
        CONCESSION
            .find_iter(reply)
            .any(|m| !NEGATED.is_match(&reply[..m.start()]))
    }
}

impl OutcomeClassifier for HeuristicClassifier {
    fn classify(&self, reply: &str, concept: Option<&str>) -> Outcome {
        if CELEBRATION.is_match(reply) {
            return Outcome::CorrectGuess { celebration: true };
        }
        if concept.is_some_and(|c| Self::mentions(reply, c)) {
            return Outcome::CorrectGuess { celebration: false };
        }
        if Self::concedes(reply) {
            return Outcome::Conceded;
        }
        Outcome::Continue
    }
}
