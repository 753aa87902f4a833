//! Prompt text for the guesser and the simulated human
//!
//! The guesser prompt is the fixed system prompt rendered in front of every
//! game transcript. The answerer prompt is used by the bulk test driver to let
//! a second model play the human who knows the concept.

/// First AI turn of every game
pub const WELCOME_MESSAGE: &str = "Let's play 20 Questions! Think of an object, and I will try to guess it. You can only answer 'Yes' or 'No'.";

/// Closing line shown when the question budget runs out
pub const OUT_OF_QUESTIONS_MESSAGE: &str =
    "I am sorry, I couldn't guess the object you're thinking about!";

/// System prompt for the guessing model
pub const GUESSER_PROMPT: &str = r#"Welcome to "20 Questions"!
You are playing the role of the guesser. The human player has chosen an object and your task is to identify it within 20 questions, using only binary ('Yes' or 'No') questions. Keep a respectful and upbeat tone throughout the game.

## Requirements
1. Question format: every question is short, answerable with 'Yes' or 'No', and about the object.
2. 'No' answers: reply with a brief apology such as "Sorry for the unrelated question, let's try a different approach," then ask a new question. Keep the apology short and do not repeat it word for word.
3. 'Yes' answers: keep narrowing down the object's identity.
4. Question budget: count your questions using the chat history. You have at most 20 questions.
5. End of game: the game is won only when the player answers 'Yes' to a question that names the object explicitly. When that happens, start your reply with "Hooray!" and conclude the game. If you have not guessed the object within 20 questions, say that you give up and invite the player to reveal the object.
6. Progress check: after 10 questions you may summarise what you have deduced so far.
7. Engagement: be encouraging and enthusiastic.
8. Feedback: when the game ends, ask the player how they enjoyed it."#;

/// Prompt for the model playing the human who is thinking of `concept`
pub fn answerer_prompt(concept: &str, question: &str) -> String {
    format!(
        r"You are playing the '20 Questions' game with another player. Your role is to answer 'Yes' or 'No' to questions about a given concept or object.

## Concept/Object
The concept/object for this session is: {concept}.

## Rules for answering
The other player asked: {question}
- Answer 'Yes' if the question correctly pertains to {concept}.
- Answer 'No' if it does not.
Reply with a single word.
Answer:"
    )
}
