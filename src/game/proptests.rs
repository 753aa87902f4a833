//! Property-based tests for the game state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::*;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        6 => Just(Outcome::Continue),
        1 => any::<bool>().prop_map(|celebration| Outcome::CorrectGuess { celebration }),
        1 => Just(Outcome::Conceded),
    ]
}

fn arb_in_progress_state() -> impl Strategy<Value = GameState> {
    (0..MAX_QUESTIONS, "[a-zA-Z ?]{0,30}").prop_map(|(questions_asked, last_ai_message)| {
        GameState {
            questions_asked,
            status: GameStatus::InProgress,
            last_ai_message,
        }
    })
}

fn arb_terminal_state() -> impl Strategy<Value = GameState> {
    (
        0..=MAX_QUESTIONS,
        prop_oneof![Just(GameStatus::Success), Just(GameStatus::Failure)],
    )
        .prop_map(|(questions_asked, status)| GameState {
            questions_asked,
            status,
            last_ai_message: "Hooray!".to_string(),
        })
}

fn arb_state() -> impl Strategy<Value = GameState> {
    prop_oneof![arb_in_progress_state(), arb_terminal_state()]
}

fn arb_user_answer_event() -> impl Strategy<Value = Event> {
    "[a-zA-Z ]{0,20}".prop_map(|text| Event::UserAnswer { text })
}

fn arb_oracle_reply_event() -> impl Strategy<Value = Event> {
    ("[a-zA-Z ]{1,20}", "[a-zA-Z ?!]{1,40}", arb_outcome()).prop_map(
        |(user_text, reply, outcome)| Event::OracleReply {
            user_text,
            reply,
            outcome,
        },
    )
}

fn arb_turn_event() -> impl Strategy<Value = Event> {
    prop_oneof![arb_user_answer_event(), arb_oracle_reply_event()]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![1 => Just(Event::Start), 9 => arb_turn_event()]
}

// ============================================================================
// Invariants
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// The question count stays within budget and moves up by at most one,
    /// except on Start which resets it.
    #[test]
    fn prop_question_count_bounded_and_monotonic(state in arb_state(), event in arb_turn_event()) {
        if let Ok(result) = transition(&state, event) {
            prop_assert!(result.new_state.questions_asked <= MAX_QUESTIONS);
            prop_assert!(result.new_state.questions_asked >= state.questions_asked);
            prop_assert!(result.new_state.questions_asked <= state.questions_asked + 1);
        }
    }

    /// Terminal games reject every turn event and emit no effects
    #[test]
    fn prop_terminal_rejects_turns(state in arb_terminal_state(), event in arb_turn_event()) {
        let result = transition(&state, event);
        prop_assert_eq!(result.unwrap_err(), TransitionError::InvalidState(state.status));
    }

    /// Start always returns to a fresh game
    #[test]
    fn prop_start_always_resets(state in arb_state()) {
        let result = transition(&state, Event::Start).unwrap();
        prop_assert_eq!(result.new_state, GameState::new());
    }

    /// Only InProgress -> {Success, Failure}; never back, never across
    #[test]
    fn prop_status_only_leaves_in_progress(state in arb_in_progress_state(), event in arb_oracle_reply_event()) {
        let result = transition(&state, event).unwrap();
        let terminal = result.new_state.status.is_terminal();
        let announced = result
            .effects
            .iter()
            .any(|e| matches!(e, Effect::GameOver { .. }));
        prop_assert_eq!(terminal, announced);
    }

    /// An in-progress game never sits at the full budget
    #[test]
    fn prop_in_progress_has_questions_left(state in arb_in_progress_state(), event in arb_oracle_reply_event()) {
        let result = transition(&state, event).unwrap();
        if result.new_state.status == GameStatus::InProgress {
            prop_assert!(result.new_state.questions_asked < MAX_QUESTIONS);
        }
    }

    /// Driving a game with arbitrary replies always ends within the budget
    #[test]
    fn prop_games_terminate(outcomes in proptest::collection::vec(arb_outcome(), MAX_QUESTIONS as usize)) {
        let mut state = GameState::new();
        for outcome in outcomes {
            if state.is_terminal() {
                break;
            }
            let asked = transition(&state, Event::UserAnswer { text: "Yes".to_string() }).unwrap();
            prop_assert_eq!(&asked.new_state, &state);
            state = transition(&state, Event::OracleReply {
                user_text: "Yes".to_string(),
                reply: "Is it alive?".to_string(),
                outcome,
            })
            .unwrap()
            .new_state;
        }
        // Twenty counted replies always finish the game; celebrations and
        // concessions finish it earlier
        prop_assert!(state.is_terminal());
    }

    /// Arbitrary event sequences never break the invariants
    #[test]
    fn prop_event_sequences_hold_invariants(events in proptest::collection::vec(arb_event(), 1..60)) {
        let mut state = GameState::new();
        for event in events {
            let is_start = event == Event::Start;
            match transition(&state, event) {
                Ok(result) => {
                    if !is_start {
                        prop_assert!(result.new_state.questions_asked >= state.questions_asked);
                        if state.is_terminal() {
                            prop_assert_eq!(result.new_state.status, state.status);
                        }
                    }
                    prop_assert!(result.new_state.questions_asked <= MAX_QUESTIONS);
                    state = result.new_state;
                }
                Err(TransitionError::InvalidState(status)) => {
                    prop_assert!(status.is_terminal());
                }
                Err(TransitionError::EmptyAnswer) => {}
            }
        }
    }
}
