//! Interactive terminal game

use crate::game::{Answer, GameController, GameError, GameStatus, TransitionError, MAX_QUESTIONS};
use crate::game_log::{Feedback, GameLog, GameLogRecord};
use crate::system_prompt::OUT_OF_QUESTIONS_MESSAGE;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Play one game over `input`/`output` until it ends or input runs out.
///
/// Oracle errors are reported and the same turn can be answered again.
/// Finished games are offered for feedback and written to `log`.
pub async fn play<R, W>(
    game: &mut GameController,
    input: R,
    output: &mut W,
    log: &dyn GameLog,
    api_type: &str,
) -> std::io::Result<GameStatus>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let game_id = uuid::Uuid::new_v4().to_string();

    write_line(output, &format!("AI: {}", game.state().last_ai_message)).await?;

    while !game.state().is_terminal() {
        output.write_all(b"Your answer (Yes/No): ").await?;
        output.flush().await?;
        let Some(line) = lines.next_line().await? else {
            return Ok(game.state().status);
        };

        match game.submit_answer(&line).await {
            Ok(turn) => {
                write_line(output, &format!("AI: {}", turn.reply)).await?;
                if !turn.state.is_terminal() {
                    write_line(
                        output,
                        &format!(
                            "({} of {MAX_QUESTIONS} questions asked)",
                            turn.state.questions_asked
                        ),
                    )
                    .await?;
                }
            }
            Err(GameError::InvalidState(TransitionError::EmptyAnswer)) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Turn failed");
                write_line(output, &format!("Something went wrong ({e}). Please answer again.")).await?;
            }
        }
    }

    let state = game.state().clone();
    match state.status {
        GameStatus::Success => {
            write_line(
                output,
                &format!(
                    "AI successfully guessed the object correctly in {} questions!",
                    state.questions_asked
                ),
            )
            .await?;
        }
        _ if state.questions_asked >= MAX_QUESTIONS => {
            write_line(output, &format!("AI: {OUT_OF_QUESTIONS_MESSAGE}")).await?;
            write_line(output, "Game over! The AI failed to guess the object in 20 questions.").await?;
        }
        _ => write_line(output, "Game over! The AI gave up.").await?,
    }

    output.write_all(b"Did you enjoy the game? (yes/no, Enter to skip): ").await?;
    output.flush().await?;
    let feedback = match lines.next_line().await? {
        Some(line) => match Answer::parse(&line) {
            Answer::Yes => Some(true),
            Answer::No => Some(false),
            Answer::Other(_) => None,
        },
        None => None,
    };

    let mut record = GameLogRecord::from_game(game_id, game, api_type);
    if let Some(satisfied) = feedback {
        record = record.with_feedback(Feedback {
            satisfied,
            comment: None,
        });
        write_line(output, "Thanks for the feedback!").await?;
    }
    if let Err(e) = log.append(&record).await {
        tracing::warn!(error = %e, "Failed to log game");
    }

    Ok(state.status)
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> std::io::Result<()> {
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n").await
}
