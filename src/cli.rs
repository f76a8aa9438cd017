//! Interactive read-print loop around the agent.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::agent::{Agent, Conversation, TurnOutcome};

const BANNER: &str = "\nLooping Agent (model + tools in a loop)\nType 'exit' to quit.\n\n";
const FAREWELL: &str = "Bot: Goodbye!\n";

/// Whether a line ends the session.
pub fn is_exit_command(line: &str) -> bool {
    let line = line.trim();
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

/// Read one line per prompt and answer it until `exit`/`quit` or end of input.
///
/// The conversation lives for the whole session; turn failures are printed
/// and the session continues.
pub async fn run_repl<R, W>(agent: &Agent, input: R, mut output: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output.write_all(BANNER.as_bytes()).await?;

    let mut lines = input.lines();
    let mut conversation = Conversation::new();

    loop {
        output.write_all(b"You: ").await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            output.write_all(b"\n").await?;
            output.write_all(FAREWELL.as_bytes()).await?;
            break;
        };

        let user = line.trim();
        if user.is_empty() {
            continue;
        }
        if is_exit_command(user) {
            output.write_all(FAREWELL.as_bytes()).await?;
            break;
        }

        output.write_all(b"Bot: Processing...\n").await?;
        output.flush().await?;

        let reply = match agent.run_turn(&mut conversation, user).await {
            Ok(TurnOutcome::Answer(text)) => format!("Bot: {}\n", text),
            Ok(TurnOutcome::RateLimited { advisory }) => format!(
                "Bot: {}\n     (history was cleared to reduce token usage)\n",
                advisory
            ),
            Err(e) => format!("Bot: Error - {}...\n", e.user_message()),
        };
        output.write_all(reply.as_bytes()).await?;
    }

    output.flush().await?;
    Ok(())
}
