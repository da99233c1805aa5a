//! Interactive read-eval loop against one pipe.
//!
//! Each line is a turn; the thread id from the previous turn carries the
//! conversation. A failed turn is logged and the loop keeps going.
//! Only completions go to `output`; the `> ` prompt goes to stderr.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, info};

use crate::pipe::{Message, PipeBackend, RunPipeRequest};

/// Summary of a finished chat session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatSummary {
    pub turns: usize,
    pub failures: usize,
    pub thread_id: Option<String>,
}

fn is_exit(line: &str) -> bool {
    matches!(line, "exit" | "quit")
}

/// Run the loop until `exit`/`quit` or end of input.
///
/// `prompt` shows `> ` on stderr before each line, for interactive terminals.
pub async fn chat_loop<R, W>(
    backend: &dyn PipeBackend,
    pipe: &str,
    input: R,
    mut output: W,
    prompt: bool,
) -> std::io::Result<ChatSummary>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut summary = ChatSummary::default();
    let mut stderr = tokio::io::stderr();

    if prompt {
        stderr.write_all(b"> ").await?;
    }

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if is_exit(line) {
            break;
        }
        if !line.is_empty() {
            let request = RunPipeRequest::new(pipe, vec![Message::user(line)])
                .with_thread(summary.thread_id.clone());

            match backend.run_pipe(&request).await {
                Ok(outcome) => {
                    summary.turns += 1;
                    if outcome.thread_id.is_some() {
                        summary.thread_id = outcome.thread_id;
                    }
                    output.write_all(outcome.completion.trim_end().as_bytes()).await?;
                    output.write_all(b"\n").await?;
                    output.flush().await?;
                }
                Err(e) => {
                    summary.failures += 1;
                    error!(pipe, error = %e, "chat turn failed");
                }
            }
        }
        if prompt {
            stderr.write_all(b"> ").await?;
        }
    }

    info!(turns = summary.turns, failures = summary.failures, "chat ended");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipe::{RunOutcome, ScriptedBackend};

    #[tokio::test]
    async fn keeps_thread_between_turns() {
        let backend = ScriptedBackend::new()
            .outcome("chat-agent", RunOutcome::text("Hi Ada!").with_thread("t-1"))
            .reply("chat-agent", "Your name is Ada.");
        let input: &[u8] = b"My name is Ada\n\nWhat is my name?\nexit\nignored\n";
        let mut out = Vec::new();

        let summary = chat_loop(&backend, "chat-agent", input, &mut out, false).await.unwrap();
        assert_eq!(summary.turns, 2);
        assert_eq!(summary.thread_id.as_deref(), Some("t-1"));

        let runs = backend.runs().await;
        assert_eq!(runs.len(), 2);
        assert!(runs[0].thread_id.is_none());
        assert_eq!(runs[1].thread_id.as_deref(), Some("t-1"));

        let printed = String::from_utf8(out).unwrap();
        assert_eq!(printed, "Hi Ada!\nYour name is Ada.\n");
    }

    #[tokio::test]
    async fn failed_turn_does_not_end_session() {
        let backend = ScriptedBackend::new()
            .fail("chat-agent", "overloaded")
            .reply("chat-agent", "back again");
        let input: &[u8] = b"one\ntwo\n";
        let mut out = Vec::new();

        let summary = chat_loop(&backend, "chat-agent", input, &mut out, false).await.unwrap();
        assert_eq!(summary.failures, 1);
        assert_eq!(summary.turns, 1);
        assert!(String::from_utf8(out).unwrap().contains("back again"));
    }

    #[tokio::test]
    async fn eof_ends_session() {
        let backend = ScriptedBackend::new();
        let input: &[u8] = b"";
        let summary = chat_loop(&backend, "chat-agent", input, Vec::new(), false).await.unwrap();
        assert_eq!(summary, ChatSummary::default());
    }

    #[tokio::test]
    async fn output_carries_only_completions_with_prompt_on() {
        let backend = ScriptedBackend::new().reply("chat-agent", "pong");
        let input: &[u8] = b"ping\n";
        let mut out = Vec::new();

        chat_loop(&backend, "chat-agent", input, &mut out, true).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "pong\n");
    }
}
