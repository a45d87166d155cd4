//! Interactive chat loop.
//!
//! Every turn goes through the fallback orchestrator. The prompt sent to the
//! provider carries the most recent exchanges so follow-up questions make
//! sense.

use crate::error::CliError;
use courier_ai::{FallbackOrchestrator, QueryRequest};
use rootcause::prelude::ResultExt;
use std::collections::VecDeque;
use std::io::Write;
use std::num::NonZeroU32;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Exchanges kept in memory.
pub const HISTORY_LIMIT: usize = 10;

/// Exchanges included as context in each prompt.
pub const CONTEXT_EXCHANGES: usize = 2;

const HELP: &str = "\
Commands:
  help     - Show this help
  history  - Show conversation history
  clear    - Clear conversation history
  quit     - Exit chat (also exit, bye, q)";

/// One user message and the reply it got.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub user: String,
    pub reply: String,
}

/// Bounded conversation history.
#[derive(Debug, Default)]
pub struct ChatHistory {
    exchanges: VecDeque<Exchange>,
}

impl ChatHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an exchange, dropping the oldest beyond [`HISTORY_LIMIT`].
    pub fn push(&mut self, user: impl Into<String>, reply: impl Into<String>) {
        self.exchanges.push_back(Exchange {
            user: user.into(),
            reply: reply.into(),
        });
        while self.exchanges.len() > HISTORY_LIMIT {
            self.exchanges.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.exchanges.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Exchange> {
        self.exchanges.iter()
    }

    /// Builds the prompt for `input`, prefixed by the recent exchanges.
    #[must_use]
    pub fn context_prompt(&self, input: &str) -> String {
        if self.exchanges.is_empty() {
            return input.to_string();
        }
        let skip = self.exchanges.len().saturating_sub(CONTEXT_EXCHANGES);
        let context: Vec<String> = self
            .exchanges
            .iter()
            .skip(skip)
            .map(|e| format!("Previous - User: {}\nAI: {}", e.user, e.reply))
            .collect();
        format!("{}\n\nCurrent question: {}", context.join("\n"), input)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ChatInput<'a> {
    Empty,
    Quit,
    Help,
    History,
    Clear,
    Prompt(&'a str),
}

fn parse_input(line: &str) -> ChatInput<'_> {
    let line = line.trim();
    match line.to_lowercase().as_str() {
        "" => ChatInput::Empty,
        "quit" | "exit" | "bye" | "q" => ChatInput::Quit,
        "help" => ChatInput::Help,
        "history" => ChatInput::History,
        "clear" => ChatInput::Clear,
        _ => ChatInput::Prompt(line),
    }
}

/// Settings for one chat session.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub preferred: String,
    pub model: Option<String>,
    pub max_tokens: NonZeroU32,
}

impl ChatSession {
    /// Runs the loop until a quit command or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if reading `input` or writing `out` fails.
    pub async fn run<R, W>(
        &self,
        orchestrator: &FallbackOrchestrator,
        input: R,
        out: &mut W,
    ) -> courier_core::Result<ChatHistory, CliError>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut history = ChatHistory::new();
        let mut lines = input.lines();

        writeln!(
            out,
            "Chatting via {} (type 'help' for commands)",
            self.preferred
        )
        .context(CliError::Io)?;

        loop {
            write!(out, "\nYou: ").context(CliError::Io)?;
            out.flush().context(CliError::Io)?;

            let Some(line) = lines.next_line().await.context(CliError::Io)? else {
                writeln!(out).context(CliError::Io)?;
                break;
            };

            match parse_input(&line) {
                ChatInput::Empty => {}
                ChatInput::Quit => {
                    writeln!(out, "Goodbye!").context(CliError::Io)?;
                    break;
                }
                ChatInput::Help => writeln!(out, "{HELP}").context(CliError::Io)?,
                ChatInput::History if history.is_empty() => {
                    writeln!(out, "No conversation history").context(CliError::Io)?;
                }
                ChatInput::History => {
                    for (i, exchange) in history.iter().enumerate() {
                        writeln!(out, "{}. You: {}", i + 1, exchange.user)
                            .context(CliError::Io)?;
                        writeln!(out, "   AI: {}", exchange.reply).context(CliError::Io)?;
                    }
                }
                ChatInput::Clear => {
                    history.clear();
                    writeln!(out, "Conversation history cleared").context(CliError::Io)?;
                }
                ChatInput::Prompt(text) => {
                    self.turn(orchestrator, &mut history, text, out).await?;
                }
            }
        }

        Ok(history)
    }

    async fn turn<W: Write>(
        &self,
        orchestrator: &FallbackOrchestrator,
        history: &mut ChatHistory,
        text: &str,
        out: &mut W,
    ) -> courier_core::Result<(), CliError> {
        let mut request = match QueryRequest::new(history.context_prompt(text)) {
            Ok(request) => request.with_max_tokens(self.max_tokens),
            Err(e) => {
                writeln!(out, "Skipped: {e}").context(CliError::Io)?;
                return Ok(());
            }
        };
        if let Some(model) = &self.model {
            request = request.with_model(model.clone());
        }

        let outcome = orchestrator.query(&request, &self.preferred).await;
        match (&outcome.response, &outcome.provider_used) {
            (Some(reply), Some(provider)) => {
                writeln!(out, "AI ({provider}): {reply}").context(CliError::Io)?;
                if outcome.fell_back() {
                    writeln!(out, "[{}]", outcome.summary()).context(CliError::Io)?;
                }
                history.push(text, reply.clone());
            }
            _ => {
                writeln!(out, "No response: {}", outcome.summary()).context(CliError::Io)?;
                for error in &outcome.errors {
                    writeln!(out, "  - {error}").context(CliError::Io)?;
                }
            }
        }
        Ok(())
    }
}
