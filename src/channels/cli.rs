//! CLI channel — stdin/stdout REPL for local testing.
//!
//! Actions from the last response are numbered; typing `:N` selects one,
//! anything else is sent as free text.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::ChannelError;

use super::channel::{Action, Channel, IncomingMessage, MessageStream, OutgoingResponse};

/// A simple CLI channel that reads from stdin and writes to stdout.
pub struct CliChannel {
    last_actions: Arc<Mutex<Vec<Action>>>,
}

impl CliChannel {
    pub fn new() -> Self {
        Self {
            last_actions: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a `:N` action selection against the currently offered actions.
fn parse_action_selection(line: &str, actions: &[Action]) -> Option<Action> {
    let index: usize = line.strip_prefix(':')?.trim().parse().ok()?;
    if index == 0 {
        return None;
    }
    actions.get(index - 1).cloned()
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let last_actions = Arc::clone(&self.last_actions);

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            eprint!("> ");

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            eprint!("> ");
                            continue;
                        }
                        let actions = last_actions
                            .lock()
                            .map(|a| a.clone())
                            .unwrap_or_default();
                        let msg = match parse_action_selection(&line, &actions) {
                            Some(action) => IncomingMessage::menu("cli", "local-user", action.id),
                            None => IncomingMessage::text("cli", "local-user", &line),
                        };
                        if tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn respond(
        &self,
        _msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        println!("\n{}", response.text);
        for (i, action) in response.actions.iter().enumerate() {
            println!("  [:{}] {}", i + 1, action.label);
        }
        println!();
        eprint!("> ");

        if let Ok(mut last) = self.last_actions.lock() {
            *last = response.actions;
        }
        Ok(())
    }

    async fn notify(&self, recipient: &str, text: &str) -> Result<(), ChannelError> {
        println!("\n[notice for {recipient}] {text}\n");
        eprint!("> ");
        Ok(())
    }
}
