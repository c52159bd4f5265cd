//! Interactive streaming chat in the terminal.
//!
//! Each line typed on stdin is sent as a user turn; the answer streams back
//! as it arrives. With `TAVILY_API_KEY` set, the model can search the web.
//!
//! Run with:
//! ```bash
//! OPENAI_API_KEY=your-key cargo run --example streaming_chat
//! RUST_LOG=chatwire_agent=debug OPENAI_API_KEY=your-key TAVILY_API_KEY=tvly-key \
//!     cargo run --example streaming_chat
//! ```

use chatwire::prelude::*;
use futures::StreamExt;
use std::io::{self, BufRead, Write};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let config = ChatConfig::from_env()?;
    let orchestrator = ChatOrchestrator::from_config(config)?;
    tracing::info!(tools = ?orchestrator.registry().names(), "Ready");

    let mut conversation =
        Conversation::new().with_system_prompt("You are a concise, helpful assistant.");

    println!("Model: {}  (empty line or Ctrl-D to quit)\n", orchestrator.config().model);

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 || line.trim().is_empty() {
            break;
        }
        conversation.push_user(line.trim());

        let mut stream = orchestrator.stream(conversation.messages());
        let mut answer = String::new();
        let mut failed = false;

        while let Some(fragment) = stream.next().await {
            match &fragment {
                ChatFragment::Text(text) => {
                    print!("{text}");
                    io::stdout().flush()?;
                    answer.push_str(text);
                }
                ChatFragment::Error(err) => {
                    eprintln!("\nerror: {err}");
                    failed = true;
                }
            }
        }
        println!("\n");

        if failed {
            // Drop the unanswered turn so it can be retried.
            let last = conversation.len() - 1;
            conversation.remove(last)?;
        } else if !answer.is_empty() {
            conversation.push_assistant(answer);
        }
    }

    Ok(())
}
