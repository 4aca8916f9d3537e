//! `tablechat chat`: Interactive or single-message chat in the terminal.

use std::io::Write;
use std::path::PathBuf;

use tablechat_assistant::{Assistant, AssistantError, RequestState};
use tablechat_config::{AppConfig, UiConfig};
use tablechat_session::{Greetings, SessionHistory};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::{CmdResult, config_file, load_config, require_generator, require_knowledge};

pub async fn run(
    config_path: Option<PathBuf>,
    message: Option<String>,
    knowledge: Option<PathBuf>,
) -> CmdResult<()> {
    let file = config_file(config_path.clone());
    let config = load_config(config_path, knowledge)?;
    let generator = require_generator(&config, &file)?;
    let blob = require_knowledge(&config)?;

    let rows = blob.row_count();
    let tokens = blob.estimated_tokens();
    let assistant = Assistant::from_config(&config, generator, blob);
    let mut history = new_history(&config);

    if let Some(msg) = message {
        // Single message mode
        let result = assistant
            .respond_observed(&mut history, &msg, busy_indicator(&config.ui.busy_text))
            .await;
        return match result {
            Ok(reply) => {
                println!("{}", reply.text);
                Ok(())
            }
            Err(e) => Err(format!("{}: {e}", config.ui.error_prefix).into()),
        };
    }

    // Interactive mode
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║          TableChat — Interactive Mode          ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Model:     {}", config.model);
    println!("  Knowledge: {rows} rows (~{tokens} tokens sent with every question)");
    println!();
    println!("  Type your question and press Enter.");
    println!("  Type '/clear' to reset the conversation, 'exit' or Ctrl+C to quit.");
    println!();

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    interactive(&assistant, &mut history, &config.ui, stdin, &mut stdout).await?;

    println!();
    println!("  Goodbye! 👋");
    println!();
    Ok(())
}

fn new_history(config: &AppConfig) -> SessionHistory {
    SessionHistory::new(Greetings {
        welcome: config.session.welcome_greeting.clone(),
        reset: config.session.reset_greeting.clone(),
    })
    .with_max_stored_turns(config.session.stored_turns_cap())
}

/// Shows `text` on stderr while a request is in flight.
fn busy_indicator(text: &str) -> impl FnMut(RequestState) + Send + '_ {
    move |state| match state {
        RequestState::Sending => eprint!("  {text}"),
        s if s.is_terminal() => {
            eprint!("\r{}\r", " ".repeat(text.chars().count() + 2));
        }
        _ => {}
    }
}

/// The read–answer loop. Returns on `exit`, `quit`, or end of input.
pub(crate) async fn interactive<R, W>(
    assistant: &Assistant,
    history: &mut SessionHistory,
    ui: &UiConfig,
    input: R,
    out: &mut W,
) -> CmdResult<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    if let Some(greeting) = history.last() {
        print_reply(out, &greeting.content)?;
    }

    let mut lines = input.lines();
    loop {
        write!(out, "  You > ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "" => continue,
            "exit" | "quit" => break,
            "/clear" => {
                history.reset();
                if let Some(greeting) = history.last() {
                    print_reply(out, &greeting.content)?;
                }
                continue;
            }
            _ => {}
        }

        match assistant
            .respond_observed(history, &line, busy_indicator(&ui.busy_text))
            .await
        {
            Ok(reply) => print_reply(out, &reply.text)?,
            Err(AssistantError::EmptyPrompt) => {}
            Err(e) => {
                writeln!(out, "  [{}] {e}", ui.error_prefix)?;
                writeln!(out)?;
            }
        }
    }

    Ok(())
}

fn print_reply<W: Write>(out: &mut W, text: &str) -> std::io::Result<()> {
    writeln!(out)?;
    for line in text.lines() {
        writeln!(out, "  🤖 > {line}")?;
    }
    writeln!(out)
}
