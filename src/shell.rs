//! Interactive shell.
//!
//! Reads one line at a time from stdin, parses it with the same grammar as
//! the command line, and dispatches it. Failures, including a line that is
//! not valid UTF-8, are printed and the prompt comes back; `exit`, `quit`
//! or end of input leave the shell. Ctrl-C cancels the report in flight
//! and never leaves the shell.

use std::io::{ErrorKind, Write};

use anyhow::{Context, Result};
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;
use tracing::{debug, warn};

use crate::cli::{App, ShellInput, dispatch, parse_shell_line};
use crate::diagnostic::Diagnostic;

pub const PROMPT: &str = "huecheck> ";

/// Runs the shell until the user leaves.
pub async fn run_shell(app: &App) -> Result<()> {
    println!(
        "{} connected to {}",
        console::style("huecheck").bold(),
        app.config().api.base_url
    );
    println!(
        "{}",
        console::style("Type `help` for commands, `exit` to leave.").dim()
    );

    let listener = app.interrupts().listen(app.reporter().clone());
    let result = read_eval_loop(app).await;
    listener.abort();

    debug!("Leaving shell");
    result
}

async fn read_eval_loop(app: &App) -> Result<()> {
    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());

    loop {
        print!("{}", PROMPT);
        std::io::stdout().flush().context("Failed to flush stdout")?;

        let Some(line) = lines.next().await else {
            println!();
            break;
        };
        let line = match line {
            Ok(line) => line,
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                warn!("Skipping unreadable input line: {}", e);
                app.reporter()
                    .on_error(&Diagnostic::Message("Input line is not valid UTF-8".to_string()));
                continue;
            }
            Err(e) => return Err(e).context("Failed to read from stdin"),
        };

        match parse_shell_line(&line) {
            ShellInput::Empty => continue,
            ShellInput::Exit => break,
            ShellInput::Message(text) => println!("{}", text.trim_end()),
            ShellInput::Command(command) => {
                if let Err(e) = dispatch(app, command).await {
                    warn!("Command failed: {:#}", e);
                    app.reporter()
                        .on_error(&Diagnostic::Message(format!("{:#}", e)));
                }
            }
        }
    }

    Ok(())
}
