//! Command grammar and dispatch shared by one-shot and interactive modes.
//!
//! `huecheck report -c red,blue` and typing `report -c red,blue` at the
//! shell prompt parse into the same [`Command`] and go through the same
//! [`dispatch`] call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::api::{HttpApi, ReportApi};
use crate::config::Config;
use crate::diagnostic::{Fault, classify};
use crate::filter::parse_color_list;
use crate::orchestrator::{JobOrchestrator, RunOutcome};
use crate::render::Renderer;
use crate::report::Reporter;

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Fetch test results, submit the selected colors and render the report
    #[command(alias = "run")]
    Report {
        /// Comma-separated colors to include (default from config)
        #[arg(short, long)]
        colors: Option<String>,
    },

    /// Show the API's own help text
    Guide,

    /// Print the effective configuration
    Config,

    /// Start the interactive shell
    Shell,
}

/// One line typed at the shell prompt.
#[derive(Debug, Parser)]
#[command(name = "huecheck", no_binary_name = true, disable_version_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: Command,
}

/// What a shell line asks for.
#[derive(Debug)]
pub enum ShellInput {
    Empty,
    Exit,
    Command(Command),
    /// Help output or a parse error, to be shown as-is.
    Message(String),
}

/// Parses one shell line.
pub fn parse_shell_line(line: &str) -> ShellInput {
    let words = match shell_words::split(line) {
        Ok(words) => words,
        Err(e) => return ShellInput::Message(format!("Invalid input: {}", e)),
    };

    match words.first().map(String::as_str) {
        None => ShellInput::Empty,
        Some("exit" | "quit") => ShellInput::Exit,
        Some(_) => match ShellLine::try_parse_from(&words) {
            Ok(parsed) => ShellInput::Command(parsed.command),
            Err(e) => ShellInput::Message(e.render().to_string()),
        },
    }
}

/// Routes Ctrl-C to the run in flight.
///
/// Once [`Interrupts::listen`] is called the signal is owned for the rest
/// of the process; Ctrl-C with no run in flight only prints a hint.
#[derive(Default)]
pub struct Interrupts {
    current: Mutex<Option<CancellationToken>>,
    listening: AtomicBool,
}

impl Interrupts {
    pub const IDLE_HINT: &'static str = "Interrupted. Type `exit` to leave.";

    /// Starts a run and returns its cancellation token.
    pub fn begin(&self) -> CancellationToken {
        let token = CancellationToken::new();
        if let Ok(mut current) = self.current.lock() {
            *current = Some(token.clone());
        }
        token
    }

    /// Ends the run started by the last [`Interrupts::begin`].
    pub fn finish(&self) {
        if let Ok(mut current) = self.current.lock() {
            current.take();
        }
    }

    /// Cancels the run in flight. Returns `false` if there is none.
    pub fn interrupt(&self) -> bool {
        match self.current.lock() {
            Ok(current) => match current.as_ref() {
                Some(token) => {
                    token.cancel();
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Handles Ctrl-C until the returned task is aborted.
    pub fn listen(self: &Arc<Self>, reporter: Arc<dyn Reporter>) -> JoinHandle<()> {
        self.listening.store(true, Ordering::SeqCst);
        let interrupts = self.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if !interrupts.interrupt() {
                    reporter.on_warning(Self::IDLE_HINT);
                }
            }
        })
    }
}

/// Everything a command needs to run.
pub struct App {
    config: Config,
    reporter: Arc<dyn Reporter>,
    interrupts: Arc<Interrupts>,
    styled: bool,
}

impl App {
    pub fn new(config: Config, reporter: Arc<dyn Reporter>) -> Self {
        let styled = config.report.color;
        Self {
            config,
            reporter,
            interrupts: Arc::new(Interrupts::default()),
            styled,
        }
    }

    /// Forces report styling on or off, regardless of configuration.
    pub fn with_styling(mut self, styled: bool) -> Self {
        self.styled = styled;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn reporter(&self) -> &Arc<dyn Reporter> {
        &self.reporter
    }

    pub fn interrupts(&self) -> &Arc<Interrupts> {
        &self.interrupts
    }

    fn api(&self) -> HttpApi {
        HttpApi::from_config(&self.config.api)
    }

    fn colors_for(&self, colors: Option<&str>) -> Vec<String> {
        match colors.map(parse_color_list) {
            Some(list) if !list.is_empty() => list,
            _ => self.config.report.default_colors.clone(),
        }
    }
}

/// Runs one command.
///
/// Orchestration failures are reported, not returned; an `Err` here means
/// the command itself could not be carried out.
pub async fn dispatch(app: &App, command: Command) -> Result<()> {
    debug!("Dispatching {:?}", command);

    match command {
        Command::Report { colors } => {
            let colors = app.colors_for(colors.as_deref());
            run_report(app, &colors).await;
        }
        Command::Guide => match app.api().help_text().await {
            Ok(text) => app.reporter.on_log(text.trim_end()),
            Err(e) => app.reporter.on_error(&classify(&Fault::from(e))),
        },
        Command::Config => {
            app.reporter.on_log(app.config.to_toml()?.trim_end());
        }
        Command::Shell => {
            app.reporter.on_warning("Already in the interactive shell");
        }
    }

    Ok(())
}

/// Runs the orchestration once. Ctrl-C cancels the run in flight.
///
/// Outside the shell nothing listens for Ctrl-C between commands, so the
/// signal is only taken for the duration of this run.
async fn run_report(app: &App, colors: &[String]) -> RunOutcome {
    let token = app.interrupts.begin();
    let own_signal = (!app.interrupts.is_listening()).then(|| {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        })
    });

    let orchestrator = JobOrchestrator::new(app.api(), app.reporter.clone(), app.config.poll.clone())
        .with_renderer(Renderer::new(app.styled))
        .with_cancellation_token(token);

    let outcome = orchestrator.run(colors).await;
    app.interrupts.finish();
    if let Some(handle) = own_signal {
        handle.abort();
    }
    outcome
}
