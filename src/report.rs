//! Output streams for orchestration runs.
//!
//! A run writes to three streams: the log stream (submission confirmation
//! and the rendered report), the warning stream (non-fatal conditions) and
//! the error stream (classified failures). [`Reporter`] is the sink for all
//! of them, so the same run can print to a terminal or be captured in tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use console::Style;

use crate::diagnostic::Diagnostic;

/// Receives the user-facing output of a run.
pub trait Reporter: Send + Sync {
    /// Regular output.
    fn on_log(&self, line: &str);

    /// A non-fatal condition that ended the run early.
    fn on_warning(&self, line: &str);

    /// A classified failure.
    fn on_error(&self, diagnostic: &Diagnostic);

    /// Called before each poll request.
    fn on_poll_attempt(&self, _attempt: u32, _max_attempts: u32) {}

    /// Called once polling stops, whatever the reason.
    fn on_poll_finished(&self) {}
}

impl<R: Reporter + ?Sized> Reporter for Arc<R> {
    fn on_log(&self, line: &str) {
        (**self).on_log(line)
    }

    fn on_warning(&self, line: &str) {
        (**self).on_warning(line)
    }

    fn on_error(&self, diagnostic: &Diagnostic) {
        (**self).on_error(diagnostic)
    }

    fn on_poll_attempt(&self, attempt: u32, max_attempts: u32) {
        (**self).on_poll_attempt(attempt, max_attempts)
    }

    fn on_poll_finished(&self) {
        (**self).on_poll_finished()
    }
}

/// Prints to the terminal: log lines to stdout, warnings and errors to stderr.
pub struct ConsoleReporter {
    styled: bool,
    spinner: Mutex<Option<indicatif::ProgressBar>>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self {
            styled: true,
            spinner: Mutex::new(None),
        }
    }

    /// Turns colored warnings and errors off. When on, color still follows
    /// whether stderr is a terminal.
    pub fn with_styling(mut self, styled: bool) -> Self {
        self.styled = styled;
        self
    }

    fn stderr_line(&self, style: Style, line: &str) -> String {
        let style = if self.styled {
            style.for_stderr()
        } else {
            style.force_styling(false)
        };
        style.apply_to(line).to_string()
    }

    fn clear_spinner(&self) {
        if let Ok(mut spinner) = self.spinner.lock()
            && let Some(pb) = spinner.take()
        {
            pb.finish_and_clear();
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for ConsoleReporter {
    fn on_log(&self, line: &str) {
        println!("{}", line);
    }

    fn on_warning(&self, line: &str) {
        self.clear_spinner();
        eprintln!("{}", self.stderr_line(Style::new().yellow(), line));
    }

    fn on_error(&self, diagnostic: &Diagnostic) {
        self.clear_spinner();
        for line in diagnostic.lines() {
            eprintln!("{}", self.stderr_line(Style::new().red(), &line));
        }
    }

    fn on_poll_attempt(&self, attempt: u32, max_attempts: u32) {
        let Ok(mut spinner) = self.spinner.lock() else {
            return;
        };
        let pb = spinner.get_or_insert_with(|| {
            let pb = indicatif::ProgressBar::new_spinner();
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        });
        pb.set_message(format!(
            "Waiting for report (attempt {}/{})",
            attempt, max_attempts
        ));
    }

    fn on_poll_finished(&self) {
        self.clear_spinner();
    }
}

/// One piece of output recorded by [`CaptureReporter`].
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    Log(String),
    Warning(String),
    Error(Diagnostic),
    PollAttempt { attempt: u32, max_attempts: u32 },
    PollFinished,
}

/// Records output in memory instead of printing it.
#[derive(Default)]
pub struct CaptureReporter {
    events: Mutex<Vec<ReportEvent>>,
}

impl CaptureReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: ReportEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    /// Everything recorded so far, in order.
    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn logs(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::Log(line) => Some(line),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::Warning(line) => Some(line),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<Diagnostic> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::Error(d) => Some(d),
                _ => None,
            })
            .collect()
    }
}

impl Reporter for CaptureReporter {
    fn on_log(&self, line: &str) {
        self.push(ReportEvent::Log(line.to_string()));
    }

    fn on_warning(&self, line: &str) {
        self.push(ReportEvent::Warning(line.to_string()));
    }

    fn on_error(&self, diagnostic: &Diagnostic) {
        self.push(ReportEvent::Error(diagnostic.clone()));
    }

    fn on_poll_attempt(&self, attempt: u32, max_attempts: u32) {
        self.push(ReportEvent::PollAttempt {
            attempt,
            max_attempts,
        });
    }

    fn on_poll_finished(&self) {
        self.push(ReportEvent::PollFinished);
    }
}
