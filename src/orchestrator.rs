//! Job orchestration: fetch, filter, submit, poll, render.
//!
//! # Execution Flow
//!
//! ```text
//!   Idle ──► Fetching ──► Filtering ──► Submitting ──► Polling(1..=N) ──► Rendering
//!               │             │              │               │
//!               │             └─► NoMatches  │               ├─► TimedOut
//!               └──────────────┬─────────────┴───────────────┘
//!                              ▼
//!                           Failed
//! ```
//!
//! 1. **Fetching**: one `GET /data`
//! 2. **Filtering**: keep records of the requested colors; no match ends the
//!    run with a warning and nothing is submitted
//! 3. **Submitting**: one `POST /test-format`; a response without a job id is
//!    a failure
//! 4. **Polling**: `POST /retrieve` until a result arrives or the attempt
//!    ceiling is reached, sleeping the poll interval between attempts
//! 5. **Rendering**: render the result to the log stream
//!
//! Calls are strictly sequential and the first failure ends the run. Every
//! failure is classified once (see [`crate::diagnostic`]) and reported;
//! [`JobOrchestrator::run`] itself never fails.

pub mod poll;

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

use crate::api::{ApiError, ReportApi};
use crate::config::PollConfig;
use crate::diagnostic::{Diagnostic, Fault, classify};
use crate::filter::filter_by_colors;
use crate::model::FormattedResult;
use crate::render::Renderer;
use crate::report::Reporter;

pub use poll::{PollEffect, PollEvent, PollState, transition};

pub const JOB_ID_MISSING_MESSAGE: &str = "Job ID missing from submission response";
pub const CANCELLED_MESSAGE: &str = "Run cancelled";

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The report was produced and written to the log stream.
    Rendered { job_id: String, output: String },
    /// No fetched record matched the requested colors.
    NoMatches { colors: Vec<String> },
    /// The run failed; the diagnostic was written to the error stream.
    Failed(Diagnostic),
    /// The cancellation token fired before the run finished.
    Cancelled,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Rendered { .. } | RunOutcome::NoMatches { .. })
    }
}

/// Why a run stopped early.
enum Halt {
    Cancelled,
    Failed(Fault),
}

impl From<ApiError> for Halt {
    fn from(err: ApiError) -> Self {
        Halt::Failed(Fault::from(err))
    }
}

impl From<Fault> for Halt {
    fn from(fault: Fault) -> Self {
        Halt::Failed(fault)
    }
}

enum Completion {
    Rendered { job_id: String, output: String },
    NoMatches,
}

/// Drives one job through the formatting API.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use huecheck::api::HttpApi;
/// use huecheck::config::PollConfig;
/// use huecheck::orchestrator::JobOrchestrator;
/// use huecheck::report::ConsoleReporter;
///
/// # async fn example() {
/// let api = HttpApi::new("http://localhost:3000", Duration::from_secs(30));
/// let orchestrator = JobOrchestrator::new(api, ConsoleReporter::new(), PollConfig::default());
///
/// let outcome = orchestrator.run(&["red", "blue"]).await;
/// println!("success: {}", outcome.is_success());
/// # }
/// ```
pub struct JobOrchestrator<A, R> {
    api: A,
    reporter: R,
    poll: PollConfig,
    renderer: Renderer,
    cancellation_token: Option<CancellationToken>,
}

impl<A, R> JobOrchestrator<A, R>
where
    A: ReportApi,
    R: Reporter,
{
    pub fn new(api: A, reporter: R, poll: PollConfig) -> Self {
        Self {
            api,
            reporter,
            poll,
            renderer: Renderer::default(),
            cancellation_token: None,
        }
    }

    /// Sets the renderer used for the final report.
    pub fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Sets a cancellation token checked at every network call and delay.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Runs the whole pipeline for `colors`.
    ///
    /// Never fails: failures are classified, reported, and returned as
    /// [`RunOutcome::Failed`]. Panics inside the run are caught and reported
    /// as unknown errors.
    pub async fn run<S: AsRef<str>>(&self, colors: &[S]) -> RunOutcome {
        let colors: Vec<String> = colors.iter().map(|c| c.as_ref().to_string()).collect();
        let span = info_span!("run", run_id = %Uuid::new_v4());

        let result = AssertUnwindSafe(self.execute(&colors))
            .catch_unwind()
            .instrument(span)
            .await;

        match result {
            Ok(Ok(Completion::Rendered { job_id, output })) => {
                self.reporter.on_log(&output);
                RunOutcome::Rendered { job_id, output }
            }
            Ok(Ok(Completion::NoMatches)) => {
                info!("No records matched {:?}", colors);
                self.reporter
                    .on_warning(&format!("No records matched colors: {}", colors.join(", ")));
                RunOutcome::NoMatches { colors }
            }
            Ok(Err(Halt::Cancelled)) => {
                info!("Run cancelled");
                self.reporter.on_warning(CANCELLED_MESSAGE);
                RunOutcome::Cancelled
            }
            Ok(Err(Halt::Failed(fault))) => self.fail(fault),
            Err(payload) => self.fail(Fault::from_panic(payload)),
        }
    }

    async fn execute(&self, colors: &[String]) -> Result<Completion, Halt> {
        info!("Fetching test data from {}", self.api.base_url());
        let data = self.guard(self.api.fetch_data()).await??;
        debug!("Fetched {} records", data.data.len());

        let batch = filter_by_colors(&data.data, colors);
        if batch.is_empty() {
            return Ok(Completion::NoMatches);
        }
        info!("Submitting {} of {} records", batch.len(), data.data.len());

        let submitted = self.guard(self.api.submit(&batch)).await??;
        let job_id = submitted
            .job_id()
            .ok_or_else(|| Fault::message(JOB_ID_MISSING_MESSAGE))?
            .to_string();
        self.reporter.on_log(&format!("Job ID: {}", job_id));

        let result = self.poll_result(&job_id).await?;
        let output = self.renderer.render(Some(&result));

        Ok(Completion::Rendered { job_id, output })
    }

    async fn poll_result(&self, job_id: &str) -> Result<FormattedResult, Halt> {
        let result = self.poll_loop(job_id).await;
        self.reporter.on_poll_finished();
        result
    }

    async fn poll_loop(&self, job_id: &str) -> Result<FormattedResult, Halt> {
        let max_attempts = self.poll.max_attempts;
        let mut state = PollState::start();

        while let PollState::Polling { attempt } = state {
            self.reporter.on_poll_attempt(attempt, max_attempts);
            debug!("Polling job {} (attempt {}/{})", job_id, attempt, max_attempts);

            let response = self.guard(self.api.retrieve(job_id)).await??;
            let event = match response.into_result() {
                Some(result) => PollEvent::Ready(result),
                None => PollEvent::NotReady,
            };

            let (next, effect) = transition(state, event, max_attempts);
            state = next;

            match effect {
                PollEffect::Deliver(result) => {
                    info!("Job {} finished after {} attempt(s)", job_id, attempt);
                    return Ok(result);
                }
                PollEffect::Wait { .. } => {
                    self.guard(tokio::time::sleep(self.poll.interval())).await?;
                }
                PollEffect::GiveUp { attempts } => {
                    return Err(Fault::message(format!(
                        "Polling timed out after {} attempts",
                        attempts
                    ))
                    .into());
                }
                PollEffect::Ignore => {}
            }
        }

        Err(Fault::message(format!("Polling stopped in unexpected state {:?}", state)).into())
    }

    /// Awaits `fut`, unless the cancellation token fires first.
    async fn guard<F, T>(&self, fut: F) -> Result<T, Halt>
    where
        F: Future<Output = T>,
    {
        match &self.cancellation_token {
            Some(token) => select! {
                biased;
                _ = token.cancelled() => Err(Halt::Cancelled),
                value = fut => Ok(value),
            },
            None => Ok(fut.await),
        }
    }

    fn fail(&self, fault: Fault) -> RunOutcome {
        let diagnostic = classify(&fault);
        match &diagnostic {
            Diagnostic::Unknown { raw } => debug!(kind = diagnostic.kind(), raw = %raw, "Run failed"),
            _ => debug!(kind = diagnostic.kind(), "Run failed"),
        }
        self.reporter.on_error(&diagnostic);
        RunOutcome::Failed(diagnostic)
    }
}
