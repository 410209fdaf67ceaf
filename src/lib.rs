//! huecheck: a client for an asynchronous test-report formatting API.
//!
//! Fetches test records, keeps the ones of the requested colors, submits
//! them as a formatting job, polls until the job's report is ready and
//! renders it for the terminal.
//!
//! # Architecture
//!
//! The main components are:
//!
//! - **Filter**: Narrow records to the requested colors ([`filter`])
//! - **Renderer**: Turn a formatted report into display lines ([`render`])
//! - **Diagnostics**: Classify failures for display ([`diagnostic`])
//! - **Orchestrator**: Drive fetch → filter → submit → poll → render ([`orchestrator`])
//! - **API**: The remote calls, behind the [`api::ReportApi`] trait ([`api`])
//!
//! # Example
//!
//! ```no_run
//! use huecheck::api::HttpApi;
//! use huecheck::config::load_config_str;
//! use huecheck::orchestrator::JobOrchestrator;
//! use huecheck::report::ConsoleReporter;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config_str("")?;
//!     let api = HttpApi::from_config(&config.api);
//!     let orchestrator = JobOrchestrator::new(api, ConsoleReporter::new(), config.poll);
//!     orchestrator.run(&["red"]).await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod diagnostic;
pub mod filter;
pub mod model;
pub mod orchestrator;
pub mod render;
pub mod report;
pub mod shell;

// Re-export commonly used types
pub use api::{ApiError, HttpApi, ReportApi};
pub use config::{Config, load_config};
pub use diagnostic::{Diagnostic, Fault, classify};
pub use filter::filter_by_colors;
pub use model::{FormattedResult, StatusBucket, TestRecord, TestStatus};
pub use orchestrator::{JobOrchestrator, RunOutcome};
pub use render::Renderer;
pub use report::Reporter;
