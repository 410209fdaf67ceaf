//! Client abstraction for the remote formatting API.
//!
//! The orchestrator talks to the API only through the [`ReportApi`] trait,
//! which keeps the job pipeline independent of the HTTP stack.
//!
//! # Endpoints
//!
//! | Call | Method | Path | Body | Response |
//! |------|--------|------|------|----------|
//! | [`fetch_data`](ReportApi::fetch_data) | GET | `/data` | - | [`DataResponse`] |
//! | [`submit`](ReportApi::submit) | POST | `/test-format` | [`SubmitRequest`] | [`SubmitResponse`] |
//! | [`retrieve`](ReportApi::retrieve) | POST | `/retrieve` | [`RetrieveRequest`] | [`RetrieveResponse`] |
//! | [`help_text`](ReportApi::help_text) | GET | `/help` | - | plain text |
//!
//! # Error Handling
//!
//! All calls return [`ApiResult<T>`]. Transport failures are split into the
//! categories the diagnostics layer reports differently: an unreachable
//! endpoint ([`ApiError::ConnectionRefused`]) and a non-success HTTP status
//! ([`ApiError::Http`]).

pub mod http;

use async_trait::async_trait;

use crate::model::{DataResponse, RetrieveResponse, SubmitResponse, TestRecord};

pub use http::HttpApi;

pub const DATA_PATH: &str = "/data";
pub const SUBMIT_PATH: &str = "/test-format";
pub const RETRIEVE_PATH: &str = "/retrieve";
pub const HELP_PATH: &str = "/help";

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors raised by API calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Nothing is listening at the configured address.
    #[error("Connection refused by {target}")]
    ConnectionRefused { target: String },

    /// The server answered with a non-success status.
    ///
    /// `body` holds the response body as JSON, or as a JSON string when the
    /// body was not JSON.
    #[error("Request failed with status code {status}")]
    Http {
        status: u16,
        body: serde_json::Value,
    },

    /// Any other transport failure (DNS, timeout, protocol).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response body did not have the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The blocking worker running the request went away.
    #[error("Request task failed: {0}")]
    Task(String),
}

/// The remote formatting API.
#[async_trait]
pub trait ReportApi: Send + Sync {
    /// Fetches the full list of test records.
    async fn fetch_data(&self) -> ApiResult<DataResponse>;

    /// Submits a batch of records for formatting.
    async fn submit(&self, tests: &[TestRecord]) -> ApiResult<SubmitResponse>;

    /// Asks whether the job `id` has produced its result.
    async fn retrieve(&self, id: &str) -> ApiResult<RetrieveResponse>;

    /// Fetches the server's plain-text help.
    async fn help_text(&self) -> ApiResult<String>;

    /// Base URL the client talks to (for logging).
    fn base_url(&self) -> &str;
}
