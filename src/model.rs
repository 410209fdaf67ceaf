//! Data types exchanged with the formatting API.
//!
//! # Wire Shapes
//!
//! ```text
//! GET  /data         ──► { "data": [TestRecord, ...] }
//! POST /test-format  { "tests": [TestRecord, ...] } ──► { "id": "job-123" }
//! POST /retrieve     { "id": "job-123" } ──► { "file": FormattedResult | null }
//! ```
//!
//! A [`FormattedResult`] maps a color group name to a [`StatusBucket`]:
//!
//! ```json
//! {
//!   "red": {
//!     "pass": [{ "id": 1, "value": "login", "color": "red", "status": "pass" }],
//!     "fail": [],
//!     "pending": [],
//!     "skipped": []
//!   }
//! }
//! ```

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Outcome of a single test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Pass,
    Fail,
    Pending,
    Skipped,
}

impl TestStatus {
    /// All statuses, in the order reports list them.
    pub const ALL: [TestStatus; 4] = [
        TestStatus::Pass,
        TestStatus::Fail,
        TestStatus::Pending,
        TestStatus::Skipped,
    ];

    /// Lower-case wire name of the status.
    pub fn label(self) -> &'static str {
        match self {
            TestStatus::Pass => "pass",
            TestStatus::Fail => "fail",
            TestStatus::Pending => "pending",
            TestStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One test outcome as served by the data endpoint.
///
/// `error_details` is only expected on failed tests, but nothing enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRecord {
    pub id: i64,
    pub value: String,
    pub color: String,
    pub status: TestStatus,
    #[serde(
        rename = "errorDetails",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub error_details: Option<String>,
}

impl TestRecord {
    /// Creates a record without error details.
    pub fn new(
        id: i64,
        value: impl Into<String>,
        color: impl Into<String>,
        status: TestStatus,
    ) -> Self {
        Self {
            id,
            value: value.into(),
            color: color.into(),
            status,
            error_details: None,
        }
    }

    /// Attaches error details to the record.
    pub fn with_error_details(mut self, details: impl Into<String>) -> Self {
        self.error_details = Some(details.into());
        self
    }
}

/// Records of one color group, partitioned by status.
///
/// Categories missing from the payload deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBucket {
    #[serde(default)]
    pub pass: Vec<TestRecord>,
    #[serde(default)]
    pub fail: Vec<TestRecord>,
    #[serde(default)]
    pub pending: Vec<TestRecord>,
    #[serde(default)]
    pub skipped: Vec<TestRecord>,
}

impl StatusBucket {
    /// Records filed under `status`.
    pub fn records(&self, status: TestStatus) -> &[TestRecord] {
        match status {
            TestStatus::Pass => &self.pass,
            TestStatus::Fail => &self.fail,
            TestStatus::Pending => &self.pending,
            TestStatus::Skipped => &self.skipped,
        }
    }

    /// Files a record under its own status.
    pub fn push(&mut self, record: TestRecord) {
        match record.status {
            TestStatus::Pass => self.pass.push(record),
            TestStatus::Fail => self.fail.push(record),
            TestStatus::Pending => self.pending.push(record),
            TestStatus::Skipped => self.skipped.push(record),
        }
    }

    pub fn is_empty(&self) -> bool {
        TestStatus::ALL.iter().all(|s| self.records(*s).is_empty())
    }
}

/// The formatted report: color group name to status bucket.
///
/// Key order is the order in which groups appeared in the response.
pub type FormattedResult = IndexMap<String, StatusBucket>;

/// Response body of `GET /data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse {
    pub data: Vec<TestRecord>,
}

/// Request body of `POST /test-format`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub tests: Vec<TestRecord>,
}

/// Response body of `POST /test-format`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub id: Option<String>,
}

impl SubmitResponse {
    /// The job id, if the server returned a non-empty one.
    pub fn job_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Request body of `POST /retrieve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveRequest {
    pub id: String,
}

/// Response body of `POST /retrieve`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrieveResponse {
    #[serde(default)]
    pub file: Option<FormattedResult>,
}

impl RetrieveResponse {
    /// Consumes the response, yielding the result once the job has produced one.
    ///
    /// An empty object counts as produced; it renders as "no data".
    pub fn into_result(self) -> Option<FormattedResult> {
        self.file
    }
}
