//! Classification of run failures into user-facing diagnostics.
//!
//! Every failure of an orchestration run is funneled through [`classify`]
//! exactly once. The decision order is fixed:
//!
//! 1. API connection refused → one line naming the unreachable `host:port`
//! 2. API HTTP error → status code and the JSON-serialized response body
//! 3. Any other error → its message, verbatim
//! 4. A non-error value (e.g. a panic payload) → a generic line plus the raw value

use std::any::Any;
use std::fmt;

use crate::api::ApiError;

/// Something that went wrong during a run.
#[derive(Debug)]
pub enum Fault {
    /// A regular error.
    Error(anyhow::Error),
    /// An opaque value that is not an error, kept as text.
    Value(String),
}

impl Fault {
    /// Wraps a panic payload. String payloads keep their text.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let raw = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "<non-string panic payload>".to_string()
        };
        Fault::Value(raw)
    }

    /// A failure described only by a message.
    pub fn message(msg: impl fmt::Display) -> Self {
        Fault::Error(anyhow::anyhow!("{}", msg))
    }
}

impl From<anyhow::Error> for Fault {
    fn from(err: anyhow::Error) -> Self {
        Fault::Error(err)
    }
}

impl From<ApiError> for Fault {
    fn from(err: ApiError) -> Self {
        Fault::Error(err.into())
    }
}

/// A classified failure, ready to print.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// The API endpoint could not be reached.
    ConnectionRefused { target: String },
    /// The API answered with a non-success status.
    Http {
        status: u16,
        body: serde_json::Value,
    },
    /// A failure with a message.
    Message(String),
    /// An opaque value; `raw` is kept separate from the generic text.
    Unknown { raw: String },
}

pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";

impl Diagnostic {
    /// The units to emit, in order.
    ///
    /// [`Diagnostic::Unknown`] yields two units so the raw value can be
    /// inspected apart from the generic text.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Diagnostic::ConnectionRefused { target } => vec![format!(
                "Error: Unable to connect to the API at {}. Is the server running?",
                target
            )],
            Diagnostic::Http { status, body } => vec![format!(
                "Error: API responded with status {}: {}",
                status,
                serde_json::to_string(body).unwrap_or_else(|_| body.to_string())
            )],
            Diagnostic::Message(msg) => vec![format!("Error: {}", msg)],
            Diagnostic::Unknown { raw } => {
                vec![format!("Error: {}", UNKNOWN_ERROR_MESSAGE), raw.clone()]
            }
        }
    }

    /// Short category name, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Diagnostic::ConnectionRefused { .. } => "connection_refused",
            Diagnostic::Http { .. } => "http",
            Diagnostic::Message(_) => "message",
            Diagnostic::Unknown { .. } => "unknown",
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}

/// Classifies a fault. First matching rule wins.
pub fn classify(fault: &Fault) -> Diagnostic {
    let err = match fault {
        Fault::Value(raw) => return Diagnostic::Unknown { raw: raw.clone() },
        Fault::Error(err) => err,
    };

    match err.downcast_ref::<ApiError>() {
        Some(ApiError::ConnectionRefused { target }) => Diagnostic::ConnectionRefused {
            target: target.clone(),
        },
        Some(ApiError::Http { status, body }) => Diagnostic::Http {
            status: *status,
            body: body.clone(),
        },
        _ => Diagnostic::Message(format!("{:#}", err)),
    }
}
