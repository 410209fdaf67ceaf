//! HTTP implementation of [`ReportApi`].
//!
//! Requests are made with a blocking `ureq` agent on tokio's blocking pool,
//! so each call is a single suspension point for the caller.
//!
//! Non-success statuses are not treated as transport errors by the agent;
//! the body is read first so it can be shown in [`ApiError::Http`].

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use ureq::Agent;

use super::{
    ApiError, ApiResult, DATA_PATH, HELP_PATH, RETRIEVE_PATH, ReportApi, SUBMIT_PATH,
};
use crate::config::ApiConfig;
use crate::model::{
    DataResponse, RetrieveRequest, RetrieveResponse, SubmitRequest, SubmitResponse, TestRecord,
};

/// Talks to the formatting API over HTTP.
#[derive(Clone)]
pub struct HttpApi {
    agent: Agent,
    base_url: String,
    target: String,
}

impl HttpApi {
    /// Creates a client for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();

        Self {
            agent: Agent::new_with_config(config),
            target: authority(&base_url),
            base_url,
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// `host:port` the client connects to.
    pub fn target(&self) -> &str {
        &self.target
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> ApiResult<String> {
        let agent = self.agent.clone();
        let url = self.url(path);
        let target = self.target.clone();
        debug!("GET {}", url);

        blocking(move || {
            let response = agent
                .get(&url)
                .call()
                .map_err(|e| transport_error(e, &target))?;
            read_body(response, &target)
        })
        .await
    }

    async fn post<B>(&self, path: &str, body: B) -> ApiResult<String>
    where
        B: Serialize + Send + 'static,
    {
        let agent = self.agent.clone();
        let url = self.url(path);
        let target = self.target.clone();
        debug!("POST {}", url);

        blocking(move || {
            let response = agent
                .post(&url)
                .send_json(&body)
                .map_err(|e| transport_error(e, &target))?;
            read_body(response, &target)
        })
        .await
    }
}

#[async_trait]
impl ReportApi for HttpApi {
    async fn fetch_data(&self) -> ApiResult<DataResponse> {
        let text = self.get(DATA_PATH).await?;
        decode(&text)
    }

    async fn submit(&self, tests: &[TestRecord]) -> ApiResult<SubmitResponse> {
        let body = SubmitRequest {
            tests: tests.to_vec(),
        };
        let text = self.post(SUBMIT_PATH, body).await?;
        decode(&text)
    }

    async fn retrieve(&self, id: &str) -> ApiResult<RetrieveResponse> {
        let body = RetrieveRequest { id: id.to_string() };
        let text = self.post(RETRIEVE_PATH, body).await?;
        decode(&text)
    }

    async fn help_text(&self) -> ApiResult<String> {
        self.get(HELP_PATH).await
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Task(e.to_string()))?
}

fn read_body(mut response: ureq::http::Response<ureq::Body>, target: &str) -> ApiResult<String> {
    let status = response.status();
    let text = response
        .body_mut()
        .read_to_string()
        .map_err(|e| transport_error(e, target))?;

    if !status.is_success() {
        return Err(ApiError::Http {
            status: status.as_u16(),
            body: body_value(&text),
        });
    }

    Ok(text)
}

fn decode<T: DeserializeOwned>(text: &str) -> ApiResult<T> {
    serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Error bodies are shown as JSON; plain-text bodies become a JSON string.
fn body_value(text: &str) -> serde_json::Value {
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::Value::String(text.to_string()))
}

fn transport_error(err: ureq::Error, target: &str) -> ApiError {
    if let ureq::Error::StatusCode(status) = err {
        return ApiError::Http {
            status,
            body: serde_json::Value::Null,
        };
    }

    let refused = match &err {
        ureq::Error::Io(e) => e.kind() == io::ErrorKind::ConnectionRefused,
        other => caused_by_refusal(other),
    };

    if refused {
        ApiError::ConnectionRefused {
            target: target.to_string(),
        }
    } else {
        ApiError::Transport(err.to_string())
    }
}

fn caused_by_refusal(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>()
            && io_err.kind() == io::ErrorKind::ConnectionRefused
        {
            return true;
        }
        current = e.source();
    }
    false
}

/// Extracts `host:port` from a base URL, filling in the scheme's default port.
pub fn authority(base_url: &str) -> String {
    let (scheme, rest) = match base_url.split_once("://") {
        Some((scheme, rest)) => (scheme, rest),
        None => ("http", base_url),
    };
    let host_port = rest.split('/').next().unwrap_or(rest);
    let host_port = host_port.rsplit('@').next().unwrap_or(host_port);

    let has_port = match host_port.rfind(':') {
        Some(idx) => !host_port[idx..].contains(']'),
        None => false,
    };

    if has_port {
        host_port.to_string()
    } else {
        let port = if scheme.eq_ignore_ascii_case("https") {
            443
        } else {
            80
        };
        format!("{}:{}", host_port, port)
    }
}
