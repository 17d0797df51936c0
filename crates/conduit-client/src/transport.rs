//! HTTP transport for Conduit calls.
//!
//! Every call is a single `POST {base}/api/{method}` whose form body holds
//! one field, `params`, carrying the JSON-encoded parameter map. There is
//! no retry: a failed round trip is returned to the caller as is.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use pc_domain::config::ConduitConfig;
use pc_domain::error::{Error, Result};
use pc_domain::trace::TraceEvent;
use reqwest::Client;
use serde_json::{Map, Value};
use tokio::sync::OnceCell;

use crate::envelope::CallEnvelope;

/// Named parameters of a single Conduit call.
pub type Params = Map<String, Value>;

/// Anything that can execute a Conduit method and hand back the decoded
/// `result` of its envelope.
///
/// Implementations may talk to a real Phabricator instance or be a test
/// double.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute `method` with `params`, returning the envelope's `result`.
    async fn call(&self, method: &str, params: Params) -> Result<Value>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// HTTP implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A reqwest-backed [`Transport`].
///
/// The `reqwest::Client` is built on the first call and reused for every
/// later one. It is released when the transport is dropped.
#[derive(Debug)]
pub struct HttpTransport {
    api_base: String,
    timeout: Option<Duration>,
    http: OnceCell<Client>,
}

impl HttpTransport {
    /// `base_url` is the instance root; trailing slashes are stripped.
    pub fn new(base_url: &str) -> Self {
        Self {
            api_base: format!("{}/api/", base_url.trim_end_matches('/')),
            timeout: None,
            http: OnceCell::new(),
        }
    }

    /// Build a transport from the shared `ConduitConfig`.
    pub fn from_config(cfg: &ConduitConfig) -> Self {
        let transport = Self::new(&cfg.base_url);
        match cfg.timeout_ms {
            Some(ms) => transport.with_timeout(Duration::from_millis(ms)),
            None => transport,
        }
    }

    /// Apply a per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Full URL for a method like `maniphest.info`.
    pub fn method_url(&self, method: &str) -> String {
        format!("{}{}", self.api_base, method)
    }

    async fn client(&self) -> Result<&Client> {
        self.http
            .get_or_try_init(|| async {
                tracing::trace!("creating new HTTP client");
                let mut builder = Client::builder();
                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }
                builder.build().map_err(|e| Error::Http(e.to_string()))
            })
            .await
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, method: &str, params: Params) -> Result<Value> {
        let url = self.method_url(method);
        let json = serde_json::to_string(&params)?;

        // Parameter values may contain the session key; only log names.
        tracing::trace!(
            method,
            params = ?params.keys().collect::<Vec<_>>(),
            "calling conduit method"
        );

        let http = self.client().await?;
        let start = Instant::now();
        let sent = http
            .post(&url)
            .form(&[("params", json.as_str())])
            .send()
            .await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let resp = match sent {
            Ok(resp) => resp,
            Err(e) => {
                TraceEvent::ConduitCall {
                    method: method.to_owned(),
                    status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                    duration_ms,
                }
                .emit();
                return Err(from_reqwest(e));
            }
        };

        let status = resp.status();
        TraceEvent::ConduitCall {
            method: method.to_owned(),
            status: status.as_u16(),
            duration_ms,
        }
        .emit();

        let body = resp.text().await.map_err(from_reqwest)?;
        tracing::trace!(method, body_len = body.len(), "conduit response received");

        let envelope = match CallEnvelope::parse(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(Error::Http(format!("{method} returned {status}: {body}")));
            }
            Err(e) => return Err(e),
        };
        envelope.into_result(method)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Error conversion helper
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Convert a `reqwest::Error` into a domain `Error`.
///
/// Timeout errors become `Error::Timeout`; everything else becomes
/// `Error::Http`.
pub fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}
