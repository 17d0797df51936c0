//! Per-area endpoint modules.
//!
//! Each module wraps the Conduit methods sharing a prefix (`maniphest.`,
//! `project.`, ...). They all go through a [`ModuleContext`], which pairs
//! the transport with the session handler.

pub mod conduit;
pub mod differential;
pub mod maniphest;
pub mod phid;
pub mod project;
pub mod user;

use std::sync::Arc;

use pc_domain::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::modules::conduit::ConnectResult;
use crate::session::SessionHandler;
use crate::transport::{Params, Transport};

/// Transport plus session handler, shared by every module of a client.
#[derive(Clone)]
pub struct ModuleContext {
    transport: Arc<dyn Transport>,
    session: Arc<dyn SessionHandler>,
}

impl ModuleContext {
    pub fn new(transport: Arc<dyn Transport>, session: Arc<dyn SessionHandler>) -> Self {
        Self { transport, session }
    }

    /// Call a method that needs no session (e.g. `conduit.ping`).
    pub async fn call_anonymous<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Params,
    ) -> Result<T> {
        let value = self.transport.call(method, params).await?;
        decode(method, value)
    }

    /// Fill in the session, then call `method`.
    pub async fn call_authenticated<T: DeserializeOwned>(
        &self,
        method: &str,
        mut params: Params,
    ) -> Result<T> {
        self.session.fill_in_session(&mut params).await?;
        let value = self.transport.call(method, params).await?;
        decode(method, value)
    }

    /// Open a session through the session handler.
    pub async fn connect(&self) -> Result<ConnectResult> {
        self.session.connect().await
    }
}

fn decode<T: DeserializeOwned>(method: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        tracing::debug!(method, error = %e, "conduit result did not match expected shape");
        Error::Json(e)
    })
}

/// Serialize a request struct into a parameter map.
pub(crate) fn to_params<S: Serialize>(request: &S) -> Result<Params> {
    match serde_json::to_value(request)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::Other(format!(
            "request parameters must serialize to an object, got {other}"
        ))),
    }
}

/// Build a parameter map with one entry.
pub(crate) fn single_param(name: &str, value: impl Serialize) -> Result<Params> {
    let mut params = Params::new();
    params.insert(name.to_owned(), serde_json::to_value(value)?);
    Ok(params)
}
