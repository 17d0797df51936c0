//! In-memory transport for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pc_domain::error::{Error, Result};
use serde_json::{json, Value};

use crate::transport::{Params, Transport};

/// Replays queued results in order and records every call it receives.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<Value>>>,
    calls: Mutex<Vec<(String, Params)>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn push_ok(&self, result: Value) {
        self.responses.lock().unwrap().push_back(Ok(result));
    }

    pub(crate) fn push_err(&self, err: Error) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    pub(crate) fn calls(&self) -> Vec<(String, Params)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|(method, _)| method).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn call(&self, method: &str, params: Params) -> Result<Value> {
        self.calls.lock().unwrap().push((method.to_owned(), params));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Other(format!("no scripted response for {method}"))))
    }
}

/// A `conduit.connect` result carrying `session_key`.
pub(crate) fn connect_ok(session_key: &str) -> Value {
    json!({
        "connectionID": 1,
        "sessionKey": session_key,
        "userPHID": "PHID-USER-alice"
    })
}
