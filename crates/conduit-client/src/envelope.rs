//! The `{result, error_code, error_info}` wrapper around every Conduit
//! response, including the `conduit.connect` handshake.

use pc_domain::error::{Error, Result};
use serde::Deserialize;
use serde_json::Value;

/// Wire envelope returned by every Conduit method.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CallEnvelope {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_info: Option<String>,
}

impl CallEnvelope {
    /// Parse a raw response body.
    pub fn parse(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Either error field being non-null marks the call as failed.
    pub fn is_error(&self) -> bool {
        self.error_code.is_some() || self.error_info.is_some()
    }

    /// Extract the result payload, or the remote error for `method`.
    ///
    /// A successful envelope without a `result` yields JSON `null`.
    pub fn into_result(self, method: &str) -> Result<Value> {
        if self.is_error() {
            return Err(Error::Conduit {
                method: method.to_owned(),
                code: self.error_code,
                info: self.error_info,
            });
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}
