//! `phid.*` methods: resolving names and PHIDs to object handles.

use std::collections::HashMap;

use pc_domain::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::modules::{single_param, ModuleContext};
use crate::wire;

/// Handle information for one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhidInfo {
    pub phid: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub type_name: Option<String>,
    /// Four-letter type constant such as `TASK` or `USER`.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Methods starting with `phid.`.
#[derive(Clone)]
pub struct PhidModule {
    ctx: ModuleContext,
}

impl PhidModule {
    pub fn new(ctx: ModuleContext) -> Self {
        Self { ctx }
    }

    /// `phid.lookup`: resolve names like `T85` or `@alice`. Keys of the
    /// result are the names that could be resolved.
    pub async fn lookup<S>(&self, names: &[S]) -> Result<HashMap<String, PhidInfo>>
    where
        S: AsRef<str> + Sync,
    {
        let names: Vec<&str> = names.iter().map(|s| s.as_ref()).collect();
        self.fetch("phid.lookup", "names", &names).await
    }

    /// `phid.query`: fetch handles for PHIDs, keyed by PHID.
    pub async fn query<S>(&self, phids: &[S]) -> Result<HashMap<String, PhidInfo>>
    where
        S: AsRef<str> + Sync,
    {
        let phids: Vec<&str> = phids.iter().map(|s| s.as_ref()).collect();
        self.fetch("phid.query", "phids", &phids).await
    }

    async fn fetch(
        &self,
        method: &str,
        param: &str,
        values: &[&str],
    ) -> Result<HashMap<String, PhidInfo>> {
        let value: Value = self
            .ctx
            .call_authenticated(method, single_param(param, values)?)
            .await?;
        Ok(wire::map(value)?)
    }
}
