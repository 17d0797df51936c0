//! `differential.*` methods.

use std::collections::HashMap;

use pc_domain::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::modules::{single_param, to_params, ModuleContext};
use crate::wire;

/// `differential.query` filters.
///
/// `paths` and `commit_hashes` are pairs: `(repository callsign, path)` and
/// `(hash type, hash)` respectively, e.g. `("gtcm", "d41d8cd9...")`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ccs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<Vec<(String, String)>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_hashes: Option<Vec<(String, String)>>,
    /// e.g. `status-open`, `status-accepted`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// e.g. `order-modified`, `order-created`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscribers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsible_users: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branches: Option<Vec<String>>,
}

impl RevisionQuery {
    pub fn by_ids(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            ids: Some(ids.into_iter().collect()),
            ..Self::default()
        }
    }
}

/// One revision from `differential.query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    #[serde(deserialize_with = "wire::int")]
    pub id: i64,
    pub phid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub date_created: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub date_modified: Option<String>,
    #[serde(rename = "authorPHID", default)]
    pub author_phid: Option<String>,
    #[serde(default, deserialize_with = "wire::int")]
    pub status: i64,
    #[serde(default)]
    pub status_name: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub test_plan: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_int")]
    pub line_count: Option<i64>,
    #[serde(rename = "activeDiffPHID", default)]
    pub active_diff_phid: Option<String>,
    #[serde(default, deserialize_with = "wire::int_list")]
    pub diffs: Vec<i64>,
    #[serde(default, deserialize_with = "wire::list")]
    pub commits: Vec<String>,
    #[serde(default, deserialize_with = "wire::list")]
    pub reviewers: Vec<String>,
    #[serde(default, deserialize_with = "wire::list")]
    pub ccs: Vec<String>,
    /// `[type, hash]` pairs as sent by the server.
    #[serde(default, deserialize_with = "wire::list")]
    pub hashes: Vec<Value>,
    #[serde(default, deserialize_with = "wire::map")]
    pub auxiliary: HashMap<String, Value>,
    #[serde(rename = "repositoryPHID", default)]
    pub repository_phid: Option<String>,
}

impl Revision {
    /// Highest diff id attached to the revision, if any.
    pub fn latest_diff(&self) -> Option<i64> {
        self.diffs.iter().copied().max()
    }
}

/// Methods starting with `differential.`.
#[derive(Clone)]
pub struct DifferentialModule {
    ctx: ModuleContext,
}

impl DifferentialModule {
    pub fn new(ctx: ModuleContext) -> Self {
        Self { ctx }
    }

    /// `differential.query`. Older servers return an object keyed by
    /// position instead of a list; both decode to the same order.
    pub async fn query(&self, query: &RevisionQuery) -> Result<Vec<Revision>> {
        let value: Value = self
            .ctx
            .call_authenticated("differential.query", to_params(query)?)
            .await?;
        Ok(wire::seq(value)?)
    }

    /// `differential.getrawdiff`: the unified diff text of one diff.
    pub async fn get_raw_diff(&self, diff_id: i64) -> Result<String> {
        self.ctx
            .call_authenticated("differential.getrawdiff", single_param("diffID", diff_id)?)
            .await
    }
}
