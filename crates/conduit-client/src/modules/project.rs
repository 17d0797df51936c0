//! `project.*` methods.

use std::collections::HashMap;

use pc_domain::error::Result;
use serde::{Deserialize, Serialize};

use crate::modules::{to_params, ModuleContext};
use crate::wire;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Requests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// `project.create` parameters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateProject {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl CreateProject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// `project.query` filters. All are optional; an empty query lists
/// every visible project (subject to `limit`).
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slugs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icons: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    /// e.g. `status-any`, `status-open`, `status-closed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Results
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default, deserialize_with = "wire::int")]
    pub id: i64,
    #[serde(default)]
    pub phid: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "profileImagePHID", default)]
    pub profile_image_phid: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "wire::list")]
    pub members: Vec<String>,
    #[serde(default, deserialize_with = "wire::list")]
    pub slugs: Vec<String>,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub date_created: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub date_modified: Option<String>,
}

/// Paging state of a `project.query` result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    #[serde(default, deserialize_with = "wire::opt_int")]
    pub limit: Option<i64>,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub after: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub before: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectQueryResult {
    /// Keyed by project PHID.
    #[serde(default, deserialize_with = "wire::map")]
    pub data: HashMap<String, Project>,
    /// Slug to project PHID.
    #[serde(default, deserialize_with = "wire::map")]
    pub slug_map: HashMap<String, String>,
    #[serde(default)]
    pub cursor: Cursor,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Module
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Methods starting with `project.`.
#[derive(Clone)]
pub struct ProjectModule {
    ctx: ModuleContext,
}

impl ProjectModule {
    pub fn new(ctx: ModuleContext) -> Self {
        Self { ctx }
    }

    /// `project.create`.
    pub async fn create(&self, project: &CreateProject) -> Result<Project> {
        self.ctx
            .call_authenticated("project.create", to_params(project)?)
            .await
    }

    /// `project.query`.
    pub async fn query(&self, query: &ProjectQuery) -> Result<ProjectQueryResult> {
        self.ctx
            .call_authenticated("project.query", to_params(query)?)
            .await
    }
}
