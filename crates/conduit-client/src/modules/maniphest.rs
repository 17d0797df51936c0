//! `maniphest.*` methods: tasks and their transactions.

use std::collections::HashMap;

use pc_domain::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::modules::{single_param, to_params, ModuleContext};
use crate::wire;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Requests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// `maniphest.createtask` parameters. Only `title` is required.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "ownerPHID", skip_serializing_if = "Option::is_none")]
    pub owner_phid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_policy: Option<String>,
    #[serde(rename = "ccPHIDs", skip_serializing_if = "Option::is_none")]
    pub cc_phids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(rename = "projectPHIDs", skip_serializing_if = "Option::is_none")]
    pub project_phids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auxiliary: Option<HashMap<String, String>>,
}

impl CreateTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// `maniphest.update` parameters. Identify the task by `id` or `phid`;
/// every other field left as `None` is not sent and stays unchanged.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "ownerPHID", skip_serializing_if = "Option::is_none")]
    pub owner_phid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_policy: Option<String>,
    #[serde(rename = "ccPHIDs", skip_serializing_if = "Option::is_none")]
    pub cc_phids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(rename = "projectPHIDs", skip_serializing_if = "Option::is_none")]
    pub project_phids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auxiliary: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl UpdateTask {
    /// Update the task with numeric id `id`.
    pub fn by_id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Add `comment` to task `id` and change nothing else.
    pub fn comment(id: i64, comment: impl Into<String>) -> Self {
        Self {
            comments: Some(comment.into()),
            ..Self::by_id(id)
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Results
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A task as returned by `maniphest.info`, `maniphest.createtask` and
/// `maniphest.update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default, deserialize_with = "wire::int")]
    pub id: i64,
    #[serde(default)]
    pub phid: String,
    #[serde(rename = "authorPHID", default)]
    pub author_phid: Option<String>,
    #[serde(rename = "ownerPHID", default)]
    pub owner_phid: Option<String>,
    #[serde(rename = "ccPHIDs", default, deserialize_with = "wire::list")]
    pub cc_phids: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_name: Option<String>,
    #[serde(default)]
    pub is_closed: Option<bool>,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub priority: Option<String>,
    #[serde(default)]
    pub priority_color: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "projectPHIDs", default, deserialize_with = "wire::list")]
    pub project_phids: Vec<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default, deserialize_with = "wire::map")]
    pub auxiliary: HashMap<String, Value>,
    #[serde(default)]
    pub object_name: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub date_created: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub date_modified: Option<String>,
    #[serde(rename = "dependsOnTaskPHIDs", default, deserialize_with = "wire::list")]
    pub depends_on_task_phids: Vec<String>,
}

impl Task {
    /// `dateCreated` as Unix seconds.
    pub fn created_at(&self) -> Option<i64> {
        self.date_created.as_deref().and_then(|s| s.parse().ok())
    }

    /// `dateModified` as Unix seconds.
    pub fn modified_at(&self) -> Option<i64> {
        self.date_modified.as_deref().and_then(|s| s.parse().ok())
    }
}

/// One entry of `maniphest.gettasktransactions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskTransaction {
    #[serde(rename = "taskID", default, deserialize_with = "wire::opt_string")]
    pub task_id: Option<String>,
    #[serde(rename = "transactionPHID", default)]
    pub transaction_phid: Option<String>,
    #[serde(default)]
    pub transaction_type: Option<String>,
    #[serde(default)]
    pub old_value: Value,
    #[serde(default)]
    pub new_value: Value,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(rename = "authorPHID", default)]
    pub author_phid: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_string")]
    pub date_created: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Module
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Methods starting with `maniphest.`.
#[derive(Clone)]
pub struct ManiphestModule {
    ctx: ModuleContext,
}

impl ManiphestModule {
    pub fn new(ctx: ModuleContext) -> Self {
        Self { ctx }
    }

    /// `maniphest.createtask`.
    pub async fn create_task(&self, task: &CreateTask) -> Result<Task> {
        self.ctx
            .call_authenticated("maniphest.createtask", to_params(task)?)
            .await
    }

    /// `maniphest.gettasktransactions`, keyed by task id.
    pub async fn get_task_transactions(
        &self,
        ids: &[i64],
    ) -> Result<HashMap<String, Vec<TaskTransaction>>> {
        let value: Value = self
            .ctx
            .call_authenticated("maniphest.gettasktransactions", single_param("ids", ids)?)
            .await?;
        Ok(wire::map(value)?)
    }

    /// `maniphest.info` for task `T{task_id}`.
    pub async fn info(&self, task_id: i64) -> Result<Task> {
        self.ctx
            .call_authenticated("maniphest.info", single_param("task_id", task_id)?)
            .await
    }

    /// `maniphest.update`.
    pub async fn update(&self, update: &UpdateTask) -> Result<Task> {
        self.ctx
            .call_authenticated("maniphest.update", to_params(update)?)
            .await
    }
}
