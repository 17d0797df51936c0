//! `user.*` methods.

use pc_domain::error::Result;
use serde::{Deserialize, Serialize};

use crate::modules::ModuleContext;
use crate::transport::Params;
use crate::wire;

/// `user.whoami`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoAmI {
    pub phid: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default, deserialize_with = "wire::list")]
    pub roles: Vec<String>,
    #[serde(default)]
    pub primary_email: Option<String>,
}

/// Methods starting with `user.`.
#[derive(Clone)]
pub struct UserModule {
    ctx: ModuleContext,
}

impl UserModule {
    pub fn new(ctx: ModuleContext) -> Self {
        Self { ctx }
    }

    /// `user.whoami`: the user the session belongs to.
    pub async fn whoami(&self) -> Result<WhoAmI> {
        self.ctx.call_authenticated("user.whoami", Params::new()).await
    }
}
