//! `pc-conduit`: typed client for Phabricator's Conduit API.
//!
//! Provides the [`Transport`] trait with an HTTP implementation
//! ([`HttpTransport`]), the [`OnDemandSessionHandler`] that opens and
//! caches a Conduit session on first use, and typed wrappers for the
//! supported method families.
//!
//! | Module                        | Methods                                                        |
//! |-------------------------------|----------------------------------------------------------------|
//! | [`modules::conduit`]          | `ping`, `connect`, `getcapabilities`, `getcertificate`, `query` |
//! | [`modules::maniphest`]        | `createtask`, `gettasktransactions`, `info`, `update`          |
//! | [`modules::project`]          | `create`, `query`                                              |
//! | [`modules::user`]             | `whoami`                                                       |
//! | [`modules::phid`]             | `lookup`, `query`                                              |
//! | [`modules::differential`]     | `query`, `getrawdiff`                                          |
//!
//! # Quick start
//!
//! ```rust,no_run
//! use pc_conduit::{Conduit, Credentials};
//! use pc_conduit::modules::maniphest::UpdateTask;
//!
//! # async fn example() -> pc_domain::error::Result<()> {
//! let conduit = Conduit::new(
//!     "https://phabricator.example.org",
//!     Credentials::new("alice", "certificate-from-settings"),
//! );
//!
//! println!("server: {}", conduit.conduit.ping().await?.hostname);
//!
//! let task = conduit.maniphest.info(85).await?;
//! println!("T{}: {}", task.id, task.title);
//!
//! conduit.maniphest.update(&UpdateTask::comment(85, "Deployed.")).await?;
//! # Ok(())
//! # }
//! ```

pub mod envelope;
pub mod modules;
pub mod session;
pub mod signature;
pub mod transport;
pub mod wire;

#[cfg(test)]
mod test_support;

// ── Re-exports for ergonomic imports ─────────────────────────────────

pub use modules::conduit::{ConduitModule, ConnectResult, PingResult};
pub use modules::differential::DifferentialModule;
pub use modules::maniphest::ManiphestModule;
pub use modules::phid::PhidModule;
pub use modules::project::ProjectModule;
pub use modules::user::UserModule;
pub use modules::ModuleContext;
pub use session::{Credentials, OnDemandSessionHandler, SessionHandler, CONDUIT_PARAM};
pub use transport::{from_reqwest, HttpTransport, Params, Transport};

use std::sync::Arc;

use pc_domain::config::ConduitConfig;
use pc_domain::error::Result;
use serde_json::Value;

/// Every module wired to one transport and one shared session.
#[derive(Clone)]
pub struct Conduit {
    pub conduit: ConduitModule,
    pub maniphest: ManiphestModule,
    pub project: ProjectModule,
    pub user: UserModule,
    pub phid: PhidModule,
    pub differential: DifferentialModule,
    session: Arc<OnDemandSessionHandler>,
    ctx: ModuleContext,
}

impl Conduit {
    /// Client for the server at `base_url` (e.g. `https://phab.example.org`).
    pub fn new(base_url: &str, credentials: Credentials) -> Self {
        Self::with_transport(Arc::new(HttpTransport::new(base_url)), credentials)
    }

    /// Client built from the `[conduit]` config section.
    pub fn from_config(cfg: &ConduitConfig) -> Self {
        Self::with_transport(
            Arc::new(HttpTransport::from_config(cfg)),
            Credentials::from_config(cfg),
        )
    }

    /// Client over an arbitrary transport.
    pub fn with_transport(transport: Arc<dyn Transport>, credentials: Credentials) -> Self {
        let session = Arc::new(OnDemandSessionHandler::new(transport.clone(), credentials));
        let ctx = ModuleContext::new(transport, session.clone());
        Self {
            conduit: ConduitModule::new(ctx.clone()),
            maniphest: ManiphestModule::new(ctx.clone()),
            project: ProjectModule::new(ctx.clone()),
            user: UserModule::new(ctx.clone()),
            phid: PhidModule::new(ctx.clone()),
            differential: DifferentialModule::new(ctx.clone()),
            session,
            ctx,
        }
    }

    /// The session handler shared by all modules.
    pub fn session(&self) -> &Arc<OnDemandSessionHandler> {
        &self.session
    }

    /// Call any authenticated method without a typed wrapper.
    pub async fn call(&self, method: &str, params: Params) -> Result<Value> {
        self.ctx.call_authenticated(method, params).await
    }
}
