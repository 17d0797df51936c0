//! Session handling for authenticated Conduit calls.
//!
//! Authenticated methods carry `__conduit__: {"sessionKey": ...}` in their
//! parameters. [`OnDemandSessionHandler`] opens a session through
//! `conduit.connect` the first time one is needed and reuses the key for
//! every later call until the credentials change or the session is reset.
//!
//! The handler never refreshes a session on its own. A call rejected
//! because the server-side session lapsed is returned to the caller like
//! any other remote error; call [`OnDemandSessionHandler::reset_session`]
//! to force a new handshake.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use pc_domain::config::ConduitConfig;
use pc_domain::error::Result;
use pc_domain::trace::TraceEvent;
use serde_json::json;
use tokio::sync::Mutex;

use crate::modules::conduit::{handshake, ConnectResult};
use crate::transport::{Params, Transport};

/// Parameter name carrying the session block.
pub const CONDUIT_PARAM: &str = "__conduit__";

/// Fills the session block into the parameters of authenticated calls.
#[async_trait]
pub trait SessionHandler: Send + Sync {
    /// Overwrite `params["__conduit__"]` with the current session,
    /// opening one first if needed.
    ///
    /// On failure `params` must not be reused for another attempt.
    async fn fill_in_session(&self, params: &mut Params) -> Result<()>;

    /// Run the `conduit.connect` handshake now and cache its session.
    ///
    /// On failure any previously cached session is kept.
    async fn connect(&self) -> Result<ConnectResult>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Credentials
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The long-lived credentials exchanged for a session key.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: Option<String>,
    pub certificate: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, certificate: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            certificate: Some(certificate.into()),
        }
    }

    /// No credentials; only anonymous methods will succeed.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn from_config(cfg: &ConduitConfig) -> Self {
        Self {
            username: cfg.username.clone(),
            certificate: cfg.certificate.clone(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("certificate", &self.certificate.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// On-demand handler
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct SessionState {
    credentials: Credentials,
    session_key: Option<String>,
}

impl SessionState {
    fn clear(&mut self, reason: &str) {
        if self.session_key.take().is_some() {
            TraceEvent::SessionReset {
                reason: reason.to_owned(),
            }
            .emit();
        }
    }
}

/// Opens a session on first use and reuses it afterwards.
///
/// The cached key sits behind an async mutex that is held across the
/// handshake, so concurrent callers that find no session wait for a
/// single `conduit.connect` instead of racing their own.
pub struct OnDemandSessionHandler {
    transport: Arc<dyn Transport>,
    state: Mutex<SessionState>,
}

impl OnDemandSessionHandler {
    pub fn new(transport: Arc<dyn Transport>, credentials: Credentials) -> Self {
        Self {
            transport,
            state: Mutex::new(SessionState {
                credentials,
                session_key: None,
            }),
        }
    }

    /// Whether a session key is cached.
    pub async fn has_session(&self) -> bool {
        self.state.lock().await.session_key.is_some()
    }

    /// Drop the cached session; the next authenticated call reconnects.
    pub async fn reset_session(&self) {
        self.state.lock().await.clear("explicit reset");
    }

    pub async fn username(&self) -> Option<String> {
        self.state.lock().await.credentials.username.clone()
    }

    /// Change the user. Clears the cached session.
    pub async fn set_username(&self, username: impl Into<String>) {
        let mut state = self.state.lock().await;
        state.credentials.username = Some(username.into());
        state.clear("username changed");
    }

    /// Change the certificate. Clears the cached session.
    pub async fn set_certificate(&self, certificate: impl Into<String>) {
        let mut state = self.state.lock().await;
        state.credentials.certificate = Some(certificate.into());
        state.clear("certificate changed");
    }

    /// Replace both credentials at once. Clears the cached session.
    pub async fn set_credentials(&self, credentials: Credentials) {
        let mut state = self.state.lock().await;
        state.credentials = credentials;
        state.clear("credentials changed");
    }
}

#[async_trait]
impl SessionHandler for OnDemandSessionHandler {
    async fn fill_in_session(&self, params: &mut Params) -> Result<()> {
        let mut state = self.state.lock().await;
        let session_key = match &state.session_key {
            Some(key) => key.clone(),
            None => {
                tracing::debug!("trying to start new session");
                let connected = handshake(self.transport.as_ref(), &state.credentials).await?;
                state.session_key = Some(connected.session_key.clone());
                connected.session_key
            }
        };
        drop(state);

        params.insert(CONDUIT_PARAM.into(), json!({ "sessionKey": session_key }));
        Ok(())
    }

    async fn connect(&self) -> Result<ConnectResult> {
        let mut state = self.state.lock().await;
        let connected = handshake(self.transport.as_ref(), &state.credentials).await?;
        state.session_key = Some(connected.session_key.clone());
        Ok(connected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{connect_ok, ScriptedTransport};
    use pc_domain::error::Error;
    use serde_json::Value;

    fn handler(transport: &Arc<ScriptedTransport>) -> OnDemandSessionHandler {
        OnDemandSessionHandler::new(transport.clone(), Credentials::new("alice", "cert-abc"))
    }

    #[tokio::test]
    async fn first_fill_connects_then_inserts_key() {
        let transport = ScriptedTransport::new();
        transport.push_ok(connect_ok("key-1"));
        let handler = handler(&transport);

        let mut params = Params::new();
        handler.fill_in_session(&mut params).await.unwrap();

        assert_eq!(params[CONDUIT_PARAM], json!({"sessionKey": "key-1"}));
        assert_eq!(transport.methods(), vec!["conduit.connect"]);
        assert!(handler.has_session().await);
    }

    #[tokio::test]
    async fn second_fill_reuses_session() {
        let transport = ScriptedTransport::new();
        transport.push_ok(connect_ok("key-1"));
        let handler = handler(&transport);

        let mut first = Params::new();
        let mut second = Params::new();
        handler.fill_in_session(&mut first).await.unwrap();
        handler.fill_in_session(&mut second).await.unwrap();

        assert_eq!(transport.methods().len(), 1);
        assert_eq!(second[CONDUIT_PARAM], json!({"sessionKey": "key-1"}));
    }

    #[tokio::test]
    async fn existing_conduit_entry_is_replaced_not_merged() {
        let transport = ScriptedTransport::new();
        transport.push_ok(connect_ok("fresh"));
        let handler = handler(&transport);

        let mut params = Params::new();
        params.insert(
            CONDUIT_PARAM.into(),
            json!({"sessionKey": "stale", "connectionID": 9}),
        );
        params.insert("task_id".into(), json!(85));
        handler.fill_in_session(&mut params).await.unwrap();

        assert_eq!(params[CONDUIT_PARAM], json!({"sessionKey": "fresh"}));
        assert_eq!(params["task_id"], json!(85));
    }

    #[tokio::test]
    async fn handshake_failure_propagates_and_next_fill_retries() {
        let transport = ScriptedTransport::new();
        transport.push_err(Error::Conduit {
            method: "conduit.connect".into(),
            code: Some("ERR-INVALID-AUTH".into()),
            info: Some("bad signature".into()),
        });
        transport.push_ok(connect_ok("key-2"));
        let handler = handler(&transport);

        let mut params = Params::new();
        let err = handler.fill_in_session(&mut params).await.unwrap_err();
        assert_eq!(err.conduit_code(), Some("ERR-INVALID-AUTH"));
        assert!(!handler.has_session().await);

        let mut params = Params::new();
        handler.fill_in_session(&mut params).await.unwrap();
        assert_eq!(params[CONDUIT_PARAM]["sessionKey"], "key-2");
        assert_eq!(transport.methods(), vec!["conduit.connect", "conduit.connect"]);
    }

    #[tokio::test]
    async fn missing_certificate_fails_without_network() {
        let transport = ScriptedTransport::new();
        let handler = OnDemandSessionHandler::new(
            transport.clone(),
            Credentials {
                username: Some("alice".into()),
                certificate: None,
            },
        );

        let mut params = Params::new();
        let err = handler.fill_in_session(&mut params).await.unwrap_err();
        assert!(matches!(err, Error::MissingCredential("certificate")));
        assert!(transport.methods().is_empty());
        assert!(!params.contains_key(CONDUIT_PARAM));
    }

    #[tokio::test]
    async fn changing_credentials_clears_session() {
        let transport = ScriptedTransport::new();
        transport.push_ok(connect_ok("key-1"));
        transport.push_ok(connect_ok("key-2"));
        transport.push_ok(connect_ok("key-3"));
        let handler = handler(&transport);

        let mut params = Params::new();
        handler.fill_in_session(&mut params).await.unwrap();

        assert_eq!(handler.username().await.as_deref(), Some("alice"));
        handler.set_username("bob").await;
        assert_eq!(handler.username().await.as_deref(), Some("bob"));
        assert!(!handler.has_session().await);
        handler.fill_in_session(&mut params).await.unwrap();
        assert_eq!(params[CONDUIT_PARAM]["sessionKey"], "key-2");

        let calls = transport.calls();
        assert_eq!(calls[1].1["user"], "bob");

        handler.set_certificate("other-cert").await;
        handler.fill_in_session(&mut params).await.unwrap();
        assert_eq!(params[CONDUIT_PARAM]["sessionKey"], "key-3");
        assert_eq!(transport.methods().len(), 3);
    }

    #[tokio::test]
    async fn reset_session_forces_reconnect() {
        let transport = ScriptedTransport::new();
        transport.push_ok(connect_ok("key-1"));
        transport.push_ok(connect_ok("key-2"));
        let handler = handler(&transport);

        let mut params = Params::new();
        handler.fill_in_session(&mut params).await.unwrap();
        handler.reset_session().await;
        handler.fill_in_session(&mut params).await.unwrap();

        assert_eq!(params[CONDUIT_PARAM]["sessionKey"], "key-2");
    }

    #[tokio::test]
    async fn explicit_connect_caches_key() {
        let transport = ScriptedTransport::new();
        transport.push_ok(connect_ok("key-9"));
        let handler = handler(&transport);

        let connected = handler.connect().await.unwrap();
        assert_eq!(connected.session_key, "key-9");

        let mut params = Params::new();
        handler.fill_in_session(&mut params).await.unwrap();
        assert_eq!(params[CONDUIT_PARAM]["sessionKey"], "key-9");
        assert_eq!(transport.methods().len(), 1);
    }

    #[tokio::test]
    async fn failed_explicit_connect_keeps_existing_session() {
        let transport = ScriptedTransport::new();
        transport.push_ok(connect_ok("key-1"));
        transport.push_err(Error::Http("connection refused".into()));
        let handler = handler(&transport);

        let mut params = Params::new();
        handler.fill_in_session(&mut params).await.unwrap();

        let err = handler.connect().await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
        assert!(handler.has_session().await);

        let mut params = Params::new();
        handler.fill_in_session(&mut params).await.unwrap();
        assert_eq!(params[CONDUIT_PARAM]["sessionKey"], "key-1");
        assert_eq!(transport.methods(), vec!["conduit.connect", "conduit.connect"]);
    }

    #[tokio::test]
    async fn successful_explicit_connect_replaces_session() {
        let transport = ScriptedTransport::new();
        transport.push_ok(connect_ok("key-1"));
        transport.push_ok(connect_ok("key-2"));
        let handler = handler(&transport);

        let mut params = Params::new();
        handler.fill_in_session(&mut params).await.unwrap();
        handler.connect().await.unwrap();

        handler.fill_in_session(&mut params).await.unwrap();
        assert_eq!(params[CONDUIT_PARAM]["sessionKey"], "key-2");
    }

    #[tokio::test]
    async fn concurrent_fills_share_one_handshake() {
        let transport = ScriptedTransport::new();
        transport.push_ok(connect_ok("shared"));
        let handler = Arc::new(handler(&transport));

        let a = {
            let handler = handler.clone();
            tokio::spawn(async move {
                let mut params = Params::new();
                handler.fill_in_session(&mut params).await.map(|_| params)
            })
        };
        let b = {
            let handler = handler.clone();
            tokio::spawn(async move {
                let mut params = Params::new();
                handler.fill_in_session(&mut params).await.map(|_| params)
            })
        };

        let a = a.await.unwrap().unwrap();
        let b = b.await.unwrap().unwrap();
        assert_eq!(a[CONDUIT_PARAM], b[CONDUIT_PARAM]);
        assert_eq!(transport.methods(), vec!["conduit.connect"]);
    }

    #[test]
    fn credentials_debug_redacts_certificate() {
        let dbg = format!("{:?}", Credentials::new("alice", "top-secret"));
        assert!(dbg.contains("alice"));
        assert!(!dbg.contains("top-secret"));
    }

    #[tokio::test]
    async fn handshake_sends_signed_parameters() {
        let transport = ScriptedTransport::new();
        transport.push_ok(connect_ok("k"));
        let handler = handler(&transport);
        handler.connect().await.unwrap();

        let calls = transport.calls();
        let params = &calls[0].1;
        assert_eq!(params["user"], "alice");
        assert_eq!(params["clientVersion"], 1);
        let token = params["authToken"].as_u64().unwrap();
        let expected = crate::signature::auth_signature(token, "cert-abc");
        assert_eq!(params["authSignature"], Value::String(expected));
    }
}
