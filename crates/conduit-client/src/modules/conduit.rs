//! `conduit.*` methods: ping, the session handshake, and API introspection.

use std::collections::HashMap;

use pc_domain::error::{Error, Result};
use pc_domain::trace::TraceEvent;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::modules::ModuleContext;
use crate::session::Credentials;
use crate::signature::{auth_signature, current_auth_token};
use crate::transport::{Params, Transport};
use crate::wire;

/// Value sent as `client` in the handshake.
pub const CLIENT_NAME: &str = "pc-conduit";

/// Value sent as `clientVersion` in the handshake.
pub const CONDUIT_VERSION: u32 = 1;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Results
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// `conduit.ping`; the wire result is the bare hostname string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResult {
    pub hostname: String,
}

/// `conduit.connect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectResult {
    #[serde(rename = "connectionID", default, deserialize_with = "wire::opt_int")]
    pub connection_id: Option<i64>,
    #[serde(rename = "sessionKey")]
    pub session_key: String,
    #[serde(rename = "userPHID", default)]
    pub user_phid: Option<String>,
}

/// `conduit.getcapabilities`: capability name to supported values.
pub type Capabilities = HashMap<String, Vec<String>>;

/// `conduit.getcertificate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetCertificateResult {
    pub username: String,
    pub certificate: String,
}

/// One entry of `conduit.query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescription {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "wire::map")]
    pub params: HashMap<String, String>,
    #[serde(rename = "return", default)]
    pub return_type: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Handshake
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Parameters of `conduit.connect` for the given token.
///
/// Fails before any I/O when a credential is missing.
pub fn connect_params(credentials: &Credentials, auth_token: u64) -> Result<Params> {
    let user = credentials
        .username
        .as_deref()
        .ok_or(Error::MissingCredential("username"))?;
    let certificate = credentials
        .certificate
        .as_deref()
        .ok_or(Error::MissingCredential("certificate"))?;

    let mut params = Params::new();
    params.insert("client".into(), json!(CLIENT_NAME));
    params.insert("clientVersion".into(), json!(CONDUIT_VERSION));
    params.insert("user".into(), json!(user));
    params.insert("authToken".into(), json!(auth_token));
    params.insert("authSignature".into(), json!(auth_signature(auth_token, certificate)));
    Ok(params)
}

/// Exchange `credentials` for a session key.
pub(crate) async fn handshake(
    transport: &dyn Transport,
    credentials: &Credentials,
) -> Result<ConnectResult> {
    let params = connect_params(credentials, current_auth_token())?;
    let value = transport.call("conduit.connect", params).await?;
    let connected: ConnectResult = serde_json::from_value(value)?;

    TraceEvent::SessionOpened {
        user: credentials.username.clone().unwrap_or_default(),
        connection_id: connected.connection_id,
    }
    .emit();

    Ok(connected)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Module
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Methods starting with `conduit.`.
#[derive(Clone)]
pub struct ConduitModule {
    ctx: ModuleContext,
}

impl ConduitModule {
    pub fn new(ctx: ModuleContext) -> Self {
        Self { ctx }
    }

    /// `conduit.ping` (anonymous).
    pub async fn ping(&self) -> Result<PingResult> {
        let hostname: String = self.ctx.call_anonymous("conduit.ping", Params::new()).await?;
        Ok(PingResult { hostname })
    }

    /// `conduit.connect`. Opens a fresh session and caches its key for
    /// later authenticated calls.
    pub async fn connect(&self) -> Result<ConnectResult> {
        self.ctx.connect().await
    }

    /// `conduit.getcapabilities` (anonymous).
    pub async fn get_capabilities(&self) -> Result<Capabilities> {
        let value: Value = self
            .ctx
            .call_anonymous("conduit.getcapabilities", Params::new())
            .await?;
        Ok(wire::map(value)?)
    }

    /// `conduit.getcertificate` (anonymous). Trades a one-time token from
    /// `/conduit/token/` for the user's certificate.
    pub async fn get_certificate(&self, token: &str, host: &str) -> Result<GetCertificateResult> {
        let mut params = Params::new();
        params.insert("token".into(), json!(token));
        params.insert("host".into(), json!(host));
        self.ctx.call_anonymous("conduit.getcertificate", params).await
    }

    /// `conduit.query`: every method the server exposes.
    pub async fn query(&self) -> Result<HashMap<String, MethodDescription>> {
        let value: Value = self
            .ctx
            .call_authenticated("conduit.query", Params::new())
            .await?;
        Ok(wire::map(value)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::session::{OnDemandSessionHandler, CONDUIT_PARAM};
    use crate::test_support::{connect_ok, ScriptedTransport};

    fn module_with_session(
        transport: &Arc<ScriptedTransport>,
    ) -> (ConduitModule, Arc<OnDemandSessionHandler>) {
        let session = Arc::new(OnDemandSessionHandler::new(
            transport.clone(),
            Credentials::new("alice", "abc"),
        ));
        let module = ConduitModule::new(ModuleContext::new(transport.clone(), session.clone()));
        (module, session)
    }

    fn module(transport: &Arc<ScriptedTransport>) -> ConduitModule {
        module_with_session(transport).0
    }

    #[test]
    fn connect_params_are_signed() {
        let params = connect_params(&Credentials::new("alice", "abc"), 1000).unwrap();
        assert_eq!(params["client"], CLIENT_NAME);
        assert_eq!(params["clientVersion"], 1);
        assert_eq!(params["user"], "alice");
        assert_eq!(params["authToken"], 1000);
        assert_eq!(
            params["authSignature"],
            "4342b5c928bc4e7adc933661daf42c0b4542eed7"
        );
        assert_eq!(params.len(), 5);
    }

    #[test]
    fn connect_params_require_username() {
        let creds = Credentials {
            username: None,
            certificate: Some("abc".into()),
        };
        assert!(matches!(
            connect_params(&creds, 1000),
            Err(Error::MissingCredential("username"))
        ));
    }

    #[tokio::test]
    async fn ping_is_anonymous_and_wraps_hostname() {
        let transport = ScriptedTransport::new();
        transport.push_ok(json!("phab.example.org"));

        let ping = module(&transport).ping().await.unwrap();

        assert_eq!(ping.hostname, "phab.example.org");
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "conduit.ping");
        assert!(calls[0].1.is_empty());
    }

    #[tokio::test]
    async fn connect_decodes_string_connection_id() {
        let transport = ScriptedTransport::new();
        transport.push_ok(json!({
            "connectionID": "1759",
            "sessionKey": "lxdnxv3xbfamwaazy5zqsvqx6b5zeoqntm3jmobu",
            "userPHID": "PHID-USER-5e2ysoqaoqm4zgs4mfbn"
        }));

        let connected = module(&transport).connect().await.unwrap();

        assert_eq!(connected.connection_id, Some(1759));
        assert_eq!(connected.session_key, "lxdnxv3xbfamwaazy5zqsvqx6b5zeoqntm3jmobu");
        assert_eq!(connected.user_phid.as_deref(), Some("PHID-USER-5e2ysoqaoqm4zgs4mfbn"));
    }

    struct FixedSession;

    #[async_trait::async_trait]
    impl crate::session::SessionHandler for FixedSession {
        async fn fill_in_session(&self, params: &mut Params) -> Result<()> {
            params.insert(CONDUIT_PARAM.into(), json!({"sessionKey": "fixed"}));
            Ok(())
        }

        async fn connect(&self) -> Result<ConnectResult> {
            Ok(ConnectResult {
                connection_id: None,
                session_key: "fixed".into(),
                user_phid: None,
            })
        }
    }

    #[tokio::test]
    async fn connect_goes_through_injected_session_handler() {
        let transport = ScriptedTransport::new();
        let module = ConduitModule::new(ModuleContext::new(transport.clone(), Arc::new(FixedSession)));

        let connected = module.connect().await.unwrap();

        assert_eq!(connected.session_key, "fixed");
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn connect_without_session_key_is_an_error() {
        let transport = ScriptedTransport::new();
        transport.push_ok(json!({"connectionID": 1}));
        let (module, session) = module_with_session(&transport);

        assert!(matches!(module.connect().await, Err(Error::Json(_))));
        assert!(!session.has_session().await);
    }

    #[tokio::test]
    async fn get_capabilities_decodes_map() {
        let transport = ScriptedTransport::new();
        transport.push_ok(json!({
            "authentication": ["token", "asymmetric", "session", "sessionless"],
            "signatures": ["consign"],
            "input": ["json", "urlencoded"],
            "output": ["json", "human"]
        }));

        let caps = module(&transport).get_capabilities().await.unwrap();

        assert_eq!(caps["signatures"], vec!["consign"]);
        assert_eq!(caps.len(), 4);
        assert!(!transport.calls()[0].1.contains_key(CONDUIT_PARAM));
    }

    #[tokio::test]
    async fn get_certificate_sends_token_and_host() {
        let transport = ScriptedTransport::new();
        transport.push_ok(json!({"username": "alice", "certificate": "c3rt"}));

        let cert = module(&transport)
            .get_certificate("tok123", "https://phab.example.org")
            .await
            .unwrap();

        assert_eq!(cert.username, "alice");
        assert_eq!(cert.certificate, "c3rt");
        let params = &transport.calls()[0].1;
        assert_eq!(params["token"], "tok123");
        assert_eq!(params["host"], "https://phab.example.org");
    }

    #[tokio::test]
    async fn query_connects_first_and_decodes_methods() {
        let transport = ScriptedTransport::new();
        transport.push_ok(connect_ok("key-q"));
        transport.push_ok(json!({
            "conduit.ping": {"description": "Basic ping.", "params": [], "return": "string"},
            "maniphest.info": {
                "description": "Retrieve info about a task.",
                "params": {"task_id": "required id"},
                "return": "nonempty dict"
            }
        }));

        let methods = module(&transport).query().await.unwrap();

        assert_eq!(transport.methods(), vec!["conduit.connect", "conduit.query"]);
        assert_eq!(transport.calls()[1].1[CONDUIT_PARAM]["sessionKey"], "key-q");
        assert!(methods["conduit.ping"].params.is_empty());
        assert_eq!(methods["maniphest.info"].params["task_id"], "required id");
        assert_eq!(methods["maniphest.info"].return_type.as_deref(), Some("nonempty dict"));
    }
}
