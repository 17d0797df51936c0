use std::fmt;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Conduit connection
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Where the Phabricator instance lives and who we authenticate as.
///
/// `base_url` is the instance root, without the trailing `/api/`.
/// `username` and `certificate` are only needed for authenticated
/// methods; anonymous calls such as `conduit.ping` work without them.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConduitConfig {
    #[serde(default = "d_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub username: Option<String>,
    /// The long-lived certificate from `~/.arcrc` (`arc install-certificate`).
    #[serde(default)]
    pub certificate: Option<String>,
    /// Per-request timeout. `None` waits for the server indefinitely.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl Default for ConduitConfig {
    fn default() -> Self {
        Self {
            base_url: d_base_url(),
            username: None,
            certificate: None,
            timeout_ms: None,
        }
    }
}

// Keep the certificate out of logs and panic messages.
impl fmt::Debug for ConduitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConduitConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("certificate", &self.certificate.as_ref().map(|_| "<redacted>"))
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_base_url() -> String {
    "http://localhost".into()
}
