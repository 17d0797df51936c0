use clap::Parser;
use pc_domain::config::ConduitConfig;

/// Walk through a few Conduit calls against a Phabricator instance.
///
/// Settings not given as flags are taken from the `[conduit]` section of
/// the file named by `PC_CONFIG` (default `conduit.toml`).
#[derive(Debug, Parser)]
#[command(name = "conduit-demo", version, about)]
pub struct Cli {
    /// URL of the Phabricator instance (without the trailing "/api/").
    #[arg(long)]
    pub url: Option<String>,
    /// Username to connect as.
    #[arg(long)]
    pub username: Option<String>,
    /// Conduit certificate of that user.
    #[arg(long)]
    pub certificate: Option<String>,
    /// Task to read and comment on, with or without the leading "T".
    #[arg(long, value_parser = parse_task_id)]
    pub task: Option<i64>,
}

impl Cli {
    /// Overlay the flags on top of `base`. Fails when no URL is known.
    pub fn resolve(&self, base: &ConduitConfig, from_file: bool) -> anyhow::Result<ConduitConfig> {
        let base_url = match (&self.url, from_file) {
            (Some(url), _) => url.clone(),
            (None, true) => base.base_url.clone(),
            (None, false) => anyhow::bail!("--url is required (or set conduit.base_url in the config)"),
        };
        Ok(ConduitConfig {
            base_url,
            username: self.username.clone().or_else(|| base.username.clone()),
            certificate: self.certificate.clone().or_else(|| base.certificate.clone()),
            timeout_ms: base.timeout_ms,
        })
    }
}

/// `T85` and `85` both mean task 85.
pub fn parse_task_id(raw: &str) -> Result<i64, String> {
    let digits = raw.strip_prefix('T').unwrap_or(raw);
    match digits.parse::<i64>() {
        Ok(id) if id >= 0 => Ok(id),
        _ => Err(format!("not a task id: {raw}")),
    }
}
