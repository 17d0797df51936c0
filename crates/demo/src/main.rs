mod cli;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use pc_conduit::modules::maniphest::UpdateTask;
use pc_conduit::Conduit;
use pc_domain::config::Config;

use crate::cli::Cli;

const RULE_WIDTH: usize = 79;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_cli_tracing();
    let cli = Cli::parse();

    let (config, config_path) = Config::load()?;
    let from_file = std::path::Path::new(&config_path).exists();
    let settings = cli.resolve(&config.conduit, from_file)?;
    tracing::debug!(?settings, config_path = %config_path, "resolved settings");

    let conduit = Conduit::from_config(&settings);

    phase("conduit.ping (anonymous)");
    let ping = conduit.conduit.ping().await.context("conduit.ping failed")?;
    println!("conduit.ping returned hostname: {}", ping.hostname);

    let task_id = match (&settings.username, &settings.certificate, cli.task) {
        (Some(_), Some(_), Some(task_id)) => task_id,
        _ => {
            finish();
            println!("To run some more API calls, please provide a username, certificate, and task");
            return Ok(());
        }
    };

    phase("user.whoami");
    let me = conduit.user.whoami().await.context("user.whoami failed")?;
    println!("Connected as {} ({})", me.user_name, me.phid);

    phase("maniphest.info");
    println!("Fetching info about task T{task_id}...");
    let task = conduit
        .maniphest
        .info(task_id)
        .await
        .with_context(|| format!("maniphest.info for T{task_id} failed"))?;
    println!("Here it is:");
    println!("  * title: {}", task.title);
    println!("  * created on: {}", format_timestamp(task.created_at()));
    println!("  * modified on: {}", format_timestamp(task.modified_at()));
    println!("  * priority: {}", task.priority.as_deref().unwrap_or("-"));
    println!("  * uri: {}", task.uri.as_deref().unwrap_or("-"));
    println!("(Much more information is available. See the Task type.)");

    phase("maniphest.update");
    let question = format!("May I add a comment saying 'Test comment' to task T{task_id}?");
    if ask_permission(&question).await? {
        println!("Adding 'Test comment' to task T{task_id}...");
        let updated = conduit
            .maniphest
            .update(&UpdateTask::comment(task_id, "Test comment"))
            .await
            .context("maniphest.update failed")?;
        println!("Done.");

        println!("Fetching fresh info about task T{task_id}...");
        let fresh = conduit.maniphest.info(task_id).await?;
        println!(
            "New task modification date is {}",
            format_timestamp(fresh.modified_at().or(updated.modified_at()))
        );
    }

    finish();
    Ok(())
}

fn init_cli_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn phase(name: &str) {
    println!();
    let header = format!("-- {name} ");
    let fill = RULE_WIDTH.saturating_sub(header.len());
    println!("{header}{}", "-".repeat(fill));
}

fn finish() {
    println!("{}", "-".repeat(RULE_WIDTH));
    println!("All demos ran.");
}

async fn ask_permission(question: &str) -> anyhow::Result<bool> {
    println!("{question}");
    println!("(If yes, type in 'yes' (without quotes) and hit enter.)");

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("reading answer from stdin")?;
    println!();

    Ok(line.trim_end() == "yes")
}

fn format_timestamp(secs: Option<i64>) -> String {
    secs.and_then(|s| chrono::DateTime::from_timestamp(s, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "-".into())
}
