mod cli;
mod logging;

use anyhow::Context;
use cli::{Cli, Command};
use firebase_rtdb_users::database::memory::MemoryDatabase;
use firebase_rtdb_users::database::store::Store;
use firebase_rtdb_users::database::FirebaseDatabase;
use firebase_rtdb_users::users::panel::{Trigger, UserPanel};
use firebase_rtdb_users::users::UserDirectory;
use firebase_rtdb_users::yup_oauth2;
use firebase_rtdb_users::FirebaseApp;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = cli::parse();
    let _log_guard = logging::init(cli.log_file.as_deref())?;
    let config = cli.panel_config();

    if cli.offline {
        tracing::info!("using an in-memory database");
        let panel = UserPanel::new(UserDirectory::new(MemoryDatabase::new()), config);
        return run(&panel, cli.command).await;
    }

    let db = connect(&cli).await?;
    tracing::info!(
        url = %db.url(),
        collection = %config.items_name,
        user_id = %config.user_id,
        "connected"
    );
    let panel = UserPanel::new(UserDirectory::new(db), config);
    run(&panel, cli.command).await
}

/// Builds the database client, preferring a service account over a secret.
async fn connect(cli: &Cli) -> anyhow::Result<FirebaseDatabase> {
    let url = cli
        .database_url
        .as_deref()
        .context("a database URL is required unless --offline is set")?;

    let db = if let Some(path) = &cli.credentials {
        let key = yup_oauth2::read_service_account_key(path)
            .await
            .with_context(|| format!("failed to read service account key {}", path.display()))?;
        FirebaseApp::new(key).database(url)?
    } else if let Some(secret) = &cli.secret {
        FirebaseDatabase::with_secret(url, secret)?
    } else {
        tracing::warn!("no credentials configured, requests are unauthenticated");
        FirebaseDatabase::unauthenticated(url)?
    };

    Ok(match &cli.namespace {
        Some(ns) => db.with_namespace(ns),
        None => db,
    })
}

async fn run<S: Store + 'static>(panel: &UserPanel<S>, command: Command) -> anyhow::Result<()> {
    match command.trigger() {
        Some(trigger) => panel.click(trigger).await?,
        None => interactive(panel).await?,
    }
    Ok(())
}

async fn interactive<S: Store + 'static>(panel: &UserPanel<S>) -> anyhow::Result<()> {
    let names: Vec<&str> = Trigger::ALL.iter().map(Trigger::name).collect();
    tracing::info!("triggers: {}; `quit` to stop", names.join(", "));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending = Vec::new();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        match line.parse::<Trigger>() {
            Ok(trigger) => pending.push(panel.click(trigger)),
            Err(e) => tracing::warn!("{}", e),
        }
    }

    for handle in pending {
        handle.await?;
    }
    Ok(())
}
