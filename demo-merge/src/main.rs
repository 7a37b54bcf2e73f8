use dotenvy::dotenv;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use identity_merge::{
    IdentityResolver, LoggingAccessControl, LoggingNotifier, ResolverConfig, data_store_from_env,
};

mod commands;

use crate::commands::{Command, run};

const USAGE: &str = "\
Usage:
  demo-merge login <provider> <profile.json> [--as <account_id>]
  demo-merge resolve <provider> <profile.json> <keep_account_id>
  demo-merge merge <keep_account_id> <discard_account_id> [explanation]
  demo-merge register <name> <email>
  demo-merge confirm <token>
  demo-merge seed <account_id> <target_id>
  demo-merge list";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=debug,identity_merge=debug", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = Command::parse(&args) else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    let store = data_store_from_env().await?;
    let resolver = IdentityResolver::new(
        store.clone(),
        Arc::new(LoggingAccessControl),
        Arc::new(LoggingNotifier),
        ResolverConfig::from_env(),
    );

    let output = run(command, &resolver, store).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
