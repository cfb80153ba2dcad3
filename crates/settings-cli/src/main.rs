//! settingsctl: command-line client for effective settings.

mod cli;
mod output;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Parser;
use settings_core::{PatchOp, SettingValue};
use settings_sync::{SettingsClient, SyncConfig, register_metrics};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing; logs go to stderr so stdout stays parseable
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();
    register_metrics();

    let config = load_config(&args)?;
    tracing::debug!(base_url = config.base_url(), "Using settings API");

    let client = SettingsClient::new(config)?;
    let scope = args.scope.to_scope();

    let text = match &args.command {
        Command::Get { path: None } => {
            let doc = client.get(&scope).await?;
            output::render(doc.as_ref(), args.format)?
        },
        Command::Get { path: Some(path) } => match client.setting(&scope, path).await? {
            Some(value) => output::render(&value, args.format)?,
            None => bail!("no value at `{}`", path),
        },
        Command::Set { key, value } => {
            let doc = client
                .update_setting(&scope, key, SettingValue::from_literal(value))
                .await?;
            tracing::info!(etag = %doc.etag(), "Setting `{}` updated", key);
            output::render(doc.blob(), args.format)?
        },
        Command::Unset { key } => {
            let doc = client.remove_setting(&scope, key).await?;
            tracing::info!(etag = %doc.etag(), "Setting `{}` removed", key);
            output::render(doc.blob(), args.format)?
        },
        Command::Apply { file } => {
            let ops = read_batch(file)?;
            let doc = client.apply(&scope, &ops).await?;
            tracing::info!(etag = %doc.etag(), ops = ops.len(), "Patch batch applied");
            output::render(doc.blob(), args.format)?
        },
    };

    println!("{}", text);
    Ok(())
}

/// File and environment first, then command-line overrides.
fn load_config(args: &CliArgs) -> Result<SyncConfig> {
    let mut config =
        SyncConfig::load(args.config_file.as_deref()).context("failed to load configuration")?;

    if let Some(url) = &args.base_url {
        config.set_base_url(url);
    }
    if let Some(token) = &args.token {
        config.set_auth_token(token);
    }
    config.validate().context("invalid configuration")?;

    Ok(config)
}

fn read_batch(file: &Path) -> Result<Vec<PatchOp>> {
    let text = if file == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?
    };

    serde_json::from_str(&text).context("patch file must be a JSON array of operations")
}
