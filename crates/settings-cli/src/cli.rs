//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use settings_core::Scope;

/// Command-line arguments for `settingsctl`.
#[derive(Debug, Parser)]
#[command(name = "settingsctl", version, about = "Read and edit effective settings")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "SETTINGS_SYNC_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Override the settings API base URL.
    #[arg(long = "base-url", value_name = "URL")]
    pub base_url: Option<String>,

    /// Bearer token for the settings API.
    #[arg(long, env = "SETTINGS_SYNC_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Json)]
    pub format: Format,

    #[command(flatten)]
    pub scope: ScopeArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Print the effective document, or one value with --path.
    Get {
        /// Dot-path of a single value or section.
        #[arg(long)]
        path: Option<String>,
    },
    /// Set one key. VALUE is parsed as JSON, falling back to a plain string.
    Set { key: String, value: String },
    /// Remove one key.
    Unset { key: String },
    /// Apply a JSON array of patch operations from a file, or `-` for stdin.
    Apply {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

/// Scope dimensions sent as query parameters. Dimensions left out are
/// resolved by the server from the session.
#[derive(Debug, Args, Default, Clone)]
pub struct ScopeArgs {
    #[arg(long, global = true)]
    pub tenant_id: Option<String>,
    #[arg(long, global = true)]
    pub territory: Option<String>,
    #[arg(long, global = true)]
    pub account_id: Option<String>,
    #[arg(long, global = true)]
    pub contact_role: Option<String>,
    #[arg(long, global = true)]
    pub contact_id: Option<String>,
    #[arg(long, global = true)]
    pub user_id: Option<String>,
}

impl ScopeArgs {
    pub fn to_scope(&self) -> Scope {
        let mut scope = Scope::new();
        if let Some(v) = &self.tenant_id {
            scope = scope.with_tenant_id(v);
        }
        if let Some(v) = &self.territory {
            scope = scope.with_territory(v);
        }
        if let Some(v) = &self.account_id {
            scope = scope.with_account_id(v);
        }
        if let Some(v) = &self.contact_role {
            scope = scope.with_contact_role(v);
        }
        if let Some(v) = &self.contact_id {
            scope = scope.with_contact_id(v);
        }
        if let Some(v) = &self.user_id {
            scope = scope.with_user_id(v);
        }
        scope
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Yaml,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_with_scope() {
        let args = CliArgs::try_parse_from([
            "settingsctl",
            "--account-id",
            "acc-1",
            "set",
            "ui.theme",
            "dark",
            "--contact-role",
            "buyer",
        ])
        .unwrap();

        let scope = args.scope.to_scope();
        assert_eq!(scope.account_id(), Some("acc-1"));
        assert_eq!(scope.contact_role(), Some("buyer"));
        assert!(scope.user_id().is_none());

        match args.command {
            Command::Set { key, value } => {
                assert_eq!(key, "ui.theme");
                assert_eq!(value, "dark");
            },
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_get_yaml() {
        let args =
            CliArgs::try_parse_from(["settingsctl", "--format", "yaml", "get", "--path", "ui"]).unwrap();

        assert_eq!(args.format, Format::Yaml);
        assert!(args.scope.to_scope().is_empty());
        assert!(matches!(args.command, Command::Get { path: Some(ref p) } if p == "ui"));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(CliArgs::try_parse_from(["settingsctl"]).is_err());
    }
}
