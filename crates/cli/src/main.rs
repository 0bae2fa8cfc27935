use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use mettportal_auth::{AuthorizationGateway, Policy};
use mettportal_observability::LogFormat;

mod commands;

/// Inspect and exercise a mettportal authorization policy
#[derive(Parser, Debug)]
#[command(name = "mettportal-policy", about = "Authorization policy tool")]
pub struct Cli {
    /// Policy file (JSON). Falls back to $METTPORTAL_POLICY_PATH, then the
    /// built-in policy.
    #[arg(long, global = true)]
    pub policy: Option<PathBuf>,

    /// Log format: json or pretty
    #[arg(long, global = true, default_value = "pretty")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load and validate the policy, then print a summary
    Validate,

    /// Decide whether roles satisfy a permission requirement
    Check {
        /// Comma-separated role names
        #[arg(long, value_delimiter = ',')]
        roles: Vec<String>,
        /// Comma-separated required permissions (OR semantics)
        #[arg(long, value_delimiter = ',')]
        require: Vec<String>,
    },

    /// Decide whether roles may run a registered operation
    Operation {
        #[arg(long, value_delimiter = ',')]
        roles: Vec<String>,
        id: String,
    },

    /// Print the landing route for a role set
    Landing {
        #[arg(long, value_delimiter = ',')]
        roles: Vec<String>,
    },

    /// Print the menus and routes a role set can reach
    Routes {
        #[arg(long, value_delimiter = ',')]
        roles: Vec<String>,
    },

    /// List roles that can reach a route
    Who {
        #[arg(long)]
        route: String,
    },

    /// Print the effective policy document
    Dump,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    mettportal_observability::init_with(cli.log_format);

    let policy = match &cli.policy {
        Some(path) => Policy::from_path(path)
            .with_context(|| format!("loading policy from {}", path.display()))?,
        None => Policy::from_env().context("loading policy")?,
    };

    tracing::debug!(command = ?cli.command, "evaluating");
    let gateway = AuthorizationGateway::new(Arc::new(policy));
    let output = commands::run(&gateway, &cli.command);
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
