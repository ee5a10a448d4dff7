//! Policy Authority check tool
//!
//! Evaluates DNS names against the configured issuance policy, or watches the
//! policy files and logs reloads.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use issuance_policy::{Identifier, PolicyAuthority, PolicyConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "pa-check")]
#[command(about = "Check DNS names against the issuance policy")]
struct Args {
    /// Authority configuration (TOML or YAML)
    #[arg(short, long, env = "PA_CONFIG")]
    config: Option<PathBuf>,

    /// Hostname policy file, overrides the configuration
    #[arg(long, env = "PA_HOSTNAME_POLICY")]
    hostname_policy: Option<PathBuf>,

    /// Challenges whitelist file, overrides the configuration
    #[arg(long, env = "PA_CHALLENGES_WHITELIST")]
    challenges_whitelist: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate names and print the decision and offered challenges
    Check {
        /// Requesting account ID
        #[arg(short, long, default_value = "0")]
        account: i64,

        /// Treat the requests as revalidations
        #[arg(long)]
        revalidation: bool,

        /// Names to check (lowercased before evaluation)
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Load the policy files and follow changes until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("issuance_policy=info".parse()?)
                .add_directive("warn".parse()?),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PolicyConfig::from_file(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => PolicyConfig::default(),
    };
    if args.hostname_policy.is_some() {
        config.hostname_policy_file = args.hostname_policy.clone();
    }
    if args.challenges_whitelist.is_some() {
        config.challenges_whitelist_file = args.challenges_whitelist.clone();
    }

    let pa = Arc::new(PolicyAuthority::from_config(&config));

    match args.command {
        Command::Check {
            account,
            revalidation,
            names,
        } => {
            load_once(&pa, &config)?;
            let refused = check_names(&pa, account, revalidation, &names);
            if refused > 0 {
                return Err(anyhow!("{} of {} names refused", refused, names.len()));
            }
            Ok(())
        }
        Command::Watch => watch(&pa, &config).await,
    }
}

fn load_once(pa: &PolicyAuthority, config: &PolicyConfig) -> Result<()> {
    let path = config
        .hostname_policy_file
        .as_ref()
        .ok_or_else(|| anyhow!("no hostname policy file configured"))?;
    let raw = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    pa.load_hostname_policy(&raw)
        .with_context(|| format!("loading {}", path.display()))?;

    if let Some(path) = &config.challenges_whitelist_file {
        let raw = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        pa.load_challenges_whitelist(&raw)
            .with_context(|| format!("loading {}", path.display()))?;
    }
    Ok(())
}

fn check_names(pa: &PolicyAuthority, account: i64, revalidation: bool, names: &[String]) -> usize {
    let mut refused = 0;
    for name in names {
        let id = Identifier::dns(name.to_lowercase());

        let decision = pa
            .willing_to_issue_wildcard(&id)
            .and_then(|_| pa.challenges_for(&id, account, revalidation));

        match decision {
            Ok((challenges, _)) => {
                let kinds: Vec<String> = challenges.iter().map(|c| c.kind.to_string()).collect();
                println!(
                    "  {} {} [{}]",
                    "✓".green(),
                    id.value.bold(),
                    kinds.join(", ").dimmed()
                );
            }
            Err(e) => {
                refused += 1;
                println!(
                    "  {} {} {} ({:?})",
                    "✗".red(),
                    id.value.bold(),
                    e.to_string().red(),
                    e.kind()
                );
            }
        }
    }
    refused
}

async fn watch(pa: &Arc<PolicyAuthority>, config: &PolicyConfig) -> Result<()> {
    let path = config
        .hostname_policy_file
        .clone()
        .ok_or_else(|| anyhow!("no hostname policy file configured"))?;

    let _hostnames = pa
        .set_hostname_policy_file(&path)
        .with_context(|| format!("loading {}", path.display()))?;
    info!("Watching hostname policy {}", path.display());

    let _whitelist = match &config.challenges_whitelist_file {
        Some(path) => {
            let reloader = pa
                .set_challenges_whitelist_file(path)
                .with_context(|| format!("loading {}", path.display()))?;
            info!("Watching challenges whitelist {}", path.display());
            Some(reloader)
        }
        None => None,
    };

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    Ok(())
}
