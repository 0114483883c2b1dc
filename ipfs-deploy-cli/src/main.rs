//! ipfs-deploy CLI
//!
//! Publishes a static site directory to IPFS, pins it remotely and points
//! DNSLink at it.

mod effects;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ipfs_deploy::config::parse_providers;
use ipfs_deploy::{DeployConfig, DeployEvent, DeployReport, Deployer};
use ipfs_deploy_core::types::StepResult;
use ipfs_deploy_core::Step;

use crate::effects::SystemEffects;

/// ipfs-deploy - Publish a static site to IPFS
#[derive(Parser, Debug)]
#[command(name = "ipfs-deploy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory to publish [default: public]
    path: Option<PathBuf>,

    /// Skip the DNSLink update
    #[arg(long)]
    no_dns: bool,

    /// Open https://<site-domain> once DNS is updated
    #[arg(long)]
    open: bool,

    /// Domain whose DNSLink record is updated
    #[arg(short = 'd', long, env = "IPFS_DEPLOY_SITE_DOMAIN")]
    site_domain: Option<String>,

    /// Pinning providers to use, comma separated (pinata, infura)
    #[arg(short, long)]
    pinners: Option<String>,

    /// Pinning providers that must succeed, comma separated
    #[arg(short, long)]
    require: Option<String>,

    /// Local daemon RPC URL or multiaddr
    #[arg(long, env = "IPFS_DEPLOY_IPFS_API")]
    ipfs_api: Option<String>,

    /// Per-request timeout for remote services, in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Print the deploy report as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Layers the flags over an environment-loaded config.
    fn apply(&self, mut config: DeployConfig) -> Result<DeployConfig> {
        if let Some(path) = &self.path {
            config = config.with_public_dir(path);
        }
        if self.no_dns {
            config.update_dns = false;
        }
        if self.open {
            config.open = true;
        }
        if let Some(domain) = &self.site_domain {
            config = config.with_site_domain(domain);
        }
        if let Some(pinners) = &self.pinners {
            config.pin_policy.enabled_providers =
                parse_providers(pinners).context("Invalid --pinners")?;
        }
        if let Some(required) = &self.require {
            config.pin_policy.required_providers =
                parse_providers(required).context("Invalid --require")?;
        }
        if let Some(api) = &self.ipfs_api {
            config = config.with_ipfs_api(api);
        }
        if let Some(seconds) = self.timeout {
            config = config.with_timeout(seconds);
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "ipfs_deploy=debug,info"
    } else {
        "ipfs_deploy=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = cli.apply(DeployConfig::from_env().context("Failed to load configuration")?)?;
    cmd_deploy(config, cli.json).await
}

/// Run one deployment
async fn cmd_deploy(config: DeployConfig, json: bool) -> Result<()> {
    if !json {
        println!(
            "{} {}",
            "📦 Deploying".cyan().bold(),
            config.public_dir_path.display()
        );
    }

    let spinner = if json {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    };

    let events = spinner.clone();
    let deployer = Deployer::from_config(config, Arc::new(SystemEffects::new()))
        .context("Invalid deploy configuration")?
        .on_event(Box::new(move |event| render_event(&events, event)));

    let outcome = deployer.run().await;
    spinner.finish_and_clear();

    let report = match outcome {
        Ok(report) => report,
        Err(e) => {
            if !json {
                eprintln!("{} {}", "❌ Deployment failed:".red().bold(), e);
            }
            return Err(anyhow::Error::new(e).context("Deployment failed"));
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    Ok(())
}

fn step_message(step: Step) -> &'static str {
    match step {
        Step::Preflight => "Checking configuration...",
        Step::LocalAdd => "Adding files to the local node...",
        Step::LocalPin => "Pinning locally...",
        Step::AddressDiscovery => "Looking up node addresses...",
        Step::RemotePin => "Requesting remote pins...",
        Step::DnsUpdate => "Updating DNSLink...",
        Step::PostEffects => "Finishing up...",
    }
}

fn render_event(pb: &ProgressBar, event: &DeployEvent) {
    match event {
        DeployEvent::StepStarted(step) => pb.set_message(step_message(*step)),
        DeployEvent::Added(cid) => {
            pb.println(format!("{} {}", "🔗 Added locally:".green(), cid.to_string().bold()))
        }
        DeployEvent::PinnedLocally => pb.println(format!("{}", "📌 Pinned locally".green())),
        DeployEvent::AddressesDiscovered { total, public } => pb.println(format!(
            "   {} {} of {} addresses are public",
            "Host hints:".dimmed(),
            public,
            total
        )),
        DeployEvent::PinRequested(provider) => {
            pb.println(format!("📠 Requesting remote pin to {}...", provider.host().bold()))
        }
        DeployEvent::Pinned(provider) => {
            pb.println(format!("{} {}", "📌 Pinned to".green(), provider))
        }
        DeployEvent::PinFailed(provider, reason) => pb.println(format!(
            "{} {}: {}",
            "⚠️  Pinning failed on".yellow(),
            provider,
            reason
        )),
        DeployEvent::DnsUpdated { record, content } => pb.println(format!(
            "{} {} = {}",
            "🌐 Updated".green(),
            record,
            content
        )),
        DeployEvent::DnsFailed(reason) => {
            pb.println(format!("{} {}", "⚠️  DNS update failed:".yellow(), reason))
        }
        DeployEvent::Copied(cid) => pb.println(format!(
            "{} {} {}",
            "📋 Hash".green(),
            cid.to_string().bold(),
            "copied to clipboard".green()
        )),
        DeployEvent::Opened(url) => pb.println(format!("{} {}", "🚀 Opened".green(), url)),
        DeployEvent::EffectFailed(reason) => pb.println(format!("{} {}", "⚠️ ".yellow(), reason)),
    }
}

fn print_summary(report: &DeployReport) {
    println!("\n{}", "✅ Deployed".green().bold());
    println!("   {} {}", "CID:".dimmed(), report.cid);
    println!("   {} https://ipfs.io/ipfs/{}", "Gateway:".dimmed(), report.cid);
    if let StepResult::Succeeded(content) = &report.dns {
        println!("   {} {}", "DNSLink:".dimmed(), content);
    }

    let failed = report.failed_pins();
    if !failed.is_empty() {
        let names: Vec<String> = failed.iter().map(ToString::to_string).collect();
        println!(
            "\n{} {}",
            "⚠️  Not pinned on:".yellow().bold(),
            names.join(", ")
        );
    }
    if !report.is_clean() {
        println!("{}", "   Some optional steps failed; see above.".yellow());
    }
}
