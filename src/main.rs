//! stackup - deploy Compose manifests to a Docker-compatible engine
//!
//! This is the main CLI entry point.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use stackup::compose::{ComposeParser, Manifest, ManifestTranslator};
use stackup::config::{EntryPolicy, MissingHealthcheck, StackupConfig};
use stackup::deploy::Orchestrator;
use stackup::runtime::{HttpRuntime, RuntimeClient};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// stackup - Compose deployments for Docker-compatible engines
#[derive(Parser)]
#[command(name = "stackup")]
#[command(author = "Evoker Industries")]
#[command(version)]
#[command(about = "Deploy Compose manifests to a Docker-compatible engine", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create networks and start every service
    Deploy {
        /// Compose file
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Engine API URL
        #[arg(long)]
        runtime: Option<String>,
        /// Fail a service on malformed port or volume entries
        #[arg(long)]
        strict: bool,
        /// Healthcheck for services that declare none
        #[arg(long, value_enum)]
        healthcheck_default: Option<HealthcheckDefault>,
        /// Exit non-zero if any service failed
        #[arg(long)]
        fail_on_error: bool,
    },

    /// Validate a compose file and print the translated configuration
    Config {
        /// Compose file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum HealthcheckDefault {
    /// No healthcheck
    None,
    /// A healthcheck that always fails
    Failing,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = StackupConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let working_dir = std::env::current_dir()?;

    match cli.command {
        Commands::Deploy {
            file,
            runtime,
            strict,
            healthcheck_default,
            fail_on_error,
        } => {
            if let Some(url) = runtime {
                config.runtime.url = url.trim_end_matches('/').to_string();
            }
            if strict {
                config.translate.entry_policy = EntryPolicy::Strict;
            }
            match healthcheck_default {
                Some(HealthcheckDefault::Failing) => {
                    config.translate.missing_healthcheck = MissingHealthcheck::FailingDefault
                }
                Some(HealthcheckDefault::None) => {
                    config.translate.missing_healthcheck = MissingHealthcheck::Skip
                }
                None => {}
            }
            config.validate()?;

            let (compose_file, manifest) = load_manifest(file, &working_dir)?;
            for warning in ComposeParser::validate(&manifest) {
                tracing::warn!("{}", warning);
            }

            let project_name = project_name(&manifest, &compose_file, &working_dir);
            let translator = ManifestTranslator::new(&project_name, config.translate.clone());
            let runtime: Arc<dyn RuntimeClient> = Arc::new(HttpRuntime::new(config.runtime.clone())?);

            let cancel = Arc::new(AtomicBool::new(false));
            let signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupted, stopping after the current service");
                    signal.store(true, Ordering::SeqCst);
                }
            });

            println!("Deploying {} to {}", project_name, config.runtime.url);
            let report = Orchestrator::new(runtime, translator)
                .with_cancel(cancel)
                .deploy(&manifest)
                .await;

            for network in &report.networks {
                tracing::debug!("network {}: {:?}", network.network, network.status);
            }
            for outcome in &report.services {
                println!("{}", outcome);
            }
            println!("{}", report.summary());

            if fail_on_error && !report.is_success() {
                bail!("deployment {} finished with failures", report.id);
            }
        }

        Commands::Config { file } => {
            let (compose_file, manifest) = load_manifest(file, &working_dir)?;
            let warnings = ComposeParser::validate(&manifest);

            if warnings.is_empty() {
                println!("Configuration is valid");
            } else {
                for warning in &warnings {
                    println!("WARNING: {}", warning);
                }
            }

            let project_name = project_name(&manifest, &compose_file, &working_dir);
            let translator = ManifestTranslator::new(&project_name, config.translate.clone());

            let networks = translator.translate_networks(&manifest);
            println!("{}", serde_json::to_string_pretty(&networks)?);

            for (name, result) in translator.translate_services(&manifest) {
                match result {
                    Ok(container) => {
                        println!("# {} -> {}", name, container.name);
                        println!("{}", serde_json::to_string_pretty(&container)?);
                    }
                    Err(e) => println!("# {}: {}", name, e),
                }
            }
        }
    }

    Ok(())
}

/// Locate, parse and interpolate the compose file
fn load_manifest(file: Option<PathBuf>, working_dir: &Path) -> Result<(PathBuf, Manifest)> {
    let compose_file = file.unwrap_or_else(|| {
        ComposeParser::find_compose_file(working_dir)
            .unwrap_or_else(|| working_dir.join("compose.yaml"))
    });

    let mut manifest = ComposeParser::parse_file(&compose_file)
        .with_context(|| format!("reading {}", compose_file.display()))?;
    let env: HashMap<String, String> = std::env::vars().collect();
    ComposeParser::interpolate(&mut manifest, &env);

    Ok((compose_file, manifest))
}

/// Manifest `name`, else the compose file's directory
fn project_name(manifest: &Manifest, compose_file: &Path, working_dir: &Path) -> String {
    if let Some(name) = &manifest.name {
        return name.clone();
    }

    let dir = compose_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(working_dir);
    let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    dir.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("default")
        .to_string()
}
