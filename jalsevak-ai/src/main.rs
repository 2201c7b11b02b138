//! jalsevak-ai - Translation and Advisory Service
//!
//! **Module Identity:**
//! - Name: jalsevak-ai
//! - Port: 5730 (default)
//!
//! Serves batch translation of UI strings and structured farming advisories
//! over HTTP, and translates locale files from the command line.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use jalsevak_common::config::{
    default_config_path, load_toml_config, resolve_api_key, resolve_config_path,
    write_toml_config, LoggingConfig, TomlConfig,
};
use jalsevak_common::logging::init_tracing;
use serde_json::Value;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use jalsevak_ai::config::coordinator_config;
use jalsevak_ai::locale::{flatten_locale, unflatten_into, DEFAULT_SEPARATOR};
use jalsevak_ai::providers::build_providers;
use jalsevak_ai::translation::{TranslationCoordinator, TranslationItem};
use jalsevak_ai::types::TargetLanguage;
use jalsevak_ai::AppState;

/// Command-line arguments for jalsevak-ai
#[derive(Parser, Debug)]
#[command(name = "jalsevak-ai")]
#[command(about = "Translation and farming advisory service for JalSevak")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service (default)
    Serve {
        /// Address to bind (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Translate a nested JSON locale file
    TranslateFile {
        /// Source locale file (e.g. en.json)
        input: PathBuf,

        /// Target language code or name ("hi", "Marathi")
        #[arg(short, long)]
        target: String,

        /// Output file (default: <stem>.<target>.json next to the input)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Write a config file with default settings
    InitConfig {
        /// Store this API key in the file
        #[arg(long)]
        api_key: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    });

    if let Command::InitConfig { api_key, force } = &command {
        init_tracing(&LoggingConfig::default())?;
        return init_config(args.config.as_deref(), api_key.clone(), *force);
    }

    let config = load_toml_config(args.config.as_deref())?;
    init_tracing(&config.logging)?;

    info!(
        "Starting JalSevak AI (jalsevak-ai) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    // load_toml_config ran before the subscriber existed
    match resolve_config_path(args.config.as_deref()) {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file, using built-in defaults"),
    }

    let api_key = resolve_api_key(&config);

    let providers = build_providers(&config.provider, api_key)
        .context("Failed to initialize providers")?;
    let translation = coordinator_config(&config.translation)?;

    match command {
        Command::Serve { host, port } => {
            let state = AppState::from_providers(providers, translation);
            serve(&config, host, port, state).await
        }
        Command::TranslateFile {
            input,
            target,
            output,
        } => {
            let coordinator = TranslationCoordinator::new(providers.translator, translation);
            translate_file(&coordinator, &input, &target, output).await
        }
        Command::InitConfig { .. } => Ok(()),
    }
}

async fn serve(
    config: &TomlConfig,
    host: Option<String>,
    port: Option<u16>,
    state: AppState,
) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

    info!(
        translator = state.coordinator.translator_name(),
        configured = state.coordinator.is_configured(),
        "Translation coordinator ready"
    );

    let app = jalsevak_ai::build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Flatten, translate and rebuild one locale file
///
/// Ctrl+C stops sending batches; whatever was not translated yet is written
/// with its source text.
async fn translate_file(
    coordinator: &TranslationCoordinator,
    input: &Path,
    target: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let target = TargetLanguage::new(target)?;
    let output = match output {
        Some(path) => path,
        None => default_output_path(input, &target)?,
    };

    let source = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let document: Value = serde_json::from_str(&source)
        .with_context(|| format!("{} is not valid JSON", input.display()))?;
    if !document.is_object() {
        bail!("{} must contain a JSON object", input.display());
    }

    let flat = flatten_locale(&document, DEFAULT_SEPARATOR)
        .with_context(|| format!("Cannot flatten {}", input.display()))?;
    info!(
        input = %input.display(),
        strings = flat.len(),
        target = %target,
        "Translating locale file"
    );

    let items = flat
        .iter()
        .map(|(key, text)| TranslationItem::new(key.clone(), text.clone()))
        .collect();

    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, remaining batches keep source text");
                cancel.cancel();
            }
        })
    };

    let outcome = coordinator
        .translate_items(items, &target, Some(&cancel))
        .await;
    watcher.abort();
    let outcome = outcome?;

    let translations: IndexMap<String, String> = outcome
        .items
        .into_iter()
        .map(|item| (item.id, item.text))
        .collect();
    let rebuilt = unflatten_into(&document, &translations, DEFAULT_SEPARATOR);

    let mut text = serde_json::to_string_pretty(&rebuilt)?;
    text.push('\n');
    std::fs::write(&output, text)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if outcome.report.is_complete() {
        info!(output = %output.display(), "Locale file translated");
    } else {
        warn!(
            output = %output.display(),
            batches_failed = outcome.report.batches_failed,
            items_fallback = outcome.report.items_fallback,
            "Locale file written with untranslated strings"
        );
    }
    Ok(())
}

/// `locales/en.json` + "hi" → `locales/en.hi.json`
///
/// The designator becomes part of a file name, so it must not contain path
/// separators or parent references; pass `--output` for such targets.
fn default_output_path(input: &Path, target: &TargetLanguage) -> Result<PathBuf> {
    let designator = target.as_str();
    if designator.contains(['/', '\\']) || designator.contains("..") {
        bail!(
            "Target '{}' cannot be used in a file name; pass --output",
            designator
        );
    }

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "locale".to_string());
    Ok(input.with_file_name(format!("{}.{}.json", stem, designator)))
}

fn init_config(cli_path: Option<&Path>, api_key: Option<String>, force: bool) -> Result<()> {
    let path = match cli_path {
        Some(path) => path.to_path_buf(),
        None => resolve_config_path(None)
            .or_else(default_config_path)
            .context("Cannot determine a config directory; pass --config")?,
    };

    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let mut config = TomlConfig::default();
    config.provider.api_key = api_key;
    write_toml_config(&config, &path)?;

    info!("Wrote config to {}", path.display());
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
