//! `portico run`: start the gateway.
//!
//! Loads the configuration once, builds the immutable routing tables,
//! and serves requests with graceful shutdown. The tables are never
//! reloaded; restart the process to pick up a config change.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::cli::RunArgs;
use crate::config::sources::file_source::FileSource;
use crate::config::ConfigSource;
use crate::error::PorticoError;
use crate::logging;
use crate::server::{self, AppState, LoadedConfig};

const CANDIDATES: [&str; 4] = [
    "portico.yaml",
    "portico.yml",
    "portico.json",
    "portico.toml",
];

pub async fn execute(args: RunArgs) -> Result<(), PorticoError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    let source = resolve_config_source(args.config.as_deref()).await?;
    let (mut config, version) = source.load().await?;

    if let Some(timeout) = args.timeout {
        config.gateway.timeout = timeout;
    }

    for service in config.unused_services() {
        tracing::warn!(service = %service, "service is not referenced by any endpoint");
    }

    let loaded = LoadedConfig {
        version,
        source_name: source.name().to_string(),
        loaded_at: Instant::now(),
    };
    tracing::info!(
        source = %loaded.source_name,
        version = %loaded.version.short(),
        "config loaded"
    );

    let state = Arc::new(AppState::new(&config, loaded, args.max_body));
    let router = server::build_router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        mount_path = %config.gateway.mount_path,
        services = config.services.len(),
        endpoints = config.endpoints.len(),
        timeout_ms = config.gateway.timeout,
        "portico started"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(server::shutdown_signal())
        .await?;

    tracing::info!("portico stopped");
    Ok(())
}

async fn resolve_config_source(
    explicit: Option<&Path>,
) -> Result<Box<dyn ConfigSource>, PorticoError> {
    if let Some(path) = explicit {
        return create_file_source(path);
    }

    for name in &CANDIDATES {
        let path = PathBuf::from(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::info!(path = %path.display(), "auto-detected config file");
            return create_file_source(&path);
        }
    }

    Err(PorticoError::NoConfigSource {
        hint: "Provide --config <file> or place portico.yaml in the working directory.\n  \
               Run 'portico init' to create a config file."
            .into(),
    })
}

fn create_file_source(path: &Path) -> Result<Box<dyn ConfigSource>, PorticoError> {
    Ok(Box::new(FileSource::for_path(path)?))
}
