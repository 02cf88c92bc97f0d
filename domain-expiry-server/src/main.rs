//! Domain Expiry HTTP Server
//!
//! Serves the "when does this domain expire?" question over HTTP, backed by
//! either a MySQL database or live RDAP/WHOIS lookups from domain-expiry-lib.

mod routes;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use domain_expiry_lib::{
    apply_env_overrides, load_config, ExpiryChecker, LookupBackend, MySqlStore, SchemaLocator,
    ServiceConfig, StaticLocator,
};

/// CLI arguments for domain-expiry-server
#[derive(Parser, Debug)]
#[command(name = "domain-expiry-server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "HTTP service answering when a domain expires")]
struct Args {
    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", env = "DOMAIN_EXPIRY_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config and PORT)
    #[arg(long = "port", value_name = "PORT")]
    port: Option<u16>,

    /// Address to bind (overrides config)
    #[arg(long = "bind", value_name = "ADDR")]
    bind: Option<String>,

    /// Lookup backend: database or live
    #[arg(long = "backend", value_name = "BACKEND")]
    backend: Option<LookupBackend>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("domain_expiry_lib=info,domain_expiry_server=info")
        }))
        .init();

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(&args)?;

    // Database-backed deployments keep the store around so the pool can be
    // closed after the server drains.
    let (checker, store) = match config.lookup.backend {
        LookupBackend::Database => {
            tracing::info!(
                host = %config.database.host,
                database = %config.database.database,
                "connecting to MySQL"
            );
            let store = MySqlStore::connect(&config.database)
                .await?
                .with_default_table(config.lookup.default_table.as_str());

            // Configured table schemas skip runtime discovery entirely.
            let locator: Arc<dyn SchemaLocator> = match &config.lookup.tables {
                Some(tables) => Arc::new(StaticLocator::new(tables.clone())),
                None => Arc::new(store.clone()),
            };

            let checker = ExpiryChecker::with_database(locator, Arc::new(store.clone()));
            (checker, Some(store))
        }
        LookupBackend::Live => (ExpiryChecker::live()?, None),
    };

    let state = Arc::new(routes::AppState::new(checker, &config.server));
    let app = routes::router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        address = %addr,
        backend = %config.lookup.backend,
        "domain expiry server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(store) = store {
        store.close().await;
    }
    tracing::info!("shut down cleanly");

    Ok(())
}

/// Resolve the effective configuration.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables (PORT, DB_*)
/// 3. Config file (--config, DOMAIN_EXPIRY_CONFIG, or discovered)
/// 4. Built-in defaults
fn resolve_config(args: &Args) -> Result<ServiceConfig, Box<dyn std::error::Error>> {
    let mut file_config = load_config(args.config.as_deref())?;
    apply_env_overrides(&mut file_config);

    if let Some(port) = args.port {
        file_config.server.get_or_insert_with(Default::default).port = Some(port);
    }
    if let Some(bind) = &args.bind {
        file_config.server.get_or_insert_with(Default::default).bind = Some(bind.clone());
    }
    if let Some(backend) = args.backend {
        file_config
            .lookup
            .get_or_insert_with(Default::default)
            .backend = Some(backend);
    }

    Ok(ServiceConfig::resolve(file_config)?)
}

/// Resolve on Ctrl+C or SIGTERM so in-flight requests get drained.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, draining connections");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            config: None,
            port: None,
            bind: None,
            backend: None,
        }
    }

    #[test]
    fn test_resolve_config_defaults() {
        let config = resolve_config(&base_args()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.lookup.backend, LookupBackend::Database);
    }

    #[test]
    fn test_cli_port_overrides_default() {
        let mut args = base_args();
        args.port = Some(8080);

        let config = resolve_config(&args).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_cli_backend_switches_to_live() {
        let mut args = base_args();
        args.backend = Some(LookupBackend::Live);

        let config = resolve_config(&args).unwrap();
        assert_eq!(config.lookup.backend, LookupBackend::Live);
    }

    #[test]
    fn test_cli_bind_address() {
        let mut args = base_args();
        args.bind = Some("127.0.0.1".to_string());

        let config = resolve_config(&args).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1");
    }
}
