/// Staticd - Main entry point
/// Acquires a listening socket over the configured port scan, then serves
/// the static site until interrupted.
use clap::Parser;
use staticd_core::ListenerFactory;
use staticd_daemon::{DaemonConfig, StaticServer};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "staticd",
    about = "Static-site server with ordered port fallback",
    version = env!("CARGO_PKG_VERSION")
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "PATH",
        help = "Path to configuration file (TOML)"
    )]
    config: Option<PathBuf>,

    /// Preferred port
    #[arg(short, long, value_name = "PORT", help = "Preferred port (default: 5000)")]
    port: Option<u16>,

    /// Bind address
    #[arg(
        short,
        long,
        value_name = "ADDR",
        help = "Bind address (default: 0.0.0.0)"
    )]
    bind: Option<String>,

    /// Site root directory
    #[arg(short, long, value_name = "DIR", help = "Directory to serve (default: .)")]
    root: Option<PathBuf>,

    /// Evict the preferred port's holder
    #[arg(
        long,
        help = "Send SIGTERM to whatever holds the preferred port before falling back (destructive)"
    )]
    evict_holder: bool,

    /// Log level
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        default_value = "info",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    log_level: String,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose output")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging
    let log_level = if args.verbose {
        "debug"
    } else {
        &args.log_level
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.parse()?))
        .with_target(false)
        .with_line_number(true)
        .init();

    info!("Starting staticd v{}", staticd_daemon::VERSION);

    // Load configuration: defaults < file < PORT env var < CLI flags
    let config_path = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Some(path.to_str().ok_or_else(|| {
                anyhow::anyhow!("config path is not valid UTF-8")
            })?)
        }
        None => {
            info!("Using default configuration");
            None
        }
    };
    let mut config = DaemonConfig::load_or_default(config_path)?;
    config.apply_env();

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }
    if let Some(root) = args.root {
        config.server.site_root = root;
    }
    if args.evict_holder {
        config.recovery.evict_holder = true;
    }

    // Validate configuration
    config.validate()?;

    let addr: IpAddr = config
        .server
        .bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid bind address {}: {}", config.server.bind_addr, e))?;
    let factory = ListenerFactory::new(addr, config.port_list())
        .with_eviction(config.recovery.evict_holder);

    info!(
        "Port scan: {:?} on {}",
        factory.ports().ports(),
        config.server.bind_addr
    );
    if config.recovery.evict_holder {
        warn!("Port-holder eviction is ENABLED");
    }

    let retry_after = config.recovery.retry_after_secs.map(Duration::from_secs);
    let bound = match factory.acquire_with_retry(retry_after) {
        Ok(bound) => bound,
        Err(e) => {
            error!(
                "Could not bind any candidate in {:?}: {}",
                factory.ports().ports(),
                e
            );
            std::process::exit(1);
        }
    };

    if !bound.skipped.is_empty() {
        info!("Skipped occupied ports: {:?}", bound.skipped);
    }
    info!("Bound endpoint: {}", bound.endpoint);

    // Create the server and run it until a shutdown signal arrives
    let server = StaticServer::new(&config)?;
    server.run(bound, shutdown_signal()).await?;

    info!("staticd stopped");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received CTRL+C signal");
        },
        () = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
