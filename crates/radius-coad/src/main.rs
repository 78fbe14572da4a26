use clap::Parser;
use radius_coad::{CoaServer, Config, ServerConfig};
use std::path::PathBuf;
use std::process;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// coad - RADIUS CoA/Disconnect-Message gateway (RFC 5176)
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "coad")]
struct Cli {
    /// Path to a JSON configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Validate configuration and exit (doesn't start server)
    #[arg(long)]
    validate: bool,
}

fn load_config(cli: &Cli) -> Result<Config, radius_coad::ConfigError> {
    let mut config = match cli.config {
        Some(ref path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.apply_env()?;
    Ok(config)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            if cli.validate {
                eprintln!("Configuration validation failed: {}", e);
            } else {
                tracing_subscriber::registry()
                    .with(EnvFilter::new("info"))
                    .with(tracing_subscriber::fmt::layer())
                    .init();
                error!("Invalid configuration: {}", e);
            }
            process::exit(1);
        }
    };

    if cli.validate {
        if let Err(e) = config.validate() {
            eprintln!("Configuration validation failed: {}", e);
            process::exit(1);
        }
        println!("Configuration validated successfully");
        println!();
        println!("  Listen: {}:{}", config.listen_address, config.listen_port);
        println!("  IPC socket: {}", config.ipc_socket.display());
        println!("  IPC timeout: {} ms", config.ipc_timeout_ms);
        println!("  Clients: {}", config.clients.len());
        println!("  Log level: {}", config.log_level.as_deref().unwrap_or("info"));
        process::exit(0);
    }

    let log_level = config.log_level.as_deref().unwrap_or("info");
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("coad v{}", env!("CARGO_PKG_VERSION"));
    info!(
        listen = %format!("{}:{}", config.listen_address, config.listen_port),
        ipc = %config.ipc_socket.display(),
        timeout_ms = config.ipc_timeout_ms,
        "coad starting"
    );

    if config.clients.is_empty() {
        warn!("No clients configured: accepting requests from any address signed with the default secret");
    } else {
        for client in &config.clients {
            let status = if client.enabled { "enabled" } else { "disabled" };
            let name = client.name.as_deref().unwrap_or("(unnamed)");
            info!("Client {} - {} ({})", client.address, name, status);
        }
    }

    let server_config = match ServerConfig::from_config(config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };

    let server = match CoaServer::new(server_config).await {
        Ok(srv) => srv,
        Err(e) => {
            error!("Failed to create server: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        error!("Server error: {}", e);
        process::exit(1);
    }
}
