use ipnetwork::IpNetwork;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding the default shared secret
pub const ENV_SECRET: &str = "RADIUS_SECRET";
/// Environment variable overriding the UDP listen address (`host:port` or `:port`)
pub const ENV_LISTEN_ADDR: &str = "COA_LISTEN_ADDR";
/// Environment variable overriding the session authority socket path
pub const ENV_IPC_SOCKET: &str = "COA_IPC_SOCKET";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Environment variable not set: {0}")]
    MissingEnvVar(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Dynamic Authorization Client (the AAA/OSS server sending us requests)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    /// Client IP address or network (supports CIDR notation)
    pub address: String,
    /// Shared secret for this client
    pub secret: String,
    /// Optional client name/description
    #[serde(default)]
    pub name: Option<String>,
    /// Enable/disable this client
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Client {
    /// Parse the client address as an IP network
    pub fn parse_network(&self) -> Result<IpNetwork, ConfigError> {
        if let Ok(network) = self.address.parse::<IpNetwork>() {
            return Ok(network);
        }

        // Single address becomes a /32 or /128
        if let Ok(ip) = self.address.parse::<IpAddr>() {
            return Ok(IpNetwork::from(ip));
        }

        Err(ConfigError::Invalid(format!(
            "Invalid client address: {}",
            self.address
        )))
    }
}

/// Gateway configuration
///
/// Built once before the server starts and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// UDP listen address
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// UDP listen port (3799 is the RFC 5176 port)
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Default shared secret, used for sources without a client entry
    #[serde(default = "default_secret")]
    pub secret: String,

    /// Unix socket of the session authority
    #[serde(default = "default_ipc_socket")]
    pub ipc_socket: PathBuf,

    /// Deadline for one whole IPC exchange, in milliseconds
    #[serde(default = "default_ipc_timeout_ms")]
    pub ipc_timeout_ms: u64,

    /// Authorized clients. Empty accepts requests from any source.
    #[serde(default)]
    pub clients: Vec<Client>,

    /// Log level: "trace", "debug", "info", "warn", "error" (default: "info")
    #[serde(default)]
    pub log_level: Option<String>,
}

fn default_listen_address() -> String {
    "0.0.0.0".to_string()
}

fn default_listen_port() -> u16 {
    3799
}

fn default_secret() -> String {
    "testing123".to_string()
}

fn default_ipc_socket() -> PathBuf {
    PathBuf::from("/tmp/coad.sock")
}

fn default_ipc_timeout_ms() -> u64 {
    3000
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen_address: default_listen_address(),
            listen_port: default_listen_port(),
            secret: default_secret(),
            ipc_socket: default_ipc_socket(),
            ipc_timeout_ms: default_ipc_timeout_ms(),
            clients: vec![],
            log_level: None,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    ///
    /// `${VAR}` references inside the file are replaced with the value of the
    /// environment variable before parsing.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let expanded = expand_env_vars(&contents)?;
        let config: Config = serde_json::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `RADIUS_SECRET`, `COA_LISTEN_ADDR` and `COA_IPC_SOCKET` from the process environment
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|key| env::var(key).ok())
    }

    /// Apply environment overrides read through `lookup`
    ///
    /// Unset and empty variables leave the current value alone.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(secret) = lookup(ENV_SECRET) {
            self.secret = secret;
        }

        if let Some(addr) = lookup(ENV_LISTEN_ADDR) {
            let (host, port) = parse_listen_addr(&addr)?;
            self.listen_address = host;
            self.listen_port = port;
        }

        if let Some(path) = lookup(ENV_IPC_SOCKET) {
            self.ipc_socket = PathBuf::from(path);
        }

        self.validate()
    }

    /// Get socket address for binding
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr: IpAddr = self.listen_address.parse().map_err(|_| {
            ConfigError::Invalid(format!("Invalid IP address: {}", self.listen_address))
        })?;
        Ok(SocketAddr::new(addr, self.listen_port))
    }

    /// IPC deadline as a duration
    pub fn ipc_timeout(&self) -> Duration {
        Duration::from_millis(self.ipc_timeout_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;

        if self.secret.is_empty() {
            return Err(ConfigError::Invalid("Secret cannot be empty".to_string()));
        }

        if self.ipc_socket.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "IPC socket path cannot be empty".to_string(),
            ));
        }

        if self.ipc_timeout_ms == 0 {
            return Err(ConfigError::Invalid("IPC timeout cannot be 0".to_string()));
        }

        ClientTable::from_config(self)?;

        Ok(())
    }
}

/// Client list with every address parsed up front
///
/// Built once at startup; lookups per datagram only compare networks.
#[derive(Debug, Clone)]
pub struct ClientTable {
    /// Enabled clients in configuration order
    entries: Vec<(IpNetwork, Client)>,
    default_secret: String,
    /// No clients configured: every source is accepted
    accept_any: bool,
}

impl ClientTable {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut entries = Vec::with_capacity(config.clients.len());
        for client in &config.clients {
            if client.secret.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "Client {} has empty secret",
                    client.address
                )));
            }
            let network = client.parse_network()?;
            if client.enabled {
                entries.push((network, client.clone()));
            }
        }

        Ok(ClientTable {
            entries,
            default_secret: config.secret.clone(),
            accept_any: config.clients.is_empty(),
        })
    }

    /// First enabled client whose network contains `source_ip`
    pub fn find(&self, source_ip: IpAddr) -> Option<&Client> {
        self.entries
            .iter()
            .find(|(network, _)| network.contains(source_ip))
            .map(|(_, client)| client)
    }

    /// Whether requests from `source_ip` may be processed at all
    pub fn is_authorized(&self, source_ip: IpAddr) -> bool {
        self.accept_any || self.find(source_ip).is_some()
    }

    /// The matching client's secret, else the default secret
    pub fn secret_for(&self, source_ip: IpAddr) -> &[u8] {
        self.find(source_ip)
            .map(|client| client.secret.as_bytes())
            .unwrap_or(self.default_secret.as_bytes())
    }
}

/// Split `host:port` or `:port` into its parts. A bare `:port` listens on all interfaces.
fn parse_listen_addr(value: &str) -> Result<(String, u16), ConfigError> {
    let invalid = || ConfigError::Invalid(format!("Invalid listen address: {}", value));

    if let Ok(addr) = value.parse::<SocketAddr>() {
        return Ok((addr.ip().to_string(), addr.port()));
    }

    let (host, port) = value.rsplit_once(':').ok_or_else(invalid)?;
    let port: u16 = port.parse().map_err(|_| invalid())?;
    let host = if host.is_empty() {
        default_listen_address()
    } else {
        host.parse::<IpAddr>().map_err(|_| invalid())?.to_string()
    };

    Ok((host, port))
}

/// Replace `${VAR}` references with environment values
fn expand_env_vars(contents: &str) -> Result<String, ConfigError> {
    let pattern = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;

    let mut expanded = String::with_capacity(contents.len());
    let mut last = 0;
    for captures in pattern.captures_iter(contents) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let value =
            env::var(name.as_str()).map_err(|_| ConfigError::MissingEnvVar(name.as_str().into()))?;
        expanded.push_str(&contents[last..whole.start()]);
        expanded.push_str(&value);
        last = whole.end();
    }
    expanded.push_str(&contents[last..]);

    Ok(expanded)
}
