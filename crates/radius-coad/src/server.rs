use crate::config::{ClientTable, Config, ConfigError};
use crate::handler::Dispatcher;
use crate::ipc::{IpcClient, SessionAuthority};
use crate::response::build_reply;
use radius_proto::{
    is_authentic_request, verify_request_message_authenticator, AttributeType, Packet,
    PacketError,
};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Packet error: {0}")]
    Packet(#[from] PacketError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid client")]
    InvalidClient,
    #[error("Unsupported code: {0}")]
    UnsupportedCode(u8),
    #[error("Request authenticator mismatch")]
    BadAuthenticator,
    #[error("Message-Authenticator mismatch")]
    BadMessageAuthenticator,
}

/// Everything a request task needs, shared read-only between tasks
pub struct ServerConfig {
    /// Bind address for the server
    pub bind_addr: SocketAddr,
    /// Authorized sources and their secrets
    pub clients: ClientTable,
    /// Request routing
    pub dispatcher: Dispatcher,
}

impl ServerConfig {
    /// Wire the server to an arbitrary session authority
    pub fn new(config: Config, authority: Arc<dyn SessionAuthority>) -> Result<Self, ServerError> {
        config.validate()?;
        Ok(ServerConfig {
            bind_addr: config.socket_addr()?,
            clients: ClientTable::from_config(&config)?,
            dispatcher: Dispatcher::new(authority),
        })
    }

    /// Wire the server to the session authority socket named in `config`
    pub fn from_config(config: Config) -> Result<Self, ServerError> {
        let client = IpcClient::new(config.ipc_socket.clone(), config.ipc_timeout());
        Self::new(config, Arc::new(client))
    }
}

/// RADIUS Dynamic Authorization Server (RFC 5176)
pub struct CoaServer {
    config: Arc<ServerConfig>,
    socket: Arc<UdpSocket>,
}

impl CoaServer {
    /// Bind the listening socket
    pub async fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let socket = UdpSocket::bind(config.bind_addr).await?;
        info!("CoA/DM server listening on {}", socket.local_addr()?);

        Ok(CoaServer {
            config: Arc::new(config),
            socket: Arc::new(socket),
        })
    }

    /// Get the local address the server is listening on
    ///
    /// This is useful for testing when binding to port 0 (OS-assigned port)
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.socket.local_addr().map_err(ServerError::from)
    }

    /// Receive datagrams forever, one task per datagram
    pub async fn run(&self) -> Result<(), ServerError> {
        let mut buf = vec![0u8; Packet::MAX_PACKET_SIZE];

        loop {
            let (len, addr) = self.socket.recv_from(&mut buf).await?;
            let data = buf[..len].to_vec();

            let config = Arc::clone(&self.config);
            let socket = Arc::clone(&self.socket);

            tokio::spawn(async move {
                if let Err(e) = Self::handle_request(data, addr, config, socket).await {
                    debug!("Dropped request from {}: {}", addr, e);
                }
            });
        }
    }

    /// Authenticate, dispatch and answer a single datagram
    async fn handle_request(
        data: Vec<u8>,
        addr: SocketAddr,
        config: Arc<ServerConfig>,
        socket: Arc<UdpSocket>,
    ) -> Result<(), ServerError> {
        if !config.clients.is_authorized(addr.ip()) {
            let request_id = data.get(1).copied().unwrap_or(0);
            warn!(
                client_ip = %addr.ip(),
                request_id = request_id,
                "Rejected request from unauthorized client"
            );
            return Err(ServerError::InvalidClient);
        }

        let secret = config.clients.secret_for(addr.ip());

        let request = Packet::decode(&data).map_err(|e| {
            warn!(client_ip = %addr.ip(), error = %e, "Rejected malformed packet");
            e
        })?;

        // Replies sent to us are never answered
        if !request.code.is_request() {
            warn!(
                client_ip = %addr.ip(),
                code = request.code.as_u8(),
                packet_type = ?request.code,
                request_id = request.identifier,
                "Ignoring unsupported RADIUS code"
            );
            return Err(ServerError::UnsupportedCode(request.code.as_u8()));
        }

        if !is_authentic_request(&request, secret) {
            warn!(
                client_ip = %addr.ip(),
                request_id = request.identifier,
                packet_type = ?request.code,
                "Rejected request with invalid authenticator"
            );
            return Err(ServerError::BadAuthenticator);
        }

        let message_auth = AttributeType::MessageAuthenticator as u8;
        if let Some(offset) = request.attribute_value_offset(message_auth) {
            let well_formed = request
                .find_attribute(message_auth)
                .is_some_and(|attr| attr.value.len() == 16);
            let packet_bytes = &data[..request.length()];
            if !well_formed || !verify_request_message_authenticator(packet_bytes, secret, offset) {
                warn!(
                    client_ip = %addr.ip(),
                    request_id = request.identifier,
                    "Rejected request with invalid Message-Authenticator"
                );
                return Err(ServerError::BadMessageAuthenticator);
            }
        }

        debug!(
            packet_type = ?request.code,
            client_addr = %addr,
            request_id = request.identifier,
            "Received RADIUS packet"
        );

        let Some(reply) = config.dispatcher.dispatch(&request).await else {
            return Ok(());
        };

        let response = build_reply(&request, &reply, secret)?;
        let response_data = response.encode()?;

        // A lost reply is recovered by the client retransmitting
        if let Err(e) = socket.send_to(&response_data, addr).await {
            warn!(
                client_addr = %addr,
                request_id = response.identifier,
                error = %e,
                "Failed to send reply"
            );
            return Err(e.into());
        }

        debug!(
            response_type = ?response.code,
            client_addr = %addr,
            request_id = response.identifier,
            "Sent RADIUS response"
        );

        Ok(())
    }
}
