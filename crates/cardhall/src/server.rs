//! `CardhallServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → room.

use std::sync::Arc;

use cardhall_protocol::JsonCodec;
use cardhall_room::{RoomConfig, RoomManager};
use cardhall_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::{CardhallError, ServerConfig};

/// Shared server state passed to each connection task.
///
/// The manager is locked only while a `JOIN` is routed; everything after
/// that goes straight to the room through its handle.
pub(crate) struct ServerState {
    pub(crate) rooms: Mutex<RoomManager>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a server.
///
/// ```rust,ignore
/// let server = CardhallServer::builder()
///     .bind("0.0.0.0:3000")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct CardhallServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
}

impl CardhallServerBuilder {
    pub fn new() -> Self {
        ServerConfig::default().into()
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the configuration every room is created with.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Binds the listener. Connections are not accepted until
    /// [`CardhallServer::run`].
    pub async fn build(self) -> Result<CardhallServer, CardhallError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            rooms: Mutex::new(RoomManager::new(self.room_config)),
            codec: JsonCodec,
        });

        Ok(CardhallServer { transport, state })
    }
}

impl Default for CardhallServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ServerConfig> for CardhallServerBuilder {
    fn from(config: ServerConfig) -> Self {
        Self {
            bind_addr: config.bind_addr,
            room_config: config.room,
        }
    }
}

/// A bound Cardhall server.
pub struct CardhallServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
}

impl CardhallServer {
    pub fn builder() -> CardhallServerBuilder {
        CardhallServerBuilder::new()
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Accepts connections forever, one handler task each.
    ///
    /// A failed accept or upgrade is logged and skipped; it never stops
    /// the loop.
    pub async fn run(mut self) -> Result<(), CardhallError> {
        tracing::info!(addr = ?self.local_addr().ok(), "cardhall server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                }
            }
        }
    }
}
