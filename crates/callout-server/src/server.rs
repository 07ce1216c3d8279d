//! `GameServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → session. One server
//! process hosts exactly one session; connections beyond the third player
//! (or after the game ends) are rejected politely by the handler.

use std::sync::Arc;

use callout_protocol::JsonCodec;
use callout_transport::TcpAcceptor;

use crate::ServerError;
use crate::handler::handle_connection;
use crate::session::GameSession;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. This is the
/// session context object: created once per server run, never global.
pub(crate) struct ServerState {
    pub(crate) session: GameSession,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Callout server.
///
/// # Example
///
/// ```rust,no_run
/// use callout_server::GameServer;
///
/// # async fn run() -> Result<(), callout_server::ServerError> {
/// let server = GameServer::builder()
///     .bind("127.0.0.1:12345")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct GameServerBuilder {
    bind_addr: String,
}

impl GameServerBuilder {
    /// Creates a new builder with the default bind address.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:12345".to_string(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Binds the listener and builds the server.
    pub async fn build(self) -> Result<GameServer, ServerError> {
        let acceptor = TcpAcceptor::bind(&self.bind_addr).await?;
        let state = Arc::new(ServerState {
            session: GameSession::new(),
            codec: JsonCodec,
        });
        Ok(GameServer { acceptor, state })
    }
}

impl Default for GameServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Callout server hosting one three-player session.
pub struct GameServer {
    acceptor: TcpAcceptor,
    state: Arc<ServerState>,
}

impl GameServer {
    /// Creates a new builder.
    pub fn builder() -> GameServerBuilder {
        GameServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.acceptor.local_addr()
    }

    /// A handle to the session, for inspecting phase and role holders.
    pub fn session(&self) -> SessionHandle {
        SessionHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Runs the accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated; a failed accept is logged and
    /// the loop keeps serving.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("server waiting for three players");

        loop {
            match self.acceptor.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// A cloneable view of the running session.
///
/// `GameServer::run` consumes the server, so anything that wants to watch
/// the game from outside — the integration tests, mostly — grabs one of
/// these first.
#[derive(Clone)]
pub struct SessionHandle {
    state: Arc<ServerState>,
}

impl std::ops::Deref for SessionHandle {
    type Target = GameSession;

    fn deref(&self) -> &GameSession {
        &self.state.session
    }
}
