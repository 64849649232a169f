//! Warden production server.
//!
//! This crate provides the server runtime around the Sans-IO arbiter
//! core:
//!
//! ```text
//! warden-server
//!   ├─ SystemEnv           (production Environment impl)
//!   ├─ TcpTransport        (length-prefixed CBOR over TCP)
//!   ├─ ConnectionRegistry  (pid → connection, grant pushes)
//!   ├─ sweep loop          (periodic tick, executes SweepActions)
//!   └─ Arbiter             (warden-core state machine)
//! ```
//!
//! ## Concurrency model
//!
//! Every mutation of arbiter state — client calls and the sweep tick
//! alike — goes through one `Arc<tokio::sync::Mutex<Arbiter>>`. The
//! coarse lock is the point: per-resource reads and writes from distinct
//! connections must never interleave, and the table's invariants hold
//! under the client-call/sweeper race exactly because both serialize
//! here. No call path ever blocks waiting for a resource; waiting
//! clients get their grant through the registry push.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod registry;
pub mod status;
mod system_env;
pub mod transport;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::{
    net::TcpStream,
    sync::{Mutex, mpsc},
};
use warden_core::{Arbiter, SweepAction, Sweeper, SweeperConfig, env::Environment};
use warden_proto::{ClientId, Request, ServerMessage, codec};

pub use error::ServerError;
pub use registry::ConnectionRegistry;
pub use system_env::SystemEnv;
pub use transport::TcpTransport;

/// Server configuration for the production runtime.
#[derive(Debug, Clone)]
pub struct ServerRuntimeConfig {
    /// Address to bind to (e.g. "0.0.0.0:4733").
    pub bind_address: String,
    /// Resource pool size, fixed at startup.
    pub resources: u32,
    /// Sweep timing (hold timeout, tick interval).
    pub sweeper: SweeperConfig,
    /// Cadence of the logged status block; `None` disables it.
    pub status_interval: Option<Duration>,
}

impl Default for ServerRuntimeConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:4733".to_string(),
            resources: 5,
            sweeper: SweeperConfig::default(),
            status_interval: None,
        }
    }
}

/// Shared handle to the arbiter behind the coarse lock.
type SharedArbiter = Arc<Mutex<Arbiter<SystemEnv>>>;

/// Production Warden server.
pub struct Server {
    arbiter: SharedArbiter,
    sweeper: Sweeper,
    registry: ConnectionRegistry,
    transport: TcpTransport,
    env: SystemEnv,
    status_interval: Option<Duration>,
}

impl Server {
    /// Create and bind a new server.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` for an empty resource pool and a
    /// transport error if binding fails.
    pub async fn bind(config: ServerRuntimeConfig) -> Result<Self, ServerError> {
        if config.resources == 0 {
            return Err(ServerError::Config("resource pool must not be empty".to_string()));
        }

        let env = SystemEnv::new();
        let arbiter = Arbiter::new(env.clone(), config.resources);
        let transport = TcpTransport::bind(&config.bind_address).await?;

        Ok(Self {
            arbiter: Arc::new(Mutex::new(arbiter)),
            sweeper: Sweeper::new(config.sweeper),
            registry: ConnectionRegistry::new(),
            transport,
            env,
            status_interval: config.status_interval,
        })
    }

    /// The local address the server is bound to.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the socket has no local address.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.transport.local_addr()
    }

    /// Run the server: sweep loop, status loop, accept loop.
    ///
    /// Runs until the process is shut down or the listener fails.
    ///
    /// # Errors
    ///
    /// Returns a transport error if accepting connections fails fatally.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("server listening on {}", self.transport.local_addr()?);

        tokio::spawn(sweep_loop(
            self.sweeper,
            Arc::clone(&self.arbiter),
            self.registry.clone(),
            self.env.clone(),
        ));

        if let Some(interval) = self.status_interval {
            tokio::spawn(status_loop(interval, Arc::clone(&self.arbiter), self.env.clone()));
        }

        loop {
            match self.transport.accept().await {
                Ok((stream, peer)) => {
                    let arbiter = Arc::clone(&self.arbiter);
                    let registry = self.registry.clone();

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, peer, arbiter, registry).await {
                            tracing::debug!(%peer, "connection error: {}", e);
                        }
                    });
                },
                Err(e) => {
                    tracing::error!("accept error: {}", e);
                },
            }
        }
    }
}

/// The periodic sweep: tick under the lock, execute actions outside it.
async fn sweep_loop(
    sweeper: Sweeper,
    arbiter: SharedArbiter,
    registry: ConnectionRegistry,
    env: SystemEnv,
) {
    loop {
        env.sleep(sweeper.interval()).await;

        let actions = {
            let mut arbiter = arbiter.lock().await;
            sweeper.tick(&mut arbiter, env.now())
        };

        for action in actions {
            match action {
                SweepAction::Evicted { resource, former_owner, held_for } => {
                    tracing::info!(resource, former_owner, ?held_for, "hold timeout, evicted");
                },

                SweepAction::DispatchGrant { pid, envelope } => {
                    registry.deliver(pid, ServerMessage::Grant { envelope }).await;
                },
            }
        }
    }
}

/// Periodically log the read-only status block.
async fn status_loop(interval: Duration, arbiter: SharedArbiter, env: SystemEnv) {
    loop {
        env.sleep(interval).await;

        let snapshot = arbiter.lock().await.snapshot();
        tracing::info!(target: "warden::status", "\n{}", status::render(&snapshot));
    }
}

/// Handle a single client connection.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    arbiter: SharedArbiter,
    registry: ConnectionRegistry,
) -> Result<(), ServerError> {
    tracing::debug!(%peer, "new connection");

    let (mut sink, mut frames) = transport::framed(stream).split();

    // One outbound channel per connection: request replies and sweep
    // grant pushes interleave through it onto the same socket.
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(32);

    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            match codec::encode_message(&message) {
                Ok(bytes) => {
                    if sink.send(Bytes::from(bytes)).await.is_err() {
                        break;
                    }
                },
                Err(error) => {
                    tracing::error!(%error, "failed to encode outbound frame");
                },
            }
        }
    });

    // Pids registered over this connection, for unbinding on close.
    let mut session_pids: Vec<ClientId> = Vec::new();

    while let Some(frame) = frames.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(%peer, "read error: {}", e);
                break;
            },
        };

        let reply = match codec::decode_message::<Request>(&frame) {
            Ok(request) => {
                handle_request(request, &arbiter, &registry, &tx, &mut session_pids).await
            },
            Err(error) => {
                tracing::warn!(%peer, %error, "malformed request frame");
                ServerMessage::Error { reason: error.to_string() }
            },
        };

        if tx.send(reply).await.is_err() {
            break;
        }
    }

    for pid in session_pids {
        registry.unbind(pid).await;
    }

    // Dropping the last sender ends the writer task.
    drop(tx);
    let _ = writer.await;

    tracing::debug!(%peer, "connection closed");
    Ok(())
}

/// Dispatch one request against the arbiter.
async fn handle_request(
    request: Request,
    arbiter: &SharedArbiter,
    registry: &ConnectionRegistry,
    tx: &mpsc::Sender<ServerMessage>,
    session_pids: &mut Vec<ClientId>,
) -> ServerMessage {
    match request {
        Request::Register => {
            let pid = arbiter.lock().await.register_client();

            // Grants are only ever routed to the connection that
            // registered the pid.
            registry.bind(pid, tx.clone()).await;
            session_pids.push(pid);

            ServerMessage::Registered { pid }
        },

        Request::Ask { pid, resource } => match arbiter.lock().await.ask_resource(pid, resource) {
            Ok(envelope) => ServerMessage::Resource { envelope },
            Err(error) => ServerMessage::Error { reason: error.to_string() },
        },

        Request::Liberate { pid, resource } => {
            match arbiter.lock().await.liberate_resource(pid, resource) {
                Ok(liberated) => ServerMessage::Liberated { resource, liberated },
                Err(error) => ServerMessage::Error { reason: error.to_string() },
            }
        },
    }
}
