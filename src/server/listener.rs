//! Sync server listener
//!
//! Handles the TCP accept loop and spawns one hyper connection task per
//! client.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

use crate::document::DocumentStore;
use crate::error::{is_hyper_disconnect, Result};
use crate::server::config::ServerConfig;
use crate::server::router::Router;
use crate::server::static_files::StaticFiles;
use crate::sync::SyncEngine;

/// Shared-document HTTP server
pub struct SyncServer {
    config: ServerConfig,
    router: Arc<Router>,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl SyncServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        let store =
            DocumentStore::with_collections(&config.data_file, config.default_collections.clone());
        let engine = Arc::new(SyncEngine::with_config(store, config.sync.clone()));
        Self::with_engine(config, engine)
    }

    /// Create a server around an existing engine
    pub fn with_engine(config: ServerConfig, engine: Arc<SyncEngine>) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        let router = Router::new(
            engine,
            StaticFiles::new(&config.static_dir),
            config.max_body_size,
        );

        Self {
            config,
            router: Arc::new(router),
            connection_semaphore,
        }
    }

    /// Get a reference to the sync engine
    pub fn engine(&self) -> &Arc<SyncEngine> {
        self.router.engine()
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Run the server
    ///
    /// This method blocks until the listener fails.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server until `shutdown` resolves
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve connections from an already bound listener until `shutdown`
    ///
    /// Open connections, including event streams, are abandoned on shutdown.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        tracing::info!(addr = %listener.local_addr()?, "Sync server listening");

        tokio::select! {
            _ = shutdown => {
                let subscribers = self.engine().registry().len().await;
                tracing::info!(subscribers, "Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&listener) => result,
        }
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit
        let permit = match self.acquire_permit() {
            Ok(permit) => permit,
            Err(_) => {
                tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                return;
            }
        };

        tracing::debug!(peer = %peer_addr, "New connection");

        if self.config.tcp_nodelay {
            if let Err(e) = socket.set_nodelay(true) {
                tracing::error!(error = %e, "Failed to configure socket");
                return;
            }
        }

        let router = Arc::clone(&self.router);

        tokio::spawn(async move {
            let _permit = permit;

            let service = service_fn(move |req: hyper::Request<Incoming>| {
                let router = Arc::clone(&router);
                async move { Ok::<_, Infallible>(router.handle(req, peer_addr).await) }
            });

            if let Err(e) = http1::Builder::new()
                .serve_connection(TokioIo::new(socket), service)
                .await
            {
                if is_hyper_disconnect(&e) {
                    tracing::debug!(peer = %peer_addr, error = %e, "Client disconnected");
                } else {
                    tracing::warn!(peer = %peer_addr, error = %e, "Connection error");
                }
            }

            tracing::debug!(peer = %peer_addr, "Connection closed");
        });
    }

    fn acquire_permit(
        &self,
    ) -> std::result::Result<Option<OwnedSemaphorePermit>, TryAcquireError> {
        match self.connection_semaphore {
            Some(ref sem) => sem.clone().try_acquire_owned().map(Some),
            None => Ok(None),
        }
    }
}
