//! TCP Server
//!
//! Accepts connections and dispatches to worker threads.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, TrySendError};
use parking_lot::Mutex;

use super::Connection;
use crate::catalog::DataService;
use crate::config::Config;
use crate::error::Result;

/// How long the acceptor sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Stream each busy worker is serving, keyed by worker number
type LiveConnections = Arc<Mutex<HashMap<usize, TcpStream>>>;

/// Stops a running [`Server`] from another thread
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// TCP server for the catalog
pub struct Server {
    config: Config,
    service: DataService,
    listener: TcpListener,
    shutdown: ShutdownHandle,
}

impl Server {
    /// Bind the listen address from `config`
    pub fn bind(config: Config, service: DataService) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr)?;
        listener.set_nonblocking(true)?;

        tracing::info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            config,
            service,
            listener,
            shutdown: ShutdownHandle {
                flag: Arc::new(AtomicBool::new(false)),
            },
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Start the server (blocking until shutdown)
    pub fn run(self) -> Result<()> {
        let workers = self.config.max_connections;
        let (sender, receiver) = channel::bounded::<TcpStream>(workers);
        let live: LiveConnections = Arc::new(Mutex::new(HashMap::new()));

        let handles: Vec<JoinHandle<()>> = (0..workers)
            .map(|n| self.spawn_worker(n, receiver.clone(), Arc::clone(&live)))
            .collect::<std::io::Result<_>>()?;
        drop(receiver);

        while !self.shutdown.is_shutdown() {
            match self.listener.accept() {
                Ok((stream, addr)) => match sender.try_send(stream) {
                    Ok(()) => tracing::trace!("Accepted connection from {}", addr),
                    Err(TrySendError::Full(stream)) => {
                        tracing::warn!("Connection limit reached, rejecting {}", addr);
                        let _ = stream.shutdown(Shutdown::Both);
                    }
                    Err(TrySendError::Disconnected(_)) => break,
                },
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => tracing::warn!("Accept failed: {}", e),
            }
        }

        tracing::info!("Shutting down, closing {} connections", live.lock().len());

        drop(sender);
        for stream in live.lock().values() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        for handle in handles {
            if handle.join().is_err() {
                tracing::warn!("Worker thread panicked");
            }
        }

        tracing::info!("Server stopped");
        Ok(())
    }

    fn spawn_worker(
        &self,
        n: usize,
        receiver: Receiver<TcpStream>,
        live: LiveConnections,
    ) -> std::io::Result<JoinHandle<()>> {
        let service = self.service.clone();
        let config = self.config.clone();
        let shutdown = self.shutdown.clone();

        thread::Builder::new()
            .name(format!("barkeep-worker-{}", n))
            .spawn(move || {
                for stream in receiver.iter() {
                    if shutdown.is_shutdown() {
                        break;
                    }

                    if let Ok(clone) = stream.try_clone() {
                        live.lock().insert(n, clone);
                    }

                    // `run` may have closed the live streams before the insert
                    if shutdown.is_shutdown() {
                        live.lock().remove(&n);
                        let _ = stream.shutdown(Shutdown::Both);
                        break;
                    }

                    serve(stream, service.clone(), &config);

                    live.lock().remove(&n);
                }
            })
    }
}

fn serve(stream: TcpStream, service: DataService, config: &Config) {
    let mut connection = match Connection::new(stream, service, config.max_request_size) {
        Ok(connection) => connection,
        Err(e) => {
            tracing::warn!("Failed to set up connection: {}", e);
            return;
        }
    };

    if let Err(e) = connection.set_timeouts(config.read_timeout_ms, config.write_timeout_ms) {
        tracing::warn!("Failed to set timeouts for {}: {}", connection.peer_addr(), e);
        return;
    }

    if let Err(e) = connection.handle() {
        tracing::debug!("Connection {} closed with error: {}", connection.peer_addr(), e);
    }
}
