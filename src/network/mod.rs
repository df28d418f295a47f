//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor thread (non-blocking accept, polls the shutdown flag)
//! - Fixed pool of worker threads fed over a bounded channel
//! - Commands routed through [`DataService`](crate::catalog::DataService)

mod client;
mod connection;
mod server;

pub use client::Client;
pub use connection::{execute, Connection};
pub use server::{Server, ShutdownHandle};
