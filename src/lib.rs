//! # Barkeep
//!
//! A cocktail and ingredient catalog backed by an embedded key-value store:
//! - Single data file, append-only log of committed transactions
//! - Crash recovery with torn-tail truncation
//! - Named buckets with byte-ordered keys
//! - Single-writer / snapshot-reader transactions
//! - Typed catalog adapter and data service on top
//! - TCP front for remote clients
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │                  (Multiple Clients)                          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Data Service                               │
//! │         (validation, find, composite search)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Catalog Adapter                              │
//! │        (typed records <-> bucket key/values)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Data file  │          │  Snapshot   │
//!   │ (WAL/append)│          │ (Arc, CoW)  │
//!   └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod engine;
pub mod flock;
pub mod memtable;
pub mod tx;
pub mod wal;

pub mod catalog;

pub mod network;
pub mod protocol;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use catalog::{
    CatalogEngine, Cocktail, DataService, Ingredient, KvCatalog, MemoryCatalog, SearchResult,
};
pub use config::Config;
pub use engine::Database;
pub use error::{BarkeepError, Result};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of Barkeep
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
