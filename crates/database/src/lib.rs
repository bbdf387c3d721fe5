//! # Bourse Database Crate
//!
//! This crate acts as a high-level, application-specific interface to the
//! PostgreSQL database. It is the system's "permanent archive."
//!
//! ## Architectural Principles
//!
//! - **Adapter layer:** This crate encapsulates every SQL statement in the
//!   system. It provides a clean, abstract API to the rest of the
//!   application, hiding the underlying SQL and database implementation
//!   details.
//! - **Asynchronous & Pooled:** All operations are asynchronous, and it uses
//!   a connection pool (`PgPool`) for high-performance, concurrent access.
//! - **Transactional primitives:** The mutating half of the API operates on
//!   `sqlx::Transaction` handles so the engine can compose the balance
//!   check, balance update, position upsert and order insert into one
//!   all-or-nothing unit with row locks held to commit.
//!
//! ## Public API
//!
//! - `connect`: The async function to establish the database connection pool.
//! - `run_migrations`: A utility to apply the embedded migrations.
//! - `DbRepository`: The main struct that holds the connection pool and
//!   provides all the high-level data access methods.
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use repository::{DbRepository, OrderLeg, PgTx};
