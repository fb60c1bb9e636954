//! # Database Layer
//!
//! Connection pool construction for the Postgres-backed stores.

pub mod connection;

pub use connection::DatabaseConnection;
