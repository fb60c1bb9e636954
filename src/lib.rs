#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

//! # Fleet Core
//!
//! Reconciliation core for a managed streaming-platform fleet control plane.
//!
//! ## Overview
//!
//! The control plane accepts requests for managed streaming-platform instances
//! and drives each request through provisioning on one of many shared backing
//! clusters. Nothing here is served synchronously: every lifecycle transition
//! is performed by an independently scheduled background worker that owns
//! exactly one request status, so the whole system converges through repeated
//! reconciliation passes rather than request handling.
//!
//! ## Architecture
//!
//! - [`workers::leader_election`] - database-backed leader leases let several
//!   redundant control-plane processes run side by side while exactly one of
//!   them executes each worker type.
//! - [`workers::reconciler`] - the generic scheduling loop every worker plugs
//!   into: one pass immediately on start, then on a fixed tick and on
//!   out-of-band wake signals, with guaranteed non-overlap and clean shutdown.
//! - [`workers::request_mgrs`] - the per-status lifecycle workers implementing
//!   the accepted → preparing → provisioning → ready state machine, plus the
//!   deprovision/deleting branch and the auxiliary DNS/certificate workers.
//! - [`services`] - storage access and the narrow trait seams behind which the
//!   external collaborators (placement, quota, data plane, identity, network)
//!   live.
//!
//! ## Module Organization
//!
//! - [`bootstrap`] - wiring of stores, workers and managers into a running core
//! - [`models`] - persisted entities: leader leases, stream requests, clusters
//! - [`services`] - store traits, Postgres implementations, collaborator seams
//! - [`workers`] - worker contract, reconciler, leader election, lifecycle managers
//! - [`config`] - configuration management
//! - [`error`] - structured error handling with client/server classification
//! - [`database`] - connection pool construction
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fleet_core::config::FleetConfig;
//! use fleet_core::services::signalbus::SignalBus;
//! use fleet_core::workers::reconciler::Reconciler;
//! use std::sync::Arc;
//!
//! let config = FleetConfig::default();
//! let bus = Arc::new(SignalBus::new());
//! let reconciler = Arc::new(Reconciler::new(config.reconciler.clone(), bus));
//! ```

pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod workers;

pub use error::{ErrorClass, Result, ServiceError};
