//! `guidesync-recon` - reconciles local documents with remote records.
//!
//! Receives a loaded document set and a record store, validates identity
//! uniqueness, diffs by external id, and drives the create/update/delete calls.
//! No CLI concerns.

pub mod config;
pub mod engine;
pub mod error;
pub mod model;

pub use config::{ConfigInputs, ContentSettings, FailurePolicy, RemoteSettings, SyncConfig};
pub use engine::{build_payload, plan, truncate_chars, validate_unique, ReconOptions, Reconciler};
pub use error::{ConfigError, DuplicateGroup, ReconError};
pub use model::{Failure, Plan, RunReport, Step};
