//! External content records API client.
//!
//! This crate owns the wire contract with the remote record store:
//! auth, create, update, delete, and cursor-paginated list.
//!
//! No retries. No reconciliation logic. Callers decide what a failure means.

mod api;
mod client;
mod error;
pub mod memory;
mod model;
mod pager;

pub use api::RecordsApi;
pub use client::{ClientOptions, Credential, HttpRecordsClient};
pub use error::{ClientError, ErrorBody, Operation};
pub use memory::{Call, MemoryRecords};
pub use model::{PageMeta, RawRecord, RecordPage, RecordPayload, RemoteRecord, TypeRef};
pub use pager::RecordPages;
