//! Storage adapters for session telemetry: a batching remote backend, an
//! append-only local file backend, and the factory that prefers the former
//! and falls back to the latter.

mod adapter;
mod batcher;
mod factory;
mod local;
mod remote;
mod rest;
mod rows;

pub use adapter::{StorageAdapter, StoreError, StoreResult};
pub use batcher::{EventBatcher, PendingEvent};
pub use factory::{create_storage, validate_remote_config};
pub use local::LocalAdapter;
pub use remote::RemoteAdapter;
pub use rest::{RemoteApi, RestApi};
pub use rows::{ActivityRow, ProcessSummary, SessionRow};
