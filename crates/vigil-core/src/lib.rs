//! Core data model and pure rules for the vigil telemetry pipeline.
//!
//! Everything here is deterministic and I/O-free: the session/event model,
//! process classification and diffing, the key-combo forwarding policy, the
//! host-runtime boundary traits, and configuration types. Async capture
//! loops and storage backends live in the sibling crates.

pub mod classify;
pub mod config;
pub mod diff;
pub mod host;
pub mod keys;
pub mod types;

pub use types::{
    ActivityEvent, EventKind, ProcessInfo, RawProcess, ScreenGeometry, Session, SessionGeometry,
    SystemResources, VmDetection, WindowGeometry,
};
