//! Session controller and capture sources: the fan-in point where every
//! observation source meets the storage adapter.

pub mod controller;
pub mod headless;
mod sources;

pub use controller::SessionController;
pub use headless::HeadlessHost;
