mod event;
mod geometry;
mod probe;
mod process;
mod session;

pub use event::{
    ActivityEvent, EventKind, IdleData, KeyComboData, MouseButton, MouseClickData, MouseMoveData,
    PageNavigateData, ProcessEventData,
};
pub use geometry::{ScreenGeometry, SessionGeometry, WindowGeometry};
pub use probe::{DetectionMethod, SystemResources, VmDetection};
pub use process::{ProcessInfo, RawProcess};
pub use session::Session;
