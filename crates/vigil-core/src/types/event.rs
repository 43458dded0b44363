use serde::{Deserialize, Serialize};

/// One timestamped, typed observation belonging to a session.
///
/// Serializes as `{"timestamp": <ms>, "type": "<kind>", "data": {..}}`, the
/// wire shape both storage backends persist. Events are immutable once
/// constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    /// Capture time in epoch milliseconds.
    pub timestamp: i64,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl ActivityEvent {
    pub fn new(timestamp: i64, kind: EventKind) -> Self {
        Self { timestamp, kind }
    }

    /// The snake_case tag persisted in the `event_type` column.
    pub fn event_type(&self) -> &'static str {
        self.kind.type_name()
    }
}

/// The full event taxonomy, adjacently tagged so each serialized event
/// carries its kind name next to a kind-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EventKind {
    MouseMove(MouseMoveData),
    MouseClick(MouseClickData),
    KeyDown(KeyComboData),
    AppFocus {},
    AppBlur {},
    AppShow {},
    AppHide {},
    AppOpen {},
    AppClose {},
    IdleStart(IdleData),
    IdleEnd(IdleData),
    PageNavigate(PageNavigateData),
    ScreenshotAttempt {},
    ProcessStart(ProcessEventData),
    ProcessEnd(ProcessEventData),
}

impl EventKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            EventKind::MouseMove(_) => "mouse_move",
            EventKind::MouseClick(_) => "mouse_click",
            EventKind::KeyDown(_) => "key_down",
            EventKind::AppFocus {} => "app_focus",
            EventKind::AppBlur {} => "app_blur",
            EventKind::AppShow {} => "app_show",
            EventKind::AppHide {} => "app_hide",
            EventKind::AppOpen {} => "app_open",
            EventKind::AppClose {} => "app_close",
            EventKind::IdleStart(_) => "idle_start",
            EventKind::IdleEnd(_) => "idle_end",
            EventKind::PageNavigate(_) => "page_navigate",
            EventKind::ScreenshotAttempt {} => "screenshot_attempt",
            EventKind::ProcessStart(_) => "process_start",
            EventKind::ProcessEnd(_) => "process_end",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseMoveData {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseClickData {
    pub x: i32,
    pub y: i32,
    pub button: MouseButton,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// A key-down observation from the webview boundary: physical key code plus
/// the four modifier flags. Equality over all five fields is what the
/// controller's dedup policy compares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyComboData {
    pub code: String,
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdleData {
    /// Milliseconds since the last observed input activity.
    pub idle_duration: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageNavigateData {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessEventData {
    pub name: String,
    pub cmd: String,
    pub is_suspicious: bool,
    pub is_application: bool,
}
