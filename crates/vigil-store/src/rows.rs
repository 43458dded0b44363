//! Wire rows for the remote backend's `sessions` and `user_activities`
//! tables.

use serde::{Deserialize, Serialize};

use vigil_core::types::{
    ActivityEvent, ProcessInfo, ScreenGeometry, Session, SessionGeometry, SystemResources,
    WindowGeometry,
};

use crate::adapter::{StoreError, StoreResult};

/// Trimmed process entry stored in the session row's `processes` column.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSummary {
    pub name: String,
    pub is_suspicious: bool,
    pub is_application: bool,
}

impl From<&ProcessInfo> for ProcessSummary {
    fn from(p: &ProcessInfo) -> Self {
        Self {
            name: p.name.clone(),
            is_suspicious: p.is_suspicious,
            is_application: p.is_application,
        }
    }
}

/// One row of the `sessions` table. Geometry is flattened into scalar
/// columns so the dashboard can filter on it without JSON operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRow {
    pub session_id: String,
    pub start_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_url: Option<String>,
    pub total_events: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    pub platform: String,
    pub app_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_scale_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_y: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_is_visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_is_focused: Option<bool>,
    #[serde(default)]
    pub display_count: usize,
    #[serde(default)]
    pub processes: Vec<ProcessSummary>,
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_resources: Option<SystemResources>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl SessionRow {
    pub fn from_session(session: &Session) -> Self {
        let screen = session.geometry.as_ref().map(|g| &g.screen);
        let window = session.geometry.as_ref().map(|g| &g.window);
        Self {
            session_id: session.session_id.clone(),
            start_time: session.start_time,
            end_time: session.end_time,
            call_url: session.call_url.clone(),
            total_events: session.total_events,
            duration: session.end_time.map(|_| session.duration_ms()),
            platform: std::env::consts::OS.to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            screen_width: screen.map(|s| s.width),
            screen_height: screen.map(|s| s.height),
            screen_scale_factor: screen.map(|s| s.scale_factor),
            window_x: window.map(|w| w.x),
            window_y: window.map(|w| w.y),
            window_width: window.map(|w| w.width),
            window_height: window.map(|w| w.height),
            window_is_visible: window.map(|w| w.is_visible),
            window_is_focused: window.map(|w| w.is_focused),
            display_count: session.geometry.as_ref().map(|g| g.display_count).unwrap_or(0),
            processes: session.processes.iter().map(ProcessSummary::from).collect(),
            is_virtual: session.is_virtual,
            virtual_host: session.virtual_host.clone(),
            system_resources: session.system_resources.clone(),
            updated_at: None,
        }
    }

    /// Rebuild session metadata from a row, for the read path. The trimmed
    /// `processes` column loses cmd/bin; they come back empty.
    pub fn into_session(self) -> Session {
        let geometry = match (
            self.screen_width,
            self.screen_height,
            self.screen_scale_factor,
            self.window_x,
            self.window_y,
            self.window_width,
            self.window_height,
        ) {
            (Some(sw), Some(sh), Some(scale), Some(x), Some(y), Some(w), Some(h)) => {
                Some(SessionGeometry {
                    screen: ScreenGeometry {
                        width: sw,
                        height: sh,
                        scale_factor: scale,
                    },
                    window: WindowGeometry {
                        x,
                        y,
                        width: w,
                        height: h,
                        is_visible: self.window_is_visible.unwrap_or(false),
                        is_focused: self.window_is_focused.unwrap_or(false),
                    },
                    display_count: self.display_count,
                })
            }
            _ => None,
        };

        Session {
            session_id: self.session_id,
            start_time: self.start_time,
            end_time: self.end_time,
            call_url: self.call_url,
            total_events: self.total_events,
            geometry,
            processes: self
                .processes
                .into_iter()
                .map(|p| ProcessInfo {
                    name: p.name,
                    cmd: String::new(),
                    bin: None,
                    is_suspicious: p.is_suspicious,
                    is_application: p.is_application,
                })
                .collect(),
            is_virtual: self.is_virtual,
            virtual_host: self.virtual_host,
            system_resources: self.system_resources,
        }
    }
}

/// One row of the `user_activities` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRow {
    pub session_id: String,
    pub event_type: String,
    pub timestamp: i64,
    pub event_data: serde_json::Value,
}

impl ActivityRow {
    pub fn from_event(session_id: &str, event: &ActivityEvent) -> StoreResult<Self> {
        let value = serde_json::to_value(event)?;
        Ok(Self {
            session_id: session_id.to_string(),
            event_type: event.event_type().to_string(),
            timestamp: event.timestamp,
            event_data: value
                .get("data")
                .cloned()
                .unwrap_or(serde_json::Value::Object(Default::default())),
        })
    }

    pub fn into_event(self) -> StoreResult<ActivityEvent> {
        let value = serde_json::json!({
            "type": self.event_type,
            "timestamp": self.timestamp,
            "data": self.event_data,
        });
        serde_json::from_value(value).map_err(StoreError::from)
    }
}
