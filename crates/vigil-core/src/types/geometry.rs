use serde::{Deserialize, Serialize};

/// Primary display dimensions in logical pixels plus the scale factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenGeometry {
    pub width: u32,
    pub height: u32,
    pub scale_factor: f64,
}

/// Monitored window rectangle, expressed in the same coordinate space as
/// the screen dimensions so a viewer can render one inside the other
/// without further transforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub is_visible: bool,
    pub is_focused: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionGeometry {
    pub screen: ScreenGeometry,
    pub window: WindowGeometry,
    pub display_count: usize,
}
