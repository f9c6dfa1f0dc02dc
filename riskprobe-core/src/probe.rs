//! Environment access for the collector.
//!
//! All browser (or recorded) state reaches the collector through
//! [`DeviceProbe`]. The browser implementation lives in `riskprobe-wasm`;
//! [`SnapshotProbe`] replays a recorded [`EnvironmentSnapshot`] and
//! [`MockProbe`](crate::mock::MockProbe) is for tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ProbeError, Result, RiskProbeError};

/// Raw navigator/window readings.
///
/// Every field defaults so a partial recording still decodes; missing
/// readings then look exactly like a browser that does not expose them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentSnapshot {
    pub user_agent: String,
    pub platform: String,
    /// `navigator.language`
    pub language: String,
    /// `navigator.languages`; `None` when the property is missing
    pub languages: Option<Vec<String>>,
    /// IANA name from `Intl.DateTimeFormat().resolvedOptions().timeZone`
    pub timezone: String,
    pub screen_width: u32,
    pub screen_height: u32,
    pub outer_width: u32,
    pub outer_height: u32,
    pub inner_width: u32,
    pub inner_height: u32,
    /// `navigator.webdriver`
    pub webdriver: bool,
    /// Known automation globals found on `window`
    pub automation_globals: Vec<String>,
    /// `navigator.hardwareConcurrency`
    pub hardware_concurrency: Option<u32>,
    /// `navigator.maxTouchPoints`
    pub max_touch_points: u32,
    /// Whether `ontouchstart` exists on `window`
    pub touch_events: bool,
}

impl EnvironmentSnapshot {
    /// Decode a snapshot from JSON.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| RiskProbeError::InvalidSnapshot(e.to_string()))
    }

    /// Whether the device exposes any touch input.
    pub fn has_touch(&self) -> bool {
        self.touch_events || self.max_touch_points > 0
    }
}

/// The fixed drawing used for the canvas fingerprint.
///
/// Changing any field changes every canvas fingerprint, so the default is the
/// only recipe the collector uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasRecipe {
    pub width: u32,
    pub height: u32,
    pub text: String,
    pub font: String,
    pub text_baseline: String,
    pub fill_color: String,
    /// Background rectangle as (x, y, w, h)
    pub rect: (i32, i32, u32, u32),
    pub rect_color: String,
    /// Text origin as (x, y)
    pub text_origin: (i32, i32),
}

impl Default for CanvasRecipe {
    fn default() -> Self {
        Self {
            width: 200,
            height: 50,
            text: "riskprobe <canvas> 1.0 \u{1F512}".to_string(),
            font: "14px 'Arial'".to_string(),
            text_baseline: "top".to_string(),
            fill_color: "#069".to_string(),
            rect: (125, 1, 62, 20),
            rect_color: "#f60".to_string(),
            text_origin: (2, 15),
        }
    }
}

/// Outcome of reading the unmasked GPU strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WebGlDebugInfo {
    /// No WebGL context could be created
    Unsupported,
    /// Context exists but `WEBGL_debug_renderer_info` is unavailable
    NoDebugInfo,
    Available { vendor: String, renderer: String },
}

/// Source of environment readings for one collection.
///
/// Methods that render or touch the console are fallible; the collector
/// turns their errors into sentinels.
#[async_trait(?Send)]
pub trait DeviceProbe {
    /// Navigator and window readings.
    fn snapshot(&self) -> std::result::Result<EnvironmentSnapshot, ProbeError>;

    /// Render `recipe` off-screen and return the canvas data URL.
    async fn render_canvas(
        &self,
        recipe: &CanvasRecipe,
    ) -> std::result::Result<String, ProbeError>;

    /// Read the unmasked WebGL vendor and renderer.
    async fn webgl_debug_info(&self) -> std::result::Result<WebGlDebugInfo, ProbeError>;

    /// Log a disposable object with a trapped getter and report whether the
    /// console evaluated it.
    fn console_getter_trap(&self) -> std::result::Result<bool, ProbeError>;
}

/// Recorded environment including the rendering outputs.
///
/// This is the on-disk format read by the CLI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordedEnvironment {
    pub environment: EnvironmentSnapshot,
    /// Canvas data URL captured from the device, if any
    pub canvas_data_url: Option<String>,
    pub webgl: Option<WebGlDebugInfo>,
    /// Result of the console getter trap, if it was recorded
    pub console_trap_fired: Option<bool>,
}

impl RecordedEnvironment {
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| RiskProbeError::InvalidSnapshot(e.to_string()))
    }
}

/// Replays a [`RecordedEnvironment`].
///
/// Readings absent from the recording behave like an unsupported API.
#[derive(Debug, Clone)]
pub struct SnapshotProbe {
    recorded: RecordedEnvironment,
}

impl SnapshotProbe {
    pub fn new(recorded: RecordedEnvironment) -> Self {
        Self { recorded }
    }

    pub fn recorded(&self) -> &RecordedEnvironment {
        &self.recorded
    }
}

#[async_trait(?Send)]
impl DeviceProbe for SnapshotProbe {
    fn snapshot(&self) -> std::result::Result<EnvironmentSnapshot, ProbeError> {
        Ok(self.recorded.environment.clone())
    }

    async fn render_canvas(
        &self,
        _recipe: &CanvasRecipe,
    ) -> std::result::Result<String, ProbeError> {
        self.recorded
            .canvas_data_url
            .clone()
            .ok_or_else(|| ProbeError::Unavailable("no canvas recorded".into()))
    }

    async fn webgl_debug_info(&self) -> std::result::Result<WebGlDebugInfo, ProbeError> {
        Ok(self
            .recorded
            .webgl
            .clone()
            .unwrap_or(WebGlDebugInfo::Unsupported))
    }

    fn console_getter_trap(&self) -> std::result::Result<bool, ProbeError> {
        self.recorded
            .console_trap_fired
            .ok_or_else(|| ProbeError::Unavailable("console trap not recorded".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_snapshot_decodes() {
        let snapshot =
            EnvironmentSnapshot::from_json(br#"{"user_agent":"x","timezone":"UTC"}"#).unwrap();
        assert_eq!(snapshot.user_agent, "x");
        assert_eq!(snapshot.languages, None);
        assert!(!snapshot.webdriver);
    }

    #[test]
    fn test_invalid_snapshot_is_an_error() {
        let result = EnvironmentSnapshot::from_json(b"[1,2,3]");
        assert!(matches!(result, Err(RiskProbeError::InvalidSnapshot(_))));
    }

    #[test]
    fn test_has_touch() {
        let mut snapshot = EnvironmentSnapshot::default();
        assert!(!snapshot.has_touch());
        snapshot.max_touch_points = 5;
        assert!(snapshot.has_touch());
    }

    #[test]
    fn test_webgl_info_tagging() {
        let json = serde_json::to_string(&WebGlDebugInfo::Available {
            vendor: "Google Inc.".into(),
            renderer: "ANGLE".into(),
        })
        .unwrap();
        assert!(json.contains("\"status\":\"available\""));

        let parsed: WebGlDebugInfo = serde_json::from_str(r#"{"status":"no_debug_info"}"#).unwrap();
        assert_eq!(parsed, WebGlDebugInfo::NoDebugInfo);
    }

    #[tokio::test]
    async fn test_snapshot_probe_missing_readings() {
        let probe = SnapshotProbe::new(RecordedEnvironment::default());
        assert!(probe.render_canvas(&CanvasRecipe::default()).await.is_err());
        assert_eq!(
            probe.webgl_debug_info().await.unwrap(),
            WebGlDebugInfo::Unsupported
        );
        assert!(probe.console_getter_trap().is_err());
    }
}
