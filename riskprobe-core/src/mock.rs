//! Mock probe for testing.

use async_trait::async_trait;

use crate::error::ProbeError;
use crate::hashing::sha256_hex;
use crate::probe::{CanvasRecipe, DeviceProbe, EnvironmentSnapshot, WebGlDebugInfo};

/// Deterministic in-memory [`DeviceProbe`].
///
/// The "rendered" canvas is derived from the recipe and a rendering-stack
/// label, so two probes with the same label produce the same data URL.
#[derive(Debug, Clone)]
pub struct MockProbe {
    snapshot: EnvironmentSnapshot,
    render_stack: String,
    webgl: Result<WebGlDebugInfo, ProbeError>,
    canvas_failure: Option<ProbeError>,
    snapshot_failure: Option<ProbeError>,
    console_trap: Result<bool, ProbeError>,
}

impl MockProbe {
    pub fn new(snapshot: EnvironmentSnapshot) -> Self {
        Self {
            snapshot,
            render_stack: "mock-gpu/mock-fonts".to_string(),
            webgl: Ok(WebGlDebugInfo::Available {
                vendor: "Mock Vendor".to_string(),
                renderer: "Mock Renderer".to_string(),
            }),
            canvas_failure: None,
            snapshot_failure: None,
            console_trap: Ok(false),
        }
    }

    /// A plain desktop Chrome on Windows with no automation traces.
    pub fn desktop() -> Self {
        Self::new(EnvironmentSnapshot {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            platform: "Win32".to_string(),
            language: "en-US".to_string(),
            languages: Some(vec!["en-US".to_string(), "en".to_string()]),
            timezone: "Europe/London".to_string(),
            screen_width: 1920,
            screen_height: 1080,
            outer_width: 1920,
            outer_height: 1040,
            inner_width: 1920,
            inner_height: 937,
            webdriver: false,
            automation_globals: Vec::new(),
            hardware_concurrency: Some(8),
            max_touch_points: 0,
            touch_events: false,
        })
    }

    pub fn with_snapshot(mut self, update: impl FnOnce(&mut EnvironmentSnapshot)) -> Self {
        update(&mut self.snapshot);
        self
    }

    pub fn with_render_stack(mut self, stack: impl Into<String>) -> Self {
        self.render_stack = stack.into();
        self
    }

    pub fn with_webgl(mut self, webgl: Result<WebGlDebugInfo, ProbeError>) -> Self {
        self.webgl = webgl;
        self
    }

    pub fn with_canvas_failure(mut self, error: ProbeError) -> Self {
        self.canvas_failure = Some(error);
        self
    }

    pub fn with_snapshot_failure(mut self, error: ProbeError) -> Self {
        self.snapshot_failure = Some(error);
        self
    }

    pub fn with_console_trap(mut self, result: Result<bool, ProbeError>) -> Self {
        self.console_trap = result;
        self
    }
}

impl Default for MockProbe {
    fn default() -> Self {
        Self::desktop()
    }
}

#[async_trait(?Send)]
impl DeviceProbe for MockProbe {
    fn snapshot(&self) -> Result<EnvironmentSnapshot, ProbeError> {
        match &self.snapshot_failure {
            Some(error) => Err(error.clone()),
            None => Ok(self.snapshot.clone()),
        }
    }

    async fn render_canvas(&self, recipe: &CanvasRecipe) -> Result<String, ProbeError> {
        if let Some(error) = &self.canvas_failure {
            return Err(error.clone());
        }
        let pixels = sha256_hex(format!(
            "{}|{}|{}|{}|{:?}|{}",
            self.render_stack, recipe.text, recipe.font, recipe.fill_color, recipe.rect, recipe.rect_color
        ));
        Ok(format!("data:image/png;base64,{pixels}"))
    }

    async fn webgl_debug_info(&self) -> Result<WebGlDebugInfo, ProbeError> {
        self.webgl.clone()
    }

    fn console_getter_trap(&self) -> Result<bool, ProbeError> {
        self.console_trap.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_canvas_deterministic() {
        let recipe = CanvasRecipe::default();
        let a = MockProbe::desktop().render_canvas(&recipe).await.unwrap();
        let b = MockProbe::desktop().render_canvas(&recipe).await.unwrap();
        assert_eq!(a, b, "Same render stack should produce same canvas");
    }

    #[tokio::test]
    async fn test_mock_canvas_varies_with_stack() {
        let recipe = CanvasRecipe::default();
        let a = MockProbe::desktop().render_canvas(&recipe).await.unwrap();
        let b = MockProbe::desktop()
            .with_render_stack("swiftshader/dejavu")
            .render_canvas(&recipe)
            .await
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_snapshot_failure() {
        let probe = MockProbe::desktop().with_snapshot_failure(ProbeError::Failed("boom".into()));
        assert!(probe.snapshot().is_err());
    }
}
