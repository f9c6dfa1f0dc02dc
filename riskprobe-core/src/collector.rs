//! The fingerprint collector.
//!
//! [`FingerprintCollector::collect_fingerprint`] has no error channel. Every
//! sub-check is guarded on its own: a failing reading is logged and replaced
//! by a sentinel fingerprint or `false`, and the rest of the bundle is still
//! collected.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::ProbeError;
use crate::hashing::sha256_hex;
use crate::probe::{CanvasRecipe, DeviceProbe, EnvironmentSnapshot, WebGlDebugInfo};
use crate::signals::{format_resolution, DeviceSignalBundle, Fingerprint};
use crate::user_agent::{self, UNKNOWN};

/// Globals injected by automation frameworks.
pub const AUTOMATION_GLOBALS: &[&str] = &[
    "__webdriver_evaluate",
    "__selenium_evaluate",
    "__webdriver_script_function",
    "__webdriver_unwrapped",
    "__selenium_unwrapped",
    "__driver_evaluate",
    "__fxdriver_unwrapped",
    "_Selenium_IDE_Recorder",
    "_selenium",
    "callSelenium",
    "callPhantom",
    "_phantom",
    "__nightmare",
    "domAutomation",
    "domAutomationController",
    "__playwright__binding__",
    "__pwInitScripts",
    "__puppeteer_evaluation_script__",
];

/// User-agent fragments left by headless browsers and drivers.
pub const HEADLESS_UA_MARKERS: &[&str] = &["headless", "phantom", "selenium"];

/// Separator between the WebGL vendor and renderer before hashing.
pub const WEBGL_DELIMITER: &str = "~";

/// Data URL returned by a canvas that cannot encode images.
const EMPTY_DATA_URL: &str = "data:,";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    /// Outer-minus-inner window delta that counts as a docked devtools panel
    pub devtools_threshold_px: u32,
    /// Run the console getter trap. Off by default; without console access
    /// this channel is disabled and only the geometry heuristic remains.
    pub console_trap_enabled: bool,
    pub canvas_recipe: CanvasRecipe,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            devtools_threshold_px: 160,
            console_trap_enabled: false,
            canvas_recipe: CanvasRecipe::default(),
        }
    }
}

/// The four automation/emulator checks. Any one marks the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationChecks {
    pub webdriver_flag: bool,
    pub automation_globals: bool,
    pub headless_user_agent: bool,
    pub missing_languages: bool,
}

impl AutomationChecks {
    pub fn evaluate(snapshot: &EnvironmentSnapshot) -> Self {
        let ua = snapshot.user_agent.to_lowercase();
        Self {
            webdriver_flag: snapshot.webdriver,
            automation_globals: snapshot
                .automation_globals
                .iter()
                .any(|name| AUTOMATION_GLOBALS.contains(&name.as_str())),
            headless_user_agent: HEADLESS_UA_MARKERS.iter().any(|m| ua.contains(m)),
            missing_languages: snapshot
                .languages
                .as_ref()
                .map_or(true, |langs| langs.iter().all(|l| l.trim().is_empty())),
        }
    }

    /// Simple OR; unlike the reputation scorer there is no threshold here.
    pub fn any(&self) -> bool {
        self.webdriver_flag
            || self.automation_globals
            || self.headless_user_agent
            || self.missing_languages
    }
}

/// Collects a [`DeviceSignalBundle`] from a [`DeviceProbe`].
#[derive(Debug, Clone)]
pub struct FingerprintCollector<P> {
    probe: P,
    config: CollectorConfig,
}

impl<P: DeviceProbe> FingerprintCollector<P> {
    pub fn new(probe: P) -> Self {
        Self::with_config(probe, CollectorConfig::default())
    }

    pub fn with_config(probe: P, config: CollectorConfig) -> Self {
        Self { probe, config }
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Gather every signal. Never fails.
    #[instrument(level = "debug", skip(self), fields(console_trap = self.config.console_trap_enabled))]
    pub async fn collect_fingerprint(&self) -> DeviceSignalBundle {
        let snapshot = match self.probe.snapshot() {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(error = %e, "Environment snapshot unavailable");
                None
            }
        };

        let canvas_fingerprint = self.canvas_fingerprint().await;
        let webgl_fingerprint = self.webgl_fingerprint().await;
        let devtools_open = self.detect_devtools(snapshot.as_ref());

        let automation = snapshot
            .as_ref()
            .map(AutomationChecks::evaluate)
            .unwrap_or_default();
        debug!(?automation, "Automation checks evaluated");

        let bundle = match snapshot {
            Some(env) => {
                let browser = user_agent::parse_browser(&env.user_agent);
                let os = user_agent::parse_os(&env.user_agent, &env.platform);
                DeviceSignalBundle {
                    browser_name: browser.name,
                    browser_version: browser.version,
                    os_name: os.name,
                    platform: os.platform,
                    timezone: env.timezone,
                    language: env.language,
                    screen_resolution: format_resolution(env.screen_width, env.screen_height),
                    canvas_fingerprint,
                    webgl_fingerprint,
                    devtools_open,
                    is_webdriver: automation.webdriver_flag,
                    is_emulator: automation.any(),
                    is_rooted: detect_rooted(),
                    collected_at: Utc::now(),
                }
            }
            None => DeviceSignalBundle {
                browser_name: UNKNOWN.to_string(),
                browser_version: UNKNOWN.to_string(),
                os_name: UNKNOWN.to_string(),
                platform: String::new(),
                timezone: String::new(),
                language: String::new(),
                screen_resolution: format_resolution(0, 0),
                canvas_fingerprint,
                webgl_fingerprint,
                devtools_open,
                is_webdriver: false,
                is_emulator: false,
                is_rooted: detect_rooted(),
                collected_at: Utc::now(),
            },
        };

        debug!(
            browser = %bundle.browser_name,
            os = %bundle.os_name,
            canvas_measured = bundle.canvas_fingerprint.is_measured(),
            webgl = %bundle.webgl_fingerprint,
            devtools_open = bundle.devtools_open,
            is_emulator = bundle.is_emulator,
            "Fingerprint collected"
        );

        bundle
    }

    /// Geometry heuristic OR console getter trap. Advisory only.
    pub fn detect_devtools(&self, snapshot: Option<&EnvironmentSnapshot>) -> bool {
        let docked = snapshot.is_some_and(|env| {
            let width_gap = env.outer_width.saturating_sub(env.inner_width);
            let height_gap = env.outer_height.saturating_sub(env.inner_height);
            width_gap > self.config.devtools_threshold_px
                || height_gap > self.config.devtools_threshold_px
        });
        if docked {
            return true;
        }

        if !self.config.console_trap_enabled {
            return false;
        }

        match self.probe.console_getter_trap() {
            Ok(fired) => fired,
            Err(e) => {
                debug!(error = %e, "Console trap unavailable");
                false
            }
        }
    }

    /// SHA-256 of the rendered canvas data URL.
    pub async fn canvas_fingerprint(&self) -> Fingerprint {
        match self.probe.render_canvas(&self.config.canvas_recipe).await {
            Ok(data_url) if data_url.is_empty() || data_url == EMPTY_DATA_URL => {
                debug!("Canvas produced no image data");
                Fingerprint::Unsupported
            }
            Ok(data_url) => Fingerprint::Digest(sha256_hex(data_url)),
            Err(ProbeError::Unavailable(reason)) => {
                debug!(%reason, "Canvas unsupported");
                Fingerprint::Unsupported
            }
            Err(e) => {
                warn!(error = %e, "Canvas fingerprint failed");
                Fingerprint::Error
            }
        }
    }

    /// SHA-256 of `vendor~renderer` from the WebGL debug extension.
    pub async fn webgl_fingerprint(&self) -> Fingerprint {
        match self.probe.webgl_debug_info().await {
            Ok(info) => webgl_fingerprint_from(&info),
            Err(ProbeError::Unavailable(reason)) => {
                debug!(%reason, "WebGL unsupported");
                Fingerprint::Unsupported
            }
            Err(e) => {
                warn!(error = %e, "WebGL fingerprint failed");
                Fingerprint::Error
            }
        }
    }
}

/// Map a WebGL reading to its fingerprint.
pub fn webgl_fingerprint_from(info: &WebGlDebugInfo) -> Fingerprint {
    match info {
        WebGlDebugInfo::Unsupported => Fingerprint::Unsupported,
        WebGlDebugInfo::NoDebugInfo => Fingerprint::NoDebugInfo,
        WebGlDebugInfo::Available { vendor, renderer } => {
            Fingerprint::Digest(sha256_hex(format!("{vendor}{WEBGL_DELIMITER}{renderer}")))
        }
    }
}

/// Browsers cannot see whether the device is rooted. The field stays in the
/// bundle so a native wrapper can fill it without a schema change.
fn detect_rooted() -> bool {
    false
}

/// Collect with default configuration.
pub async fn collect_fingerprint<P: DeviceProbe>(probe: P) -> DeviceSignalBundle {
    FingerprintCollector::new(probe).collect_fingerprint().await
}
