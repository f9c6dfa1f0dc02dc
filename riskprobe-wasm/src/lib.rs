//! WebAssembly bindings for RiskProbe.
//!
//! Collects the device signal bundle in the browser and shapes the risk
//! fields of login and registration requests. Results cross the boundary as
//! JSON strings.
//!
//! Runtime overrides are read from `window.RISKPROBE_CONFIG`, an object whose
//! keys are the `RISKPROBE_*` variable names, e.g.
//! `{ RISKPROBE_CONSOLE_TRAP: true, RISKPROBE_RATE_LIMIT_MAX: 5 }`.

mod biometrics;
mod browser;
mod geolocation;

use js_sys::Reflect;
use riskprobe_core::{
    AuthRiskPayload, BiometricsSummary, Clock, Coordinates, DeviceSignalBundle,
    FingerprintCollector, ReputationInput, ReputationScorer, RiskProbeConfig, VisitorReport,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub use biometrics::BiometricsSession;
pub use browser::BrowserProbe;
pub use geolocation::BrowserGeolocation;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

const CONFIG_GLOBAL: &str = "RISKPROBE_CONFIG";

/// Configuration with `window.RISKPROBE_CONFIG` applied over the defaults.
fn runtime_config() -> RiskProbeConfig {
    let overrides = web_sys::window()
        .and_then(|w| Reflect::get(&w, &JsValue::from_str(CONFIG_GLOBAL)).ok())
        .filter(|v| v.is_object());

    let config = match overrides {
        Some(overrides) => RiskProbeConfig::from_lookup(|key| {
            let value = Reflect::get(&overrides, &JsValue::from_str(key)).ok()?;
            value
                .as_string()
                .or_else(|| value.as_f64().map(|n| n.to_string()))
                .or_else(|| value.as_bool().map(|b| b.to_string()))
        }),
        None => RiskProbeConfig::default(),
    };

    match config.validate() {
        Ok(()) => config,
        Err(e) => {
            web_sys::console::warn_1(&JsValue::from_str(&format!(
                "{CONFIG_GLOBAL} ignored: {e}"
            )));
            RiskProbeConfig::default()
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| error_json(&format!("Serialization error: {e}")))
}

fn error_json(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

/// Collect the device signal bundle.
///
/// # Returns
/// A JSON string with the bundle, or `{"error": ...}` when there is no
/// browser window at all.
#[wasm_bindgen(js_name = collectFingerprint)]
pub async fn collect_fingerprint() -> String {
    let probe = match BrowserProbe::new() {
        Ok(probe) => probe,
        Err(e) => return error_json(&e.to_string()),
    };
    let bundle = FingerprintCollector::with_config(probe, runtime_config().collector())
        .collect_fingerprint()
        .await;
    to_json(&bundle)
}

/// Request the current position.
///
/// Resolves to `"null"` when the API is missing, permission is denied or the
/// request times out; never rejects.
#[wasm_bindgen(js_name = collectGeolocation)]
pub async fn collect_geolocation() -> String {
    let options = runtime_config().geolocation();
    let coords = riskprobe_core::collect_geolocation(&BrowserGeolocation::new(), &options).await;
    to_json(&coords)
}

/// Score VPN and emulator suspicion against a visitor-identification report.
///
/// # Arguments
/// * `visitor_json` - `{ "timezone": "...", "languages": ["..."] }` from the provider
#[wasm_bindgen(js_name = assessReputation)]
pub async fn assess_reputation(visitor_json: String) -> String {
    match assess_internal(&visitor_json).await {
        Ok(json) => json,
        Err(e) => error_json(&e),
    }
}

async fn assess_internal(visitor_json: &str) -> Result<String, String> {
    let visitor: VisitorReport = serde_json::from_str(visitor_json)
        .map_err(|e| format!("Failed to parse visitor report: {e}"))?;
    let scorer = ReputationScorer::new(runtime_config().reputation()).map_err(|e| e.to_string())?;
    let probe = BrowserProbe::new().map_err(|e| e.to_string())?;

    let input = ReputationInput::gather(&probe, visitor).await;
    Ok(to_json(&scorer.assess(&input)))
}

/// Build the risk fields for an authentication request body.
///
/// # Arguments
/// * `bundle_json` - Output of `collectFingerprint`
/// * `geolocation_json` - Output of `collectGeolocation`, if requested
/// * `biometrics_json` - Output of `BiometricsSession.summarize`, if tracked
/// * `reduce_location` - Send a geohash instead of raw coordinates
#[wasm_bindgen(js_name = buildAuthPayload)]
pub fn build_auth_payload(
    bundle_json: &str,
    geolocation_json: Option<String>,
    biometrics_json: Option<String>,
    reduce_location: bool,
) -> String {
    match build_internal(
        bundle_json,
        geolocation_json.as_deref(),
        biometrics_json.as_deref(),
        reduce_location,
    ) {
        Ok(json) => json,
        Err(e) => error_json(&e),
    }
}

fn build_internal(
    bundle_json: &str,
    geolocation_json: Option<&str>,
    biometrics_json: Option<&str>,
    reduce_location: bool,
) -> Result<String, String> {
    let bundle: DeviceSignalBundle = serde_json::from_str(bundle_json)
        .map_err(|e| format!("Failed to parse bundle: {e}"))?;
    let coords: Option<Coordinates> = match geolocation_json {
        Some(json) => serde_json::from_str(json)
            .map_err(|e| format!("Failed to parse geolocation: {e}"))?,
        None => None,
    };
    let biometrics: Option<BiometricsSummary> = match biometrics_json {
        Some(json) => Some(
            serde_json::from_str(json).map_err(|e| format!("Failed to parse biometrics: {e}"))?,
        ),
        None => None,
    };

    let payload = AuthRiskPayload::new(bundle).with_biometrics(biometrics);
    let payload = if reduce_location {
        payload.with_reduced_location(coords, runtime_config().geohash_precision)
    } else {
        payload.with_geolocation(coords)
    };
    Ok(to_json(&payload))
}

/// `Date.now()` clock for the rate limiter.
struct DateClock;

impl Clock for DateClock {
    fn now_ms(&self) -> u64 {
        js_sys::Date::now().max(0.0) as u64
    }
}

/// Advisory client-side rate limiter.
#[wasm_bindgen(js_name = RateLimiter)]
pub struct JsRateLimiter {
    inner: riskprobe_core::RateLimiter<DateClock>,
}

impl Default for JsRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen(js_class = RateLimiter)]
impl JsRateLimiter {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: riskprobe_core::RateLimiter::with_clock(runtime_config().rate_limit(), DateClock),
        }
    }

    /// Count a request for `id`; false once the window's budget is spent.
    pub fn check(&mut self, id: &str) -> bool {
        self.inner.check_rate_limit(id)
    }

    pub fn remaining(&self, id: &str) -> u32 {
        self.inner.remaining(id)
    }
}

/// Get the library version.
#[wasm_bindgen(js_name = getVersion)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLE: &str = r#"{
        "browser_name": "Firefox",
        "browser_version": "121.0",
        "os_name": "Linux",
        "platform": "Linux x86_64",
        "timezone": "Europe/Berlin",
        "language": "de-DE",
        "screen_resolution": "2560x1440",
        "canvas_fingerprint": "unsupported",
        "webgl_fingerprint": "no_debug_info",
        "devtools_open": false,
        "is_webdriver": false,
        "is_emulator": false,
        "is_rooted": false,
        "collected_at": "2026-01-01T00:00:00Z"
    }"#;

    #[test]
    fn test_build_payload_with_raw_location() {
        let json = build_internal(
            BUNDLE,
            Some(r#"{"lat":52.52,"lon":13.405}"#),
            Some(r#"{"avg_typing_speed":140.0,"mouse_variance":12.5}"#),
            false,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["is_emulator"], false);
        assert_eq!(value["geolocation"]["lat"], 52.52);
        assert_eq!(value["biometrics"]["mouse_variance"], 12.5);
        assert_eq!(value["device_fingerprint"]["webgl_fingerprint"], "no_debug_info");
    }

    #[test]
    fn test_null_geolocation_is_omitted() {
        let json = build_internal(BUNDLE, Some("null"), None, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("geolocation").is_none());
        assert!(value.get("biometrics").is_none());
    }

    #[test]
    fn test_malformed_bundle_is_reported() {
        let err = build_internal("{}", None, None, false).unwrap_err();
        assert!(err.starts_with("Failed to parse bundle"));
    }

    #[test]
    fn test_error_json_shape() {
        let value: serde_json::Value = serde_json::from_str(&error_json("no window")).unwrap();
        assert_eq!(value["error"], "no window");
    }
}
