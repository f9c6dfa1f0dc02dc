//! Shaping of the risk sub-object sent with login and registration.
//!
//! The request body schema belongs to the backend; this module only produces
//! the part the collector owns and the client hint headers.

use serde::{Deserialize, Serialize};

use crate::biometrics::BiometricsSummary;
use crate::geolocation::Coordinates;
use crate::signals::DeviceSignalBundle;

/// Risk fields merged into an authentication request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthRiskPayload {
    pub is_webdriver: bool,
    pub is_emulator: bool,
    pub is_rooted: bool,
    pub device_fingerprint: DeviceSignalBundle,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub geolocation: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub location_geohash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub biometrics: Option<BiometricsSummary>,
}

impl AuthRiskPayload {
    pub fn new(bundle: DeviceSignalBundle) -> Self {
        Self {
            is_webdriver: bundle.is_webdriver,
            is_emulator: bundle.is_emulator,
            is_rooted: bundle.is_rooted,
            device_fingerprint: bundle,
            geolocation: None,
            location_geohash: None,
            biometrics: None,
        }
    }

    pub fn with_geolocation(mut self, coords: Option<Coordinates>) -> Self {
        self.geolocation = coords;
        self
    }

    /// Attach only a geohash of the location, dropping the raw coordinates.
    pub fn with_reduced_location(mut self, coords: Option<Coordinates>, precision: usize) -> Self {
        self.geolocation = None;
        self.location_geohash = coords.and_then(|c| c.to_geohash(precision));
        self
    }

    pub fn with_biometrics(mut self, summary: Option<BiometricsSummary>) -> Self {
        self.biometrics = summary;
        self
    }

    /// Merge into an existing JSON request body (e.g. `{username, password}`).
    ///
    /// Non-object bodies are replaced by the payload.
    pub fn merge_into(&self, body: &mut serde_json::Value) -> crate::Result<()> {
        let serde_json::Value::Object(risk) = serde_json::to_value(self)? else {
            return Ok(());
        };
        match body {
            serde_json::Value::Object(fields) => fields.extend(risk),
            other => *other = serde_json::Value::Object(risk),
        }
        Ok(())
    }
}

/// Headers the HTTP client wrapper attaches to every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHints {
    pub timezone: String,
    pub screen_resolution: String,
    pub is_webdriver: bool,
}

impl ClientHints {
    pub const TIMEZONE_HEADER: &'static str = "X-Client-Timezone";
    pub const SCREEN_HEADER: &'static str = "X-Screen-Resolution";
    pub const WEBDRIVER_HEADER: &'static str = "X-Is-Webdriver";

    pub fn from_bundle(bundle: &DeviceSignalBundle) -> Self {
        Self {
            timezone: bundle.timezone.clone(),
            screen_resolution: bundle.screen_resolution.clone(),
            is_webdriver: bundle.is_webdriver,
        }
    }

    pub fn headers(&self) -> Vec<(&'static str, String)> {
        vec![
            (Self::TIMEZONE_HEADER, self.timezone.clone()),
            (Self::SCREEN_HEADER, self.screen_resolution.clone()),
            (Self::WEBDRIVER_HEADER, self.is_webdriver.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::collect_fingerprint;
    use crate::mock::MockProbe;

    async fn bundle() -> DeviceSignalBundle {
        collect_fingerprint(MockProbe::desktop().with_snapshot(|env| env.webdriver = true)).await
    }

    #[tokio::test]
    async fn test_top_level_flags_mirror_bundle() {
        let payload = AuthRiskPayload::new(bundle().await);
        assert!(payload.is_webdriver);
        assert!(payload.is_emulator);
        assert!(!payload.is_rooted);
    }

    #[tokio::test]
    async fn test_optional_parts_are_omitted() {
        let json = serde_json::to_value(AuthRiskPayload::new(bundle().await)).unwrap();
        assert!(json.get("geolocation").is_none());
        assert!(json.get("biometrics").is_none());
        assert!(json.get("location_geohash").is_none());
        assert_eq!(json["device_fingerprint"]["webgl_fingerprint"].as_str().map(str::len), Some(64));
    }

    #[tokio::test]
    async fn test_optional_parts_when_present() {
        let payload = AuthRiskPayload::new(bundle().await)
            .with_geolocation(Some(Coordinates { lat: 1.5, lon: 2.5 }))
            .with_biometrics(Some(BiometricsSummary {
                avg_typing_speed: 120.0,
                mouse_variance: 3.0,
            }));
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["geolocation"]["lat"], 1.5);
        assert_eq!(json["biometrics"]["avg_typing_speed"], 120.0);
    }

    #[tokio::test]
    async fn test_reduced_location() {
        let payload = AuthRiskPayload::new(bundle().await).with_reduced_location(
            Some(Coordinates {
                lat: 57.64911,
                lon: 10.40744,
            }),
            5,
        );
        assert_eq!(payload.geolocation, None);
        assert_eq!(payload.location_geohash.as_deref(), Some("u4pru"));
    }

    #[tokio::test]
    async fn test_merge_into_login_body() {
        let mut body = serde_json::json!({"username": "alice", "password": "hunter2"});
        AuthRiskPayload::new(bundle().await)
            .merge_into(&mut body)
            .unwrap();
        assert_eq!(body["username"], "alice");
        assert_eq!(body["is_webdriver"], true);
        assert!(body["device_fingerprint"].is_object());
    }

    #[tokio::test]
    async fn test_client_hints() {
        let hints = ClientHints::from_bundle(&bundle().await);
        let headers = hints.headers();
        assert!(headers.contains(&("X-Client-Timezone", "Europe/London".to_string())));
        assert!(headers.contains(&("X-Screen-Resolution", "1920x1080".to_string())));
        assert!(headers.contains(&("X-Is-Webdriver", "true".to_string())));
    }
}
