//! RiskProbe Core - client-side risk signals for authentication requests
//!
//! This crate gathers device, environment and behavioral signals in the
//! client and shapes them into the risk fields a backend fraud engine scores.
//! It makes no decisions itself: every flag is advisory.
//!
//! # Features
//!
//! - Canvas and WebGL rendering fingerprints (SHA-256)
//! - Automation / headless browser detection
//! - Devtools detection from window geometry and an optional console trap
//! - VPN and emulator suspicion from threshold rule sets
//! - Keystroke and mouse rhythm summaries
//! - Optional geolocation reduced to a geohash
//! - Advisory per-identifier rate limiting
//!
//! Platform access goes through the [`DeviceProbe`] and [`GeolocationSource`]
//! traits. The `riskprobe-wasm` crate implements them on top of the browser;
//! [`MockProbe`] and [`SnapshotProbe`] implement them from memory.
//!
//! # Example
//!
//! ```no_run
//! use riskprobe_core::{AuthRiskPayload, ClientHints, FingerprintCollector, MockProbe};
//!
//! # async fn example() -> riskprobe_core::Result<()> {
//! let collector = FingerprintCollector::new(MockProbe::desktop());
//! let bundle = collector.collect_fingerprint().await;
//!
//! for (name, value) in ClientHints::from_bundle(&bundle).headers() {
//!     println!("{name}: {value}");
//! }
//!
//! let mut body = serde_json::json!({ "username": "alice", "password": "hunter2" });
//! AuthRiskPayload::new(bundle).merge_into(&mut body)?;
//! # Ok(())
//! # }
//! ```

pub mod biometrics;
pub mod collector;
pub mod config;
pub mod error;
pub mod geolocation;
pub mod hashing;
pub mod mock;
pub mod payload;
pub mod probe;
pub mod rate_limit;
pub mod reputation;
pub mod rules;
pub mod signals;
pub mod user_agent;

// Re-export main types for convenience
pub use biometrics::{BiometricsSummary, BiometricsTracker, InputEvent, TrackerState};
pub use collector::{collect_fingerprint, AutomationChecks, CollectorConfig, FingerprintCollector};
pub use config::RiskProbeConfig;
pub use error::{ProbeError, Result, RiskProbeError};
pub use geolocation::{
    collect_geolocation, Coordinates, GeolocationError, GeolocationOptions, GeolocationSource,
    StaticGeolocation,
};
pub use mock::MockProbe;
pub use payload::{AuthRiskPayload, ClientHints};
pub use probe::{
    CanvasRecipe, DeviceProbe, EnvironmentSnapshot, RecordedEnvironment, SnapshotProbe,
    WebGlDebugInfo,
};
pub use rate_limit::{Clock, ManualClock, RateLimitConfig, RateLimiter, SystemClock};
pub use reputation::{
    ReputationAssessment, ReputationConfig, ReputationInput, ReputationScorer, VisitorReport,
};
pub use rules::{at_least, Rule, RuleOutcome, RuleSet};
pub use signals::{DeviceSignalBundle, Fingerprint};
