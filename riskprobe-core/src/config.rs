//! Runtime configuration.
//!
//! Values come from `RISKPROBE_*` environment variables with defaults that
//! match the browser build. Unparseable values fall back to the default;
//! [`RiskProbeConfig::validate`] rejects values that parse but make no sense.

use std::str::FromStr;
use std::time::Duration;

use crate::collector::CollectorConfig;
use crate::error::{Result, RiskProbeError};
use crate::geolocation::GeolocationOptions;
use crate::rate_limit::RateLimitConfig;
use crate::reputation::ReputationConfig;

/// Longest geohash the `geohash` crate encodes.
const MAX_GEOHASH_PRECISION: usize = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct RiskProbeConfig {
    /// Outer-minus-inner window delta that counts as a docked devtools panel (default: 160)
    pub devtools_threshold_px: u32,
    /// Run the console getter trap (default: false)
    pub console_trap_enabled: bool,
    /// Requests allowed per window (default: 10)
    pub rate_limit_max: u32,
    /// Rate limit window in milliseconds (default: 60000)
    pub rate_limit_window_ms: u64,
    /// Geolocation timeout in milliseconds (default: 5000)
    pub geolocation_timeout_ms: u64,
    /// VPN indicators required to flag (default: 2)
    pub vpn_threshold: usize,
    /// Emulator indicators required to flag (default: 2)
    pub emulator_threshold: usize,
    /// Geohash length for reduced location (default: 6)
    pub geohash_precision: usize,
}

impl Default for RiskProbeConfig {
    fn default() -> Self {
        Self {
            devtools_threshold_px: 160,
            console_trap_enabled: false,
            rate_limit_max: 10,
            rate_limit_window_ms: 60_000,
            geolocation_timeout_ms: 5_000,
            vpn_threshold: 2,
            emulator_threshold: 2,
            geohash_precision: 6,
        }
    }
}

impl RiskProbeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// The wasm crate feeds this from `window.RISKPROBE_CONFIG`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let console_trap_enabled = lookup("RISKPROBE_CONSOLE_TRAP")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(defaults.console_trap_enabled);

        Self {
            devtools_threshold_px: parse_key(
                &lookup,
                "RISKPROBE_DEVTOOLS_THRESHOLD_PX",
                defaults.devtools_threshold_px,
            ),
            console_trap_enabled,
            rate_limit_max: parse_key(&lookup, "RISKPROBE_RATE_LIMIT_MAX", defaults.rate_limit_max),
            rate_limit_window_ms: parse_key(
                &lookup,
                "RISKPROBE_RATE_LIMIT_WINDOW_MS",
                defaults.rate_limit_window_ms,
            ),
            geolocation_timeout_ms: parse_key(
                &lookup,
                "RISKPROBE_GEOLOCATION_TIMEOUT_MS",
                defaults.geolocation_timeout_ms,
            ),
            vpn_threshold: parse_key(&lookup, "RISKPROBE_VPN_THRESHOLD", defaults.vpn_threshold),
            emulator_threshold: parse_key(
                &lookup,
                "RISKPROBE_EMULATOR_THRESHOLD",
                defaults.emulator_threshold,
            ),
            geohash_precision: parse_key(
                &lookup,
                "RISKPROBE_GEOHASH_PRECISION",
                defaults.geohash_precision,
            ),
        }
    }

    /// Reject values that would disable a component outright.
    pub fn validate(&self) -> Result<()> {
        if self.rate_limit_max == 0 {
            return Err(RiskProbeError::ConfigError(
                "rate_limit_max must be at least 1".into(),
            ));
        }
        if self.rate_limit_window_ms == 0 {
            return Err(RiskProbeError::ConfigError(
                "rate_limit_window_ms must be positive".into(),
            ));
        }
        if self.vpn_threshold == 0 || self.emulator_threshold == 0 {
            return Err(RiskProbeError::ConfigError(
                "reputation thresholds must be at least 1".into(),
            ));
        }
        if !(1..=MAX_GEOHASH_PRECISION).contains(&self.geohash_precision) {
            return Err(RiskProbeError::ConfigError(format!(
                "geohash_precision must be between 1 and {MAX_GEOHASH_PRECISION}"
            )));
        }
        Ok(())
    }

    pub fn collector(&self) -> CollectorConfig {
        CollectorConfig {
            devtools_threshold_px: self.devtools_threshold_px,
            console_trap_enabled: self.console_trap_enabled,
            ..CollectorConfig::default()
        }
    }

    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_requests: self.rate_limit_max,
            window: Duration::from_millis(self.rate_limit_window_ms),
            cleanup_interval: Duration::from_millis(self.rate_limit_window_ms),
        }
    }

    pub fn reputation(&self) -> ReputationConfig {
        ReputationConfig {
            vpn_threshold: self.vpn_threshold,
            emulator_threshold: self.emulator_threshold,
        }
    }

    pub fn geolocation(&self) -> GeolocationOptions {
        GeolocationOptions {
            timeout: Duration::from_millis(self.geolocation_timeout_ms),
            ..GeolocationOptions::default()
        }
    }
}

/// Parse `key` from `lookup`, falling back to `default` when it is missing or malformed.
fn parse_key<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RiskProbeConfig::default();
        assert_eq!(config.devtools_threshold_px, 160);
        assert!(!config.console_trap_enabled);
        assert_eq!(config.rate_limit_max, 10);
        assert_eq!(config.rate_limit_window_ms, 60_000);
        assert_eq!(config.geolocation_timeout_ms, 5_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = RiskProbeConfig::from_lookup(lookup(&[
            ("RISKPROBE_CONSOLE_TRAP", "TRUE"),
            ("RISKPROBE_RATE_LIMIT_MAX", "3"),
            ("RISKPROBE_RATE_LIMIT_WINDOW_MS", "1000"),
            ("RISKPROBE_VPN_THRESHOLD", "1"),
        ]));
        assert!(config.console_trap_enabled);
        assert_eq!(config.rate_limit().max_requests, 3);
        assert_eq!(config.rate_limit().window, Duration::from_millis(1000));
        assert_eq!(config.reputation().vpn_threshold, 1);
    }

    #[test]
    fn test_garbage_falls_back_to_default() {
        let config =
            RiskProbeConfig::from_lookup(lookup(&[("RISKPROBE_DEVTOOLS_THRESHOLD_PX", "wide")]));
        assert_eq!(config.devtools_threshold_px, 160);
    }

    #[test]
    fn test_every_numeric_key_trims_and_falls_back_alike() {
        let config = RiskProbeConfig::from_lookup(lookup(&[
            ("RISKPROBE_DEVTOOLS_THRESHOLD_PX", " 200 "),
            ("RISKPROBE_RATE_LIMIT_MAX", " 7 "),
            ("RISKPROBE_GEOLOCATION_TIMEOUT_MS", " 2500 "),
            ("RISKPROBE_GEOHASH_PRECISION", "-1"),
        ]));
        assert_eq!(config.devtools_threshold_px, 200);
        assert_eq!(config.rate_limit_max, 7);
        assert_eq!(config.geolocation_timeout_ms, 2_500);
        assert_eq!(
            config.geohash_precision,
            RiskProbeConfig::default().geohash_precision
        );
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let config = RiskProbeConfig {
            rate_limit_window_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RiskProbeError::ConfigError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_geohash_precision() {
        let config = RiskProbeConfig {
            geohash_precision: 13,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
