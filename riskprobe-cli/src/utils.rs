//! Common utility functions shared across CLI commands.

use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::{ColoredString, Colorize};
use riskprobe_core::{
    Coordinates, Fingerprint, InputEvent, RecordedEnvironment, RiskProbeConfig, VisitorReport,
};
use serde::Serialize;
use tracing::debug;

fn read(path: &Path, what: &str) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read {what}: {}", path.display()))?;
    debug!(path = %path.display(), bytes = bytes.len(), "Read {what}");
    Ok(bytes)
}

/// Load a recorded environment (navigator readings plus rendering outputs).
pub fn load_snapshot(path: &Path) -> Result<RecordedEnvironment> {
    let bytes = read(path, "snapshot")?;
    RecordedEnvironment::from_json(&bytes)
        .with_context(|| format!("Failed to parse snapshot: {}", path.display()))
}

/// Load a visitor-identification provider report.
pub fn load_visitor_report(path: &Path) -> Result<VisitorReport> {
    let bytes = read(path, "visitor report")?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse visitor report: {}", path.display()))
}

/// Load a recorded input event stream (JSON array).
pub fn load_events(path: &Path) -> Result<Vec<InputEvent>> {
    let bytes = read(path, "event file")?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse event file: {}", path.display()))
}

/// Parse `LAT,LON`.
pub fn parse_coordinates(value: &str) -> Result<Coordinates> {
    let Some((lat, lon)) = value.split_once(',') else {
        bail!("Invalid --geo value {value:?}: expected LAT,LON");
    };
    let (Ok(lat), Ok(lon)) = (lat.trim().parse::<f64>(), lon.trim().parse::<f64>()) else {
        bail!("Invalid --geo value {value:?}: expected LAT,LON");
    };
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        bail!("Invalid --geo value {value:?}: out of range");
    }
    Ok(Coordinates { lat, lon })
}

/// `RiskProbeConfig::from_env`, validated.
pub fn load_config() -> Result<RiskProbeConfig> {
    let config = RiskProbeConfig::from_env();
    config.validate()?;
    debug!(?config, "Loaded configuration");
    Ok(config)
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

/// `yes` in red or `no` in green.
pub fn flag(value: bool) -> ColoredString {
    if value {
        "yes".red().bold()
    } else {
        "no".green()
    }
}

/// Shortened digest, or the sentinel in yellow.
pub fn fingerprint(value: &Fingerprint) -> ColoredString {
    match value {
        Fingerprint::Digest(digest) => digest.get(..16).unwrap_or(digest).normal(),
        sentinel => sentinel.as_str().yellow(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinates() {
        let coords = parse_coordinates("48.8566, 2.3522").unwrap();
        assert_eq!(coords.lat, 48.8566);
        assert_eq!(coords.lon, 2.3522);
    }

    #[test]
    fn test_parse_coordinates_rejects_garbage() {
        assert!(parse_coordinates("north").is_err());
        assert!(parse_coordinates("1,east").is_err());
        assert!(parse_coordinates("91,0").is_err());
        assert!(parse_coordinates("0,-181").is_err());
    }

    #[test]
    fn test_fingerprint_display_is_truncated() {
        let digest = Fingerprint::Digest("a".repeat(64));
        let shown = fingerprint(&digest).to_string();
        assert!(shown.contains(&"a".repeat(16)));
        assert!(!shown.contains(&"a".repeat(17)));
    }
}
