//! Payload command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use riskprobe_core::{
    collect_geolocation, AuthRiskPayload, BiometricsTracker, FingerprintCollector,
    SnapshotProbe, StaticGeolocation,
};
use tracing::debug;

use crate::utils;

pub struct PayloadArgs {
    pub snapshot: PathBuf,
    pub events: Option<PathBuf>,
    pub geo: Option<String>,
    pub reduce_location: bool,
    pub body: Option<PathBuf>,
}

/// Execute the payload command. Always prints JSON.
pub async fn execute(args: PayloadArgs) -> Result<()> {
    let config = utils::load_config()?;
    let recorded = utils::load_snapshot(&args.snapshot)?;

    let coords = match args.geo.as_deref() {
        Some(geo) => {
            let coords = utils::parse_coordinates(geo)?;
            let source = StaticGeolocation::at(coords.lat, coords.lon);
            collect_geolocation(&source, &config.geolocation()).await
        }
        None => None,
    };

    let biometrics = match &args.events {
        Some(path) => {
            let events = utils::load_events(path)?;
            Some(BiometricsTracker::replay(&events).summarize())
        }
        None => None,
    };

    let bundle = FingerprintCollector::with_config(SnapshotProbe::new(recorded), config.collector())
        .collect_fingerprint()
        .await;

    let payload = AuthRiskPayload::new(bundle).with_biometrics(biometrics);
    let payload = if args.reduce_location {
        payload.with_reduced_location(coords, config.geohash_precision)
    } else {
        payload.with_geolocation(coords)
    };
    debug!(
        geolocation = payload.geolocation.is_some(),
        geohash = ?payload.location_geohash,
        biometrics = payload.biometrics.is_some(),
        "Built payload"
    );

    match &args.body {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read request body: {}", path.display()))?;
            let mut body: serde_json::Value = serde_json::from_slice(&bytes)
                .with_context(|| format!("Failed to parse request body: {}", path.display()))?;
            payload
                .merge_into(&mut body)
                .context("Failed to serialize payload")?;
            utils::print_json(&body)
        }
        None => utils::print_json(&payload),
    }
}
