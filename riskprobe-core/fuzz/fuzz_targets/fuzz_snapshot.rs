#![no_main]

//! Fuzz target for recorded environment parsing
//!
//! Malformed recordings must be rejected with an error. Anything that parses
//! is run through the automation checks.
//!
//! Run with: cargo +nightly fuzz run fuzz_snapshot

use libfuzzer_sys::fuzz_target;
use riskprobe_core::{AutomationChecks, EnvironmentSnapshot, RecordedEnvironment};

fuzz_target!(|data: &[u8]| {
    if let Ok(snapshot) = EnvironmentSnapshot::from_json(data) {
        let _ = AutomationChecks::evaluate(&snapshot).any();
        let _ = snapshot.has_touch();
    }
    if let Ok(recorded) = RecordedEnvironment::from_json(data) {
        let _ = AutomationChecks::evaluate(&recorded.environment);
    }
});
