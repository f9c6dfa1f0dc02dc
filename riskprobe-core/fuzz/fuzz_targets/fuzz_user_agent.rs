#![no_main]

//! Fuzz target for user-agent parsing
//!
//! Arbitrary strings must always parse to some browser and OS, never panic.
//!
//! Run with: cargo +nightly fuzz run fuzz_user_agent

use libfuzzer_sys::fuzz_target;
use riskprobe_core::user_agent::{is_mobile, parse_browser, parse_os};

fuzz_target!(|data: &[u8]| {
    let ua = String::from_utf8_lossy(data);
    let browser = parse_browser(&ua);
    assert!(!browser.name.is_empty());
    let _ = parse_os(&ua, "");
    let _ = is_mobile(&ua);
});
