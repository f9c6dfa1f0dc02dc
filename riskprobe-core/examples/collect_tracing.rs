//! Example demonstrating collector tracing instrumentation.
//!
//! Run with: cargo run -p riskprobe-core --example collect_tracing

use riskprobe_core::{
    FingerprintCollector, MockProbe, ProbeError, ReputationConfig, ReputationInput,
    ReputationScorer, VisitorReport, WebGlDebugInfo,
};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::new("riskprobe_core=debug,info"))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    println!("=== Fingerprint Collection Tracing Demo ===\n");

    // A VM guest: software renderer, one core, canvas blocked by an extension
    let probe = MockProbe::desktop()
        .with_snapshot(|env| env.hardware_concurrency = Some(1))
        .with_webgl(Ok(WebGlDebugInfo::Available {
            vendor: "Mesa".to_string(),
            renderer: "llvmpipe (LLVM 15.0.7, 256 bits)".to_string(),
        }))
        .with_canvas_failure(ProbeError::Denied("canvas blocked".to_string()));

    let collector = FingerprintCollector::new(probe.clone());
    let bundle = collector.collect_fingerprint().await;

    println!("\nBundle:");
    match serde_json::to_string_pretty(&bundle) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Failed to serialize bundle: {e}"),
    }

    let scorer = match ReputationScorer::new(ReputationConfig::default()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Invalid reputation config: {e}");
            return;
        }
    };

    let visitor = VisitorReport {
        timezone: Some("Asia/Singapore".to_string()),
        languages: vec!["zh".to_string()],
    };
    let input = ReputationInput::gather(&probe, visitor).await;
    let assessment = scorer.assess(&input);

    println!("\nReputation:");
    println!("   VPN fired:      {:?}", assessment.vpn.fired);
    println!("   Emulator fired: {:?}", assessment.emulator.fired);
    println!("   Suspicious:     {}", assessment.suspicious);
}
