//! Collection scenarios against recorded environments.
//!
//! These tests drive the public API the way the CLI and the browser bindings
//! do: a recorded environment is replayed through [`SnapshotProbe`], collected,
//! scored and shaped into the request payload.

use riskprobe_core::{
    collect_fingerprint, AuthRiskPayload, ClientHints, EnvironmentSnapshot, Fingerprint,
    FingerprintCollector, RecordedEnvironment, ReputationConfig, ReputationInput,
    ReputationScorer, RiskProbeConfig, SnapshotProbe, VisitorReport, WebGlDebugInfo,
};

const HEADLESS_RECORDING: &str = r#"{
    "environment": {
        "user_agent": "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) HeadlessChrome/119.0.0.0 Safari/537.36",
        "platform": "Linux x86_64",
        "language": "en-US",
        "languages": [],
        "timezone": "UTC",
        "screen_width": 800,
        "screen_height": 600,
        "outer_width": 800,
        "outer_height": 600,
        "inner_width": 800,
        "inner_height": 600,
        "webdriver": true,
        "hardware_concurrency": 2
    },
    "canvas_data_url": "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAMgAAAAy",
    "webgl": { "status": "available", "vendor": "Google Inc. (Google)", "renderer": "ANGLE (Google, Vulkan 1.3.0 (SwiftShader Device (Subzero)), SwiftShader driver)" }
}"#;

fn desktop_recording() -> RecordedEnvironment {
    RecordedEnvironment {
        environment: EnvironmentSnapshot {
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15".into(),
            platform: "MacIntel".into(),
            language: "fr-FR".into(),
            languages: Some(vec!["fr-FR".into(), "fr".into(), "en".into()]),
            timezone: "Europe/Paris".into(),
            screen_width: 1512,
            screen_height: 982,
            outer_width: 1512,
            outer_height: 944,
            inner_width: 1512,
            inner_height: 852,
            hardware_concurrency: Some(10),
            ..Default::default()
        },
        canvas_data_url: Some("data:image/png;base64,AAAA".into()),
        webgl: Some(WebGlDebugInfo::Available {
            vendor: "Apple Inc.".into(),
            renderer: "Apple M1 Pro".into(),
        }),
        console_trap_fired: None,
    }
}

#[tokio::test]
async fn test_headless_webdriver_is_emulator() {
    let recorded = RecordedEnvironment::from_json(HEADLESS_RECORDING.as_bytes())
        .expect("Recording should decode");
    let bundle = collect_fingerprint(SnapshotProbe::new(recorded)).await;

    assert!(bundle.is_webdriver);
    assert!(bundle.is_emulator);
    assert_eq!(bundle.browser_name, "Chrome");
    assert_eq!(bundle.os_name, "Linux");
    assert_eq!(bundle.screen_resolution, "800x600");
}

#[tokio::test]
async fn test_headless_recording_scores_software_renderer() {
    let recorded = RecordedEnvironment::from_json(HEADLESS_RECORDING.as_bytes()).unwrap();
    let probe = SnapshotProbe::new(recorded);
    let input = ReputationInput::gather(&probe, VisitorReport::default()).await;
    let assessment = ReputationScorer::new(ReputationConfig::default())
        .unwrap()
        .assess(&input);

    assert!(assessment.emulator.fired.contains(&"software_renderer".to_string()));
    // one indicator is below the default threshold of two
    assert!(!assessment.emulator_suspected());
}

#[tokio::test]
async fn test_matching_provider_report_is_not_vpn() {
    let probe = SnapshotProbe::new(desktop_recording());
    let visitor = VisitorReport {
        timezone: Some("Europe/Paris".into()),
        languages: vec!["fr".into()],
    };
    let input = ReputationInput::gather(&probe, visitor).await;
    let assessment = ReputationScorer::new(ReputationConfig::default())
        .unwrap()
        .assess(&input);

    assert!(!assessment.vpn_suspected());
    assert!(!assessment.suspicious);
}

#[tokio::test]
async fn test_mismatched_provider_report_is_vpn() {
    let probe = SnapshotProbe::new(desktop_recording());
    let visitor = VisitorReport {
        timezone: Some("America/Los_Angeles".into()),
        languages: vec!["en".into()],
    };
    let input = ReputationInput::gather(&probe, visitor).await;
    let assessment = ReputationScorer::new(ReputationConfig::default())
        .unwrap()
        .assess(&input);

    // "en" is in navigator.languages but the primary language is French
    assert!(assessment.vpn_suspected());
    assert_eq!(
        assessment.vpn.fired,
        vec!["timezone_mismatch".to_string(), "language_mismatch".to_string()]
    );
}

#[tokio::test]
async fn test_missing_renderings_become_sentinels() {
    let mut recorded = desktop_recording();
    recorded.canvas_data_url = None;
    recorded.webgl = Some(WebGlDebugInfo::NoDebugInfo);
    let bundle = collect_fingerprint(SnapshotProbe::new(recorded)).await;

    assert_eq!(bundle.canvas_fingerprint, Fingerprint::Unsupported);
    assert_eq!(bundle.webgl_fingerprint, Fingerprint::NoDebugInfo);
    assert_eq!(bundle.browser_name, "Safari");
    assert_eq!(bundle.os_name, "macOS");
}

#[tokio::test]
async fn test_config_drives_devtools_threshold() {
    // 92px of browser chrome
    let recorded = desktop_recording();

    let strict = RiskProbeConfig::from_lookup(|key| {
        (key == "RISKPROBE_DEVTOOLS_THRESHOLD_PX").then(|| "50".to_string())
    });
    let collector = FingerprintCollector::with_config(
        SnapshotProbe::new(recorded.clone()),
        strict.collector(),
    );
    assert!(collector.collect_fingerprint().await.devtools_open);

    let bundle = collect_fingerprint(SnapshotProbe::new(recorded)).await;
    assert!(!bundle.devtools_open);
}

#[tokio::test]
async fn test_payload_and_hints_from_recording() {
    let bundle = collect_fingerprint(SnapshotProbe::new(desktop_recording())).await;
    let hints = ClientHints::from_bundle(&bundle);
    let payload = AuthRiskPayload::new(bundle);

    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(json["is_webdriver"], false);
    assert_eq!(json["device_fingerprint"]["timezone"], "Europe/Paris");
    assert_eq!(json["device_fingerprint"]["screen_resolution"], "1512x982");

    let decoded: AuthRiskPayload = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, payload);

    assert_eq!(
        hints.headers()[0],
        ("X-Client-Timezone", "Europe/Paris".to_string())
    );
}
