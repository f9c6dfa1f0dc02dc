//! Collect command implementation.

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use riskprobe_core::{ClientHints, DeviceSignalBundle, FingerprintCollector, SnapshotProbe};
use tracing::info;

use crate::utils::{self, fingerprint, flag};

/// Execute the collect command.
pub async fn execute(snapshot: PathBuf, json: bool) -> Result<()> {
    let config = utils::load_config()?;
    let recorded = utils::load_snapshot(&snapshot)?;

    let collector = FingerprintCollector::with_config(SnapshotProbe::new(recorded), config.collector());
    let bundle = collector.collect_fingerprint().await;

    info!(
        browser = %bundle.browser_name,
        os = %bundle.os_name,
        is_emulator = bundle.is_emulator,
        "Collected fingerprint"
    );

    if json {
        return utils::print_json(&bundle);
    }

    print_bundle(&bundle);
    println!();
    println!("{}", "Client headers".bold());
    for (name, value) in ClientHints::from_bundle(&bundle).headers() {
        println!("   {} {}", format!("{name}:").dimmed(), value);
    }
    Ok(())
}

pub fn print_bundle(bundle: &DeviceSignalBundle) {
    println!();
    println!("{}", "Device signals".bold());
    println!(
        "   {} {} {}",
        "Browser:".dimmed(),
        bundle.browser_name,
        bundle.browser_version
    );
    println!(
        "   {} {} ({})",
        "OS:".dimmed(),
        bundle.os_name,
        bundle.platform
    );
    println!("   {} {}", "Timezone:".dimmed(), bundle.timezone);
    println!("   {} {}", "Language:".dimmed(), bundle.language);
    println!("   {} {}", "Screen:".dimmed(), bundle.screen_resolution);
    println!(
        "   {} {}",
        "Canvas:".dimmed(),
        fingerprint(&bundle.canvas_fingerprint)
    );
    println!(
        "   {} {}",
        "WebGL:".dimmed(),
        fingerprint(&bundle.webgl_fingerprint)
    );
    println!();
    println!("{}", "Risk flags".bold());
    println!("   {} {}", "Devtools open:".dimmed(), flag(bundle.devtools_open));
    println!("   {} {}", "Webdriver:".dimmed(), flag(bundle.is_webdriver));
    println!("   {} {}", "Emulator:".dimmed(), flag(bundle.is_emulator));
    println!("   {} {}", "Rooted:".dimmed(), flag(bundle.is_rooted));
}
