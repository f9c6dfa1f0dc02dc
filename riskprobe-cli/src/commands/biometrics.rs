//! Biometrics command implementation.

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use riskprobe_core::BiometricsTracker;

use crate::utils;

/// Execute the biometrics command.
pub fn execute(events: PathBuf, json: bool) -> Result<()> {
    let events = utils::load_events(&events)?;
    let tracker = BiometricsTracker::replay(&events);
    let summary = tracker.summarize();

    if json {
        return utils::print_json(&summary);
    }

    println!();
    println!("{}", "Input rhythm".bold());
    println!(
        "   {} {} keystrokes, {} mouse samples (of {} events)",
        "Kept:".dimmed(),
        tracker.keystroke_count(),
        tracker.mouse_sample_count(),
        events.len()
    );
    println!(
        "   {} {:.1} ms",
        "Avg keystroke interval:".dimmed(),
        summary.avg_typing_speed
    );
    println!(
        "   {} {:.2} px",
        "Mouse travel std-dev:".dimmed(),
        summary.mouse_variance
    );
    Ok(())
}
