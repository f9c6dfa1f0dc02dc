//! Assess command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use riskprobe_core::{ReputationInput, ReputationScorer, RuleOutcome, SnapshotProbe};
use tracing::info;

use crate::utils::{self, flag};

/// Execute the assess command.
pub async fn execute(snapshot: PathBuf, visitor: PathBuf, json: bool) -> Result<()> {
    let config = utils::load_config()?;
    let recorded = utils::load_snapshot(&snapshot)?;
    let visitor = utils::load_visitor_report(&visitor)?;

    let scorer = ReputationScorer::new(config.reputation())
        .context("Configuration error: invalid reputation thresholds")?;
    let probe = SnapshotProbe::new(recorded);
    let input = ReputationInput::gather(&probe, visitor).await;
    let assessment = scorer.assess(&input);

    info!(
        vpn = assessment.vpn_suspected(),
        emulator = assessment.emulator_suspected(),
        "Reputation assessed"
    );

    if json {
        return utils::print_json(&assessment);
    }

    println!();
    print_outcome("VPN suspected", &assessment.vpn);
    print_outcome("Emulator suspected", &assessment.emulator);
    println!();
    let verdict = if assessment.suspicious {
        "SUSPICIOUS".red().bold()
    } else {
        "CLEAN".green().bold()
    };
    println!("   {} {}", "Verdict:".dimmed(), verdict);
    Ok(())
}

fn print_outcome(label: &str, outcome: &RuleOutcome) {
    println!(
        "{} {} ({}/{} indicators)",
        format!("{label}:").bold(),
        flag(outcome.flagged),
        outcome.fired_count(),
        outcome.threshold
    );
    for name in &outcome.fired {
        println!("   {} {}", "-".dimmed(), name);
    }
}
