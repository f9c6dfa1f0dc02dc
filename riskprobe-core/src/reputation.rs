//! VPN and emulator suspicion scoring.
//!
//! This scorer runs next to a third-party visitor-identification provider and
//! is independent of the collector's `is_emulator` flag: the collector ORs
//! its automation checks, while each suspicion here needs at least
//! `threshold` indicators.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::Result;
use crate::probe::{DeviceProbe, EnvironmentSnapshot, WebGlDebugInfo};
use crate::rules::{Rule, RuleOutcome, RuleSet};
use crate::user_agent;

/// Emulator and virtualization app names matched against the user agent.
pub const KNOWN_EMULATORS: &[&str] = &[
    "bluestacks",
    "nox",
    "memu",
    "ldplayer",
    "genymotion",
    "andy",
    "koplayer",
    "droid4x",
    "mumu",
    "gameloop",
    "android sdk built for x86",
    "sdk_gphone",
];

/// Software rasterizers and VM display adapters matched against the WebGL renderer.
pub const SOFTWARE_RENDERERS: &[&str] = &[
    "swiftshader",
    "llvmpipe",
    "softpipe",
    "virtualbox",
    "vmware",
    "parallels",
    "microsoft basic render",
    "mesa offscreen",
];

/// What the visitor-identification provider reported about this client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitorReport {
    /// Timezone inferred by the provider (usually from the IP address)
    pub timezone: Option<String>,
    /// Languages the provider detected
    pub languages: Vec<String>,
}

/// Everything the reputation rules look at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReputationInput {
    pub environment: EnvironmentSnapshot,
    /// Unmasked WebGL renderer, when the debug extension exposed it
    pub webgl_renderer: Option<String>,
    pub visitor: VisitorReport,
}

impl ReputationInput {
    /// Read the environment and WebGL renderer from a probe.
    ///
    /// Probe failures leave the corresponding readings empty, which makes the
    /// rules that depend on them not fire.
    pub async fn gather<P: DeviceProbe + ?Sized>(probe: &P, visitor: VisitorReport) -> Self {
        let environment = probe.snapshot().unwrap_or_default();
        let webgl_renderer = match probe.webgl_debug_info().await {
            Ok(WebGlDebugInfo::Available { renderer, .. }) => Some(renderer),
            _ => None,
        };
        Self {
            environment,
            webgl_renderer,
            visitor,
        }
    }
}

/// Primary language subtag, lowercased ("en-US" -> "en").
fn primary_subtag(tag: &str) -> String {
    tag.split(['-', '_'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn timezone_mismatch(input: &ReputationInput) -> bool {
    match input.visitor.timezone.as_deref() {
        Some(reported) if !reported.is_empty() && !input.environment.timezone.is_empty() => {
            !reported.eq_ignore_ascii_case(&input.environment.timezone)
        }
        _ => false,
    }
}

fn language_mismatch(input: &ReputationInput) -> bool {
    let browser = primary_subtag(&input.environment.language);
    if browser.is_empty() || input.visitor.languages.is_empty() {
        return false;
    }
    !input
        .visitor
        .languages
        .iter()
        .any(|detected| primary_subtag(detected) == browser)
}

fn emulator_user_agent(input: &ReputationInput) -> bool {
    let ua = input.environment.user_agent.to_lowercase();
    KNOWN_EMULATORS.iter().any(|name| contains_word(&ua, name))
}

fn unusual_core_count(input: &ReputationInput) -> bool {
    match input.environment.hardware_concurrency {
        Some(cores) => cores == 1 || cores > 16,
        None => false,
    }
}

fn mobile_without_touch(input: &ReputationInput) -> bool {
    user_agent::is_mobile(&input.environment.user_agent) && !input.environment.has_touch()
}

fn software_renderer(input: &ReputationInput) -> bool {
    input.webgl_renderer.as_deref().is_some_and(|renderer| {
        let renderer = renderer.to_lowercase();
        SOFTWARE_RENDERERS.iter().any(|name| renderer.contains(name))
    })
}

/// Substring match that refuses to match inside a longer alphanumeric word,
/// so "nox" does not match "xenox" or "andy" does not match "candy".
fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// VPN indicators, in evaluation order.
pub fn vpn_rules() -> Vec<Rule<ReputationInput>> {
    vec![
        Rule::new("timezone_mismatch", timezone_mismatch),
        Rule::new("language_mismatch", language_mismatch),
    ]
}

/// Emulator indicators, in evaluation order.
pub fn emulator_rules() -> Vec<Rule<ReputationInput>> {
    vec![
        Rule::new("emulator_user_agent", emulator_user_agent),
        Rule::new("unusual_core_count", unusual_core_count),
        Rule::new("mobile_without_touch", mobile_without_touch),
        Rule::new("software_renderer", software_renderer),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReputationConfig {
    pub vpn_threshold: usize,
    pub emulator_threshold: usize,
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            vpn_threshold: 2,
            emulator_threshold: 2,
        }
    }
}

/// Outcome of a reputation check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationAssessment {
    pub vpn: RuleOutcome,
    pub emulator: RuleOutcome,
    /// VPN flag OR emulator flag
    pub suspicious: bool,
}

impl ReputationAssessment {
    pub fn vpn_suspected(&self) -> bool {
        self.vpn.flagged
    }

    pub fn emulator_suspected(&self) -> bool {
        self.emulator.flagged
    }
}

/// Evaluates the VPN and emulator rule sets.
#[derive(Debug, Clone)]
pub struct ReputationScorer {
    vpn: RuleSet<ReputationInput>,
    emulator: RuleSet<ReputationInput>,
}

impl ReputationScorer {
    pub fn new(config: ReputationConfig) -> Result<Self> {
        Ok(Self {
            vpn: RuleSet::new("vpn", vpn_rules(), config.vpn_threshold)?,
            emulator: RuleSet::new("emulator", emulator_rules(), config.emulator_threshold)?,
        })
    }

    pub fn is_vpn_suspected(&self, input: &ReputationInput) -> bool {
        self.vpn.is_flagged(input)
    }

    pub fn is_emulator_suspected(&self, input: &ReputationInput) -> bool {
        self.emulator.is_flagged(input)
    }

    #[instrument(level = "debug", skip_all)]
    pub fn assess(&self, input: &ReputationInput) -> ReputationAssessment {
        let vpn = self.vpn.evaluate(input);
        let emulator = self.emulator.evaluate(input);
        let suspicious = vpn.flagged || emulator.flagged;

        debug!(
            vpn_fired = ?vpn.fired,
            emulator_fired = ?emulator.fired,
            suspicious,
            "Reputation assessed"
        );

        ReputationAssessment {
            vpn,
            emulator,
            suspicious,
        }
    }
}
