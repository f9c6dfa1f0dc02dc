//! The signal bundle attached to authentication requests.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RiskProbeError;

const SENTINEL_UNSUPPORTED: &str = "unsupported";
const SENTINEL_NO_DEBUG_INFO: &str = "no_debug_info";
const SENTINEL_ERROR: &str = "error";

/// A rendering fingerprint: either a SHA-256 digest or a sentinel explaining
/// why no measurement was taken.
///
/// Serializes to the bare digest or to one of `"unsupported"`,
/// `"no_debug_info"` and `"error"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Fingerprint {
    /// Hex-encoded SHA-256 digest
    Digest(String),
    /// The platform API does not exist (no canvas, no WebGL context)
    Unsupported,
    /// WebGL is available but the debug-renderer-info extension is masked
    NoDebugInfo,
    /// The measurement failed unexpectedly
    Error,
}

impl Fingerprint {
    /// Whether this is a real measurement rather than a sentinel.
    pub fn is_measured(&self) -> bool {
        matches!(self, Self::Digest(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Digest(digest) => digest,
            Self::Unsupported => SENTINEL_UNSUPPORTED,
            Self::NoDebugInfo => SENTINEL_NO_DEBUG_INFO,
            Self::Error => SENTINEL_ERROR,
        }
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Fingerprint> for String {
    fn from(value: Fingerprint) -> Self {
        match value {
            Fingerprint::Digest(digest) => digest,
            other => other.as_str().to_string(),
        }
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = RiskProbeError;

    fn try_from(value: String) -> Result<Self, RiskProbeError> {
        match value.as_str() {
            SENTINEL_UNSUPPORTED => Ok(Self::Unsupported),
            SENTINEL_NO_DEBUG_INFO => Ok(Self::NoDebugInfo),
            SENTINEL_ERROR => Ok(Self::Error),
            digest if digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit()) => {
                Ok(Self::Digest(digest.to_ascii_lowercase()))
            }
            other => Err(RiskProbeError::InvalidSnapshot(format!(
                "not a fingerprint digest or sentinel: {other:?}"
            ))),
        }
    }
}

/// Heuristic risk signals gathered once per authentication attempt.
///
/// The bundle is a function of the environment at collection time and is
/// never persisted: the caller attaches it to one request and drops it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSignalBundle {
    /// Browser name derived from the user agent
    pub browser_name: String,
    /// Browser version derived from the user agent
    pub browser_version: String,
    /// Operating system name derived from the user agent
    pub os_name: String,
    /// Raw `navigator.platform` string
    pub platform: String,
    /// IANA timezone name
    pub timezone: String,
    /// Negotiated language (e.g. "en-US")
    pub language: String,
    /// Screen resolution as `WxH`
    pub screen_resolution: String,
    /// SHA-256 of the rendered canvas data URL
    pub canvas_fingerprint: Fingerprint,
    /// SHA-256 of `vendor~renderer` from the WebGL debug extension
    pub webgl_fingerprint: Fingerprint,
    pub devtools_open: bool,
    /// Raw automation flag reading
    pub is_webdriver: bool,
    /// OR over the automation/emulator checks
    pub is_emulator: bool,
    /// Always false in a browser sandbox
    pub is_rooted: bool,
    pub collected_at: DateTime<Utc>,
}

/// Format a screen size the way it is transmitted.
pub fn format_resolution(width: u32, height: u32) -> String {
    format!("{width}x{height}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::sha256_hex;

    #[test]
    fn test_sentinels_serialize_as_bare_strings() {
        assert_eq!(
            serde_json::to_string(&Fingerprint::Unsupported).unwrap(),
            "\"unsupported\""
        );
        assert_eq!(
            serde_json::to_string(&Fingerprint::NoDebugInfo).unwrap(),
            "\"no_debug_info\""
        );
        assert_eq!(serde_json::to_string(&Fingerprint::Error).unwrap(), "\"error\"");
    }

    #[test]
    fn test_digest_parses_back() {
        let digest = sha256_hex("canvas");
        let parsed: Fingerprint = serde_json::from_str(&format!("\"{digest}\"")).unwrap();
        assert_eq!(parsed, Fingerprint::Digest(digest));
        assert!(parsed.is_measured());
    }

    #[test]
    fn test_rejects_garbage() {
        let result: std::result::Result<Fingerprint, _> = serde_json::from_str("\"nope\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_format_resolution() {
        assert_eq!(format_resolution(1920, 1080), "1920x1080");
    }
}
