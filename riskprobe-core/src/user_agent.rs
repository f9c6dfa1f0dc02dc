//! Browser and OS identification from the user-agent string.
//!
//! Rules are evaluated in order and the first match wins, so more specific
//! tokens (`Edg/`, `OPR/`) must come before the generic ones they embed
//! (`Chrome/`, `Safari/`).

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Name reported when no rule matches.
pub const UNKNOWN: &str = "Unknown";

/// Browser name and version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserInfo {
    pub name: String,
    pub version: String,
}

/// Operating system name plus the raw platform string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsInfo {
    pub name: String,
    pub platform: String,
}

struct UaRule {
    name: &'static str,
    pattern: Regex,
}

fn browser_rules() -> &'static [UaRule] {
    static RULES: OnceLock<Vec<UaRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            ("Edge", r"Edg(?:e|A|iOS)?/([\d.]+)"),
            ("Opera", r"(?:OPR|Opera)/([\d.]+)"),
            ("Samsung Internet", r"SamsungBrowser/([\d.]+)"),
            ("Firefox", r"(?:Firefox|FxiOS)/([\d.]+)"),
            ("Chrome", r"(?:Chrome|CriOS)/([\d.]+)"),
            ("Safari", r"Version/([\d.]+).*Safari/"),
            ("Internet Explorer", r"(?:MSIE |Trident/.*rv:)([\d.]+)"),
        ]
        .into_iter()
        .filter_map(|(name, pattern)| {
            Regex::new(pattern)
                .ok()
                .map(|pattern| UaRule { name, pattern })
        })
        .collect()
    })
}

fn os_rules() -> &'static [UaRule] {
    static RULES: OnceLock<Vec<UaRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            ("Windows", r"Windows NT|Win64|Win32"),
            ("iOS", r"iPhone|iPad|iPod"),
            ("Android", r"Android"),
            ("macOS", r"Mac OS X|Macintosh"),
            ("Chrome OS", r"CrOS"),
            ("Linux", r"Linux|X11"),
        ]
        .into_iter()
        .filter_map(|(name, pattern)| {
            Regex::new(pattern)
                .ok()
                .map(|pattern| UaRule { name, pattern })
        })
        .collect()
    })
}

fn mobile_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"Mobi|Android|iPhone|iPad|iPod|Opera Mini|IEMobile").ok())
        .as_ref()
}

/// Identify the browser from a user-agent string.
pub fn parse_browser(user_agent: &str) -> BrowserInfo {
    browser_rules()
        .iter()
        .find_map(|rule| {
            rule.pattern.captures(user_agent).map(|caps| BrowserInfo {
                name: rule.name.to_string(),
                version: caps
                    .get(1)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_else(|| UNKNOWN.to_string()),
            })
        })
        .unwrap_or_else(|| BrowserInfo {
            name: UNKNOWN.to_string(),
            version: UNKNOWN.to_string(),
        })
}

/// Identify the operating system from a user-agent string.
pub fn parse_os(user_agent: &str, platform: &str) -> OsInfo {
    let name = os_rules()
        .iter()
        .find(|rule| rule.pattern.is_match(user_agent))
        .map(|rule| rule.name)
        .unwrap_or(UNKNOWN);

    OsInfo {
        name: name.to_string(),
        platform: platform.to_string(),
    }
}

/// Whether the user agent advertises a phone or tablet.
pub fn is_mobile(user_agent: &str) -> bool {
    mobile_pattern().is_some_and(|re| re.is_match(user_agent))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.6099.109 Safari/537.36";
    const EDGE_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.2210.91";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Mobile/15E148 Safari/604.1";
    const FIREFOX_LINUX: &str =
        "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";
    const CHROME_ANDROID: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.6099.144 Mobile Safari/537.36";
    const HEADLESS: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) HeadlessChrome/119.0.0.0 Safari/537.36";

    #[test]
    fn test_chrome_on_windows() {
        let browser = parse_browser(CHROME_WIN);
        assert_eq!(browser.name, "Chrome");
        assert_eq!(browser.version, "120.0.6099.109");
        assert_eq!(parse_os(CHROME_WIN, "Win32").name, "Windows");
    }

    #[test]
    fn test_edge_wins_over_chrome() {
        let browser = parse_browser(EDGE_WIN);
        assert_eq!(browser.name, "Edge");
        assert_eq!(browser.version, "120.0.2210.91");
    }

    #[test]
    fn test_safari_on_iphone_is_ios_not_macos() {
        let browser = parse_browser(SAFARI_IPHONE);
        assert_eq!(browser.name, "Safari");
        assert_eq!(browser.version, "17.1");

        let os = parse_os(SAFARI_IPHONE, "iPhone");
        assert_eq!(os.name, "iOS");
        assert_eq!(os.platform, "iPhone");
        assert!(is_mobile(SAFARI_IPHONE));
    }

    #[test]
    fn test_firefox_on_linux() {
        assert_eq!(parse_browser(FIREFOX_LINUX).name, "Firefox");
        assert_eq!(parse_os(FIREFOX_LINUX, "Linux x86_64").name, "Linux");
        assert!(!is_mobile(FIREFOX_LINUX));
    }

    #[test]
    fn test_android_before_linux() {
        assert_eq!(parse_os(CHROME_ANDROID, "Linux armv8l").name, "Android");
        assert!(is_mobile(CHROME_ANDROID));
    }

    #[test]
    fn test_headless_chrome_still_reports_chrome() {
        let browser = parse_browser(HEADLESS);
        assert_eq!(browser.name, "Chrome");
        assert_eq!(browser.version, "119.0.0.0");
    }

    #[test]
    fn test_unknown_user_agent() {
        let browser = parse_browser("curl/8.4.0");
        assert_eq!(browser.name, UNKNOWN);
        assert_eq!(browser.version, UNKNOWN);
        assert_eq!(parse_os("curl/8.4.0", "").name, UNKNOWN);
    }
}
