//! Named heuristic indicators and threshold combination.
//!
//! An indicator is individually unreliable; a [`RuleSet`] flags its subject
//! only when at least `threshold` indicators hold.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskProbeError};

/// A named pure predicate over `T`.
pub struct Rule<T: ?Sized> {
    name: &'static str,
    predicate: fn(&T) -> bool,
}

impl<T: ?Sized> Rule<T> {
    pub const fn new(name: &'static str, predicate: fn(&T) -> bool) -> Self {
        Self { name, predicate }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn holds(&self, subject: &T) -> bool {
        (self.predicate)(subject)
    }
}

impl<T: ?Sized> Clone for Rule<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Rule<T> {}

impl<T: ?Sized> std::fmt::Debug for Rule<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Rule").field(&self.name).finish()
    }
}

/// True when at least `n` of `rules` hold for `subject`.
///
/// `n == 0` is trivially true.
pub fn at_least<T: ?Sized>(n: usize, rules: &[Rule<T>], subject: &T) -> bool {
    rules.iter().filter(|rule| rule.holds(subject)).take(n).count() >= n
}

/// Result of evaluating a [`RuleSet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOutcome {
    /// Names of the indicators that held
    pub fired: Vec<String>,
    pub threshold: usize,
    pub flagged: bool,
}

impl RuleOutcome {
    pub fn fired_count(&self) -> usize {
        self.fired.len()
    }
}

/// Indicators combined by an "at least n of N" threshold.
#[derive(Debug, Clone)]
pub struct RuleSet<T: ?Sized + 'static> {
    name: &'static str,
    rules: Vec<Rule<T>>,
    threshold: usize,
}

impl<T: ?Sized + 'static> RuleSet<T> {
    /// Build a rule set.
    ///
    /// A zero threshold would flag every subject, and a threshold above the
    /// rule count would flag none; both are rejected.
    pub fn new(name: &'static str, rules: Vec<Rule<T>>, threshold: usize) -> Result<Self> {
        if threshold == 0 {
            return Err(RiskProbeError::InvalidRuleSet(format!(
                "{name}: threshold must be at least 1"
            )));
        }
        if threshold > rules.len() {
            return Err(RiskProbeError::InvalidRuleSet(format!(
                "{name}: threshold {threshold} exceeds {} rules",
                rules.len()
            )));
        }
        Ok(Self {
            name,
            rules,
            threshold,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn rules(&self) -> &[Rule<T>] {
        &self.rules
    }

    /// Whether the subject reaches the threshold.
    pub fn is_flagged(&self, subject: &T) -> bool {
        at_least(self.threshold, &self.rules, subject)
    }

    /// Evaluate every rule and report which ones fired.
    pub fn evaluate(&self, subject: &T) -> RuleOutcome {
        let fired: Vec<String> = self
            .rules
            .iter()
            .filter(|rule| rule.holds(subject))
            .map(|rule| rule.name().to_string())
            .collect();
        let flagged = fired.len() >= self.threshold;
        RuleOutcome {
            fired,
            threshold: self.threshold,
            flagged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_even(n: &u32) -> bool {
        n % 2 == 0
    }

    fn is_large(n: &u32) -> bool {
        *n > 100
    }

    fn is_round(n: &u32) -> bool {
        n % 10 == 0
    }

    fn rules() -> Vec<Rule<u32>> {
        vec![
            Rule::new("even", is_even),
            Rule::new("large", is_large),
            Rule::new("round", is_round),
        ]
    }

    #[test]
    fn test_at_least() {
        let rules = rules();
        assert!(at_least(2, &rules, &120)); // all three
        assert!(at_least(2, &rules, &4_u32.pow(4))); // 256: even, large
        assert!(!at_least(2, &rules, &4)); // even only
        assert!(!at_least(1, &rules, &7));
        assert!(at_least(0, &rules, &7));
    }

    #[test]
    fn test_threshold_grows_with_rules() {
        // Adding a fourth indicator must not turn a 2-of-N check into "all".
        let mut rules = rules();
        rules.push(Rule::new("seven", |n: &u32| *n == 7));
        let set = RuleSet::new("numbers", rules, 2).unwrap();
        assert!(set.is_flagged(&256));
        assert!(!set.is_flagged(&7));
    }

    #[test]
    fn test_evaluate_reports_fired_rules() {
        let set = RuleSet::new("numbers", rules(), 2).unwrap();
        let outcome = set.evaluate(&30);
        assert_eq!(outcome.fired, vec!["even".to_string(), "round".to_string()]);
        assert!(outcome.flagged);
        assert_eq!(outcome.fired_count(), 2);
        assert_eq!(outcome.flagged, set.is_flagged(&30));
    }

    #[test]
    fn test_invalid_thresholds() {
        assert!(matches!(
            RuleSet::new("numbers", rules(), 0),
            Err(RiskProbeError::InvalidRuleSet(_))
        ));
        assert!(RuleSet::new("numbers", rules(), 4).is_err());
    }
}
