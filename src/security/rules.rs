//! Declarative text rules for heuristic source checks
//!
//! A [`RuleSet`] is a list of [`Rule`]s evaluated against the raw text of one
//! artifact. Only gating rules decide the verdict; informational rules are
//! reported alongside it.

use aho_corasick::AhoCorasick;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Textual evidence a rule looks for
#[derive(Debug, Clone)]
pub enum Evidence {
    /// Exact substring
    Literal(String),
    /// Substring, ignoring ASCII case
    LiteralIgnoreCase(String),
    /// Any of several exact substrings
    AnyLiteral(AhoCorasick),
    /// Regular expression match
    Pattern(Regex),
    /// Every inner evidence must be present
    AllOf(Vec<Evidence>),
    /// At least one inner evidence must be present
    AnyOf(Vec<Evidence>),
    /// Inner evidence must not be present
    Absent(Box<Evidence>),
}

impl Evidence {
    pub fn literal(text: &str) -> Self {
        Self::Literal(text.to_string())
    }

    pub fn literal_ignore_case(text: &str) -> Self {
        Self::LiteralIgnoreCase(text.to_ascii_lowercase())
    }

    /// Any of `patterns`, matched in one pass
    pub fn any_literal(patterns: &[&str]) -> Self {
        match AhoCorasick::new(patterns) {
            Ok(automaton) => Self::AnyLiteral(automaton),
            Err(_) => Self::AnyOf(patterns.iter().map(|p| Self::literal(p)).collect()),
        }
    }

    pub fn pattern(regex: Regex) -> Self {
        Self::Pattern(regex)
    }

    pub fn all_of(evidence: Vec<Evidence>) -> Self {
        Self::AllOf(evidence)
    }

    pub fn any_of(evidence: Vec<Evidence>) -> Self {
        Self::AnyOf(evidence)
    }

    pub fn absent(evidence: Evidence) -> Self {
        Self::Absent(Box::new(evidence))
    }

    /// Whether the evidence holds for `text`
    pub fn holds(&self, text: &str) -> bool {
        match self {
            Self::Literal(needle) => text.contains(needle.as_str()),
            Self::LiteralIgnoreCase(needle) => text.to_ascii_lowercase().contains(needle.as_str()),
            Self::AnyLiteral(automaton) => automaton.is_match(text),
            Self::Pattern(regex) => regex.is_match(text),
            Self::AllOf(inner) => inner.iter().all(|e| e.holds(text)),
            Self::AnyOf(inner) => inner.iter().any(|e| e.holds(text)),
            Self::Absent(inner) => !inner.holds(text),
        }
    }

    /// Number of non-overlapping matches of the positive evidence in `text`
    ///
    /// For `Absent` this counts the forbidden matches.
    pub fn occurrences(&self, text: &str) -> usize {
        match self {
            Self::Literal(needle) => text.matches(needle.as_str()).count(),
            Self::LiteralIgnoreCase(needle) => {
                text.to_ascii_lowercase().matches(needle.as_str()).count()
            }
            Self::AnyLiteral(automaton) => automaton.find_iter(text).count(),
            Self::Pattern(regex) => regex.find_iter(text).count(),
            Self::AllOf(inner) | Self::AnyOf(inner) => {
                inner.iter().map(|e| e.occurrences(text)).sum()
            }
            Self::Absent(inner) => inner.occurrences(text),
        }
    }
}

/// One named condition over an artifact's text
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub evidence: Evidence,
    /// Gating rules decide the check verdict
    pub gating: bool,
}

impl Rule {
    pub fn gating(name: &str, evidence: Evidence) -> Self {
        Self {
            name: name.to_string(),
            evidence,
            gating: true,
        }
    }

    pub fn informational(name: &str, evidence: Evidence) -> Self {
        Self {
            name: name.to_string(),
            evidence,
            gating: false,
        }
    }

    /// Evaluate the rule against `text`
    pub fn evaluate(&self, text: &str) -> SubCheck {
        let passed = self.evidence.holds(text);

        let detail = match (&self.evidence, passed) {
            (Evidence::Absent(_), false) => Some(format!(
                "Found {} potential occurrence(s)",
                self.evidence.occurrences(text)
            )),
            _ => None,
        };

        debug!(rule = %self.name, gating = self.gating, passed, "rule evaluated");

        SubCheck {
            description: self.name.clone(),
            passed,
            gating: self.gating,
            detail,
        }
    }
}

/// Result of one rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCheck {
    pub description: String,
    pub passed: bool,
    pub gating: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Verdict of one heuristic check over one artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    pub check_name: String,
    /// Conjunction of the gating sub-checks only
    pub passed: bool,
    pub sub_checks: Vec<SubCheck>,
}

impl CheckReport {
    /// Descriptions of the gating sub-checks that failed
    pub fn gating_failures(&self) -> Vec<&str> {
        self.sub_checks
            .iter()
            .filter(|c| c.gating && !c.passed)
            .map(|c| c.description.as_str())
            .collect()
    }

    /// Descriptions of the informational sub-checks that failed
    pub fn warnings(&self) -> Vec<&str> {
        self.sub_checks
            .iter()
            .filter(|c| !c.gating && !c.passed)
            .map(|c| c.description.as_str())
            .collect()
    }
}

/// Named list of rules for one artifact category
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub name: String,
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(name: &str, rules: Vec<Rule>) -> Self {
        Self {
            name: name.to_string(),
            rules,
        }
    }

    /// Evaluate every rule, in order, against `text`
    pub fn evaluate(&self, text: &str) -> CheckReport {
        let sub_checks: Vec<SubCheck> = self.rules.iter().map(|r| r.evaluate(text)).collect();
        let passed = sub_checks.iter().filter(|c| c.gating).all(|c| c.passed);

        CheckReport {
            check_name: self.name.clone(),
            passed,
            sub_checks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_is_case_sensitive() {
        assert!(Evidence::literal("verifyJWT").holds("export function verifyJWT() {}"));
        assert!(!Evidence::literal("verifyJWT").holds("function verifyjwt() {}"));
    }

    #[test]
    fn test_literal_ignore_case() {
        let evidence = Evidence::literal_ignore_case("Not Found");
        assert!(evidence.holds("throw new Error('NOT FOUND')"));
        assert!(!evidence.holds("missing"));
    }

    #[test]
    fn test_any_literal() {
        let evidence = Evidence::any_literal(&["&lt;", "replace(/</g"]);
        assert!(evidence.holds("s.replace(/</g, '&lt;')"));
        assert!(evidence.holds("'&lt;'"));
        assert!(!evidence.holds("s.trim()"));
        assert_eq!(evidence.occurrences("&lt; &lt; replace(/</g"), 3);
    }

    #[test]
    fn test_absent_counts_forbidden_matches() {
        let evidence = Evidence::absent(Evidence::literal("eval("));
        assert!(evidence.holds("const x = 1;"));
        assert!(!evidence.holds("eval(a); eval(b);"));
        assert_eq!(evidence.occurrences("eval(a); eval(b);"), 2);
    }

    #[test]
    fn test_all_of_and_any_of() {
        let both = Evidence::all_of(vec![Evidence::literal("try"), Evidence::literal("catch")]);
        assert!(both.holds("try { x() } catch (e) {}"));
        assert!(!both.holds("try { x() } finally {}"));

        let either = Evidence::any_of(vec![Evidence::literal("404"), Evidence::literal("missing")]);
        assert!(either.holds("status = 404"));
        assert!(!either.holds("status = 500"));
    }

    #[test]
    fn test_rule_detail_only_for_failed_absence() {
        let rule = Rule::informational(
            "No hardcoded secrets",
            Evidence::absent(Evidence::pattern(Regex::new(r"secret\s*=").unwrap())),
        );

        let failed = rule.evaluate("secret = 'a'; secret='b'");
        assert!(!failed.passed);
        assert!(!failed.gating);
        assert_eq!(failed.detail.as_deref(), Some("Found 2 potential occurrence(s)"));

        let passed = rule.evaluate("const x = 1;");
        assert!(passed.passed);
        assert_eq!(passed.detail, None);
    }

    #[test]
    fn test_rule_set_verdict_ignores_informational_rules() {
        let set = RuleSet::new(
            "Demo",
            vec![
                Rule::gating("has alpha", Evidence::literal("alpha")),
                Rule::informational("has beta", Evidence::literal("beta")),
            ],
        );

        let report = set.evaluate("alpha only");
        assert!(report.passed);
        assert_eq!(report.warnings(), vec!["has beta"]);
        assert!(report.gating_failures().is_empty());

        let report = set.evaluate("beta only");
        assert!(!report.passed);
        assert_eq!(report.gating_failures(), vec!["has alpha"]);
    }

    #[test]
    fn test_rule_set_preserves_rule_order() {
        let set = RuleSet::new(
            "Order",
            vec![
                Rule::gating("first", Evidence::literal("a")),
                Rule::gating("second", Evidence::literal("b")),
                Rule::informational("third", Evidence::literal("c")),
            ],
        );

        let report = set.evaluate("abc");
        let names: Vec<_> = report.sub_checks.iter().map(|c| c.description.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }
}
