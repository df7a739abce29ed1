// src/sections/validator.rs
use crate::sections::splitter::SectionSplitter;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};

static VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"//\s*@version").expect("Failed to compile VERSION_RE")
});

static DECLARATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:indicator|strategy)\(").expect("Failed to compile DECLARATION_RE")
});

// Any numbered header, whatever its name looks like
static SECTION_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"//==+\s*\n// SECTION \d+:").expect("Failed to compile SECTION_MARKER_RE")
});

static INPUT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\binput\.").expect("Failed to compile INPUT_RE")
});

/// Lint-style health signals for a script. Every failed check is just `false`.
///
/// Delimiter balance is plain character counting; brackets inside strings
/// or comments are counted like any other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub has_version: bool,
    pub has_indicator: bool,
    pub has_input_params: bool,
    pub balanced_brackets: bool,
    pub balanced_parentheses: bool,
    pub no_unfinished_comments: bool,
    pub has_sections: bool,
    pub section_count: usize,
    pub total_sections: usize,
    pub malformed_headers: usize,
    pub duplicate_sections: Vec<String>,
    // Compiler messages that sometimes get pasted back into the script
    pub no_unused_vars: bool,
    pub no_misplaced_var: bool,
    pub checksum: String,
}

impl ValidationReport {
    const CRITICAL: [&'static str; 5] = [
        "has_version",
        "has_indicator",
        "balanced_brackets",
        "balanced_parentheses",
        "no_unfinished_comments",
    ];

    /// Named boolean checks, in display order.
    pub fn checks(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("has_version", self.has_version),
            ("has_indicator", self.has_indicator),
            ("has_input_params", self.has_input_params),
            ("balanced_brackets", self.balanced_brackets),
            ("balanced_parentheses", self.balanced_parentheses),
            ("no_unfinished_comments", self.no_unfinished_comments),
            ("has_sections", self.has_sections),
            ("no_unused_vars", self.no_unused_vars),
            ("no_misplaced_var", self.no_misplaced_var),
        ]
    }

    pub fn failed_critical(&self) -> Vec<&'static str> {
        self.checks()
            .into_iter()
            .filter(|(name, ok)| !ok && Self::CRITICAL.contains(name))
            .map(|(name, _)| name)
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.failed_critical().is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Validator {
    splitter: SectionSplitter,
}

impl Validator {
    pub fn new(splitter: SectionSplitter) -> Self {
        Self { splitter }
    }

    pub fn validate(&self, document: &str) -> ValidationReport {
        let map = self.splitter.split(document);
        let section_count = map.discovered().count();

        let comment_opens = document.matches("/*").count();
        let comment_closes = document.matches("*/").count();

        ValidationReport {
            has_version: VERSION_RE.is_match(document),
            has_indicator: DECLARATION_RE.is_match(document),
            has_input_params: INPUT_RE.is_match(document),
            balanced_brackets: document.matches('{').count() == document.matches('}').count(),
            balanced_parentheses: document.matches('(').count() == document.matches(')').count(),
            no_unfinished_comments: comment_opens == 0 || comment_opens == comment_closes,
            has_sections: SECTION_MARKER_RE.is_match(document),
            section_count,
            total_sections: map.len(),
            malformed_headers: map.malformed_headers().len(),
            duplicate_sections: map.duplicates().to_vec(),
            no_unused_vars: !document.contains("Unused variable"),
            no_misplaced_var: !document.contains("Cannot use 'var' with"),
            checksum: checksum(document),
        }
    }
}

/// SHA-256 of the document, hex encoded.
pub fn checksum(document: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = "//@version=5\nindicator(\"Pivots\", overlay=true)\n\
//=====\n// SECTION 1: INPUT PARAMETERS\nlen = input.int(14, \"Length\")\n\
//=====\n// SECTION 2: VISUALIZATION\nplot(ta.sma(close, len))\n";

    #[test]
    fn test_lowercase_headers_still_count_as_sections() {
        let doc = "//@version=5\nindicator(\"x\")\n//==\n// SECTION 1: inputs\nlen = 14\n";
        let report = Validator::default().validate(doc);
        assert!(report.has_sections);
        assert_eq!(report.section_count, 0);
    }

    #[test]
    fn test_well_formed_script_passes() {
        let report = Validator::default().validate(SCRIPT);
        assert!(report.is_valid(), "failed: {:?}", report.failed_critical());
        assert!(report.has_input_params);
        assert!(report.has_sections);
        assert_eq!(report.section_count, 2);
        assert_eq!(report.total_sections, 12);
        assert_eq!(report.malformed_headers, 0);
    }

    #[test]
    fn test_unbalanced_brackets() {
        let doc = format!("{SCRIPT}if a {{\n  {{\n {{ }}\n}}\n");
        let report = Validator::default().validate(&doc);
        assert!(!report.balanced_brackets);
        assert!(!report.is_valid());
        assert_eq!(report.failed_critical(), vec!["balanced_brackets"]);
    }

    #[test]
    fn test_missing_version_marker() {
        let doc = SCRIPT.replace("//@version=5\n", "");
        let report = Validator::default().validate(&doc);
        assert!(!report.has_version);
        assert!(report.failed_critical().contains(&"has_version"));
    }

    #[test]
    fn test_version_marker_with_space() {
        let report = Validator::default().validate("// @version=4\nstrategy(\"s\")\n");
        assert!(report.has_version);
        assert!(report.has_indicator);
        assert!(!report.has_sections);
    }

    #[test]
    fn test_comment_and_paren_checks() {
        let report = Validator::default().validate("/* open\nplot(close\n");
        assert!(!report.no_unfinished_comments);
        assert!(!report.balanced_parentheses);

        let report = Validator::default().validate("/* closed */\n");
        assert!(report.no_unfinished_comments);
    }

    #[test]
    fn test_pasted_compiler_messages() {
        let report = Validator::default().validate("// Unused variable 'x'\n// Cannot use 'var' with tuples\n");
        assert!(!report.no_unused_vars);
        assert!(!report.no_misplaced_var);
    }

    #[test]
    fn test_checksum_is_stable_and_content_sensitive() {
        assert_eq!(checksum(""), "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
        assert_eq!(checksum(SCRIPT), checksum(SCRIPT));
        assert_ne!(checksum(SCRIPT), checksum(&SCRIPT.replace("14", "21")));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = Validator::default().validate(SCRIPT);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["section_count"], 2);
        assert_eq!(json["balanced_brackets"], true);
        assert_eq!(json["checksum"].as_str().unwrap().len(), 64);
    }
}
