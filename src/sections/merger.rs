// src/sections/merger.rs
use crate::sections::resolve::resolve_name;
use crate::sections::splitter::{SectionOrigin, SectionSplitter};
use crate::utils::error::SectionError;
use std::ops::Range;

/// Extra checks a caller can attach to a merge.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeGuard<'a> {
    /// Names to resolve the query against (normally the registry). When
    /// `None`, the names found in the live document are used.
    pub known_names: Option<&'a [String]>,
    /// Text the caller last saw for this section. A live span that no longer
    /// equals it is reported as drift instead of being overwritten.
    pub baseline: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merged {
    pub document: String,
    pub section_name: String,
    /// Byte range the old section occupied in the input document.
    pub replaced: Range<usize>,
    /// Byte range the new text occupies in `document`.
    pub inserted: Range<usize>,
}

impl Merged {
    /// Length change applied to every offset after the edited section.
    pub fn delta(&self) -> isize {
        self.inserted.len() as isize - self.replaced.len() as isize
    }
}

/// Swaps one section of a document for new text, leaving every other byte alone.
///
/// Spans are recomputed from the live document on each call and replaced by
/// byte offset, so identical bodies elsewhere in the document are never touched.
#[derive(Debug, Clone, Default)]
pub struct SectionMerger {
    splitter: SectionSplitter,
}

impl SectionMerger {
    pub fn new() -> Self {
        Self { splitter: SectionSplitter::new() }
    }

    pub fn with_splitter(splitter: SectionSplitter) -> Self {
        Self { splitter }
    }

    pub fn merge(&self, document: &str, query: &str, new_text: &str) -> Result<Merged, SectionError> {
        self.merge_guarded(document, query, new_text, MergeGuard::default())
    }

    /// On error the input document is left as it was; nothing is rewritten.
    pub fn merge_guarded(
        &self,
        document: &str,
        query: &str,
        new_text: &str,
        guard: MergeGuard<'_>,
    ) -> Result<Merged, SectionError> {
        let live = self.splitter.split(document);

        // 1. Resolve the query to one name
        let name = match guard.known_names {
            Some(names) => resolve_name(query, names),
            None => resolve_name(query, live.resolvable_names().as_slice()),
        }
        .into_result(query)?;

        // 2. Find where that section sits right now (the preamble is a span too)
        let target = live.live_span(&name).ok_or_else(|| SectionError::DriftedSection {
            name: name.clone(),
            reason: "no header for this section in the live document".to_string(),
        })?;
        let range = target.range();
        let has_header = target.origin == SectionOrigin::Discovered;

        if let Some(baseline) = guard.baseline {
            if &document[range.clone()] != baseline {
                tracing::warn!(
                    "Live text of '{}' (bytes {}..{}) differs from the registered copy",
                    name, range.start, range.end
                );
                return Err(SectionError::DriftedSection {
                    name,
                    reason: "live text no longer matches the registered copy".to_string(),
                });
            }
        }

        // 3. Splice by offset
        let mut out = String::with_capacity(document.len() - range.len() + new_text.len());
        out.push_str(&document[..range.start]);
        out.push_str(new_text);
        out.push_str(&document[range.end..]);

        // 4. The section must still open at the same offset, or its text
        // would be folded into the previous one
        if has_header {
            let resplit = self.splitter.split(&out);
            if resplit.live_span(&name).map(|s| s.start) != Some(range.start) {
                tracing::warn!("Replacement for '{}' lost its header, document left unchanged", name);
                return Err(SectionError::HeaderMissing { name });
            }
        }

        let inserted = range.start..range.start + new_text.len();
        tracing::debug!(
            "Merged section '{}': bytes {}..{} replaced by {} bytes",
            name, range.start, range.end, new_text.len()
        );

        Ok(Merged { document: out, section_name: name, replaced: range, inserted })
    }
}

/// Merges with the default splitter.
pub fn merge(document: &str, section_name: &str, new_text: &str) -> Result<Merged, SectionError> {
    SectionMerger::new().merge(document, section_name, new_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::splitter::split;

    const DOC: &str = "//==\n// SECTION 1: ALPHA\nfoo\n//==\n// SECTION 2: BETA\nbar\n";

    #[test]
    fn test_merge_replaces_only_the_target() {
        let merged = merge(DOC, "beta", "//==\n// SECTION 2: BETA\nbaz\n").unwrap();
        assert_eq!(merged.document, DOC.replace("bar", "baz"));
        assert_eq!(merged.section_name, "BETA");
        assert_eq!(merged.delta(), 0);
    }

    #[test]
    fn test_merge_with_itself_is_identity() {
        let doc = format!("//@version=5\n{DOC}");
        let map = split(&doc);
        for section in map.discovered() {
            let merged = merge(&doc, &section.name, &section.text).unwrap();
            assert_eq!(merged.document, doc);
            assert_eq!(merged.replaced, merged.inserted);
        }
        let preamble = map.preamble().unwrap();
        assert_eq!(merge(&doc, "preamble", &preamble.text).unwrap().document, doc);
    }

    #[test]
    fn test_length_arithmetic_and_names_survive() {
        let old = split(DOC).get("ALPHA").unwrap().text.clone();
        let new_text = "//==\n// SECTION 1: ALPHA\nfoo = 1\nfoo := foo + 1\n";
        let merged = merge(DOC, "ALPHA", new_text).unwrap();

        assert_eq!(merged.document.len(), DOC.len() - old.len() + new_text.len());
        assert_eq!(merged.delta(), new_text.len() as isize - old.len() as isize);
        assert_eq!(split(&merged.document).names(), split(DOC).names());

        // Offsets after the edit shift by the delta
        let before = split(DOC).get("BETA").unwrap().start as isize;
        let after = split(&merged.document).get("BETA").unwrap().start as isize;
        assert_eq!(after - before, merged.delta());
    }

    #[test]
    fn test_not_found_leaves_document_alone() {
        let err = merge(DOC, "nonexistent", "x").unwrap_err();
        assert_eq!(err, SectionError::SectionNotFound("nonexistent".to_string()));
    }

    #[test]
    fn test_ambiguous_query_is_rejected() {
        let doc = "//==\n// SECTION 1: PIVOT POINT CALCULATION\na\n//==\n// SECTION 2: PIVOT ARRAYS AND LABELS\nb\n";
        let err = merge(doc, "pivot", "x").unwrap_err();
        assert!(matches!(err, SectionError::AmbiguousMatch { .. }));
    }

    #[test]
    fn test_placeholder_target_is_drift() {
        // Canonical name, but the document has no header for it
        let err = merge(DOC, "volatility", "x").unwrap_err();
        assert!(matches!(err, SectionError::DriftedSection { ref name, .. } if name == "VOLATILITY ANALYSIS"));
    }

    #[test]
    fn test_registered_name_missing_from_live_document_is_drift() {
        let known = vec!["ALPHA".to_string(), "GAMMA".to_string()];
        let guard = MergeGuard { known_names: Some(known.as_slice()), baseline: None };
        let err = SectionMerger::new().merge_guarded(DOC, "gamma", "x", guard).unwrap_err();
        assert!(matches!(err, SectionError::DriftedSection { ref name, .. } if name == "GAMMA"));

        let err = SectionMerger::new().merge_guarded(DOC, "beta", "x", guard).unwrap_err();
        assert_eq!(err, SectionError::SectionNotFound("beta".to_string()));
    }

    #[test]
    fn test_baseline_mismatch_is_drift() {
        let guard = MergeGuard { known_names: None, baseline: Some("//==\n// SECTION 2: BETA\nold\n") };
        let err = SectionMerger::new().merge_guarded(DOC, "beta", "x", guard).unwrap_err();
        assert!(matches!(err, SectionError::DriftedSection { .. }));

        let guard = MergeGuard { known_names: None, baseline: Some("//==\n// SECTION 2: BETA\nbar\n") };
        assert!(SectionMerger::new().merge_guarded(DOC, "beta", "//==\n// SECTION 2: BETA\nx\n", guard).is_ok());
    }

    #[test]
    fn test_replacement_without_header_is_rejected() {
        let err = merge(DOC, "beta", "baz\n").unwrap_err();
        assert_eq!(err, SectionError::HeaderMissing { name: "BETA".to_string() });

        // A header for some other name loses BETA as well
        let err = merge(DOC, "beta", "//==\n// SECTION 2: GAMMA\nbaz\n").unwrap_err();
        assert!(matches!(err, SectionError::HeaderMissing { ref name } if name == "BETA"));
    }

    #[test]
    fn test_preamble_needs_no_header() {
        let doc = format!("//@version=5\n{DOC}");
        let merged = merge(&doc, "preamble", "//@version=6\n").unwrap();
        assert_eq!(merged.document, format!("//@version=6\n{DOC}"));
    }

    #[test]
    fn test_identical_bodies_only_target_changes() {
        // Two sections whose text after the header is identical
        let doc = "//==\n// SECTION 1: ALPHA\nplot(close)\n//==\n// SECTION 2: BETA\nplot(close)\n";
        let merged = merge(doc, "BETA", "//==\n// SECTION 2: BETA\nplot(open)\n").unwrap();
        assert_eq!(
            merged.document,
            "//==\n// SECTION 1: ALPHA\nplot(close)\n//==\n// SECTION 2: BETA\nplot(open)\n"
        );
    }

    #[test]
    fn test_duplicate_header_targets_last_occurrence() {
        let doc = "//==\n// SECTION 1: ALPHA\none\n//==\n// SECTION 2: ALPHA\ntwo\n";
        let merged = merge(doc, "alpha", "//==\n// SECTION 2: ALPHA\nTWO\n").unwrap();
        assert_eq!(merged.document, "//==\n// SECTION 1: ALPHA\none\n//==\n// SECTION 2: ALPHA\nTWO\n");
    }
}
