// src/sections/resolve.rs
use crate::utils::error::SectionError;

/// Outcome of matching a user-supplied query against known section names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Unique(String),
    Ambiguous(Vec<String>),
    NotFound,
}

impl Resolution {
    pub fn into_result(self, query: &str) -> Result<String, SectionError> {
        match self {
            Resolution::Unique(name) => Ok(name),
            Resolution::Ambiguous(candidates) => Err(SectionError::AmbiguousMatch {
                query: query.to_string(),
                candidates,
            }),
            Resolution::NotFound => Err(SectionError::SectionNotFound(query.to_string())),
        }
    }
}

/// File-system friendly form of a section name: `"INPUT PARAMETERS"` -> `"input_parameters"`.
pub fn safe_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Case-insensitive substring match of `query` against `names`.
///
/// An exact (case-insensitive) match wins even if the query is also a
/// substring of longer names, so "visualization" picks `VISUALIZATION` over
/// `PLOTTING AND VISUALIZATION`.
pub fn resolve_name<S: AsRef<str>>(query: &str, names: &[S]) -> Resolution {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Resolution::NotFound;
    }

    if let Some(exact) = names.iter().find(|n| n.as_ref().to_lowercase() == needle) {
        return Resolution::Unique(exact.as_ref().to_string());
    }

    let mut matches: Vec<String> = Vec::new();
    for name in names.iter().map(AsRef::as_ref) {
        if name.to_lowercase().contains(&needle) && !matches.iter().any(|m| m == name) {
            matches.push(name.to_string());
        }
    }

    match matches.len() {
        0 => Resolution::NotFound,
        1 => Resolution::Unique(matches.remove(0)),
        _ => Resolution::Ambiguous(matches),
    }
}

/// Matches an edited section file (e.g. `optimized/pivot_point_calculation_20240101_120000.pine`)
/// back to a section by looking for each name's safe form inside the file name.
///
/// The longest contained safe name wins, so `plotting_and_visualization_*.pine`
/// resolves to `PLOTTING AND VISUALIZATION`, not `VISUALIZATION`.
pub fn resolve_file_name<S: AsRef<str>>(file_name: &str, names: &[S]) -> Resolution {
    let haystack = file_name.to_lowercase();

    let mut best: Vec<String> = Vec::new();
    let mut best_len = 0;
    for name in names.iter().map(AsRef::as_ref) {
        let safe = safe_name(name);
        if safe.is_empty() || !haystack.contains(&safe) {
            continue;
        }
        if safe.len() > best_len {
            best_len = safe.len();
            best.clear();
        }
        if safe.len() == best_len && !best.iter().any(|b| b == name) {
            best.push(name.to_string());
        }
    }

    match best.len() {
        0 => Resolution::NotFound,
        1 => Resolution::Unique(best.remove(0)),
        _ => Resolution::Ambiguous(best),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::splitter::CANONICAL_SECTIONS;

    #[test]
    fn test_case_insensitive_substring() {
        assert_eq!(
            resolve_name("volatility", &CANONICAL_SECTIONS),
            Resolution::Unique("VOLATILITY ANALYSIS".to_string())
        );
        assert_eq!(
            resolve_name("  Options Strategy ", &CANONICAL_SECTIONS),
            Resolution::Unique("OPTIONS STRATEGY SELECTION".to_string())
        );
    }

    #[test]
    fn test_exact_match_beats_substring() {
        assert_eq!(
            resolve_name("visualization", &CANONICAL_SECTIONS),
            Resolution::Unique("VISUALIZATION".to_string())
        );
    }

    #[test]
    fn test_ambiguous_lists_every_candidate_in_order() {
        match resolve_name("pivot", &CANONICAL_SECTIONS) {
            Resolution::Ambiguous(candidates) => assert_eq!(
                candidates,
                vec![
                    "PIVOT POINT CALCULATION",
                    "PIVOT ARRAYS AND LABELS",
                    "PIVOT ZONE AND CONFLUENCE DETECTION",
                ]
            ),
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn test_not_found_and_blank_query() {
        assert_eq!(resolve_name("nonexistent", &CANONICAL_SECTIONS), Resolution::NotFound);
        assert_eq!(resolve_name("   ", &CANONICAL_SECTIONS), Resolution::NotFound);
        let empty: [&str; 0] = [];
        assert_eq!(resolve_name("alpha", &empty), Resolution::NotFound);
    }

    #[test]
    fn test_into_result_maps_to_section_errors() {
        let err = resolve_name("calculation", &CANONICAL_SECTIONS)
            .into_result("calculation")
            .unwrap_err();
        assert!(matches!(err, SectionError::AmbiguousMatch { ref candidates, .. } if candidates.len() == 3));

        let err = Resolution::NotFound.into_result("zzz").unwrap_err();
        assert_eq!(err, SectionError::SectionNotFound("zzz".to_string()));
    }

    #[test]
    fn test_safe_name() {
        assert_eq!(safe_name("MULTI-TIMEFRAME DATA"), "multi-timeframe_data");
    }

    #[test]
    fn test_file_name_prefers_longest_safe_name() {
        assert_eq!(
            resolve_file_name("plotting_and_visualization_20240101_120000.pine", &CANONICAL_SECTIONS),
            Resolution::Unique("PLOTTING AND VISUALIZATION".to_string())
        );
        assert_eq!(
            resolve_file_name("Visualization_v2.pine", &CANONICAL_SECTIONS),
            Resolution::Unique("VISUALIZATION".to_string())
        );
        assert_eq!(resolve_file_name("notes.txt", &CANONICAL_SECTIONS), Resolution::NotFound);
    }

    #[test]
    fn test_file_name_tie_is_ambiguous() {
        let names = ["ALPHA", "GAMMA"];
        assert_eq!(
            resolve_file_name("alpha_gamma.pine", &names),
            Resolution::Ambiguous(vec!["ALPHA".to_string(), "GAMMA".to_string()])
        );
    }
}
