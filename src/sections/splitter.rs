// src/sections/splitter.rs

// --- Imports ---
use crate::utils::error::SectionError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::ops::Range;

// --- Constants ---
/// Reserved name for text that sits before the first section header.
pub const PREAMBLE_NAME: &str = "PREAMBLE";

/// Section names every script is expected to carry, in script order.
pub const CANONICAL_SECTIONS: [&str; 12] = [
    "INPUT PARAMETERS",
    "VOLATILITY ANALYSIS",
    "WEIGHTED VOLUME CALCULATION",
    "PIVOT POINT CALCULATION",
    "MULTI-TIMEFRAME DATA",
    "PIVOT ARRAYS AND LABELS",
    "PIVOT ZONE AND CONFLUENCE DETECTION",
    "STRATEGY SIGNAL CALCULATION",
    "OPTIONS STRATEGY SELECTION",
    "VISUALIZATION",
    "PLOTTING AND VISUALIZATION",
    "ALERTS AND PERFORMANCE TRACKING",
];

// --- Regex Patterns (Lazy Static) ---
// A divider line, then "// SECTION <n>: <NAME>". Group 1 is the raw name.
static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"//==+\s*\n// SECTION \d+: ([A-Z0-9 ]+)").expect("Failed to compile HEADER_RE")
});

// Any divider line, used to spot headers that never got a valid name line.
static DIVIDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^//==+").expect("Failed to compile DIVIDER_RE")
});

/// Text used for canonical sections the script does not define.
pub fn placeholder_text(name: &str) -> String {
    format!("// SECTION: {name}\n// (This section is currently empty or not explicitly defined)\n")
}

// --- Data Structures ---
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionOrigin {
    /// Found through a header in the document.
    Discovered,
    /// Text before the first header.
    Preamble,
    /// Synthesized for a canonical name the document lacks. Offsets are `0..0`.
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub start: usize, // Byte offset of the divider line
    pub end: usize,   // Exclusive; start of the next header or end of document
    pub text: String,
    pub origin: SectionOrigin,
}

impl Section {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn is_placeholder(&self) -> bool {
        self.origin == SectionOrigin::Placeholder
    }

    /// Number of lines, counting a trailing newline as opening one more (empty) line.
    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }
}

/// Result of splitting one document.
///
/// `spans` holds the real regions in document order and always partitions
/// the document. `entries` is the name mapping handed to callers: discovered
/// names in discovery order, then placeholders in canonical order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMap {
    spans: Vec<Section>,
    entries: Vec<Section>,
    duplicates: Vec<String>,
    malformed_headers: Vec<usize>,
}

impl SectionMap {
    /// Looks up a section by its exact name.
    pub fn get(&self, name: &str) -> Option<&Section> {
        self.entries.iter().find(|s| s.name == name)
    }

    /// Name mapping: discovered sections then placeholders.
    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|s| s.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Every real span in document order, preamble included.
    pub fn spans(&self) -> &[Section] {
        &self.spans
    }

    pub fn preamble(&self) -> Option<&Section> {
        self.spans.first().filter(|s| s.origin == SectionOrigin::Preamble)
    }

    /// Header-backed spans in document order, duplicates included.
    pub fn discovered(&self) -> impl Iterator<Item = &Section> {
        self.spans.iter().filter(|s| s.origin == SectionOrigin::Discovered)
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &Section> {
        self.entries.iter().filter(|s| s.is_placeholder())
    }

    /// Names whose header appears more than once, in order of first repeat.
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    /// Byte offsets of divider lines that did not form a valid header.
    pub fn malformed_headers(&self) -> &[usize] {
        &self.malformed_headers
    }

    /// The live span a replacement should target for `name`.
    ///
    /// For duplicated names this is the last occurrence, matching the entry
    /// the name mapping exposes. Placeholders have no live span.
    pub fn live_span(&self, name: &str) -> Option<&Section> {
        self.spans
            .iter()
            .rev()
            .find(|s| s.name == name && s.origin != SectionOrigin::Placeholder)
    }

    /// Names a caller may target, including the preamble when there is one.
    pub fn resolvable_names(&self) -> Vec<String> {
        let mut names = self.names();
        if self.preamble().is_some() && !names.iter().any(|n| n == PREAMBLE_NAME) {
            names.push(PREAMBLE_NAME.to_string());
        }
        names
    }

    /// Recoverable oddities found while splitting.
    pub fn warnings(&self) -> Vec<SectionError> {
        let duplicates = self
            .duplicates
            .iter()
            .map(|name| SectionError::DuplicateHeader(name.clone()));
        let malformed = self
            .malformed_headers
            .iter()
            .map(|&offset| SectionError::MalformedHeader { offset });
        duplicates.chain(malformed).collect()
    }
}

// --- Main Splitter Structure ---
#[derive(Debug, Clone)]
pub struct SectionSplitter {
    canonical: Vec<String>,
}

impl Default for SectionSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionSplitter {
    pub fn new() -> Self {
        Self::with_canonical(CANONICAL_SECTIONS)
    }

    pub fn with_canonical<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { canonical: names.into_iter().map(Into::into).collect() }
    }

    /// Splits `document` into named sections. Never fails: a document with
    /// no headers yields only placeholders (plus a preamble if non-empty).
    pub fn split(&self, document: &str) -> SectionMap {
        // 1. Locate headers
        let mut headers: Vec<(String, usize)> = Vec::new();
        // Offsets right after each header's NAME line, where a boxed header closes
        let mut box_closers: HashSet<usize> = HashSet::new();
        for caps in HEADER_RE.captures_iter(document) {
            let (Some(whole), Some(raw_name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let name = raw_name.as_str().trim();
            if name.is_empty() {
                tracing::trace!("Skipping header with blank name at byte {}", whole.start());
                continue;
            }
            headers.push((name.to_string(), whole.start()));
            if let Some(newline) = document[whole.end()..].find('\n') {
                box_closers.insert(whole.end() + newline + 1);
            }
        }

        let header_starts: HashSet<usize> = headers.iter().map(|(_, start)| *start).collect();
        let malformed_headers: Vec<usize> = DIVIDER_RE
            .find_iter(document)
            .map(|m| m.start())
            .filter(|start| !header_starts.contains(start) && !box_closers.contains(start))
            .collect();
        for offset in &malformed_headers {
            tracing::debug!("Ignoring divider without a section name at byte {}", offset);
        }

        // 2. Cut spans, every header running to the next one or EOF
        let mut spans = Vec::with_capacity(headers.len() + 1);
        let first_start = headers.first().map_or(document.len(), |(_, start)| *start);
        if first_start > 0 {
            spans.push(Section {
                name: PREAMBLE_NAME.to_string(),
                start: 0,
                end: first_start,
                text: document[..first_start].to_string(),
                origin: SectionOrigin::Preamble,
            });
        }
        for (i, (name, start)) in headers.iter().enumerate() {
            let end = headers.get(i + 1).map_or(document.len(), |(_, next)| *next);
            spans.push(Section {
                name: name.clone(),
                start: *start,
                end,
                text: document[*start..end].to_string(),
                origin: SectionOrigin::Discovered,
            });
        }

        // 3. Build the name mapping. Repeated names keep their first slot but take the last text.
        let mut entries: Vec<Section> = Vec::new();
        let mut duplicates: Vec<String> = Vec::new();
        for span in spans.iter().filter(|s| s.origin == SectionOrigin::Discovered) {
            match entries.iter_mut().find(|e| e.name == span.name) {
                Some(existing) => {
                    tracing::debug!(
                        "Section '{}' is defined more than once (bytes {}..{}); the later definition wins",
                        span.name, span.start, span.end
                    );
                    if !duplicates.contains(&span.name) {
                        duplicates.push(span.name.clone());
                    }
                    *existing = span.clone();
                }
                None => entries.push(span.clone()),
            }
        }

        // 4. Canonical placeholders
        for name in &self.canonical {
            if !entries.iter().any(|e| &e.name == name) {
                entries.push(Section {
                    name: name.clone(),
                    start: 0,
                    end: 0,
                    text: placeholder_text(name),
                    origin: SectionOrigin::Placeholder,
                });
            }
        }

        tracing::debug!(
            "Split document ({} bytes) into {} spans, {} named sections",
            document.len(),
            spans.len(),
            entries.len()
        );

        SectionMap { spans, entries, duplicates, malformed_headers }
    }
}

/// Splits with the default canonical section list.
pub fn split(document: &str) -> SectionMap {
    SectionSplitter::new().split(document)
}
