// src/prompt.rs
//! Prompt text for asking an assistant about one section of the script.
//! The text is opaque output: it is printed and saved, nothing is sent anywhere.

use crate::sections::SectionMap;
use once_cell::sync::Lazy;
use regex::Regex;

const MAX_GLOBALS: usize = 20;

static GLOBAL_VAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^var\s+\w+.*$").expect("Failed to compile GLOBAL_VAR_RE")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    /// General review of a section.
    Assistance,
    /// Drop-in optimization of a section, with the user's goal.
    Optimization { description: String },
}

impl PromptKind {
    pub fn label(&self) -> &'static str {
        match self {
            PromptKind::Assistance => "assistance",
            PromptKind::Optimization { .. } => "optimization",
        }
    }
}

/// Top-level `var` declarations, first 20 only.
pub fn global_vars(script: &str) -> Vec<&str> {
    GLOBAL_VAR_RE
        .find_iter(script)
        .take(MAX_GLOBALS)
        .map(|m| m.as_str())
        .collect()
}

pub fn render(kind: &PromptKind, section_name: &str, section_text: &str, script: &str, map: &SectionMap) -> String {
    match kind {
        PromptKind::Assistance => render_assistance(section_name, section_text, map),
        PromptKind::Optimization { description } => {
            render_optimization(section_name, description, section_text, script, map)
        }
    }
}

fn render_assistance(section_name: &str, section_text: &str, map: &SectionMap) -> String {
    format!(
        "# Pine Script Code Review\n\
\n\
I would like a review of one section of a larger Pine Script trading strategy.\n\
\n\
## Section: {section_name}\n\
\n\
```pine\n{section_text}\n```\n\
\n\
## Context\n\
The full script has {count} sections. This one implements the {section_name} logic.\n\
\n\
## Requests\n\
1. Point out bugs, runtime errors or questionable logic in this section\n\
2. Suggest improvements that keep the behaviour the same\n\
3. Explain the reasoning behind each suggestion\n\
\n\
## Constraints\n\
- Prefer targeted changes over rewriting the whole section\n\
- Keep variable names used by other sections unchanged\n",
        count = map.len(),
    )
}

fn render_optimization(
    section_name: &str,
    description: &str,
    section_text: &str,
    script: &str,
    map: &SectionMap,
) -> String {
    let line_counts = map
        .iter()
        .map(|s| format!("{} ({} lines)", s.name, s.line_count()))
        .collect::<Vec<_>>()
        .join(", ");
    let globals = global_vars(script).join("\n");

    format!(
        "# Pine Script Optimization\n\
\n\
Please optimize one section of my Pine Script trading strategy.\n\
\n\
## Section: {section_name}\n\
{description}\n\
\n\
## Current implementation\n\
```pine\n{section_text}\n```\n\
\n\
## Script context\n\
The script has {count} sections: {line_counts}\n\
\n\
Global variables the section may reference (first {MAX_GLOBALS}):\n\
```pine\n{globals}\n```\n\
\n\
## Requirements\n\
1. Keep every feature of the current section\n\
2. Improve performance, robustness and readability\n\
3. Keep all function signatures, inputs and outputs exactly as they are\n\
4. The result must be a drop-in replacement for the whole section, header lines included\n\
5. Return the complete section, not fragments\n\
6. Comment the significant changes\n\
\n\
## Answer format\n\
- The full optimized section in one code block\n\
- A short list of what changed and why\n\
- Any part that could not be improved, with the reason\n",
        count = map.len(),
    )
}
