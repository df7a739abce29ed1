// src/sections/mod.rs
// `split` and `merge` with default settings are kept as entry points next to
// the configurable forms the CLI uses.
#![allow(dead_code)]
pub mod merger;
pub mod resolve;
pub mod splitter;
pub mod validator;

// Re-export key section types for convenience
#[allow(unused_imports)]
pub use merger::{merge, MergeGuard, Merged, SectionMerger};
#[allow(unused_imports)]
pub use resolve::{resolve_file_name, resolve_name, safe_name, Resolution};
#[allow(unused_imports)]
pub use splitter::{
    placeholder_text,
    split,
    Section,
    SectionMap,
    SectionOrigin,
    SectionSplitter,
    CANONICAL_SECTIONS,
    PREAMBLE_NAME,
};
pub use validator::{ValidationReport, Validator};
