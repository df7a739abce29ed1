// src/storage/registry.rs
use crate::sections::{safe_name, SectionMap};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where one section's text is kept, relative to the workspace root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub name: String,
    pub path: PathBuf,
}

/// Persisted workspace state. Loaded once per command by the driver and
/// handed to whatever needs it; saved back explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    pub original_script: PathBuf,
    pub working_script: PathBuf,
    #[serde(default)]
    pub last_backup: Option<PathBuf>,
    #[serde(default)]
    pub sections: Vec<RegistryEntry>,
}

impl Registry {
    pub fn new(original_script: impl Into<PathBuf>, working_script: impl Into<PathBuf>) -> Self {
        Self {
            original_script: original_script.into(),
            working_script: working_script.into(),
            last_backup: None,
            sections: Vec::new(),
        }
    }

    /// Default location of a section's file.
    pub fn section_path(name: &str) -> PathBuf {
        Path::new(super::SECTIONS_DIR).join(format!("{}.pine", safe_name(name)))
    }

    pub fn names(&self) -> Vec<String> {
        self.sections.iter().map(|e| e.name.clone()).collect()
    }

    pub fn path_for(&self, name: &str) -> Option<&Path> {
        self.sections
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.path.as_path())
    }

    /// Adds entries for names in `map` the registry does not know yet.
    /// Existing entries keep their paths. Returns the added names.
    pub fn refresh(&mut self, map: &SectionMap) -> Vec<String> {
        let mut added = Vec::new();
        for section in map.iter() {
            if self.path_for(&section.name).is_none() {
                self.sections.push(RegistryEntry {
                    name: section.name.clone(),
                    path: Self::section_path(&section.name),
                });
                added.push(section.name.clone());
            }
        }
        if !added.is_empty() {
            tracing::debug!("Registry picked up {} new sections: {:?}", added.len(), added);
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::split;

    #[test]
    fn test_refresh_adds_only_new_names() {
        let mut registry = Registry::new("original.pine", "working.pine");
        let doc = "//==\n// SECTION 1: ALPHA\nfoo\n";

        let added = registry.refresh(&split(doc));
        assert_eq!(added.len(), 13);
        assert_eq!(registry.names()[0], "ALPHA");
        assert_eq!(registry.path_for("ALPHA"), Some(Path::new("sections/alpha.pine")));
        assert_eq!(
            registry.path_for("MULTI-TIMEFRAME DATA"),
            Some(Path::new("sections/multi-timeframe_data.pine"))
        );

        let added = registry.refresh(&split(&format!("{doc}//==\n// SECTION 2: BETA\nbar\n")));
        assert_eq!(added, vec!["BETA"]);
        assert_eq!(registry.sections.len(), 14);
    }

    #[test]
    fn test_refresh_keeps_custom_paths() {
        let mut registry = Registry::new("original.pine", "working.pine");
        registry.sections.push(RegistryEntry { name: "ALPHA".into(), path: "custom/a.pine".into() });
        registry.refresh(&split("//==\n// SECTION 1: ALPHA\nfoo\n"));
        assert_eq!(registry.path_for("ALPHA"), Some(Path::new("custom/a.pine")));
    }

    #[test]
    fn test_json_shape() {
        let mut registry = Registry::new("original.pine", "working.pine");
        registry.sections.push(RegistryEntry { name: "ALPHA".into(), path: "sections/alpha.pine".into() });
        let json = serde_json::to_value(&registry).unwrap();
        assert_eq!(json["working_script"], "working.pine");
        assert_eq!(json["last_backup"], serde_json::Value::Null);
        assert_eq!(json["sections"][0]["name"], "ALPHA");

        // Older files without the optional fields still load
        let loaded: Registry =
            serde_json::from_str(r#"{"original_script":"o.pine","working_script":"w.pine"}"#).unwrap();
        assert!(loaded.sections.is_empty());
        assert!(loaded.last_backup.is_none());
    }
}
