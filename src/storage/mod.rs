// src/storage/mod.rs
pub mod registry;

use crate::sections::{safe_name, SectionMap};
use crate::utils::error::StorageError;
use std::fs;
use std::path::{Path, PathBuf};

#[allow(unused_imports)]
pub use registry::{Registry, RegistryEntry};

pub const REGISTRY_FILE: &str = ".pine_sections.json";
pub const ORIGINAL_FILE: &str = "original.pine";
pub const WORKING_FILE: &str = "working.pine";
pub const SECTIONS_DIR: &str = "sections";
pub const OPTIMIZED_DIR: &str = "optimized";
pub const BACKUPS_DIR: &str = "backups";
pub const PROMPTS_DIR: &str = "prompts";

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

pub fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// File-system side of the tool. All paths handed in and out are relative
/// to the workspace root, the same way they are stored in the registry.
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Creates a new Workspace rooted at the specified directory
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();

        // Create the root directory if it doesn't exist
        if !root.exists() {
            fs::create_dir_all(&root).map_err(StorageError::IoError)?;
        }

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path<P: AsRef<Path>>(&self, relative: P) -> PathBuf {
        self.root.join(relative)
    }

    pub fn is_initialized(&self) -> bool {
        self.path(REGISTRY_FILE).exists()
    }

    pub fn has_git(&self) -> bool {
        self.path(".git").exists()
    }

    /// Creates the sections/, optimized/ and backups/ directories.
    pub fn create_layout(&self) -> Result<(), StorageError> {
        for dir in [SECTIONS_DIR, OPTIMIZED_DIR, BACKUPS_DIR] {
            fs::create_dir_all(self.path(dir))?;
        }
        Ok(())
    }

    pub fn read_text<P: AsRef<Path>>(&self, relative: P) -> Result<String, StorageError> {
        let path = self.path(relative);
        if !path.exists() {
            return Err(StorageError::FileNotFound(path));
        }
        Ok(fs::read_to_string(&path)?)
    }

    /// Writes `content`, creating parent directories as needed.
    pub fn write_text<P: AsRef<Path>>(&self, relative: P, content: &str) -> Result<PathBuf, StorageError> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        tracing::debug!("Wrote {} bytes to {}", content.len(), path.display());
        Ok(path)
    }

    pub fn load_registry(&self) -> Result<Registry, StorageError> {
        let path = self.path(REGISTRY_FILE);
        if !path.exists() {
            return Err(StorageError::NotInitialized(self.root.clone()));
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save_registry(&self, registry: &Registry) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(registry)?;
        self.write_text(REGISTRY_FILE, &content)?;
        Ok(())
    }

    /// Writes the registry's file for every section in `map` and returns how
    /// many files were written. Names missing from the registry are skipped.
    pub fn write_sections(&self, registry: &Registry, map: &SectionMap) -> Result<usize, StorageError> {
        let mut written = 0;
        for section in map.iter() {
            match registry.path_for(&section.name) {
                Some(path) => {
                    self.write_text(path, &section.text)?;
                    written += 1;
                }
                None => tracing::warn!("No registry entry for section '{}', not saved", section.name),
            }
        }
        Ok(written)
    }

    /// Saves `content` as `backups/<label>_<timestamp><suffix>`.
    pub fn backup(&self, label: &str, suffix: &str, content: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(BACKUPS_DIR).join(format!("{label}_{}{suffix}", timestamp()));
        self.write_text(&relative, content)?;
        tracing::info!("Backed up {} to {}", label, relative.display());
        Ok(relative)
    }

    /// Copies a section file to `optimized/<stem>_<timestamp>.pine` for editing.
    pub fn copy_to_optimized<P: AsRef<Path>>(&self, section_file: P) -> Result<PathBuf, StorageError> {
        let section_file = section_file.as_ref();
        let content = self.read_text(section_file)?;
        let stem = section_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "section".to_string());
        let relative = Path::new(OPTIMIZED_DIR).join(format!("{stem}_{}.pine", timestamp()));
        self.write_text(&relative, &content)?;
        Ok(relative)
    }

    /// Saves prompt text as `prompts/<section>_<kind>_<timestamp>.txt`.
    pub fn save_prompt(&self, section_name: &str, kind: &str, prompt: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(PROMPTS_DIR).join(format!("{}_{kind}_{}.txt", safe_name(section_name), timestamp()));
        self.write_text(&relative, prompt)?;
        Ok(relative)
    }
}
