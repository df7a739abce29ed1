// src/commands/mod.rs
//! One method per CLI command. Each loads what it needs from the workspace,
//! calls into the section core, writes results back and returns a summary
//! for `main` to print.

use crate::prompt::{self, PromptKind};
use crate::sections::{
    resolve_file_name, resolve_name, MergeGuard, SectionMap, SectionMerger, SectionSplitter, ValidationReport,
    Validator,
};
use crate::storage::{Registry, Workspace, ORIGINAL_FILE, REGISTRY_FILE, SECTIONS_DIR, WORKING_FILE};
use crate::utils::error::{AppError, StorageError};
use crate::vcs::Checkpoint;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct InitSummary {
    pub original: PathBuf,
    pub working: PathBuf,
    pub backup: PathBuf,
    pub sections_written: usize,
}

#[derive(Debug)]
pub struct ApplySummary {
    pub section_name: String,
    pub backup: PathBuf,
    pub delta: isize,
    pub new_sections: Vec<String>,
}

#[derive(Debug)]
pub struct SyncSummary {
    pub sections_written: usize,
    pub new_sections: Vec<String>,
}

#[derive(Debug)]
pub struct PromptSummary {
    pub section_name: String,
    pub prompt: String,
    pub saved_to: PathBuf,
}

pub struct App<'a> {
    workspace: Workspace,
    vcs: &'a dyn Checkpoint,
    splitter: SectionSplitter,
}

impl<'a> App<'a> {
    pub fn new(workspace: Workspace, vcs: &'a dyn Checkpoint) -> Self {
        Self { workspace, vcs, splitter: SectionSplitter::new() }
    }

    #[cfg(test)]
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    fn split_logged(&self, document: &str) -> SectionMap {
        let map = self.splitter.split(document);
        for warning in map.warnings() {
            tracing::warn!("{}", warning);
        }
        map
    }

    fn load(&self) -> Result<(Registry, String), AppError> {
        let registry = self.workspace.load_registry()?;
        let working = self.workspace.read_text(&registry.working_script)?;
        Ok((registry, working))
    }

    /// Copies the script into the workspace and writes out every section.
    pub fn init(&self, script_path: &Path) -> Result<InitSummary, AppError> {
        if !script_path.exists() {
            return Err(StorageError::FileNotFound(script_path.to_path_buf()).into());
        }
        let content = fs::read_to_string(script_path)?;
        tracing::info!("Initializing workspace from {} ({} bytes)", script_path.display(), content.len());

        self.workspace.create_layout()?;
        self.workspace.write_text(ORIGINAL_FILE, &content)?;
        self.workspace.write_text(WORKING_FILE, &content)?;

        let map = self.split_logged(&content);
        let mut registry = Registry::new(ORIGINAL_FILE, WORKING_FILE);
        registry.refresh(&map);
        let sections_written = self.workspace.write_sections(&registry, &map)?;

        let label = script_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "script".to_string());
        let backup = self.workspace.backup(&label, "", &content)?;
        registry.last_backup = Some(backup.clone());
        self.workspace.save_registry(&registry)?;

        if self.workspace.has_git() {
            self.vcs.commit(
                self.workspace.root(),
                &[ORIGINAL_FILE.into(), WORKING_FILE.into(), SECTIONS_DIR.into(), REGISTRY_FILE.into()],
                "Initialize script workspace",
            )?;
        } else {
            self.vcs.init(self.workspace.root(), "Initial commit of script workspace")?;
        }

        Ok(InitSummary {
            original: registry.original_script,
            working: registry.working_script,
            backup,
            sections_written,
        })
    }

    /// Splits the working script as it is now.
    pub fn list(&self) -> Result<SectionMap, AppError> {
        let (_, working) = self.load()?;
        Ok(self.split_logged(&working))
    }

    /// Copies a section's file to `optimized/` for editing; returns the section name and the copy.
    pub fn extract(&self, query: &str) -> Result<(String, PathBuf), AppError> {
        let registry = self.workspace.load_registry()?;
        let name = resolve_name(query, &registry.names()).into_result(query)?;
        let source = registry
            .path_for(&name)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| Registry::section_path(&name));

        let copy = self.workspace.copy_to_optimized(&source)?;
        tracing::info!("Extracted section '{}' to {}", name, copy.display());
        Ok((name, copy))
    }

    /// Merges an edited section file back into the working script.
    ///
    /// Unless `force` is set, the live section must still match the copy kept
    /// in `sections/`; otherwise the working script was edited elsewhere and
    /// the apply is refused as drift.
    pub fn apply(&self, section_file: &Path, force: bool) -> Result<ApplySummary, AppError> {
        let (mut registry, working) = self.load()?;
        if !section_file.exists() {
            return Err(StorageError::FileNotFound(section_file.to_path_buf()).into());
        }
        let new_text = fs::read_to_string(section_file)?;

        let file_name = section_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let names = registry.names();
        let name = resolve_file_name(&file_name, &names).into_result(&file_name)?;
        let stored_path = registry
            .path_for(&name)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| Registry::section_path(&name));

        let baseline = if force {
            None
        } else {
            match self.workspace.read_text(&stored_path) {
                Ok(text) => Some(text),
                Err(StorageError::FileNotFound(path)) => {
                    tracing::warn!("No stored copy at {}, applying without a drift check", path.display());
                    None
                }
                Err(e) => return Err(e.into()),
            }
        };

        let merger = SectionMerger::with_splitter(self.splitter.clone());
        let guard = MergeGuard { known_names: Some(names.as_slice()), baseline: baseline.as_deref() };
        let merged = merger.merge_guarded(&working, &name, &new_text, guard)?;

        // Only touch disk once the merge has succeeded
        let backup = self.workspace.backup("working", ".pine", &working)?;
        self.workspace.write_text(&registry.working_script, &merged.document)?;
        tracing::info!("Applied {} to section '{}' ({:+} bytes)", section_file.display(), name, merged.delta());

        // Store what the section looks like in the merged script, so the next
        // apply compares against the live span
        let map = self.split_logged(&merged.document);
        let stored_text = map.live_span(&name).map_or(new_text.as_str(), |s| s.text.as_str());
        self.workspace.write_text(&stored_path, stored_text)?;

        // The new text may carry headers the registry has not seen yet
        let new_sections = registry.refresh(&map);
        let mut changed = vec![registry.working_script.clone(), stored_path, REGISTRY_FILE.into()];
        for added in &new_sections {
            if let (Some(path), Some(section)) = (registry.path_for(added), map.get(added)) {
                self.workspace.write_text(path, &section.text)?;
                changed.push(path.to_path_buf());
            }
        }

        registry.last_backup = Some(backup.clone());
        self.workspace.save_registry(&registry)?;
        self.vcs.commit(
            self.workspace.root(),
            &changed,
            &format!("Applied optimizations to section: {name}"),
        )?;

        Ok(ApplySummary { section_name: name, backup, delta: merged.delta(), new_sections })
    }

    /// Re-splits the working script and rewrites every section file from it.
    pub fn sync(&self) -> Result<SyncSummary, AppError> {
        let (mut registry, working) = self.load()?;
        let map = self.split_logged(&working);
        let new_sections = registry.refresh(&map);
        let sections_written = self.workspace.write_sections(&registry, &map)?;
        self.workspace.save_registry(&registry)?;

        self.vcs.commit(
            self.workspace.root(),
            &[SECTIONS_DIR.into(), REGISTRY_FILE.into()],
            "Resynced sections from working script",
        )?;
        Ok(SyncSummary { sections_written, new_sections })
    }

    pub fn validate(&self) -> Result<ValidationReport, AppError> {
        let (_, working) = self.load()?;
        Ok(Validator::new(self.splitter.clone()).validate(&working))
    }

    pub fn prompt(&self, query: &str, kind: PromptKind) -> Result<PromptSummary, AppError> {
        let (registry, working) = self.load()?;
        let name = resolve_name(query, &registry.names()).into_result(query)?;
        let section_path = registry
            .path_for(&name)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| Registry::section_path(&name));
        let section_text = self.workspace.read_text(&section_path)?;

        let map = self.splitter.split(&working);
        let text = prompt::render(&kind, &name, &section_text, &working, &map);
        let saved_to = self.workspace.save_prompt(&name, kind.label(), &text)?;

        Ok(PromptSummary { section_name: name, prompt: text, saved_to })
    }
}
