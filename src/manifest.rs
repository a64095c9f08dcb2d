//! Deletion manifest and behavior settings.
//!
//! The manifest is project-local state: three ordered delete lists plus the
//! pipeline toggles, loaded once per invocation and written back after any
//! mutating command. Built-in defaults are never hard-deleted; removing one
//! flips it to `Disabled` in place so a later add restores it at its original
//! position.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Current schema version for `.uct_config.json`.
pub const MANIFEST_SCHEMA_VERSION: u32 = 1;

/// Project-local manifest file name. The leading dot hides it on Unix;
/// Windows additionally gets the hidden attribute after each write.
pub const MANIFEST_FILE_NAME: &str = ".uct_config.json";

/// Folders every Unreal project accumulates and can safely regenerate.
pub const DEFAULT_FOLDERS: [&str; 4] = [".vs", "Binaries", "DerivedDataCache", "Intermediate"];

/// Extensions deleted by default (the solution file is regenerated on demand).
pub const DEFAULT_EXTENSIONS: [&str; 1] = [".sln"];

/// Whether an entry currently participates in deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    Active,
    Disabled,
}

/// One delete-list entry with its activation state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestEntry {
    pub value: String,
    pub state: EntryState,
}

impl ManifestEntry {
    fn active(value: &str) -> Self {
        Self {
            value: value.to_string(),
            state: EntryState::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == EntryState::Active
    }
}

/// Which of the three delete lists an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Files,
    Folders,
    Extensions,
}

impl ListKind {
    pub fn label(self) -> &'static str {
        match self {
            ListKind::Files => "file",
            ListKind::Folders => "folder",
            ListKind::Extensions => "extension",
        }
    }
}

/// The three ordered delete lists. Insertion order is display order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DeletionManifest {
    pub files: Vec<ManifestEntry>,
    pub folders: Vec<ManifestEntry>,
    pub extensions: Vec<ManifestEntry>,
}

impl DeletionManifest {
    /// The built-in manifest: all defaults active.
    pub fn default_manifest() -> Self {
        Self {
            files: Vec::new(),
            folders: DEFAULT_FOLDERS
                .iter()
                .copied()
                .map(ManifestEntry::active)
                .collect(),
            extensions: DEFAULT_EXTENSIONS
                .iter()
                .copied()
                .map(ManifestEntry::active)
                .collect(),
        }
    }

    pub fn list(&self, kind: ListKind) -> &[ManifestEntry] {
        match kind {
            ListKind::Files => &self.files,
            ListKind::Folders => &self.folders,
            ListKind::Extensions => &self.extensions,
        }
    }

    fn list_mut(&mut self, kind: ListKind) -> &mut Vec<ManifestEntry> {
        match kind {
            ListKind::Files => &mut self.files,
            ListKind::Folders => &mut self.folders,
            ListKind::Extensions => &mut self.extensions,
        }
    }

    /// Active entries of one list, in insertion order.
    pub fn active_values(&self, kind: ListKind) -> Vec<&str> {
        self.list(kind)
            .iter()
            .filter(|entry| entry.is_active())
            .map(|entry| entry.value.as_str())
            .collect()
    }
}

/// Pipeline toggles persisted alongside the delete lists.
///
/// `compile` is private: the persisted file is hand-editable, so every read
/// must go through [`Settings::compile_enabled`], which re-checks the
/// regeneration flag instead of trusting the stored pair.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Settings {
    pub generate_project_files: bool,
    compile: bool,
    pub suppress_compile_success_notice: bool,
}

impl Settings {
    /// Compile only ever runs while regeneration is enabled.
    pub fn compile_enabled(&self) -> bool {
        self.compile && self.generate_project_files
    }

    pub fn enable_generate(&mut self) -> MutationOutcome {
        if self.generate_project_files {
            return MutationOutcome::unchanged("Project file regeneration is already enabled.");
        }
        self.generate_project_files = true;
        MutationOutcome::changed("Enabled project file regeneration.")
    }

    pub fn disable_generate(&mut self) -> MutationOutcome {
        if !self.generate_project_files {
            return MutationOutcome::unchanged("Project file regeneration is already disabled.");
        }
        self.generate_project_files = false;
        if self.compile {
            self.compile = false;
            return MutationOutcome::changed(
                "Disabled project file regeneration (compile disabled with it).",
            );
        }
        MutationOutcome::changed("Disabled project file regeneration.")
    }

    pub fn enable_compile(&mut self) -> MutationOutcome {
        if !self.generate_project_files {
            return MutationOutcome::unchanged(
                "Compile requires project file regeneration; run with --enable-generate first.",
            );
        }
        if self.compile {
            return MutationOutcome::unchanged("Compile is already enabled.");
        }
        self.compile = true;
        MutationOutcome::changed("Enabled compile after regeneration.")
    }

    pub fn disable_compile(&mut self) -> MutationOutcome {
        if !self.compile {
            return MutationOutcome::unchanged("Compile is already disabled.");
        }
        self.compile = false;
        MutationOutcome::changed("Disabled compile after regeneration.")
    }

    pub fn toggle_success_notice(&mut self) -> MutationOutcome {
        self.suppress_compile_success_notice = !self.suppress_compile_success_notice;
        if self.suppress_compile_success_notice {
            MutationOutcome::changed("Compile success notice suppressed.")
        } else {
            MutationOutcome::changed("Compile success notice restored.")
        }
    }
}

/// Result of one mutator call: did state change, and what to tell the user.
///
/// Expected misses ("not in the list") are outcomes, not errors, so the CLI
/// layer can keep processing the remaining flags.
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    pub changed: bool,
    pub message: String,
}

impl MutationOutcome {
    fn changed(message: impl Into<String>) -> Self {
        Self {
            changed: true,
            message: message.into(),
        }
    }

    fn unchanged(message: impl Into<String>) -> Self {
        Self {
            changed: false,
            message: message.into(),
        }
    }
}

/// On-disk shape of `.uct_config.json`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    schema_version: u32,
    #[serde(default)]
    manifest: DeletionManifest,
    #[serde(default)]
    settings: Settings,
}

/// Owns the manifest and settings for one invocation.
#[derive(Debug)]
pub struct ManifestStore {
    path: PathBuf,
    pub manifest: DeletionManifest,
    pub settings: Settings,
}

impl ManifestStore {
    /// Load persisted state from `root`, or start from the built-in defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(MANIFEST_FILE_NAME);
        if !path.is_file() {
            return Ok(Self {
                path,
                manifest: DeletionManifest::default_manifest(),
                settings: Settings::default(),
            });
        }
        let bytes = fs::read(&path).with_context(|| format!("read manifest {}", path.display()))?;
        let file: ManifestFile =
            serde_json::from_slice(&bytes).context("parse manifest JSON")?;
        if file.schema_version != MANIFEST_SCHEMA_VERSION {
            return Err(anyhow!(
                "unsupported manifest schema_version {}",
                file.schema_version
            ));
        }
        Ok(Self {
            path,
            manifest: file.manifest,
            settings: file.settings,
        })
    }

    /// Persist manifest and settings, then hide the file best-effort.
    pub fn save(&self) -> Result<()> {
        let file = ManifestFile {
            schema_version: MANIFEST_SCHEMA_VERSION,
            manifest: self.manifest.clone(),
            settings: self.settings,
        };
        let text = serde_json::to_string_pretty(&file).context("serialize manifest")?;
        fs::write(&self.path, text.as_bytes())
            .with_context(|| format!("write {}", self.path.display()))?;
        mark_hidden(&self.path);
        Ok(())
    }

    /// Add a value to a list, re-activating a disabled default in place.
    pub fn add(&mut self, kind: ListKind, raw: &str) -> MutationOutcome {
        let value = normalize_value(kind, raw);
        let list = self.manifest.list_mut(kind);
        if let Some(index) = list.iter().position(|entry| entry.value == value) {
            if list[index].is_active() {
                return MutationOutcome::unchanged(format!("{value} is already in the list."));
            }
            list[index].state = EntryState::Active;
        } else {
            list.push(ManifestEntry::active(&value));
        }
        MutationOutcome::changed(format!("Added {value}"))
    }

    /// Remove a value: defaults are disabled in place, user entries deleted.
    pub fn remove(&mut self, kind: ListKind, raw: &str) -> MutationOutcome {
        let value = normalize_value(kind, raw);
        let list = self.manifest.list_mut(kind);
        let Some(index) = list
            .iter()
            .position(|entry| entry.is_active() && entry.value == value)
        else {
            return MutationOutcome::unchanged(format!(
                "'{value}' is not in the {} list.",
                kind.label()
            ));
        };
        if is_default(kind, &value) {
            list[index].state = EntryState::Disabled;
        } else {
            list.remove(index);
        }
        MutationOutcome::changed(format!("Removed {value}"))
    }

    /// Replace everything with the built-in defaults and persist immediately.
    pub fn reset(&mut self) -> Result<MutationOutcome> {
        self.manifest = DeletionManifest::default_manifest();
        self.settings = Settings::default();
        self.save()?;
        Ok(MutationOutcome::changed("Reset delete lists to defaults."))
    }

    /// Render the active entries and settings for `--list`.
    ///
    /// Empty categories still print their header so the shape is stable.
    pub fn render_list(&self) -> String {
        const INDENT: &str = "    ";
        let mut out = String::new();
        for (header, kind) in [
            ("Files", ListKind::Files),
            ("Folders", ListKind::Folders),
            ("Extensions", ListKind::Extensions),
        ] {
            out.push_str(header);
            out.push_str(":\n");
            for value in self.manifest.active_values(kind) {
                out.push_str(INDENT);
                out.push_str(value);
                out.push('\n');
            }
        }
        out.push_str("Settings:\n");
        out.push_str(INDENT);
        out.push_str(if self.settings.generate_project_files {
            "regenerate project files: on\n"
        } else {
            "regenerate project files: off\n"
        });
        out.push_str(INDENT);
        out.push_str(if self.settings.compile_enabled() {
            "compile after regenerate: on\n"
        } else {
            "compile after regenerate: off\n"
        });
        out.push_str(INDENT);
        out.push_str(if self.settings.suppress_compile_success_notice {
            "compile success notice: suppressed\n"
        } else {
            "compile success notice: shown\n"
        });
        out
    }
}

/// Extensions always carry exactly one leading dot; other lists pass through.
pub fn normalize_value(kind: ListKind, raw: &str) -> String {
    match kind {
        ListKind::Extensions => format!(".{}", raw.trim_start_matches('.')),
        _ => raw.to_string(),
    }
}

fn is_default(kind: ListKind, value: &str) -> bool {
    match kind {
        ListKind::Files => false,
        ListKind::Folders => DEFAULT_FOLDERS.contains(&value),
        ListKind::Extensions => DEFAULT_EXTENSIONS.contains(&value),
    }
}

#[cfg(windows)]
fn mark_hidden(path: &Path) {
    // A failure to set the attribute is not worth surfacing.
    let _ = std::process::Command::new("attrib")
        .arg("+H")
        .arg(path)
        .status();
}

#[cfg(not(windows))]
fn mark_hidden(_path: &Path) {
    // The dot-prefixed file name already hides it.
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
