//! Project descriptor discovery.
//!
//! The `.uproject` file identifies the engine version (used as the install
//! lookup key) and the module list (used only for messages). It is derived
//! fresh every invocation and never cached.
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DESCRIPTOR_EXTENSION: &str = "uproject";

/// Parsed view of the project's `.uproject` file.
#[derive(Debug, Clone)]
pub struct ProjectDescriptor {
    pub path: PathBuf,
    pub engine_version: String,
    pub primary_module: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescriptorFile {
    #[serde(default)]
    engine_association: String,
    #[serde(default)]
    modules: Vec<ModuleDescriptor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ModuleDescriptor {
    name: String,
}

/// Find and parse the project descriptor in `root`.
///
/// Returns `Ok(None)` when the directory holds no descriptor; more than one
/// is an error rather than a silent first-match.
pub fn find_descriptor(root: &Path) -> Result<Option<ProjectDescriptor>> {
    let mut candidates = Vec::new();
    let entries = fs::read_dir(root).with_context(|| format!("read {}", root.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("read {}", root.display()))?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == DESCRIPTOR_EXTENSION) {
            candidates.push(path);
        }
    }
    candidates.sort();
    match candidates.len() {
        0 => Ok(None),
        1 => parse_descriptor(&candidates[0]).map(Some),
        n => Err(anyhow!(
            "found {n} .{DESCRIPTOR_EXTENSION} files in {}; expected exactly one",
            root.display()
        )),
    }
}

fn parse_descriptor(path: &Path) -> Result<ProjectDescriptor> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let file: DescriptorFile = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse {}", path.display()))?;
    Ok(ProjectDescriptor {
        path: path.to_path_buf(),
        engine_version: file.engine_association,
        primary_module: file.modules.into_iter().next().map(|module| module.name),
    })
}
