//! Tool discovery and caching.
//!
//! Two external executables drive the optional pipeline stages: the engine's
//! version selector (project file regeneration) and the Visual Studio driver
//! (compilation). Discovered paths are cached machine-wide under the user's
//! data directory so later runs, from any project, skip the search.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

/// Current schema version for `tool_cache.json`.
pub const TOOL_CACHE_SCHEMA_VERSION: u32 = 1;

#[cfg(windows)]
pub const BUILD_TOOL_EXECUTABLE: &str = "UnrealVersionSelector.exe";
#[cfg(not(windows))]
pub const BUILD_TOOL_EXECUTABLE: &str = "UnrealVersionSelector";

#[cfg(windows)]
pub const IDE_EXECUTABLE: &str = "devenv.exe";
#[cfg(not(windows))]
pub const IDE_EXECUTABLE: &str = "devenv";

/// Which tool an override or lookup concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    BuildTool,
    Ide,
}

impl ToolKind {
    pub fn executable_name(self) -> &'static str {
        match self {
            ToolKind::BuildTool => BUILD_TOOL_EXECUTABLE,
            ToolKind::Ide => IDE_EXECUTABLE,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ToolKind::BuildTool => "build tool",
            ToolKind::Ide => "IDE executable",
        }
    }
}

/// On-disk shape of the user-profile tool cache.
///
/// Entries are populated opportunistically on successful discovery and never
/// expire; a stale path simply fails its existence check and triggers a fresh
/// search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolCache {
    pub schema_version: u32,
    pub build_tool_path: Option<PathBuf>,
    pub ide_executable_path: Option<PathBuf>,
}

/// Epic launcher installed-engines metadata (`LauncherInstalled.dat`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LauncherManifest {
    #[serde(default)]
    installation_list: Vec<InstalledApp>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstalledApp {
    #[serde(default)]
    app_name: String,
    install_location: PathBuf,
}

/// Resolves and caches the two external tool paths.
#[derive(Debug)]
pub struct ToolLocator {
    cache_path: PathBuf,
    cache: ToolCache,
    launcher_manifest_path: PathBuf,
    engine_roots: Vec<PathBuf>,
    ide_fixed_path: PathBuf,
    ide_install_root: PathBuf,
}

impl ToolLocator {
    /// Locator wired to the host's well-known install locations.
    pub fn from_host() -> Result<Self> {
        let data_dir = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| anyhow!("cannot determine a user data directory"))?;
        let cache_path = data_dir.join("uct").join("tool_cache.json");
        Self::with_paths(
            cache_path,
            launcher_manifest_path(),
            engine_roots(),
            ide_fixed_path(),
            ide_install_root(),
        )
    }

    /// Locator with every host location injected; used by `from_host` and by
    /// tests that stand up fake install trees.
    pub fn with_paths(
        cache_path: PathBuf,
        launcher_manifest_path: PathBuf,
        engine_roots: Vec<PathBuf>,
        ide_fixed_path: PathBuf,
        ide_install_root: PathBuf,
    ) -> Result<Self> {
        let cache = load_cache(&cache_path)?;
        Ok(Self {
            cache_path,
            cache,
            launcher_manifest_path,
            engine_roots,
            ide_fixed_path,
            ide_install_root,
        })
    }

    pub fn cache(&self) -> &ToolCache {
        &self.cache
    }

    /// Resolve the engine's build tool for the descriptor's engine version.
    ///
    /// Attempts, in order: the cached path (if it still exists), then the
    /// installed-engine metadata keyed by the version tag followed by a
    /// recursive search of the install root. Success persists the path; any
    /// failure leaves the cache untouched.
    pub fn locate_build_tool(&mut self, engine_version: &str) -> Result<PathBuf> {
        if let Some(path) = &self.cache.build_tool_path {
            if path.is_file() {
                tracing::debug!(path = %path.display(), "build tool cache hit");
                return Ok(path.clone());
            }
            tracing::debug!(path = %path.display(), "cached build tool is gone; rediscovering");
        }
        let root = self.engine_install_root(engine_version).ok_or_else(|| {
            anyhow!(
                "no installed engine found for version {engine_version}; \
                 run `uct --set-build-tool-dir <DIR>` with the engine install directory"
            )
        })?;
        tracing::debug!(root = %root.display(), "searching engine install root");
        let found = find_executable(&root, BUILD_TOOL_EXECUTABLE).ok_or_else(|| {
            anyhow!(
                "{BUILD_TOOL_EXECUTABLE} not found under {}; \
                 run `uct --set-build-tool-dir <DIR>` with the engine install directory",
                root.display()
            )
        })?;
        self.cache.build_tool_path = Some(found.clone());
        self.save_cache()?;
        Ok(found)
    }

    /// Resolve the IDE executable.
    ///
    /// Attempts, in order: the cached path, the well-known fixed install
    /// path, the highest-numbered version directory under the install root,
    /// and finally a PATH lookup.
    pub fn locate_ide_executable(&mut self) -> Result<PathBuf> {
        if let Some(path) = &self.cache.ide_executable_path {
            if path.is_file() {
                tracing::debug!(path = %path.display(), "IDE executable cache hit");
                return Ok(path.clone());
            }
            tracing::debug!(path = %path.display(), "cached IDE executable is gone; rediscovering");
        }
        if self.ide_fixed_path.is_file() {
            let found = self.ide_fixed_path.clone();
            self.cache.ide_executable_path = Some(found.clone());
            self.save_cache()?;
            return Ok(found);
        }
        if let Some(versioned) = highest_numbered_subdir(&self.ide_install_root) {
            tracing::debug!(root = %versioned.display(), "searching IDE version directory");
            if let Some(found) = find_executable(&versioned, IDE_EXECUTABLE) {
                self.cache.ide_executable_path = Some(found.clone());
                self.save_cache()?;
                return Ok(found);
            }
        }
        if let Ok(found) = which::which(IDE_EXECUTABLE) {
            tracing::debug!(path = %found.display(), "IDE executable found on PATH");
            self.cache.ide_executable_path = Some(found.clone());
            self.save_cache()?;
            return Ok(found);
        }
        Err(anyhow!(
            "{IDE_EXECUTABLE} not found; run `uct --set-ide-dir <DIR>` \
             with the Visual Studio install directory"
        ))
    }

    /// Record a user-supplied directory for one tool.
    ///
    /// The directory is searched for the tool's executable name; only a hit
    /// is persisted, so a bad directory never clobbers a good cache entry.
    pub fn record_user_override(&mut self, kind: ToolKind, dir: &Path) -> Result<PathBuf> {
        let found = find_executable(dir, kind.executable_name()).ok_or_else(|| {
            anyhow!(
                "{} not found under {}",
                kind.executable_name(),
                dir.display()
            )
        })?;
        match kind {
            ToolKind::BuildTool => self.cache.build_tool_path = Some(found.clone()),
            ToolKind::Ide => self.cache.ide_executable_path = Some(found.clone()),
        }
        self.save_cache()?;
        Ok(found)
    }

    /// Install root for an engine version, from the launcher metadata when
    /// present, else from scanning the well-known engine parent directories
    /// for `UE_<version>`.
    fn engine_install_root(&self, version: &str) -> Option<PathBuf> {
        let app_name = format!("UE_{version}");
        if let Ok(bytes) = fs::read(&self.launcher_manifest_path) {
            match serde_json::from_slice::<LauncherManifest>(&bytes) {
                Ok(manifest) => {
                    if let Some(app) = manifest
                        .installation_list
                        .iter()
                        .find(|app| app.app_name == app_name)
                    {
                        if app.install_location.is_dir() {
                            return Some(app.install_location.clone());
                        }
                        tracing::debug!(
                            location = %app.install_location.display(),
                            "launcher metadata names a missing install location"
                        );
                    }
                }
                Err(err) => {
                    tracing::debug!(error = %err, "unparseable launcher metadata; falling back")
                }
            }
        }
        self.engine_roots
            .iter()
            .map(|root| root.join(&app_name))
            .find(|candidate| candidate.is_dir())
    }

    fn save_cache(&mut self) -> Result<()> {
        self.cache.schema_version = TOOL_CACHE_SCHEMA_VERSION;
        if let Some(parent) = self.cache_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(&self.cache).context("serialize tool cache")?;
        fs::write(&self.cache_path, text.as_bytes())
            .with_context(|| format!("write {}", self.cache_path.display()))?;
        Ok(())
    }
}

fn load_cache(path: &Path) -> Result<ToolCache> {
    if !path.is_file() {
        return Ok(ToolCache::default());
    }
    let bytes = fs::read(path).with_context(|| format!("read tool cache {}", path.display()))?;
    let cache: ToolCache = serde_json::from_slice(&bytes).context("parse tool cache JSON")?;
    Ok(cache)
}

/// Breadth-first search for an exact executable filename under `root`.
///
/// Entries of each directory are visited in lexicographic filename order so
/// the first match is reproducible; unreadable directories are skipped and
/// symlinked directories are not descended into.
pub fn find_executable(root: &Path, name: &str) -> Option<PathBuf> {
    let target = OsStr::new(name);
    let mut queue = VecDeque::from([root.to_path_buf()]);
    while let Some(dir) = queue.pop_front() {
        let Ok(read) = fs::read_dir(&dir) else {
            continue;
        };
        let mut entries: Vec<_> = read.filter_map(|entry| entry.ok()).collect();
        entries.sort_by_key(|entry| entry.file_name());
        for entry in entries {
            let path = entry.path();
            let Ok(meta) = fs::symlink_metadata(&path) else {
                continue;
            };
            if meta.is_file() && entry.file_name() == target {
                return Some(path);
            }
            if meta.is_dir() {
                queue.push_back(path);
            }
        }
    }
    None
}

/// Highest integer-named immediate subdirectory of `root`.
///
/// Non-numeric names are ignored; `17` loses to `2022` because the comparison
/// is numeric, not lexicographic.
pub fn highest_numbered_subdir(root: &Path) -> Option<PathBuf> {
    let mut best: Option<(u64, PathBuf)> = None;
    for entry in fs::read_dir(root).ok()?.filter_map(|entry| entry.ok()) {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(number) = entry
            .file_name()
            .to_str()
            .and_then(|name| name.parse::<u64>().ok())
        else {
            continue;
        };
        match &best {
            Some((top, _)) if *top >= number => {}
            _ => best = Some((number, path)),
        }
    }
    best.map(|(_, path)| path)
}

#[cfg(windows)]
fn launcher_manifest_path() -> PathBuf {
    PathBuf::from(r"C:\ProgramData\Epic\UnrealEngineLauncher\LauncherInstalled.dat")
}

#[cfg(not(windows))]
fn launcher_manifest_path() -> PathBuf {
    PathBuf::from("/Users/Shared/Epic Games/UnrealEngineLauncher/LauncherInstalled.dat")
}

#[cfg(windows)]
fn engine_roots() -> Vec<PathBuf> {
    vec![PathBuf::from(r"C:\Program Files\Epic Games")]
}

#[cfg(not(windows))]
fn engine_roots() -> Vec<PathBuf> {
    vec![PathBuf::from("/Users/Shared/Epic Games")]
}

#[cfg(windows)]
fn ide_fixed_path() -> PathBuf {
    PathBuf::from(r"C:\Program Files\Microsoft Visual Studio\2022\Community\Common7\IDE\devenv.exe")
}

#[cfg(not(windows))]
fn ide_fixed_path() -> PathBuf {
    PathBuf::from("/usr/local/bin/devenv")
}

#[cfg(windows)]
fn ide_install_root() -> PathBuf {
    PathBuf::from(r"C:\Program Files\Microsoft Visual Studio")
}

#[cfg(not(windows))]
fn ide_install_root() -> PathBuf {
    PathBuf::from("/opt/visualstudio")
}

#[cfg(test)]
#[path = "locate_tests.rs"]
mod tests;
