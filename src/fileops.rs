//! Filesystem capability used by the deletion stage.
//!
//! A missing target is a success of intent, so the disk implementation folds
//! `NotFound` into [`Removal::Missing`]; every other error is handed back to
//! the caller, which classifies by `io::ErrorKind`.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// What happened to one deletion target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    Missing,
}

/// Raw filesystem primitives, kept behind a trait so the pipeline can be
/// driven against scripted fakes.
pub trait FileOps {
    fn remove_file(&mut self, path: &Path) -> io::Result<Removal>;
    fn remove_tree(&mut self, path: &Path) -> io::Result<Removal>;
    /// Files directly under `root` whose name ends with `suffix`, hidden
    /// files included, in lexicographic order.
    fn glob_suffix(&mut self, root: &Path, suffix: &str) -> io::Result<Vec<PathBuf>>;
}

/// The real `std::fs` implementation.
#[derive(Debug, Default)]
pub struct DiskOps;

impl FileOps for DiskOps {
    fn remove_file(&mut self, path: &Path) -> io::Result<Removal> {
        fold_missing(fs::remove_file(path))
    }

    fn remove_tree(&mut self, path: &Path) -> io::Result<Removal> {
        fold_missing(fs::remove_dir_all(path))
    }

    fn glob_suffix(&mut self, root: &Path, suffix: &str) -> io::Result<Vec<PathBuf>> {
        let mut matches = Vec::new();
        for entry in fs::read_dir(root)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = entry.file_name();
            if name.to_string_lossy().ends_with(suffix) {
                matches.push(path);
            }
        }
        matches.sort();
        Ok(matches)
    }
}

fn fold_missing(result: io::Result<()>) -> io::Result<Removal> {
    match result {
        Ok(()) => Ok(Removal::Removed),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Removal::Missing),
        Err(err) => Err(err),
    }
}
