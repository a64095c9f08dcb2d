//! The cleanup pipeline: preflight, delete, regenerate, compile.
//!
//! Stages are strictly sequential and gated: regeneration runs only when
//! enabled, compilation only when regeneration is enabled too, and a fatal
//! error in any stage skips everything after it. Collaborators (confirmation
//! prompt, filesystem primitives, process launcher) sit behind traits so the
//! state machine can be exercised without a real project or toolchain.
use crate::descriptor::{self, ProjectDescriptor};
use crate::fileops::{FileOps, Removal};
use crate::locate::ToolLocator;
use crate::manifest::{DeletionManifest, ListKind, Settings};
use anyhow::{anyhow, Context, Result};
use std::io::{self, ErrorKind, Write};
use std::path::Path;
use std::process::Command;

/// Build tool subcommand that regenerates IDE project files.
pub const GENERATE_PROJECT_FILES_ARG: &str = "/projectfiles";

/// IDE build subcommand and its fixed configuration/platform pair.
pub const IDE_BUILD_ARG: &str = "/Build";
pub const BUILD_CONFIGURATION: &str = "Development Editor|Win64";

/// Terminal state of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOutcome {
    Completed,
    AbortedByUser,
    AbortedByError,
}

/// Interactive yes/no prompt.
pub trait Confirm {
    fn ask_yes_no(&mut self, prompt: &str) -> bool;
}

/// Stdin-backed prompt; anything but an explicit yes declines.
#[derive(Debug, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn ask_yes_no(&mut self, prompt: &str) -> bool {
        print!("{prompt} [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// Captured result of one external tool invocation.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Launches an external tool and captures its output. No timeout is applied;
/// a hung tool blocks the pipeline.
pub trait ToolRunner {
    fn run(&mut self, program: &Path, args: &[String]) -> Result<ProcessOutput>;
}

/// `std::process::Command`-backed runner.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&mut self, program: &Path, args: &[String]) -> Result<ProcessOutput> {
        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("launch {}", program.display()))?;
        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// One pipeline run over a project directory.
pub struct Pipeline<'a, F, C, R> {
    root: &'a Path,
    manifest: &'a DeletionManifest,
    settings: &'a Settings,
    locator: &'a mut ToolLocator,
    ops: &'a mut F,
    confirm: &'a mut C,
    runner: &'a mut R,
}

impl<'a, F: FileOps, C: Confirm, R: ToolRunner> Pipeline<'a, F, C, R> {
    pub fn new(
        root: &'a Path,
        manifest: &'a DeletionManifest,
        settings: &'a Settings,
        locator: &'a mut ToolLocator,
        ops: &'a mut F,
        confirm: &'a mut C,
        runner: &'a mut R,
    ) -> Self {
        Self {
            root,
            manifest,
            settings,
            locator,
            ops,
            confirm,
            runner,
        }
    }

    /// Run every stage in order, stopping at the first fatal error.
    pub fn run(&mut self) -> Result<PipelineOutcome> {
        // Preflight: exactly one descriptor, or the user's explicit go-ahead.
        let found = match descriptor::find_descriptor(self.root) {
            Ok(found) => found,
            Err(err) => {
                eprintln!("Error: {err:#}");
                return Ok(PipelineOutcome::AbortedByError);
            }
        };
        if found.is_none()
            && !self
                .confirm
                .ask_yes_no("No .uproject file found in this directory. Clean it anyway?")
        {
            println!("Aborted.");
            return Ok(PipelineOutcome::AbortedByUser);
        }

        let deleted = match self.delete_stage() {
            Ok(deleted) => deleted,
            Err(err) => {
                eprintln!("Error: {err:#}");
                return Ok(PipelineOutcome::AbortedByError);
            }
        };
        println!("{}", deletion_notice(deleted));

        if self.settings.generate_project_files {
            if let Err(err) = self.regenerate_stage(found.as_ref()) {
                eprintln!("Error: {err:#}");
                return Ok(PipelineOutcome::AbortedByError);
            }
        }

        // Re-derived here: the persisted settings pair may have been edited
        // by hand, and compile must never run without regeneration.
        if self.settings.compile_enabled() {
            if let Err(err) = self.compile_stage() {
                eprintln!("Error: {err:#}");
                return Ok(PipelineOutcome::AbortedByError);
            }
            if !self.settings.suppress_compile_success_notice {
                println!("Build succeeded.");
            }
        }

        Ok(PipelineOutcome::Completed)
    }

    /// Delete every active manifest entry, counting actual removals.
    fn delete_stage(&mut self) -> Result<usize> {
        let mut deleted = 0usize;
        for value in self.manifest.active_values(ListKind::Files) {
            deleted += self.remove_target(false, &self.root.join(value))?;
        }
        for value in self.manifest.active_values(ListKind::Folders) {
            deleted += self.remove_target(true, &self.root.join(value))?;
        }
        for suffix in self.manifest.active_values(ListKind::Extensions) {
            let matches = self
                .ops
                .glob_suffix(self.root, suffix)
                .with_context(|| format!("scan {} for *{suffix}", self.root.display()))?;
            for path in matches {
                deleted += self.remove_target(false, &path)?;
            }
        }
        Ok(deleted)
    }

    fn remove_target(&mut self, tree: bool, path: &Path) -> Result<usize> {
        let result = if tree {
            self.ops.remove_tree(path)
        } else {
            self.ops.remove_file(path)
        };
        match result {
            Ok(Removal::Removed) => {
                tracing::debug!(path = %path.display(), "deleted");
                Ok(1)
            }
            // Already absent: the intent is satisfied.
            Ok(Removal::Missing) => Ok(0),
            Err(err) if err.kind() == ErrorKind::PermissionDenied => Err(anyhow!(
                "permission denied deleting {}; close the engine/IDE and retry",
                path.display()
            )),
            Err(err) => {
                Err(anyhow!(err).context(format!("delete {}", path.display())))
            }
        }
    }

    /// Regenerate IDE project files via the engine's build tool.
    fn regenerate_stage(&mut self, found: Option<&ProjectDescriptor>) -> Result<()> {
        let descriptor = found.ok_or_else(|| {
            anyhow!("cannot regenerate project files without a .uproject file")
        })?;
        let tool = self.locator.locate_build_tool(&descriptor.engine_version)?;
        if let Some(module) = &descriptor.primary_module {
            println!("Regenerating project files for {module}...");
        } else {
            println!("Regenerating project files...");
        }
        let args = vec![
            GENERATE_PROJECT_FILES_ARG.to_string(),
            descriptor.path.display().to_string(),
        ];
        self.run_tool(&tool, &args, "project file regeneration")
    }

    /// Compile the regenerated solution with the IDE executable.
    fn compile_stage(&mut self) -> Result<()> {
        let ide = self.locator.locate_ide_executable()?;
        let solutions = self
            .ops
            .glob_suffix(self.root, ".sln")
            .with_context(|| format!("scan {} for *.sln", self.root.display()))?;
        let solution = match solutions.as_slice() {
            [one] => one.clone(),
            [] => {
                return Err(anyhow!(
                    "no solution file found in {}; project file regeneration must run first",
                    self.root.display()
                ))
            }
            many => {
                return Err(anyhow!(
                    "found {} solution files in {}; expected exactly one",
                    many.len(),
                    self.root.display()
                ))
            }
        };
        println!("Compiling {}...", solution.display());
        let args = vec![
            solution.display().to_string(),
            IDE_BUILD_ARG.to_string(),
            BUILD_CONFIGURATION.to_string(),
        ];
        self.run_tool(&ide, &args, "compile")
    }

    fn run_tool(&mut self, program: &Path, args: &[String], what: &str) -> Result<()> {
        tracing::info!(program = %program.display(), ?args, "running external tool");
        let output = self.runner.run(program, args)?;
        match output.exit_code {
            Some(0) => Ok(()),
            code => {
                let exit = code.map_or_else(
                    || "terminated by signal".to_string(),
                    |code| format!("exit code {code}"),
                );
                Err(anyhow!(
                    "{what} failed ({exit})\nstdout:\n{}\nstderr:\n{}",
                    output.stdout.trim_end(),
                    output.stderr.trim_end()
                ))
            }
        }
    }
}

/// Singular for exactly one removal, plural otherwise (including zero).
pub fn deletion_notice(count: usize) -> String {
    if count == 1 {
        "Deleted 1 file/folder.".to_string()
    } else {
        format!("Deleted {count} files/folders.")
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
