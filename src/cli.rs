//! CLI argument parsing for the cleanup tool.
//!
//! The CLI is intentionally thin: every flag maps onto one manifest mutation,
//! locator override, or display action, and no flags at all means a full
//! pipeline run. Policy lives in the modules the flags call into.
use clap::Parser;
use std::path::PathBuf;

/// Root CLI entrypoint.
///
/// Mutating flags may be combined; each prints its own outcome and the
/// manifest is saved once at the end.
#[derive(Parser, Debug)]
#[command(
    name = "uct",
    version,
    about = "Deletes Unreal Engine build artifacts with one command",
    after_help = "Examples:\n  uct                          Clean the current project (and optionally regenerate/compile)\n  uct --add-folder Saved       Also delete the Saved folder\n  uct --remove-folder Binaries Keep Binaries (a default; restorable with --add-folder)\n  uct --add-ext log            Delete *.log files in the project root\n  uct --enable-generate        Regenerate project files after cleaning\n  uct --enable-compile         Also compile the solution (requires regeneration)\n  uct --list                   Show the configured delete lists and settings"
)]
pub struct RootArgs {
    /// Add a file to the delete list
    #[arg(short = 'a', long, value_name = "FILE")]
    pub add_file: Option<String>,

    /// Remove a file from the delete list
    #[arg(short = 'r', long, value_name = "FILE")]
    pub remove_file: Option<String>,

    /// Add a folder to the delete list
    #[arg(long, value_name = "FOLDER")]
    pub add_folder: Option<String>,

    /// Remove a folder from the delete list (defaults are disabled, not lost)
    #[arg(long, value_name = "FOLDER")]
    pub remove_folder: Option<String>,

    /// Add a file extension to the delete list
    #[arg(long, value_name = "EXT")]
    pub add_ext: Option<String>,

    /// Remove a file extension from the delete list
    #[arg(long, value_name = "EXT")]
    pub remove_ext: Option<String>,

    /// Show the configured delete lists and settings
    #[arg(long)]
    pub list: bool,

    /// Reset delete lists and settings to the defaults
    #[arg(long)]
    pub reset: bool,

    /// Regenerate IDE project files after cleanup
    #[arg(long, conflicts_with = "disable_generate")]
    pub enable_generate: bool,

    /// Stop regenerating project files (also disables compile)
    #[arg(long)]
    pub disable_generate: bool,

    /// Compile the solution after regeneration
    #[arg(long, conflicts_with = "disable_compile")]
    pub enable_compile: bool,

    /// Stop compiling after regeneration
    #[arg(long)]
    pub disable_compile: bool,

    /// Toggle the compile success notice
    #[arg(long)]
    pub toggle_notice: bool,

    /// Directory to search for the engine's build tool
    #[arg(long, value_name = "DIR")]
    pub set_build_tool_dir: Option<PathBuf>,

    /// Directory to search for the IDE executable
    #[arg(long, value_name = "DIR")]
    pub set_ide_dir: Option<PathBuf>,
}

impl RootArgs {
    /// With no flags at all, the invocation is a full pipeline run.
    pub fn is_pipeline_run(&self) -> bool {
        self.add_file.is_none()
            && self.remove_file.is_none()
            && self.add_folder.is_none()
            && self.remove_folder.is_none()
            && self.add_ext.is_none()
            && self.remove_ext.is_none()
            && !self.list
            && !self.reset
            && !self.enable_generate
            && !self.disable_generate
            && !self.enable_compile
            && !self.disable_compile
            && !self.toggle_notice
            && self.set_build_tool_dir.is_none()
            && self.set_ide_dir.is_none()
    }
}
