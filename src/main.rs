use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod descriptor;
mod fileops;
mod locate;
mod manifest;
mod pipeline;

use cli::RootArgs;
use fileops::DiskOps;
use locate::{ToolKind, ToolLocator};
use manifest::{ListKind, ManifestStore};
use pipeline::{Pipeline, PipelineOutcome, StdinConfirm, SystemRunner};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "uct=warn".into()),
    );
    // Diagnostics go to stderr; stdout is for user-facing messages.
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = RootArgs::parse();
    let root = std::env::current_dir().context("determine working directory")?;
    let mut store = ManifestStore::load(&root)?;

    if args.is_pipeline_run() {
        let mut locator = ToolLocator::from_host()?;
        let mut ops = DiskOps;
        let mut confirm = StdinConfirm;
        let mut runner = SystemRunner;
        let outcome = Pipeline::new(
            &root,
            &store.manifest,
            &store.settings,
            &mut locator,
            &mut ops,
            &mut confirm,
            &mut runner,
        )
        .run()?;
        if outcome == PipelineOutcome::AbortedByError {
            std::process::exit(1);
        }
        return Ok(());
    }

    process_flags(&args, &mut store)
}

/// Apply every requested mutation in a fixed order, printing each outcome,
/// and save the manifest once if anything changed. Expected misses are
/// messages, not errors, so later flags still run.
fn process_flags(args: &RootArgs, store: &mut ManifestStore) -> Result<()> {
    let mut mutated = false;

    if args.reset {
        // Reset persists immediately and discards all customization.
        let outcome = store.reset()?;
        println!("{}", outcome.message);
    }

    let list_ops = [
        (ListKind::Files, &args.add_file, &args.remove_file),
        (ListKind::Folders, &args.add_folder, &args.remove_folder),
        (ListKind::Extensions, &args.add_ext, &args.remove_ext),
    ];
    for (kind, add, remove) in list_ops {
        if let Some(value) = add {
            let outcome = store.add(kind, value);
            mutated |= outcome.changed;
            println!("{}", outcome.message);
        }
        if let Some(value) = remove {
            let outcome = store.remove(kind, value);
            mutated |= outcome.changed;
            println!("{}", outcome.message);
        }
    }

    if args.enable_generate {
        let outcome = store.settings.enable_generate();
        mutated |= outcome.changed;
        println!("{}", outcome.message);
    }
    if args.disable_generate {
        let outcome = store.settings.disable_generate();
        mutated |= outcome.changed;
        println!("{}", outcome.message);
    }
    if args.enable_compile {
        let outcome = store.settings.enable_compile();
        mutated |= outcome.changed;
        println!("{}", outcome.message);
    }
    if args.disable_compile {
        let outcome = store.settings.disable_compile();
        mutated |= outcome.changed;
        println!("{}", outcome.message);
    }
    if args.toggle_notice {
        let outcome = store.settings.toggle_success_notice();
        mutated |= outcome.changed;
        println!("{}", outcome.message);
    }

    if args.set_build_tool_dir.is_some() || args.set_ide_dir.is_some() {
        let mut locator = ToolLocator::from_host()?;
        let overrides = [
            (ToolKind::BuildTool, &args.set_build_tool_dir),
            (ToolKind::Ide, &args.set_ide_dir),
        ];
        for (kind, dir) in overrides {
            if let Some(dir) = dir {
                match locator.record_user_override(kind, dir) {
                    Ok(path) => println!("Using {} at {}", kind.label(), path.display()),
                    Err(err) => eprintln!("Error: {err:#}"),
                }
            }
        }
    }

    if args.list {
        print!("{}", store.render_list());
        let locator = ToolLocator::from_host()?;
        let cache = locator.cache();
        if let Some(path) = &cache.build_tool_path {
            println!("Build tool: {}", path.display());
        }
        if let Some(path) = &cache.ide_executable_path {
            println!("IDE executable: {}", path.display());
        }
    }

    if mutated {
        store.save()?;
    }
    Ok(())
}
