mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, toggle};
use clipinstall::clipboard::{ClipboardBackend, select_backend};
use clipinstall::config::Config;
use clipinstall::pip::Pip;
use clipinstall::process::SystemRunner;
use clipinstall::transfer::{self, RestoreSummary, to_megabytes};
use std::path::Path;
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load().context("Failed to load configuration")?;
    let runner = SystemRunner;
    let clipboard = select_backend(config.clipboard, &runner);
    let pip = Pip::new(config.python.clone(), &runner);

    match cli.command {
        Commands::Copy {
            package,
            deps,
            no_deps,
        } => {
            let include_deps = toggle(deps, no_deps).unwrap_or(false);
            handle_copy(&pip, clipboard.as_ref(), &package, include_deps)?;
        }
        Commands::Install {
            dir,
            clean,
            no_clean,
            force,
            no_force,
        } => {
            let dir = dir.unwrap_or_else(|| config.dir.clone());
            let clean = toggle(clean, no_clean).unwrap_or(false);
            let force = toggle(force, no_force).unwrap_or(config.force_reinstall);
            handle_install(&pip, clipboard.as_ref(), &dir, force, clean)?;
        }
        Commands::Paste { dir } => {
            let dir = dir.unwrap_or_else(|| config.dir.clone());
            handle_paste(clipboard.as_ref(), &dir)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn handle_copy(
    pip: &Pip<'_>,
    clipboard: &dyn ClipboardBackend,
    package: &str,
    include_deps: bool,
) -> Result<()> {
    let summary = transfer::copy_wheels_to_clipboard(pip, clipboard, package, include_deps)
        .with_context(|| format!("Failed to copy '{package}' to the clipboard"))?;

    println!(
        "✓ Copied {} wheel(s) for {} to the clipboard",
        summary.wheel_count, package
    );
    println!(
        "  Original size: {:.2} MB, clipboard size: {:.2} MB",
        to_megabytes(summary.original_bytes),
        to_megabytes(summary.clipboard_bytes as u64)
    );

    Ok(())
}

fn handle_install(
    pip: &Pip<'_>,
    clipboard: &dyn ClipboardBackend,
    dir: &Path,
    force: bool,
    clean: bool,
) -> Result<()> {
    let summary = transfer::restore_wheels_and_install(pip, clipboard, dir, force, clean)
        .context("Failed to install wheels from the clipboard")?;

    print_restored(&summary, dir);
    println!(
        "✓ Installed {}",
        summary.package_spec.as_deref().unwrap_or("restored wheels")
    );
    if clean {
        println!("  Removed restored wheels");
    }

    Ok(())
}

fn handle_paste(clipboard: &dyn ClipboardBackend, dir: &Path) -> Result<()> {
    let summary = transfer::restore_wheels_from_clipboard(clipboard, dir)
        .context("Failed to restore wheels from the clipboard")?;

    print_restored(&summary, dir);
    if let Some(package) = &summary.package_spec {
        println!("  Package: {package} (include deps: {})", summary.include_deps);
    }

    Ok(())
}

fn print_restored(summary: &RestoreSummary, dir: &Path) {
    println!(
        "✓ Restored {} wheel(s) ({:.2} MB) into {}",
        summary.files.len(),
        to_megabytes(summary.total_bytes),
        dir.display()
    );
}
