//! End-to-end flows: download wheels onto the clipboard, and restore them
//! from the clipboard for an offline install.

use crate::bundle::Bundle;
use crate::clipboard::ClipboardBackend;
use crate::error::{Error, Result};
use crate::pip::{Pip, list_wheels};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const DOWNLOAD_DIR_PREFIX: &str = "wheel_bundle_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopySummary {
    pub wheel_count: usize,
    pub original_bytes: u64,
    pub clipboard_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreSummary {
    pub package_spec: Option<String>,
    pub include_deps: bool,
    /// Restored wheel paths in bundle order.
    pub files: Vec<PathBuf>,
    pub total_bytes: u64,
}

pub fn to_megabytes(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}

/// Download wheels for `package_spec` and place them on the clipboard as a
/// bundle. The download directory is removed whether or not this succeeds.
pub fn copy_wheels_to_clipboard(
    pip: &Pip<'_>,
    clipboard: &dyn ClipboardBackend,
    package_spec: &str,
    include_deps: bool,
) -> Result<CopySummary> {
    let download_dir = tempfile::Builder::new()
        .prefix(DOWNLOAD_DIR_PREFIX)
        .tempdir()
        .map_err(|e| Error::io(std::env::temp_dir(), e))?;

    let wheels = pip.download(package_spec, download_dir.path(), include_deps)?;

    let mut bundle = Bundle::new(package_spec, include_deps);
    for path in &wheels {
        let data = fs::read(path).map_err(|e| Error::io(path, e))?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| Error::format(format!("not a file: {}", path.display())))?;
        debug!(filename = %filename, bytes = data.len(), "Adding wheel to bundle");
        bundle.push_file(filename, data);
    }

    let text = bundle.encode();
    clipboard.write_text(&text)?;
    info!(wheels = wheels.len(), clipboard = clipboard.name(), "Bundle copied");

    let download_path = download_dir.path().to_path_buf();
    if let Err(e) = download_dir.close() {
        warn!(path = %download_path.display(), error = %e, "Failed to remove download directory");
    }

    Ok(CopySummary {
        wheel_count: bundle.files.len(),
        original_bytes: bundle.total_size(),
        clipboard_bytes: text.len(),
    })
}

/// Decode the clipboard bundle and write its wheels into `dir`, replacing
/// any wheels already there.
pub fn restore_wheels_from_clipboard(
    clipboard: &dyn ClipboardBackend,
    dir: &Path,
) -> Result<RestoreSummary> {
    if dir.exists() && !dir.is_dir() {
        return Err(Error::NotADirectory(dir.to_path_buf()));
    }

    let text = clipboard.read_text()?;
    let bundle = Bundle::decode(&text)?;

    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    for stale in list_wheels(dir)? {
        debug!(path = %stale.display(), "Removing stale wheel");
        fs::remove_file(&stale).map_err(|e| Error::io(&stale, e))?;
    }

    let mut files = Vec::with_capacity(bundle.files.len());
    for entry in &bundle.files {
        let path = dir.join(&entry.filename);
        fs::write(&path, &entry.data).map_err(|e| Error::io(&path, e))?;
        files.push(path);
    }

    info!(
        dir = %dir.display(),
        restored = files.len(),
        package = ?bundle.package_spec,
        "Wheels restored"
    );

    Ok(RestoreSummary {
        total_bytes: bundle.total_size(),
        package_spec: bundle.package_spec,
        include_deps: bundle.include_deps,
        files,
    })
}

/// Restore the clipboard bundle into `dir` and install it offline. With
/// `clean`, the restored wheels are removed after a successful install.
pub fn restore_wheels_and_install(
    pip: &Pip<'_>,
    clipboard: &dyn ClipboardBackend,
    dir: &Path,
    force_reinstall: bool,
    clean: bool,
) -> Result<RestoreSummary> {
    let summary = restore_wheels_from_clipboard(clipboard, dir)?;

    pip.install(
        dir,
        summary.package_spec.as_deref(),
        summary.include_deps,
        force_reinstall,
    )?;

    if clean {
        remove_restored(dir, &summary.files)?;
    }

    Ok(summary)
}

fn remove_restored(dir: &Path, files: &[PathBuf]) -> Result<()> {
    for path in files {
        fs::remove_file(path).map_err(|e| Error::io(path, e))?;
    }

    let is_empty = fs::read_dir(dir)
        .map_err(|e| Error::io(dir, e))?
        .next()
        .is_none();
    if is_empty {
        fs::remove_dir(dir).map_err(|e| Error::io(dir, e))?;
    }
    debug!(dir = %dir.display(), removed_dir = is_empty, "Cleaned restored wheels");
    Ok(())
}
