use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::layout::BundleLayout;

/// Build the bundle tree by hand and copy the compiled binary into it.
///
/// Directory creation is idempotent. The binary is copied to a `.partial`
/// file next to the destination and renamed over it, so the destination
/// holds either the previous bytes or the new ones, never a mix.
pub fn bundle_manually(layout: &BundleLayout) -> Result<PathBuf, PipelineError> {
    info!(bundle = %layout.bundle_dir.display(), "bundling manually");

    for dir in layout.directories() {
        ensure_dir(dir)?;
    }

    if !layout.compiled_binary.is_file() {
        // Still attempt the copy so the failure carries the OS error.
        warn!(
            binary = %layout.compiled_binary.display(),
            "compiled binary not found"
        );
    }

    let staging = staging_path(&layout.binary_path);
    if let Err(source) = fs::copy(&layout.compiled_binary, &staging) {
        let _ = fs::remove_file(&staging);
        return Err(PipelineError::ManualBundleFailed {
            action: "copy",
            path: layout.compiled_binary.clone(),
            source,
        });
    }
    if let Err(source) = fs::rename(&staging, &layout.binary_path) {
        let _ = fs::remove_file(&staging);
        return Err(PipelineError::ManualBundleFailed {
            action: "replace",
            path: layout.binary_path.clone(),
            source,
        });
    }

    info!(binary = %layout.binary_path.display(), "bundle written");
    Ok(layout.binary_path.clone())
}

fn ensure_dir(dir: &Path) -> Result<(), PipelineError> {
    debug!(dir = %dir.display(), "ensuring directory");
    match fs::create_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(source) => Err(PipelineError::ManualBundleFailed {
            action: "create directory",
            path: dir.to_path_buf(),
            source,
        }),
    }
}

fn staging_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    dest.with_file_name(name)
}
