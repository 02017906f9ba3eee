//! Final report discovery and best-effort viewer launch.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File name the reporter is expected to produce, matched case-insensitively.
pub const REPORT_FILE: &str = "cybersecurity-report.html";

/// Recursively search `dir` for the final report.
///
/// Returns the first match in directory-walk order, or `None` when the
/// reporter produced no report (or `dir` does not exist).
pub fn find_report(dir: &Path) -> Option<PathBuf> {
    find_file_ci(dir, REPORT_FILE)
}

fn find_file_ci(dir: &Path, file_name: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut subdirs = Vec::new();

    for entry in entries.filter_map(|e| e.ok()) {
        // Never follow symlinks: a self-referential link would recurse forever.
        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(_) => continue,
        };
        if file_type.is_symlink() {
            continue;
        }

        let path = entry.path();
        if file_type.is_file() {
            if path
                .file_name()
                .map(|n| n.to_string_lossy().eq_ignore_ascii_case(file_name))
                .unwrap_or(false)
            {
                return Some(path);
            }
        } else if file_type.is_dir() {
            subdirs.push(path);
        }
    }

    for sub in subdirs {
        if let Some(found) = find_file_ci(&sub, file_name) {
            return Some(found);
        }
    }
    None
}

/// Open the report in the platform viewer.
///
/// Purely best-effort: headless environments have no viewer, so failure is
/// logged and swallowed.
pub fn open_in_viewer(path: &Path) -> bool {
    match open::that(path) {
        Ok(()) => {
            info!("Opened report {:?} in viewer", path);
            true
        }
        Err(e) => {
            warn!(error = %e, "Could not open report {:?} in viewer", path);
            false
        }
    }
}
