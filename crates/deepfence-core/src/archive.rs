//! Archival of prior run outputs.
//!
//! Before a new run populates the output area, any existing area is moved
//! wholesale into a numbered archive slot (`output-00001`, `output-00002`,
//! ...). Slot numbers are monotonically increasing: the next slot is always
//! one past the highest existing number, so gaps left by external pruning
//! are never refilled and no archive is ever overwritten.

use crate::error::{PipelineError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Archive slot name prefix.
const SLOT_PREFIX: &str = "output-";

/// Zero-padded width of the slot number.
const SLOT_DIGITS: usize = 5;

/// Move a pre-existing output area into the next archive slot.
///
/// Returns `Ok(None)` when there is nothing to archive. On success the
/// entire output area has been renamed (not copied) into the returned slot
/// path; the caller is responsible for recreating an empty output area.
pub fn archive_prior_outputs(output_area: &Path, archive_root: &Path) -> Result<Option<PathBuf>> {
    if !output_area.exists() {
        debug!("No prior output area at {:?}, nothing to archive", output_area);
        return Ok(None);
    }

    std::fs::create_dir_all(archive_root)?;

    let next = next_slot_number(archive_root)?;
    let slot = archive_root.join(format!("{SLOT_PREFIX}{next:0SLOT_DIGITS$}"));

    if slot.exists() {
        // Numbering is max+1, so this only happens if something raced us.
        return Err(PipelineError::Archive(format!(
            "archive slot {:?} already exists",
            slot
        )));
    }

    std::fs::rename(output_area, &slot)
        .map_err(|e| PipelineError::Archive(format!("rename to {:?} failed: {}", slot, e)))?;

    info!("Archived prior outputs to {:?}", slot);
    Ok(Some(slot))
}

/// Compute the next free slot number: 1 + max existing, or 1 if none.
fn next_slot_number(archive_root: &Path) -> Result<u32> {
    let mut max = 0u32;
    for entry in std::fs::read_dir(archive_root)? {
        let entry = entry?;
        let name = entry.file_name();
        if let Some(num) = parse_slot_number(&name.to_string_lossy()) {
            max = max.max(num);
        }
    }
    Ok(max + 1)
}

/// Parse `output-NNNNN` into its number; anything else is ignored.
fn parse_slot_number(name: &str) -> Option<u32> {
    let digits = name.strip_prefix(SLOT_PREFIX)?;
    if digits.len() != SLOT_DIGITS || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_no_output_area_is_noop() {
        let dir = tempdir().unwrap();
        let archived =
            archive_prior_outputs(&dir.path().join("outputs"), &dir.path().join("archive"))
                .unwrap();
        assert!(archived.is_none());
        assert!(!dir.path().join("archive").exists());
    }

    #[test]
    fn test_first_archive_gets_slot_one() {
        let dir = tempdir().unwrap();
        let outputs = dir.path().join("outputs");
        std::fs::create_dir(&outputs).unwrap();
        std::fs::write(outputs.join("m1_output.json"), "{}").unwrap();

        let slot = archive_prior_outputs(&outputs, &dir.path().join("archive"))
            .unwrap()
            .unwrap();

        assert_eq!(slot.file_name().unwrap(), "output-00001");
        assert!(!outputs.exists(), "output area should have been moved");
        assert!(slot.join("m1_output.json").exists());
    }

    #[test]
    fn test_gaps_are_never_refilled() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("archive");
        std::fs::create_dir_all(archive.join("output-00001")).unwrap();
        std::fs::create_dir_all(archive.join("output-00003")).unwrap();

        let outputs = dir.path().join("outputs");
        std::fs::create_dir(&outputs).unwrap();

        let slot = archive_prior_outputs(&outputs, &archive).unwrap().unwrap();
        assert_eq!(slot.file_name().unwrap(), "output-00004");
    }

    #[test]
    fn test_foreign_entries_ignored() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("archive");
        std::fs::create_dir_all(archive.join("output-00002")).unwrap();
        std::fs::create_dir_all(archive.join("notes")).unwrap();
        std::fs::create_dir_all(archive.join("output-junk")).unwrap();
        std::fs::write(archive.join("output-99"), "short digits").unwrap();

        let outputs = dir.path().join("outputs");
        std::fs::create_dir(&outputs).unwrap();

        let slot = archive_prior_outputs(&outputs, &archive).unwrap().unwrap();
        assert_eq!(slot.file_name().unwrap(), "output-00003");
    }

    #[test]
    fn test_parse_slot_number() {
        assert_eq!(parse_slot_number("output-00001"), Some(1));
        assert_eq!(parse_slot_number("output-00042"), Some(42));
        assert_eq!(parse_slot_number("output-1"), None);
        assert_eq!(parse_slot_number("output-000001"), None);
        assert_eq!(parse_slot_number("output-abcde"), None);
        assert_eq!(parse_slot_number("archive-00001"), None);
    }

    #[test]
    fn test_archive_preserves_nested_tree() {
        let dir = tempdir().unwrap();
        let outputs = dir.path().join("outputs");
        std::fs::create_dir_all(outputs.join("o1/sub")).unwrap();
        std::fs::write(outputs.join("o1/sub/data.csv"), "a,b").unwrap();

        let slot = archive_prior_outputs(&outputs, &dir.path().join("archive"))
            .unwrap()
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(slot.join("o1/sub/data.csv")).unwrap(),
            "a,b"
        );
    }
}
