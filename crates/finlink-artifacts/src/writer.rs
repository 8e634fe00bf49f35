use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use finlink_collab::{utc_safe_timestamp, Clock, EditPermissionRequest, PermissionGate};
use finlink_core::{ArtifactError, CancelSignal};

/// Given an output root and a map of `relative filename -> contents`, writes
/// every file under `output_root`, archiving any pre-existing target into
/// `history/<UTC-safe-timestamp>/` first. Writes are atomic
/// per-file (write to a sibling temp file, then rename) so a crash or
/// cancellation never leaves a half-written target: the target either has
/// its old contents or its new ones, never a truncated mix.
///
/// Requires the host's edit permission over every relative path before any
/// write occurs; a denial leaves the output root completely untouched.
pub async fn write_artifacts(
    output_root: &Path,
    files: &BTreeMap<String, String>,
    permission: &dyn PermissionGate,
    clock: &dyn Clock,
    cancel: &CancelSignal,
) -> Result<(), ArtifactError> {
    let relative_paths: Vec<String> = files.keys().cloned().collect();
    let request = EditPermissionRequest::for_paths(relative_paths.clone());

    if !permission.ask(&request).await {
        return Err(ArtifactError::PermissionDenied(relative_paths.join(", ")));
    }

    let archive_dir = output_root.join("history").join(utc_safe_timestamp(clock.now()));

    for (relative, contents) in files {
        if cancel.is_cancelled() {
            return Err(ArtifactError::Cancelled(relative.clone()));
        }

        let target = output_root.join(relative);

        if target.exists() {
            archive_existing(&target, &archive_dir, relative)?;
        }

        write_one_atomic(&target, contents)?;
    }

    Ok(())
}

fn archive_existing(target: &Path, archive_dir: &Path, relative: &str) -> Result<(), ArtifactError> {
    let archived_path = archive_dir.join(relative);
    if let Some(parent) = archived_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ArtifactError::ArchiveFailed {
            path: relative.to_string(),
            message: e.to_string(),
        })?;
    }
    std::fs::copy(target, &archived_path).map_err(|e| ArtifactError::ArchiveFailed {
        path: relative.to_string(),
        message: e.to_string(),
    })?;
    Ok(())
}

fn write_one_atomic(target: &Path, contents: &str) -> Result<(), ArtifactError> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ArtifactError::FileSystem {
            path: target.display().to_string(),
            message: e.to_string(),
        })?;
    }

    let tmp_name = format!("{}.tmp", target.file_name().and_then(|n| n.to_str()).unwrap_or("artifact"));
    let tmp_path: PathBuf = target.with_file_name(tmp_name);

    std::fs::write(&tmp_path, contents).map_err(|e| ArtifactError::FileSystem {
        path: tmp_path.display().to_string(),
        message: e.to_string(),
    })?;

    std::fs::rename(&tmp_path, target).map_err(|e| ArtifactError::FileSystem {
        path: target.display().to_string(),
        message: e.to_string(),
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use finlink_collab::{AlwaysAllow, AlwaysDeny, FixedClock};

    fn files(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[tokio::test]
    async fn writes_every_file_under_the_output_root() {
        let dir = tempfile::tempdir().unwrap();
        let clock = FixedClock(Utc.with_ymd_and_hms(2025, 1, 4, 10, 0, 0).unwrap());

        write_artifacts(dir.path(), &files(&[("report.md", "hello"), ("nested/events.json", "[]")]), &AlwaysAllow, &clock, &CancelSignal::never())
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(dir.path().join("report.md")).unwrap(), "hello");
        assert_eq!(std::fs::read_to_string(dir.path().join("nested/events.json")).unwrap(), "[]");
    }

    #[tokio::test]
    async fn permission_denial_leaves_prior_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("report.md"), "original").unwrap();
        let clock = FixedClock(Utc.with_ymd_and_hms(2025, 1, 4, 10, 0, 0).unwrap());

        let err = write_artifacts(dir.path(), &files(&[("report.md", "new")]), &AlwaysDeny, &clock, &CancelSignal::never())
            .await
            .unwrap_err();

        assert!(matches!(err, ArtifactError::PermissionDenied(_)));
        assert_eq!(std::fs::read_to_string(dir.path().join("report.md")).unwrap(), "original");
    }

    #[tokio::test]
    async fn pre_existing_file_is_archived_before_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("report.md"), "original").unwrap();
        let at = Utc.with_ymd_and_hms(2025, 1, 4, 10, 30, 0).unwrap();
        let clock = FixedClock(at);

        write_artifacts(dir.path(), &files(&[("report.md", "updated")]), &AlwaysAllow, &clock, &CancelSignal::never())
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(dir.path().join("report.md")).unwrap(), "updated");
        let archived = dir.path().join("history").join(utc_safe_timestamp(at)).join("report.md");
        assert_eq!(std::fs::read_to_string(archived).unwrap(), "original");
    }

    #[tokio::test]
    async fn new_file_with_no_prior_version_is_not_archived() {
        let dir = tempfile::tempdir().unwrap();
        let at = Utc.with_ymd_and_hms(2025, 1, 4, 10, 30, 0).unwrap();
        let clock = FixedClock(at);

        write_artifacts(dir.path(), &files(&[("fresh.md", "hi")]), &AlwaysAllow, &clock, &CancelSignal::never())
            .await
            .unwrap();

        assert!(!dir.path().join("history").exists());
    }
}
