//! Working-directory snapshots and edited-file reconciliation.
//!
//! No engine cooperation is assumed: the set of edits is derived by
//! comparing the tracked files' content before and after the turn.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::api::EditedFile;

/// Tracked file content at one instant, keyed by workdir-relative path.
/// `None` marks a file that is absent or unreadable.
pub type FileSnapshot = BTreeMap<PathBuf, Option<String>>;

/// Capture the current content of the tracked files.
#[must_use]
pub fn snapshot<'a>(workdir: &Path, files: impl IntoIterator<Item = &'a PathBuf>) -> FileSnapshot {
    files
        .into_iter()
        .map(|rel| (rel.clone(), std::fs::read_to_string(workdir.join(rel)).ok()))
        .collect()
}

/// Files whose content changed between the two snapshots, in path order.
///
/// A file that appeared carries its new content; a file that vanished is
/// reported with empty content rather than dropped, so clients always see
/// that it was touched.
#[must_use]
pub fn diff_snapshots(before: &FileSnapshot, after: &FileSnapshot) -> Vec<EditedFile> {
    let mut edited = Vec::new();
    for (path, after_content) in after {
        let before_content = before.get(path).and_then(|c| c.as_deref());
        match (before_content, after_content.as_deref()) {
            (None, Some(content)) => edited.push(EditedFile {
                path: path.display().to_string(),
                content: content.to_string(),
            }),
            (Some(old), Some(new)) if old != new => edited.push(EditedFile {
                path: path.display().to_string(),
                content: new.to_string(),
            }),
            (Some(_), None) => edited.push(EditedFile {
                path: path.display().to_string(),
                content: String::new(),
            }),
            _ => {}
        }
    }
    edited
}
