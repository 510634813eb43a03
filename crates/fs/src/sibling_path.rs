use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process,
    sync::atomic::{AtomicU64, Ordering},
};

/// Path in the same directory as `file_path` whose name is `{prefix}{file_name}{suffix}`.
fn sibling_path(file_path: &Path, prefix: &str, suffix: &str) -> PathBuf {
    let file_name = file_path.file_name().unwrap_or_else(|| OsStr::new(""));
    let mut sibling_name = OsString::with_capacity(prefix.len() + file_name.len() + suffix.len());
    sibling_name.push(prefix);
    sibling_name.push(file_name);
    sibling_name.push(suffix);
    file_path.with_file_name(sibling_name)
}

/// Path of the backup that holds the original content of `file_path` while it is mutated.
///
/// The backup lives next to the file and is named `.{file_name}.bak`.
///
/// The name is fixed, so two runs mutating the same project at the same time race on it.
pub fn backup_path(file_path: &Path) -> PathBuf {
    sibling_path(file_path, ".", ".bak")
}

/// Unique hidden path next to `file_path` for content that is not yet complete.
///
/// The name embeds the process id and a per-process counter, so concurrent writers targeting
/// the same `file_path` never share a temporary file.
pub fn temp_path(file_path: &Path) -> PathBuf {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let count = COUNTER.fetch_add(1, Ordering::Relaxed);
    let suffix = format!(".{pid}-{count}.part", pid = process::id());
    sibling_path(file_path, ".", &suffix)
}
