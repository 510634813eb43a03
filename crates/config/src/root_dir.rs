use crate::ProjectManifest;
use std::path::{Path, PathBuf};

/// Find the project root: the nearest ancestor of `start_dir` (itself included) that has a
/// `package.json`.
pub fn find_root_dir(start_dir: &Path) -> Option<PathBuf> {
    start_dir
        .ancestors()
        .find(|dir| dir.join(ProjectManifest::FILE_NAME).is_file())
        .map(Path::to_path_buf)
}
