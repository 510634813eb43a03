use crate::url_basename;
use derive_more::From;
use serde::{Deserialize, Serialize};
use std::path::{self, Path, PathBuf};

/// Represent a store directory (the "vault").
///
/// * The store directory holds every artifact downloaded from the resolved URLs of a lockfile.
/// * Each artifact is named after the basename of its URL, so the store is a flat directory.
/// * Artifacts are never modified once written, which lets the store act as a cache across runs.
/// * Two URLs sharing a basename share a store entry; whichever is fetched first wins.
#[derive(Debug, Clone, PartialEq, Eq, From, Deserialize, Serialize)]
#[serde(transparent)]
pub struct StoreDir {
    /// Path to the root of the store directory.
    root: PathBuf,
}

impl StoreDir {
    /// Construct an instance of [`StoreDir`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        root.into().into()
    }

    /// Create an object that [displays](std::fmt::Display) the root of the store directory.
    pub fn display(&self) -> path::Display<'_> {
        self.root.display()
    }

    /// Path to the root of the store directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a store entry given its file name.
    pub fn entry_path(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Path at which the artifact of `url` is stored.
    ///
    /// Returns `None` if the URL has no basename (see [`url_basename`]).
    pub fn artifact_path(&self, url: &str) -> Option<PathBuf> {
        url_basename(url).map(|file_name| self.entry_path(&file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipe_trait::Pipe;
    use pretty_assertions::assert_eq;

    #[test]
    fn artifact_path() {
        let received = "/home/user/project/packages"
            .pipe(StoreDir::new)
            .artifact_path("https://registry.npmjs.org/a/-/a-1.0.0.tgz");
        let expected = PathBuf::from("/home/user/project/packages/a-1.0.0.tgz");
        assert_eq!(received, Some(expected));
    }

    #[test]
    fn artifact_path_without_basename() {
        let received = StoreDir::new("/home/user/project/packages")
            .artifact_path("https://registry.npmjs.org/");
        assert_eq!(received, None);
    }

    #[test]
    fn colliding_basenames_share_an_entry() {
        let store_dir = StoreDir::new("/tmp/packages");
        assert_eq!(
            store_dir.artifact_path("https://registry.npmjs.org/x/-/index.tgz"),
            store_dir.artifact_path("https://example.com/y/index.tgz"),
        );
    }
}
