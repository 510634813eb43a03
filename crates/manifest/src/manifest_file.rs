use derive_more::{Display, Error};
use miette::Diagnostic;
use std::path::{Path, PathBuf};
use vaultwrap_lockfile::Lockfile;
use walkdir::{DirEntry, WalkDir};

/// Role of a JSON file that carries resolved URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    /// The root `npm-shrinkwrap.json`.
    Lockfile,
    /// The `package.json` of an installed package.
    Package,
}

impl ManifestKind {
    /// Name of the field that holds the resolved URL in a file of this kind.
    pub fn resolved_field(self) -> &'static str {
        match self {
            ManifestKind::Lockfile => Lockfile::RESOLVED_FIELD,
            ManifestKind::Package => "_resolved",
        }
    }
}

/// A JSON file whose resolved URLs get redirected during an install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFile {
    pub path: PathBuf,
    pub kind: ManifestKind,
}

/// Error type of [`find_manifest_files`].
#[derive(Debug, Display, Error, Diagnostic)]
#[display("Failed to list installed packages in {modules_dir:?}: {error}")]
#[diagnostic(code(vaultwrap_manifest::list_packages))]
pub struct FindManifestFilesError {
    pub modules_dir: PathBuf,
    #[error(source)]
    pub error: walkdir::Error,
}

/// Name of the directory in which npm installs packages.
pub const MODULES_DIR: &str = "node_modules";

/// List the lockfile of `root_dir` followed by the `package.json` of every installed package.
///
/// Installed packages are the direct children of `node_modules`, and the children of its
/// `@scope` directories. Hidden entries such as `node_modules/.bin` are ignored.
pub fn find_manifest_files(root_dir: &Path) -> Result<Vec<ManifestFile>, FindManifestFilesError> {
    let lockfile = ManifestFile { path: Lockfile::path_in(root_dir), kind: ManifestKind::Lockfile };
    let modules_dir = root_dir.join(MODULES_DIR);
    if !modules_dir.is_dir() {
        return Ok(vec![lockfile]);
    }

    let mut manifest_files = vec![lockfile];
    let entries = WalkDir::new(&modules_dir)
        .min_depth(1)
        .max_depth(2)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry) && (entry.depth() == 1 || is_in_scope(entry)));
    for entry in entries {
        let entry = entry.map_err(|error| FindManifestFilesError {
            modules_dir: modules_dir.clone(),
            error,
        })?;
        if !entry.file_type().is_dir() || is_scope(&entry) {
            continue;
        }
        let path = entry.path().join("package.json");
        if path.is_file() {
            manifest_files.push(ManifestFile { path, kind: ManifestKind::Package });
        }
    }

    Ok(manifest_files)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn is_scope(entry: &DirEntry) -> bool {
    entry.depth() == 1 && entry.file_name().to_string_lossy().starts_with('@')
}

fn is_in_scope(entry: &DirEntry) -> bool {
    entry
        .path()
        .parent()
        .and_then(Path::file_name)
        .is_some_and(|name| name.to_string_lossy().starts_with('@'))
}
