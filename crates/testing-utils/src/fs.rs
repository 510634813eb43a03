use std::path::Path;
use walkdir::WalkDir;

pub fn get_filenames_in_folder(path: &Path) -> Vec<String> {
    let mut files = std::fs::read_dir(path)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect::<Vec<_>>();

    files.sort();
    files
}

/// List every file under `root` as a `/`-separated path relative to it, sorted.
pub fn get_all_files(root: &Path) -> Vec<String> {
    let mut files: Vec<_> = WalkDir::new(root)
        .into_iter()
        .map(|entry| entry.expect("access entry"))
        .filter(|entry| !entry.file_type().is_dir())
        .map(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .expect("strip prefix from path")
                .components()
                .map(|component| component.as_os_str().to_str().expect("invalid UTF-8"))
                .collect::<Vec<_>>()
                .join("/")
        })
        .filter(|suffix| !suffix.is_empty())
        .collect();
    files.sort();
    files
}
