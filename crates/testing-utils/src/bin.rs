use assert_cmd::prelude::*;
use command_extra::CommandExtra;
use std::{fs, path::PathBuf, process::Command};
use tempfile::{tempdir, TempDir};

const DEFAULT_PACKAGE_JSON: &str = r#"{ "name": "workspace", "version": "0.0.0" }"#;

/// Create a `vaultwrap` command whose current directory is a new project.
///
/// The project lives in `workspace` under the returned temporary directory and has a
/// `package.json` that does not configure the store.
pub fn vaultwrap_with_temp_cwd() -> (Command, TempDir, PathBuf) {
    let root = tempdir().expect("create temporary directory");
    let workspace = root.path().join("workspace");
    fs::create_dir(&workspace).expect("create temporary workspace for vaultwrap");
    fs::write(workspace.join("package.json"), DEFAULT_PACKAGE_JSON).expect("write to package.json");
    let command = Command::cargo_bin("vaultwrap")
        .expect("find the vaultwrap binary")
        .with_current_dir(&workspace);
    (command, root, workspace)
}
