use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

/// Write an executable shell script named `fake-npm` into `dir` and return its path.
///
/// The script runs `body` with the arguments vaultwrap passes to npm, such as `install`.
pub fn write_fake_npm(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-npm");
    fs::write(&path, format!("#!/bin/sh\n{body}")).expect("write the fake npm");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
        .expect("make the fake npm executable");
    path
}
