#![cfg(unix)]

use assert_cmd::prelude::*;
use command_extra::CommandExtra;
use pretty_assertions::assert_eq;
use std::{fs, process::Command};
use vaultwrap_testing_utils::{
    bin::vaultwrap_with_temp_cwd, fake_npm::write_fake_npm, fs::get_filenames_in_folder,
};

#[test]
fn should_download_every_resolved_url() {
    let (command, root, workspace) = vaultwrap_with_temp_cwd();
    let mut origin = mockito::Server::new();
    let a = origin.mock("GET", "/a/-/a-1.0.0.tgz").with_body("tarball of a").expect(1).create();
    let b = origin.mock("GET", "/b.tgz").with_body("tarball of b").expect(1).create();

    eprintln!("Creating the lockfile that npm shrinkwrap will produce...");
    let lockfile = serde_json::json!({
        "dependencies": {
            "a": { "resolved": format!("{}/a/-/a-1.0.0.tgz", origin.url()) },
            "b": { "resolved": format!("{}/b.tgz", origin.url()) },
        },
    });
    let snapshot = root.path().join("snapshot.json");
    fs::write(&snapshot, lockfile.to_string()).expect("write snapshot.json");
    let npm = write_fake_npm(
        root.path(),
        &format!("[ \"$1\" = shrinkwrap ] && cp {snapshot:?} npm-shrinkwrap.json\n"),
    );

    eprintln!("Executing command...");
    command.with_arg("--npm").with_arg(&npm).assert().success();

    eprintln!("Make sure every artifact is in the store");
    a.assert();
    b.assert();
    assert_eq!(get_filenames_in_folder(&workspace.join("packages")), ["a-1.0.0.tgz", "b.tgz"]);
    assert_eq!(
        fs::read_to_string(workspace.join("packages/a-1.0.0.tgz")).unwrap(),
        "tarball of a",
    );

    drop(root); // cleanup
}

#[test]
fn should_not_download_twice() {
    let (command, root, workspace) = vaultwrap_with_temp_cwd();
    let mut origin = mockito::Server::new();
    let mock = origin.mock("GET", "/c-2.0.0.tgz").with_body("c").expect(1).create();

    let lockfile = serde_json::json!({
        "dependencies": {
            "c": { "resolved": format!("{}/c-2.0.0.tgz", origin.url()) },
        },
    });
    fs::write(workspace.join("npm-shrinkwrap.json"), lockfile.to_string())
        .expect("write npm-shrinkwrap.json");

    eprintln!("Executing command twice...");
    command.with_args(["build", "--skip-snapshot"]).assert().success();
    Command::cargo_bin("vaultwrap")
        .expect("find the vaultwrap binary")
        .with_current_dir(&workspace)
        .with_args(["build", "--skip-snapshot"])
        .assert()
        .success();

    mock.assert();
    assert_eq!(get_filenames_in_folder(&workspace.join("packages")), ["c-2.0.0.tgz"]);

    drop(root); // cleanup
}

#[test]
fn should_propagate_the_exit_code_of_npm_shrinkwrap() {
    let (command, root, workspace) = vaultwrap_with_temp_cwd();
    let npm = write_fake_npm(root.path(), "exit 5\n");

    let output = command.with_arg("build").with_arg("--npm").with_arg(&npm).output().unwrap();
    dbg!(&output);

    assert_eq!(output.status.code(), Some(5));
    assert!(!workspace.join("packages").exists());

    drop(root); // cleanup
}

#[test]
fn should_fail_when_a_download_fails() {
    let (command, root, workspace) = vaultwrap_with_temp_cwd();
    let mut origin = mockito::Server::new();
    origin.mock("GET", "/missing.tgz").with_status(404).create();

    let lockfile = serde_json::json!({
        "dependencies": {
            "missing": { "resolved": format!("{}/missing.tgz", origin.url()) },
        },
    });
    fs::write(workspace.join("npm-shrinkwrap.json"), lockfile.to_string())
        .expect("write npm-shrinkwrap.json");

    let output = command.with_args(["build", "--skip-snapshot"]).output().unwrap();
    dbg!(&output);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.tgz"));
    assert_eq!(get_filenames_in_folder(&workspace.join("packages")), Vec::<String>::new());

    drop(root); // cleanup
}
