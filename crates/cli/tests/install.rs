#![cfg(unix)]

use assert_cmd::prelude::*;
use command_extra::CommandExtra;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::{
    fs,
    path::Path,
    process::Command,
    thread,
    time::{Duration, Instant},
};
use text_block_macros::text_block_fnl;
use vaultwrap_testing_utils::{
    bin::vaultwrap_with_temp_cwd, fake_npm::write_fake_npm, fs::get_all_files,
};

const LOCKFILE: &str = r#"{"dependencies":{"a":{"resolved":"https://registry.npmjs.org/a/-/a-1.0.0.tgz"},"b":{"resolved":"https://example.com/b.tgz"}}}"#;

fn read_json(path: &Path) -> Value {
    fs::read_to_string(path).expect("read JSON file").parse().expect("parse JSON file")
}

fn assert_no_backup(workspace: &Path) {
    let backups: Vec<_> =
        get_all_files(workspace).into_iter().filter(|path| path.ends_with(".bak")).collect();
    assert_eq!(backups, Vec::<String>::new());
}

#[test]
fn should_install_from_the_mirror_and_restore_the_lockfile() {
    let (command, root, workspace) = vaultwrap_with_temp_cwd();
    fs::write(workspace.join("npm-shrinkwrap.json"), LOCKFILE).expect("write npm-shrinkwrap.json");
    let npm = write_fake_npm(root.path(), text_block_fnl! {
        "[ \"$1\" = install ] || exit 64"
        "cp npm-shrinkwrap.json observed.json"
    });

    eprintln!("Executing command...");
    command
        .with_args(["install", "--address", "127.0.0.1", "--npm"])
        .with_arg(&npm)
        .assert()
        .success();

    eprintln!("Make sure npm install saw the mirror");
    let observed = read_json(&workspace.join("observed.json"));
    let a = observed["dependencies"]["a"]["resolved"].as_str().expect("resolved of a");
    assert!(a.starts_with("http://127.0.0.1:"), "{a}");
    assert!(a.ends_with("/a-1.0.0.tgz"), "{a}");
    assert_eq!(observed["dependencies"]["b"]["resolved"], "https://example.com/b.tgz");

    eprintln!("Make sure the lockfile is restored");
    assert_eq!(fs::read_to_string(workspace.join("npm-shrinkwrap.json")).unwrap(), LOCKFILE);
    assert_no_backup(&workspace);

    drop(root); // cleanup
}

#[test]
fn should_pass_extra_arguments_to_npm_install() {
    let (command, root, workspace) = vaultwrap_with_temp_cwd();
    fs::write(workspace.join("npm-shrinkwrap.json"), LOCKFILE).expect("write npm-shrinkwrap.json");
    let npm = write_fake_npm(root.path(), "echo \"$@\" > arguments.txt\n");

    command
        .with_arg("--npm")
        .with_arg(&npm)
        .with_args(["install", "--no-audit", "--omit=dev"])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(workspace.join("arguments.txt")).unwrap(),
        "install --no-audit --omit=dev\n",
    );

    drop(root); // cleanup
}

#[test]
fn should_propagate_the_exit_code_of_npm_install() {
    let (command, root, workspace) = vaultwrap_with_temp_cwd();
    fs::write(workspace.join("npm-shrinkwrap.json"), LOCKFILE).expect("write npm-shrinkwrap.json");
    let npm = write_fake_npm(root.path(), "exit 4\n");

    let output = command.with_args(["install", "--npm"]).with_arg(&npm).output().unwrap();
    dbg!(&output);

    assert_eq!(output.status.code(), Some(4));
    assert_eq!(fs::read_to_string(workspace.join("npm-shrinkwrap.json")).unwrap(), LOCKFILE);
    assert_no_backup(&workspace);

    drop(root); // cleanup
}

#[test]
fn should_ask_for_a_build_when_the_lockfile_is_missing() {
    let (command, root, workspace) = vaultwrap_with_temp_cwd();
    let npm = write_fake_npm(root.path(), "touch ran\n");

    let output = command.with_args(["install", "--npm"]).with_arg(&npm).output().unwrap();
    dbg!(&output);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("vaultwrap build"));
    assert!(!workspace.join("ran").exists());

    drop(root); // cleanup
}

#[test]
fn should_restore_the_lockfile_when_interrupted_twice() {
    let (command, root, workspace) = vaultwrap_with_temp_cwd();
    fs::write(workspace.join("npm-shrinkwrap.json"), LOCKFILE).expect("write npm-shrinkwrap.json");
    let npm = write_fake_npm(root.path(), text_block_fnl! {
        "cp npm-shrinkwrap.json observed.json"
        "touch started"
        "exec sleep 30"
    });

    eprintln!("Starting vaultwrap install...");
    let mut vaultwrap = command
        .with_args(["install", "--address", "127.0.0.1", "--npm"])
        .with_arg(&npm)
        .spawn()
        .expect("spawn vaultwrap");

    eprintln!("Waiting for npm install to start...");
    let started = workspace.join("started");
    let begin = Instant::now();
    while !started.exists() {
        assert!(begin.elapsed() < Duration::from_secs(20), "npm install did not start");
        thread::sleep(Duration::from_millis(10));
    }

    eprintln!("Interrupting twice...");
    let pid = vaultwrap.id().to_string();
    let first = Command::new("kill").with_args(["-INT", &pid]).status().expect("run kill");
    assert!(first.success());
    Command::new("kill").with_args(["-INT", &pid]).status().expect("run kill");

    let status = vaultwrap.wait().expect("wait for vaultwrap");
    dbg!(begin.elapsed());
    assert_eq!(status.code(), Some(130));

    eprintln!("Make sure npm install ran against the mirror");
    let observed = read_json(&workspace.join("observed.json"));
    let a = observed["dependencies"]["a"]["resolved"].as_str().expect("resolved of a");
    assert!(a.starts_with("http://127.0.0.1:"), "{a}");

    eprintln!("Make sure the lockfile is restored");
    assert_eq!(fs::read_to_string(workspace.join("npm-shrinkwrap.json")).unwrap(), LOCKFILE);
    assert_no_backup(&workspace);

    drop(root); // cleanup
}
