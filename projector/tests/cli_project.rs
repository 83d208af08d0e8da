//! CLI tests for the offline `projector` commands.
//!
//! Spawns the projector binary on payload files in a temp directory and
//! verifies stdout, mounted files and exit codes.

use std::fs;
use std::process::Command;

use projector::exit_codes;
use projector::io::config::{ProjectorConfig, load_config};
use projector::io::tree_store::write_tree;
use projector::test_support::{command_block, dir, file, file_block};

fn projector() -> Command {
    Command::new(env!("CARGO_BIN_EXE_projector"))
}

#[test]
fn project_prints_descriptor_for_payloads_in_order() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(
        temp.path().join("one.txt"),
        format!(
            "{}{}",
            file_block("/index.html", "<html></html>"),
            command_block("npm i")
        ),
    )
    .expect("write one");
    fs::write(
        temp.path().join("two.txt"),
        file_block("index.html", "<html>2</html>"),
    )
    .expect("write two");

    let output = projector()
        .current_dir(temp.path())
        .args(["project", "one.txt", "two.txt"])
        .output()
        .expect("projector project");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let descriptor: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("descriptor json");
    assert_eq!(
        descriptor,
        serde_json::json!({"index.html": {"file": {"contents": "<html>2</html>"}}})
    );
}

#[test]
fn project_mounts_into_directory() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(
        temp.path().join("payload.txt"),
        file_block("/src/components/Button.tsx", "export {}"),
    )
    .expect("write payload");

    let status = projector()
        .current_dir(temp.path())
        .args(["project", "payload.txt", "--into", "site"])
        .status()
        .expect("projector project");

    assert_eq!(status.code(), Some(exit_codes::OK));
    assert_eq!(
        fs::read_to_string(temp.path().join("site/src/components/Button.tsx")).expect("button"),
        "export {}"
    );
}

#[test]
fn project_tree_flag_prints_snapshot() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("p.txt"), file_block("/src/a.ts", "a")).expect("write");

    let output = projector()
        .current_dir(temp.path())
        .args(["project", "p.txt", "--tree"])
        .output()
        .expect("projector project");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let tree: serde_json::Value = serde_json::from_slice(&output.stdout).expect("tree json");
    let expected = serde_json::to_value(vec![dir("/src", vec![file("/src/a.ts", "a")])])
        .expect("expected json");
    assert_eq!(tree, expected);
}

#[test]
fn missing_payload_exits_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    let status = projector()
        .current_dir(temp.path())
        .args(["project", "missing.txt"])
        .status()
        .expect("projector project");
    assert_eq!(status.code(), Some(exit_codes::INVALID));
}

#[test]
fn parse_prints_operations() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("p.txt"), command_block("npm run dev")).expect("write");

    let output = projector()
        .current_dir(temp.path())
        .args(["parse", "p.txt"])
        .output()
        .expect("projector parse");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let ops: serde_json::Value = serde_json::from_slice(&output.stdout).expect("ops json");
    assert_eq!(
        ops,
        serde_json::json!([{"kind": "run_command", "command": "npm run dev", "status": "pending"}])
    );
}

#[test]
fn mount_rejects_invalid_snapshot() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("tree.json"), "[{\"name\":\"a\"}]").expect("write");

    let status = projector()
        .current_dir(temp.path())
        .args(["mount", "tree.json", "--into", "site"])
        .status()
        .expect("projector mount");

    assert_eq!(status.code(), Some(exit_codes::INVALID));
    assert!(!temp.path().join("site").exists());
}

#[test]
fn mount_materializes_snapshot() {
    let temp = tempfile::tempdir().expect("tempdir");
    let tree = vec![
        file("/index.html", "<html></html>"),
        dir("/src", vec![file("/src/main.ts", "main")]),
    ];
    write_tree(&temp.path().join("tree.json"), &tree).expect("write tree");

    let status = projector()
        .current_dir(temp.path())
        .args(["mount", "tree.json", "--into", "site"])
        .status()
        .expect("projector mount");

    assert_eq!(status.code(), Some(exit_codes::OK));
    assert_eq!(
        fs::read_to_string(temp.path().join("site/src/main.ts")).expect("main"),
        "main"
    );
}

#[test]
fn init_writes_default_config_once() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config_path = temp.path().join("projector.toml");

    let status = projector()
        .current_dir(temp.path())
        .arg("init")
        .status()
        .expect("projector init");
    assert_eq!(status.code(), Some(exit_codes::OK));
    assert_eq!(load_config(&config_path).expect("load"), ProjectorConfig::default());

    fs::write(&config_path, "backend_url = \"https://gen.example\"\n").expect("edit");
    let status = projector()
        .current_dir(temp.path())
        .arg("init")
        .status()
        .expect("projector init again");
    assert_eq!(status.code(), Some(exit_codes::OK));
    assert_eq!(
        load_config(&config_path).expect("load").backend_url,
        "https://gen.example"
    );
}

#[test]
fn build_with_unreachable_backend_exits_generation_failed() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(
        temp.path().join("projector.toml"),
        "backend_url = \"http://127.0.0.1:9\"\nrequest_timeout_secs = 2\n",
    )
    .expect("write config");

    let status = projector()
        .current_dir(temp.path())
        .args(["build", "a todo app"])
        .stdin(std::process::Stdio::null())
        .status()
        .expect("projector build");

    assert_eq!(status.code(), Some(exit_codes::GENERATION_FAILED));
}
