//! Tests of the `cstep` binary: responses on stdout, files on disk, exit
//! codes.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

const PROGRAM: &str = "int main(){ int a = 5; return a + 1; }\n";

fn cstep(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cstep").unwrap();
    cmd.current_dir(dir);
    cmd
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!("{}: {}", e, String::from_utf8_lossy(&output.stdout))
    })
}

#[test]
fn rewrite_writes_source_and_metadata_next_to_the_input() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("prog.c"), PROGRAM).unwrap();

    let output = cstep(dir.path()).args(["rewrite", "prog.c"]).output().unwrap();
    assert!(output.status.success());
    let response = stdout_json(&output);
    assert_eq!(response["status"], "ok");
    assert_eq!(response["files"][0]["status"], "ok");

    let instrumented = fs::read_to_string(dir.path().join("prog.g.c")).unwrap();
    assert!(instrumented.starts_with("void notify_0(int ref);"));
    assert!(instrumented.contains("notify_1("));

    let metadata: Value = serde_json::from_str(&fs::read_to_string(dir.path().join("prog.json")).unwrap()).unwrap();
    assert_eq!(metadata["file"], "prog.c");
    assert!(!metadata["notifications"].as_array().unwrap().is_empty());
    assert_eq!(metadata["nodes"][0]["parentId"], Value::Null);
}

#[test]
fn rewrite_to_stdout_writes_nothing() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("prog.c"), PROGRAM).unwrap();

    let output = cstep(dir.path()).args(["rewrite", "prog.c", "--stdout"]).output().unwrap();
    assert!(output.status.success());
    let response = stdout_json(&output);
    let file = &response["files"][0];
    assert!(file["instrumented_source"].as_str().unwrap().contains("notify_"));
    assert!(file["metadata_document"]["notifications"].is_array());
    assert!(!dir.path().join("prog.g.c").exists());
}

#[test]
fn rewrite_walks_directories_into_an_output_directory() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    fs::create_dir_all(src.join("nested")).unwrap();
    fs::write(src.join("a.c"), PROGRAM).unwrap();
    fs::write(src.join("nested/b.c"), "void f(void) {}\n").unwrap();
    fs::write(src.join("notes.txt"), "not C").unwrap();

    let output = cstep(dir.path())
        .args(["rewrite", "src", "--out-dir", "out"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["files"].as_array().unwrap().len(), 2);
    for name in ["a.g.c", "a.json", "b.g.c", "b.json"] {
        assert!(dir.path().join("out").join(name).exists(), "{}", name);
    }
}

#[test]
fn one_bad_file_fails_the_batch_but_not_the_others() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("good.c"), PROGRAM).unwrap();
    fs::write(dir.path().join("bad.c"), "int main( { return 0; }\n").unwrap();

    let output = cstep(dir.path()).args(["rewrite", "good.c", "bad.c"]).output().unwrap();
    assert_eq!(output.status.code(), Some(4));
    let response = stdout_json(&output);
    assert_eq!(response["status"], "error");
    assert!(dir.path().join("good.g.c").exists());
    assert!(!dir.path().join("bad.g.c").exists());

    let error: Value = serde_json::from_str(&fs::read_to_string(dir.path().join("bad.error.json")).unwrap()).unwrap();
    assert_eq!(error["error"]["code"], 3);
}

#[test]
fn missing_input_is_a_resolution_error() {
    let dir = TempDir::new().unwrap();
    let output = cstep(dir.path()).args(["rewrite", "absent.c"]).output().unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert_eq!(stdout_json(&output)["status"], "error");
}

#[test]
fn config_file_changes_the_generated_names() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("prog.c"), PROGRAM).unwrap();
    fs::write(
        dir.path().join("cstep.toml"),
        "[instrument]\nnotify_prefix = \"hook_\"\nemit_prelude = false\n\n[output]\npretty = false\n",
    )
    .unwrap();

    let output = cstep(dir.path()).args(["rewrite", "prog.c", "--stdout"]).output().unwrap();
    assert!(output.status.success());
    let source = stdout_json(&output)["files"][0]["instrumented_source"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(source.starts_with("int main"));
    assert!(source.contains("hook_1("));
}

#[test]
fn invalid_config_is_reported() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("prog.c"), PROGRAM).unwrap();
    fs::write(dir.path().join("cstep.toml"), "[instrument]\nunknown = 1\n").unwrap();

    let output = cstep(dir.path()).args(["verify", "prog.c"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn verify_reports_round_trips() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("prog.c"), "/* header */\nint main(void)\n{\n\treturn 0; // done\n}\n").unwrap();

    let output = cstep(dir.path()).args(["verify", "prog.c"]).output().unwrap();
    assert!(output.status.success());
    let response = stdout_json(&output);
    assert_eq!(response["files"][0]["round_trip"], true);
    assert!(response["files"][0]["nodes"].as_u64().unwrap() > 0);
}

#[test]
fn show_defaults_to_the_source_tree() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("prog.c"), PROGRAM).unwrap();

    let output = cstep(dir.path()).args(["show", "prog.c"]).output().unwrap();
    assert!(output.status.success());
    let response = stdout_json(&output);
    assert!(response["source_tree"].as_str().unwrap().contains("return a + 1;"));
    assert!(response.get("parse_tree").is_none());

    let output = cstep(dir.path())
        .args(["show", "prog.c", "--parse-tree", "--modifications"])
        .output()
        .unwrap();
    let response = stdout_json(&output);
    assert!(response["parse_tree"].is_string());
    assert!(response["modifications"].is_string());
    assert!(response.get("source_tree").is_none());
}

#[test]
fn rename_returns_or_writes_the_result() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("prog.c"), PROGRAM).unwrap();

    let output = cstep(dir.path())
        .args(["rename", "prog.c", "--from", "a", "--to", "count"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let response = stdout_json(&output);
    assert_eq!(response["replacements"], 2);
    assert_eq!(response["source"], "int main(){ int count = 5; return count + 1; }\n");
    assert_eq!(fs::read_to_string(dir.path().join("prog.c")).unwrap(), PROGRAM);

    let output = cstep(dir.path())
        .args(["rename", "prog.c", "--from", "a", "--to", "count", "--write"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(fs::read_to_string(dir.path().join("prog.c")).unwrap().contains("int count = 5"));
}

#[test]
fn rename_rejects_keywords() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("prog.c"), PROGRAM).unwrap();
    let output = cstep(dir.path())
        .args(["rename", "prog.c", "--from", "a", "--to", "int"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}
