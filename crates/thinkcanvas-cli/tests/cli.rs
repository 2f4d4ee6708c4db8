use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn canvas_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("canvas").unwrap();
    cmd.env_remove("THINKCANVAS_DIR")
        .env_remove("RUST_LOG")
        .arg("--dir")
        .arg(dir);
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

fn new_canvas(dir: &Path, name: &str, goal: &str) -> String {
    stdout_of(canvas_cmd(dir).args(["new", name, "--text", goal]))
}

#[test]
fn new_creates_file_in_dir() {
    let dir = TempDir::new().unwrap();
    let path = new_canvas(dir.path(), "todo app", "build a todo app");
    assert_eq!(Path::new(&path), dir.path().join("todo-app.json"));
    assert!(Path::new(&path).exists());

    let second = new_canvas(dir.path(), "todo app", "again");
    assert_eq!(Path::new(&second), dir.path().join("todo-app-2.json"));
}

#[test]
fn new_reads_goal_from_stdin() {
    let dir = TempDir::new().unwrap();
    canvas_cmd(dir.path())
        .args(["new", "piped"])
        .write_stdin("goal from stdin\n")
        .assert()
        .success();

    canvas_cmd(dir.path())
        .args(["export", "outline"])
        .assert()
        .success()
        .stdout("1. goal from stdin\n");
}

#[test]
fn op_note_and_context_flow() {
    let dir = TempDir::new().unwrap();
    new_canvas(dir.path(), "flow", "build a todo app");

    let op_id = stdout_of(canvas_cmd(dir.path()).args([
        "op",
        "@excavate",
        "--text",
        "Assumes a single user",
        "--focus",
        "--input-tokens",
        "120",
    ]));
    assert_eq!(op_id.len(), 8);

    let note_id = stdout_of(
        canvas_cmd(dir.path())
            .args(["note", "--parent", op_id.as_str()])
            .write_stdin("what about families?"),
    );

    canvas_cmd(dir.path())
        .arg("context")
        .assert()
        .success()
        .stdout("build a todo app\n\n---\n\n[@excavate]\nAssumes a single user\n");

    canvas_cmd(dir.path())
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains(&op_id))
        .stdout(predicate::str::contains(&note_id))
        .stdout(predicate::str::contains("[user] what about families?"));

    canvas_cmd(dir.path())
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_nodes\":3"))
        .stdout(predicate::str::contains("\"total_input_tokens\":120"));
}

#[test]
fn delete_cascades_and_refuses_root() {
    let dir = TempDir::new().unwrap();
    new_canvas(dir.path(), "del", "goal");
    let op_id = stdout_of(canvas_cmd(dir.path()).args(["op", "@diverge", "--text", "options"]));
    stdout_of(canvas_cmd(dir.path()).args(["note", "--parent", op_id.as_str(), "--text", "leaf"]));

    canvas_cmd(dir.path())
        .args(["delete", op_id.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("deleted 2 node(s)"));

    canvas_cmd(dir.path())
        .args(["export", "outline"])
        .assert()
        .success()
        .stdout("1. goal\n");

    let root_id = stdout_of(canvas_cmd(dir.path()).args(["search", "goal", "--json"]));
    let hits: serde_json::Value = serde_json::from_str(&root_id).unwrap();
    let root_id = hits[0]["id"].as_str().unwrap().to_string();

    canvas_cmd(dir.path())
        .args(["delete", root_id.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot delete the root node"));
}

#[test]
fn unknown_node_is_an_error() {
    let dir = TempDir::new().unwrap();
    new_canvas(dir.path(), "err", "goal");
    canvas_cmd(dir.path())
        .args(["focus", "deadbeef"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("node not found: deadbeef"));
}

#[test]
fn link_and_mermaid_export() {
    let dir = TempDir::new().unwrap();
    new_canvas(dir.path(), "links", "goal");
    let a = stdout_of(canvas_cmd(dir.path()).args(["note", "--text", "first branch"]));
    let b = stdout_of(canvas_cmd(dir.path()).args(["note", "--text", "second branch"]));

    canvas_cmd(dir.path())
        .args(["link", a.as_str(), b.as_str()])
        .assert()
        .success();

    canvas_cmd(dir.path())
        .args(["export", "mermaid"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("{a} -.-> {b}")));

    canvas_cmd(dir.path())
        .args(["unlink", a.as_str(), b.as_str()])
        .assert()
        .success();
    canvas_cmd(dir.path())
        .args(["unlink", a.as_str(), b.as_str()])
        .assert()
        .failure();
}

#[test]
fn exclude_and_plan() {
    let dir = TempDir::new().unwrap();
    new_canvas(dir.path(), "plan", "goal");
    let keep = stdout_of(canvas_cmd(dir.path()).args(["op", "@excavate", "--text", "keep me"]));
    let drop = stdout_of(canvas_cmd(dir.path()).args(["op", "@diverge", "--text", "drop me"]));

    canvas_cmd(dir.path())
        .args(["exclude", drop.as_str()])
        .assert()
        .success()
        .stdout("excluded\n");

    canvas_cmd(dir.path())
        .args(["context", "--synthesis"])
        .assert()
        .success()
        .stdout(predicate::str::contains("keep me"))
        .stdout(predicate::str::contains("drop me").not());

    let plan = stdout_of(canvas_cmd(dir.path()).args(["plan", "--text", "1. do the thing"]));

    let json = stdout_of(canvas_cmd(dir.path()).args(["export", "json"]));
    let doc: serde_json::Value = serde_json::from_str(&json).unwrap();
    let node = &doc["nodes"][&plan];
    assert_eq!(node["type"], "plan");
    assert_eq!(node["operation"], "plan");
    let sources: Vec<&str> = node["source_ids"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert!(sources.contains(&keep.as_str()));
    assert!(!sources.contains(&drop.as_str()));
}

#[test]
fn templates_and_listing() {
    let dir = TempDir::new().unwrap();
    canvas_cmd(dir.path())
        .arg("templates")
        .assert()
        .success()
        .stdout(predicate::str::contains("refactor"))
        .stdout(predicate::str::contains("Bug Investigation"));

    canvas_cmd(dir.path())
        .args(["new", "triage", "--template", "bug"])
        .assert()
        .success();

    canvas_cmd(dir.path())
        .args(["list", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\":\"triage\""));

    canvas_cmd(dir.path())
        .args(["new", "x", "--template", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown template: nope"));
}

#[test]
fn missing_canvas_dir_reports_no_canvases() {
    let dir = TempDir::new().unwrap();
    canvas_cmd(&dir.path().join("absent"))
        .arg("show")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no saved canvases"));
}
