use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar(seed: bool) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_trackerd");
    let mut child = Command::new(exe)
        .env("TRACKERD_SEED", if seed { "1" } else { "0" })
        .env_remove("TRACKERD_WORKSPACE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn trackerd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> &str {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

#[test]
fn create_update_delete_round_trip_through_store() {
    let workspace = temp_dir("trackerd-assignments-lifecycle");
    let (_child, mut stdin, mut reader) = spawn_sidecar(true);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "assignments.create",
        json!({
            "title": "  Graph Traversal  ",
            "description": "BFS and DFS on adjacency lists",
            "professorId": "P201",
            "dueDate": "2030-05-20",
            "driveTemplateLink": "https://drive.example/graphs",
            "studentsAssigned": "s101, s102\n S101"
        }),
    );
    let a = created.get("assignment").expect("assignment");
    let id = a
        .get("assignmentId")
        .and_then(|v| v.as_str())
        .expect("generated id")
        .to_string();
    assert!(id.starts_with('A'));
    assert_eq!(a.get("title"), Some(&json!("Graph Traversal")));
    assert_eq!(a.get("professorName"), Some(&json!("Dr. Ramesh Iyer")));
    assert_eq!(a.get("studentsAssigned"), Some(&json!(["S101", "S102"])));
    assert_eq!(
        a.get("submissions"),
        Some(&json!([
            { "studentId": "S101", "status": "pending", "submittedOn": null },
            { "studentId": "S102", "status": "pending", "submittedOn": null }
        ]))
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "submissions.set",
        json!({ "assignmentId": id, "studentId": "S101", "status": "completed", "now": "2030-05-01T10:00:00" }),
    );

    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "assignments.update",
        json!({
            "assignmentId": id,
            "patch": { "studentsAssigned": ["S101", "S103"], "title": "Graph Traversal II" }
        }),
    );
    let a = updated.get("assignment").expect("assignment");
    assert_eq!(a.get("title"), Some(&json!("Graph Traversal II")));
    assert_eq!(
        a.get("submissions"),
        Some(&json!([
            { "studentId": "S101", "status": "completed", "submittedOn": "2030-05-01" },
            { "studentId": "S103", "status": "pending", "submittedOn": null }
        ]))
    );

    let fetched = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "assignments.get",
        json!({ "assignmentId": id }),
    );
    assert_eq!(fetched.get("assignment"), Some(a));

    let missing = request(
        &mut stdin,
        &mut reader,
        "6",
        "assignments.update",
        json!({ "assignmentId": "A-nope", "patch": { "title": "x" } }),
    );
    assert_eq!(error_code(&missing), "not_found");

    let invalid = request(
        &mut stdin,
        &mut reader,
        "7",
        "assignments.update",
        json!({ "assignmentId": id, "patch": { "title": "   " } }),
    );
    assert_eq!(error_code(&invalid), "validation_failed");

    let deleted = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "assignments.delete",
        json!({ "assignmentId": id }),
    );
    assert_eq!(deleted.get("deleted"), Some(&json!(true)));
    let again = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "assignments.delete",
        json!({ "assignmentId": id }),
    );
    assert_eq!(again.get("deleted"), Some(&json!(false)));
}

#[test]
fn create_rejects_invalid_input_and_duplicate_ids() {
    let workspace = temp_dir("trackerd-assignments-validation");
    let (_child, mut stdin, mut reader) = spawn_sidecar(false);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let no_title = request(
        &mut stdin,
        &mut reader,
        "2",
        "assignments.create",
        json!({ "title": "", "dueDate": "2030-01-01" }),
    );
    assert_eq!(error_code(&no_title), "validation_failed");

    let bad_date = request(
        &mut stdin,
        &mut reader,
        "3",
        "assignments.create",
        json!({ "title": "Lab", "dueDate": "01/02/2030" }),
    );
    assert_eq!(error_code(&bad_date), "validation_failed");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "assignments.create",
        json!({ "assignmentId": "A77", "title": "Lab", "dueDate": "2030-01-01" }),
    );
    let dup = request(
        &mut stdin,
        &mut reader,
        "5",
        "assignments.create",
        json!({ "assignmentId": "A77", "title": "Lab again", "dueDate": "2030-01-02" }),
    );
    assert_eq!(error_code(&dup), "validation_failed");

    let list = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "assignments.list",
        json!({ "role": "professor", "ownerId": "P1" }),
    );
    let items = list.get("assignments").and_then(|v| v.as_array()).expect("array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].get("title"), Some(&json!("Lab")));
}

#[test]
fn query_applies_search_filter_and_sort() {
    let workspace = temp_dir("trackerd-assignments-query");
    let (_child, mut stdin, mut reader) = spawn_sidecar(false);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    for (i, (id, title, due, owner)) in [
        ("A1", "Essay on Rust", "2025-06-03", "P1"),
        ("A2", "Lab report", "2025-06-20", "P1"),
        ("A3", "Old quiz", "2025-01-01", ""),
        ("A4", "Someone else's essay", "2025-06-04", "P2"),
    ]
    .into_iter()
    .enumerate()
    {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("c{}", i),
            "assignments.create",
            json!({
                "assignmentId": id,
                "title": title,
                "dueDate": due,
                "professorId": owner,
                "studentsAssigned": ["S1", "S2"]
            }),
        );
    }

    let ids = |v: &serde_json::Value| -> Vec<String> {
        v.get("assignments")
            .and_then(|a| a.as_array())
            .expect("assignments")
            .iter()
            .map(|a| a.get("assignmentId").and_then(|x| x.as_str()).unwrap_or("").to_string())
            .collect()
    };

    let now = "2025-06-01T09:00:00";
    let all = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "assignments.query",
        json!({ "role": "professor", "ownerId": "P1", "sort": "dueDesc", "now": now }),
    );
    assert_eq!(ids(&all), vec!["A2", "A1", "A3"]);

    let soon = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "assignments.query",
        json!({ "role": "professor", "ownerId": "P1", "filter": "dueSoon", "now": now }),
    );
    assert_eq!(ids(&soon), vec!["A1"]);
    let first = &soon.get("assignments").and_then(|a| a.as_array()).expect("array")[0];
    assert_eq!(first.get("dueStatus"), Some(&json!("dueSoon")));
    assert_eq!(first.get("daysRemaining"), Some(&json!(3)));
    assert_eq!(first.get("dueDateDisplay"), Some(&json!("3 Jun 2025")));

    let past = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "assignments.query",
        json!({ "role": "professor", "ownerId": "P1", "filter": "pastDue", "now": now }),
    );
    assert_eq!(ids(&past), vec!["A3"]);

    let essays = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "assignments.query",
        json!({ "search": "  ESSAY ", "now": now }),
    );
    assert_eq!(ids(&essays), vec!["A1", "A4"]);
}
