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

fn spawn_sidecar(envs: &[(&str, String)]) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_registrard");
    let mut cmd = Command::new(exe);
    cmd.env_remove("REGISTRARD_WORKSPACE")
        .env_remove("REGISTRARD_DEMO")
        .env_remove("REGISTRARD_PAGE_SIZE");
    for (k, v) in envs {
        cmd.env(k, v);
    }
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn registrard");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn send(
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
    let value = send(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> String {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

fn new_student(roll_no: &str) -> serde_json::Value {
    json!({
        "firstName": "Kavya",
        "lastName": "Nair",
        "rollNo": roll_no,
        "dateOfBirth": "2004-07-19",
        "gender": "Female",
        "enrollmentDate": "2023-08-01",
        "academicYear": "SECOND_YEAR",
        "branch": "AI_ML",
        "email": "kavya.nair@example.com",
        "cgpa": 9.5,
        "projectTitle": "Crop Yield Forecasting"
    })
}

#[test]
fn workspace_store_supports_full_student_lifecycle() {
    let workspace = temp_dir("registrard-crud");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);

    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(selected["backend"], "sqlite");
    assert!(workspace.join("registrar.sqlite3").is_file());

    let empty = request_ok(&mut stdin, &mut reader, "2", "students.list", json!({}));
    assert_eq!(empty["total"], 0);
    assert_eq!(empty["pageCount"], 1);

    let seeded = request_ok(&mut stdin, &mut reader, "3", "workspace.seedDemo", json!({}));
    assert_eq!(seeded["inserted"], 4);
    let reseeded = request_ok(&mut stdin, &mut reader, "4", "workspace.seedDemo", json!({}));
    assert_eq!(reseeded["inserted"], 0);

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "students.create",
        json!({ "student": new_student("AIML2023011") }),
    );
    let new_id = created["student"]["id"].as_i64().expect("new id");
    assert_eq!(new_id, 5);
    assert_eq!(created["student"]["isActive"], true);
    assert_eq!(created["student"]["backlogs"], 0);

    let dup = send(
        &mut stdin,
        &mut reader,
        "6",
        "students.create",
        json!({ "student": new_student("CSE2023001") }),
    );
    assert_eq!(error_code(&dup), "duplicate_roll_no");

    let bad_branch = {
        let mut s = new_student("XX0001");
        s["branch"] = json!("ASTRONOMY");
        send(
            &mut stdin,
            &mut reader,
            "7",
            "students.create",
            json!({ "student": s }),
        )
    };
    assert_eq!(error_code(&bad_branch), "bad_params");

    let top = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "students.list",
        json!({ "category": "top_by_cgpa" }),
    );
    assert_eq!(top["students"][0]["rollNo"], "AIML2023011");
    assert_eq!(top["total"], 5);

    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "students.update",
        json!({
            "studentId": new_id,
            "patch": { "placementStatus": "Placed", "placementCompany": "Infosys", "backlogs": 1 }
        }),
    );
    assert_eq!(updated["student"]["placementStatus"], "Placed");
    assert_eq!(updated["student"]["firstName"], "Kavya");

    let placed = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "students.list",
        json!({ "category": "placed", "search": "infosys" }),
    );
    assert_eq!(placed["total"], 1);

    let taken = send(
        &mut stdin,
        &mut reader,
        "11",
        "students.update",
        json!({ "studentId": new_id, "patch": { "rollNo": "IT2023015" } }),
    );
    assert_eq!(error_code(&taken), "duplicate_roll_no");

    let by_roll = request_ok(
        &mut stdin,
        &mut reader,
        "12",
        "students.get",
        json!({ "rollNo": "AIML2023011" }),
    );
    assert_eq!(by_roll["student"]["id"], new_id);

    let deleted = request_ok(
        &mut stdin,
        &mut reader,
        "13",
        "students.delete",
        json!({ "studentId": new_id }),
    );
    assert_eq!(deleted["student"]["rollNo"], "AIML2023011");

    let gone = send(
        &mut stdin,
        &mut reader,
        "14",
        "students.get",
        json!({ "studentId": new_id }),
    );
    assert_eq!(error_code(&gone), "not_found");

    let missing_delete = send(
        &mut stdin,
        &mut reader,
        "15",
        "students.delete",
        json!({ "studentId": 999 }),
    );
    assert_eq!(error_code(&missing_delete), "not_found");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn update_with_unknown_key_changes_nothing() {
    let workspace = temp_dir("registrard-patch-keys");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "2", "workspace.seedDemo", json!({}));

    for (i, patch) in [
        json!({ "firstName": "Zed", "cgpaa": 3.0 }),
        json!({ "first_name": "Zed" }),
    ]
    .into_iter()
    .enumerate()
    {
        let rejected = send(
            &mut stdin,
            &mut reader,
            &format!("u{i}"),
            "students.update",
            json!({ "studentId": 1, "patch": patch }),
        );
        assert_eq!(rejected["ok"], false);
        assert_eq!(error_code(&rejected), "bad_params");
    }

    let unchanged = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.get",
        json!({ "studentId": 1 }),
    );
    assert_eq!(unchanged["student"]["firstName"], "Sahana");
    assert_eq!(unchanged["student"]["cgpa"], 8.7);

    let typo_on_create = {
        let mut s = new_student("AIML2023012");
        s["hostelResidant"] = json!(true);
        send(
            &mut stdin,
            &mut reader,
            "4",
            "students.create",
            json!({ "student": s }),
        )
    };
    assert_eq!(error_code(&typo_on_create), "bad_params");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn seeded_workspace_lists_exactly_like_demo_backend() {
    let workspace = temp_dir("registrard-parity");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);

    let queries = [
        json!({}),
        json!({ "search": "ENGINEERING" }),
        json!({ "branch": "ECE" }),
        json!({ "year": "First Year" }),
        json!({ "category": "has_backlogs" }),
        json!({ "category": "top_by_cgpa", "pageSize": 2, "page": 2 }),
        json!({ "branch": "NOPE" }),
        json!({ "internshipStatus": "completed" }),
        json!({ "internshipStatus": "Not Started", "year": "FIRST_YEAR" }),
        json!({ "parentId": 3 }),
        json!({ "parentId": "3", "search": "sahana" }),
        json!({ "parentId": 42 }),
    ];

    let mut demo = Vec::new();
    for (i, q) in queries.iter().enumerate() {
        demo.push(request_ok(
            &mut stdin,
            &mut reader,
            &format!("d{i}"),
            "students.list",
            q.clone(),
        ));
    }

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "sel",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "seed", "workspace.seedDemo", json!({}));

    for (i, q) in queries.iter().enumerate() {
        let got = request_ok(
            &mut stdin,
            &mut reader,
            &format!("s{i}"),
            "students.list",
            q.clone(),
        );
        assert_eq!(got, demo[i], "backends disagree for {}", q);
    }

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn startup_config_controls_initial_backend() {
    let (mut child, mut stdin, mut reader) =
        spawn_sidecar(&[("REGISTRARD_DEMO", "false".to_string())]);
    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["backend"], serde_json::Value::Null);
    let listed = send(&mut stdin, &mut reader, "2", "students.list", json!({}));
    assert_eq!(error_code(&listed), "no_workspace");
    drop(stdin);
    let _ = child.wait();

    let workspace = temp_dir("registrard-startup");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[
        (
            "REGISTRARD_WORKSPACE",
            workspace.to_string_lossy().to_string(),
        ),
        ("REGISTRARD_PAGE_SIZE", "2".to_string()),
    ]);
    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["backend"], "sqlite");
    let _ = request_ok(&mut stdin, &mut reader, "2", "workspace.seedDemo", json!({}));
    let listed = request_ok(&mut stdin, &mut reader, "3", "students.list", json!({}));
    assert_eq!(listed["pageSize"], 2);
    assert_eq!(listed["pageCount"], 2);
    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
