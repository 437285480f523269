use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::{AcademicYear, Branch, StudentProfile, StudentRecord};
use crate::query::{self, Category};
use crate::store::{RecordStore, StoreError};
use serde_json::json;

fn store_err(req: &Request, e: StoreError) -> serde_json::Value {
    if matches!(e, StoreError::Sqlite(_) | StoreError::Corrupt { .. }) {
        tracing::warn!(method = %req.method, error = %e, "store failure");
    }
    err(&req.id, e.code(), e.to_string(), None)
}

fn student_json(s: &StudentRecord) -> serde_json::Value {
    let mut v = serde_json::to_value(s).unwrap_or_else(|_| json!({ "id": s.id }));
    v["displayName"] = json!(s.display_name());
    v["branchLabel"] = json!(s.profile.branch.label());
    v["academicYearLabel"] = json!(s.profile.academic_year.label());
    v
}

fn parse_student_id(req: &Request) -> Result<i64, serde_json::Value> {
    match req.params.get("studentId") {
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| err(&req.id, "bad_params", "studentId must be an integer", None)),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| err(&req.id, "bad_params", "studentId must be an integer", None)),
        _ => Err(err(&req.id, "bad_params", "missing studentId", None)),
    }
}

fn parse_profile(req: &Request, raw: serde_json::Value) -> Result<StudentProfile, serde_json::Value> {
    serde_json::from_value::<StudentProfile>(raw).map_err(|e| {
        err(
            &req.id,
            "bad_params",
            format!("invalid student: {e}"),
            None,
        )
    })
}

fn handle_students_options(req: &Request) -> serde_json::Value {
    let branches: Vec<serde_json::Value> = Branch::ALL
        .iter()
        .map(|b| json!({ "value": b.symbol(), "label": b.label() }))
        .collect();
    let years: Vec<serde_json::Value> = AcademicYear::ALL
        .iter()
        .map(|y| json!({ "value": y.symbol(), "label": y.label() }))
        .collect();
    let categories: Vec<&str> = Category::ALL.iter().map(|c| c.name()).collect();
    ok(
        &req.id,
        json!({
            "branches": branches,
            "years": years,
            "categories": categories,
            "topByCgpaLimit": query::TOP_BY_CGPA_LIMIT
        }),
    )
}

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_deref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let criteria = match query::parse_criteria(&req.params, state.config.page_size) {
        Ok(c) => c,
        Err(e) => return err(&req.id, e.code(), e.to_string(), None),
    };

    match query::run(store, &criteria) {
        Ok(page) => {
            let students: Vec<serde_json::Value> = page.items.iter().map(student_json).collect();
            ok(
                &req.id,
                json!({
                    "students": students,
                    "total": page.total,
                    "pageCount": page.page_count,
                    "page": page.page,
                    "pageSize": page.page_size
                }),
            )
        }
        Err(query::QueryError::Store(e)) => store_err(req, e),
        Err(e) => err(&req.id, e.code(), e.to_string(), None),
    }
}

fn handle_students_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_deref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let found = if let Some(roll_no) = req.params.get("rollNo").and_then(|v| v.as_str()) {
        store.get_by_roll_no(roll_no.trim())
    } else {
        let id = match parse_student_id(req) {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        store.get(id)
    };

    match found {
        Ok(Some(s)) => ok(&req.id, json!({ "student": student_json(&s) })),
        Ok(None) => err(&req.id, "not_found", "student not found", None),
        Err(e) => store_err(req, e),
    }
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_deref_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(raw) = req.params.get("student").cloned() else {
        return err(&req.id, "bad_params", "missing student", None);
    };
    let profile = match parse_profile(req, raw) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    match store.insert(profile) {
        Ok(s) => {
            tracing::info!(id = s.id, roll_no = %s.profile.roll_no, "student created");
            ok(&req.id, json!({ "student": student_json(&s) }))
        }
        Err(e) => store_err(req, e),
    }
}

fn handle_students_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_deref_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let id = match parse_student_id(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(patch) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "missing patch", None);
    };

    let existing = match store.get(id) {
        Ok(Some(s)) => s,
        Ok(None) => return err(&req.id, "not_found", "student not found", None),
        Err(e) => return store_err(req, e),
    };

    // Overlay the patch on the stored profile, then re-validate the whole thing.
    let mut merged = match serde_json::to_value(&existing.profile) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    if let Some(obj) = merged.as_object_mut() {
        for (k, v) in patch {
            if k == "id" {
                continue;
            }
            obj.insert(k.clone(), v.clone());
        }
    }
    let profile = match parse_profile(req, merged) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    match store.update(id, profile) {
        Ok(Some(s)) => {
            tracing::info!(id = s.id, "student updated");
            ok(&req.id, json!({ "student": student_json(&s) }))
        }
        Ok(None) => err(&req.id, "not_found", "student not found", None),
        Err(e) => store_err(req, e),
    }
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_deref_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let id = match parse_student_id(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match store.delete(id) {
        Ok(Some(s)) => {
            tracing::info!(id = s.id, roll_no = %s.profile.roll_no, "student deleted");
            ok(&req.id, json!({ "student": student_json(&s) }))
        }
        Ok(None) => err(&req.id, "not_found", "student not found", None),
        Err(e) => store_err(req, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.options" => Some(handle_students_options(req)),
        "students.list" => Some(handle_students_list(state, req)),
        "students.get" => Some(handle_students_get(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        _ => None,
    }
}
