use crate::fixtures;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "backend": state.backend_tag(),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match state.select_workspace(path.clone()) {
        Ok(()) => ok(
            &req.id,
            json!({ "workspacePath": path.to_string_lossy(), "backend": state.backend_tag() }),
        ),
        Err(e) => {
            tracing::warn!(workspace = %path.display(), error = %e, "workspace open failed");
            err(&req.id, "db_open_failed", format!("{e:?}"), None)
        }
    }
}

fn handle_workspace_use_fixtures(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.use_fixtures();
    ok(&req.id, json!({ "backend": state.backend_tag() }))
}

/// Copies the demo students into the current store. Roll numbers that are
/// already taken are skipped, so seeding twice is harmless.
fn handle_workspace_seed_demo(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let mut inserted = 0usize;
    let mut skipped: Vec<String> = Vec::new();
    for s in fixtures::demo_students() {
        match store.get_by_roll_no(&s.profile.roll_no) {
            Ok(Some(_)) => {
                skipped.push(s.profile.roll_no);
                continue;
            }
            Ok(None) => {}
            Err(e) => return err(&req.id, e.code(), e.to_string(), None),
        }
        if let Err(e) = store.insert(s.profile) {
            return err(
                &req.id,
                e.code(),
                e.to_string(),
                Some(json!({ "inserted": inserted })),
            );
        }
        inserted += 1;
    }

    ok(&req.id, json!({ "inserted": inserted, "skipped": skipped }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "workspace.useFixtures" => Some(handle_workspace_use_fixtures(state, req)),
        "workspace.seedDemo" => Some(handle_workspace_seed_demo(state, req)),
        _ => None,
    }
}
