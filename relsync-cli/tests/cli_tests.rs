use pretty_assertions::assert_eq;
use relsync_cli::{
    EndpointSpecs, Plan, Scenario, SimulatedEndpoint, load_schemas, notification_line, plan,
    run_scenario,
};
use relsync_model::SchemaRegistry;
use relsync_types::{ActionCreators, DataKey, Notification, NotificationKind, RecordId};
use serde_json::{Value, json};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn keys(list: &[&str]) -> Vec<DataKey> {
    list.iter().map(|s| DataKey::from(*s)).collect()
}

// ── plan ─────────────────────────────────────────────────────────

#[test]
fn plan_from_schema_file() {
    let file = write_temp(
        r#"[
            {"data_key": "comments", "relations": {"post": "posts"}},
            {"data_key": "posts", "relations": {"author": "users"}},
            {"data_key": "users"},
            {"data_key": "tags"}
        ]"#,
    );
    let registry = load_schemas(file.path()).unwrap();
    let plan = plan(&registry).unwrap();

    assert_eq!(
        plan,
        Plan {
            levels: vec![keys(&["users", "tags"]), keys(&["posts"]), keys(&["comments"])],
        }
    );
    assert_eq!(
        plan.render_text(),
        "level 0: users, tags\nlevel 1: posts\nlevel 2: comments"
    );
}

#[test]
fn plan_rejects_cycles() {
    let registry = SchemaRegistry::from_json(
        r#"[{"data_key": "a", "relations": {"b": "b"}}, {"data_key": "b", "relations": {"a": "a"}}]"#,
    )
    .unwrap();
    let err = plan(&registry).unwrap_err();
    assert!(err.to_string().starts_with("circular dependency"));
}

#[test]
fn missing_schema_file_has_context() {
    let err = load_schemas(std::path::Path::new("/nonexistent/schemas.json")).unwrap_err();
    assert!(err.to_string().contains("Failed to read schema file"));
}

// ── Scenario parsing ─────────────────────────────────────────────

#[test]
fn endpoint_modes_parse() {
    let specs: EndpointSpecs = serde_json::from_value(json!({
        "update": {"mode": "respond", "delay_ms": 10, "assign_id": 42},
        "delete": {"mode": "reject", "message": "nope"},
        "load": {"mode": "plain"}
    }))
    .unwrap();

    assert_eq!(
        specs.update,
        Some(SimulatedEndpoint::Respond {
            body: None,
            delay_ms: 10,
            assign_id: Some(RecordId::Int(42)),
        })
    );
    assert_eq!(
        specs.delete,
        Some(SimulatedEndpoint::Reject {
            message: "nope".into(),
            delay_ms: 0,
        })
    );
    assert_eq!(specs.load, Some(SimulatedEndpoint::Plain { body: Value::Null }));
}

#[test]
fn scenario_file_loads_with_defaults() {
    let file = write_temp(r#"{"actions": [{"type": "@@relsync/SYNC_ALL"}]}"#);
    let scenario = Scenario::load(file.path()).unwrap();
    assert!(scenario.schemas.is_empty());
    assert_eq!(scenario.config.store_key, "relsync");
    assert_eq!(scenario.actions.len(), 1);
    assert_eq!(scenario.actions[0].payload, Value::Null);
}

// ── run ──────────────────────────────────────────────────────────

fn blog_scenario() -> Scenario {
    serde_json::from_value(json!({
        "schemas": [
            {"data_key": "posts", "relations": {"author": "users"}},
            {"data_key": "users"}
        ],
        "queue": [
            {"data_key": "posts", "id": 1, "action": "UPDATE", "state": "MODIFIED",
             "payload": {"entity": {"id": 1, "author": "tmp"}}},
            {"data_key": "users", "id": "tmp", "action": "UPDATE", "state": "NEW",
             "payload": {"entity": {"id": "tmp", "name": "ann"}}}
        ],
        "endpoints": {
            "users": {"update": {"mode": "respond", "assign_id": 7}},
            "posts": {"update": {"mode": "respond"}}
        },
        "actions": [
            {"type": "@@relsync/SYNC_ALL"},
            {"type": "@@relsync/posts/LOAD", "payload": {}},
            {"type": "app/SOMETHING_ELSE"}
        ]
    }))
    .unwrap()
}

#[tokio::test]
async fn run_blog_scenario() {
    let outcome = run_scenario(blog_scenario()).await.unwrap();

    assert_eq!(
        outcome.notifications,
        vec![
            Notification::UpdateSucceeded {
                data_key: DataKey::from("users"),
                payload: json!({"id": 7, "name": "ann"}),
                id: Some(RecordId::from("tmp")),
            },
            Notification::UpdateSucceeded {
                data_key: DataKey::from("posts"),
                payload: json!({"id": 1, "author": 7}),
                id: Some(RecordId::Int(1)),
            },
            Notification::LoadFailed {
                data_key: DataKey::from("posts"),
                error: "Method not implemented".into(),
            },
        ]
    );
    assert_eq!(outcome.passes.len(), 3);
    assert_eq!(outcome.succeeded(), 2);
    assert_eq!(outcome.failed(), 1);
    assert!(outcome.passes[2].error.as_deref().unwrap().contains("unknown action type"));
}

#[tokio::test]
async fn custom_store_key_runs_like_the_default() {
    let mut scenario = blog_scenario();
    scenario.config = scenario.config.with_store_key("api");
    let outcome = run_scenario(scenario).await.unwrap();

    assert_eq!(outcome.succeeded(), 2);
    assert_eq!(outcome.notifications[1].payload(), Some(&json!({"id": 1, "author": 7})));
}

#[tokio::test]
async fn cyclic_scenario_aborts() {
    let scenario: Scenario = serde_json::from_value(json!({
        "schemas": [
            {"data_key": "a", "relations": {"b": "b"}},
            {"data_key": "b", "relations": {"a": "a"}}
        ],
        "actions": [{"type": "@@relsync/SYNC_ALL"}]
    }))
    .unwrap();
    let err = run_scenario(scenario).await.unwrap_err();
    assert!(format!("{err:#}").contains("circular dependency"));
}

// ── Output ───────────────────────────────────────────────────────

#[test]
fn notification_lines_carry_type_and_kind() {
    let n = ActionCreators::new("users")
        .delete_succeeded(Some(RecordId::Int(7)), json!({"ok": true}));
    let line: Value = serde_json::from_str(&notification_line(&n).unwrap()).unwrap();
    assert_eq!(line["type"], "@@relsync/users/DELETE_SUCCEEDED");
    assert_eq!(line["kind"], "DELETE_SUCCEEDED");
    assert_eq!(line["id"], 7);
    assert_eq!(line["payload"], json!({"ok": true}));
    assert_eq!(n.kind(), NotificationKind::DeleteSucceeded);
}
