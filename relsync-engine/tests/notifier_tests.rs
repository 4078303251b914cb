use pretty_assertions::assert_eq;
use relsync_engine::{
    OutcomeHandlers, handle_delete_failed, handle_delete_success, handle_update_failed,
    handle_update_success,
};
use relsync_types::{ActionCreators, ActionKind, DataKey, Notification, RecordId};
use serde_json::json;

fn creators() -> ActionCreators {
    ActionCreators::new("posts")
}

fn posts() -> DataKey {
    DataKey::from("posts")
}

// ── Adapters ─────────────────────────────────────────────────────

#[test]
fn update_adapters_fix_the_id() {
    let succeeded = handle_update_success(Some(RecordId::Int(3)), creators());
    assert_eq!(
        succeeded(json!({"id": 3, "title": "t"})),
        Notification::UpdateSucceeded {
            data_key: posts(),
            payload: json!({"id": 3, "title": "t"}),
            id: Some(RecordId::Int(3)),
        }
    );

    let failed = handle_update_failed(Some(RecordId::Int(3)), creators());
    assert_eq!(
        failed("nope".to_string()),
        Notification::UpdateFailed {
            data_key: posts(),
            id: Some(RecordId::Int(3)),
            error: "nope".into(),
        }
    );
}

#[test]
fn delete_adapters_fix_the_id() {
    let succeeded = handle_delete_success(Some(RecordId::Int(7)), creators());
    assert_eq!(
        succeeded(json!({"ok": true})),
        Notification::DeleteSucceeded {
            data_key: posts(),
            id: Some(RecordId::Int(7)),
            payload: json!({"ok": true}),
        }
    );

    let failed = handle_delete_failed(None, creators());
    assert_eq!(failed("gone".to_string()).id(), None);
}

#[test]
fn adapters_are_reusable() {
    let succeeded = handle_update_success(Some(RecordId::from("a")), creators());
    let first = succeeded(json!(1));
    let second = succeeded(json!(2));
    assert_eq!(first.id(), second.id());
    assert_ne!(first, second);
}

// ── OutcomeHandlers ──────────────────────────────────────────────

#[test]
fn handlers_per_kind() {
    let id = Some(RecordId::Int(1));
    let update = OutcomeHandlers::for_kind(ActionKind::Update, id.clone(), &creators());
    let delete = OutcomeHandlers::for_kind(ActionKind::Delete, id.clone(), &creators());
    let load = OutcomeHandlers::for_kind(ActionKind::Load, id, &creators());

    assert!(matches!(update.succeeded(json!({})), Notification::UpdateSucceeded { .. }));
    assert!(matches!(update.failed("x"), Notification::UpdateFailed { .. }));
    assert!(matches!(delete.succeeded(json!({})), Notification::DeleteSucceeded { .. }));
    assert!(matches!(delete.failed("x"), Notification::DeleteFailed { .. }));
    assert_eq!(
        load.succeeded(json!([1, 2])),
        Notification::LoadSucceeded {
            data_key: posts(),
            payload: json!([1, 2]),
        }
    );
    assert_eq!(
        load.failed("offline"),
        Notification::LoadFailed {
            data_key: posts(),
            error: "offline".into(),
        }
    );
}

#[test]
fn custom_handlers() {
    let c = creators();
    let handlers = OutcomeHandlers::new(
        move |payload| c.load_succeeded(payload),
        |error| ActionCreators::new("other").load_failed(error),
    );
    assert_eq!(handlers.failed("e").data_key(), &DataKey::from("other"));
}
