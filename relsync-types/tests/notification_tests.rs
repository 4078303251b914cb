use pretty_assertions::assert_eq;
use relsync_types::{ActionCreators, DataKey, Notification, NotificationKind, RecordId};
use serde_json::json;

fn users() -> ActionCreators {
    ActionCreators::new("users")
}

// ── Action creators ──────────────────────────────────────────────

#[test]
fn update_succeeded_takes_payload_then_id() {
    let n = users().update_succeeded(json!({"id": 42}), Some(RecordId::Int(1)));
    assert_eq!(
        n,
        Notification::UpdateSucceeded {
            data_key: DataKey::from("users"),
            payload: json!({"id": 42}),
            id: Some(RecordId::Int(1)),
        }
    );
}

#[test]
fn update_failed_takes_id_then_error() {
    let n = users().update_failed(Some(RecordId::Int(1)), "boom");
    assert_eq!(n.kind(), NotificationKind::UpdateFailed);
    assert_eq!(n.id(), Some(&RecordId::Int(1)));
    assert_eq!(n.error(), Some("boom"));
}

#[test]
fn delete_succeeded_takes_id_then_payload() {
    let n = users().delete_succeeded(Some(RecordId::Int(7)), json!({"ok": true}));
    assert_eq!(n.id(), Some(&RecordId::Int(7)));
    assert_eq!(n.payload(), Some(&json!({"ok": true})));
    assert!(!n.is_failure());
}

#[test]
fn load_notifications_have_no_identifier() {
    let ok = users().load_succeeded(json!([{"id": 1}]));
    let failed = users().load_failed("offline");
    assert_eq!(ok.id(), None);
    assert_eq!(failed.id(), None);
    assert!(failed.is_failure());
}

#[test]
fn sync_rejected_is_a_failure() {
    let n = users().sync_rejected(None, "Unhandled action");
    assert!(n.is_failure());
    assert_eq!(n.error(), Some("Unhandled action"));
}

// ── Action types / serde ─────────────────────────────────────────

#[test]
fn action_type_strings() {
    assert_eq!(
        users().delete_failed(None, "x").action_type(),
        "@@relsync/users/DELETE_FAILED"
    );
    assert_eq!(
        users().load_succeeded(json!(null)).action_type(),
        "@@relsync/users/LOAD_SUCCEEDED"
    );
}

#[test]
fn notification_serializes_with_kind_tag() {
    let n = users().delete_succeeded(Some(RecordId::Int(7)), json!({"ok": true}));
    assert_eq!(
        serde_json::to_value(&n).unwrap(),
        json!({
            "kind": "DELETE_SUCCEEDED",
            "data_key": "users",
            "id": 7,
            "payload": {"ok": true}
        })
    );
}
