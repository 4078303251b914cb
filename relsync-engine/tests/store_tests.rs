use pretty_assertions::assert_eq;
use relsync_engine::store::memory::MemoryStore;
use relsync_engine::{DEFAULT_STORE_KEY, NotificationSink, StateStore};
use relsync_model::EntitySchema;
use relsync_types::{
    ActionCreators, DataKey, EntityState, LifecycleState, QueuedAction, RecordId,
};
use serde_json::json;

fn key(s: &str) -> DataKey {
    DataKey::from(s)
}

fn state(store: &MemoryStore, data_key: &str, id: impl Into<RecordId>) -> EntityState {
    store.entity_state(DEFAULT_STORE_KEY, &key(data_key), &id.into())
}

// ── Reads ────────────────────────────────────────────────────────

#[test]
fn pending_actions_filter_by_id() {
    let store = MemoryStore::new();
    store.enqueue("users", QueuedAction::update(1, json!({})));
    store.enqueue("users", QueuedAction::update(2, json!({})));
    store.enqueue("users", QueuedAction::delete(1, json!({})));

    let pending = |data_key: &str, id: Option<&RecordId>| {
        store.pending_actions(DEFAULT_STORE_KEY, &key(data_key), id)
    };
    assert_eq!(pending("users", None).len(), 3);
    assert_eq!(pending("users", Some(&RecordId::Int(1))).len(), 2);
    assert!(pending("posts", None).is_empty());
}

#[test]
fn reads_under_a_foreign_store_key_see_nothing() {
    let store = MemoryStore::with_store_key("api");
    store.enqueue(
        "users",
        QueuedAction::update(1, json!({})).with_state(LifecycleState::New),
    );

    assert_eq!(store.pending_actions("api", &key("users"), None).len(), 1);
    assert!(store.pending_actions(DEFAULT_STORE_KEY, &key("users"), None).is_empty());
    assert_eq!(
        store.entity_state("api", &key("users"), &RecordId::Int(1)),
        EntityState::new(LifecycleState::New)
    );
    assert_eq!(
        store.entity_state(DEFAULT_STORE_KEY, &key("users"), &RecordId::Int(1)),
        EntityState::default()
    );
}

#[test]
fn schema_lookups_default_for_unknown_types() {
    let store = MemoryStore::new();
    let users = EntitySchema::new("users")
        .with_record_key("uid")
        .with_relation("team", "teams");
    store.register_schema(users).unwrap();

    assert_eq!(store.record_key(&key("users")), "uid");
    assert_eq!(store.record_key(&key("ghosts")), "id");
    assert_eq!(store.relations(&key("users")).get("team"), Some(&key("teams")));
    assert!(store.relations(&key("ghosts")).is_empty());
    assert!(store.register_schema(EntitySchema::new("users")).is_err());
}

#[test]
fn data_keys_lists_schemas_then_queued_types() {
    let store = MemoryStore::new();
    store.register_schema(EntitySchema::new("b")).unwrap();
    store.register_schema(EntitySchema::new("a")).unwrap();
    store.enqueue("z", QueuedAction::load(json!({})));
    store.enqueue("c", QueuedAction::load(json!({})));
    store.enqueue("a", QueuedAction::load(json!({})));

    assert_eq!(store.data_keys(), vec![key("b"), key("a"), key("c"), key("z")]);
}

#[test]
fn entity_state_falls_back_to_queue() {
    let store = MemoryStore::new();
    store.enqueue(
        "users",
        QueuedAction::update(1, json!({})).with_state(LifecycleState::New),
    );
    assert_eq!(
        state(&store, "users", 1),
        EntityState::new(LifecycleState::New)
    );

    store.set_entity_state("users", 1, EntityState::id_updated(9));
    assert_eq!(
        state(&store, "users", 1).updated_identifier(),
        Some(&RecordId::Int(9))
    );
    assert_eq!(state(&store, "users", 2), EntityState::default());
}

// ── Reducer ──────────────────────────────────────────────────────

#[test]
fn update_success_with_new_id_marks_id_updated() {
    let store = MemoryStore::new();
    store.enqueue("users", QueuedAction::update("tmp", json!({})));
    let creators = ActionCreators::new("users");

    store.dispatch(creators.update_succeeded(json!({"id": 5}), Some(RecordId::from("tmp"))));

    assert!(store.queued(&key("users")).is_empty());
    assert_eq!(
        state(&store, "users", "tmp"),
        EntityState::id_updated(5)
    );
    assert_eq!(
        state(&store, "users", 5),
        EntityState::new(LifecycleState::Synced)
    );
}

#[test]
fn update_success_with_same_id_is_synced() {
    let store = MemoryStore::new();
    store.enqueue("users", QueuedAction::update(5, json!({})));
    let creators = ActionCreators::new("users");
    store.dispatch(creators.update_succeeded(json!({"id": 5}), Some(RecordId::Int(5))));

    assert_eq!(
        state(&store, "users", 5),
        EntityState::new(LifecycleState::Synced)
    );
}

#[test]
fn failures_keep_the_queue() {
    let store = MemoryStore::new();
    store.enqueue("users", QueuedAction::delete(5, json!({})));
    store.dispatch(ActionCreators::new("users").delete_failed(Some(RecordId::Int(5)), "nope"));

    assert_eq!(store.queued(&key("users")).len(), 1);
    assert_eq!(store.notifications().len(), 1);
}

#[test]
fn delete_success_clears_state() {
    let store = MemoryStore::new();
    store.enqueue("users", QueuedAction::delete(5, json!({})));
    store.set_entity_state("users", 5, EntityState::new(LifecycleState::Deleted));
    let creators = ActionCreators::new("users");
    store.dispatch(creators.delete_succeeded(Some(RecordId::Int(5)), json!({})));

    assert!(store.queued(&key("users")).is_empty());
    assert_eq!(state(&store, "users", 5), EntityState::default());
}

#[test]
fn load_success_drops_the_oldest_queued_load() {
    let store = MemoryStore::new();
    store.enqueue("users", QueuedAction::update(1, json!({})));
    store.enqueue("users", QueuedAction::load(json!({"page": 1})));
    store.enqueue("users", QueuedAction::load(json!({"page": 2})));
    store.dispatch(ActionCreators::new("users").load_succeeded(json!([])));

    let left: Vec<_> = store.queued(&key("users")).into_iter().map(|a| a.payload).collect();
    assert_eq!(left, vec![json!({}), json!({"page": 2})]);
}

#[test]
fn take_notifications_drains() {
    let store = MemoryStore::with_store_key("custom");
    assert_eq!(store.store_key(), "custom");
    store.dispatch(ActionCreators::new("users").load_failed("x"));
    assert_eq!(store.take_notifications().len(), 1);
    assert!(store.notifications().is_empty());
}
