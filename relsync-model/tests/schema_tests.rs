use pretty_assertions::assert_eq;
use relsync_model::{DEFAULT_RECORD_KEY, EntitySchema, ModelError, SchemaRegistry};
use relsync_types::DataKey;

fn key(s: &str) -> DataKey {
    DataKey::from(s)
}

// ── EntitySchema ─────────────────────────────────────────────────

#[test]
fn schema_defaults() {
    let schema = EntitySchema::new("users");
    assert_eq!(schema.data_key, key("users"));
    assert_eq!(schema.record_key, DEFAULT_RECORD_KEY);
    assert!(schema.relations.is_empty());
}

#[test]
fn schema_builder() {
    let schema = EntitySchema::new("posts")
        .with_record_key("uuid")
        .with_relation("author", "users")
        .with_relation("board", "boards");

    assert_eq!(schema.record_key, "uuid");
    assert_eq!(schema.relations.get("author"), Some(&key("users")));
    assert_eq!(schema.relations.len(), 2);
}

#[test]
fn dependencies_are_distinct() {
    let schema = EntitySchema::new("messages")
        .with_relation("from", "users")
        .with_relation("to", "users")
        .with_relation("thread", "threads");

    assert_eq!(schema.dependencies(), vec![&key("users"), &key("threads")]);
}

#[test]
fn schema_from_json_fills_defaults() {
    let schema: EntitySchema =
        serde_json::from_str(r#"{"data_key": "tags", "relations": {"owner": "users"}}"#).unwrap();
    assert_eq!(schema.record_key, "id");
    assert_eq!(schema.relations.get("owner"), Some(&key("users")));
}

// ── SchemaRegistry ───────────────────────────────────────────────

#[test]
fn registry_preserves_registration_order() {
    let registry = SchemaRegistry::new()
        .with(EntitySchema::new("b"))
        .unwrap()
        .with(EntitySchema::new("a"))
        .unwrap()
        .with(EntitySchema::new("c"))
        .unwrap();

    let keys: Vec<&str> = registry.data_keys().map(DataKey::as_str).collect();
    assert_eq!(keys, vec!["b", "a", "c"]);
    assert_eq!(registry.len(), 3);
}

#[test]
fn registry_rejects_duplicates() {
    let mut registry = SchemaRegistry::new();
    registry.register(EntitySchema::new("users")).unwrap();
    let err = registry.register(EntitySchema::new("users")).unwrap_err();
    assert!(matches!(err, ModelError::DuplicateEntityType(k) if k == key("users")));
}

#[test]
fn registry_lookups() {
    let registry = SchemaRegistry::new()
        .with(EntitySchema::new("users").with_record_key("uid"))
        .unwrap()
        .with(EntitySchema::new("posts").with_relation("author", "users"))
        .unwrap();

    assert_eq!(registry.record_key(&key("users")), "uid");
    assert_eq!(registry.record_key(&key("unknown")), "id");
    assert_eq!(registry.relations(&key("posts")).len(), 1);
    assert!(registry.relations(&key("unknown")).is_empty());
    assert!(registry.schema(&key("posts")).is_ok());
    assert!(matches!(
        registry.schema(&key("nope")),
        Err(ModelError::UnknownEntityType(_))
    ));
}

#[test]
fn registry_json_roundtrip_keeps_order() {
    let json = r#"[
        {"data_key": "posts", "relations": {"author": "users"}},
        {"data_key": "users", "record_key": "uid"}
    ]"#;
    let registry = SchemaRegistry::from_json(json).unwrap();
    let keys: Vec<&str> = registry.data_keys().map(DataKey::as_str).collect();
    assert_eq!(keys, vec!["posts", "users"]);

    let back = serde_json::to_string(&registry).unwrap();
    let again = SchemaRegistry::from_json(&back).unwrap();
    assert_eq!(again, registry);
}

#[test]
fn registry_json_rejects_duplicates() {
    let json = r#"[{"data_key": "a"}, {"data_key": "a"}]"#;
    assert!(SchemaRegistry::from_json(json).is_err());
}

#[test]
fn dangling_relations_are_reported() {
    let registry = SchemaRegistry::new()
        .with(EntitySchema::new("posts").with_relation("author", "users"))
        .unwrap();

    let dangling = registry.dangling_relations();
    assert_eq!(dangling, vec![(&key("posts"), "author", &key("users"))]);
}
