//! Tests for key encoding
//!
//! These tests verify:
//! - Key layout for each field
//! - Decoding of ids that contain the separator, prefix or field names
//! - Rejection of keys outside the namespace

use recordkv::config::Config;
use recordkv::keys::{Field, KeyCodec, RecordKey};

// =============================================================================
// Helper Functions
// =============================================================================

fn default_codec() -> KeyCodec {
    KeyCodec::new(&Config::default())
}

fn decoded(id: &str, field: Field) -> Option<RecordKey> {
    Some(RecordKey {
        id: id.to_string(),
        field,
    })
}

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_encode_default_layout() {
    let codec = default_codec();

    assert_eq!(codec.encode_key("42", Field::Data), "db_42_data");
    assert_eq!(codec.encode_key("42", Field::Created), "db_42_created");
    assert_eq!(codec.encode_key("42", Field::Modified), "db_42_modified");
}

#[test]
fn test_encode_custom_config() {
    let config = Config::builder()
        .prefix("app")
        .separator("::")
        .data_field_name("payload")
        .build();
    let codec = KeyCodec::new(&config);

    assert_eq!(
        codec.record_keys("user"),
        [
            "app::user::payload".to_string(),
            "app::user::created".to_string(),
            "app::user::modified".to_string(),
        ]
    );
}

// =============================================================================
// Decoding Tests
// =============================================================================

#[test]
fn test_decode_each_field() {
    let codec = default_codec();

    assert_eq!(codec.decode_key("db_a_data"), decoded("a", Field::Data));
    assert_eq!(codec.decode_key("db_a_created"), decoded("a", Field::Created));
    assert_eq!(codec.decode_key("db_a_modified"), decoded("a", Field::Modified));
}

#[test]
fn test_decode_id_containing_separator() {
    let codec = default_codec();

    assert_eq!(
        codec.decode_key("db_order_2024_01_modified"),
        decoded("order_2024_01", Field::Modified)
    );
}

#[test]
fn test_decode_id_containing_field_names_and_prefix() {
    let codec = default_codec();

    assert_eq!(
        codec.decode_key("db_db_modified_data"),
        decoded("db_modified", Field::Data)
    );
    assert_eq!(
        codec.decode_key("db_data_created_modified"),
        decoded("data_created", Field::Modified)
    );
}

#[test]
fn test_decode_rejects_foreign_keys() {
    let codec = default_codec();

    assert_eq!(codec.decode_key("theme"), None);
    assert_eq!(codec.decode_key("other_a_modified"), None);
    // Prefix text without the separator is not the namespace
    assert_eq!(codec.decode_key("dbx_a_modified"), None);
    // Prefix appearing mid-key is not the namespace either
    assert_eq!(codec.decode_key("cache_db_a_modified"), None);
}

#[test]
fn test_decode_rejects_unknown_field_and_empty_id() {
    let codec = default_codec();

    assert_eq!(codec.decode_key("db_a_size"), None);
    assert_eq!(codec.decode_key("db__data"), None);
    assert_eq!(codec.decode_key("db_data"), None);
}

#[test]
fn test_id_for_filters_by_field() {
    let codec = default_codec();

    assert_eq!(codec.id_for("db_a_modified", Field::Modified), Some("a".to_string()));
    assert_eq!(codec.id_for("db_a_modified", Field::Data), None);
}

#[test]
fn test_encode_decode_agree_with_custom_separator() {
    let config = Config::builder().prefix("p").separator("/").build();
    let codec = KeyCodec::new(&config);

    let key = codec.encode_key("a/b", Field::Created);
    assert_eq!(key, "p/a/b/created");
    assert_eq!(codec.decode_key(&key), decoded("a/b", Field::Created));
}
