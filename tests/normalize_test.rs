//! The three historical gratitude shapes must normalize to the same
//! rendered text without errors.

mod helpers;

use helpers::{insert_entry, test_db, test_embedding};
use memoir::journal::normalize;
use memoir::journal::scan;
use rusqlite::params;

/// Overwrite the stored gratitude column with a raw legacy payload.
fn set_gratitude(conn: &rusqlite::Connection, id: &str, raw: &str) {
    conn.execute(
        "UPDATE journal_entries SET gratitude = ?1 WHERE id = ?2",
        params![raw, id],
    )
    .unwrap();
}

#[test]
fn all_three_shapes_render_identically() {
    let mut conn = test_db();
    let id_array = insert_entry(&mut conn, "2024-01-01", "a", "body", &test_embedding(0));
    let id_object = insert_entry(&mut conn, "2024-01-02", "b", "body", &test_embedding(1));
    let id_string = insert_entry(&mut conn, "2024-01-03", "c", "body", &test_embedding(2));

    set_gratitude(&conn, &id_array, r#"["a", "b"]"#);
    set_gratitude(&conn, &id_object, r#"{"0": "a", "1": "b"}"#);
    set_gratitude(&conn, &id_string, r#""a, b""#);

    let rendered: Vec<String> = [&id_array, &id_object, &id_string]
        .iter()
        .map(|id| {
            let entry = scan::get_entry(&conn, id).unwrap().unwrap();
            normalize::gratitude_text(&entry.gratitude)
        })
        .collect();

    assert_eq!(rendered[0], "a, b");
    assert_eq!(rendered[1], "a, b");
    assert_eq!(rendered[2], "a, b");
}

#[test]
fn unrecognized_gratitude_degrades_to_empty() {
    let mut conn = test_db();
    let id = insert_entry(&mut conn, "2024-01-01", "a", "body", &test_embedding(0));
    set_gratitude(&conn, &id, "42");

    let entry = scan::get_entry(&conn, &id).unwrap().unwrap();
    assert!(entry.gratitude.is_empty());
    assert_eq!(normalize::gratitude_text(&entry.gratitude), "none");
}

#[test]
fn unparseable_gratitude_column_degrades_to_empty() {
    let mut conn = test_db();
    let id = insert_entry(&mut conn, "2024-01-01", "a", "body", &test_embedding(0));
    set_gratitude(&conn, &id, "{truncated json");

    let entry = scan::get_entry(&conn, &id).unwrap().unwrap();
    assert!(entry.gratitude.is_empty());
}

#[test]
fn named_key_object_keeps_keys_as_prefixes() {
    let mut conn = test_db();
    let id = insert_entry(&mut conn, "2024-01-01", "a", "body", &test_embedding(0));
    set_gratitude(&conn, &id, r#"{"family": "dinner together", "work": "shipped v1"}"#);

    let entry = scan::get_entry(&conn, &id).unwrap().unwrap();
    assert_eq!(
        entry.gratitude,
        vec!["family: dinner together", "work: shipped v1"]
    );
}

#[test]
fn normalized_output_is_idempotent() {
    let items = vec!["a".to_string(), "b".to_string()];
    let as_value = serde_json::to_value(&items).unwrap();
    assert_eq!(normalize::normalize_gratitude("e1", &as_value), items);
}
