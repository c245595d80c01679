use chrono::Utc;

use super::*;

fn document() -> Document {
    Document {
        id: 1,
        name: "Ferrari Case.txt".to_string(),
        index_key: "Ferrari_Case_index".to_string(),
        source_path: "/tmp/Ferrari Case.txt".to_string(),
        source_bytes: 2560,
        text_chars: 2400,
        chunk_count: 3,
        embedding_model: "all-minilm:latest".to_string(),
        embedding_dimension: 384,
        indexed_date: Utc::now().naive_utc(),
    }
}

#[test]
fn source_size_in_kilobytes() {
    let document = document();
    assert!((document.source_kilobytes() - 2.5).abs() < f64::EPSILON);
}

#[test]
fn matches_name_or_key() {
    let document = document();

    assert!(document.matches("Ferrari Case.txt"));
    assert!(document.matches("Ferrari_Case_index"));
    assert!(!document.matches("Ferrari Case"));
}

#[test]
fn document_serialization() {
    let original = document();

    let json = serde_json::to_string(&original).expect("can serialize json");
    let parsed: Document = serde_json::from_str(&json).expect("can parse json");

    assert_eq!(parsed, original);
}
