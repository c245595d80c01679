use super::*;
use tempfile::TempDir;

async fn create_test_store() -> (IndexStore, TempDir) {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let store = IndexStore::open(&temp_dir.path().join("indexes"))
        .await
        .expect("should open index store");
    (store, temp_dir)
}

fn create_test_index(model: &str, count: usize) -> VectorIndex {
    let entries = (0..count)
        .map(|ordinal| {
            let mut vector = vec![0.1, 0.2, 0.3, 0.4, 0.5];
            for (i, value) in vector.iter_mut().enumerate() {
                *value += (ordinal as f32).mul_add(0.01, i as f32 * 0.001);
            }
            IndexedChunk {
                chunk: Chunk {
                    content: format!("This is test content for chunk {ordinal}"),
                    ordinal,
                },
                vector,
            }
        })
        .collect();
    VectorIndex::new(model, entries).expect("index should build")
}

#[tokio::test]
async fn save_and_load_round_trip() {
    let (store, _temp_dir) = create_test_store().await;
    let index = create_test_index("test-model", 12);

    store
        .save(&index, "report_index")
        .await
        .expect("should save index");
    let loaded = store.load("report_index").await.expect("should load index");

    assert_eq!(loaded, index);
    assert_eq!(loaded.embedding_model(), "test-model");
    assert_eq!(loaded.dimension(), 5);

    let query = [0.15, 0.25, 0.35, 0.45, 0.55];
    let expected = index.search(&query, 5).expect("search should succeed");
    let actual = loaded.search(&query, 5).expect("search should succeed");
    assert_eq!(actual, expected);
}

#[tokio::test]
async fn save_overwrites_existing_index() {
    let (store, _temp_dir) = create_test_store().await;

    store
        .save(&create_test_index("old-model", 8), "doc_index")
        .await
        .expect("should save first index");
    let replacement = create_test_index("new-model", 3);
    store
        .save(&replacement, "doc_index")
        .await
        .expect("should save replacement");

    let loaded = store.load("doc_index").await.expect("should load index");
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded.embedding_model(), "new-model");
}

#[tokio::test]
async fn load_missing_index_is_not_found() {
    let (store, _temp_dir) = create_test_store().await;

    let result = store.load("missing_index").await;

    assert!(matches!(result, Err(AnalystError::IndexNotFound(ref key)) if key == "missing_index"));
}

#[tokio::test]
async fn delete_removes_index() {
    let (store, _temp_dir) = create_test_store().await;
    store
        .save(&create_test_index("test-model", 2), "doc_index")
        .await
        .expect("should save index");
    assert!(store.exists("doc_index").await.expect("should check"));

    store.delete("doc_index").await.expect("should delete index");

    assert!(!store.exists("doc_index").await.expect("should check"));
    assert!(matches!(
        store.load("doc_index").await,
        Err(AnalystError::IndexNotFound(_))
    ));
}

#[tokio::test]
async fn delete_missing_index_is_a_no_op() {
    let (store, _temp_dir) = create_test_store().await;

    store
        .delete("never_saved_index")
        .await
        .expect("deleting a missing index should succeed");
}

#[tokio::test]
async fn invalid_keys_are_rejected() {
    let (store, _temp_dir) = create_test_store().await;
    let index = create_test_index("test-model", 1);

    assert!(matches!(
        store.save(&index, "../outside").await,
        Err(AnalystError::InvalidIndexKey(_))
    ));
    assert!(matches!(
        store.load("bad key").await,
        Err(AnalystError::InvalidIndexKey(_))
    ));
    assert!(matches!(
        store.delete("").await,
        Err(AnalystError::InvalidIndexKey(_))
    ));
}

#[tokio::test]
async fn list_keys_is_sorted() {
    let (store, _temp_dir) = create_test_store().await;
    let index = create_test_index("test-model", 1);

    for key in ["zeta_index", "alpha_index", "mid_index"] {
        store.save(&index, key).await.expect("should save index");
    }

    let keys = store.list_keys().await.expect("should list keys");
    assert_eq!(keys, vec!["alpha_index", "mid_index", "zeta_index"]);
}

#[tokio::test]
async fn empty_index_round_trips_as_empty() {
    let (store, _temp_dir) = create_test_store().await;

    store
        .save(&VectorIndex::empty("test-model"), "empty_index")
        .await
        .expect("should save empty index");
    let loaded = store.load("empty_index").await.expect("should load index");

    assert!(loaded.is_empty());
    assert_eq!(loaded.embedding_model(), "test-model");
    assert!(loaded.search(&[1.0], 15).expect("search should succeed").is_empty());
}

#[tokio::test]
async fn failed_save_keeps_previous_index() {
    let (store, _temp_dir) = create_test_store().await;
    let original = create_test_index("test-model", 4);
    store
        .save(&original, "doc_index")
        .await
        .expect("should save original index");

    let unstorable = VectorIndex::new(
        "test-model",
        vec![IndexedChunk {
            chunk: Chunk {
                content: "ordinal does not fit the ordinal column".to_string(),
                ordinal: u32::MAX as usize + 1,
            },
            vector: vec![0.1, 0.2, 0.3, 0.4, 0.5],
        }],
    )
    .expect("index should build");

    let result = store.save(&unstorable, "doc_index").await;
    assert!(matches!(result, Err(AnalystError::Database(_))));

    let loaded = store.load("doc_index").await.expect("should load index");
    assert_eq!(loaded, original);
}

#[tokio::test]
async fn empty_index_replaces_populated_one() {
    let (store, _temp_dir) = create_test_store().await;
    store
        .save(&create_test_index("old-model", 6), "doc_index")
        .await
        .expect("should save populated index");

    store
        .save(&VectorIndex::empty("new-model"), "doc_index")
        .await
        .expect("should save empty index");

    let loaded = store.load("doc_index").await.expect("should load index");
    assert!(loaded.is_empty());
    assert_eq!(loaded.embedding_model(), "new-model");
}

#[tokio::test]
async fn indexes_survive_reopening() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let root = temp_dir.path().join("indexes");
    let index = create_test_index("test-model", 4);

    {
        let store = IndexStore::open(&root).await.expect("should open store");
        store.save(&index, "doc_index").await.expect("should save index");
    }

    let reopened = IndexStore::open(&root).await.expect("should reopen store");
    assert_eq!(reopened.root(), root.as_path());
    let loaded = reopened.load("doc_index").await.expect("should load index");
    assert_eq!(loaded, index);
}
