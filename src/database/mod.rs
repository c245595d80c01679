// Database module
// SQLite for the document catalog, LanceDB for the persisted vector indexes

pub mod lancedb;
pub mod sqlite;

pub use self::lancedb::{INDEX_KEY_SUFFIX, IndexStore, index_key_for, validate_index_key};
pub use sqlite::*;
