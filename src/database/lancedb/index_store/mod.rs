#[cfg(test)]
mod tests;

use arrow::array::{
    Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray, UInt32Array,
};
use arrow::datatypes::{DataType, SchemaRef};
use arrow::record_batch::RecordBatch;
use chrono::Utc;
use futures::TryStreamExt;
use lancedb::Connection;
use lancedb::database::CreateTableMode;
use lancedb::query::{ExecutableQuery, QueryBase};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{EMBEDDING_MODEL_METADATA_KEY, index_schema, validate_index_key};
use crate::config::Config;
use crate::embeddings::Chunk;
use crate::indexer::vector_index::{IndexedChunk, VectorIndex};
use crate::{AnalystError, Result};

/// Persists vector indexes as LanceDB tables, one table per index key.
///
/// Holds only the database connection; indexes are materialised on load.
#[derive(Clone)]
pub struct IndexStore {
    connection: Connection,
    root: PathBuf,
}

/// A row read back from an index table
struct StoredRow {
    ordinal: usize,
    content: String,
    embedding_model: String,
    vector: Vec<f32>,
}

impl IndexStore {
    /// Open the index store in the configured index directory
    #[inline]
    pub async fn new(config: &Config) -> Result<Self> {
        Self::open(&config.index_dir()).await
    }

    /// Open (creating if needed) an index store rooted at `root`
    #[inline]
    pub async fn open(root: &Path) -> Result<Self> {
        debug!("Opening index store at {:?}", root);

        std::fs::create_dir_all(root).map_err(|e| {
            AnalystError::Database(format!("Failed to create index directory: {e}"))
        })?;

        let uri = format!("file://{}", root.display());
        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| AnalystError::Database(format!("Failed to connect to LanceDB: {e}")))?;

        Ok(Self {
            connection,
            root: root.to_path_buf(),
        })
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist `index` under `key`, replacing any index already stored there.
    ///
    /// The record batch is built before storage is touched and the table is
    /// written in a single overwrite, so a failed save leaves the previous
    /// index in place.
    #[inline]
    pub async fn save(&self, index: &VectorIndex, key: &str) -> Result<()> {
        validate_index_key(key)?;

        let vector_dim = i32::try_from(index.dimension().max(1)).map_err(|_| {
            AnalystError::Database(format!(
                "Vector dimension {} is too large",
                index.dimension()
            ))
        })?;
        let schema = index_schema(vector_dim, index.embedding_model());

        let batches = if index.is_empty() {
            Vec::new()
        } else {
            vec![create_record_batch(index, &schema)?]
        };
        let reader = RecordBatchIterator::new(batches.into_iter().map(Ok), schema);

        self.connection
            .create_table(key, reader)
            .mode(CreateTableMode::Overwrite)
            .execute()
            .await
            .map_err(|e| AnalystError::Database(format!("Failed to write index {key}: {e}")))?;

        info!("Saved index {} ({} chunks)", key, index.len());
        Ok(())
    }

    /// Load the index stored under `key`
    #[inline]
    pub async fn load(&self, key: &str) -> Result<VectorIndex> {
        validate_index_key(key)?;

        if !self.exists(key).await? {
            return Err(AnalystError::IndexNotFound(key.to_string()));
        }

        let table = self
            .connection
            .open_table(key)
            .execute()
            .await
            .map_err(|e| AnalystError::Database(format!("Failed to open index {key}: {e}")))?;

        let count = table
            .count_rows(None)
            .await
            .map_err(|e| AnalystError::Database(format!("Failed to count rows: {e}")))?;

        let schema = table
            .schema()
            .await
            .map_err(|e| AnalystError::Database(format!("Failed to read schema of {key}: {e}")))?;
        let recorded_model = schema.metadata().get(EMBEDDING_MODEL_METADATA_KEY).cloned();

        if count == 0 {
            debug!("Index {} is empty", key);
            return Ok(VectorIndex::empty(recorded_model.unwrap_or_default()));
        }

        let mut stream = table
            .query()
            .limit(count)
            .execute()
            .await
            .map_err(|e| AnalystError::Database(format!("Failed to read index {key}: {e}")))?;

        let mut rows = Vec::with_capacity(count);
        while let Some(batch) = stream
            .try_next()
            .await
            .map_err(|e| AnalystError::Database(format!("Failed to read result stream: {e}")))?
        {
            rows.extend(parse_batch(&batch)?);
        }

        rows.sort_by_key(|row| row.ordinal);

        let embedding_model = recorded_model
            .or_else(|| rows.first().map(|row| row.embedding_model.clone()))
            .unwrap_or_default();

        if let Some(row) = rows.iter().find(|row| row.embedding_model != embedding_model) {
            return Err(AnalystError::Database(format!(
                "Index {key} mixes embedding models: {embedding_model} and {}",
                row.embedding_model
            )));
        }

        let entries = rows
            .into_iter()
            .map(|row| IndexedChunk {
                chunk: Chunk {
                    content: row.content,
                    ordinal: row.ordinal,
                },
                vector: row.vector,
            })
            .collect();

        let index = VectorIndex::new(embedding_model, entries)?;
        debug!("Loaded index {} ({} chunks)", key, index.len());
        Ok(index)
    }

    /// Remove the index stored under `key`; succeeds when there is none
    #[inline]
    pub async fn delete(&self, key: &str) -> Result<()> {
        validate_index_key(key)?;

        if self.exists(key).await? {
            self.drop_table(key).await?;
            info!("Deleted index {}", key);
        } else {
            debug!("No index stored under {}, nothing to delete", key);
        }

        Ok(())
    }

    #[inline]
    pub async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.list_keys().await?.iter().any(|name| name == key))
    }

    /// Keys of every stored index, sorted
    #[inline]
    pub async fn list_keys(&self) -> Result<Vec<String>> {
        let mut names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| AnalystError::Database(format!("Failed to list tables: {e}")))?;
        names.sort();
        Ok(names)
    }

    async fn drop_table(&self, key: &str) -> Result<()> {
        self.connection
            .drop_table(key)
            .await
            .map_err(|e| AnalystError::Database(format!("Failed to drop table {key}: {e}")))
    }
}

fn create_record_batch(index: &VectorIndex, schema: &SchemaRef) -> Result<RecordBatch> {
    let len = index.len();
    let created_at = Utc::now().to_rfc3339();

    let mut ids = Vec::with_capacity(len);
    let mut ordinals = Vec::with_capacity(len);
    let mut contents = Vec::with_capacity(len);
    let mut flat_values = Vec::with_capacity(len * index.dimension());

    for entry in index.entries() {
        ids.push(Uuid::new_v4().to_string());
        ordinals.push(u32::try_from(entry.chunk.ordinal).map_err(|_| {
            AnalystError::Database(format!("Chunk ordinal {} is too large", entry.chunk.ordinal))
        })?);
        contents.push(entry.chunk.content.as_str());
        flat_values.extend_from_slice(&entry.vector);
    }

    let (field, vector_dim) = match schema.field_with_name("vector").map(|f| f.data_type()) {
        Ok(DataType::FixedSizeList(field, dim)) => (Arc::clone(field), *dim),
        _ => {
            return Err(AnalystError::Database(
                "Index schema has no fixed-size vector column".to_string(),
            ));
        }
    };
    let vector_array = FixedSizeListArray::try_new(
        field,
        vector_dim,
        Arc::new(Float32Array::from(flat_values)),
        None,
    )
    .map_err(|e| AnalystError::Database(format!("Failed to create vector array: {e}")))?;

    let arrays: Vec<Arc<dyn Array>> = vec![
        Arc::new(StringArray::from(ids)),
        Arc::new(vector_array),
        Arc::new(UInt32Array::from(ordinals)),
        Arc::new(StringArray::from(contents)),
        Arc::new(StringArray::from(vec![index.embedding_model(); len])),
        Arc::new(StringArray::from(vec![created_at.as_str(); len])),
    ];

    RecordBatch::try_new(Arc::clone(schema), arrays)
        .map_err(|e| AnalystError::Database(format!("Failed to create record batch: {e}")))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| AnalystError::Database(format!("Missing {name} column")))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| AnalystError::Database(format!("Invalid {name} column type")))
}

fn parse_batch(batch: &RecordBatch) -> Result<Vec<StoredRow>> {
    let contents = string_column(batch, "content")?;
    let models = string_column(batch, "embedding_model")?;

    let ordinals = batch
        .column_by_name("ordinal")
        .ok_or_else(|| AnalystError::Database("Missing ordinal column".to_string()))?
        .as_any()
        .downcast_ref::<UInt32Array>()
        .ok_or_else(|| AnalystError::Database("Invalid ordinal column type".to_string()))?;

    let vectors = batch
        .column_by_name("vector")
        .ok_or_else(|| AnalystError::Database("Missing vector column".to_string()))?
        .as_any()
        .downcast_ref::<FixedSizeListArray>()
        .ok_or_else(|| AnalystError::Database("Invalid vector column type".to_string()))?;

    (0..batch.num_rows())
        .map(|row| {
            let values = vectors.value(row);
            let vector = values
                .as_any()
                .downcast_ref::<Float32Array>()
                .ok_or_else(|| AnalystError::Database("Invalid vector value type".to_string()))?
                .values()
                .to_vec();

            Ok(StoredRow {
                ordinal: ordinals.value(row) as usize,
                content: contents.value(row).to_string(),
                embedding_model: models.value(row).to_string(),
                vector,
            })
        })
        .collect()
}
