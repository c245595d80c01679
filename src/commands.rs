use anyhow::{Context, Result, bail};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::{info, warn};

use crate::answer::{AnswerOutcome, AnswerPipeline};
use crate::config::Config;
use crate::database::sqlite::{Database, NewDocument};
use crate::database::{IndexStore, index_key_for, validate_index_key};
use crate::embeddings::OllamaClient;
use crate::extractor::extractor_for;
use crate::indexer::{Indexer, IndexingStage};
use crate::retrieval::RetrievalMode;

fn load_config() -> Result<Config> {
    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn ingest_progress_bar() -> Result<ProgressBar> {
    if !console::user_attended_stderr() {
        return Ok(ProgressBar::hidden());
    }

    let style = ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}% {msg}")
        .context("Invalid progress bar template")?;
    Ok(ProgressBar::new(100).with_style(style))
}

/// Resolve a document given by catalog name or index key to its index key
async fn resolve_index_key(database: &Database, store: &IndexStore, document: &str) -> Result<String> {
    if let Some(entry) = database.find_document(document).await? {
        return Ok(entry.index_key);
    }

    // Indexes without a catalog entry can still be addressed by key or file name
    let candidates = [document.to_string(), index_key_for(document)];
    for candidate in candidates {
        if validate_index_key(&candidate).is_ok() && store.exists(&candidate).await? {
            return Ok(candidate);
        }
    }

    bail!(
        "Document not found: {}. Use 'case-analyst list' to see ingested documents.",
        document
    )
}

/// Extract, chunk, embed and persist a document, then record it in the catalog
#[inline]
pub async fn ingest_document(path: &Path, name: Option<String>) -> Result<()> {
    let config = load_config()?;
    let database = Database::initialize(&config).await?;
    let extractor = extractor_for(path)?;

    let name = match name {
        Some(name) => name,
        None => path
            .file_name()
            .map(|file_name| file_name.to_string_lossy().into_owned())
            .with_context(|| format!("Not a file path: {}", path.display()))?,
    };
    let index_key = index_key_for(&name);
    validate_index_key(&index_key)?;

    info!("Ingesting {} as {}", path.display(), index_key);

    let bar = ingest_progress_bar()?;
    bar.set_message("Extracting text...");

    let text = match extractor.extract(path) {
        Ok(text) => text,
        Err(e) => {
            bar.abandon_with_message("Extraction failed");
            return Err(e.into());
        }
    };
    let source_bytes = std::fs::metadata(path)
        .with_context(|| format!("Failed to read metadata for {}", path.display()))?
        .len();

    bar.set_position(33);
    bar.set_message("Extraction complete. Chunking and embedding...");

    let indexer = Indexer::from_config(&config).await?;
    let result = indexer
        .build_and_persist_with_progress(&text, &index_key, |stage| match stage {
            IndexingStage::Chunked { chunk_count } => {
                bar.set_position(66);
                bar.set_message(format!("{chunk_count} chunks generated. Indexing..."));
            }
            IndexingStage::Embedded { .. } => {
                bar.set_message("Saving index...");
            }
            IndexingStage::Persisted => {
                bar.set_position(100);
                bar.set_message("Indexing complete!");
            }
        })
        .await;

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            bar.abandon_with_message("Indexing failed");
            return Err(e.into());
        }
    };
    bar.finish();

    database
        .record_document(NewDocument {
            name: name.clone(),
            index_key: summary.index_key.clone(),
            source_path: path.display().to_string(),
            source_bytes: i64::try_from(source_bytes).context("Source file is too large")?,
            text_chars: i64::try_from(summary.text_chars).context("Document is too large")?,
            chunk_count: i64::try_from(summary.chunk_count).context("Too many chunks")?,
            embedding_model: summary.embedding_model.clone(),
            embedding_dimension: i64::try_from(summary.dimension)
                .context("Embedding dimension is too large")?,
        })
        .await?;

    println!(
        "{}",
        style(format!(
            "✓ Successfully created {} text chunks",
            summary.chunk_count
        ))
        .green()
    );
    println!("   Document: {}", name);
    println!("   Index: {}", summary.index_key);
    println!(
        "   Model: {} ({} dimensions)",
        summary.embedding_model, summary.dimension
    );
    println!();
    println!("Ask a question with: case-analyst ask \"{}\" \"<question>\"", name);

    Ok(())
}

/// Answer a question about an ingested document
#[inline]
pub async fn ask_question(document: &str, question: &str, show_sources: bool) -> Result<()> {
    if question.trim().is_empty() {
        bail!("Question cannot be empty");
    }

    let config = load_config()?;
    let database = Database::initialize(&config).await?;
    let pipeline = AnswerPipeline::from_config(&config).await?;
    let store = IndexStore::new(&config).await?;
    let index_key = resolve_index_key(&database, &store, document).await?;

    let record = pipeline.answer(&index_key, question).await?;

    println!("{}", style("🧠 Answer").bold().cyan());
    println!("{}", record.answer);

    match record.outcome {
        AnswerOutcome::Answered | AnswerOutcome::NoChunksRetrieved => {}
        AnswerOutcome::InsufficientContext => {
            println!();
            println!(
                "{}",
                style("The document does not appear to cover this question.").yellow()
            );
        }
        AnswerOutcome::EmptyOutput | AnswerOutcome::GenerationFailed => {
            warn!("Answer generation did not complete: {}", record.outcome);
        }
    }

    if record.mode == RetrievalMode::Fallback {
        println!();
        println!(
            "{}",
            style("Note: few passages matched the full question; results come from a keyword search.")
                .dim()
        );
    }

    if show_sources {
        println!();
        println!(
            "{}",
            style(format!(
                "📄 Retrieved Chunks ({})",
                record.supporting_chunks.len()
            ))
            .bold()
            .cyan()
        );
        for (i, chunk) in record.supporting_chunks.iter().enumerate() {
            println!();
            println!("{}", style(format!("Chunk {}", i + 1)).bold());
            println!("{}", chunk.content);
        }
    }

    Ok(())
}

/// List ingested documents and any stored indexes missing from the catalog
#[inline]
pub async fn list_documents() -> Result<()> {
    let config = load_config()?;
    let database = Database::initialize(&config).await?;
    let store = IndexStore::new(&config).await?;

    let documents = database.list_documents().await?;
    let keys = store.list_keys().await?;

    if documents.is_empty() && keys.is_empty() {
        println!("No documents have been ingested yet.");
        println!("Use 'case-analyst ingest <path>' to add one.");
        return Ok(());
    }

    println!("Documents ({} total):", documents.len());
    println!();

    for document in &documents {
        let indexed = keys.contains(&document.index_key);
        println!("📄 {}", document.name);
        println!("   Index: {}", document.index_key);
        println!("   Source: {} ({:.1} KB)", document.source_path, document.source_kilobytes());
        println!(
            "   Chunks: {} ({} characters)",
            document.chunk_count, document.text_chars
        );
        println!(
            "   Model: {} ({} dimensions)",
            document.embedding_model, document.embedding_dimension
        );
        println!("   Indexed: {}", document.indexed_date.format("%Y-%m-%d %H:%M:%S"));
        if !indexed {
            println!("   {}", style("⚠ Index missing from storage, re-ingest to rebuild").yellow());
        }
        println!();
    }

    let untracked: Vec<&String> = keys
        .iter()
        .filter(|key| !documents.iter().any(|document| &document.index_key == *key))
        .collect();
    if !untracked.is_empty() {
        println!("Indexes without a catalog entry:");
        for key in untracked {
            println!("   • {}", key);
        }
    }

    Ok(())
}

/// Delete a document's index and catalog entry
#[inline]
pub async fn delete_document(document: &str) -> Result<()> {
    let config = load_config()?;
    let database = Database::initialize(&config).await?;
    let store = IndexStore::new(&config).await?;
    let index_key = resolve_index_key(&database, &store, document).await?;

    let indexer = Indexer::from_config(&config).await?;
    indexer.delete_index(&index_key).await?;
    let had_entry = database.delete_document(&index_key).await?;

    info!("Deleted index {}", index_key);
    println!("✓ Index deleted: {}", index_key);
    if had_entry {
        println!("✓ Catalog entry deleted");
    }

    Ok(())
}

/// Show configuration, embedding service health and storage statistics
#[inline]
pub async fn show_status() -> Result<()> {
    let config = Config::load().unwrap_or_default();

    println!("📊 Case Analyst Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("⚙️  Configuration:");
    println!("   Directory: {}", config.get_base_dir().display());
    println!(
        "   Chunking: {} characters, {} overlap",
        config.chunking.chunk_size, config.chunking.chunk_overlap
    );
    println!(
        "   Retrieval: top {} (fallback below {})",
        config.retrieval.top_k, config.retrieval.fallback_min_results
    );
    println!(
        "   Generation: {} via {}",
        config.generation.model, config.generation.provider
    );
    println!();

    println!("🤖 Embedding Service:");
    match OllamaClient::new(&config.ollama) {
        Ok(client) => match client.health_check() {
            Ok(()) => {
                println!(
                    "   ✅ Ollama: Connected ({}:{})",
                    config.ollama.host, config.ollama.port
                );
                println!("   📋 Model: {}", config.ollama.model);
                println!("   🔢 Batch Size: {}", config.ollama.batch_size);
            }
            Err(e) => {
                println!("   ⚠️  Ollama: Unavailable - {}", e);
            }
        },
        Err(e) => {
            println!("   ❌ Ollama: Invalid configuration - {}", e);
        }
    }
    println!();

    println!("🗄️  Storage:");
    match Database::initialize(&config).await {
        Ok(database) => match database.count_documents().await {
            Ok(count) => println!("   ✅ Catalog: {} documents", count),
            Err(e) => println!("   ❌ Catalog: Failed to count documents - {}", e),
        },
        Err(e) => println!("   ❌ Catalog: Failed to open - {}", e),
    }
    match IndexStore::new(&config).await {
        Ok(store) => match store.list_keys().await {
            Ok(keys) => println!("   ✅ Indexes: {} stored", keys.len()),
            Err(e) => println!("   ❌ Indexes: Failed to list - {}", e),
        },
        Err(e) => println!("   ❌ Indexes: Failed to open - {}", e),
    }

    println!();
    println!("💡 Next Steps:");
    println!("   • Use 'case-analyst ingest <path>' to index a document");
    println!("   • Use 'case-analyst ask <document> <question>' to query it");

    Ok(())
}
