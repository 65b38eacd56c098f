//! In-memory vector index for development and testing

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::domain::embedding::{cosine_similarity, is_usable_vector};
use crate::domain::retrieval::{Chunk, Retriever, SearchParams};
use crate::domain::{DomainError, Embedder};

/// Passages embedded per provider call when indexing
const INDEX_BATCH_SIZE: usize = 64;
/// Embedding calls in flight while indexing
const INDEX_CONCURRENCY: usize = 4;

/// Brute-force cosine index over pre-chunked passages
#[derive(Debug)]
pub struct InMemoryRetriever {
    embedder: Arc<dyn Embedder>,
    chunks: Arc<RwLock<Vec<Chunk>>>,
}

impl InMemoryRetriever {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            chunks: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Load a JSON array of chunks and index them
    pub async fn load(embedder: Arc<dyn Embedder>, path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            DomainError::configuration(format!("Failed to read index {}: {}", path.display(), e))
        })?;
        let chunks: Vec<Chunk> = serde_json::from_str(&raw).map_err(|e| {
            DomainError::configuration(format!("Invalid index file {}: {}", path.display(), e))
        })?;

        let retriever = Self::new(embedder);
        let count = retriever.add_chunks(chunks).await?;
        info!(path = %path.display(), chunks = count, "Loaded in-memory index");

        Ok(retriever)
    }

    /// Add chunks, embedding those that arrive without a vector
    pub async fn add_chunks(&self, mut chunks: Vec<Chunk>) -> Result<usize, DomainError> {
        let missing: Vec<usize> = chunks
            .iter()
            .enumerate()
            .filter(|(_, chunk)| chunk.embedding.as_ref().is_none_or(|v| v.is_empty()))
            .map(|(i, _)| i)
            .collect();

        let batches: Vec<(Vec<usize>, Vec<String>)> = missing
            .chunks(INDEX_BATCH_SIZE)
            .map(|batch| {
                let texts = batch.iter().map(|&i| chunks[i].content.clone()).collect();
                (batch.to_vec(), texts)
            })
            .collect();

        let embedded: Vec<(Vec<usize>, Vec<Vec<f32>>)> = stream::iter(batches)
            .map(|(indices, texts)| async move {
                let vectors = self.embedder.embed_batch(&texts).await?;
                Ok::<_, DomainError>((indices, vectors))
            })
            .buffered(INDEX_CONCURRENCY)
            .try_collect()
            .await?;

        for (indices, vectors) in embedded {
            for (i, vector) in indices.into_iter().zip(vectors) {
                chunks[i].embedding = Some(vector);
            }
        }
        debug!(embedded = missing.len(), total = chunks.len(), "Indexed chunks");

        let count = chunks.len();
        self.chunks.write().await.extend(chunks);
        Ok(count)
    }

    pub async fn len(&self) -> usize {
        self.chunks.read().await.len()
    }
}

#[async_trait]
impl Retriever for InMemoryRetriever {
    async fn search(&self, params: SearchParams) -> Result<Vec<Chunk>, DomainError> {
        let query_vector = self
            .embedder
            .embed(&params.query)
            .await
            .map_err(|e| DomainError::retrieval(format!("Failed to embed query: {}", e)))?;

        let chunks = self.chunks.read().await;

        let mut scored: Vec<(f32, &Chunk)> = chunks
            .iter()
            .filter(|chunk| {
                params
                    .filter
                    .as_ref()
                    .is_none_or(|filter| filter.matches(&chunk.metadata))
            })
            .map(|chunk| {
                let score = match chunk.embedding() {
                    Some(vector) if is_usable_vector(&query_vector, vector) => {
                        cosine_similarity(&query_vector, vector)
                    }
                    _ => 0.0,
                };
                (score, chunk)
            })
            .collect();

        // Stable: equal scores keep index order
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(params.top_k)
            .map(|(score, chunk)| chunk.clone().with_retrieval_score(score))
            .collect())
    }

    fn retriever_name(&self) -> &'static str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::MockEmbedder;
    use crate::domain::retrieval::FilterBuilder;
    use serde_json::json;

    fn embedder() -> Arc<dyn Embedder> {
        Arc::new(
            MockEmbedder::new(2)
                .with_vector("sleep question", vec![1.0, 0.0])
                .with_vector("unembedded passage", vec![0.0, 1.0]),
        )
    }

    async fn seeded() -> InMemoryRetriever {
        let retriever = InMemoryRetriever::new(embedder());
        retriever
            .add_chunks(vec![
                Chunk::new("a", "paper-1", "sleep and mortality")
                    .with_embedding(vec![1.0, 0.1])
                    .with_metadata("study_type", json!("rct")),
                Chunk::new("b", "paper-2", "sleep duration cohort")
                    .with_embedding(vec![0.9, 0.4])
                    .with_metadata("study_type", json!("observational")),
                Chunk::new("c", "paper-3", "unembedded passage"),
            ])
            .await
            .unwrap();
        retriever
    }

    #[tokio::test]
    async fn test_search_orders_by_cosine() {
        let retriever = seeded().await;

        let results = retriever
            .search(SearchParams::new("sleep question", 3))
            .await
            .unwrap();

        let ids: Vec<&str> = results.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(results[0].retrieval_score > results[1].retrieval_score);
        assert_eq!(results[2].embedding(), Some(&[0.0, 1.0][..]));
    }

    #[tokio::test]
    async fn test_search_applies_filter_and_top_k() {
        let retriever = seeded().await;

        let filter = FilterBuilder::new().eq("study_type", "observational").build();
        let results = retriever
            .search(SearchParams::new("sleep question", 5).with_filter(filter))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "b");

        let top_one = retriever
            .search(SearchParams::new("sleep question", 1))
            .await
            .unwrap();
        assert_eq!(top_one.len(), 1);
    }

    #[tokio::test]
    async fn test_query_embedding_failure_is_retrieval_error() {
        let retriever = InMemoryRetriever::new(Arc::new(MockEmbedder::new(2).with_error("down")));

        let result = retriever.search(SearchParams::new("q", 3)).await;

        assert!(matches!(result, Err(DomainError::Retrieval { .. })));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("evidence-rag-index-{}.json", uuid::Uuid::new_v4()));
        let index = json!([
            {"id": "a", "document_id": "d1", "content": "sleep question", "metadata": {"topic": ["sleep"]}},
            {"id": "b", "document_id": "d2", "content": "other", "embedding": [0.0, 1.0]}
        ]);
        tokio::fs::write(&path, index.to_string()).await.unwrap();

        let retriever = InMemoryRetriever::load(embedder(), &path).await.unwrap();
        let _ = tokio::fs::remove_file(&path).await;

        assert_eq!(retriever.len().await, 2);
        let results = retriever
            .search(SearchParams::new("sleep question", 1))
            .await
            .unwrap();
        assert_eq!(results[0].id, "a");
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let result = InMemoryRetriever::load(embedder(), "/nonexistent/index.json").await;
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }
}
