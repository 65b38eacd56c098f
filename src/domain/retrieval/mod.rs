//! Retrieval domain - chunks, queries, metadata filters and the retriever seam

mod chunk;
mod filter;
mod query;
mod retriever;

pub use chunk::Chunk;
pub use filter::{FilterBuilder, FilterCondition, FilterOperator, MetadataFilter};
pub use query::{Query, QueryHints};
pub use retriever::{Retriever, SearchParams};

#[cfg(test)]
pub use retriever::mock::MockRetriever;
