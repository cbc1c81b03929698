//! Context retrieval: the active corpus item and ranked snippets for a query

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// A repository or tree the retriever can search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusItem {
    pub name: String,
    /// Repository URL or tree root
    pub uri: String,
}

/// What the corpus resolver currently knows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusState {
    /// Resolution still in progress
    Pending,
    /// No repository context for this workspace
    Unavailable,
    Ready(CorpusItem),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSnippet {
    pub path: String,
    pub content: String,
}

#[async_trait]
pub trait CorpusResolver: Send + Sync {
    async fn current(&self) -> CorpusState;
}

#[async_trait]
pub trait ContextRetriever: Send + Sync {
    /// Ranked snippets for `query` across `corpus`, best first
    ///
    /// Backend failures are reported as `FlowError::Retrieval`.
    async fn retrieve_context(
        &self,
        corpus: &[CorpusItem],
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<ContextSnippet>>;
}
