//! Search-context nodes: ranked snippets from the active corpus
//!
//! No corpus, a pending corpus, or nothing to search for all give an empty
//! output rather than a failure.

use tracing::debug;

use crate::binding::{render, Escaping};
use crate::client::CorpusState;
use crate::graph::{Node, TextData};

use super::{NodeEnv, NodeFailure};

pub(super) async fn execute(
    node: &Node,
    data: &TextData,
    env: &NodeEnv<'_, '_>,
) -> Result<String, NodeFailure> {
    let (Some(corpus), Some(retriever)) = (
        env.collaborators.corpus.as_ref(),
        env.collaborators.retriever.as_ref(),
    ) else {
        debug!("no context retrieval configured");
        return Ok(String::new());
    };

    let item = match corpus.current().await {
        CorpusState::Ready(item) => item,
        CorpusState::Pending => {
            debug!("corpus resolution still pending");
            return Ok(String::new());
        }
        CorpusState::Unavailable => {
            debug!("no repository context available");
            return Ok(String::new());
        }
    };

    // combined parent outputs; the node's own text only when there are none
    let inputs = env.parent_outputs(&node.id);
    let query = if inputs.iter().any(|s| !s.is_empty()) {
        inputs.join("\n")
    } else {
        render(&data.common.content, &inputs, Escaping::None)
    };
    let query = query.trim();
    if query.is_empty() {
        return Ok(String::new());
    }

    let snippets = retriever
        .retrieve_context(std::slice::from_ref(&item), query, env.cancel)
        .await
        .map_err(|e| {
            if env.cancel.is_cancelled() {
                NodeFailure::cancelled("context retrieval aborted")
            } else {
                NodeFailure::transport(format!("'{}' ({}): {e}", node.title(), node.id))
            }
        })?;

    debug!(corpus = %item.name, snippets = snippets.len(), "context retrieved");
    Ok(snippets
        .iter()
        .map(|s| format!("{}\n{}", s.path, s.content))
        .collect::<Vec<_>>()
        .join("\n\n"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tokio_util::sync::CancellationToken;

    use super::super::test_support::Harness;
    use crate::client::{ContextRetriever, ContextSnippet, CorpusItem, CorpusResolver, CorpusState};
    use super::super::FailureKind;
    use crate::error::{FlowError, Result};
    use crate::graph::{Edge, Node};

    struct FixedCorpus(CorpusState);

    #[async_trait]
    impl CorpusResolver for FixedCorpus {
        async fn current(&self) -> CorpusState {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct Retriever {
        queries: Mutex<Vec<String>>,
        offline: bool,
    }

    #[async_trait]
    impl ContextRetriever for Retriever {
        async fn retrieve_context(
            &self,
            _corpus: &[CorpusItem],
            query: &str,
            _cancel: &CancellationToken,
        ) -> Result<Vec<ContextSnippet>> {
            self.queries.lock().push(query.to_string());
            if self.offline {
                return Err(FlowError::Retrieval("index offline".into()));
            }
            Ok(vec![
                ContextSnippet {
                    path: "src/a.rs".into(),
                    content: "fn a() {}".into(),
                },
                ContextSnippet {
                    path: "src/b.rs".into(),
                    content: "fn b() {}".into(),
                },
            ])
        }
    }

    fn ready() -> CorpusState {
        CorpusState::Ready(CorpusItem {
            name: "repo".into(),
            uri: "https://example.com/repo".into(),
        })
    }

    fn harness(state: CorpusState, retriever: &Arc<Retriever>) -> Harness {
        let mut h = Harness::new();
        h.collaborators = h
            .collaborators
            .clone()
            .with_retrieval(Arc::new(FixedCorpus(state)), retriever.clone());
        h
    }

    #[tokio::test]
    async fn formats_snippets_for_combined_input() {
        let retriever = Arc::new(Retriever::default());
        let mut h = harness(ready(), &retriever);
        h.edges = vec![Edge::new("e1", "q", "s")];
        h.record("q", " parse config \n");

        let out = h.run(&Node::search_context("s", "")).await.unwrap();
        assert_eq!(out, "src/a.rs\nfn a() {}\n\nsrc/b.rs\nfn b() {}");
        assert_eq!(*retriever.queries.lock(), vec!["parse config".to_string()]);
    }

    #[tokio::test]
    async fn pending_corpus_is_empty_output() {
        let retriever = Arc::new(Retriever::default());
        let h = harness(CorpusState::Pending, &retriever);

        let out = h.run(&Node::search_context("s", "query")).await.unwrap();
        assert_eq!(out, "");
        assert!(retriever.queries.lock().is_empty());
    }

    #[tokio::test]
    async fn unavailable_corpus_is_empty_output() {
        let retriever = Arc::new(Retriever::default());
        let h = harness(CorpusState::Unavailable, &retriever);
        assert_eq!(h.run(&Node::search_context("s", "query")).await.unwrap(), "");
    }

    #[tokio::test]
    async fn no_retrieval_configured_is_empty_output() {
        let h = Harness::new();
        assert_eq!(h.run(&Node::search_context("s", "query")).await.unwrap(), "");
    }

    #[tokio::test]
    async fn falls_back_to_node_text_without_parents() {
        let retriever = Arc::new(Retriever::default());
        let h = harness(ready(), &retriever);

        h.run(&Node::search_context("s", "  error handling  ")).await.unwrap();
        assert_eq!(*retriever.queries.lock(), vec!["error handling".to_string()]);
    }

    #[tokio::test]
    async fn retrieval_error_is_a_transport_failure() {
        let retriever = Arc::new(Retriever {
            offline: true,
            ..Default::default()
        });
        let h = harness(ready(), &retriever);

        let failure = h.run(&Node::search_context("s", "query")).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::Transport);
        assert!(failure.message.contains("FLOW-033"), "{}", failure.message);
        assert!(failure.message.contains("index offline"));
    }
}
