//! Workflow data model: nodes, edges and the graph document
//!
//! Nodes are a sum type ([`NodeKind`]) so the orchestrator can dispatch
//! through one exhaustive match. On the wire a node keeps the flat
//! `{ id, type, data }` shape the editor produces.

use std::path::Path;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::{FlowError, Result};

// ═══════════════════════════════════════════════════════════════
// NODE PAYLOADS
// ═══════════════════════════════════════════════════════════════

/// Fields shared by every node kind
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeCommon {
    /// Display title (falls back to the node id)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    /// Command string, prompt template, or literal text
    #[serde(default)]
    pub content: String,
    /// `Some(false)` disables the node and everything downstream of it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    /// Per-node override of the run-level failure policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub halt_on_failure: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CliData {
    #[serde(flatten)]
    pub common: NodeCommon,
    #[serde(default)]
    pub needs_user_approval: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LlmData {
    #[serde(flatten)]
    pub common: NodeCommon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Prefer the configured fast model
    #[serde(default)]
    pub fast: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Payload for Preview, Input and SearchContext nodes
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TextData {
    #[serde(flatten)]
    pub common: NodeCommon,
}

// ═══════════════════════════════════════════════════════════════
// NODE
// ═══════════════════════════════════════════════════════════════

/// Node discriminant (no payload), used for config and logging
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    #[serde(alias = "CLI")]
    Cli,
    #[serde(alias = "LLM")]
    Llm,
    #[serde(alias = "Preview")]
    Preview,
    #[serde(alias = "Input")]
    Input,
    #[serde(alias = "SearchContext", alias = "search-context")]
    SearchContext,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Cli => "cli",
            NodeType::Llm => "llm",
            NodeType::Preview => "preview",
            NodeType::Input => "input",
            NodeType::SearchContext => "search_context",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node kind with its type-specific payload
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Cli(CliData),
    Llm(LlmData),
    Preview(TextData),
    Input(TextData),
    SearchContext(TextData),
}

/// A unit of work in the workflow graph
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawNode")]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
}

/// Wire shape: `{ id, type, data }`
#[derive(Deserialize)]
struct RawNode {
    id: String,
    #[serde(rename = "type")]
    node_type: NodeType,
    #[serde(default)]
    data: Value,
}

impl TryFrom<RawNode> for Node {
    type Error = serde_json::Error;

    fn try_from(raw: RawNode) -> std::result::Result<Self, Self::Error> {
        let data = match raw.data {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        let kind = match raw.node_type {
            NodeType::Cli => NodeKind::Cli(serde_json::from_value(data)?),
            NodeType::Llm => NodeKind::Llm(serde_json::from_value(data)?),
            NodeType::Preview => NodeKind::Preview(serde_json::from_value(data)?),
            NodeType::Input => NodeKind::Input(serde_json::from_value(data)?),
            NodeType::SearchContext => NodeKind::SearchContext(serde_json::from_value(data)?),
        };
        Ok(Node { id: raw.id, kind })
    }
}

/// Borrowed wire shape, so payload errors reach the caller's serializer
#[derive(Serialize)]
struct WireNode<'a, T> {
    id: &'a str,
    #[serde(rename = "type")]
    node_type: NodeType,
    data: &'a T,
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let id = self.id.as_str();
        let node_type = self.node_type();
        match &self.kind {
            NodeKind::Cli(data) => WireNode { id, node_type, data }.serialize(serializer),
            NodeKind::Llm(data) => WireNode { id, node_type, data }.serialize(serializer),
            NodeKind::Preview(data) | NodeKind::Input(data) | NodeKind::SearchContext(data) => {
                WireNode { id, node_type, data }.serialize(serializer)
            }
        }
    }
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    /// CLI node running `command`
    pub fn cli(id: impl Into<String>, command: impl Into<String>) -> Self {
        Self::new(
            id,
            NodeKind::Cli(CliData {
                common: NodeCommon::with_content(command),
                needs_user_approval: false,
            }),
        )
    }

    /// LLM node with a prompt template
    pub fn llm(id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::new(
            id,
            NodeKind::Llm(LlmData {
                common: NodeCommon::with_content(prompt),
                ..Default::default()
            }),
        )
    }

    pub fn preview(id: impl Into<String>) -> Self {
        Self::new(id, NodeKind::Preview(TextData::default()))
    }

    pub fn input(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(
            id,
            NodeKind::Input(TextData {
                common: NodeCommon::with_content(text),
            }),
        )
    }

    pub fn search_context(id: impl Into<String>, query: impl Into<String>) -> Self {
        Self::new(
            id,
            NodeKind::SearchContext(TextData {
                common: NodeCommon::with_content(query),
            }),
        )
    }

    /// Mark this node inactive
    pub fn inactive(mut self) -> Self {
        self.common_mut().active = Some(false);
        self
    }

    /// Require user approval (no-op for non-CLI nodes)
    pub fn with_approval(mut self) -> Self {
        if let NodeKind::Cli(data) = &mut self.kind {
            data.needs_user_approval = true;
        }
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.common_mut().title = title.into();
        self
    }

    pub fn with_halt_on_failure(mut self, halt: bool) -> Self {
        self.common_mut().halt_on_failure = Some(halt);
        self
    }

    pub fn node_type(&self) -> NodeType {
        match self.kind {
            NodeKind::Cli(_) => NodeType::Cli,
            NodeKind::Llm(_) => NodeType::Llm,
            NodeKind::Preview(_) => NodeType::Preview,
            NodeKind::Input(_) => NodeType::Input,
            NodeKind::SearchContext(_) => NodeType::SearchContext,
        }
    }

    pub fn common(&self) -> &NodeCommon {
        match &self.kind {
            NodeKind::Cli(d) => &d.common,
            NodeKind::Llm(d) => &d.common,
            NodeKind::Preview(d) | NodeKind::Input(d) | NodeKind::SearchContext(d) => &d.common,
        }
    }

    fn common_mut(&mut self) -> &mut NodeCommon {
        match &mut self.kind {
            NodeKind::Cli(d) => &mut d.common,
            NodeKind::Llm(d) => &mut d.common,
            NodeKind::Preview(d) | NodeKind::Input(d) | NodeKind::SearchContext(d) => {
                &mut d.common
            }
        }
    }

    #[inline]
    pub fn content(&self) -> &str {
        &self.common().content
    }

    /// Title for messages; falls back to the id
    pub fn title(&self) -> &str {
        let title = self.common().title.as_str();
        if title.is_empty() {
            &self.id
        } else {
            title
        }
    }

    /// Active unless explicitly set to `false`
    #[inline]
    pub fn is_active(&self) -> bool {
        self.common().active != Some(false)
    }
}

impl NodeCommon {
    fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

// ═══════════════════════════════════════════════════════════════
// EDGE + WORKFLOW
// ═══════════════════════════════════════════════════════════════

/// Directed dependency from `source`'s output to `target`'s input
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Node/edge graph consumed by one run
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Workflow {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Workflow {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a workflow file, picking the format from its extension
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            Some("json") => Self::from_json_str(&text),
            _ => Err(FlowError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }

    /// Node ids must be unique within a graph
    pub fn validate(&self) -> Result<()> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(FlowError::DuplicateNode {
                    node_id: node.id.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_yaml_workflow() {
        let yaml = r#"
nodes:
  - id: a
    type: input
    data:
      content: "abc"
  - id: run
    type: cli
    data:
      title: "List files"
      content: "ls ${1}"
      needsUserApproval: true
  - id: ask
    type: llm
    data:
      content: "Summarize ${1}"
      maxTokens: 256
      temperature: 0.2
      fast: true
  - id: p
    type: preview
edges:
  - id: e1
    source: a
    target: run
"#;
        let workflow = Workflow::from_yaml_str(yaml).unwrap();
        assert_eq!(workflow.nodes.len(), 4);
        assert_eq!(workflow.edges.len(), 1);

        let run = workflow.node("run").unwrap();
        assert_eq!(run.node_type(), NodeType::Cli);
        assert_eq!(run.title(), "List files");
        match &run.kind {
            NodeKind::Cli(data) => assert!(data.needs_user_approval),
            other => panic!("expected cli node, got {:?}", other),
        }

        match &workflow.node("ask").unwrap().kind {
            NodeKind::Llm(data) => {
                assert_eq!(data.max_tokens, Some(256));
                assert!(data.fast);
            }
            other => panic!("expected llm node, got {:?}", other),
        }

        // missing data block defaults to empty content
        let preview = workflow.node("p").unwrap();
        assert_eq!(preview.content(), "");
        assert!(preview.is_active());
    }

    #[test]
    fn parse_editor_style_type_names() {
        let json = json!({
            "nodes": [
                { "id": "s", "type": "search-context", "data": { "content": "auth" } },
                { "id": "c", "type": "CLI", "data": { "content": "pwd", "active": false } }
            ],
            "edges": []
        });
        let workflow: Workflow = serde_json::from_value(json).unwrap();
        assert_eq!(workflow.nodes[0].node_type(), NodeType::SearchContext);
        assert_eq!(workflow.nodes[1].node_type(), NodeType::Cli);
        assert!(!workflow.nodes[1].is_active());
    }

    #[test]
    fn node_serializes_to_wire_shape() {
        let node = Node::cli("c1", "echo hi").with_approval();
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["id"], "c1");
        assert_eq!(value["type"], "cli");
        assert_eq!(value["data"]["content"], "echo hi");
        assert_eq!(value["data"]["needsUserApproval"], true);

        let back: Node = serde_json::from_value(value).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn every_kind_serializes_its_payload() {
        let nodes = vec![
            Node::input("i", "text"),
            Node::llm("l", "prompt"),
            Node::preview("p"),
            Node::search_context("s", "query"),
        ];
        let workflow = Workflow::new(nodes.clone(), vec![]);

        let yaml = serde_yaml::to_string(&workflow).unwrap();
        let back = Workflow::from_yaml_str(&yaml).unwrap();
        assert_eq!(back.nodes, nodes);

        let value = serde_json::to_value(&nodes[3]).unwrap();
        assert_eq!(value["type"], "search_context");
        assert_eq!(value["data"]["content"], "query");
    }

    #[test]
    fn unknown_type_is_rejected() {
        let yaml = "nodes:\n  - id: x\n    type: teleport\n";
        assert!(Workflow::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn duplicate_node_ids_fail_validation() {
        let workflow = Workflow::new(vec![Node::input("a", "1"), Node::input("a", "2")], vec![]);
        let err = workflow.validate().unwrap_err();
        assert!(matches!(err, FlowError::DuplicateNode { node_id } if node_id == "a"));
    }

    #[test]
    fn title_falls_back_to_id() {
        assert_eq!(Node::preview("p1").title(), "p1");
        assert_eq!(Node::preview("p1").with_title("Show").title(), "Show");
    }

    #[tokio::test]
    async fn load_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.txt");
        std::fs::write(&path, "nodes: []").unwrap();
        let err = Workflow::load(&path).await.unwrap_err();
        assert!(matches!(err, FlowError::UnsupportedFormat { .. }));
    }

    #[tokio::test]
    async fn load_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        std::fs::write(
            &path,
            r#"{"nodes":[{"id":"a","type":"input","data":{"content":"x"}}],"edges":[]}"#,
        )
        .unwrap();
        let workflow = Workflow::load(&path).await.unwrap();
        assert_eq!(workflow.nodes[0].content(), "x");
    }
}
