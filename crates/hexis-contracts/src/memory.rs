use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    Episodic,
    Semantic,
    Procedural,
    Strategic,
    Working,
}

impl MemoryType {
    pub const ALL: [MemoryType; 5] = [
        MemoryType::Episodic,
        MemoryType::Semantic,
        MemoryType::Procedural,
        MemoryType::Strategic,
        MemoryType::Working,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MemoryType::Episodic => "episodic",
            MemoryType::Semantic => "semantic",
            MemoryType::Procedural => "procedural",
            MemoryType::Strategic => "strategic",
            MemoryType::Working => "working",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == raw.trim())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MemoryStatus {
    Active,
    Archived,
    Invalidated,
}

impl MemoryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MemoryStatus::Active => "active",
            MemoryStatus::Archived => "archived",
            MemoryStatus::Invalidated => "invalidated",
        }
    }
}

/// Aggregate counts over active memories, served by `GET /status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStats {
    pub total_memories: i64,
    pub episodic_count: i64,
    pub semantic_count: i64,
    pub procedural_count: i64,
    pub strategic_count: i64,
    pub working_count: i64,
    pub cluster_count: i64,
    pub avg_importance: f64,
    pub avg_trust: f64,
    pub last_activity: Option<String>,
}

impl MemoryStats {
    pub fn set_count(&mut self, kind: MemoryType, count: i64) {
        match kind {
            MemoryType::Episodic => self.episodic_count = count,
            MemoryType::Semantic => self.semantic_count = count,
            MemoryType::Procedural => self.procedural_count = count,
            MemoryType::Strategic => self.strategic_count = count,
            MemoryType::Working => self.working_count = count,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vitality {
    pub active_memories: i64,
    pub avg_importance: f64,
    pub avg_trust: f64,
    pub working_memory_count: i64,
    pub last_activity: Option<String>,
    pub heartbeat_active: Option<bool>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct EpisodicMemory {
    pub id: String,
    pub content: String,
    pub importance: f64,
    pub trust_level: f64,
    pub created_at: Option<String>,
    pub action_taken: Option<Value>,
    pub context: Option<Value>,
    pub result: Option<Value>,
    pub emotional_valence: Option<f64>,
    pub verification_status: Option<bool>,
    pub event_time: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct SemanticMemory {
    pub id: String,
    pub content: String,
    pub importance: f64,
    pub trust_level: f64,
    pub created_at: Option<String>,
    pub confidence: f64,
    pub last_validated: Option<String>,
    pub category: Option<Value>,
    pub related_concepts: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct DailyCount {
    pub date: String,
    pub kind: String,
    pub count: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ImportanceDistribution {
    pub very_low: i64,
    pub low: i64,
    pub medium: i64,
    pub high: i64,
    pub very_high: i64,
}

impl ImportanceDistribution {
    pub fn add(&mut self, bucket: &str, count: i64) {
        match bucket {
            "very_low" => self.very_low += count,
            "low" => self.low += count,
            "medium" => self.medium += count,
            "high" => self.high += count,
            _ => self.very_high += count,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemoryDynamics {
    pub creation_timeline: Vec<DailyCount>,
    pub cluster_growth: Vec<DailyCount>,
    pub importance_distribution: ImportanceDistribution,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct IdentityAspect {
    pub id: String,
    pub aspect_type: String,
    pub content: Value,
    pub stability: f64,
    pub updated_at: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct WorldviewPrimitive {
    pub id: String,
    pub category: String,
    pub belief: String,
    pub confidence: Option<f64>,
    pub emotional_valence: Option<f64>,
    pub stability_score: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Identity {
    pub aspects: Vec<IdentityAspect>,
    pub worldview: Vec<WorldviewPrimitive>,
}

/// Concept row used to draw the knowledge graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Concept {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub ancestors: Vec<String>,
    pub depth: i64,
    pub memory_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub depth: i64,
    pub memory_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct KnowledgeGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl KnowledgeGraph {
    /// Nodes for every concept, plus a `parent_of` edge from each concept's
    /// closest ancestor. The ancestor may lie outside the node window.
    pub fn from_concepts(concepts: &[Concept]) -> Self {
        let nodes = concepts
            .iter()
            .map(|c| GraphNode {
                id: c.id.clone(),
                name: c.name.clone(),
                description: c.description.clone(),
                depth: c.depth,
                memory_count: c.memory_count,
            })
            .collect();
        let edges = concepts
            .iter()
            .filter_map(|c| {
                let parent = c.ancestors.last()?;
                Some(GraphEdge {
                    source: parent.clone(),
                    target: c.id.clone(),
                    kind: "parent_of".to_string(),
                })
            })
            .collect();
        Self { nodes, edges }
    }
}

/// Message the agent queued for the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutboxMessage {
    pub id: String,
    pub created_at: Option<String>,
    pub message: Option<String>,
    pub intent: Option<String>,
    pub heartbeat_id: Option<String>,
    pub status: String,
    pub sent_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concept(id: &str, ancestors: &[&str]) -> Concept {
        Concept {
            id: id.to_string(),
            name: id.to_uppercase(),
            description: None,
            ancestors: ancestors.iter().map(|s| s.to_string()).collect(),
            depth: ancestors.len() as i64,
            memory_count: 1,
        }
    }

    #[test]
    fn graph_links_closest_ancestor() {
        let graph = KnowledgeGraph::from_concepts(&[
            concept("root", &[]),
            concept("child", &["root"]),
            concept("leaf", &["root", "child"]),
            concept("orphan", &["missing"]),
        ]);
        assert_eq!(graph.nodes.len(), 4);
        let pairs: Vec<(&str, &str)> = graph
            .edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("root", "child"), ("child", "leaf"), ("missing", "orphan")]
        );
    }

    #[test]
    fn graph_keeps_edge_to_ancestor_outside_window() {
        let mut leaf = concept("leaf", &["root"]);
        leaf.description = Some("a leaf".to_string());
        leaf.memory_count = 3;
        let graph = KnowledgeGraph::from_concepts(&[leaf]);
        assert_eq!(
            serde_json::to_value(&graph).expect("json"),
            serde_json::json!({
                "nodes": [{
                    "id": "leaf",
                    "name": "LEAF",
                    "description": "a leaf",
                    "depth": 1,
                    "memoryCount": 3
                }],
                "edges": [{"source": "root", "target": "leaf", "type": "parent_of"}]
            })
        );
    }

    #[test]
    fn importance_buckets_accumulate() {
        let mut dist = ImportanceDistribution::default();
        dist.add("low", 2);
        dist.add("very_high", 1);
        dist.add("low", 1);
        assert_eq!(dist.low, 3);
        assert_eq!(dist.very_high, 1);
    }

    #[test]
    fn memory_type_parse() {
        assert_eq!(MemoryType::parse("semantic"), Some(MemoryType::Semantic));
        assert_eq!(MemoryType::parse("dream"), None);
    }
}
