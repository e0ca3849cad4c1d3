//! Directed link graph and its derived views.
//!
//! Built exactly once per build from the link lists the crawl transformer
//! attached to each document. Backlinks and the serializable graph artifact
//! are both views over this one structure, never recomputed independently.

use crate::hierarchy::{document_tags, parent_folder};
use crate::model::Document;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeSet;

/// One directed edge. Multiple links between the same pair collapse to one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Default)]
pub struct LinkGraph {
    edges: Vec<Edge>,
    by_source: IndexMap<String, Vec<usize>>,
    by_target: IndexMap<String, Vec<usize>>,
    nodes: BTreeSet<String>,
}

impl LinkGraph {
    /// Build the graph from the frozen document set. Documents are visited
    /// in slug order so the edge list is deterministic regardless of input
    /// ordering.
    pub fn build(docs: &[Document]) -> Self {
        let nodes: BTreeSet<String> = docs.iter().map(|d| d.slug.clone()).collect();

        let mut ordered: Vec<&Document> = docs.iter().collect();
        ordered.sort_by(|a, b| a.slug.cmp(&b.slug));

        let mut edges: Vec<Edge> = Vec::new();
        let mut seen: BTreeSet<(String, String)> = BTreeSet::new();
        let mut by_source: IndexMap<String, Vec<usize>> = IndexMap::new();
        let mut by_target: IndexMap<String, Vec<usize>> = IndexMap::new();

        for doc in ordered {
            for target in &doc.links {
                let key = (doc.slug.clone(), target.clone());
                if !seen.insert(key) {
                    continue;
                }
                let idx = edges.len();
                edges.push(Edge {
                    source: doc.slug.clone(),
                    target: target.clone(),
                });
                by_source.entry(doc.slug.clone()).or_default().push(idx);
                by_target.entry(target.clone()).or_default().push(idx);
            }
        }

        tracing::debug!(
            "link graph: {} nodes, {} edges",
            nodes.len(),
            edges.len()
        );

        Self {
            edges,
            by_source,
            by_target,
            nodes,
        }
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges whose target does not resolve to a document in the set.
    /// Recorded, but excluded from backlink computation.
    pub fn dangling_edges(&self) -> Vec<&Edge> {
        self.edges
            .iter()
            .filter(|e| !self.nodes.contains(&e.target))
            .collect()
    }

    /// Documents linking to `slug`, self-loops excluded. Slugs outside the
    /// document set have no backlinks; edges pointing at them are dangling.
    pub fn backlinks(&self, slug: &str) -> Vec<&str> {
        if !self.nodes.contains(slug) {
            return Vec::new();
        }
        let Some(indices) = self.by_target.get(slug) else {
            return Vec::new();
        };
        indices
            .iter()
            .map(|&i| self.edges[i].source.as_str())
            .filter(|source| *source != slug)
            .collect()
    }

    /// Resolved outbound targets of `slug` that exist in the set,
    /// self-loops excluded.
    pub fn outgoing(&self, slug: &str) -> Vec<&str> {
        let Some(indices) = self.by_source.get(slug) else {
            return Vec::new();
        };
        indices
            .iter()
            .map(|&i| self.edges[i].target.as_str())
            .filter(|target| *target != slug && self.nodes.contains(*target))
            .collect()
    }

    /// Project the serializable node/edge view consumed by the graph
    /// artifact. Tag and folder membership can be layered in per
    /// configuration; the document-to-document edge set is shared with
    /// [`LinkGraph::backlinks`], never recomputed.
    pub fn project(&self, docs: &[Document], opts: GraphViewOptions) -> GraphView {
        let mut ordered: Vec<&Document> = docs.iter().collect();
        ordered.sort_by(|a, b| a.slug.cmp(&b.slug));

        let mut nodes: Vec<GraphNode> = ordered
            .iter()
            .map(|d| GraphNode {
                id: d.slug.clone(),
                title: d.title().to_string(),
                kind: NodeKind::Document,
            })
            .collect();

        let mut links: Vec<Edge> = self
            .edges
            .iter()
            .filter(|e| e.source != e.target && self.nodes.contains(&e.target))
            .cloned()
            .collect();

        if opts.include_tags {
            let mut tags: BTreeSet<String> = BTreeSet::new();
            for &doc in &ordered {
                for tag in document_tags(doc) {
                    tags.insert(tag.clone());
                    links.push(Edge {
                        source: doc.slug.clone(),
                        target: format!("tags/{tag}"),
                    });
                }
            }
            nodes.extend(tags.into_iter().map(|tag| GraphNode {
                id: format!("tags/{tag}"),
                title: format!("#{tag}"),
                kind: NodeKind::Tag,
            }));
        }

        if opts.include_folders {
            let mut folders: BTreeSet<String> = BTreeSet::new();
            for &doc in &ordered {
                if let Some(folder) = parent_folder(&doc.slug) {
                    folders.insert(folder.to_string());
                    links.push(Edge {
                        source: doc.slug.clone(),
                        target: folder.to_string(),
                    });
                }
            }
            nodes.extend(folders.into_iter().map(|folder| GraphNode {
                id: folder.clone(),
                title: folder,
                kind: NodeKind::Folder,
            }));
        }

        GraphView { nodes, links }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GraphViewOptions {
    pub include_tags: bool,
    pub include_folders: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Document,
    Tag,
    Folder,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphView {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<Edge>,
}
