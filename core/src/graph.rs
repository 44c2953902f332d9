//! Directed link graph of crawled pages.

use std::collections::{HashMap, HashSet};
use std::io::Write;

/// Position of a node in registration order.
pub type NodeId = usize;

/// A page and its adjacency lists.
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    incoming: Vec<NodeId>,
    outgoing: Vec<NodeId>,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn incoming(&self) -> &[NodeId] {
        &self.incoming
    }

    pub fn outgoing(&self) -> &[NodeId] {
        &self.outgoing
    }
}

/// Nodes are created lazily on first reference; each page name maps to
/// exactly one node.
#[derive(Debug, Default)]
pub struct LinkGraph {
    nodes: Vec<Node>,
    registry: HashMap<String, NodeId>,
    edge_count: usize,
}

impl LinkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph a crawl produced.
    ///
    /// Every visited page becomes a node, in visit order. A link is kept only
    /// when both ends were visited; links to pages never fetched, self-links
    /// and repeated links are dropped.
    pub fn from_crawl<V, L, S, T>(visited: V, links: L) -> Self
    where
        V: IntoIterator<Item = S>,
        L: IntoIterator<Item = (T, T)>,
        S: Into<String>,
        T: AsRef<str>,
    {
        let mut graph = Self::new();
        for page in visited {
            graph.get_or_insert(page);
        }
        let mut dangling = 0usize;
        for (from, to) in links {
            let (from, to) = (from.as_ref(), to.as_ref());
            match (graph.node_id(from), graph.node_id(to)) {
                (Some(a), Some(b)) if a != b => {
                    graph.link(a, b);
                }
                (Some(_), Some(_)) => {}
                _ => dangling += 1,
            }
        }
        tracing::debug!(nodes = graph.len(), edges = graph.edge_count, dangling, "link graph built");
        graph
    }

    /// Id of `name`, registering a new node if needed.
    pub fn get_or_insert(&mut self, name: impl Into<String>) -> NodeId {
        let name = name.into();
        if let Some(&id) = self.registry.get(&name) {
            return id;
        }
        let id = self.nodes.len();
        self.registry.insert(name.clone(), id);
        self.nodes.push(Node { name, incoming: Vec::new(), outgoing: Vec::new() });
        id
    }

    /// Add `from → to`, creating either node if needed. Returns `false` when
    /// the edge already existed.
    pub fn add_edge(&mut self, from: &str, to: &str) -> bool {
        let a = self.get_or_insert(from);
        let b = self.get_or_insert(to);
        self.link(a, b)
    }

    fn link(&mut self, a: NodeId, b: NodeId) -> bool {
        if self.nodes[a].outgoing.contains(&b) {
            return false;
        }
        self.nodes[a].outgoing.push(b);
        self.nodes[b].incoming.push(a);
        self.edge_count += 1;
        true
    }

    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.registry.get(name).copied()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Names of nodes nothing links to.
    pub fn sources(&self) -> HashSet<&str> {
        self.nodes.iter().filter(|n| n.incoming.is_empty()).map(|n| n.name.as_str()).collect()
    }

    /// One line per node: its name followed by the pages it links to.
    pub fn dump<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        for node in &self.nodes {
            let targets: Vec<&str> = node.outgoing.iter().map(|&id| self.nodes[id].name.as_str()).collect();
            writeln!(out, "{} -> [{}]", node.name, targets.join(", "))?;
        }
        Ok(())
    }
}
