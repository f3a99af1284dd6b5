//! Legacy mapping graphs.
//!
//! Older exports store a conversation as a map of nodes linked by `parent`
//! and `children` ids. Walking the graph depth-first from its roots yields
//! the message order. The walk uses an explicit stack and visited set, so
//! cycles, repeated child references and very deep chains all terminate.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::classify::collect_attachments;
use crate::conversation::Message;

/// A node of a mapping graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingNode {
    /// Message carried by this node, if any.
    pub message: Option<Message>,

    /// Parent node id.
    pub parent: Option<String>,

    /// Child node ids in declaration order.
    pub children: Vec<String>,
}

/// A conversation stored as a parent/child node graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingGraph {
    nodes: IndexMap<String, MappingNode>,
}

impl MappingGraph {
    /// Build a graph from the `mapping` object of a conversation.
    pub fn from_object(mapping: &Map<String, Value>) -> Self {
        let nodes = mapping
            .iter()
            .filter_map(|(id, node)| {
                let obj = node.as_object()?;
                let message = obj
                    .get("message")
                    .filter(|m| m.as_object().is_some_and(|m| !m.is_empty()))
                    .map(|m| {
                        let mut message = Message::from_value(m, "assistant");
                        message.images.extend(collect_attachments(node));
                        message
                    });
                let parent = obj
                    .get("parent")
                    .and_then(Value::as_str)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string);
                let children = obj
                    .get("children")
                    .and_then(Value::as_array)
                    .map(|c| {
                        c.iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                Some((
                    id.clone(),
                    MappingNode {
                        message,
                        parent,
                        children,
                    },
                ))
            })
            .collect();
        Self { nodes }
    }

    /// Insert a node (used to build graphs by hand).
    pub fn insert(&mut self, id: impl Into<String>, node: MappingNode) {
        self.nodes.insert(id.into(), node);
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids of nodes with a null, missing or empty `parent`.
    ///
    /// A node pointing at an absent parent is not a root; it is only reached
    /// through some other node's `children`.
    pub fn roots(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Node ids in traversal order.
    ///
    /// Roots are walked in declaration order. Without any root every node is
    /// used as an entry point.
    pub fn traversal_order(&self) -> Vec<&str> {
        let roots = self.roots();
        let entries: Vec<&str> = if roots.is_empty() {
            self.nodes.keys().map(String::as_str).collect()
        } else {
            roots
        };

        let mut visited = HashSet::new();
        let mut order = Vec::new();
        for entry in entries {
            order.extend(self.walk_from(entry, &mut visited));
        }
        order
    }

    /// Depth-first pre-order walk from `start`, skipping ids already in
    /// `visited`.
    pub fn walk_from<'a>(&'a self, start: &'a str, visited: &mut HashSet<&'a str>) -> Vec<&'a str> {
        let mut order = Vec::new();
        let mut stack = vec![start];

        while let Some(id) = stack.pop() {
            let Some((key, node)) = self.nodes.get_key_value(id) else {
                continue;
            };
            if !visited.insert(key.as_str()) {
                continue;
            }
            order.push(key.as_str());

            for child in node.children.iter().rev() {
                if self.nodes.contains_key(child) && !visited.contains(child.as_str()) {
                    stack.push(child.as_str());
                }
            }
        }

        order
    }

    /// Messages in traversal order.
    pub fn messages(&self) -> Vec<Message> {
        self.traversal_order()
            .into_iter()
            .filter_map(|id| self.nodes.get(id)?.message.clone())
            .collect()
    }
}
