use std::collections::HashMap;
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::{debug, instrument};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::node::{Node, NodeKind, Requirement, SelectionMode, ROOT_ID};

/// Kind-specific part of an arena node. Children live in [`TreeNode::children`].
#[derive(Debug, Clone, PartialEq)]
pub enum DataKind {
    Condition { selection_mode: SelectionMode },
    Requirement(Requirement),
}

/// Data payload for arena nodes: a tree node without its children.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub id: String,
    pub name: String,
    pub kind: DataKind,
}

impl NodeData {
    pub fn is_condition(&self) -> bool {
        matches!(self.kind, DataKind::Condition { .. })
    }

    pub fn selection_mode(&self) -> Option<SelectionMode> {
        match self.kind {
            DataKind::Condition { selection_mode } => Some(selection_mode),
            DataKind::Requirement(_) => None,
        }
    }

    pub fn requirement(&self) -> Option<&Requirement> {
        match &self.kind {
            DataKind::Requirement(requirement) => Some(requirement),
            DataKind::Condition { .. } => None,
        }
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "[{}]", self.id)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    pub data: NodeData,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in document order
    pub children: Vec<Index>,
}

/// Read-only, validated index of one requirement tree.
///
/// Built once at ingestion from an owned [`Node`]; ids resolve to
/// generation-checked handles in O(1) and every node knows its parent.
#[derive(Debug)]
pub struct TreeArena {
    arena: Arena<TreeNode>,
    root: Option<Index>,
    by_id: HashMap<String, Index>,
}

impl Default for TreeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
            by_id: HashMap::new(),
        }
    }

    /// Validates `tree` and indexes it.
    ///
    /// Fails on a non-condition root, a root without the reserved id, or any
    /// duplicate id. Cycles cannot occur in an owned tree.
    #[instrument(level = "debug", skip(tree), fields(root = %tree.id))]
    pub fn from_tree(tree: &Node) -> DomainResult<Self> {
        if !tree.is_condition() {
            return Err(DomainError::RootNotCondition);
        }
        if tree.id != ROOT_ID {
            return Err(DomainError::InvalidRootId {
                expected: ROOT_ID.to_string(),
                found: tree.id.clone(),
            });
        }

        let mut arena = Self::new();
        let mut stack = vec![(tree, None)];
        while let Some((node, parent_idx)) = stack.pop() {
            if arena.by_id.contains_key(&node.id) {
                return Err(DomainError::DuplicateId(node.id.clone()));
            }
            let idx = arena.insert_node(Self::data_of(node), parent_idx);
            // Reverse push keeps pre-order insertion, so children stay in document order.
            for child in node.children().iter().rev() {
                stack.push((child, Some(idx)));
            }
        }
        debug!("indexed {} nodes", arena.len());
        Ok(arena)
    }

    fn data_of(node: &Node) -> NodeData {
        let kind = match &node.kind {
            NodeKind::Condition(c) => DataKind::Condition {
                selection_mode: c.selection_mode,
            },
            NodeKind::Requirement(r) => DataKind::Requirement(r.clone()),
        };
        NodeData {
            id: node.id.clone(),
            name: node.name.clone(),
            kind,
        }
    }

    #[instrument(level = "trace", skip(self, data), fields(id = %data.id))]
    pub fn insert_node(&mut self, data: NodeData, parent: Option<Index>) -> Index {
        let id = data.id.clone();
        let node = TreeNode {
            data,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }
        self.by_id.entry(id).or_insert(node_idx);

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Handle for `id`, if present.
    pub fn index_of(&self, id: &str) -> Option<Index> {
        self.by_id.get(id).copied()
    }

    pub fn find(&self, id: &str) -> Option<&TreeNode> {
        self.index_of(id).and_then(|idx| self.get_node(idx))
    }

    pub fn parent_of(&self, id: &str) -> Option<&TreeNode> {
        self.find(id)
            .and_then(|node| node.parent)
            .and_then(|idx| self.get_node(idx))
    }

    /// Direct children of `idx`, in document order.
    pub fn children(&self, idx: Index) -> impl Iterator<Item = &TreeNode> + '_ {
        self.get_node(idx)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(move |&child| self.get_node(child))
    }

    /// True if the node has at least one condition child of its own.
    pub fn has_condition_children(&self, idx: Index) -> bool {
        self.children(idx).any(|child| child.data.is_condition())
    }

    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        if let Some(root) = self.root {
            self.calculate_depth(root)
        } else {
            0
        }
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.get_node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Ids of every requirement node, in document order.
    pub fn requirement_ids(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, node)| !node.data.is_condition())
            .map(|(_, node)| node.data.id.clone())
            .collect()
    }
}

/// Pre-order, left-to-right traversal.
pub struct TreeIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = arena.root() {
            stack.push(root);
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::node::TransactionMeta;

    fn sample() -> Node {
        Node::new_root(TransactionMeta::default()).with_children(vec![
            Node::condition("a", "A", SelectionMode::Single).with_children(vec![
                Node::requirement("r1", "R1", Requirement::default()),
                Node::condition("a1", "A1", SelectionMode::Multi),
            ]),
            Node::requirement("r2", "R2", Requirement::default()),
        ])
    }

    #[test]
    fn given_valid_tree_when_indexing_then_preserves_document_order() {
        let arena = TreeArena::from_tree(&sample()).unwrap();

        let ids: Vec<_> = arena.iter().map(|(_, n)| n.data.id.as_str()).collect();
        assert_eq!(ids, vec!["root", "a", "r1", "a1", "r2"]);
        assert_eq!(arena.len(), 5);
        assert_eq!(arena.depth(), 3);
        assert_eq!(arena.requirement_ids(), vec!["r1", "r2"]);
    }

    #[test]
    fn given_indexed_tree_when_looking_up_parent_then_follows_parent_link() {
        let arena = TreeArena::from_tree(&sample()).unwrap();

        assert_eq!(arena.parent_of("a1").unwrap().data.id, "a");
        assert_eq!(arena.parent_of("a").unwrap().data.id, ROOT_ID);
        assert!(arena.parent_of(ROOT_ID).is_none());
        assert!(arena.find("nope").is_none());
    }

    #[test]
    fn given_node_with_condition_child_when_checking_then_reports_true() {
        let arena = TreeArena::from_tree(&sample()).unwrap();

        assert!(arena.has_condition_children(arena.index_of("a").unwrap()));
        assert!(!arena.has_condition_children(arena.index_of("a1").unwrap()));
    }

    #[test]
    fn given_duplicate_ids_when_indexing_then_errors() {
        let tree = Node::new_root(TransactionMeta::default()).with_children(vec![
            Node::condition("x", "X1", SelectionMode::Multi),
            Node::requirement("x", "X2", Requirement::default()),
        ]);

        let result = TreeArena::from_tree(&tree);

        assert_eq!(result.unwrap_err(), DomainError::DuplicateId("x".into()));
    }

    #[test]
    fn given_requirement_root_when_indexing_then_errors() {
        let tree = Node::requirement(ROOT_ID, "doc", Requirement::default());

        assert_eq!(
            TreeArena::from_tree(&tree).unwrap_err(),
            DomainError::RootNotCondition
        );
    }

    #[test]
    fn given_root_with_other_id_when_indexing_then_errors() {
        let tree = Node::condition("top", "Top", SelectionMode::Multi);

        assert!(matches!(
            TreeArena::from_tree(&tree),
            Err(DomainError::InvalidRootId { .. })
        ));
    }
}
