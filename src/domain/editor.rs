//! Pure edit operations over a requirement tree.
//!
//! Every operation takes a tree snapshot and returns a new one; the input is never
//! mutated. Targets that do not exist leave the tree unchanged (no error).
//! All operations share one shape: act at the target, otherwise rebuild the
//! children on the path that leads to it and clone the rest.

use crate::domain::node::{Node, NodeKind};

/// Appends `new_node` to the children of the first node (pre-order) with `parent_id`.
///
/// Unknown parents and requirement parents leave the tree unchanged.
pub fn create_child(tree: &Node, parent_id: &str, new_node: Node) -> Node {
    let mut pending = Some(new_node);
    insert_into(tree, parent_id, &mut pending)
}

fn insert_into(node: &Node, parent_id: &str, pending: &mut Option<Node>) -> Node {
    if node.id == parent_id {
        if let NodeKind::Condition(condition) = &node.kind {
            if let Some(child) = pending.take() {
                let mut condition = condition.clone();
                condition.children.push(child);
                return Node {
                    id: node.id.clone(),
                    name: node.name.clone(),
                    kind: NodeKind::Condition(condition),
                };
            }
        }
        // First match wins even if it could not take the child.
        pending.take();
        return node.clone();
    }
    rebuild(node, |child| {
        if pending.is_some() {
            insert_into(child, parent_id, pending)
        } else {
            child.clone()
        }
    })
}

/// Replaces the first node with `updated.id` by `updated`, children included.
///
/// No merge happens: callers editing only scalar fields must carry the
/// original `children` forward themselves.
pub fn update_node(tree: &Node, updated: Node) -> Node {
    let mut pending = Some(updated);
    replace_in(tree, &mut pending)
}

fn replace_in(node: &Node, pending: &mut Option<Node>) -> Node {
    let is_target = pending.as_ref().is_some_and(|u| u.id == node.id);
    if is_target {
        if let Some(updated) = pending.take() {
            return updated;
        }
    }
    rebuild(node, |child| {
        if pending.is_some() {
            replace_in(child, pending)
        } else {
            child.clone()
        }
    })
}

/// Unlinks `node_id` from the first parent (pre-order) whose direct children contain it.
///
/// The root has no parent, so removing it is a no-op.
pub fn remove_child(tree: &Node, node_id: &str) -> Node {
    let mut done = false;
    remove_from(tree, node_id, &mut done)
}

fn remove_from(node: &Node, node_id: &str, done: &mut bool) -> Node {
    if let NodeKind::Condition(condition) = &node.kind {
        if condition.children.iter().any(|c| c.id == node_id) {
            *done = true;
            let mut condition = condition.clone();
            condition.children.retain(|c| c.id != node_id);
            return Node {
                id: node.id.clone(),
                name: node.name.clone(),
                kind: NodeKind::Condition(condition),
            };
        }
    }
    rebuild(node, |child| {
        if *done {
            child.clone()
        } else {
            remove_from(child, node_id, done)
        }
    })
}

/// Node whose direct children contain `child_id`; first hit in pre-order.
pub fn find_parent<'a>(tree: &'a Node, child_id: &str) -> Option<&'a Node> {
    if tree.children().iter().any(|c| c.id == child_id) {
        return Some(tree);
    }
    tree.children()
        .iter()
        .find_map(|child| find_parent(child, child_id))
}

/// Pre-order depth-first lookup by id.
pub fn find_by_id<'a>(tree: &'a Node, id: &str) -> Option<&'a Node> {
    if tree.id == id {
        return Some(tree);
    }
    tree.children().iter().find_map(|child| find_by_id(child, id))
}

/// Rebuilds `node` with each child passed through `f`, in order.
fn rebuild(node: &Node, mut f: impl FnMut(&Node) -> Node) -> Node {
    match &node.kind {
        NodeKind::Requirement(_) => node.clone(),
        NodeKind::Condition(condition) => {
            let children = condition.children.iter().map(&mut f).collect();
            let mut rebuilt = condition.clone_without_children();
            rebuilt.children = children;
            Node {
                id: node.id.clone(),
                name: node.name.clone(),
                kind: NodeKind::Condition(rebuilt),
            }
        }
    }
}
