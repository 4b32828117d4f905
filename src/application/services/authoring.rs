//! Authoring service
//!
//! Caller layer of the pure edit engine: validates requests, assigns ids and
//! writes the whole tree back after every committed edit.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::application::document::{read_tree, validate_key, write_tree};
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{
    create_child, find_by_id, find_parent, remove_child, update_node, DomainError, Node, NodeKind,
    Requirement, SelectionMode, Source, TransactionMeta, ROOT_ID,
};
use crate::infrastructure::traits::DocumentStore;

/// Whether an edit changed the stored tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    Unchanged,
}

/// Fields of a new requirement node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementDraft {
    pub name: String,
    pub note: String,
    pub group: Option<String>,
    pub optional: bool,
    pub source: Option<Source>,
}

/// Scalar edits to an existing node. `None` leaves a field as it is.
///
/// `group` and `source` use a nested option so they can be cleared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub name: Option<String>,
    pub selection_mode: Option<SelectionMode>,
    pub note: Option<String>,
    pub group: Option<Option<String>>,
    pub optional: Option<bool>,
    pub source: Option<Option<Source>>,
}

impl NodePatch {
    fn touches_requirement(&self) -> bool {
        self.note.is_some() || self.group.is_some() || self.optional.is_some() || self.source.is_some()
    }
}

/// Service for authoring transaction requirement trees.
pub struct AuthoringService {
    store: Arc<dyn DocumentStore>,
}

impl AuthoringService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Transaction keys in the store, sorted.
    pub fn list(&self) -> ApplicationResult<Vec<String>> {
        let mut keys = self.store.keys().with_key_context("list transactions", "*")?;
        keys.sort();
        Ok(keys)
    }

    pub fn load(&self, key: &str) -> ApplicationResult<Node> {
        read_tree(self.store.as_ref(), key)
    }

    /// Writes a root-only tree for a new transaction.
    #[instrument(level = "debug", skip(self, meta))]
    pub fn create_transaction(&self, key: &str, meta: TransactionMeta) -> ApplicationResult<Node> {
        validate_key(key)?;
        if self
            .store
            .get(key)
            .with_key_context("read transaction", key)?
            .is_some()
        {
            return Err(ApplicationError::TransactionExists(key.to_string()));
        }
        let tree = Node::new_root(meta);
        write_tree(self.store.as_ref(), key, &tree)?;
        info!("created transaction {}", key);
        Ok(tree)
    }

    /// Adds a condition under `parent_id`; returns the new node's id.
    #[instrument(level = "debug", skip(self))]
    pub fn add_condition(
        &self,
        key: &str,
        parent_id: &str,
        name: &str,
        mode: SelectionMode,
    ) -> ApplicationResult<String> {
        let id = new_node_id();
        let node = Node::condition(id.clone(), name, mode);
        self.insert(key, parent_id, node)?;
        Ok(id)
    }

    /// Adds a requirement under `parent_id`; returns the new node's id.
    #[instrument(level = "debug", skip(self, draft), fields(name = %draft.name))]
    pub fn add_requirement(
        &self,
        key: &str,
        parent_id: &str,
        draft: RequirementDraft,
    ) -> ApplicationResult<String> {
        let id = new_node_id();
        let node = Node::requirement(
            id.clone(),
            draft.name,
            Requirement {
                note: draft.note,
                group: draft.group,
                optional: draft.optional,
                source: draft.source,
            },
        );
        self.insert(key, parent_id, node)?;
        Ok(id)
    }

    /// Inserts a caller-built node. Its id must not exist in the tree yet.
    pub fn insert(&self, key: &str, parent_id: &str, node: Node) -> ApplicationResult<EditOutcome> {
        let tree = self.load(key)?;
        match find_by_id(&tree, parent_id) {
            None => return Err(DomainError::NodeNotFound(parent_id.to_string()).into()),
            Some(parent) if !parent.is_condition() => {
                return Err(DomainError::NotACondition(parent_id.to_string()).into())
            }
            Some(_) => {}
        }
        if find_by_id(&tree, &node.id).is_some() {
            return Err(DomainError::DuplicateId(node.id).into());
        }
        let updated = create_child(&tree, parent_id, node);
        self.commit(key, &tree, updated)
    }

    /// Applies a scalar patch; the node keeps its children.
    #[instrument(level = "debug", skip(self, patch))]
    pub fn update(&self, key: &str, id: &str, patch: &NodePatch) -> ApplicationResult<EditOutcome> {
        let tree = self.load(key)?;
        let current = find_by_id(&tree, id)
            .ok_or_else(|| DomainError::NodeNotFound(id.to_string()))?;
        let replacement = apply_patch(current, patch)?;
        let updated = update_node(&tree, replacement);
        self.commit(key, &tree, updated)
    }

    /// Replaces the root's transaction metadata.
    pub fn set_meta(&self, key: &str, meta: TransactionMeta) -> ApplicationResult<EditOutcome> {
        self.edit_meta(key, |current| *current = meta)
    }

    pub fn publish(&self, key: &str, published: bool) -> ApplicationResult<EditOutcome> {
        self.edit_meta(key, |current| current.published = published)
    }

    fn edit_meta(
        &self,
        key: &str,
        edit: impl FnOnce(&mut TransactionMeta),
    ) -> ApplicationResult<EditOutcome> {
        let tree = self.load(key)?;
        let mut root = tree.clone();
        match &mut root.kind {
            NodeKind::Condition(condition) => edit(&mut condition.meta),
            NodeKind::Requirement(_) => return Err(DomainError::RootNotCondition.into()),
        }
        let updated = update_node(&tree, root);
        self.commit(key, &tree, updated)
    }

    /// Unlinks a node and its subtree. The root is never removed.
    #[instrument(level = "debug", skip(self))]
    pub fn remove(&self, key: &str, id: &str) -> ApplicationResult<EditOutcome> {
        if id == ROOT_ID {
            warn!("refusing to remove the root of {}", key);
            return Ok(EditOutcome::Unchanged);
        }
        let tree = self.load(key)?;
        let updated = remove_child(&tree, id);
        self.commit(key, &tree, updated)
    }

    pub fn find(&self, key: &str, id: &str) -> ApplicationResult<Option<Node>> {
        let tree = self.load(key)?;
        Ok(find_by_id(&tree, id).cloned())
    }

    pub fn parent_of(&self, key: &str, id: &str) -> ApplicationResult<Option<Node>> {
        let tree = self.load(key)?;
        Ok(find_parent(&tree, id).cloned())
    }

    /// Persists `after` unless the edit was a no-op.
    fn commit(&self, key: &str, before: &Node, after: Node) -> ApplicationResult<EditOutcome> {
        if *before == after {
            warn!("edit on {} left the tree unchanged", key);
            return Ok(EditOutcome::Unchanged);
        }
        write_tree(self.store.as_ref(), key, &after)?;
        debug!("committed edit on {} ({} nodes)", key, after.subtree_size());
        Ok(EditOutcome::Applied)
    }
}

fn new_node_id() -> String {
    Uuid::new_v4().to_string()
}

/// Copies `node` (children included) and applies the patch to the copy.
fn apply_patch(node: &Node, patch: &NodePatch) -> ApplicationResult<Node> {
    let mut replacement = node.clone();
    if let Some(name) = &patch.name {
        replacement.name = name.clone();
    }
    match &mut replacement.kind {
        NodeKind::Condition(condition) => {
            if patch.touches_requirement() {
                return Err(DomainError::NotARequirement(node.id.clone()).into());
            }
            if let Some(mode) = patch.selection_mode {
                condition.selection_mode = mode;
            }
        }
        NodeKind::Requirement(requirement) => {
            if patch.selection_mode.is_some() {
                return Err(DomainError::NotACondition(node.id.clone()).into());
            }
            if let Some(note) = &patch.note {
                requirement.note = note.clone();
            }
            if let Some(group) = &patch.group {
                requirement.group = group.clone();
            }
            if let Some(optional) = patch.optional {
                requirement.optional = optional;
            }
            if let Some(source) = &patch.source {
                requirement.source = source.clone();
            }
        }
    }
    Ok(replacement)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_condition_when_patching_name_and_mode_then_children_carried_forward() {
        let node = Node::condition("c", "Old", SelectionMode::Multi).with_children(vec![
            Node::requirement("r", "Doc", Requirement::default()),
        ]);
        let patch = NodePatch {
            name: Some("New".into()),
            selection_mode: Some(SelectionMode::Single),
            ..NodePatch::default()
        };

        let patched = apply_patch(&node, &patch).unwrap();

        assert_eq!(patched.name, "New");
        assert_eq!(patched.selection_mode(), Some(SelectionMode::Single));
        assert_eq!(patched.children(), node.children());
    }

    #[test]
    fn given_condition_when_patching_requirement_field_then_errors() {
        let node = Node::condition("c", "C", SelectionMode::Multi);
        let patch = NodePatch {
            optional: Some(true),
            ..NodePatch::default()
        };

        let result = apply_patch(&node, &patch);

        assert!(matches!(
            result,
            Err(ApplicationError::Domain(DomainError::NotARequirement(_)))
        ));
    }

    #[test]
    fn given_requirement_when_clearing_group_then_group_removed() {
        let node = Node::requirement(
            "r",
            "Doc",
            Requirement {
                group: Some("G".into()),
                ..Requirement::default()
            },
        );
        let patch = NodePatch {
            group: Some(None),
            ..NodePatch::default()
        };

        let patched = apply_patch(&node, &patch).unwrap();

        assert_eq!(patched.as_requirement().unwrap().group, None);
    }
}
