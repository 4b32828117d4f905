//! Requirement tree node model.
//!
//! A tree is a single owned [`Node`] value. Condition nodes own their children;
//! requirement nodes are leaves by construction.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reserved id of the root node of every transaction tree.
pub const ROOT_ID: &str = "root";

/// How the children of a condition are chosen in the wizard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Mutually exclusive: one pick advances immediately.
    Single,
    #[default]
    Multi,
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionMode::Single => write!(f, "single"),
            SelectionMode::Multi => write!(f, "multi"),
        }
    }
}

/// Reference to a downloadable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub label: String,
    pub link: String,
}

/// Transaction metadata. Only meaningful on the root condition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub published: bool,
}

impl TransactionMeta {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Branch payload: a situational fact about the taxpayer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default)]
    pub selection_mode: SelectionMode,
    #[serde(flatten)]
    pub meta: TransactionMeta,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Condition {
    pub(crate) fn clone_without_children(&self) -> Self {
        Self {
            selection_mode: self.selection_mode,
            meta: self.meta.clone(),
            children: Vec::new(),
        }
    }
}

/// Leaf payload: one document (or document set) needed for the transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    #[serde(default)]
    pub note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeKind {
    Condition(Condition),
    Requirement(Requirement),
}

/// Tree node. Serialized as one flat JSON object tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl Node {
    /// Root-only tree carrying the given transaction metadata.
    pub fn new_root(meta: TransactionMeta) -> Self {
        Self {
            id: ROOT_ID.to_string(),
            name: String::new(),
            kind: NodeKind::Condition(Condition {
                selection_mode: SelectionMode::Multi,
                meta,
                children: Vec::new(),
            }),
        }
    }

    pub fn condition(id: impl Into<String>, name: impl Into<String>, mode: SelectionMode) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: NodeKind::Condition(Condition {
                selection_mode: mode,
                ..Condition::default()
            }),
        }
    }

    pub fn requirement(
        id: impl Into<String>,
        name: impl Into<String>,
        requirement: Requirement,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: NodeKind::Requirement(requirement),
        }
    }

    /// Builder-style helper, mostly for fixtures. Ignored on requirement nodes.
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        if let NodeKind::Condition(condition) = &mut self.kind {
            condition.children = children;
        }
        self
    }

    pub fn is_root(&self) -> bool {
        self.id == ROOT_ID
    }

    pub fn is_condition(&self) -> bool {
        matches!(self.kind, NodeKind::Condition(_))
    }

    pub fn is_requirement(&self) -> bool {
        matches!(self.kind, NodeKind::Requirement(_))
    }

    pub fn as_condition(&self) -> Option<&Condition> {
        match &self.kind {
            NodeKind::Condition(condition) => Some(condition),
            NodeKind::Requirement(_) => None,
        }
    }

    pub fn as_requirement(&self) -> Option<&Requirement> {
        match &self.kind {
            NodeKind::Requirement(requirement) => Some(requirement),
            NodeKind::Condition(_) => None,
        }
    }

    /// Direct children; always empty for requirement nodes.
    pub fn children(&self) -> &[Node] {
        match &self.kind {
            NodeKind::Condition(condition) => &condition.children,
            NodeKind::Requirement(_) => &[],
        }
    }

    pub fn selection_mode(&self) -> Option<SelectionMode> {
        self.as_condition().map(|c| c.selection_mode)
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_size(&self) -> usize {
        1 + self.children().iter().map(Node::subtree_size).sum::<usize>()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = if self.name.is_empty() {
            "(unnamed)"
        } else {
            self.name.as_str()
        };
        match &self.kind {
            NodeKind::Condition(c) => write!(f, "{} [{}] ({})", label, self.id, c.selection_mode),
            NodeKind::Requirement(r) => {
                write!(f, "{} [{}]", label, self.id)?;
                if let Some(group) = &r.group {
                    write!(f, " group={}", group)?;
                }
                if r.optional {
                    write!(f, " optional")?;
                }
                Ok(())
            }
        }
    }
}
