//! Domain layer: the requirement tree and the two engines operating on it
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod checklist;
pub mod editor;
pub mod error;
pub mod node;
pub mod selection;

pub use arena::{DataKind, NodeData, TreeArena, TreeNode};
pub use checklist::{is_complete, missing_requirements, Checklist, RequirementEntry};
pub use editor::{create_child, find_by_id, find_parent, remove_child, update_node};
pub use error::{DomainError, DomainResult};
pub use node::{
    Condition, Node, NodeKind, Requirement, SelectionMode, Source, TransactionMeta, ROOT_ID,
};
pub use selection::{SelectionSession, SessionState, Transition};
