//! Guided drill-down over the condition tree.
//!
//! A session walks the tree breadth-first: every toggled condition that has
//! conditions of its own is queued for its own level, and once the queue drains
//! the requirements of every selected condition are aggregated.

use std::collections::VecDeque;

use generational_arena::Index;
use tracing::{debug, instrument, warn};

use crate::domain::arena::{NodeData, TreeArena};
use crate::domain::checklist::RequirementEntry;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::node::{SelectionMode, ROOT_ID};

/// Result of feeding one event into a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Event did not apply to the current state.
    Ignored,
    Selected,
    Deselected,
    /// Moved on to the next queued condition.
    Advanced,
    /// Queue drained; requirements are aggregated.
    Finished,
}

/// Observable state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Browsing,
    Done,
}

/// Ephemeral drill-down state for one walk through a tree.
#[derive(Debug)]
pub struct SelectionSession<'a> {
    arena: &'a TreeArena,
    queue: VecDeque<String>,
    selected: Vec<String>,
    current: Index,
    step: usize,
    requirements: Option<Vec<RequirementEntry>>,
}

impl<'a> SelectionSession<'a> {
    /// Starts browsing at the root with the root queued and selected.
    pub fn new(arena: &'a TreeArena) -> DomainResult<Self> {
        let root = arena
            .root()
            .ok_or_else(|| DomainError::NodeNotFound(ROOT_ID.to_string()))?;
        let root_id = arena
            .get_node(root)
            .map(|n| n.data.id.clone())
            .ok_or_else(|| DomainError::NodeNotFound(ROOT_ID.to_string()))?;

        Ok(Self {
            arena,
            queue: VecDeque::from([root_id.clone()]),
            selected: vec![root_id],
            current: root,
            step: 0,
            requirements: None,
        })
    }

    pub fn state(&self) -> SessionState {
        if self.requirements.is_some() {
            SessionState::Done
        } else {
            SessionState::Browsing
        }
    }

    pub fn is_done(&self) -> bool {
        self.state() == SessionState::Done
    }

    /// Condition being presented; None once done.
    pub fn current(&self) -> Option<&'a NodeData> {
        if self.is_done() {
            return None;
        }
        self.arena.get_node(self.current).map(|n| &n.data)
    }

    /// Condition children of the current node, in document order.
    pub fn choices(&self) -> Vec<&'a NodeData> {
        if self.is_done() {
            return Vec::new();
        }
        self.arena
            .children(self.current)
            .filter(|child| child.data.is_condition())
            .map(|child| &child.data)
            .collect()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    /// Selected condition ids, in the order they were added.
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn queue(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(String::as_str)
    }

    /// Toggles since the current condition was entered.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Flips selection of a condition child of the current node.
    ///
    /// On a single-select level the first toggle advances immediately.
    #[instrument(level = "debug", skip(self))]
    pub fn toggle(&mut self, child_id: &str) -> Transition {
        if self.is_done() {
            return Transition::Ignored;
        }
        let Some(idx) = self.choice_index(child_id) else {
            warn!("toggle ignored: {} is not a choice of the current condition", child_id);
            return Transition::Ignored;
        };

        let transition = if let Some(pos) = self.selected.iter().position(|s| s == child_id) {
            self.selected.remove(pos);
            Transition::Deselected
        } else {
            self.selected.push(child_id.to_string());
            Transition::Selected
        };

        // Only conditions with sub-conditions get their own level.
        if self.arena.has_condition_children(idx) {
            if let Some(pos) = self.queue.iter().position(|q| q == child_id) {
                self.queue.remove(pos);
            } else {
                self.queue.push_back(child_id.to_string());
            }
        }

        self.step += 1;
        debug!(?transition, step = self.step, "toggled {}", child_id);

        if self.current_mode() == Some(SelectionMode::Single) && self.step == 1 {
            return self.advance();
        }
        transition
    }

    /// Leaves the current condition and moves to the next queued one.
    #[instrument(level = "debug", skip(self))]
    pub fn advance(&mut self) -> Transition {
        if self.is_done() {
            return Transition::Ignored;
        }
        self.queue.pop_front();

        while let Some(next_id) = self.queue.front() {
            match self.arena.index_of(next_id) {
                Some(idx) if self.is_condition(idx) => {
                    debug!("browsing {}", next_id);
                    self.current = idx;
                    self.step = 0;
                    return Transition::Advanced;
                }
                _ => {
                    warn!("skipping queued id without a condition node: {}", next_id);
                    self.queue.pop_front();
                }
            }
        }

        self.requirements = Some(self.aggregate());
        Transition::Finished
    }

    /// Aggregated requirements, once done.
    pub fn requirements(&self) -> Option<&[RequirementEntry]> {
        self.requirements.as_deref()
    }

    pub fn into_requirements(self) -> Option<Vec<RequirementEntry>> {
        self.requirements
    }

    fn current_mode(&self) -> Option<SelectionMode> {
        self.arena
            .get_node(self.current)
            .and_then(|n| n.data.selection_mode())
    }

    fn is_condition(&self, idx: Index) -> bool {
        self.arena
            .get_node(idx)
            .is_some_and(|n| n.data.is_condition())
    }

    fn choice_index(&self, child_id: &str) -> Option<Index> {
        let idx = self.arena.index_of(child_id)?;
        let node = self.arena.get_node(idx)?;
        (node.parent == Some(self.current) && node.data.is_condition()).then_some(idx)
    }

    /// Direct requirement children of every selected condition, in selection order.
    /// Duplicates across branches are kept.
    fn aggregate(&self) -> Vec<RequirementEntry> {
        debug!("aggregating over {} selected conditions", self.selected.len());
        let mut entries = Vec::new();
        for id in &self.selected {
            let Some(idx) = self.arena.index_of(id) else {
                continue;
            };
            if !self.is_condition(idx) {
                continue;
            }
            for child in self.arena.children(idx) {
                if let Some(requirement) = child.data.requirement() {
                    entries.push(RequirementEntry {
                        id: child.data.id.clone(),
                        name: child.data.name.clone(),
                        note: requirement.note.clone(),
                        group: requirement.group.clone(),
                        optional: requirement.optional,
                        source: requirement.source.clone(),
                    });
                }
            }
        }
        entries
    }
}
