//! Evaluation service
//!
//! Drives selection sessions over a stored tree, either from a scripted list of
//! picks or interactively through a [`Selector`], and evaluates the checklist.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::application::document::read_tree;
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::WizardConfig;
use crate::domain::{
    missing_requirements, Checklist, RequirementEntry, SelectionSession, Transition, TreeArena,
};
use crate::infrastructure::traits::{DocumentStore, SelectionItem, Selector};

/// Value of the selector item that leaves the current step.
pub const CONTINUE_ITEM: &str = "__continue__";

/// Outcome of an evaluation, ready for display or JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationReport {
    pub requirements: Vec<RequirementEntry>,
    pub missing: Vec<RequirementEntry>,
    pub complete: bool,
}

/// Service for evaluating requirement trees against a taxpayer's choices.
pub struct EvaluationService {
    store: Arc<dyn DocumentStore>,
}

impl EvaluationService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Loads and validates the tree stored under `key`.
    pub fn load_arena(&self, key: &str) -> ApplicationResult<TreeArena> {
        let tree = read_tree(self.store.as_ref(), key)?;
        Ok(TreeArena::from_tree(&tree)?)
    }

    /// Walks a session using `picks` as the user's toggles.
    ///
    /// At every level the picks that are choices there are toggled in order, then
    /// the level is left. Levels without choices are skipped. Picks that never
    /// become choices are logged and ignored.
    #[instrument(level = "debug", skip(self, arena))]
    pub fn run(&self, arena: &TreeArena, picks: &[String]) -> ApplicationResult<Vec<RequirementEntry>> {
        let mut session = SelectionSession::new(arena)?;
        let mut pending: Vec<&str> = picks.iter().map(String::as_str).collect();

        while !session.is_done() {
            let choices: HashSet<&str> = session
                .choices()
                .into_iter()
                .map(|c| c.id.as_str())
                .collect();
            let level: Vec<&str> = pending
                .iter()
                .copied()
                .filter(|p| choices.contains(p))
                .collect();
            pending.retain(|p| !level.contains(p));

            let mut moved = false;
            let mut picks = level.into_iter();
            for pick in picks.by_ref() {
                if matches!(
                    session.toggle(pick),
                    Transition::Advanced | Transition::Finished
                ) {
                    moved = true;
                    break;
                }
            }
            for pick in picks {
                warn!("pick {} dropped: level already left by single selection", pick);
            }
            if !moved {
                session.advance();
            }
        }

        for pick in pending {
            warn!("pick {} never became a choice", pick);
        }
        let requirements = session.into_requirements().unwrap_or_default();
        debug!("run: {} requirements", requirements.len());
        Ok(requirements)
    }

    /// Builds the completeness report for a set of checked requirement ids.
    pub fn report(&self, requirements: Vec<RequirementEntry>, checked: &[String]) -> EvaluationReport {
        let checked: HashSet<String> = checked.iter().cloned().collect();
        let missing: Vec<RequirementEntry> = missing_requirements(&requirements, &checked)
            .into_iter()
            .cloned()
            .collect();
        EvaluationReport {
            complete: missing.is_empty(),
            requirements,
            missing,
        }
    }

    /// Scripted end-to-end evaluation of a stored transaction.
    pub fn evaluate(
        &self,
        key: &str,
        picks: &[String],
        checked: &[String],
    ) -> ApplicationResult<EvaluationReport> {
        let arena = self.load_arena(key)?;
        let requirements = self.run(&arena, picks)?;
        Ok(self.report(requirements, checked))
    }

    /// Interactive drill-down followed by the interactive checklist.
    ///
    /// Returns None if the user cancels at any prompt.
    pub fn interactive(
        &self,
        arena: &TreeArena,
        selector: &dyn Selector,
        wizard: &WizardConfig,
    ) -> ApplicationResult<Option<Checklist>> {
        let mut session = SelectionSession::new(arena)?;

        while !session.is_done() {
            let choices = session.choices();
            if choices.is_empty() && wizard.auto_skip_empty {
                debug!("auto-skipping level without choices");
                session.advance();
                continue;
            }

            let title = session
                .current()
                .map(|c| c.to_string())
                .unwrap_or_default();
            let mut items: Vec<SelectionItem> = choices
                .iter()
                .enumerate()
                .map(|(row, c)| SelectionItem {
                    display: row_label(row, session.is_selected(&c.id), &c.to_string()),
                    value: c.id.clone(),
                })
                .collect();
            items.push(continue_item("continue"));

            let prompt = format!("{} {} ", wizard.prompt, title);
            match select(selector, &items, &prompt)? {
                None => return Ok(None),
                Some(item) if item.value == CONTINUE_ITEM => {
                    session.advance();
                }
                Some(item) => {
                    session.toggle(&item.value);
                }
            }
        }

        let mut checklist = Checklist::new(session.into_requirements().unwrap_or_default());
        loop {
            let mut items: Vec<SelectionItem> = checklist
                .requirements()
                .iter()
                .enumerate()
                .map(|(row, r)| SelectionItem {
                    display: row_label(row, checklist.is_checked(&r.id), &r.name),
                    value: r.id.clone(),
                })
                .collect();
            items.push(continue_item("done"));

            let prompt = format!("{} checklist ", wizard.prompt);
            match select(selector, &items, &prompt)? {
                None => return Ok(None),
                Some(item) if item.value == CONTINUE_ITEM => break,
                Some(item) => {
                    checklist.toggle(&item.value);
                }
            }
        }
        Ok(Some(checklist))
    }
}

/// Selector rows are mapped back by their display text, so every row carries
/// its position: same-named nodes would collide otherwise.
fn row_label(row: usize, marked: bool, name: &str) -> String {
    format!("{:>2}. [{}] {}", row + 1, if marked { "x" } else { " " }, name)
}

fn continue_item(label: &str) -> SelectionItem {
    SelectionItem {
        display: format!("-> {}", label),
        value: CONTINUE_ITEM.to_string(),
    }
}

fn select(
    selector: &dyn Selector,
    items: &[SelectionItem],
    prompt: &str,
) -> ApplicationResult<Option<SelectionItem>> {
    selector
        .select_one(items, prompt)
        .map_err(ApplicationError::Selector)
}
