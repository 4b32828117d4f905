//! EvaluationService: scripted runs, reports and the interactive wizard.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use reqtree::application::services::{EvaluationService, CONTINUE_ITEM};
use reqtree::application::{write_tree, ApplicationError};
use reqtree::config::WizardConfig;
use reqtree::domain::{Node, Requirement, SelectionMode, TransactionMeta};
use reqtree::infrastructure::traits::{
    DocumentStore, MemoryDocumentStore, SelectionItem, Selector,
};
use reqtree::util::testing;

/// Mock selector replaying a script of item values; `None` cancels.
struct MockSelector {
    script: Mutex<VecDeque<Option<&'static str>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockSelector {
    fn new(script: Vec<Option<&'static str>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Selector for MockSelector {
    fn select_one(
        &self,
        items: &[SelectionItem],
        prompt: &str,
    ) -> Result<Option<SelectionItem>, String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.script.lock().unwrap().pop_front() {
            Some(Some(value)) => items
                .iter()
                .find(|i| i.value == value)
                .cloned()
                .map(Some)
                .ok_or_else(|| format!("no item with value {value}")),
            Some(None) => Ok(None),
            None => Err("script exhausted".to_string()),
        }
    }
}

/// Selector picking rows by position and mapping the row back through its
/// display text, the way the skim selector resolves its output.
struct RowSelector {
    rows: Mutex<VecDeque<usize>>,
}

impl RowSelector {
    fn new(rows: Vec<usize>) -> Self {
        Self {
            rows: Mutex::new(rows.into()),
        }
    }
}

impl Selector for RowSelector {
    fn select_one(
        &self,
        items: &[SelectionItem],
        _prompt: &str,
    ) -> Result<Option<SelectionItem>, String> {
        let row = self
            .rows
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| "script exhausted".to_string())?;
        let display = &items.get(row).ok_or("row out of range")?.display;
        Ok(items.iter().find(|i| &i.display == display).cloned())
    }
}

fn setup() -> (Arc<MemoryDocumentStore>, EvaluationService) {
    testing::init_test_setup();
    let store = Arc::new(MemoryDocumentStore::new());
    store
        .put("permit", include_str!("resources/business_permit.json"))
        .unwrap();
    let service = EvaluationService::new(store.clone());
    (store, service)
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[test]
fn given_picks_across_levels_when_evaluating_then_reports_missing() {
    let (_store, service) = setup();

    let report = service
        .evaluate(
            "permit",
            &strings(&["new", "lessee", "corp"]),
            &strings(&["app-form"]),
        )
        .unwrap();

    let all: Vec<_> = report.requirements.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(all, vec!["app-form", "lease", "consent", "sec", "board"]);
    let missing: Vec<_> = report.missing.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(missing, vec!["lease", "consent", "sec"]);
    assert!(!report.complete);
}

#[test]
fn given_one_member_per_group_checked_when_evaluating_then_complete() {
    let (_store, service) = setup();

    let report = service
        .evaluate(
            "permit",
            &strings(&["new", "lessee", "corp"]),
            &strings(&["app-form", "lease", "sec"]),
        )
        .unwrap();

    assert!(report.complete);
    assert!(report.missing.is_empty());
}

#[test]
fn given_pick_that_never_becomes_choice_when_running_then_ignored() {
    let (_store, service) = setup();
    let arena = service.load_arena("permit").unwrap();

    let requirements = service
        .run(&arena, &strings(&["renewal", "corp"]))
        .unwrap();

    let ids: Vec<_> = requirements.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["app-form", "prev-permit", "gross"]);
}

#[test]
fn given_single_select_level_when_running_then_one_pick_suffices() {
    let (_store, service) = setup();
    let arena = service.load_arena("permit").unwrap();

    let requirements = service.run(&arena, &strings(&["new", "sole"])).unwrap();

    let ids: Vec<_> = requirements.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["app-form", "dti"]);
}

#[test]
fn given_report_when_serialized_then_json_has_complete_flag() {
    let (_store, service) = setup();

    let report = service.evaluate("permit", &[], &[]).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["complete"], serde_json::Value::Bool(false));
    assert_eq!(json["missing"][0]["id"], "app-form");
}

#[test]
fn given_duplicate_ids_in_document_when_loading_arena_then_rejected() {
    let (store, service) = setup();
    let tree = Node::new_root(TransactionMeta::default()).with_children(vec![
        Node::requirement("dup", "A", Requirement::default()),
        Node::requirement("dup", "B", Requirement::default()),
    ]);
    write_tree(store.as_ref(), "broken", &tree).unwrap();

    let result = service.load_arena("broken");

    assert!(matches!(result, Err(ApplicationError::Domain(_))));
}

#[test]
fn given_scripted_user_when_running_wizard_then_checklist_complete() {
    let (_store, service) = setup();
    let arena = service.load_arena("permit").unwrap();
    let selector = MockSelector::new(vec![
        Some("new"),
        Some("lessee"),
        Some(CONTINUE_ITEM),
        Some("corp"),
        Some("app-form"),
        Some("consent"),
        Some("sec"),
        Some(CONTINUE_ITEM),
    ]);

    let checklist = service
        .interactive(&arena, &selector, &WizardConfig::default())
        .unwrap()
        .expect("not cancelled");

    assert_eq!(checklist.requirements().len(), 5);
    assert!(checklist.is_checked("consent"));
    assert!(checklist.is_complete());
    assert_eq!(selector.prompts().len(), 8);
}

#[test]
fn given_user_cancels_when_running_wizard_then_none() {
    let (_store, service) = setup();
    let arena = service.load_arena("permit").unwrap();
    let selector = MockSelector::new(vec![Some("renewal"), None]);

    let result = service
        .interactive(&arena, &selector, &WizardConfig::default())
        .unwrap();

    assert!(result.is_none());
}

#[test]
fn given_root_without_conditions_when_auto_skipping_then_goes_straight_to_checklist() {
    let (store, service) = setup();
    let tree = Node::new_root(TransactionMeta::default()).with_children(vec![Node::requirement(
        "form",
        "Application Form",
        Requirement::default(),
    )]);
    write_tree(store.as_ref(), "flat", &tree).unwrap();
    let arena = service.load_arena("flat").unwrap();
    let selector = MockSelector::new(vec![Some("form"), Some(CONTINUE_ITEM)]);

    let checklist = service
        .interactive(&arena, &selector, &WizardConfig::default())
        .unwrap()
        .unwrap();

    assert!(checklist.is_complete());
    assert!(selector.prompts().iter().all(|p| p.contains("checklist")));
}

#[test]
fn given_auto_skip_disabled_when_level_empty_then_user_is_asked() {
    let (store, service) = setup();
    let tree = Node::new_root(TransactionMeta::default());
    write_tree(store.as_ref(), "empty", &tree).unwrap();
    let arena = service.load_arena("empty").unwrap();
    let selector = MockSelector::new(vec![Some(CONTINUE_ITEM), Some(CONTINUE_ITEM)]);
    let wizard = WizardConfig {
        auto_skip_empty: false,
        ..WizardConfig::default()
    };

    let checklist = service.interactive(&arena, &selector, &wizard).unwrap().unwrap();

    assert!(checklist.requirements().is_empty());
    assert_eq!(selector.prompts().len(), 2);
}

#[test]
fn given_same_named_requirements_when_picking_second_row_then_second_id_checked() {
    let (store, service) = setup();
    let tree = Node::new_root(TransactionMeta::default()).with_children(vec![
        Node::condition("a", "Branch", SelectionMode::Multi).with_children(vec![
            Node::requirement("id-a", "Valid ID", Requirement::default()),
        ]),
        Node::condition("b", "Branch", SelectionMode::Multi).with_children(vec![
            Node::requirement("id-b", "Valid ID", Requirement::default()),
        ]),
    ]);
    write_tree(store.as_ref(), "twins", &tree).unwrap();
    let arena = service.load_arena("twins").unwrap();
    // root: a, b, continue; checklist: second "Valid ID", done
    let selector = RowSelector::new(vec![0, 1, 2, 1, 2]);

    let checklist = service
        .interactive(&arena, &selector, &WizardConfig::default())
        .unwrap()
        .unwrap();

    assert_eq!(checklist.requirements().len(), 2);
    assert!(checklist.is_checked("id-b"));
    assert!(!checklist.is_checked("id-a"));
    assert!(!checklist.is_complete());
}

#[test]
fn given_second_pick_on_single_select_level_when_running_then_dropped() {
    let (_store, service) = setup();
    let arena = service.load_arena("permit").unwrap();

    let requirements = service
        .run(&arena, &strings(&["new", "sole", "corp"]))
        .unwrap();

    let ids: Vec<_> = requirements.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["app-form", "dti"]);
}
