//! AuthoringService against a file-backed document store.

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use reqtree::application::services::{AuthoringService, EditOutcome, NodePatch, RequirementDraft};
use reqtree::application::ApplicationError;
use reqtree::domain::{DomainError, NodeKind, SelectionMode, TransactionMeta, ROOT_ID};
use reqtree::infrastructure::traits::{FileDocumentStore, RealFileSystem};
use reqtree::util::testing;

fn setup() -> (TempDir, AuthoringService) {
    testing::init_test_setup();
    let temp = TempDir::new().expect("create temp dir");
    let store = FileDocumentStore::new(Arc::new(RealFileSystem), temp.path().join("store"));
    (temp, AuthoringService::new(Arc::new(store)))
}

fn cedula_meta() -> TransactionMeta {
    TransactionMeta {
        fee: Some(5.0),
        service: Some("Community Tax Certificate".into()),
        ..TransactionMeta::default()
    }
}

#[test]
fn given_new_key_when_creating_transaction_then_root_only_document_written() {
    let (temp, service) = setup();

    let tree = service.create_transaction("cedula", cedula_meta()).unwrap();

    assert_eq!(tree.id, ROOT_ID);
    assert!(tree.children().is_empty());
    let path = temp.path().join("store/cedula.json");
    assert!(path.exists());
    let content = fs::read_to_string(path).unwrap();
    assert!(content.contains("\"version\": 1"));
    assert!(content.contains("Community Tax Certificate"));
    assert_eq!(service.list().unwrap(), vec!["cedula"]);
}

#[test]
fn given_existing_key_when_creating_again_then_rejected() {
    let (_temp, service) = setup();
    service.create_transaction("cedula", cedula_meta()).unwrap();

    let result = service.create_transaction("cedula", TransactionMeta::default());

    assert!(matches!(result, Err(ApplicationError::TransactionExists(_))));
}

#[test]
fn given_unknown_key_when_loading_then_not_found() {
    let (_temp, service) = setup();

    assert!(matches!(
        service.load("nope"),
        Err(ApplicationError::TransactionNotFound(_))
    ));
}

#[test]
fn given_conditions_and_requirements_when_added_then_persisted_under_parents() {
    let (_temp, service) = setup();
    service.create_transaction("cedula", cedula_meta()).unwrap();

    let employed = service
        .add_condition("cedula", ROOT_ID, "Employed", SelectionMode::Single)
        .unwrap();
    let local = service
        .add_condition("cedula", &employed, "Local Employee", SelectionMode::Multi)
        .unwrap();
    let id = service
        .add_requirement(
            "cedula",
            &local,
            RequirementDraft {
                name: "Valid ID".into(),
                group: Some("identity".into()),
                ..RequirementDraft::default()
            },
        )
        .unwrap();

    let tree = service.load("cedula").unwrap();
    assert_eq!(tree.subtree_size(), 4);
    assert_eq!(service.parent_of("cedula", &id).unwrap().unwrap().id, local);
    assert_eq!(service.parent_of("cedula", &local).unwrap().unwrap().id, employed);
    let requirement = service.find("cedula", &id).unwrap().unwrap();
    assert_eq!(
        requirement.as_requirement().unwrap().group.as_deref(),
        Some("identity")
    );
}

#[test]
fn given_requirement_parent_when_adding_child_then_not_a_condition() {
    let (_temp, service) = setup();
    service.create_transaction("cedula", cedula_meta()).unwrap();
    let id = service
        .add_requirement(
            "cedula",
            ROOT_ID,
            RequirementDraft {
                name: "Application Form".into(),
                ..RequirementDraft::default()
            },
        )
        .unwrap();

    let result = service.add_condition("cedula", &id, "Nested", SelectionMode::Multi);

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::NotACondition(_)))
    ));
}

#[test]
fn given_missing_parent_when_adding_then_node_not_found() {
    let (_temp, service) = setup();
    service.create_transaction("cedula", cedula_meta()).unwrap();

    let result = service.add_condition("cedula", "ghost", "X", SelectionMode::Multi);

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::NodeNotFound(_)))
    ));
}

#[test]
fn given_condition_with_children_when_renaming_then_children_kept() {
    let (_temp, service) = setup();
    service.create_transaction("cedula", cedula_meta()).unwrap();
    let employed = service
        .add_condition("cedula", ROOT_ID, "Employed", SelectionMode::Multi)
        .unwrap();
    service
        .add_condition("cedula", &employed, "Local", SelectionMode::Multi)
        .unwrap();

    let outcome = service
        .update(
            "cedula",
            &employed,
            &NodePatch {
                name: Some("Employed (any)".into()),
                selection_mode: Some(SelectionMode::Single),
                ..NodePatch::default()
            },
        )
        .unwrap();

    assert_eq!(outcome, EditOutcome::Applied);
    let node = service.find("cedula", &employed).unwrap().unwrap();
    assert_eq!(node.name, "Employed (any)");
    assert_eq!(node.selection_mode(), Some(SelectionMode::Single));
    assert_eq!(node.children().len(), 1);
}

#[test]
fn given_identical_patch_when_updating_then_unchanged() {
    let (_temp, service) = setup();
    service.create_transaction("cedula", cedula_meta()).unwrap();
    let employed = service
        .add_condition("cedula", ROOT_ID, "Employed", SelectionMode::Multi)
        .unwrap();

    let outcome = service
        .update(
            "cedula",
            &employed,
            &NodePatch {
                name: Some("Employed".into()),
                ..NodePatch::default()
            },
        )
        .unwrap();

    assert_eq!(outcome, EditOutcome::Unchanged);
}

#[test]
fn given_root_id_when_removing_then_unchanged_and_tree_kept() {
    let (_temp, service) = setup();
    service.create_transaction("cedula", cedula_meta()).unwrap();
    service
        .add_condition("cedula", ROOT_ID, "Employed", SelectionMode::Multi)
        .unwrap();

    let outcome = service.remove("cedula", ROOT_ID).unwrap();

    assert_eq!(outcome, EditOutcome::Unchanged);
    assert_eq!(service.load("cedula").unwrap().subtree_size(), 2);
}

#[test]
fn given_subtree_when_removing_condition_then_descendants_gone() {
    let (_temp, service) = setup();
    service.create_transaction("cedula", cedula_meta()).unwrap();
    let employed = service
        .add_condition("cedula", ROOT_ID, "Employed", SelectionMode::Multi)
        .unwrap();
    let local = service
        .add_condition("cedula", &employed, "Local", SelectionMode::Multi)
        .unwrap();

    assert_eq!(service.remove("cedula", &employed).unwrap(), EditOutcome::Applied);

    assert!(service.find("cedula", &local).unwrap().is_none());
    assert_eq!(service.remove("cedula", &employed).unwrap(), EditOutcome::Unchanged);
}

#[test]
fn given_transaction_when_publishing_and_editing_meta_then_root_updated() {
    let (_temp, service) = setup();
    service.create_transaction("cedula", cedula_meta()).unwrap();

    assert_eq!(service.publish("cedula", true).unwrap(), EditOutcome::Applied);
    assert_eq!(service.publish("cedula", true).unwrap(), EditOutcome::Unchanged);
    service
        .set_meta(
            "cedula",
            TransactionMeta {
                fee: Some(10.0),
                published: true,
                ..cedula_meta()
            },
        )
        .unwrap();

    let tree = service.load("cedula").unwrap();
    match &tree.kind {
        NodeKind::Condition(c) => {
            assert!(c.meta.published);
            assert_eq!(c.meta.fee, Some(10.0));
        }
        NodeKind::Requirement(_) => panic!("root must be a condition"),
    }
}

#[test]
fn given_hand_written_bare_tree_when_loading_then_accepted() {
    let (temp, service) = setup();
    let dir = temp.path().join("store");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("permit.json"),
        include_str!("resources/business_permit.json"),
    )
    .unwrap();

    let tree = service.load("permit").unwrap();

    assert_eq!(tree.subtree_size(), 14);
    assert_eq!(service.list().unwrap(), vec!["permit"]);
}

#[test]
fn given_path_like_key_when_loading_then_invalid_key() {
    let (_temp, service) = setup();

    assert!(matches!(
        service.load("../secrets"),
        Err(ApplicationError::InvalidKey { .. })
    ));
}
