//! Requirement checklist and completeness evaluation.

use std::collections::HashSet;

use serde::Serialize;

use crate::domain::node::Source;

/// One requirement reachable from a selected condition, produced at aggregation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementEntry {
    pub id: String,
    pub name: String,
    pub note: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
}

/// Requirements that still block completion.
///
/// An entry is excused if it is checked, optional, or shares its group label
/// with any checked entry. Group labels are compared as plain strings across the
/// whole list, regardless of which branch produced the entry.
pub fn missing_requirements<'a>(
    requirements: &'a [RequirementEntry],
    checked: &HashSet<String>,
) -> Vec<&'a RequirementEntry> {
    let checked_groups: HashSet<&str> = requirements
        .iter()
        .filter(|r| checked.contains(&r.id))
        .filter_map(|r| r.group.as_deref())
        .collect();

    requirements
        .iter()
        .filter(|r| !checked.contains(&r.id))
        .filter(|r| !r.optional)
        .filter(|r| match r.group.as_deref() {
            Some(group) => !checked_groups.contains(group),
            None => true,
        })
        .collect()
}

pub fn is_complete(requirements: &[RequirementEntry], checked: &HashSet<String>) -> bool {
    missing_requirements(requirements, checked).is_empty()
}

/// Aggregated requirements plus the ids the user has ticked off.
#[derive(Debug, Clone, Default)]
pub struct Checklist {
    requirements: Vec<RequirementEntry>,
    checked: HashSet<String>,
}

impl Checklist {
    pub fn new(requirements: Vec<RequirementEntry>) -> Self {
        Self {
            requirements,
            checked: HashSet::new(),
        }
    }

    pub fn requirements(&self) -> &[RequirementEntry] {
        &self.requirements
    }

    pub fn checked(&self) -> &HashSet<String> {
        &self.checked
    }

    pub fn is_checked(&self, id: &str) -> bool {
        self.checked.contains(id)
    }

    /// Flips `id`; returns the new checked state. Unknown ids are ignored (false).
    pub fn toggle(&mut self, id: &str) -> bool {
        if !self.requirements.iter().any(|r| r.id == id) {
            return false;
        }
        if self.checked.remove(id) {
            false
        } else {
            self.checked.insert(id.to_string());
            true
        }
    }

    pub fn check(&mut self, id: &str) {
        if self.requirements.iter().any(|r| r.id == id) {
            self.checked.insert(id.to_string());
        }
    }

    pub fn uncheck(&mut self, id: &str) {
        self.checked.remove(id);
    }

    pub fn missing(&self) -> Vec<&RequirementEntry> {
        missing_requirements(&self.requirements, &self.checked)
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn entry(id: &str, group: Option<&str>, optional: bool) -> RequirementEntry {
        RequirementEntry {
            id: id.to_string(),
            name: format!("Requirement {id}"),
            note: String::new(),
            group: group.map(str::to_string),
            optional,
            source: None,
        }
    }

    fn checked(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn missing_ids(requirements: &[RequirementEntry], ids: &[&str]) -> Vec<String> {
        missing_requirements(requirements, &checked(ids))
            .into_iter()
            .map(|r| r.id.clone())
            .collect()
    }

    #[test]
    fn given_group_member_checked_when_evaluating_then_group_is_satisfied() {
        let reqs = vec![entry("1", Some("G"), false), entry("2", Some("G"), false)];

        assert!(missing_ids(&reqs, &["1"]).is_empty());
        assert!(is_complete(&reqs, &checked(&["1"])));
    }

    #[test]
    fn given_ungrouped_sibling_when_only_other_checked_then_stays_missing() {
        let reqs = vec![entry("1", Some("G"), false), entry("2", None, false)];

        assert_eq!(missing_ids(&reqs, &["1"]), vec!["2"]);
    }

    #[rstest]
    #[case(&[])]
    #[case(&["opt"])]
    #[case(&["other"])]
    fn given_optional_requirement_when_evaluating_then_never_missing(#[case] ticked: &[&str]) {
        let reqs = vec![entry("opt", None, true), entry("other", Some("G"), true)];

        assert!(missing_ids(&reqs, ticked).is_empty());
    }

    #[test]
    fn given_optional_group_member_checked_when_evaluating_then_satisfies_group() {
        let reqs = vec![entry("opt", Some("G"), true), entry("req", Some("G"), false)];

        assert!(missing_ids(&reqs, &["opt"]).is_empty());
        assert_eq!(missing_ids(&reqs, &[]), vec!["req"]);
    }

    #[test]
    fn given_same_group_label_in_unrelated_branches_when_one_checked_then_both_satisfied() {
        // labels are not scoped to a subtree
        let reqs = vec![
            entry("tin-card", Some("proof"), false),
            entry("utility-bill", Some("proof"), false),
        ];

        assert!(missing_ids(&reqs, &["utility-bill"]).is_empty());
    }

    #[test]
    fn given_checklist_when_toggling_then_tracks_completeness() {
        let mut list = Checklist::new(vec![entry("1", None, false), entry("2", None, false)]);

        assert!(!list.is_complete());
        assert!(list.toggle("1"));
        assert!(list.toggle("2"));
        assert!(list.is_complete());
        assert!(!list.toggle("2"));
        assert_eq!(list.missing().len(), 1);
        assert!(!list.toggle("unknown"));
        assert!(!list.is_checked("unknown"));
    }

    #[test]
    fn given_duplicate_entries_when_checking_id_then_all_copies_satisfied() {
        let mut list = Checklist::new(vec![entry("dup", None, false), entry("dup", None, false)]);

        assert_eq!(list.missing().len(), 2);
        list.check("dup");
        assert!(list.is_complete());
    }
}
