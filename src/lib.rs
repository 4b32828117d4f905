//! reqtree: transaction requirement trees
//!
//! A transaction (e.g. a permit application) owns a tree of conditions and
//! requirements. Authors edit the tree with the pure engine in [`domain::editor`];
//! applicants drill down through conditions with [`domain::SelectionSession`]
//! and check off the aggregated requirements in a [`domain::Checklist`].

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
