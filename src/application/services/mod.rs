//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (DocumentStore, Selector)
//! but are themselves concrete structs, not traits.

mod authoring;
mod evaluation;

pub use authoring::{AuthoringService, EditOutcome, NodePatch, RequirementDraft};
pub use evaluation::{EvaluationReport, EvaluationService, CONTINUE_ITEM};
