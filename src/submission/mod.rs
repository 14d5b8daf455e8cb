pub mod form;
pub mod workflow;

pub use form::{FieldError, FieldProblem, FormErrors, FormField, ItemForm, ValidForm};
pub use workflow::{Banner, SubmissionSettings, SubmissionWorkflow, SubmitState};
