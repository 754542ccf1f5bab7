/// Validation layer
///
/// Field validators producing a report shaped like the document, plus the touched
/// set that decides which of those errors a view may show.

pub mod rules;
pub mod touched;

pub use rules::{
    validate_domain, validate_project_name, validate_repo, FieldError, FieldErrorKind,
    PropertyErrors, ValidationReport,
};
pub use touched::{FieldPath, TouchedSet};
