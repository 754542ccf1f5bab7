/// OSDK wizard: interactive Operator SDK project builder
///
/// This library holds the wizard session behind a CRD scaffolding front-end: the
/// project document and its live JSON text mirror, field validation with touched
/// tracking, derived fields, and the pipeline that submits the document to a
/// generation service and saves the returned archive.

// Core configuration and setup
pub mod config;

// Project document - types, catalogs, derived fields, legacy migration, text mirror
pub mod document;

// Field validators and touched tracking
pub mod validate;

// Wizard session - the single source of truth and every edit operation
pub mod session;

// Submission pipeline - generation request, streamed download, archive saving
pub mod submit;

// HTTP API layer - JSON endpoints for a browser front-end
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use document::{Crd, Project, TextMirror};
pub use session::{EditError, Session, WizardStep};
pub use submit::{Generator, Progress, SubmitError};
pub use server::start_server;
