/// Project document layer
///
/// This module owns the canonical in-memory project and everything that reads or
/// rewrites it without user-interface state:
/// - Type definitions (Project, Crd, RbacRule, Webhook, Property, Validation)
/// - Fixed catalogs (RBAC presets and verbs, validation types)
/// - Derived fields (plural, webhook path)
/// - Legacy shape migration
/// - The JSON text mirror

pub mod catalog;
pub mod derived;
pub mod migrate;
pub mod mirror;
pub mod types;

pub use mirror::{MirrorError, TextMirror};
pub use types::{
    Crd, FailurePolicy, MatchPolicy, Namespaces, Operation, Project, Property, PropertyType,
    RbacRule, SideEffects, Validation, ValidationValue, Webhook, WebhookType,
};
