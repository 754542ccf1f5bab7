/// Derived fields with override detection
///
/// A derived field follows its source until the user edits it by hand. The rule:
/// recompute only while the current value is empty or still equals the value the
/// previous sources would have produced.

use crate::document::types::WebhookType;

/// Refresh `current` to `next_auto` unless it has been overridden.
///
/// `previous_auto` is what the derivation yielded before the source changed.
/// Returns true when the field was rewritten.
pub fn refresh_derived(current: &mut String, previous_auto: &str, next_auto: String) -> bool {
    if current.is_empty() || current == previous_auto {
        *current = next_auto;
        true
    } else {
        false
    }
}

/// Kinds are PascalCase; only the first character is forced upper.
pub fn capitalize_kind(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn default_plural(kind: &str) -> String {
    if kind.is_empty() {
        String::new()
    } else {
        format!("{kind}s")
    }
}

/// `/<verb>-<version>-<kind>`, lowercased
pub fn webhook_path(webhook_type: WebhookType, version: &str, kind: &str) -> String {
    format!(
        "/{}-{}-{}",
        webhook_type.path_verb(),
        version.to_lowercase(),
        kind.to_lowercase()
    )
}

/// Resource list a new webhook watches: the plural, else the lowercased kind + "s"
pub fn default_webhook_resource(kind: &str, plural: &str) -> String {
    if plural.is_empty() {
        format!("{}s", kind.to_lowercase())
    } else {
        plural.to_string()
    }
}
