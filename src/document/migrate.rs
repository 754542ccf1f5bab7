/// Backward-compatible CRD shape migration
///
/// Run on every externally sourced CRD object before it is deserialized. New legacy
/// shapes get a branch here; call sites only ever see `migrate_crd`.

use crate::document::catalog::RBAC_PRESETS;
use serde_json::{json, Map, Value};

/// Bring a raw CRD object up to the current shape.
///
/// Already-current input is returned unchanged, so the migration is idempotent.
pub fn migrate_crd(crd: Value) -> Value {
    match crd {
        Value::Object(mut fields) => {
            let rbac = fields.remove("rbac").unwrap_or(Value::Null);
            fields.insert("rbac".to_string(), migrate_rbac(rbac));
            Value::Object(fields)
        }
        other => other,
    }
}

/// RBAC used to be an object of boolean flags keyed by preset name
/// (`{"deployments": true, "events": false}`); it is now a list of rules.
fn migrate_rbac(rbac: Value) -> Value {
    match rbac {
        Value::Array(_) => rbac,
        Value::Object(flags) => Value::Array(rules_from_flags(&flags)),
        _ => Value::Array(Vec::new()),
    }
}

fn rules_from_flags(flags: &Map<String, Value>) -> Vec<Value> {
    RBAC_PRESETS
        .iter()
        .filter(|preset| flags.get(preset.key).is_some_and(is_truthy))
        .map(|preset| {
            json!({
                "group": preset.group,
                "resources": preset.resources,
                "verbs": preset.verbs,
                "preset": preset.key,
            })
        })
        .collect()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_flags_become_rules_in_preset_order() {
        let legacy = json!({
            "kind": "Widget",
            "rbac": {"secrets": true, "deployments": true, "events": false, "routes": 0}
        });
        let migrated = migrate_crd(legacy);
        let rbac = migrated["rbac"].as_array().unwrap();
        assert_eq!(rbac.len(), 2);
        assert_eq!(rbac[0]["preset"], "deployments");
        assert_eq!(rbac[0]["group"], "apps");
        assert_eq!(rbac[1]["preset"], "secrets");
        assert_eq!(rbac[1]["group"], "");
        assert_eq!(migrated["kind"], "Widget");
    }

    #[test]
    fn test_migration_is_idempotent() {
        let legacy = json!({"rbac": {"events": true, "ingresses": "yes"}});
        let once = migrate_crd(legacy);
        let twice = migrate_crd(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_or_null_rbac_becomes_empty_list() {
        assert_eq!(migrate_crd(json!({"kind": "A"}))["rbac"], json!([]));
        assert_eq!(migrate_crd(json!({"rbac": null}))["rbac"], json!([]));
    }

    #[test]
    fn test_non_object_passes_through() {
        assert_eq!(migrate_crd(json!("oops")), json!("oops"));
    }
}
