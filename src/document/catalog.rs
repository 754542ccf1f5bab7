/// Fixed lookup tables used by the editors
///
/// RBAC presets and verbs, the per-property-type validation catalog, and the value
/// shape each validation type expects.

use crate::document::types::PropertyType;
use serde::Serialize;

/// A canned RBAC permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RbacPreset {
    pub key: &'static str,
    pub label: &'static str,
    pub group: &'static str,
    pub resources: &'static str,
    pub verbs: &'static str,
}

const FULL_ACCESS: &str = "get;list;watch;create;update;patch;delete";

/// Preset catalog, in display order
pub const RBAC_PRESETS: [RbacPreset; 7] = [
    RbacPreset { key: "deployments", label: "Deployments", group: "apps", resources: "deployments", verbs: FULL_ACCESS },
    RbacPreset { key: "events", label: "Events", group: "", resources: "events", verbs: "create;patch" },
    RbacPreset { key: "routes", label: "Routes (OpenShift)", group: "route.openshift.io", resources: "routes", verbs: FULL_ACCESS },
    RbacPreset { key: "configmaps", label: "ConfigMaps", group: "", resources: "configmaps", verbs: FULL_ACCESS },
    RbacPreset { key: "secrets", label: "Secrets", group: "", resources: "secrets", verbs: FULL_ACCESS },
    RbacPreset { key: "services", label: "Services", group: "", resources: "services", verbs: FULL_ACCESS },
    RbacPreset { key: "ingresses", label: "Ingresses", group: "networking.k8s.io", resources: "ingresses", verbs: FULL_ACCESS },
];

/// Key that selects a free-form rule instead of a preset
pub const CUSTOM_PRESET: &str = "custom";

/// Verbs offered as toggles in the RBAC editor
pub const RBAC_VERBS: [&str; 7] = ["get", "list", "watch", "create", "update", "patch", "delete"];

/// RBAC rules shown per page
pub const RBAC_PAGE_SIZE: usize = 5;

pub fn rbac_preset(key: &str) -> Option<&'static RbacPreset> {
    RBAC_PRESETS.iter().find(|p| p.key == key)
}

const COMMON_VALIDATIONS: [&str; 2] = ["required", "optional"];

/// Validation types offered for a property type, type-specific entries first,
/// then the common pair.
pub fn validation_types(property_type: Option<PropertyType>) -> Vec<&'static str> {
    let specific: &[&'static str] = match property_type {
        Some(PropertyType::String) => &[
            "minLength", "maxLength", "pattern", "enum", "format", "default", "example", "type",
        ],
        Some(PropertyType::Integer) => &[
            "minimum", "maximum", "multipleOf", "enum", "format", "default", "example", "type",
        ],
        Some(PropertyType::Array) => &[
            "minItems", "maxItems", "uniqueItems", "itemsEnum", "itemsPattern", "itemsFormat",
            "default", "example", "type",
        ],
        Some(PropertyType::Object) => &["minProperties", "maxProperties", "default", "example", "type"],
        Some(PropertyType::Boolean) | None => &[],
    };
    specific.iter().chain(COMMON_VALIDATIONS.iter()).copied().collect()
}

/// Type a freshly added validation starts with: the first type-specific entry,
/// or "" when the property type has none.
pub fn initial_validation_type(property_type: Option<PropertyType>) -> &'static str {
    match property_type {
        Some(PropertyType::Boolean) | None => "",
        Some(_) => validation_types(property_type)[0],
    }
}

/// Shape of the value a validation type expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueShape {
    Number,
    Text,
    /// Comma-separated list of allowed values
    Enum,
    /// One of `format_choices`
    Format,
    Boolean,
    /// No value input
    Empty,
}

impl ValueShape {
    pub fn of(validation_type: &str) -> Self {
        match validation_type {
            "minLength" | "maxLength" | "minimum" | "maximum" | "minItems" | "maxItems"
            | "minProperties" | "maxProperties" | "multipleOf" => ValueShape::Number,
            "pattern" | "itemsPattern" | "default" | "example" | "type" => ValueShape::Text,
            "enum" | "itemsEnum" => ValueShape::Enum,
            "format" | "itemsFormat" => ValueShape::Format,
            "uniqueItems" | "exclusiveMinimum" | "exclusiveMaximum" | "required" | "optional" => {
                ValueShape::Boolean
            }
            _ => ValueShape::Empty,
        }
    }
}

/// Format choices for `format`/`itemsFormat`; "" means no format
pub fn format_choices(property_type: Option<PropertyType>) -> &'static [&'static str] {
    match property_type {
        Some(PropertyType::String) => &["", "date-time", "email", "uuid", "uri"],
        _ => &["", "int32", "int64"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_pair_always_offered() {
        for ty in PropertyType::ALL.into_iter().map(Some).chain([None]) {
            let types = validation_types(ty);
            assert_eq!(&types[types.len() - 2..], &["required", "optional"]);
        }
        assert_eq!(validation_types(Some(PropertyType::Boolean)), vec!["required", "optional"]);
    }

    #[test]
    fn test_initial_validation_type() {
        assert_eq!(initial_validation_type(Some(PropertyType::String)), "minLength");
        assert_eq!(initial_validation_type(Some(PropertyType::Array)), "minItems");
        assert_eq!(initial_validation_type(Some(PropertyType::Boolean)), "");
        assert_eq!(initial_validation_type(None), "");
    }

    #[test]
    fn test_value_shapes() {
        assert_eq!(ValueShape::of("maxLength"), ValueShape::Number);
        assert_eq!(ValueShape::of("itemsEnum"), ValueShape::Enum);
        assert_eq!(ValueShape::of("itemsFormat"), ValueShape::Format);
        assert_eq!(ValueShape::of("required"), ValueShape::Boolean);
        assert_eq!(ValueShape::of("pattern"), ValueShape::Text);
        assert_eq!(ValueShape::of(""), ValueShape::Empty);
    }

    #[test]
    fn test_preset_lookup() {
        let preset = rbac_preset("ingresses").unwrap();
        assert_eq!(preset.group, "networking.k8s.io");
        assert_eq!(rbac_preset("events").unwrap().verbs, "create;patch");
        assert!(rbac_preset(CUSTOM_PRESET).is_none());
    }
}
