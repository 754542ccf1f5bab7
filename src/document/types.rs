/// Core document type definitions
///
/// Defines the project document the wizard edits: the project header, its CRDs and
/// their RBAC rules, webhooks, properties and validations. The CRD-level types are
/// serialized/deserialized directly as the interchange JSON; the project root goes
/// through `document::mirror` because its namespace list has two representations.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// The root project document
///
/// Created fresh with one empty CRD at session start. `namespaces` keeps the UI
/// representation (toggle + comma-separated text); the serialized form is derived
/// from it by `Namespaces::to_list`.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    /// Root DNS name used as the API group suffix (e.g. "example.com")
    pub domain: String,
    /// Source repository (e.g. "github.com/org/repo")
    pub repo: String,
    /// Operator project name, also the archive file stem
    pub project_name: String,
    /// Watched namespaces; empty list means cluster scope
    pub namespaces: Namespaces,
    /// CRD definitions in tab order
    pub crds: Vec<Crd>,
}

impl Project {
    /// Empty project holding a single blank CRD
    pub fn new() -> Self {
        Self {
            domain: String::new(),
            repo: String::new(),
            project_name: String::new(),
            namespaces: Namespaces::default(),
            crds: vec![Crd::default()],
        }
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

/// Namespace scope as edited in the form: a toggle plus free comma-separated text
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Namespaces {
    pub namespaced: bool,
    pub text: String,
}

impl Namespaces {
    /// Scope built from a namespace list; namespaced iff the list is non-empty
    pub fn from_list(list: &[String]) -> Self {
        Self {
            namespaced: !list.is_empty(),
            text: list.join(","),
        }
    }

    /// Scope built from comma-joined text; namespaced iff the text is non-blank
    pub fn from_text(text: &str) -> Self {
        Self {
            namespaced: !text.trim().is_empty(),
            text: text.to_string(),
        }
    }

    /// Derived namespace list. Always empty while the toggle is off.
    pub fn to_list(&self) -> Vec<String> {
        if !self.namespaced {
            return Vec::new();
        }
        self.text
            .split(',')
            .map(str::trim)
            .filter(|ns| !ns.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// A single Custom Resource Definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Crd {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,
    /// Scaffold a controller for this CRD
    pub controller: bool,
    /// Add a status subresource
    pub status: bool,
    pub rbac: Vec<RbacRule>,
    pub webhooks: Vec<Webhook>,
    pub properties: Vec<Property>,
}

impl Default for Crd {
    fn default() -> Self {
        Self {
            group: String::new(),
            version: String::new(),
            kind: String::new(),
            plural: String::new(),
            controller: true,
            status: false,
            rbac: Vec::new(),
            webhooks: Vec::new(),
            properties: Vec::new(),
        }
    }
}

/// Permission granted to the generated controller
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RbacRule {
    /// API group ("" is the core group)
    pub group: String,
    pub resources: String,
    /// Semicolon-joined verb list (e.g. "get;list;watch")
    pub verbs: String,
    /// Preset key the rule was filled from, if any
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_as_none"
    )]
    pub preset: Option<String>,
}

/// Admission webhook registered by the generated controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Webhook {
    #[serde(rename = "type")]
    pub webhook_type: WebhookType,
    pub path: String,
    pub failure_policy: FailurePolicy,
    pub side_effects: SideEffects,
    pub match_policy: MatchPolicy,
    #[serde(deserialize_with = "normalized_operations")]
    pub operations: Vec<Operation>,
    pub resources: Vec<String>,
}

impl Default for Webhook {
    fn default() -> Self {
        Self {
            webhook_type: WebhookType::default(),
            path: String::new(),
            failure_policy: FailurePolicy::default(),
            side_effects: SideEffects::default(),
            match_policy: MatchPolicy::default(),
            operations: Vec::new(),
            resources: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookType {
    #[default]
    Mutating,
    Validating,
    Conversion,
}

impl WebhookType {
    /// Verb used in the derived webhook path
    pub fn path_verb(self) -> &'static str {
        match self {
            WebhookType::Mutating => "mutate",
            WebhookType::Validating => "validate",
            WebhookType::Conversion => "convert",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    #[default]
    Fail,
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SideEffects {
    #[default]
    None,
    NoneOnDryRun,
    Some,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchPolicy {
    #[default]
    Exact,
    Equivalent,
}

/// Admission operation intercepted by a webhook
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CREATE" => Ok(Operation::Create),
            "UPDATE" => Ok(Operation::Update),
            "DELETE" => Ok(Operation::Delete),
            other => Err(format!("unknown webhook operation: {other:?}")),
        }
    }
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Schema property of a CRD
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Property {
    pub name: String,
    /// Unset until the user picks a type; serialized as ""
    #[serde(
        rename = "type",
        serialize_with = "none_as_empty",
        deserialize_with = "empty_as_none"
    )]
    pub property_type: Option<PropertyType>,
    pub validations: Vec<Validation>,
    /// UI-only: whether the validation editor is expanded. Never serialized.
    #[serde(skip)]
    pub show_validation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Integer,
    Boolean,
    Array,
    Object,
}

impl PropertyType {
    pub const ALL: [PropertyType; 5] = [
        PropertyType::String,
        PropertyType::Integer,
        PropertyType::Boolean,
        PropertyType::Array,
        PropertyType::Object,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PropertyType::String => "string",
            PropertyType::Integer => "integer",
            PropertyType::Boolean => "boolean",
            PropertyType::Array => "array",
            PropertyType::Object => "object",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PropertyType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown property type: {s:?}"))
    }
}

/// A validation constraint on a property
///
/// `kind` is one of the catalog entries for the owning property's type (see
/// `document::catalog`); the expected shape of `value` is keyed by it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Validation {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ValidationValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValidationValue {
    Flag(bool),
    Number(serde_json::Number),
    Text(String),
}

impl From<&str> for ValidationValue {
    fn from(s: &str) -> Self {
        ValidationValue::Text(s.to_string())
    }
}

impl From<bool> for ValidationValue {
    fn from(b: bool) -> Self {
        ValidationValue::Flag(b)
    }
}

fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

fn none_as_empty<S: Serializer>(value: &Option<PropertyType>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.map(PropertyType::as_str).unwrap_or(""))
}

fn normalized_operations<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Operation>, D::Error> {
    let raw = Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default();
    let mut operations = Vec::new();
    for entry in raw.iter().filter(|e| !e.trim().is_empty()) {
        let op: Operation = entry.parse().map_err(serde::de::Error::custom)?;
        if !operations.contains(&op) {
            operations.push(op);
        }
    }
    Ok(operations)
}
