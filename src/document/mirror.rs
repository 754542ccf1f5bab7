/// Text mirror of the project document
///
/// Structured -> text: pretty JSON with UI-only fields stripped; field order is the
/// struct order so repeated structured edits never reshuffle unrelated text.
/// Text -> structured: tolerant field-by-field rebuild with explicit defaults, every
/// CRD passed through `migrate::migrate_crd` first.

use crate::document::{
    migrate::migrate_crd,
    types::{Crd, Namespaces, Project},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Why raw mirror text could not become a project
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    /// Not JSON, or not a JSON object with the expected top-level field types
    #[error("invalid document: {0}")]
    Syntax(#[from] serde_json::Error),

    /// Valid JSON, but not an object
    #[error("invalid document: expected a JSON object")]
    NotAnObject,

    /// A CRD entry did not fit the CRD shape even after migration
    #[error("invalid CRD at index {index}: {source}")]
    Crd {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Borrowed wire view of a project
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentRef<'a> {
    domain: &'a str,
    repo: &'a str,
    project_name: &'a str,
    namespaces: Vec<String>,
    crds: &'a [Crd],
}

impl<'a> From<&'a Project> for DocumentRef<'a> {
    fn from(project: &'a Project) -> Self {
        Self {
            domain: &project.domain,
            repo: &project.repo,
            project_name: &project.project_name,
            namespaces: project.namespaces.to_list(),
            crds: &project.crds,
        }
    }
}

/// Incoming document; every field optional
#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RawDocument {
    domain: Option<String>,
    repo: Option<String>,
    project_name: Option<String>,
    namespaces: Option<RawNamespaces>,
    crds: Option<Vec<Value>>,
}

/// Namespaces arrive either as a list or as one comma-joined string
#[derive(Deserialize)]
#[serde(untagged)]
enum RawNamespaces {
    List(Vec<String>),
    Joined(String),
}

/// The serialized project as a JSON value
pub fn to_document(project: &Project) -> Value {
    // DocumentRef only holds strings, bools and sequences
    serde_json::to_value(DocumentRef::from(project)).unwrap_or(Value::Null)
}

/// The canonical text form: 2-space indented JSON
pub fn serialize(project: &Project) -> String {
    serde_json::to_string_pretty(&DocumentRef::from(project)).unwrap_or_default()
}

/// Rebuild a project from mirror text.
pub fn parse(text: &str) -> Result<Project, MirrorError> {
    let value: Value = serde_json::from_str(text)?;
    if !value.is_object() {
        return Err(MirrorError::NotAnObject);
    }
    let raw: RawDocument = serde_json::from_value(value)?;

    let namespaces = match raw.namespaces {
        Some(RawNamespaces::List(list)) => Namespaces::from_list(&list),
        Some(RawNamespaces::Joined(text)) => Namespaces::from_text(&text),
        None => Namespaces::default(),
    };

    let crds = raw
        .crds
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(index, crd)| {
            serde_json::from_value(migrate_crd(crd)).map_err(|source| MirrorError::Crd { index, source })
        })
        .collect::<Result<Vec<Crd>, _>>()?;

    Ok(Project {
        domain: raw.domain.unwrap_or_default(),
        repo: raw.repo.unwrap_or_default(),
        project_name: raw.project_name.unwrap_or_default(),
        namespaces,
        crds,
    })
}

/// Editable text kept alongside the structured project
///
/// Holds whatever the user last typed, valid or not. Structured edits overwrite it
/// with the canonical serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMirror {
    text: String,
}

impl TextMirror {
    pub fn from_project(project: &Project) -> Self {
        Self {
            text: serialize(project),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Re-serialize after a structured edit
    pub fn refresh(&mut self, project: &Project) {
        self.text = serialize(project);
    }

    /// Store raw text and try to read a project out of it.
    ///
    /// The text is retained even when parsing fails so typing can continue.
    pub fn edit(&mut self, raw: impl Into<String>) -> Result<Project, MirrorError> {
        self.text = raw.into();
        parse(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::types::{Property, PropertyType, RbacRule};
    use serde_json::json;

    fn sample() -> Project {
        let mut project = Project::new();
        project.domain = "example.com".to_string();
        project.repo = "github.com/acme/widget-operator".to_string();
        project.project_name = "widget-operator".to_string();
        project.namespaces = Namespaces::from_text("team-a, team-b");
        let crd = &mut project.crds[0];
        crd.group = "apps".to_string();
        crd.version = "v1".to_string();
        crd.kind = "Widget".to_string();
        crd.plural = "Widgets".to_string();
        crd.rbac.push(RbacRule {
            group: "".to_string(),
            resources: "events".to_string(),
            verbs: "create;patch".to_string(),
            preset: Some("events".to_string()),
        });
        crd.properties.push(Property {
            name: "size".to_string(),
            property_type: Some(PropertyType::Integer),
            validations: vec![],
            show_validation: true,
        });
        project
    }

    #[test]
    fn test_serialize_strips_ui_fields_and_derives_namespaces() {
        let doc = to_document(&sample());
        assert_eq!(doc["namespaces"], json!(["team-a", "team-b"]));
        assert_eq!(doc["projectName"], "widget-operator");
        assert!(doc["crds"][0]["properties"][0].get("showValidation").is_none());
        assert!(doc["crds"][0]["properties"][0].get("show_validation").is_none());
    }

    #[test]
    fn test_serialize_is_stable() {
        let project = sample();
        let text = serialize(&project);
        assert_eq!(text, serialize(&project.clone()));

        let order: Vec<usize> = ["\"domain\"", "\"repo\"", "\"projectName\"", "\"namespaces\"", "\"crds\""]
            .iter()
            .map(|key| text.find(key).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_parse_defaults_missing_fields() {
        let project = parse("{}").unwrap();
        assert_eq!(project.domain, "");
        assert_eq!(project.project_name, "");
        assert!(!project.namespaces.namespaced);
        assert!(project.crds.is_empty());
    }

    #[test]
    fn test_parse_accepts_joined_namespaces() {
        let project = parse(r#"{"namespaces": "ns1,ns2"}"#).unwrap();
        assert!(project.namespaces.namespaced);
        assert_eq!(project.namespaces.to_list(), vec!["ns1", "ns2"]);

        let project = parse(r#"{"namespaces": "  "}"#).unwrap();
        assert!(!project.namespaces.namespaced);
    }

    #[test]
    fn test_parse_migrates_legacy_rbac() {
        let project = parse(r#"{"crds": [{"kind": "Widget", "rbac": {"configmaps": true}}]}"#).unwrap();
        let crd = &project.crds[0];
        assert!(crd.controller);
        assert_eq!(crd.rbac.len(), 1);
        assert_eq!(crd.rbac[0].preset.as_deref(), Some("configmaps"));
    }

    #[test]
    fn test_parse_rejects_bad_crd() {
        let err = parse(r#"{"crds": [{}, {"controller": "yes"}]}"#).unwrap_err();
        assert!(matches!(err, MirrorError::Crd { index: 1, .. }));
    }

    #[test]
    fn test_parse_rejects_non_objects() {
        assert!(matches!(parse("[]"), Err(MirrorError::NotAnObject)));
        assert!(matches!(parse("null"), Err(MirrorError::NotAnObject)));
        assert!(matches!(parse(r#"{"domain": 7}"#), Err(MirrorError::Syntax(_))));
    }

    #[test]
    fn test_mirror_keeps_invalid_text() {
        let mut mirror = TextMirror::from_project(&sample());
        assert!(mirror.edit("{not json").is_err());
        assert_eq!(mirror.text(), "{not json");
    }
}
