/// Field validators
///
/// Pure functions over current values. The report mirrors the document shape so a
/// view can find its error under the same key it reads its value from.

use crate::document::{Crd, Project};
use crate::validate::touched::{FieldPath, TouchedSet};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};

static DOMAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(([a-zA-Z])|([a-zA-Z][a-zA-Z])|([a-zA-Z][0-9])|([0-9][a-zA-Z])",
        r"|([a-zA-Z0-9][a-zA-Z0-9_-]{1,61}[a-zA-Z0-9]))",
        r"\.([a-zA-Z]{2,6}|[a-zA-Z0-9-]{2,30}\.[a-zA-Z]{2,3})$",
    ))
    .expect("domain pattern compiles")
});

static REPO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+(/[A-Za-z0-9_.-]+)?(\.git)?$")
        .expect("repo pattern compiles")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldErrorKind {
    Required,
    InvalidFormat,
}

/// A validation failure with its user-facing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub kind: FieldErrorKind,
    pub message: &'static str,
}

impl FieldError {
    const fn required(message: &'static str) -> Self {
        Self { kind: FieldErrorKind::Required, message }
    }

    const fn invalid(message: &'static str) -> Self {
        Self { kind: FieldErrorKind::InvalidFormat, message }
    }
}

impl Serialize for FieldError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.message)
    }
}

pub fn validate_domain(domain: &str) -> Option<FieldError> {
    if domain.is_empty() {
        Some(FieldError::required("Domain is required."))
    } else if !DOMAIN_RE.is_match(domain) {
        Some(FieldError::invalid("Invalid domain format."))
    } else {
        None
    }
}

pub fn validate_repo(repo: &str) -> Option<FieldError> {
    if repo.is_empty() {
        Some(FieldError::required("Repository is required."))
    } else if !REPO_RE.is_match(repo) {
        Some(FieldError::invalid("Invalid repository format."))
    } else {
        None
    }
}

pub fn validate_project_name(name: &str) -> Option<FieldError> {
    name.is_empty()
        .then(|| FieldError::required("Project Name is required."))
}

fn required_trimmed(value: &str, message: &'static str) -> Option<FieldError> {
    value.trim().is_empty().then(|| FieldError::required(message))
}

/// Errors for one property of the current CRD
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropertyErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<FieldError>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub property_type: Option<FieldError>,
}

/// Validator output, shaped like the project with the current CRD flattened in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<FieldError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<FieldError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<FieldError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<FieldError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<FieldError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FieldError>,
    pub properties: Vec<PropertyErrors>,
}

impl ValidationReport {
    /// Validate the project header and the CRD at `current`, if any.
    pub fn for_project(project: &Project, current: Option<usize>) -> Self {
        let mut report = Self {
            domain: validate_domain(&project.domain),
            repo: validate_repo(&project.repo),
            project_name: validate_project_name(&project.project_name),
            ..Self::default()
        };
        if let Some(crd) = current.and_then(|i| project.crds.get(i)) {
            report.apply_crd(crd);
        }
        report
    }

    fn apply_crd(&mut self, crd: &Crd) {
        self.group = required_trimmed(&crd.group, "Group is required.");
        self.version = required_trimmed(&crd.version, "Version is required.");
        self.kind = required_trimmed(&crd.kind, "Kind is required.");
        self.properties = crd
            .properties
            .iter()
            .map(|prop| PropertyErrors {
                name: prop
                    .name
                    .is_empty()
                    .then(|| FieldError::required("Property name is required.")),
                property_type: prop
                    .property_type
                    .is_none()
                    .then(|| FieldError::required("Type is required.")),
            })
            .collect();
    }

    /// Gate for leaving the general-information step
    pub fn general_info_valid(&self) -> bool {
        self.domain.is_none() && self.repo.is_none() && self.project_name.is_none()
    }

    /// Every error paired with the path of the field it belongs to
    pub fn entries(&self) -> Vec<(FieldPath, &FieldError)> {
        let scalar = [
            (FieldPath::Domain, &self.domain),
            (FieldPath::Repo, &self.repo),
            (FieldPath::ProjectName, &self.project_name),
            (FieldPath::Group, &self.group),
            (FieldPath::Version, &self.version),
            (FieldPath::Kind, &self.kind),
        ];
        let mut entries: Vec<_> = scalar
            .into_iter()
            .filter_map(|(path, err)| err.as_ref().map(|e| (path, e)))
            .collect();
        for (index, prop) in self.properties.iter().enumerate() {
            if let Some(e) = &prop.name {
                entries.push((FieldPath::PropertyName(index), e));
            }
            if let Some(e) = &prop.property_type {
                entries.push((FieldPath::PropertyType(index), e));
            }
        }
        entries
    }

    /// Same report with untouched fields' errors removed. The properties list keeps
    /// its length so indices still line up with the CRD.
    pub fn visible(&self, touched: &TouchedSet) -> Self {
        let keep = |path: FieldPath, err: &Option<FieldError>| {
            err.clone().filter(|_| touched.is_touched(path))
        };
        Self {
            domain: keep(FieldPath::Domain, &self.domain),
            repo: keep(FieldPath::Repo, &self.repo),
            project_name: keep(FieldPath::ProjectName, &self.project_name),
            group: keep(FieldPath::Group, &self.group),
            version: keep(FieldPath::Version, &self.version),
            kind: keep(FieldPath::Kind, &self.kind),
            properties: self
                .properties
                .iter()
                .enumerate()
                .map(|(i, prop)| PropertyErrors {
                    name: keep(FieldPath::PropertyName(i), &prop.name),
                    property_type: keep(FieldPath::PropertyType(i), &prop.property_type),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Property, PropertyType};

    #[test]
    fn test_domain_validator() {
        assert_eq!(validate_domain("example.com"), None);
        assert_eq!(validate_domain("my-company.co.uk"), None);
        assert_eq!(validate_domain("x.io"), None);
        assert_eq!(validate_domain("").unwrap().kind, FieldErrorKind::Required);
        assert_eq!(validate_domain("bad_domain").unwrap().kind, FieldErrorKind::InvalidFormat);
        assert_eq!(validate_domain("-bad.com").unwrap().kind, FieldErrorKind::InvalidFormat);
        assert_eq!(validate_domain("example.c").unwrap().message, "Invalid domain format.");
    }

    #[test]
    fn test_repo_validator() {
        assert_eq!(validate_repo("acme/widgets"), None);
        assert_eq!(validate_repo("github.com/acme/widgets"), None);
        assert_eq!(validate_repo("github.com/acme/widgets.git"), None);
        assert_eq!(validate_repo("").unwrap().kind, FieldErrorKind::Required);
        assert_eq!(validate_repo("widgets").unwrap().kind, FieldErrorKind::InvalidFormat);
        assert_eq!(validate_repo("a/b/c/d").unwrap().kind, FieldErrorKind::InvalidFormat);
        assert_eq!(validate_repo("a b/c").unwrap().kind, FieldErrorKind::InvalidFormat);
    }

    #[test]
    fn test_project_name_only_required() {
        assert!(validate_project_name("anything goes!").is_none());
        assert_eq!(validate_project_name("").unwrap().message, "Project Name is required.");
    }

    #[test]
    fn test_report_covers_current_crd_only() {
        let mut project = Project::new();
        project.crds.push(Default::default());
        project.crds[0].group = "apps".to_string();
        project.crds[1].properties.push(Property::default());

        let report = ValidationReport::for_project(&project, Some(0));
        assert!(report.group.is_none());
        assert!(report.version.is_some());
        assert!(report.properties.is_empty());

        let report = ValidationReport::for_project(&project, Some(1));
        assert!(report.group.is_some());
        assert_eq!(report.properties.len(), 1);
        assert!(report.properties[0].name.is_some());
        assert!(report.properties[0].property_type.is_some());
    }

    #[test]
    fn test_whitespace_group_is_missing() {
        let mut project = Project::new();
        project.crds[0].group = "   ".to_string();
        let report = ValidationReport::for_project(&project, Some(0));
        assert_eq!(report.group.unwrap().message, "Group is required.");
    }

    #[test]
    fn test_visible_hides_untouched_errors() {
        let mut project = Project::new();
        project.crds[0].properties.push(Property {
            name: String::new(),
            property_type: Some(PropertyType::String),
            ..Default::default()
        });
        let report = ValidationReport::for_project(&project, Some(0));
        assert!(report.domain.is_some());

        let mut touched = TouchedSet::default();
        let hidden = report.visible(&touched);
        assert!(hidden.entries().is_empty());
        assert_eq!(hidden.properties.len(), 1);

        touched.touch(FieldPath::Domain);
        touched.touch(FieldPath::PropertyName(0));
        let shown = report.visible(&touched);
        assert!(shown.domain.is_some());
        assert!(shown.repo.is_none());
        assert!(shown.properties[0].name.is_some());
    }

    #[test]
    fn test_report_serializes_like_document() {
        let report = ValidationReport::for_project(&Project::new(), Some(0));
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["domain"], "Domain is required.");
        assert_eq!(value["projectName"], "Project Name is required.");
        assert_eq!(value["kind"], "Kind is required.");
        assert_eq!(value["properties"], serde_json::json!([]));
    }
}
