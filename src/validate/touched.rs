/// Touched-field tracking
///
/// A sparse set of field paths that have received at least one edit. Errors for a
/// path stay hidden until it is in the set.

use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// Key path of a validated field
///
/// CRD-level paths are shared across CRDs: touching `kind` on one CRD reveals
/// the `kind` error on whichever CRD is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldPath {
    Domain,
    Repo,
    ProjectName,
    Group,
    Version,
    Kind,
    Plural,
    PropertyName(usize),
    PropertyType(usize),
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::Domain => f.write_str("domain"),
            FieldPath::Repo => f.write_str("repo"),
            FieldPath::ProjectName => f.write_str("projectName"),
            FieldPath::Group => f.write_str("group"),
            FieldPath::Version => f.write_str("version"),
            FieldPath::Kind => f.write_str("kind"),
            FieldPath::Plural => f.write_str("plural"),
            FieldPath::PropertyName(i) => write!(f, "properties.{i}.name"),
            FieldPath::PropertyType(i) => write!(f, "properties.{i}.type"),
        }
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TouchedSet(BTreeSet<FieldPath>);

impl TouchedSet {
    pub fn touch(&mut self, path: FieldPath) {
        self.0.insert(path);
    }

    pub fn is_touched(&self, path: FieldPath) -> bool {
        self.0.contains(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_render_as_key_paths() {
        assert_eq!(FieldPath::ProjectName.to_string(), "projectName");
        assert_eq!(FieldPath::PropertyType(2).to_string(), "properties.2.type");
    }

    #[test]
    fn test_touch_is_sparse() {
        let mut touched = TouchedSet::default();
        touched.touch(FieldPath::PropertyName(3));
        touched.touch(FieldPath::PropertyName(3));
        assert!(touched.is_touched(FieldPath::PropertyName(3)));
        assert!(!touched.is_touched(FieldPath::PropertyName(0)));
        assert_eq!(serde_json::to_value(&touched).unwrap(), serde_json::json!(["properties.3.name"]));
    }
}
