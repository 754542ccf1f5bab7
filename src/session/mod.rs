/// Wizard session state
///
/// A `Session` is the single source of truth for one wizard run: the project, which
/// CRD is current, the wizard step, the touched set and the text mirror. Every edit
/// is all-or-nothing: indices are checked before anything is written, and each
/// successful structured edit re-serializes the mirror.

mod crd;

pub use crd::{CrdField, RbacField, RbacPage};

use crate::document::{mirror, Crd, MirrorError, Project, TextMirror};
use crate::validate::{FieldPath, TouchedSet, ValidationReport};
use serde::Serialize;

/// Which form the wizard is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WizardStep {
    #[default]
    GeneralInfo,
    CrdDetails,
}

/// Rejected edit; the session is unchanged
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("no CRD is selected")]
    NoCurrentCrd,

    #[error("{what} index {index} out of range (len {len})")]
    OutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("unknown RBAC preset: {0}")]
    UnknownPreset(String),

    #[error("unknown RBAC verb: {0}")]
    UnknownVerb(String),
}

pub(crate) fn check_index(what: &'static str, index: usize, len: usize) -> Result<(), EditError> {
    if index < len {
        Ok(())
    } else {
        Err(EditError::OutOfRange { what, index, len })
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    project: Project,
    current: usize,
    step: WizardStep,
    touched: TouchedSet,
    mirror: TextMirror,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Fresh session: one empty CRD, general-info step, nothing touched
    pub fn new() -> Self {
        Self::from_project(Project::new())
    }

    /// Session seeded with an existing project (e.g. one loaded from a file)
    pub fn from_project(project: Project) -> Self {
        let mirror = TextMirror::from_project(&project);
        Self {
            project,
            current: 0,
            step: WizardStep::default(),
            touched: TouchedSet::default(),
            mirror,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn touched(&self) -> &TouchedSet {
        &self.touched
    }

    /// Current mirror text, possibly invalid JSON mid-edit
    pub fn mirror_text(&self) -> &str {
        self.mirror.text()
    }

    /// Index of the current CRD; `None` only when there are no CRDs
    pub fn current_index(&self) -> Option<usize> {
        (!self.project.crds.is_empty()).then_some(self.current)
    }

    pub fn current_crd(&self) -> Option<&Crd> {
        self.project.crds.get(self.current)
    }

    /// All validator output, touched or not
    pub fn report(&self) -> ValidationReport {
        ValidationReport::for_project(&self.project, self.current_index())
    }

    /// Validator output restricted to touched fields
    pub fn visible_errors(&self) -> ValidationReport {
        self.report().visible(&self.touched)
    }

    /// Serialized project, as it would appear in the mirror after a structured edit
    pub fn document(&self) -> serde_json::Value {
        mirror::to_document(&self.project)
    }

    // --------------------------------------------------
    // general information
    // --------------------------------------------------

    pub fn set_domain(&mut self, domain: impl Into<String>) {
        self.project.domain = domain.into();
        self.touched.touch(FieldPath::Domain);
        self.after_edit();
    }

    pub fn set_repo(&mut self, repo: impl Into<String>) {
        self.project.repo = repo.into();
        self.touched.touch(FieldPath::Repo);
        self.after_edit();
    }

    pub fn set_project_name(&mut self, name: impl Into<String>) {
        self.project.project_name = name.into();
        self.touched.touch(FieldPath::ProjectName);
        self.after_edit();
    }

    pub fn set_namespaced(&mut self, namespaced: bool) {
        self.project.namespaces.namespaced = namespaced;
        self.after_edit();
    }

    /// Raw comma-separated namespace text; kept verbatim, split on serialization
    pub fn set_namespaces_text(&mut self, text: impl Into<String>) {
        self.project.namespaces.text = text.into();
        self.after_edit();
    }

    // --------------------------------------------------
    // wizard steps
    // --------------------------------------------------

    /// Try to leave the general-information step.
    ///
    /// Marks the general fields touched either way so their errors show up.
    pub fn advance(&mut self) -> bool {
        for path in [FieldPath::Domain, FieldPath::Repo, FieldPath::ProjectName] {
            self.touched.touch(path);
        }
        if self.report().general_info_valid() {
            self.step = WizardStep::CrdDetails;
            true
        } else {
            false
        }
    }

    pub fn back(&mut self) {
        self.step = WizardStep::GeneralInfo;
    }

    // --------------------------------------------------
    // CRD list
    // --------------------------------------------------

    /// Append an empty CRD and select it
    pub fn add_crd(&mut self) -> usize {
        self.project.crds.push(Crd::default());
        self.current = self.project.crds.len() - 1;
        self.after_edit();
        self.current
    }

    pub fn select_crd(&mut self, index: usize) -> Result<(), EditError> {
        check_index("CRD", index, self.project.crds.len())?;
        self.current = index;
        Ok(())
    }

    /// Remove a CRD; selection stays on the same CRD when possible, otherwise
    /// moves to a neighbour.
    pub fn remove_crd(&mut self, index: usize) -> Result<Crd, EditError> {
        check_index("CRD", index, self.project.crds.len())?;
        let removed = self.project.crds.remove(index);
        if index < self.current {
            self.current -= 1;
        }
        self.after_edit();
        Ok(removed)
    }

    // --------------------------------------------------
    // text mirror
    // --------------------------------------------------

    /// Apply a raw edit from the text mirror.
    ///
    /// The text is kept as typed. On parse failure the project is untouched; on
    /// success it is replaced wholesale and the first CRD becomes current.
    pub fn edit_text(&mut self, raw: impl Into<String>) -> Result<(), MirrorError> {
        match self.mirror.edit(raw) {
            Ok(project) => {
                tracing::debug!("Mirror edit applied: {} CRDs", project.crds.len());
                self.project = project;
                self.current = 0;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("⚠️ Mirror edit not applied: {}", e);
                Err(e)
            }
        }
    }

    /// Keep `current` in range and the mirror in step with the project
    fn after_edit(&mut self) {
        let len = self.project.crds.len();
        if len == 0 {
            self.current = 0;
        } else if self.current >= len {
            self.current = len - 1;
        }
        self.mirror.refresh(&self.project);
    }

    fn current_crd_mut(&mut self) -> Result<&mut Crd, EditError> {
        self.project
            .crds
            .get_mut(self.current)
            .ok_or(EditError::NoCurrentCrd)
    }
}
