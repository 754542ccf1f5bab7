/// Edits to the current CRD
///
/// Basic fields, RBAC rules, webhooks, properties and their validations. Derived
/// fields (plural, webhook paths) are refreshed here whenever their sources change.

use super::{check_index, EditError, Session};
use crate::document::{
    catalog::{initial_validation_type, rbac_preset, CUSTOM_PRESET, RBAC_PAGE_SIZE, RBAC_VERBS},
    derived::{capitalize_kind, default_plural, default_webhook_resource, refresh_derived, webhook_path},
    Crd, FailurePolicy, MatchPolicy, Operation, Property, PropertyType, RbacRule, SideEffects,
    Validation, ValidationValue, Webhook, WebhookType,
};
use crate::validate::FieldPath;
use serde::{Deserialize, Serialize};

/// Free-text fields of a CRD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CrdField {
    Group,
    Version,
    Kind,
    Plural,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RbacField {
    Group,
    Resources,
    Verbs,
}

/// One page of the RBAC rule list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RbacPage {
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
    /// Index of `rules[0]` in the full list
    pub start: usize,
    pub end: usize,
    pub rules: Vec<RbacRule>,
    /// Only present when there is more than one page
    pub caption: Option<String>,
}

/// Re-derive webhook paths after the CRD's version or kind changed
fn refresh_webhook_paths(crd: &mut Crd, old_version: &str, old_kind: &str) {
    for hook in &mut crd.webhooks {
        let previous = webhook_path(hook.webhook_type, old_version, old_kind);
        let next = webhook_path(hook.webhook_type, &crd.version, &crd.kind);
        refresh_derived(&mut hook.path, &previous, next);
    }
}

fn split_verbs(verbs: &str) -> Vec<&str> {
    verbs.split(';').map(str::trim).filter(|v| !v.is_empty()).collect()
}

impl Session {
    /// Run `edit` against the current CRD, then re-sync
    fn edit_crd<R>(&mut self, edit: impl FnOnce(&mut Crd) -> Result<R, EditError>) -> Result<R, EditError> {
        let out = edit(self.current_crd_mut()?)?;
        self.after_edit();
        Ok(out)
    }

    // --------------------------------------------------
    // basic info
    // --------------------------------------------------

    /// Set group, version, kind or plural on the current CRD.
    ///
    /// Kind is capitalised; the plural and webhook paths follow it unless they have
    /// been edited by hand.
    pub fn set_crd_field(&mut self, field: CrdField, value: impl Into<String>) -> Result<(), EditError> {
        let value = value.into();
        self.edit_crd(|crd| {
            match field {
                CrdField::Group => crd.group = value,
                CrdField::Plural => crd.plural = value,
                CrdField::Version => {
                    let old_version = std::mem::replace(&mut crd.version, value);
                    let old_kind = crd.kind.clone();
                    refresh_webhook_paths(crd, &old_version, &old_kind);
                }
                CrdField::Kind => {
                    let kind = capitalize_kind(&value);
                    let old_kind = std::mem::replace(&mut crd.kind, kind);
                    refresh_derived(&mut crd.plural, &default_plural(&old_kind), default_plural(&crd.kind));
                    let old_version = crd.version.clone();
                    refresh_webhook_paths(crd, &old_version, &old_kind);
                }
            }
            Ok(())
        })?;
        self.touched.touch(match field {
            CrdField::Group => FieldPath::Group,
            CrdField::Version => FieldPath::Version,
            CrdField::Kind => FieldPath::Kind,
            CrdField::Plural => FieldPath::Plural,
        });
        Ok(())
    }

    pub fn set_controller(&mut self, enabled: bool) -> Result<(), EditError> {
        self.edit_crd(|crd| {
            crd.controller = enabled;
            Ok(())
        })
    }

    pub fn set_status(&mut self, enabled: bool) -> Result<(), EditError> {
        self.edit_crd(|crd| {
            crd.status = enabled;
            Ok(())
        })
    }

    // --------------------------------------------------
    // RBAC
    // --------------------------------------------------

    pub fn add_rbac_rule(&mut self) -> Result<usize, EditError> {
        self.edit_crd(|crd| {
            crd.rbac.push(RbacRule::default());
            Ok(crd.rbac.len() - 1)
        })
    }

    pub fn remove_rbac_rule(&mut self, index: usize) -> Result<RbacRule, EditError> {
        self.edit_crd(|crd| {
            check_index("RBAC rule", index, crd.rbac.len())?;
            Ok(crd.rbac.remove(index))
        })
    }

    pub fn set_rbac_field(&mut self, index: usize, field: RbacField, value: impl Into<String>) -> Result<(), EditError> {
        let value = value.into();
        self.edit_crd(|crd| {
            check_index("RBAC rule", index, crd.rbac.len())?;
            let rule = &mut crd.rbac[index];
            match field {
                RbacField::Group => rule.group = value,
                RbacField::Resources => rule.resources = value,
                RbacField::Verbs => rule.verbs = value,
            }
            Ok(())
        })
    }

    /// Fill a rule from a preset; "" or "custom" clears the rule instead.
    pub fn apply_rbac_preset(&mut self, index: usize, key: &str) -> Result<(), EditError> {
        let preset = if key.is_empty() || key == CUSTOM_PRESET {
            None
        } else {
            Some(rbac_preset(key).ok_or_else(|| EditError::UnknownPreset(key.to_string()))?)
        };
        self.edit_crd(|crd| {
            check_index("RBAC rule", index, crd.rbac.len())?;
            crd.rbac[index] = match preset {
                Some(p) => RbacRule {
                    group: p.group.to_string(),
                    resources: p.resources.to_string(),
                    verbs: p.verbs.to_string(),
                    preset: Some(p.key.to_string()),
                },
                None => RbacRule::default(),
            };
            Ok(())
        })
    }

    /// Add or remove one verb, keeping the order of the others
    pub fn toggle_rbac_verb(&mut self, index: usize, verb: &str, enabled: bool) -> Result<(), EditError> {
        if !RBAC_VERBS.contains(&verb) {
            return Err(EditError::UnknownVerb(verb.to_string()));
        }
        self.edit_crd(|crd| {
            check_index("RBAC rule", index, crd.rbac.len())?;
            let rule = &mut crd.rbac[index];
            let mut verbs = split_verbs(&rule.verbs);
            if enabled {
                if !verbs.contains(&verb) {
                    verbs.push(verb);
                }
            } else {
                verbs.retain(|v| *v != verb);
            }
            rule.verbs = verbs.join(";");
            Ok(())
        })
    }

    /// Page through the current CRD's RBAC rules; out-of-range pages clamp to the last.
    pub fn rbac_page(&self, page: usize) -> RbacPage {
        let rules = self.current_crd().map(|crd| crd.rbac.as_slice()).unwrap_or_default();
        let total = rules.len();
        let total_pages = total.div_ceil(RBAC_PAGE_SIZE);
        let page = page.min(total_pages.saturating_sub(1));
        let start = (page * RBAC_PAGE_SIZE).min(total);
        let end = (start + RBAC_PAGE_SIZE).min(total);
        RbacPage {
            page,
            total_pages,
            total,
            start,
            end,
            rules: rules[start..end].to_vec(),
            caption: (total_pages > 1)
                .then(|| format!("Showing {} to {} of {} Permissions", start + 1, end, total)),
        }
    }

    // --------------------------------------------------
    // webhooks
    // --------------------------------------------------

    /// Append a mutating webhook watching this CRD's resources
    pub fn add_webhook(&mut self) -> Result<usize, EditError> {
        self.edit_crd(|crd| {
            crd.webhooks.push(Webhook {
                path: webhook_path(WebhookType::Mutating, &crd.version, &crd.kind),
                resources: vec![default_webhook_resource(&crd.kind, &crd.plural)],
                ..Webhook::default()
            });
            Ok(crd.webhooks.len() - 1)
        })
    }

    pub fn remove_webhook(&mut self, index: usize) -> Result<Webhook, EditError> {
        self.edit_crd(|crd| {
            check_index("webhook", index, crd.webhooks.len())?;
            Ok(crd.webhooks.remove(index))
        })
    }

    fn edit_webhook(&mut self, index: usize, edit: impl FnOnce(&mut Webhook, &str, &str)) -> Result<(), EditError> {
        self.edit_crd(|crd| {
            check_index("webhook", index, crd.webhooks.len())?;
            edit(&mut crd.webhooks[index], &crd.version, &crd.kind);
            Ok(())
        })
    }

    /// Change the webhook type; the path follows unless edited by hand
    pub fn set_webhook_type(&mut self, index: usize, webhook_type: WebhookType) -> Result<(), EditError> {
        self.edit_webhook(index, |hook, version, kind| {
            let previous = webhook_path(hook.webhook_type, version, kind);
            hook.webhook_type = webhook_type;
            refresh_derived(&mut hook.path, &previous, webhook_path(webhook_type, version, kind));
        })
    }

    pub fn set_webhook_path(&mut self, index: usize, path: impl Into<String>) -> Result<(), EditError> {
        let path = path.into();
        self.edit_webhook(index, |hook, _, _| hook.path = path)
    }

    pub fn set_failure_policy(&mut self, index: usize, policy: FailurePolicy) -> Result<(), EditError> {
        self.edit_webhook(index, |hook, _, _| hook.failure_policy = policy)
    }

    pub fn set_side_effects(&mut self, index: usize, side_effects: SideEffects) -> Result<(), EditError> {
        self.edit_webhook(index, |hook, _, _| hook.side_effects = side_effects)
    }

    pub fn set_match_policy(&mut self, index: usize, policy: MatchPolicy) -> Result<(), EditError> {
        self.edit_webhook(index, |hook, _, _| hook.match_policy = policy)
    }

    pub fn toggle_webhook_operation(&mut self, index: usize, operation: Operation, enabled: bool) -> Result<(), EditError> {
        self.edit_webhook(index, |hook, _, _| {
            if !enabled {
                hook.operations.retain(|op| *op != operation);
            } else if !hook.operations.contains(&operation) {
                hook.operations.push(operation);
            }
        })
    }

    /// Replace the operation set; duplicates are dropped, first occurrence wins
    pub fn set_webhook_operations(&mut self, index: usize, operations: Vec<Operation>) -> Result<(), EditError> {
        let mut unique = Vec::with_capacity(operations.len());
        for op in operations {
            if !unique.contains(&op) {
                unique.push(op);
            }
        }
        self.edit_webhook(index, |hook, _, _| hook.operations = unique)
    }

    /// Resources from comma-separated text
    pub fn set_webhook_resources_text(&mut self, index: usize, text: &str) -> Result<(), EditError> {
        let resources = text
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect();
        self.edit_webhook(index, |hook, _, _| hook.resources = resources)
    }

    // --------------------------------------------------
    // properties
    // --------------------------------------------------

    pub fn add_property(&mut self) -> Result<usize, EditError> {
        self.edit_crd(|crd| {
            crd.properties.push(Property::default());
            Ok(crd.properties.len() - 1)
        })
    }

    pub fn remove_property(&mut self, index: usize) -> Result<Property, EditError> {
        self.edit_crd(|crd| {
            check_index("property", index, crd.properties.len())?;
            Ok(crd.properties.remove(index))
        })
    }

    fn edit_property<R>(&mut self, index: usize, edit: impl FnOnce(&mut Property) -> Result<R, EditError>) -> Result<R, EditError> {
        self.edit_crd(|crd| {
            check_index("property", index, crd.properties.len())?;
            edit(&mut crd.properties[index])
        })
    }

    pub fn set_property_name(&mut self, index: usize, name: impl Into<String>) -> Result<(), EditError> {
        let name = name.into();
        self.edit_property(index, |prop| {
            prop.name = name;
            Ok(())
        })?;
        self.touched.touch(FieldPath::PropertyName(index));
        Ok(())
    }

    /// Changing the type drops every validation
    pub fn set_property_type(&mut self, index: usize, property_type: Option<PropertyType>) -> Result<(), EditError> {
        self.edit_property(index, |prop| {
            prop.property_type = property_type;
            prop.validations.clear();
            Ok(())
        })?;
        self.touched.touch(FieldPath::PropertyType(index));
        Ok(())
    }

    /// Expand or collapse the validation editor. UI-only; the mirror text is unaffected.
    pub fn set_show_validation(&mut self, index: usize, show: bool) -> Result<(), EditError> {
        self.edit_property(index, |prop| {
            prop.show_validation = show;
            Ok(())
        })
    }

    // --------------------------------------------------
    // validations
    // --------------------------------------------------

    /// Append a validation of the first catalog type for the property's type
    pub fn add_validation(&mut self, property: usize) -> Result<usize, EditError> {
        self.edit_property(property, |prop| {
            prop.validations.push(Validation {
                kind: initial_validation_type(prop.property_type).to_string(),
                value: Some(ValidationValue::Text(String::new())),
            });
            Ok(prop.validations.len() - 1)
        })
    }

    pub fn remove_validation(&mut self, property: usize, index: usize) -> Result<Validation, EditError> {
        self.edit_property(property, |prop| {
            check_index("validation", index, prop.validations.len())?;
            Ok(prop.validations.remove(index))
        })
    }

    /// Change a validation's type. The value is left as it was.
    pub fn set_validation_type(&mut self, property: usize, index: usize, kind: impl Into<String>) -> Result<(), EditError> {
        let kind = kind.into();
        self.edit_property(property, |prop| {
            check_index("validation", index, prop.validations.len())?;
            prop.validations[index].kind = kind;
            Ok(())
        })
    }

    pub fn set_validation_value(&mut self, property: usize, index: usize, value: Option<ValidationValue>) -> Result<(), EditError> {
        self.edit_property(property, |prop| {
            check_index("validation", index, prop.validations.len())?;
            prop.validations[index].value = value;
            Ok(())
        })
    }
}
