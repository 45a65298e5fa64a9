//! User-authored patch overrides.
//!
//! A [`CustomPatch`] is assembled by an interactive component picker and
//! handed to the pipeline once per run. Unlike the rule engine it matches
//! names exactly and touches only the direct children of `application`: the
//! picker renders top-level tags, and recursive matching would silently hit
//! unrelated nested `meta-data`.

use std::collections::BTreeSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::manifest::ManifestTree;

use super::{PatchEvent, PatchReport};

/// An explicit delete-set/disable-set override.
///
/// Serializable so a picker UI can hand it across a process or IPC
/// boundary. A name present in both sets is deleted, never disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomPatch {
    /// Component names to detach.
    pub delete_names: BTreeSet<String>,
    /// Component names to render inert.
    pub disable_names: BTreeSet<String>,
}

impl CustomPatch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a component name for deletion.
    pub fn delete(mut self, name: impl Into<String>) -> Self {
        self.delete_names.insert(name.into());
        self
    }

    /// Marks a component name for disabling.
    pub fn disable(mut self, name: impl Into<String>) -> Self {
        self.disable_names.insert(name.into());
        self
    }

    /// Returns `true` if both sets are empty.
    pub fn is_empty(&self) -> bool {
        self.delete_names.is_empty() && self.disable_names.is_empty()
    }
}

/// Applies a custom patch to the direct children of `application`.
///
/// Delete takes precedence when a name landed in both sets. Disabling sets
/// the same two attributes as the rule engine and skips components that are
/// already disabled, so reapplication counts nothing.
pub fn apply_custom(tree: &mut ManifestTree, patch: &CustomPatch) -> PatchReport {
    let mut report = PatchReport::default();
    let Some(application) = tree.application() else {
        return report;
    };

    for id in tree.children(application).to_vec() {
        let Some(tag) = tree.tag(id).map(str::to_string) else {
            continue;
        };
        let Some(name) = tree.android_attr(id, "name").map(str::to_string) else {
            continue;
        };

        if patch.delete_names.contains(&name) {
            if tree.detach(id) {
                debug!("custom patch removed {tag} {name}");
                report.removed(PatchEvent::ComponentRemoved { tag, name });
            }
        } else if patch.disable_names.contains(&name) {
            if tree.android_attr(id, "enabled") == Some("false") {
                continue;
            }
            tree.set_android_attr(id, "enabled", "false");
            tree.set_android_attr(id, "exported", "false");
            debug!("custom patch disabled {tag} {name}");
            report.disabled(PatchEvent::ComponentDisabled { tag, name });
        }
    }
    report
}
