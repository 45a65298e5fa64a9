//! Manifest patching: rule engine, custom overrides, stats, and events.
//!
//! Two patch mechanisms operate on a [`ManifestTree`]:
//!
//! - [`apply_rules`] walks the tree with a [`SignatureDatabase`] and removes
//!   or disables matching components, permissions, and query declarations.
//! - [`apply_custom`] applies a user-authored [`CustomPatch`] to the direct
//!   children of `application`, standalone or layered after the rules.
//!
//! [`patch_manifest`] is the text-level entry point the pipeline uses: it
//! parses, patches, and re-serializes, and falls back to the unmodified
//! input when the manifest cannot be parsed; patching is best-effort and
//! must never block repackaging.
//!
//! [`ManifestTree`]: crate::ManifestTree
//! [`SignatureDatabase`]: crate::SignatureDatabase

mod custom;
mod engine;

pub use custom::{CustomPatch, apply_custom};
pub use engine::apply_rules;

use std::fmt;

use log::warn;

use crate::manifest;
use crate::signatures::SignatureDatabase;

/// Counters accumulated over a patch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchStats {
    /// Elements detached from the tree.
    pub removed: u32,
    /// Elements kept but rendered inert.
    pub disabled: u32,
}

impl PatchStats {
    /// Returns `true` if nothing was changed.
    pub fn is_empty(&self) -> bool {
        self.removed == 0 && self.disabled == 0
    }
}

/// One entry in the patch event log.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PatchEvent {
    /// A component element was detached.
    ComponentRemoved {
        /// The element tag, e.g. `service`.
        tag: String,
        /// The component's qualified name.
        name: String,
    },
    /// A component element was disabled in place.
    ComponentDisabled {
        /// The element tag.
        tag: String,
        /// The component's qualified name.
        name: String,
    },
    /// A `uses-permission` element was detached.
    PermissionRemoved {
        /// The permission name.
        name: String,
    },
    /// A `queries/package` element was detached.
    QueryPackageRemoved {
        /// The package name.
        name: String,
    },
    /// A `queries/intent` element was detached as a unit.
    QueryIntentRemoved {
        /// The action name that triggered the removal.
        action: String,
    },
    /// Patching failed and the manifest is passed through unchanged.
    Fallback {
        /// Why the tree could not be patched.
        reason: String,
    },
}

impl fmt::Display for PatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchEvent::ComponentRemoved { tag, name } => {
                write!(f, "removed {tag} {name}")
            }
            PatchEvent::ComponentDisabled { tag, name } => {
                write!(f, "disabled {tag} {name}")
            }
            PatchEvent::PermissionRemoved { name } => {
                write!(f, "removed permission {name}")
            }
            PatchEvent::QueryPackageRemoved { name } => {
                write!(f, "removed queried package {name}")
            }
            PatchEvent::QueryIntentRemoved { action } => {
                write!(f, "removed queried intent ({action})")
            }
            PatchEvent::Fallback { reason } => {
                write!(f, "manifest left unchanged: {reason}")
            }
        }
    }
}

/// The outcome of one or more patch passes over a tree.
#[derive(Debug, Clone, Default)]
pub struct PatchReport {
    /// Accumulated counters.
    pub stats: PatchStats,
    /// Ordered event log, one entry per change.
    pub events: Vec<PatchEvent>,
    /// Set when the tree could not be parsed and the payload passed through
    /// unchanged.
    pub fallback: bool,
}

impl PatchReport {
    /// Folds another report into this one, preserving event order.
    pub fn merge(&mut self, other: PatchReport) {
        self.stats.removed += other.stats.removed;
        self.stats.disabled += other.stats.disabled;
        self.events.extend(other.events);
        self.fallback |= other.fallback;
    }

    pub(crate) fn removed(&mut self, event: PatchEvent) {
        self.stats.removed += 1;
        self.events.push(event);
    }

    pub(crate) fn disabled(&mut self, event: PatchEvent) {
        self.stats.disabled += 1;
        self.events.push(event);
    }
}

/// Patches decoded manifest text, best-effort.
///
/// Runs [`apply_rules`] when `db` is given, then [`apply_custom`] when
/// `custom` is given, and re-serializes. A manifest that cannot be parsed
/// (or re-serialized) is returned unchanged with [`PatchReport::fallback`]
/// set and a [`PatchEvent::Fallback`] entry in the log; the caller keeps
/// packaging.
pub fn patch_manifest(
    xml: &str,
    db: Option<&SignatureDatabase>,
    custom: Option<&CustomPatch>,
) -> (String, PatchReport) {
    let mut tree = match manifest::parse_document(xml) {
        Ok(tree) => tree,
        Err(err) => return fallback(xml, err),
    };

    let mut report = PatchReport::default();
    if let Some(db) = db {
        report.merge(apply_rules(&mut tree, db));
    }
    if let Some(custom) = custom {
        report.merge(apply_custom(&mut tree, custom));
    }

    match manifest::write_document(&tree) {
        Ok(patched) => (patched, report),
        Err(err) => fallback(xml, err),
    }
}

fn fallback(xml: &str, err: crate::Error) -> (String, PatchReport) {
    warn!("manifest patch failed, passing payload through unchanged: {err}");
    let mut report = PatchReport {
        fallback: true,
        ..PatchReport::default()
    };
    report.events.push(PatchEvent::Fallback {
        reason: err.to_string(),
    });
    (xml.to_string(), report)
}
