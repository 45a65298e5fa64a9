//! The rule-based patch engine.
//!
//! Four passes over the tree, in a fixed order. The order affects only the
//! event log; the passes are independent and the final tree state does not
//! depend on it.

use log::{debug, info};

use crate::manifest::{ManifestTree, NodeId};
use crate::signatures::{Action, SignatureDatabase};

use super::{PatchEvent, PatchReport};

/// Component tags subject to the rules, anywhere under `application`.
///
/// `meta-data` and `property` nest inside other components, which is why the
/// search is recursive and detachment goes through the immediate parent.
const COMPONENT_TAGS: &[&str] = &[
    "activity",
    "activity-alias",
    "service",
    "receiver",
    "provider",
    "meta-data",
    "uses-library",
    "property",
];

/// Applies the signature database to a manifest tree, in place.
///
/// Running the engine twice is a no-op the second time: deleted nodes are
/// gone, and disabling skips nodes whose `android:enabled` is already
/// `"false"`, so the second report counts zero changes.
pub fn apply_rules(tree: &mut ManifestTree, db: &SignatureDatabase) -> PatchReport {
    let mut report = PatchReport::default();
    component_pass(tree, db, &mut report);
    permission_pass(tree, db, &mut report);
    queries_pass(tree, db, &mut report);
    strip_blank_text(tree);
    info!(
        "patch rules applied: {} removed, {} disabled",
        report.stats.removed, report.stats.disabled
    );
    report
}

fn component_pass(tree: &mut ManifestTree, db: &SignatureDatabase, report: &mut PatchReport) {
    // A manifest without an <application> element makes this pass a no-op.
    let Some(application) = tree.application() else {
        return;
    };

    for &tag in COMPONENT_TAGS {
        // Collect before mutating; detaching a node while iterating its
        // siblings would skip entries.
        let candidates: Vec<(NodeId, String)> = tree
            .elements_by_tag(application, tag)
            .into_iter()
            .map(|id| {
                let name = tree.android_attr(id, "name").unwrap_or_default().to_string();
                (id, name)
            })
            .collect();

        for (id, name) in candidates {
            match db.classify(&name) {
                Action::Keep => {}
                Action::Delete => {
                    if tree.detach(id) {
                        debug!("tracker component removed: {name} ({tag})");
                        report.removed(PatchEvent::ComponentRemoved {
                            tag: tag.to_string(),
                            name,
                        });
                    }
                }
                Action::Disable => {
                    if is_disabled(tree, id) {
                        continue;
                    }
                    tree.set_android_attr(id, "enabled", "false");
                    tree.set_android_attr(id, "exported", "false");
                    debug!("tracker component disabled: {name} ({tag})");
                    report.disabled(PatchEvent::ComponentDisabled {
                        tag: tag.to_string(),
                        name,
                    });
                }
            }
        }
    }
}

fn is_disabled(tree: &ManifestTree, id: NodeId) -> bool {
    tree.android_attr(id, "enabled") == Some("false")
}

fn permission_pass(tree: &mut ManifestTree, db: &SignatureDatabase, report: &mut PatchReport) {
    let permissions = tree.child_elements_by_tag(tree.root(), "uses-permission");
    for id in permissions {
        let name = tree.android_attr(id, "name").unwrap_or_default().to_string();
        if db.classify_permission(&name) == Action::Delete && tree.detach(id) {
            debug!("permission removed: {name}");
            report.removed(PatchEvent::PermissionRemoved { name });
        }
    }
}

fn queries_pass(tree: &mut ManifestTree, db: &SignatureDatabase, report: &mut PatchReport) {
    for queries in tree.child_elements_by_tag(tree.root(), "queries") {
        for package in tree.child_elements_by_tag(queries, "package") {
            let name = tree
                .android_attr(package, "name")
                .unwrap_or_default()
                .to_string();
            if db.classify(&name) == Action::Delete && tree.detach(package) {
                report.removed(PatchEvent::QueryPackageRemoved { name });
            }
        }

        for intent in tree.child_elements_by_tag(queries, "intent") {
            // An intent declaration is removed as a unit: one matching
            // action condemns the whole element, never a partial rewrite.
            let matched = tree
                .child_elements_by_tag(intent, "action")
                .into_iter()
                .find_map(|action| {
                    tree.android_attr(action, "name")
                        .filter(|name| db.matches_pattern(name))
                        .map(str::to_string)
                });
            if let Some(action) = matched {
                if tree.detach(intent) {
                    report.removed(PatchEvent::QueryIntentRemoved { action });
                }
            }
        }
    }
}

/// Removes text nodes that are exclusively whitespace, recursively.
///
/// Keeps the re-serialized output readable; absent text values are treated
/// the same as blank ones.
fn strip_blank_text(tree: &mut ManifestTree) {
    let blanks: Vec<NodeId> = tree
        .descendants(tree.root())
        .into_iter()
        .filter(|&id| tree.is_blank_text(id))
        .collect();
    for id in blanks {
        tree.detach(id);
    }
}
