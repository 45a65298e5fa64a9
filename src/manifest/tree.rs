//! Arena-backed manifest tree.
//!
//! Nodes live in a flat `Vec` and are addressed by [`NodeId`]; child lists
//! hold ids and each node records its parent id as a back-reference, never an
//! ownership edge. Detaching a node unlinks it from its parent and leaves it
//! orphaned in the arena. Traversals start at the root and never reach
//! orphans, so no generation counters or frees are needed for the lifetime of
//! a single pipeline run.

use std::fmt;

/// Namespace URI bound to the `android:` attribute prefix.
pub const ANDROID_NS: &str = "http://schemas.android.com/apk/res/android";

/// Index of a node in a [`ManifestTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// A qualified attribute name: optional namespace prefix plus local name.
///
/// `xmlns` declarations are stored as ordinary attributes (prefix `xmlns`),
/// so a parse/serialize round trip preserves them verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrName {
    /// The namespace prefix, e.g. `android` in `android:name`.
    pub prefix: Option<String>,
    /// The local name, e.g. `name` in `android:name`.
    pub local: String,
}

impl AttrName {
    /// Creates a qualified attribute name.
    pub fn new(prefix: Option<&str>, local: &str) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            local: local.to_string(),
        }
    }

    /// Parses a raw attribute name, splitting on the first `:`.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((prefix, local)) => Self::new(Some(prefix), local),
            None => Self::new(None, raw),
        }
    }
}

impl fmt::Display for AttrName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{prefix}:{}", self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

/// The payload of a single tree node.
#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Element {
        tag: String,
        attributes: Vec<(AttrName, String)>,
    },
    Text {
        /// Absent (not just empty) values occur when a decoder emits a text
        /// node without character data; they must be tolerated.
        value: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

/// Rooted, ordered tree of manifest nodes.
///
/// The root is the `manifest` element. A well-formed manifest has exactly one
/// `application` child; degenerate inputs with none are tolerated and make
/// the component rules a no-op.
#[derive(Debug, Clone)]
pub struct ManifestTree {
    nodes: Vec<Node>,
    root: NodeId,
    /// Prefix bound to [`ANDROID_NS`] in this document, when declared.
    android_prefix: Option<String>,
}

impl ManifestTree {
    /// Creates a tree holding only a root element.
    pub fn with_root(tag: impl Into<String>) -> Self {
        let root = Node {
            kind: NodeKind::Element {
                tag: tag.into(),
                attributes: Vec::new(),
            },
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            android_prefix: None,
        }
    }

    /// Returns the root node id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the prefix bound to the android namespace.
    ///
    /// Defaults to `android` when the document declares no binding; decoders
    /// emit that prefix in practice.
    pub fn android_prefix(&self) -> &str {
        self.android_prefix.as_deref().unwrap_or("android")
    }

    pub(crate) fn set_android_prefix(&mut self, prefix: &str) {
        self.android_prefix = Some(prefix.to_string());
    }

    /// Appends a new element under `parent` and returns its id.
    pub fn add_element(&mut self, parent: NodeId, tag: impl Into<String>) -> NodeId {
        self.push_node(
            parent,
            NodeKind::Element {
                tag: tag.into(),
                attributes: Vec::new(),
            },
        )
    }

    /// Appends a new text node under `parent` and returns its id.
    pub fn add_text(&mut self, parent: NodeId, value: Option<String>) -> NodeId {
        self.push_node(parent, NodeKind::Text { value })
    }

    fn push_node(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Returns the element tag, or `None` for text nodes.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text { .. } => None,
        }
    }

    /// Returns `true` if the node is an element.
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Element { .. })
    }

    /// Returns the text value, or `None` for elements and absent text.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text { value } => value.as_deref(),
            NodeKind::Element { .. } => None,
        }
    }

    /// Returns `true` for a text node whose value is absent or exclusively
    /// whitespace.
    pub fn is_blank_text(&self, id: NodeId) -> bool {
        match &self.node(id).kind {
            NodeKind::Text { value } => {
                value.as_deref().is_none_or(|v| v.trim().is_empty())
            }
            NodeKind::Element { .. } => false,
        }
    }

    /// Returns the node's parent, or `None` for the root and orphans.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Returns the node's children in document order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Returns the ordered attribute list of an element.
    pub fn attributes(&self, id: NodeId) -> &[(AttrName, String)] {
        match &self.node(id).kind {
            NodeKind::Element { attributes, .. } => attributes,
            NodeKind::Text { .. } => &[],
        }
    }

    /// Looks up an attribute by prefix and local name.
    pub fn attribute(&self, id: NodeId, prefix: Option<&str>, local: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|(name, _)| name.prefix.as_deref() == prefix && name.local == local)
            .map(|(_, value)| value.as_str())
    }

    /// Looks up an attribute in the android namespace, falling back to an
    /// unqualified attribute when the namespaced lookup yields nothing.
    ///
    /// The fallback exists because some decoders fail to carry namespace
    /// bindings through; an empty value counts as absent for classification
    /// purposes.
    pub fn android_attr(&self, id: NodeId, local: &str) -> Option<&str> {
        let prefix = self.android_prefix().to_string();
        match self.attribute(id, Some(&prefix), local) {
            Some(value) if !value.is_empty() => Some(value),
            _ => self.attribute(id, None, local).filter(|v| !v.is_empty()),
        }
    }

    /// Sets an attribute, replacing any existing value under the same name.
    pub fn set_attribute(&mut self, id: NodeId, name: AttrName, value: impl Into<String>) {
        if let NodeKind::Element { attributes, .. } = &mut self.nodes[id.0].kind {
            let value = value.into();
            match attributes.iter().position(|(n, _)| *n == name) {
                Some(index) => attributes[index].1 = value,
                None => attributes.push((name, value)),
            }
        }
    }

    /// Sets an attribute in the android namespace.
    pub fn set_android_attr(&mut self, id: NodeId, local: &str, value: impl Into<String>) {
        let name = AttrName::new(Some(self.android_prefix()), local);
        self.set_attribute(id, name, value);
    }

    /// Unlinks a node from its parent.
    ///
    /// Returns `false` if the node was already detached (or is the root),
    /// making repeated detaches a no-op.
    pub fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.nodes[id.0].parent.take() else {
            return false;
        };
        self.nodes[parent.0].children.retain(|&child| child != id);
        true
    }

    /// Returns all element descendants of `start` (excluding `start`) in
    /// preorder.
    pub fn descendants(&self, start: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(start).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Returns element descendants of `start` with the given tag, in
    /// preorder.
    pub fn elements_by_tag(&self, start: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(start)
            .into_iter()
            .filter(|&id| self.tag(id) == Some(tag))
            .collect()
    }

    /// Returns direct element children of `id` with the given tag.
    pub fn child_elements_by_tag(&self, id: NodeId, tag: &str) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| self.tag(child) == Some(tag))
            .collect()
    }

    /// Returns the `application` element, when present.
    pub fn application(&self) -> Option<NodeId> {
        self.child_elements_by_tag(self.root, "application")
            .into_iter()
            .next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (ManifestTree, NodeId, NodeId) {
        let mut tree = ManifestTree::with_root("manifest");
        let app = tree.add_element(tree.root(), "application");
        let service = tree.add_element(app, "service");
        tree.set_android_attr(service, "name", "com.example.Svc");
        (tree, app, service)
    }

    #[test]
    fn test_application_lookup() {
        let (tree, app, _) = sample();
        assert_eq!(tree.application(), Some(app));

        let empty = ManifestTree::with_root("manifest");
        assert_eq!(empty.application(), None);
    }

    #[test]
    fn test_attribute_roundtrip() {
        let (mut tree, _, service) = sample();
        assert_eq!(tree.android_attr(service, "name"), Some("com.example.Svc"));
        assert_eq!(tree.attribute(service, Some("android"), "name"), Some("com.example.Svc"));
        assert_eq!(tree.attribute(service, None, "name"), None);

        // Replacement keeps a single attribute instance.
        tree.set_android_attr(service, "name", "com.example.Other");
        assert_eq!(tree.attributes(service).len(), 1);
        assert_eq!(tree.android_attr(service, "name"), Some("com.example.Other"));
    }

    #[test]
    fn test_android_attr_unqualified_fallback() {
        let mut tree = ManifestTree::with_root("manifest");
        let node = tree.add_element(tree.root(), "service");
        tree.set_attribute(node, AttrName::new(None, "name"), "com.example.Plain");
        assert_eq!(tree.android_attr(node, "name"), Some("com.example.Plain"));

        // An empty namespaced value also falls through to the unqualified one.
        tree.set_android_attr(node, "name", "");
        assert_eq!(tree.android_attr(node, "name"), Some("com.example.Plain"));
    }

    #[test]
    fn test_detach_is_idempotent() {
        let (mut tree, app, service) = sample();
        assert!(tree.detach(service));
        assert!(tree.children(app).is_empty());
        assert!(!tree.detach(service));
        assert_eq!(tree.parent(service), None);
    }

    #[test]
    fn test_detach_root_is_noop() {
        let (mut tree, _, _) = sample();
        let root = tree.root();
        assert!(!tree.detach(root));
    }

    #[test]
    fn test_descendants_skip_orphans() {
        let (mut tree, app, service) = sample();
        let meta = tree.add_element(service, "meta-data");
        assert_eq!(tree.descendants(tree.root()), vec![app, service, meta]);
        tree.detach(service);
        assert_eq!(tree.descendants(tree.root()), vec![app]);
    }

    #[test]
    fn test_blank_text_detection() {
        let mut tree = ManifestTree::with_root("manifest");
        let absent = tree.add_text(tree.root(), None);
        let spaces = tree.add_text(tree.root(), Some("  \n\t".into()));
        let word = tree.add_text(tree.root(), Some("hello".into()));
        assert!(tree.is_blank_text(absent));
        assert!(tree.is_blank_text(spaces));
        assert!(!tree.is_blank_text(word));
        assert!(!tree.is_blank_text(tree.root()));
    }

    #[test]
    fn test_attr_name_parse() {
        assert_eq!(AttrName::parse("android:name"), AttrName::new(Some("android"), "name"));
        assert_eq!(AttrName::parse("package"), AttrName::new(None, "package"));
        assert_eq!(AttrName::parse("xmlns:android").to_string(), "xmlns:android");
    }
}
