//! In-memory structural model of an Android manifest.
//!
//! The decoded manifest text is parsed into a [`ManifestTree`]: an arena of
//! nodes addressed by [`NodeId`], with ordered namespaced attributes and
//! parent back-references. The tree is mutated in place by the patch passes
//! and serialized back to text for re-encoding.
//!
//! The binary AXML codec sits outside this module; the tree only ever sees
//! the plain-text form the codec produces.

mod tree;
mod xml;

pub use tree::{ANDROID_NS, AttrName, ManifestTree, NodeId};
pub use xml::{parse_document, write_document};
