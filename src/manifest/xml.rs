//! Manifest text parsing and serialization.
//!
//! The patch engine works on the plain-text XML the AXML codec produces.
//! This layer turns that text into a [`ManifestTree`] and back, preserving
//! attribute order and `xmlns` declarations so an untouched document
//! round-trips structurally.
//!
//! Parse failures map to [`Error::Patch`]; callers in the patch layer catch
//! that and fall back to the unmodified payload.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{Error, Result};

use super::tree::{ANDROID_NS, AttrName, ManifestTree, NodeId};

/// Parses manifest text into a tree.
///
/// Comments and processing instructions are dropped; AXML decoders never
/// emit them. The prefix bound to the android namespace is recorded for
/// attribute lookups.
pub fn parse_document(xml: &str) -> Result<ManifestTree> {
    let mut reader = Reader::from_str(xml);
    let mut tree: Option<ManifestTree> = None;
    // Stack of open elements; empty means we are above or past the root.
    let mut stack: Vec<NodeId> = Vec::new();

    loop {
        let event = reader.read_event().map_err(parse_error)?;
        match event {
            Event::Start(start) => {
                let id = open_element(&mut tree, &stack, &start)?;
                stack.push(id);
            }
            Event::Empty(start) => {
                open_element(&mut tree, &stack, &start)?;
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Text(text) => {
                let value = text.unescape().map_err(parse_error)?.into_owned();
                if let (Some(tree), Some(&parent)) = (tree.as_mut(), stack.last()) {
                    tree.add_text(parent, Some(value));
                }
                // Text outside the root is insignificant whitespace.
            }
            Event::CData(data) => {
                let value = String::from_utf8_lossy(&data.into_inner()).into_owned();
                if let (Some(tree), Some(&parent)) = (tree.as_mut(), stack.last()) {
                    tree.add_text(parent, Some(value));
                }
            }
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    tree.ok_or_else(|| Error::Patch("document has no root element".into()))
}

fn open_element(
    tree: &mut Option<ManifestTree>,
    stack: &[NodeId],
    start: &BytesStart<'_>,
) -> Result<NodeId> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let id = if tree.is_none() {
        *tree = Some(ManifestTree::with_root(tag));
        tree.as_ref().expect("just created").root()
    } else if let Some(&parent) = stack.last() {
        tree.as_mut().expect("checked above").add_element(parent, tag)
    } else {
        return Err(Error::Patch("multiple root elements".into()));
    };

    let tree = tree.as_mut().expect("tree exists once the root is open");
    for attr in start.attributes() {
        let attr = attr.map_err(parse_error)?;
        let name = AttrName::parse(&String::from_utf8_lossy(attr.key.as_ref()));
        let value = attr.unescape_value().map_err(parse_error)?.into_owned();
        if name.prefix.as_deref() == Some("xmlns") && value == ANDROID_NS {
            tree.set_android_prefix(&name.local);
        }
        tree.set_attribute(id, name, value);
    }
    Ok(id)
}

fn parse_error(err: impl std::fmt::Display) -> Error {
    Error::Patch(err.to_string())
}

/// Serializes a tree back to indented manifest text.
///
/// Output carries a standard XML declaration; indentation exists only to
/// keep the re-serialized text readable for preview UIs, the binary encoder
/// ignores it.
pub fn write_document(tree: &ManifestTree) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(parse_error)?;
    write_node(tree, tree.root(), &mut writer)?;
    String::from_utf8(writer.into_inner())
        .map_err(|e| Error::Patch(format!("serialized manifest is not UTF-8: {e}")))
}

fn write_node(tree: &ManifestTree, id: NodeId, writer: &mut Writer<Vec<u8>>) -> Result<()> {
    let Some(tag) = tree.tag(id) else {
        // The indenting writer owns the insignificant whitespace; blank and
        // absent text serialize to nothing.
        if !tree.is_blank_text(id) {
            if let Some(value) = tree.text(id) {
                writer
                    .write_event(Event::Text(BytesText::new(value)))
                    .map_err(parse_error)?;
            }
        }
        return Ok(());
    };

    let mut start = BytesStart::new(tag);
    for (name, value) in tree.attributes(id) {
        start.push_attribute((name.to_string().as_str(), value.as_str()));
    }

    let children = tree.children(id);
    if children.is_empty() {
        writer
            .write_event(Event::Empty(start))
            .map_err(parse_error)?;
    } else {
        writer
            .write_event(Event::Start(start))
            .map_err(parse_error)?;
        for &child in children {
            write_node(tree, child, writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(tag)))
            .map_err(parse_error)?;
    }
    Ok(())
}
