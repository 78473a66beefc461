//! Element nodes stored in a document arena

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::attribute::AttrValue;
use super::tag::Tag;

/// Handle to an element inside the arena of the document that created it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub(crate) usize);

impl ElementId {
    /// Position of the element in its document's arena
    pub fn index(&self) -> usize {
        self.0
    }

    pub(crate) fn offset(self, by: usize) -> Self {
        Self(self.0 + by)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A tagged node of a model document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub(crate) tag: Tag,
    pub(crate) name: Option<String>,
    /// Non-owning back reference; the document owns every node
    pub(crate) parent: Option<ElementId>,
    pub(crate) children: Vec<ElementId>,
    pub(crate) attributes: BTreeMap<String, AttrValue>,
}

impl Element {
    pub(crate) fn new(tag: Tag, name: Option<String>, parent: Option<ElementId>) -> Self {
        Self {
            tag,
            name,
            parent,
            children: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Local name (without any attachment prefix)
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttrValue> {
        &self.attributes
    }

    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }

    /// Shift every handle by `by` (used when moving nodes into another arena)
    pub(crate) fn offset_handles(&mut self, by: usize) {
        self.parent = self.parent.map(|p| p.offset(by));
        for child in &mut self.children {
            *child = child.offset(by);
        }
    }
}
