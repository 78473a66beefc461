//! Model document: an arena-backed tree of tagged elements

mod attribute;
mod element;
mod identifier_index;
mod tag;

use std::cell::{Ref, RefCell};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::SCOPE_SEPARATOR;

pub use attribute::AttrValue;
pub use element::{Element, ElementId};
pub use tag::{Namespace, SECTIONS, Tag, UnknownNamespace};

use identifier_index::IdentifierIndex;

/// File format version written by `save`
const FORMAT_VERSION: u32 = 1;

const ROOT: ElementId = ElementId(0);

/// Raw document data for (de)serialization (used internally)
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DocumentData {
    version: u32,
    elements: Vec<Element>,
}

/// Handles of the sections owned by the top-level root
#[derive(Debug, Clone, Copy)]
struct Sections {
    asset: ElementId,
    worldbody: ElementId,
    actuator: ElementId,
    sensor: ElementId,
    keyframe: ElementId,
}

/// Hierarchical model description (bodies, joints, actuators, sensors, assets)
#[derive(Debug, Clone, Serialize)]
#[serde(into = "DocumentData")]
pub struct ModelDocument {
    /// Arena of every element; index 0 is the root
    elements: Vec<Element>,
    sections: Sections,
    /// Identifier index (interior mutability for lazy evaluation)
    index: RefCell<IdentifierIndex>,
}

impl From<ModelDocument> for DocumentData {
    fn from(document: ModelDocument) -> Self {
        Self {
            version: FORMAT_VERSION,
            elements: document.elements,
        }
    }
}

impl TryFrom<DocumentData> for ModelDocument {
    type Error = DocumentError;

    fn try_from(data: DocumentData) -> Result<Self, Self::Error> {
        if data.version > FORMAT_VERSION {
            return Err(DocumentError::Malformed(format!(
                "unsupported format version {}",
                data.version
            )));
        }
        validate_structure(&data.elements)?;
        let sections = collect_sections(&data.elements, ROOT)
            .ok_or_else(|| DocumentError::Malformed("root is missing a section".into()))?;

        let document = Self {
            elements: data.elements,
            sections,
            index: RefCell::new(IdentifierIndex::default()),
        };
        if let Some((namespace, identifier)) = document.index().duplicates.first().cloned() {
            return Err(DocumentError::DuplicateName {
                namespace,
                identifier,
            });
        }
        Ok(document)
    }
}

impl<'de> Deserialize<'de> for ModelDocument {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let data = DocumentData::deserialize(deserializer)?;
        ModelDocument::try_from(data).map_err(serde::de::Error::custom)
    }
}

impl Default for ModelDocument {
    fn default() -> Self {
        Self::new("unnamed")
    }
}

impl ModelDocument {
    /// Create an empty document with its five sections
    pub fn new(model: impl Into<String>) -> Self {
        let mut root = Element::new(Tag::Mujoco, None, None);
        root.attributes
            .insert("model".to_string(), AttrValue::Text(model.into()));

        let mut elements = vec![root];
        for tag in SECTIONS {
            let id = ElementId(elements.len());
            elements.push(Element::new(tag, None, Some(ROOT)));
            elements[ROOT.0].children.push(id);
        }

        Self {
            elements,
            sections: Sections {
                asset: ElementId(1),
                worldbody: ElementId(2),
                actuator: ElementId(3),
                sensor: ElementId(4),
                keyframe: ElementId(5),
            },
            index: RefCell::new(IdentifierIndex::default()),
        }
    }

    // ============== Structure ==============

    pub fn root(&self) -> ElementId {
        ROOT
    }

    pub fn asset(&self) -> ElementId {
        self.sections.asset
    }

    pub fn worldbody(&self) -> ElementId {
        self.sections.worldbody
    }

    pub fn actuator(&self) -> ElementId {
        self.sections.actuator
    }

    pub fn sensor(&self) -> ElementId {
        self.sections.sensor
    }

    pub fn keyframe(&self) -> ElementId {
        self.sections.keyframe
    }

    /// Model identifier stored on the root
    pub fn model(&self) -> &str {
        self.elements[ROOT.0]
            .attributes
            .get("model")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
    }

    /// Rename the model (also the prefix its elements get once attached)
    pub fn set_model(&mut self, model: impl Into<String>) -> Result<(), DocumentError> {
        let model = model.into();
        validate_name(&model)?;
        self.elements[ROOT.0]
            .attributes
            .insert("model".to_string(), AttrValue::Text(model));
        self.invalidate_index();
        Ok(())
    }

    /// Number of elements in the arena (including attached sub-trees)
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True when the document holds nothing but its root and sections
    pub fn is_empty(&self) -> bool {
        self.elements.len() == 1 + SECTIONS.len()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        id.0 < self.elements.len()
    }

    pub fn get(&self, id: ElementId) -> Result<&Element, DocumentError> {
        self.elements
            .get(id.0)
            .ok_or(DocumentError::InvalidElement(id))
    }

    fn get_mut(&mut self, id: ElementId) -> Result<&mut Element, DocumentError> {
        self.elements
            .get_mut(id.0)
            .ok_or(DocumentError::InvalidElement(id))
    }

    /// Parent of an element (None for the root or an unknown id)
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.elements.get(id.0).and_then(|e| e.parent)
    }

    /// Children of an element (empty for an unknown id)
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.elements
            .get(id.0)
            .map(|e| e.children.as_slice())
            .unwrap_or_default()
    }

    /// Tag of an element
    pub fn tag(&self, id: ElementId) -> Result<Tag, DocumentError> {
        self.get(id).map(|e| e.tag)
    }

    /// First child with the given tag
    pub fn child_with_tag(&self, id: ElementId, tag: Tag) -> Option<ElementId> {
        self.children(id)
            .iter()
            .copied()
            .find(|child| self.elements[child.0].tag == tag)
    }

    /// All elements below `start` (inclusive) in document order
    pub fn descendants(&self, start: ElementId) -> Descendants<'_> {
        let stack = if self.contains(start) {
            vec![start]
        } else {
            Vec::new()
        };
        Descendants {
            document: self,
            stack,
        }
    }

    // ============== Editing ==============

    /// Add an unnamed child element
    pub fn add(&mut self, parent: ElementId, tag: Tag) -> Result<ElementId, DocumentError> {
        self.insert(parent, tag, None)
    }

    /// Add a named child element; the name must be unique in its namespace
    pub fn add_named(
        &mut self,
        parent: ElementId,
        tag: Tag,
        name: impl Into<String>,
    ) -> Result<ElementId, DocumentError> {
        self.insert(parent, tag, Some(name.into()))
    }

    fn insert(
        &mut self,
        parent: ElementId,
        tag: Tag,
        name: Option<String>,
    ) -> Result<ElementId, DocumentError> {
        let parent_tag = self.get(parent)?.tag;
        if !parent_tag.accepts(tag) {
            return Err(DocumentError::InvalidChild {
                parent: parent_tag,
                child: tag,
            });
        }

        if let Some(name) = &name {
            validate_name(name)?;
            let namespace = tag.namespace().ok_or(DocumentError::Unnameable(tag))?;
            let identifier = format!("{}{}", self.index().prefix_of(parent), name);
            if self.lookup(namespace, &identifier).is_some() {
                return Err(DocumentError::DuplicateName {
                    namespace,
                    identifier,
                });
            }
        }

        let id = ElementId(self.elements.len());
        self.elements.push(Element::new(tag, name, Some(parent)));
        self.elements[parent.0].children.push(id);
        self.invalidate_index();
        Ok(id)
    }

    /// Set an attribute, validated against the element's tag schema
    pub fn set_attr(
        &mut self,
        id: ElementId,
        key: &str,
        value: impl Into<AttrValue>,
    ) -> Result<(), DocumentError> {
        let element = self.get_mut(id)?;
        if !element.tag.allows(key) {
            return Err(DocumentError::UnknownAttribute {
                tag: element.tag,
                attribute: key.to_string(),
            });
        }
        if element.tag == Tag::Mujoco {
            // The model identifier feeds the identifier index
            return match value.into() {
                AttrValue::Text(model) if id == ROOT => self.set_model(model),
                other => Err(DocumentError::AttributeType {
                    tag: Tag::Mujoco,
                    attribute: key.to_string(),
                    expected: "text",
                    found: other.kind(),
                }),
            };
        }
        element.attributes.insert(key.to_string(), value.into());
        Ok(())
    }

    /// Remove an attribute, returning its previous value
    pub fn remove_attr(
        &mut self,
        id: ElementId,
        key: &str,
    ) -> Result<Option<AttrValue>, DocumentError> {
        Ok(self.get_mut(id)?.attributes.remove(key))
    }

    /// Write an attribute on an element obtained from this document's own traversal
    pub(crate) fn write_attr(&mut self, id: ElementId, key: &str, value: AttrValue) {
        if let Some(element) = self.elements.get_mut(id.0) {
            debug_assert!(element.tag.allows(key), "<{}> has no '{key}'", element.tag);
            element.attributes.insert(key.to_string(), value);
        }
    }

    // ============== Attributes ==============

    pub fn attr(&self, id: ElementId, key: &str) -> Option<&AttrValue> {
        self.elements.get(id.0).and_then(|e| e.attributes.get(key))
    }

    /// Scalar attribute (None if unset, error if not numeric)
    pub fn attr_f64(&self, id: ElementId, key: &str) -> Result<Option<f64>, DocumentError> {
        self.typed_attr(id, key, "float", AttrValue::as_f64)
    }

    /// Numeric tuple attribute (None if unset, error if not numeric)
    pub fn attr_vector(&self, id: ElementId, key: &str) -> Result<Option<Vec<f64>>, DocumentError> {
        self.typed_attr(id, key, "vector", AttrValue::as_vector)
    }

    /// Text attribute (None if unset, error if not text)
    pub fn attr_str(&self, id: ElementId, key: &str) -> Result<Option<&str>, DocumentError> {
        let element = self.get(id)?;
        match element.attributes.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_str()
                .map(Some)
                .ok_or_else(|| DocumentError::AttributeType {
                    tag: element.tag,
                    attribute: key.to_string(),
                    expected: "text",
                    found: value.kind(),
                }),
        }
    }

    fn typed_attr<T>(
        &self,
        id: ElementId,
        key: &str,
        expected: &'static str,
        convert: impl Fn(&AttrValue) -> Option<T>,
    ) -> Result<Option<T>, DocumentError> {
        let element = self.get(id)?;
        match element.attributes.get(key) {
            None => Ok(None),
            Some(value) => convert(value)
                .map(Some)
                .ok_or_else(|| DocumentError::AttributeType {
                    tag: element.tag,
                    attribute: key.to_string(),
                    expected,
                    found: value.kind(),
                }),
        }
    }

    // ============== Identifiers ==============

    /// Full identifier of a named element (`scope/.../name`)
    pub fn identifier(&self, id: ElementId) -> Option<String> {
        let name = self.elements.get(id.0)?.name.as_deref()?;
        Some(format!("{}{}", self.index().prefix_of(id), name))
    }

    /// Identifier prefix of the scope an element lives in ("" at top level)
    pub fn prefix_of(&self, id: ElementId) -> String {
        self.index().prefix_of(id).to_string()
    }

    /// Root owning an element: the document root or an attached root
    pub fn scope_of(&self, id: ElementId) -> ElementId {
        self.index().scopes.get(id.0).copied().unwrap_or(ROOT)
    }

    /// Whether an element was introduced by an attachment
    pub fn is_attached(&self, id: ElementId) -> bool {
        self.scope_of(id) != ROOT
    }

    /// Resolve a name referenced by `from` (e.g. an actuator's joint) within its scope
    pub fn resolve(&self, from: ElementId, namespace: Namespace, name: &str) -> Option<ElementId> {
        let identifier = format!("{}{}", self.index().prefix_of(from), name);
        self.lookup(namespace, &identifier)
    }

    pub(crate) fn lookup(&self, namespace: Namespace, identifier: &str) -> Option<ElementId> {
        self.index()
            .identifiers
            .get(&(namespace, identifier.to_string()))
            .copied()
    }

    /// Roots of every attached sub-document, in document order
    pub fn attached_roots(&self) -> Vec<ElementId> {
        self.descendants(ROOT)
            .filter(|id| *id != ROOT && self.elements[id.0].tag == Tag::Mujoco)
            .collect()
    }

    /// Document grafted onto a site, if any
    pub fn attachment_of(&self, site: ElementId) -> Option<ElementId> {
        self.child_with_tag(site, Tag::Mujoco)
    }

    fn index(&self) -> Ref<'_, IdentifierIndex> {
        {
            let mut index = self.index.borrow_mut();
            if !index.valid {
                index.rebuild(&self.elements, ROOT);
            }
        }
        self.index.borrow()
    }

    fn invalidate_index(&self) {
        self.index.borrow_mut().invalidate();
    }

    /// Move `child` into this arena below `site`, returning the grafted root
    pub(crate) fn graft(&mut self, site: ElementId, child: ModelDocument) -> ElementId {
        let offset = self.elements.len();
        let grafted_root = child.root().offset(offset);
        for mut element in child.elements {
            element.offset_handles(offset);
            self.elements.push(element);
        }
        self.elements[grafted_root.0].parent = Some(site);
        self.elements[site.0].children.push(grafted_root);
        self.invalidate_index();
        grafted_root
    }

    // ============== Persistence ==============

    /// Save document to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        let path = path.as_ref();
        let content = self.to_bytes()?;
        std::fs::write(path, content).map_err(|e| DocumentError::Io(e.to_string()))?;
        tracing::debug!("Saved model '{}' to {}", self.model(), path.display());
        Ok(())
    }

    /// Serialize document to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocumentError> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| DocumentError::Serialize(e.to_string()))?;
        Ok(content.into_bytes())
    }

    /// Load document from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| DocumentError::Io(e.to_string()))?;
        let document: ModelDocument =
            ron::from_str(&content).map_err(|e| DocumentError::Deserialize(e.to_string()))?;
        Ok(document)
    }

    /// Load document from bytes
    pub fn load_from_bytes(data: &[u8]) -> Result<Self, DocumentError> {
        let content =
            std::str::from_utf8(data).map_err(|e| DocumentError::Deserialize(e.to_string()))?;
        let document: ModelDocument =
            ron::from_str(content).map_err(|e| DocumentError::Deserialize(e.to_string()))?;
        Ok(document)
    }
}

/// Pre-order iterator over a sub-tree
pub struct Descendants<'a> {
    document: &'a ModelDocument,
    stack: Vec<ElementId>,
}

impl Iterator for Descendants<'_> {
    type Item = ElementId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.document.children(id).iter().rev().copied());
        Some(id)
    }
}

pub(crate) fn validate_name(name: &str) -> Result<(), DocumentError> {
    if name.is_empty() || name.contains(SCOPE_SEPARATOR) {
        return Err(DocumentError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn collect_sections(elements: &[Element], root: ElementId) -> Option<Sections> {
    let children = &elements.get(root.0)?.children;
    let section = |tag: Tag| {
        children
            .iter()
            .copied()
            .find(|child| elements.get(child.0).is_some_and(|e| e.tag == tag))
    };
    Some(Sections {
        asset: section(Tag::Asset)?,
        worldbody: section(Tag::Worldbody)?,
        actuator: section(Tag::Actuator)?,
        sensor: section(Tag::Sensor)?,
        keyframe: section(Tag::Keyframe)?,
    })
}

/// Check that loaded elements form a single well-typed tree rooted at index 0
fn validate_structure(elements: &[Element]) -> Result<(), DocumentError> {
    let root = elements
        .first()
        .ok_or_else(|| DocumentError::Malformed("document has no root".into()))?;
    if root.tag != Tag::Mujoco || root.parent.is_some() {
        return Err(DocumentError::Malformed(
            "first element must be a parentless <mujoco> root".into(),
        ));
    }

    let mut seen = vec![false; elements.len()];
    seen[ROOT.0] = true;
    let mut stack = vec![ROOT];
    while let Some(id) = stack.pop() {
        let element = &elements[id.0];
        for &child in &element.children {
            let Some(child_element) = elements.get(child.0) else {
                return Err(DocumentError::Malformed(format!(
                    "{id} references missing child {child}"
                )));
            };
            if seen[child.0] || child_element.parent != Some(id) {
                return Err(DocumentError::Malformed(format!(
                    "{child} is not a tree child of {id}"
                )));
            }
            let allowed = element.tag.accepts(child_element.tag)
                || (element.tag == Tag::Mujoco && child_element.tag.is_section())
                || (element.tag == Tag::Site && child_element.tag == Tag::Mujoco);
            if !allowed {
                return Err(DocumentError::InvalidChild {
                    parent: element.tag,
                    child: child_element.tag,
                });
            }
            if child_element.tag == Tag::Mujoco && collect_sections(elements, child).is_none() {
                return Err(DocumentError::Malformed(format!(
                    "attached root {child} is missing a section"
                )));
            }
            seen[child.0] = true;
            stack.push(child);
        }
    }

    if let Some(orphan) = seen.iter().position(|reached| !reached) {
        return Err(DocumentError::Malformed(format!(
            "{} is unreachable from the root",
            ElementId(orphan)
        )));
    }
    Ok(())
}

/// Document-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum DocumentError {
    #[error("Element not found: {0}")]
    InvalidElement(ElementId),
    #[error("<{parent}> cannot contain <{child}>")]
    InvalidChild { parent: Tag, child: Tag },
    #[error("<{0}> elements cannot be named")]
    Unnameable(Tag),
    #[error("Expected <{expected}> element, found <{found}>")]
    UnexpectedTag { expected: Tag, found: Tag },
    #[error("Invalid name: '{0}'")]
    InvalidName(String),
    #[error("Duplicate {namespace} identifier: {identifier}")]
    DuplicateName {
        namespace: Namespace,
        identifier: String,
    },
    #[error("Unknown attribute '{attribute}' on <{tag}>")]
    UnknownAttribute { tag: Tag, attribute: String },
    #[error("Attribute '{attribute}' on <{tag}> is {found}, expected {expected}")]
    AttributeType {
        tag: Tag,
        attribute: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("Malformed document: {0}")]
    Malformed(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}
