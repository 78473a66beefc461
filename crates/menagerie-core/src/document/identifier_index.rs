//! Cached identifier index for name lookups

use std::collections::HashMap;

use crate::constants::SCOPE_SEPARATOR;

use super::element::{Element, ElementId};
use super::tag::{Namespace, Tag};

/// Identifier index (computed on demand, invalidated by structural changes)
#[derive(Debug, Clone, Default)]
pub(super) struct IdentifierIndex {
    /// Full identifier -> element, per namespace
    pub identifiers: HashMap<(Namespace, String), ElementId>,
    /// Owning root of each element (top-level root or an attached root)
    pub scopes: Vec<ElementId>,
    /// Identifier prefix of each root ("" for the top-level root)
    pub prefixes: HashMap<ElementId, String>,
    /// Identifiers seen more than once (first occurrence wins)
    pub duplicates: Vec<(Namespace, String)>,
    /// Whether index is valid
    pub valid: bool,
}

impl IdentifierIndex {
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    pub fn rebuild(&mut self, elements: &[Element], root: ElementId) {
        self.identifiers.clear();
        self.prefixes.clear();
        self.duplicates.clear();
        self.scopes = vec![root; elements.len()];
        self.prefixes.insert(root, String::new());

        // Depth-first in document order
        let mut stack = vec![(root, root)];
        while let Some((id, parent_scope)) = stack.pop() {
            let Some(element) = elements.get(id.0) else {
                continue;
            };

            let scope = if element.tag == Tag::Mujoco && id != root {
                let parent_prefix = self.prefixes.get(&parent_scope).cloned().unwrap_or_default();
                let model = element
                    .attributes
                    .get("model")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                self.prefixes
                    .insert(id, format!("{parent_prefix}{model}{SCOPE_SEPARATOR}"));
                id
            } else {
                parent_scope
            };
            self.scopes[id.0] = scope;

            if let (Some(name), Some(namespace)) = (&element.name, element.tag.namespace()) {
                let prefix = self.prefixes.get(&scope).map(String::as_str).unwrap_or("");
                let key = (namespace, format!("{prefix}{name}"));
                if self.identifiers.contains_key(&key) {
                    self.duplicates.push(key);
                } else {
                    self.identifiers.insert(key, id);
                }
            }

            for child in element.children.iter().rev() {
                stack.push((*child, scope));
            }
        }

        self.valid = true;
    }

    pub fn prefix_of(&self, id: ElementId) -> &str {
        self.scopes
            .get(id.0)
            .and_then(|scope| self.prefixes.get(scope))
            .map(String::as_str)
            .unwrap_or("")
    }
}
