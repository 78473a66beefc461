//! Fail-loud element lookup
//!
//! Callers that ask for elements always expect at least one match, so an
//! empty result is reported as an error rather than an empty sequence.

use crate::document::{ElementId, ModelDocument, Namespace, Tag};

/// Filters for [`ModelDocument::find_all`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FindOptions {
    /// Only elements directly inside the top-level sections
    /// (e.g. bodies that are children of `worldbody`)
    pub immediate_children_only: bool,
    /// Skip elements introduced by attaching other documents
    pub exclude_attachments: bool,
}

impl FindOptions {
    pub fn immediate_children_only() -> Self {
        Self {
            immediate_children_only: true,
            ..Self::default()
        }
    }

    pub fn exclude_attachments() -> Self {
        Self {
            exclude_attachments: true,
            ..Self::default()
        }
    }
}

impl ModelDocument {
    /// Every element of a namespace in document order, or an error if there is none
    pub fn find_all(
        &self,
        namespace: Namespace,
        options: FindOptions,
    ) -> Result<Vec<ElementId>, NotFoundError> {
        let mut found = Vec::new();
        let mut stack = vec![self.root()];

        while let Some(id) = stack.pop() {
            let Ok(element) = self.get(id) else {
                continue;
            };
            if element.tag() == Tag::Mujoco && id != self.root() && options.exclude_attachments {
                continue;
            }

            if element.tag().namespace() == Some(namespace) {
                let immediate = self
                    .parent(id)
                    .is_some_and(|parent| self.parent(parent) == Some(self.root()));
                if !options.immediate_children_only || immediate {
                    found.push(id);
                }
            }

            stack.extend(element.children().iter().rev().copied());
        }

        if found.is_empty() {
            return Err(NotFoundError::NoneFound { namespace });
        }
        Ok(found)
    }

    /// The element with the given full identifier (e.g. `"hand/WRJ2"`)
    pub fn find_one(
        &self,
        namespace: Namespace,
        identifier: &str,
    ) -> Result<ElementId, NotFoundError> {
        self.lookup(namespace, identifier)
            .ok_or_else(|| NotFoundError::Missing {
                namespace,
                identifier: identifier.to_string(),
            })
    }

    /// Every element of a namespace in document order (possibly empty)
    pub fn elements_in(&self, namespace: Namespace) -> Vec<ElementId> {
        self.descendants(self.root())
            .filter(|id| {
                self.get(*id)
                    .is_ok_and(|e| e.tag().namespace() == Some(namespace))
            })
            .collect()
    }
}

/// A required element is absent
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotFoundError {
    #[error("No {namespace} found in the model")]
    NoneFound { namespace: Namespace },
    #[error("{namespace} with identifier '{identifier}' not found")]
    Missing {
        namespace: Namespace,
        identifier: String,
    },
}
