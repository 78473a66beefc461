//! Keyframe vectors (saved control and position poses)

use crate::constants::HOME_KEYFRAME;
use crate::document::{DocumentError, ElementId, ModelDocument, Namespace, Tag};

/// Control and position vectors of a keyframe
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyVectors {
    /// Per-actuator control vector (length `nu`)
    pub ctrl: Vec<f64>,
    /// Per-coordinate position vector (length `nq`)
    pub qpos: Vec<f64>,
}

impl KeyVectors {
    pub fn new(ctrl: Vec<f64>, qpos: Vec<f64>) -> Self {
        Self { ctrl, qpos }
    }

    /// Neutral pose for `nu` actuators and `nq` coordinates
    pub fn zeros(nu: usize, nq: usize) -> Self {
        Self {
            ctrl: vec![0.0; nu],
            qpos: vec![0.0; nq],
        }
    }

    /// Fill unset vectors from a model's reference pose (zero controls, `qpos0`)
    pub fn or_reference(mut self, nu: usize, qpos0: &[f64]) -> Self {
        if self.ctrl.is_empty() {
            self.ctrl = vec![0.0; nu];
        }
        if self.qpos.is_empty() {
            self.qpos = qpos0.to_vec();
        }
        self
    }

    /// Append another pose after this one
    pub fn extend(&mut self, other: &KeyVectors) {
        self.ctrl.extend_from_slice(&other.ctrl);
        self.qpos.extend_from_slice(&other.qpos);
    }
}

impl ModelDocument {
    /// Read the vectors of a `<key>` element (unset vectors read as empty)
    pub fn key_vectors(&self, key: ElementId) -> Result<KeyVectors, DocumentError> {
        self.expect_key(key)?;
        Ok(KeyVectors {
            ctrl: self.attr_vector(key, "ctrl")?.unwrap_or_default(),
            qpos: self.attr_vector(key, "qpos")?.unwrap_or_default(),
        })
    }

    /// Overwrite the vectors of a `<key>` element (empty vectors are left unset)
    pub fn set_key_vectors(
        &mut self,
        key: ElementId,
        vectors: &KeyVectors,
    ) -> Result<(), DocumentError> {
        self.expect_key(key)?;
        for (attribute, values) in [("ctrl", &vectors.ctrl), ("qpos", &vectors.qpos)] {
            if values.is_empty() {
                self.remove_attr(key, attribute)?;
            } else {
                self.set_attr(key, attribute, values.clone())?;
            }
        }
        Ok(())
    }

    /// Add a named keyframe to the top-level keyframe section
    pub fn add_keyframe(
        &mut self,
        name: &str,
        vectors: &KeyVectors,
    ) -> Result<ElementId, DocumentError> {
        let key = self.add_named(self.keyframe(), Tag::Key, name)?;
        self.set_key_vectors(key, vectors)?;
        Ok(key)
    }

    /// The top-level "home" keyframe, if the document defines one
    pub fn home_key(&self) -> Option<ElementId> {
        self.lookup(Namespace::Key, HOME_KEYFRAME)
    }

    fn expect_key(&self, id: ElementId) -> Result<(), DocumentError> {
        match self.tag(id)? {
            Tag::Key => Ok(()),
            found => Err(DocumentError::UnexpectedTag {
                expected: Tag::Key,
                found,
            }),
        }
    }
}
