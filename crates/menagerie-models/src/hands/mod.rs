//! Robot hands

mod shadow_hand;

use std::fmt;

use menagerie_core::{ElementId, ModelDocument, NotFoundError};

pub use shadow_hand::{HandError, ShadowHand, ShadowHandOptions};

/// Which hand is modelled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HandSide {
    Left,
    #[default]
    Right,
}

impl fmt::Display for HandSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandSide::Left => write!(f, "left"),
            HandSide::Right => write!(f, "right"),
        }
    }
}

/// A hand model that can be attached to an arm
pub trait Hand {
    /// Model identifier (prefix of the hand's elements once attached)
    fn name(&self) -> &str;

    fn hand_side(&self) -> HandSide;

    /// Body the hand hangs from
    fn root_body(&self) -> Result<ElementId, NotFoundError>;

    fn joints(&self) -> &[ElementId];

    fn actuators(&self) -> &[ElementId];

    fn document(&self) -> &ModelDocument;

    fn into_document(self) -> ModelDocument
    where
        Self: Sized;
}
