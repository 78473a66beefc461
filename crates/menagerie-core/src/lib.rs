//! Menagerie Core
//!
//! Building blocks for composing robot simulation models:
//! - ModelDocument: arena-backed tree of tagged, named elements
//! - Locator: fail-loud lookup of elements by namespace and identifier
//! - Compiler: numeric view of a document (DoF counts, mass table)
//! - Attach: graft a hand document onto an arm's attachment site
//! - Gravity: per-body gravity compensation

pub mod attach;
pub mod compile;
pub mod constants;
pub mod damping;
pub mod document;
pub mod gravity;
pub mod keyframe;
pub mod locator;

pub use attach::*;
pub use compile::*;
pub use constants::*;
pub use damping::*;
pub use document::*;
pub use gravity::*;
pub use keyframe::*;
pub use locator::*;
