//! Menagerie Models
//!
//! Ready-made documents built on menagerie-core:
//! - Arena: empty world to compose robots into
//! - CheckeredFloor: arena with a textured ground plane
//! - Hands: the Shadow Hand and the `Hand` trait

pub mod arena;
pub mod constants;
pub mod floors;
pub mod hands;

pub use arena::*;
pub use constants::*;
pub use floors::*;
pub use hands::*;
