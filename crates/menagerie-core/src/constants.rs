//! Global constants for menagerie-core

/// Name of the site a sub-document is grafted onto
pub const ATTACHMENT_SITE: &str = "attachment_site";

/// Name of the keyframe reconciled during attachment
pub const HOME_KEYFRAME: &str = "home";

/// Separator between a scope prefix and an element name in identifiers
pub const SCOPE_SEPARATOR: char = '/';

/// Gravity compensation value that cancels a body's weight exactly
pub const FULL_GRAVITY_COMPENSATION: f64 = 1.0;

/// Default geom density in kg/m^3 (water)
pub const DEFAULT_DENSITY: f64 = 1000.0;

/// Masses below this are treated as zero by the compiler
pub const MIN_MASS: f64 = 1e-15;
