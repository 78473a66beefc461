//! Global constants for menagerie-models

// ============== Arenas ==============

/// Spacing between the rendering subdivisions of a ground plane
pub const GROUNDPLANE_QUAD_SIZE: f64 = 0.05;

/// Name shared by the ground texture, material and geom
pub const GROUNDPLANE: &str = "groundplane";

// ============== Hands ==============

/// Geom group holding sensor sites (hidden by default in viewers)
pub const SENSOR_SITES_GROUP: i64 = 4;

/// Edge length of a joint torque sensor site
pub const SENSOR_SITE_SIZE: f64 = 0.001;

// ============== Shadow Hand ==============

/// Number of joints of the Shadow Hand E3M5
pub const SHADOW_HAND_NQ: usize = 24;

/// Number of actuators of the Shadow Hand E3M5
pub const SHADOW_HAND_NU: usize = 20;

/// Wrist yaw range (rad) used when the range is restricted
pub const RESTRICTED_WRJ2_RANGE: [f64; 2] = [-0.174533, 0.174533];

/// Default class of collision geoms whose fingertips may be simplified
pub const FINGERTIP_COLLISION_CLASS: &str = "plastic_collision";

/// Mesh name suffix of distal fingertip collision meshes
pub const FINGERTIP_MESH_SUFFIX: &str = "distal_pst";

/// Model name of an arena built without one
pub const DEFAULT_ARENA_NAME: &str = "arena";
