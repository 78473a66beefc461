//! Element tags, identifier namespaces and the per-tag attribute schema

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Element tag (closed set of the MJCF elements this crate understands)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    /// Document root (`<mujoco model="...">`)
    Mujoco,
    // Sections owned by every root
    Asset,
    Worldbody,
    Actuator,
    Sensor,
    Keyframe,
    // Assets
    Texture,
    Material,
    Mesh,
    // Kinematic tree
    Body,
    Inertial,
    Joint,
    FreeJoint,
    Geom,
    Site,
    Camera,
    Light,
    // Actuators
    Motor,
    Position,
    Velocity,
    General,
    // Sensors
    Torque,
    Force,
    JointPos,
    JointVel,
    Touch,
    // Keyframes
    Key,
}

/// Sections created under every document root, in document order
pub const SECTIONS: [Tag; 5] = [
    Tag::Asset,
    Tag::Worldbody,
    Tag::Actuator,
    Tag::Sensor,
    Tag::Keyframe,
];

const ACTUATOR_ATTRIBUTES: &[&str] = &[
    "joint",
    "site",
    "ctrlrange",
    "ctrllimited",
    "forcerange",
    "forcelimited",
    "gear",
    "class",
];

const SENSOR_SITE_ATTRIBUTES: &[&str] = &["site", "noise", "cutoff"];
const SENSOR_JOINT_ATTRIBUTES: &[&str] = &["joint", "noise", "cutoff"];

impl Tag {
    /// MJCF spelling of the tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Mujoco => "mujoco",
            Tag::Asset => "asset",
            Tag::Worldbody => "worldbody",
            Tag::Actuator => "actuator",
            Tag::Sensor => "sensor",
            Tag::Keyframe => "keyframe",
            Tag::Texture => "texture",
            Tag::Material => "material",
            Tag::Mesh => "mesh",
            Tag::Body => "body",
            Tag::Inertial => "inertial",
            Tag::Joint => "joint",
            Tag::FreeJoint => "freejoint",
            Tag::Geom => "geom",
            Tag::Site => "site",
            Tag::Camera => "camera",
            Tag::Light => "light",
            Tag::Motor => "motor",
            Tag::Position => "position",
            Tag::Velocity => "velocity",
            Tag::General => "general",
            Tag::Torque => "torque",
            Tag::Force => "force",
            Tag::JointPos => "jointpos",
            Tag::JointVel => "jointvel",
            Tag::Touch => "touch",
            Tag::Key => "key",
        }
    }

    /// Identifier namespace of the tag (None for unnameable elements)
    pub fn namespace(&self) -> Option<Namespace> {
        match self {
            Tag::Mujoco
            | Tag::Asset
            | Tag::Worldbody
            | Tag::Actuator
            | Tag::Sensor
            | Tag::Keyframe
            | Tag::Inertial => None,
            Tag::Texture => Some(Namespace::Texture),
            Tag::Material => Some(Namespace::Material),
            Tag::Mesh => Some(Namespace::Mesh),
            Tag::Body => Some(Namespace::Body),
            Tag::Joint | Tag::FreeJoint => Some(Namespace::Joint),
            Tag::Geom => Some(Namespace::Geom),
            Tag::Site => Some(Namespace::Site),
            Tag::Camera => Some(Namespace::Camera),
            Tag::Light => Some(Namespace::Light),
            Tag::Motor | Tag::Position | Tag::Velocity | Tag::General => {
                Some(Namespace::Actuator)
            }
            Tag::Torque | Tag::Force | Tag::JointPos | Tag::JointVel | Tag::Touch => {
                Some(Namespace::Sensor)
            }
            Tag::Key => Some(Namespace::Key),
        }
    }

    /// Whether this tag is one of the sections owned by a root
    pub fn is_section(&self) -> bool {
        SECTIONS.contains(self)
    }

    /// Whether an element of this tag may hold a child of the given tag.
    ///
    /// Roots only hold their sections, which are created with the document;
    /// documents are grafted onto sites by the attacher, never through `add`.
    pub fn accepts(&self, child: Tag) -> bool {
        match self {
            Tag::Asset => matches!(child, Tag::Texture | Tag::Material | Tag::Mesh),
            Tag::Worldbody | Tag::Body => matches!(
                child,
                Tag::Body
                    | Tag::Inertial
                    | Tag::Joint
                    | Tag::FreeJoint
                    | Tag::Geom
                    | Tag::Site
                    | Tag::Camera
                    | Tag::Light
            ),
            Tag::Actuator => child.namespace() == Some(Namespace::Actuator),
            Tag::Sensor => child.namespace() == Some(Namespace::Sensor),
            Tag::Keyframe => child == Tag::Key,
            _ => false,
        }
    }

    /// Attribute names accepted by elements of this tag
    pub fn attributes(&self) -> &'static [&'static str] {
        match self {
            Tag::Mujoco => &["model"],
            Tag::Asset | Tag::Worldbody | Tag::Actuator | Tag::Sensor | Tag::Keyframe => &[],
            Tag::Texture => &[
                "type", "builtin", "mark", "rgb1", "rgb2", "markrgb", "width", "height", "file",
            ],
            Tag::Material => &["texture", "texuniform", "texrepeat", "reflectance", "rgba"],
            Tag::Mesh => &["file", "scale"],
            Tag::Body => &["pos", "quat", "gravcomp", "childclass", "mocap"],
            Tag::Inertial => &["pos", "quat", "mass", "diaginertia"],
            Tag::Joint => &[
                "type",
                "pos",
                "axis",
                "range",
                "limited",
                "ref",
                "damping",
                "stiffness",
                "armature",
                "frictionloss",
                "class",
            ],
            Tag::FreeJoint => &[],
            Tag::Geom => &[
                "type",
                "size",
                "pos",
                "quat",
                "mass",
                "density",
                "rgba",
                "material",
                "mesh",
                "class",
                "condim",
                "contype",
                "conaffinity",
                "group",
                "friction",
            ],
            Tag::Site => &["type", "size", "pos", "quat", "rgba", "group", "class"],
            Tag::Camera => &["pos", "quat", "mode", "fovy"],
            Tag::Light => &["pos", "dir", "directional", "diffuse", "castshadow"],
            Tag::Motor | Tag::Velocity => ACTUATOR_ATTRIBUTES,
            Tag::Position => &[
                "joint",
                "site",
                "ctrlrange",
                "ctrllimited",
                "forcerange",
                "forcelimited",
                "gear",
                "class",
                "kp",
                "kv",
            ],
            Tag::General => &[
                "joint",
                "site",
                "ctrlrange",
                "ctrllimited",
                "forcerange",
                "forcelimited",
                "gear",
                "class",
                "gaintype",
                "biastype",
                "gainprm",
                "biasprm",
            ],
            Tag::Torque | Tag::Force | Tag::Touch => SENSOR_SITE_ATTRIBUTES,
            Tag::JointPos | Tag::JointVel => SENSOR_JOINT_ATTRIBUTES,
            Tag::Key => &["time", "qpos", "qvel", "ctrl"],
        }
    }

    /// Whether `attribute` is part of this tag's schema
    pub fn allows(&self, attribute: &str) -> bool {
        self.attributes().contains(&attribute)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier namespace: names are unique per namespace within a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Namespace {
    Texture,
    Material,
    Mesh,
    Body,
    Joint,
    Geom,
    Site,
    Camera,
    Light,
    Actuator,
    Sensor,
    Key,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Texture => "texture",
            Namespace::Material => "material",
            Namespace::Mesh => "mesh",
            Namespace::Body => "body",
            Namespace::Joint => "joint",
            Namespace::Geom => "geom",
            Namespace::Site => "site",
            Namespace::Camera => "camera",
            Namespace::Light => "light",
            Namespace::Actuator => "actuator",
            Namespace::Sensor => "sensor",
            Namespace::Key => "key",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = UnknownNamespace;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "texture" => Ok(Namespace::Texture),
            "material" => Ok(Namespace::Material),
            "mesh" => Ok(Namespace::Mesh),
            "body" => Ok(Namespace::Body),
            "joint" => Ok(Namespace::Joint),
            "geom" => Ok(Namespace::Geom),
            "site" => Ok(Namespace::Site),
            "camera" => Ok(Namespace::Camera),
            "light" => Ok(Namespace::Light),
            "actuator" => Ok(Namespace::Actuator),
            "sensor" => Ok(Namespace::Sensor),
            "key" => Ok(Namespace::Key),
            other => Err(UnknownNamespace(other.to_string())),
        }
    }
}

/// Error for namespace names outside the supported set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown namespace: {0}")]
pub struct UnknownNamespace(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actuator_kinds_share_namespace() {
        for tag in [Tag::Motor, Tag::Position, Tag::Velocity, Tag::General] {
            assert_eq!(tag.namespace(), Some(Namespace::Actuator));
            assert!(Tag::Actuator.accepts(tag));
        }
        assert_eq!(Tag::FreeJoint.namespace(), Some(Namespace::Joint));
    }

    #[test]
    fn test_sections_are_unnamed() {
        for tag in SECTIONS {
            assert!(tag.is_section());
            assert!(tag.namespace().is_none());
        }
    }

    #[test]
    fn test_site_accepts_nothing() {
        assert!(!Tag::Site.accepts(Tag::Body));
        assert!(!Tag::Mujoco.accepts(Tag::Body));
        assert!(Tag::Body.accepts(Tag::Site));
    }

    #[test]
    fn test_namespace_from_str() {
        assert_eq!("joint".parse::<Namespace>().unwrap(), Namespace::Joint);
        assert!("freejoint".parse::<Namespace>().is_err());
    }

    #[test]
    fn test_schema() {
        assert!(Tag::Body.allows("gravcomp"));
        assert!(!Tag::Geom.allows("gravcomp"));
        assert!(Tag::Key.allows("qpos"));
    }
}
