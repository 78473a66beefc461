//! Compiled (numeric) view of a model document
//!
//! Compilation walks the kinematic tree at its reference configuration and
//! produces the quantities downstream tools need: coordinate and DoF counts,
//! the reference pose, body masses and the joint-space mass table.

mod inertia;
mod kinematic;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::constants::DEFAULT_DENSITY;
use crate::document::{DocumentError, ElementId, ModelDocument, Namespace};
use crate::locator::NotFoundError;

pub use inertia::{GeomShape, MassProperties};
pub use kinematic::KinematicCompiler;

/// Turns a document into its numeric model
pub trait Compiler {
    fn compile(&self, document: &ModelDocument) -> Result<CompiledModel, CompileError>;
}

/// Options for [`KinematicCompiler`]
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Density (kg/m^3) of geoms that give neither `mass` nor `density`
    pub default_density: f64,
    /// Derive body mass from geoms when a body has no `<inertial>`
    pub inertia_from_geoms: bool,
    /// Check top-level keyframe vector lengths against nq / nu
    pub validate_keyframes: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            default_density: DEFAULT_DENSITY,
            inertia_from_geoms: true,
            validate_keyframes: true,
        }
    }
}

/// Joint type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JointKind {
    Free,
    Ball,
    Slide,
    #[default]
    Hinge,
}

impl JointKind {
    /// Number of position coordinates
    pub fn nq(&self) -> usize {
        match self {
            JointKind::Free => 7,
            JointKind::Ball => 4,
            JointKind::Slide | JointKind::Hinge => 1,
        }
    }

    /// Number of degrees of freedom
    pub fn nv(&self) -> usize {
        match self {
            JointKind::Free => 6,
            JointKind::Ball => 3,
            JointKind::Slide | JointKind::Hinge => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JointKind::Free => "free",
            JointKind::Ball => "ball",
            JointKind::Slide => "slide",
            JointKind::Hinge => "hinge",
        }
    }
}

impl fmt::Display for JointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JointKind {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(JointKind::Free),
            "ball" => Ok(JointKind::Ball),
            "slide" => Ok(JointKind::Slide),
            "hinge" => Ok(JointKind::Hinge),
            other => Err(CompileError::UnknownJointType(other.to_string())),
        }
    }
}

/// A joint of the compiled model
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledJoint {
    /// Full identifier (None for unnamed joints)
    pub identifier: Option<String>,
    pub kind: JointKind,
    /// Index of the body the joint moves (0 is the world)
    pub body: usize,
    /// First position coordinate
    pub qpos_adr: usize,
    /// First degree of freedom
    pub dof_adr: usize,
    pub element: ElementId,
}

/// Numeric model produced by a [`Compiler`]
#[derive(Debug, Clone, Default)]
pub struct CompiledModel {
    pub(crate) nq: usize,
    pub(crate) nv: usize,
    pub(crate) nu: usize,
    pub(crate) qpos0: Vec<f64>,
    pub(crate) dof_m0: Vec<f64>,
    pub(crate) body_mass: Vec<f64>,
    pub(crate) joints: Vec<CompiledJoint>,
    pub(crate) joint_index: HashMap<String, usize>,
}

impl CompiledModel {
    /// Number of position coordinates
    pub fn nq(&self) -> usize {
        self.nq
    }

    /// Number of degrees of freedom
    pub fn nv(&self) -> usize {
        self.nv
    }

    /// Number of actuators
    pub fn nu(&self) -> usize {
        self.nu
    }

    /// Number of bodies, including the world body
    pub fn nbody(&self) -> usize {
        self.body_mass.len()
    }

    /// Reference configuration (length nq)
    pub fn qpos0(&self) -> &[f64] {
        &self.qpos0
    }

    /// Diagonal of the joint-space inertia at `qpos0` (length nv)
    pub fn dof_m0(&self) -> &[f64] {
        &self.dof_m0
    }

    /// Mass of each body (index 0 is the world)
    pub fn body_mass(&self) -> &[f64] {
        &self.body_mass
    }

    pub fn joints(&self) -> &[CompiledJoint] {
        &self.joints
    }

    pub fn joint(&self, identifier: &str) -> Result<&CompiledJoint, NotFoundError> {
        self.joint_index
            .get(identifier)
            .and_then(|&index| self.joints.get(index))
            .ok_or_else(|| NotFoundError::Missing {
                namespace: Namespace::Joint,
                identifier: identifier.to_string(),
            })
    }

    /// Mass table entry of a joint's first degree of freedom.
    ///
    /// Indexed by DoF address, which differs from the position address
    /// after any ball or free joint.
    pub fn joint_mass(&self, identifier: &str) -> Result<f64, NotFoundError> {
        let joint = self.joint(identifier)?;
        self.dof_m0
            .get(joint.dof_adr)
            .copied()
            .ok_or_else(|| NotFoundError::Missing {
                namespace: Namespace::Joint,
                identifier: identifier.to_string(),
            })
    }
}

/// Compilation errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("{element} references undefined {namespace} '{name}'")]
    UndefinedReference {
        element: String,
        namespace: Namespace,
        name: String,
    },
    #[error("{element} is missing required attribute '{attribute}'")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },
    #[error("Invalid '{attribute}' on {element}: {message}")]
    InvalidAttribute {
        element: String,
        attribute: &'static str,
        message: String,
    },
    #[error("Unknown joint type: {0}")]
    UnknownJointType(String),
    #[error("Joint {0} is placed directly in a worldbody")]
    JointInWorldbody(String),
    #[error("Free joint {0} is not on a top-level body")]
    FreeJointNotTopLevel(String),
    #[error("Joint {joint} moves a subtree without mass")]
    MasslessSubtree { joint: String },
    #[error("Keyframe {key}: {field} has {actual} values, expected {expected}")]
    KeyframeSize {
        key: String,
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Human-readable element label for error messages
pub(crate) fn describe(document: &ModelDocument, id: ElementId) -> String {
    match (document.identifier(id), document.tag(id)) {
        (Some(identifier), Ok(tag)) => format!("<{tag}> '{identifier}'"),
        (None, Ok(tag)) => format!("<{tag}> {id}"),
        (_, Err(_)) => id.to_string(),
    }
}
