//! Critical damping derived from a joint's effective mass

use crate::compile::{CompileError, CompiledModel, Compiler, KinematicCompiler};
use crate::document::ModelDocument;
use crate::locator::NotFoundError;

/// Damping that makes a joint with the given stiffness critically damped.
///
/// The effective mass is the joint's entry in the mass table of the compiled
/// model: `2 * sqrt(mass * stiffness)`.
pub fn critical_damping(
    stiffness: f64,
    joint_name: &str,
    model: &ModelDocument,
) -> Result<f64, DampingError> {
    critical_damping_with(&KinematicCompiler::default(), stiffness, joint_name, model)
}

/// [`critical_damping`] with a caller-provided compiler
pub fn critical_damping_with<C: Compiler + ?Sized>(
    compiler: &C,
    stiffness: f64,
    joint_name: &str,
    model: &ModelDocument,
) -> Result<f64, DampingError> {
    let compiled = compiler.compile(model)?;
    Ok(critical_damping_from_compiled(
        stiffness, joint_name, &compiled,
    )?)
}

/// [`critical_damping`] against an already compiled model
pub fn critical_damping_from_compiled(
    stiffness: f64,
    joint_name: &str,
    compiled: &CompiledModel,
) -> Result<f64, NotFoundError> {
    let mass = compiled.joint_mass(joint_name)?;
    Ok(2.0 * (mass * stiffness).sqrt())
}

/// Critical damping errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum DampingError {
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error("Model failed to compile: {0}")]
    Compile(#[from] CompileError),
}
