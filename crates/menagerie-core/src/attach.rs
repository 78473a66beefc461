//! Grafting a hand (or any tool) document onto an arm's attachment site
//!
//! Attachment reconciles the parent's `home` keyframe so that its vectors keep
//! matching the combined model: the child's pose (or a neutral one) is
//! appended after the parent's.

use crate::compile::{CompileError, Compiler, KinematicCompiler};
use crate::constants::{ATTACHMENT_SITE, HOME_KEYFRAME, SCOPE_SEPARATOR};
use crate::document::{DocumentError, ElementId, ModelDocument, Namespace, validate_name};
use crate::keyframe::KeyVectors;
use crate::locator::NotFoundError;

/// What to do with the child's `home` keyframe when the parent has none
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChildKeyframePolicy {
    /// Leave the parent without a `home` keyframe
    #[default]
    Drop,
    /// Create a parent `home` keyframe from the parent's reference pose
    /// followed by the child's keyframe
    Promote,
}

/// Options for [`attach_with`]
#[derive(Debug, Clone, Default)]
pub struct AttachOptions {
    pub child_keyframe: ChildKeyframePolicy,
}

/// Planned change to the parent's `home` keyframe
enum HomeUpdate {
    Keep,
    Replace(ElementId, KeyVectors),
    Create(KeyVectors),
}

/// Attach `child` at the parent's `attachment_site` with default options
pub fn attach(parent: &mut ModelDocument, child: ModelDocument) -> Result<ElementId, AttachError> {
    attach_with(
        &KinematicCompiler::default(),
        parent,
        child,
        &AttachOptions::default(),
    )
}

/// Attach `child` at the parent's `attachment_site`.
///
/// Everything is validated before the parent is touched: on error the parent
/// is left unmodified. Returns the grafted root, below which the child's
/// elements are addressed as `<child model>/<name>`.
pub fn attach_with<C: Compiler + ?Sized>(
    compiler: &C,
    parent: &mut ModelDocument,
    child: ModelDocument,
    options: &AttachOptions,
) -> Result<ElementId, AttachError> {
    let child_model = compiler.compile(&child)?;
    validate_name(child.model())?;

    let site = parent.find_one(Namespace::Site, ATTACHMENT_SITE)?;
    if let Some(occupant) = parent.attachment_of(site) {
        return Err(AttachError::SiteOccupied {
            site: ATTACHMENT_SITE.to_string(),
            occupant: model_of(parent, occupant),
        });
    }
    let prefix = format!("{}{}{}", parent.prefix_of(site), child.model(), SCOPE_SEPARATOR);
    if parent
        .attached_roots()
        .into_iter()
        .any(|root| parent.prefix_of(root) == prefix)
    {
        return Err(AttachError::ScopeCollision(child.model().to_string()));
    }

    // Unset key vectors stand for the reference pose
    let child_home = match child.home_key() {
        Some(key) => Some(
            child
                .key_vectors(key)?
                .or_reference(child_model.nu(), child_model.qpos0()),
        ),
        None => None,
    };
    let update = match parent.home_key() {
        Some(key) => {
            let mut vectors = parent.key_vectors(key)?;
            if vectors.ctrl.is_empty() || vectors.qpos.is_empty() {
                let parent_model = compiler.compile(parent)?;
                vectors = vectors.or_reference(parent_model.nu(), parent_model.qpos0());
            }
            match &child_home {
                Some(home) => vectors.extend(home),
                None => vectors.extend(&KeyVectors::zeros(child_model.nu(), child_model.nq())),
            }
            HomeUpdate::Replace(key, vectors)
        }
        None => match (options.child_keyframe, child_home) {
            (ChildKeyframePolicy::Promote, Some(home)) => {
                let parent_model = compiler.compile(parent)?;
                let mut vectors = KeyVectors::new(
                    vec![0.0; parent_model.nu()],
                    parent_model.qpos0().to_vec(),
                );
                vectors.extend(&home);
                HomeUpdate::Create(vectors)
            }
            (ChildKeyframePolicy::Drop, Some(_)) => {
                tracing::debug!(
                    "'{}' has no {} keyframe; dropping the one from '{}'",
                    parent.model(),
                    HOME_KEYFRAME,
                    child.model()
                );
                HomeUpdate::Keep
            }
            (_, None) => HomeUpdate::Keep,
        },
    };

    // Mutation starts here
    match update {
        HomeUpdate::Keep => {}
        HomeUpdate::Replace(key, vectors) => parent.set_key_vectors(key, &vectors)?,
        HomeUpdate::Create(vectors) => {
            parent.add_keyframe(HOME_KEYFRAME, &vectors)?;
        }
    }

    let child_name = child.model().to_string();
    let root = parent.graft(site, child);
    tracing::info!(
        "Attached '{}' to '{}' at {} (nq +{}, nu +{})",
        child_name,
        parent.model(),
        ATTACHMENT_SITE,
        child_model.nq(),
        child_model.nu()
    );
    Ok(root)
}

fn model_of(document: &ModelDocument, root: ElementId) -> String {
    document
        .attr_str(root, "model")
        .ok()
        .flatten()
        .unwrap_or_default()
        .to_string()
}

/// Attachment errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum AttachError {
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error("Child model failed to compile: {0}")]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("Site '{site}' already holds model '{occupant}'")]
    SiteOccupied { site: String, occupant: String },
    #[error("A model named '{0}' is already attached in this scope")]
    ScopeCollision(String),
}
