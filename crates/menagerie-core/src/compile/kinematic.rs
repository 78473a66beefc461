//! Reference-configuration compiler

use std::collections::HashMap;

use glam::{DQuat, DVec3};

use crate::constants::MIN_MASS;
use crate::document::{ElementId, ModelDocument, Namespace, Tag};

use super::inertia::{GeomShape, MassProperties};
use super::{
    CompileError, CompileOptions, CompiledJoint, CompiledModel, Compiler, JointKind, describe,
};

/// Index of the world body
const WORLD: usize = 0;

/// Compiles bodies, joints and masses at the reference configuration
#[derive(Debug, Clone, Default)]
pub struct KinematicCompiler {
    options: CompileOptions,
}

impl KinematicCompiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }
}

impl Compiler for KinematicCompiler {
    fn compile(&self, document: &ModelDocument) -> Result<CompiledModel, CompileError> {
        let mut builder = ModelBuilder::new(document, &self.options);
        builder.walk(document.worldbody(), WORLD, Frame::IDENTITY)?;
        builder.finish()
    }
}

/// Rigid transform (world from local)
#[derive(Debug, Clone, Copy)]
struct Frame {
    pos: DVec3,
    rot: DQuat,
}

impl Frame {
    const IDENTITY: Frame = Frame {
        pos: DVec3::ZERO,
        rot: DQuat::IDENTITY,
    };

    fn compose(&self, local: Frame) -> Frame {
        Frame {
            pos: self.pos + self.rot * local.pos,
            rot: (self.rot * local.rot).normalize(),
        }
    }

    fn point(&self, local: DVec3) -> DVec3 {
        self.pos + self.rot * local
    }
}

struct BodyRecord {
    parent: usize,
    mass: MassProperties,
}

/// Motion subspace of one degree of freedom
enum DofAxis {
    Translation(DVec3),
    Rotation { axis: DVec3, anchor: DVec3 },
}

struct DofRecord {
    body: usize,
    joint: usize,
    axis: DofAxis,
    armature: f64,
}

struct ModelBuilder<'a> {
    document: &'a ModelDocument,
    options: &'a CompileOptions,
    bodies: Vec<BodyRecord>,
    dofs: Vec<DofRecord>,
    joints: Vec<CompiledJoint>,
    qpos0: Vec<f64>,
}

impl<'a> ModelBuilder<'a> {
    fn new(document: &'a ModelDocument, options: &'a CompileOptions) -> Self {
        Self {
            document,
            options,
            bodies: vec![BodyRecord {
                parent: WORLD,
                mass: MassProperties::default(),
            }],
            dofs: Vec::new(),
            joints: Vec::new(),
            qpos0: Vec::new(),
        }
    }

    /// Visit the children of `container` (a worldbody or body) in document order
    fn walk(
        &mut self,
        container: ElementId,
        body: usize,
        frame: Frame,
    ) -> Result<(), CompileError> {
        let document = self.document;
        let in_worldbody = document.tag(container)? == Tag::Worldbody;

        for &child in document.children(container) {
            match document.tag(child)? {
                Tag::Body => {
                    let body_frame = frame.compose(read_frame(document, child)?);
                    let index = self.bodies.len();
                    self.bodies.push(BodyRecord {
                        parent: body,
                        mass: MassProperties::default(),
                    });
                    self.add_joints(child, index, body_frame)?;
                    self.add_body_mass(child, index, body_frame)?;
                    self.walk(child, index, body_frame)?;
                }
                Tag::Joint | Tag::FreeJoint if in_worldbody => {
                    return Err(CompileError::JointInWorldbody(describe(document, child)));
                }
                // Geoms of an attached worldbody belong to the body holding the site
                Tag::Geom if in_worldbody && body != WORLD && self.options.inertia_from_geoms => {
                    self.add_geom_mass(child, body, frame)?;
                }
                Tag::Site => {
                    let Some(attached) = document.attachment_of(child) else {
                        continue;
                    };
                    if let Some(worldbody) = document.child_with_tag(attached, Tag::Worldbody) {
                        let site_frame = frame.compose(read_frame(document, child)?);
                        self.walk(worldbody, body, site_frame)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn add_joints(
        &mut self,
        body_element: ElementId,
        body: usize,
        frame: Frame,
    ) -> Result<(), CompileError> {
        let document = self.document;

        for &child in document.children(body_element) {
            let kind = match document.tag(child)? {
                Tag::FreeJoint => JointKind::Free,
                Tag::Joint => match document.attr_str(child, "type")? {
                    Some(kind) => kind.parse()?,
                    None => JointKind::Hinge,
                },
                _ => continue,
            };
            if kind == JointKind::Free && self.bodies[body].parent != WORLD {
                return Err(CompileError::FreeJointNotTopLevel(describe(document, child)));
            }

            let joint = self.joints.len();
            let qpos_adr = self.qpos0.len();
            let dof_adr = self.dofs.len();
            let armature = document.attr_f64(child, "armature")?.unwrap_or(0.0);
            let anchor = frame.point(read_vec3(document, child, "pos")?.unwrap_or(DVec3::ZERO));
            let mut push = |axis: DofAxis| {
                self.dofs.push(DofRecord {
                    body,
                    joint,
                    axis,
                    armature,
                })
            };

            match kind {
                JointKind::Hinge | JointKind::Slide => {
                    let local = read_vec3(document, child, "axis")?.unwrap_or(DVec3::Z);
                    let axis = (frame.rot * local).try_normalize().ok_or_else(|| {
                        CompileError::InvalidAttribute {
                            element: describe(document, child),
                            attribute: "axis",
                            message: "axis has zero length".to_string(),
                        }
                    })?;
                    if kind == JointKind::Hinge {
                        push(DofAxis::Rotation { axis, anchor });
                    } else {
                        push(DofAxis::Translation(axis));
                    }
                    let reference = document.attr_f64(child, "ref")?.unwrap_or(0.0);
                    self.qpos0.push(reference);
                }
                JointKind::Ball => {
                    for local in [DVec3::X, DVec3::Y, DVec3::Z] {
                        push(DofAxis::Rotation {
                            axis: frame.rot * local,
                            anchor,
                        });
                    }
                    self.qpos0.extend([1.0, 0.0, 0.0, 0.0]);
                }
                JointKind::Free => {
                    for axis in [DVec3::X, DVec3::Y, DVec3::Z] {
                        push(DofAxis::Translation(axis));
                    }
                    for local in [DVec3::X, DVec3::Y, DVec3::Z] {
                        push(DofAxis::Rotation {
                            axis: frame.rot * local,
                            anchor: frame.pos,
                        });
                    }
                    let (pos, rot) = (frame.pos, frame.rot);
                    self.qpos0
                        .extend([pos.x, pos.y, pos.z, rot.w, rot.x, rot.y, rot.z]);
                }
            }

            self.joints.push(CompiledJoint {
                identifier: document.identifier(child),
                kind,
                body,
                qpos_adr,
                dof_adr,
                element: child,
            });
        }
        Ok(())
    }

    fn add_body_mass(
        &mut self,
        body_element: ElementId,
        body: usize,
        frame: Frame,
    ) -> Result<(), CompileError> {
        let document = self.document;

        if let Some(inertial) = document.child_with_tag(body_element, Tag::Inertial) {
            let mass = document.attr_f64(inertial, "mass")?.ok_or_else(|| {
                CompileError::MissingAttribute {
                    element: describe(document, body_element),
                    attribute: "mass",
                }
            })?;
            if mass < 0.0 {
                return Err(CompileError::InvalidAttribute {
                    element: describe(document, body_element),
                    attribute: "mass",
                    message: format!("negative mass {mass}"),
                });
            }
            let diagonal = read_vec3(document, inertial, "diaginertia")?.unwrap_or(DVec3::ZERO);
            let at = frame.compose(read_frame(document, inertial)?);
            let solid = MassProperties::from_principal(mass, diagonal, at.pos, at.rot);
            self.bodies[body].mass = self.bodies[body].mass.combine(&solid);
        } else if self.options.inertia_from_geoms {
            for &child in document.children(body_element) {
                if document.tag(child)? == Tag::Geom {
                    self.add_geom_mass(child, body, frame)?;
                }
            }
        }
        Ok(())
    }

    fn add_geom_mass(
        &mut self,
        geom: ElementId,
        body: usize,
        frame: Frame,
    ) -> Result<(), CompileError> {
        let document = self.document;
        let kind = document.attr_str(geom, "type")?.unwrap_or("sphere");

        let shape = match document.attr_vector(geom, "size")? {
            Some(size) => GeomShape::from_mjcf(kind, &size).map_err(|message| {
                CompileError::InvalidAttribute {
                    element: describe(document, geom),
                    attribute: "size",
                    message,
                }
            })?,
            // Mesh geoms take their size from the mesh asset
            None if document.attr(geom, "mesh").is_some() || kind == "mesh" => None,
            None => GeomShape::from_mjcf(kind, &[]).map_err(|_| CompileError::MissingAttribute {
                element: describe(document, geom),
                attribute: "size",
            })?,
        };
        let Some(shape) = shape else {
            tracing::debug!("Skipping {} without a primitive volume", describe(document, geom));
            return Ok(());
        };

        let mass = match document.attr_f64(geom, "mass")? {
            Some(mass) => mass,
            None => {
                let density = document
                    .attr_f64(geom, "density")?
                    .unwrap_or(self.options.default_density);
                density * shape.volume()
            }
        };
        let at = frame.compose(read_frame(document, geom)?);
        let solid =
            MassProperties::from_principal(mass, shape.principal_inertia(mass), at.pos, at.rot);
        self.bodies[body].mass = self.bodies[body].mass.combine(&solid);
        Ok(())
    }

    fn finish(self) -> Result<CompiledModel, CompileError> {
        let document = self.document;
        let nu = check_references(document)?;

        let mut dof_m0 = Vec::with_capacity(self.dofs.len());
        for dof in &self.dofs {
            dof_m0.push(self.dof_mass(dof)?);
        }

        let nq = self.qpos0.len();
        if self.options.validate_keyframes {
            check_keyframes(document, nq, nu)?;
        }

        let joint_index: HashMap<String, usize> = self
            .joints
            .iter()
            .enumerate()
            .filter_map(|(index, joint)| joint.identifier.clone().map(|id| (id, index)))
            .collect();

        let model = CompiledModel {
            nq,
            nv: self.dofs.len(),
            nu,
            qpos0: self.qpos0,
            dof_m0,
            body_mass: self.bodies.iter().map(|b| b.mass.mass).collect(),
            joints: self.joints,
            joint_index,
        };
        tracing::debug!(
            "Compiled '{}': nq={} nv={} nu={} nbody={}",
            document.model(),
            model.nq,
            model.nv,
            model.nu,
            model.nbody()
        );
        Ok(model)
    }

    /// Inertia seen by one DoF: everything in the subtree of its body
    fn dof_mass(&self, dof: &DofRecord) -> Result<f64, CompileError> {
        let mut subtree_mass = 0.0;
        let mut moment = 0.0;
        for (index, record) in self.bodies.iter().enumerate().skip(dof.body) {
            if !self.in_subtree(index, dof.body) {
                continue;
            }
            subtree_mass += record.mass.mass;
            if let DofAxis::Rotation { axis, anchor } = dof.axis {
                moment += record.mass.moment_about(axis, anchor);
            }
        }

        if subtree_mass < MIN_MASS {
            let joint = &self.joints[dof.joint];
            return Err(CompileError::MasslessSubtree {
                joint: describe(self.document, joint.element),
            });
        }
        let inertia = match dof.axis {
            DofAxis::Translation(_) => subtree_mass,
            DofAxis::Rotation { .. } => moment,
        };
        Ok(inertia + dof.armature)
    }

    fn in_subtree(&self, mut body: usize, root: usize) -> bool {
        while body != WORLD {
            if body == root {
                return true;
            }
            body = self.bodies[body].parent;
        }
        false
    }
}

/// Resolve every cross reference in its own scope; returns the actuator count
fn check_references(document: &ModelDocument) -> Result<usize, CompileError> {
    let undefined = |element: ElementId, namespace: Namespace, name: &str| {
        CompileError::UndefinedReference {
            element: describe(document, element),
            namespace,
            name: name.to_string(),
        }
    };
    let require = |element: ElementId,
                   attribute: &'static str,
                   namespace: Namespace|
     -> Result<Option<ElementId>, CompileError> {
        match document.attr_str(element, attribute)? {
            Some(name) => document
                .resolve(element, namespace, name)
                .map(Some)
                .ok_or_else(|| undefined(element, namespace, name)),
            None => Ok(None),
        }
    };

    let mut nu = 0;
    for id in document.descendants(document.root()) {
        match document.tag(id)? {
            tag if tag.namespace() == Some(Namespace::Actuator) => {
                let joint = require(id, "joint", Namespace::Joint)?;
                let site = require(id, "site", Namespace::Site)?;
                if joint.is_none() && site.is_none() {
                    return Err(CompileError::MissingAttribute {
                        element: describe(document, id),
                        attribute: "joint",
                    });
                }
                nu += 1;
            }
            Tag::Torque | Tag::Force | Tag::Touch => {
                if require(id, "site", Namespace::Site)?.is_none() {
                    return Err(CompileError::MissingAttribute {
                        element: describe(document, id),
                        attribute: "site",
                    });
                }
            }
            Tag::JointPos | Tag::JointVel => {
                if require(id, "joint", Namespace::Joint)?.is_none() {
                    return Err(CompileError::MissingAttribute {
                        element: describe(document, id),
                        attribute: "joint",
                    });
                }
            }
            Tag::Geom => {
                require(id, "material", Namespace::Material)?;
                require(id, "mesh", Namespace::Mesh)?;
            }
            Tag::Material => {
                require(id, "texture", Namespace::Texture)?;
            }
            _ => {}
        }
    }
    Ok(nu)
}

/// Top-level keyframes must match the compiled sizes
fn check_keyframes(document: &ModelDocument, nq: usize, nu: usize) -> Result<(), CompileError> {
    for &key in document.children(document.keyframe()) {
        let vectors = document.key_vectors(key)?;
        let fields = [
            ("qpos", vectors.qpos.len(), nq),
            ("ctrl", vectors.ctrl.len(), nu),
        ];
        for (field, actual, expected) in fields {
            // Unset vectors default to the reference pose
            if actual != 0 && actual != expected {
                return Err(CompileError::KeyframeSize {
                    key: describe(document, key),
                    field,
                    expected,
                    actual,
                });
            }
        }
    }
    Ok(())
}

fn read_vec3(
    document: &ModelDocument,
    id: ElementId,
    key: &'static str,
) -> Result<Option<DVec3>, CompileError> {
    match document.attr_vector(id, key)? {
        None => Ok(None),
        Some(values) if values.len() == 3 => Ok(Some(DVec3::new(values[0], values[1], values[2]))),
        Some(values) => Err(CompileError::InvalidAttribute {
            element: describe(document, id),
            attribute: key,
            message: format!("expected 3 values, got {}", values.len()),
        }),
    }
}

/// Local frame from `pos` and `quat` (w x y z)
fn read_frame(document: &ModelDocument, id: ElementId) -> Result<Frame, CompileError> {
    let pos = read_vec3(document, id, "pos")?.unwrap_or(DVec3::ZERO);
    let rot = match document.attr_vector(id, "quat")? {
        None => DQuat::IDENTITY,
        Some(q) if q.len() == 4 => {
            let quat = DQuat::from_xyzw(q[1], q[2], q[3], q[0]);
            if quat.length_squared() < f64::EPSILON {
                return Err(CompileError::InvalidAttribute {
                    element: describe(document, id),
                    attribute: "quat",
                    message: "quaternion has zero norm".to_string(),
                });
            }
            quat.normalize()
        }
        Some(q) => {
            return Err(CompileError::InvalidAttribute {
                element: describe(document, id),
                attribute: "quat",
                message: format!("expected 4 values, got {}", q.len()),
            });
        }
    };
    Ok(Frame { pos, rot })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::KeyVectors;
    use approx::assert_relative_eq;

    fn compile(doc: &ModelDocument) -> Result<CompiledModel, CompileError> {
        KinematicCompiler::default().compile(doc)
    }

    fn body_with_mass(
        doc: &mut ModelDocument,
        parent: ElementId,
        name: &str,
        mass: f64,
    ) -> ElementId {
        let body = doc.add_named(parent, Tag::Body, name).unwrap();
        let inertial = doc.add(body, Tag::Inertial).unwrap();
        doc.set_attr(inertial, "mass", mass).unwrap();
        body
    }

    #[test]
    fn test_empty_document() {
        let model = compile(&ModelDocument::new("empty")).unwrap();
        assert_eq!((model.nq(), model.nv(), model.nu()), (0, 0, 0));
        assert_eq!(model.nbody(), 1);
    }

    #[test]
    fn test_joint_counts_and_reference_pose() {
        let mut doc = ModelDocument::new("robot");
        let worldbody = doc.worldbody();
        let base = body_with_mass(&mut doc, worldbody, "base", 1.0);
        doc.set_attr(base, "pos", [0.0, 0.0, 0.5]).unwrap();
        doc.add_named(base, Tag::FreeJoint, "root").unwrap();
        let shoulder = body_with_mass(&mut doc, base, "shoulder", 1.0);
        let ball = doc.add_named(shoulder, Tag::Joint, "ball").unwrap();
        doc.set_attr(ball, "type", "ball").unwrap();
        let elbow = body_with_mass(&mut doc, shoulder, "elbow", 1.0);
        let hinge = doc.add_named(elbow, Tag::Joint, "elbow").unwrap();
        doc.set_attr(hinge, "ref", 0.25).unwrap();

        let model = compile(&doc).unwrap();
        assert_eq!(model.nq(), 12);
        assert_eq!(model.nv(), 10);
        assert_eq!(model.nbody(), 4);
        assert_eq!(
            model.qpos0(),
            &[0.0, 0.0, 0.5, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.25]
        );

        let elbow = model.joint("elbow").unwrap();
        assert_eq!(elbow.kind, JointKind::Hinge);
        assert_eq!((elbow.qpos_adr, elbow.dof_adr), (11, 9));
        assert!(model.joint("wrist").is_err());
    }

    #[test]
    fn test_free_joint_translation_mass() {
        let mut doc = ModelDocument::new("robot");
        let worldbody = doc.worldbody();
        let base = body_with_mass(&mut doc, worldbody, "base", 1.5);
        doc.add_named(base, Tag::FreeJoint, "root").unwrap();
        body_with_mass(&mut doc, base, "payload", 0.5);

        let model = compile(&doc).unwrap();
        for dof in 0..3 {
            assert_relative_eq!(model.dof_m0()[dof], 2.0);
        }
    }

    #[test]
    fn test_hinge_mass_is_moment_about_axis() {
        let mut doc = ModelDocument::new("pendulum");
        let link = doc.add_named(doc.worldbody(), Tag::Body, "link").unwrap();
        let hinge = doc.add_named(link, Tag::Joint, "pivot").unwrap();
        doc.set_attr(hinge, "armature", 0.1).unwrap();
        let inertial = doc.add(link, Tag::Inertial).unwrap();
        doc.set_attr(inertial, "mass", 2.0).unwrap();
        doc.set_attr(inertial, "pos", [0.5, 0.0, 0.0]).unwrap();
        doc.set_attr(inertial, "diaginertia", [0.01, 0.01, 0.02]).unwrap();

        let model = compile(&doc).unwrap();
        // I_zz + m r^2 + armature
        assert_relative_eq!(model.joint_mass("pivot").unwrap(), 0.02 + 0.5 + 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_joint_mass_after_free_joint_uses_dof_address() {
        let mut doc = ModelDocument::new("robot");
        let worldbody = doc.worldbody();
        let base = body_with_mass(&mut doc, worldbody, "base", 1.0);
        doc.add_named(base, Tag::FreeJoint, "root").unwrap();
        let link = doc.add_named(base, Tag::Body, "link").unwrap();
        doc.add_named(link, Tag::Joint, "elbow").unwrap();
        let inertial = doc.add(link, Tag::Inertial).unwrap();
        doc.set_attr(inertial, "mass", 2.0).unwrap();
        doc.set_attr(inertial, "pos", [0.5, 0.0, 0.0]).unwrap();

        let model = compile(&doc).unwrap();
        let elbow = model.joint("elbow").unwrap();
        assert_eq!((elbow.qpos_adr, elbow.dof_adr), (7, 6));
        assert_eq!(model.dof_m0().len(), 7);
        assert_relative_eq!(model.joint_mass("elbow").unwrap(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_free_joint_pose_follows_body_frame() {
        let mut doc = ModelDocument::new("drone");
        let worldbody = doc.worldbody();
        let body = body_with_mass(&mut doc, worldbody, "body", 1.0);
        let half = std::f64::consts::FRAC_PI_4;
        doc.set_attr(body, "pos", [1.0, 2.0, 3.0]).unwrap();
        // Unnormalized on purpose; stored as w x y z
        doc.set_attr(body, "quat", [2.0 * half.cos(), 0.0, 0.0, 2.0 * half.sin()])
            .unwrap();
        doc.add(body, Tag::FreeJoint).unwrap();

        let model = compile(&doc).unwrap();
        let expected = [1.0, 2.0, 3.0, half.cos(), 0.0, 0.0, half.sin()];
        for (actual, expected) in model.qpos0().iter().zip(expected) {
            assert_relative_eq!(*actual, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_attached_worldbody_hangs_off_site() {
        let mut hand = ModelDocument::new("hand");
        let worldbody = hand.worldbody();
        let palm = body_with_mass(&mut hand, worldbody, "palm", 0.5);
        hand.add_named(palm, Tag::Joint, "roll").unwrap();

        let mut arm = ModelDocument::new("arm");
        let worldbody = arm.worldbody();
        let base = body_with_mass(&mut arm, worldbody, "base", 2.0);
        arm.add_named(base, Tag::Joint, "yaw").unwrap();
        let site = arm.add_named(base, Tag::Site, "attachment_site").unwrap();
        arm.set_attr(site, "pos", [1.0, 0.0, 0.0]).unwrap();
        arm.graft(site, hand);

        let model = compile(&arm).unwrap();
        assert_eq!(model.nbody(), 3);
        assert_eq!(model.nv(), 2);
        // Palm sits one unit from the yaw axis
        assert_relative_eq!(model.joint_mass("yaw").unwrap(), 0.5, epsilon = 1e-12);
        assert_eq!(model.joint("hand/roll").unwrap().dof_adr, 1);
    }

    #[test]
    fn test_mass_from_geoms() {
        let mut doc = ModelDocument::new("block");
        let block = doc.add_named(doc.worldbody(), Tag::Body, "block").unwrap();
        let slide = doc.add_named(block, Tag::Joint, "rail").unwrap();
        doc.set_attr(slide, "type", "slide").unwrap();
        let geom = doc.add(block, Tag::Geom).unwrap();
        doc.set_attr(geom, "type", "box").unwrap();
        doc.set_attr(geom, "size", [0.1, 0.1, 0.1]).unwrap();
        let mesh = doc.add(block, Tag::Geom).unwrap();
        doc.set_attr(mesh, "type", "mesh").unwrap();

        let model = compile(&doc).unwrap();
        // 0.2^3 m^3 of water
        assert_relative_eq!(model.body_mass()[1], 8.0, epsilon = 1e-9);
        assert_relative_eq!(model.joint_mass("rail").unwrap(), 8.0, epsilon = 1e-9);

        let light = KinematicCompiler::new(CompileOptions {
            default_density: 500.0,
            ..CompileOptions::default()
        });
        assert_relative_eq!(light.compile(&doc).unwrap().body_mass()[1], 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_massless_subtree_rejected() {
        let mut doc = ModelDocument::new("ghost");
        let link = doc.add_named(doc.worldbody(), Tag::Body, "link").unwrap();
        doc.add_named(link, Tag::Joint, "pivot").unwrap();
        assert!(matches!(compile(&doc), Err(CompileError::MasslessSubtree { .. })));
    }

    #[test]
    fn test_joint_placement_errors() {
        let mut doc = ModelDocument::new("bad");
        doc.add_named(doc.worldbody(), Tag::Joint, "loose").unwrap();
        assert!(matches!(compile(&doc), Err(CompileError::JointInWorldbody(_))));

        let mut doc = ModelDocument::new("bad");
        let worldbody = doc.worldbody();
        let base = body_with_mass(&mut doc, worldbody, "base", 1.0);
        let arm = body_with_mass(&mut doc, base, "arm", 1.0);
        doc.add(arm, Tag::FreeJoint).unwrap();
        assert!(matches!(compile(&doc), Err(CompileError::FreeJointNotTopLevel(_))));

        let mut doc = ModelDocument::new("bad");
        let worldbody = doc.worldbody();
        let base = body_with_mass(&mut doc, worldbody, "base", 1.0);
        let joint = doc.add(base, Tag::Joint).unwrap();
        doc.set_attr(joint, "type", "screw").unwrap();
        assert!(matches!(compile(&doc), Err(CompileError::UnknownJointType(_))));
    }

    #[test]
    fn test_undefined_references() {
        let mut doc = ModelDocument::new("bad");
        let motor = doc.add_named(doc.actuator(), Tag::Motor, "m").unwrap();
        doc.set_attr(motor, "joint", "missing").unwrap();
        match compile(&doc) {
            Err(CompileError::UndefinedReference { namespace, name, .. }) => {
                assert_eq!(namespace, Namespace::Joint);
                assert_eq!(name, "missing");
            }
            other => panic!("expected undefined reference, got {other:?}"),
        }

        let mut doc = ModelDocument::new("bad");
        doc.add_named(doc.actuator(), Tag::Motor, "m").unwrap();
        assert!(matches!(compile(&doc), Err(CompileError::MissingAttribute { .. })));

        let mut doc = ModelDocument::new("bad");
        let material = doc.add_named(doc.asset(), Tag::Material, "skin").unwrap();
        doc.set_attr(material, "texture", "nowhere").unwrap();
        assert!(matches!(compile(&doc), Err(CompileError::UndefinedReference { .. })));
    }

    #[test]
    fn test_keyframe_sizes() {
        let mut doc = ModelDocument::new("slider");
        let worldbody = doc.worldbody();
        let block = body_with_mass(&mut doc, worldbody, "block", 1.0);
        let joint = doc.add_named(block, Tag::Joint, "rail").unwrap();
        doc.set_attr(joint, "type", "slide").unwrap();
        let motor = doc.add_named(doc.actuator(), Tag::Motor, "push").unwrap();
        doc.set_attr(motor, "joint", "rail").unwrap();

        let key = doc
            .add_keyframe("home", &KeyVectors::new(vec![0.0], vec![0.1]))
            .unwrap();
        let model = compile(&doc).unwrap();
        assert_eq!(model.nu(), 1);

        doc.set_key_vectors(key, &KeyVectors::new(vec![0.0, 1.0], vec![0.1]))
            .unwrap();
        assert!(matches!(
            compile(&doc),
            Err(CompileError::KeyframeSize {
                field: "ctrl",
                expected: 1,
                actual: 2,
                ..
            })
        ));

        let lenient = KinematicCompiler::new(CompileOptions {
            validate_keyframes: false,
            ..CompileOptions::default()
        });
        assert!(lenient.compile(&doc).is_ok());
    }
}
