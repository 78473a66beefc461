//! Shadow Hand E3M5

use menagerie_core::{
    DocumentError, ElementId, FindOptions, ModelDocument, Namespace, NotFoundError, Tag,
};

use super::{Hand, HandSide};
use crate::constants::{
    FINGERTIP_COLLISION_CLASS, FINGERTIP_MESH_SUFFIX, RESTRICTED_WRJ2_RANGE, SENSOR_SITE_SIZE,
    SENSOR_SITES_GROUP,
};

/// Options for [`ShadowHand::new`]
#[derive(Debug, Clone, Default)]
pub struct ShadowHandOptions {
    /// Model identifier; defaults to `right_shadow_hand` / `left_shadow_hand`
    pub name: Option<String>,
    pub side: HandSide,
    /// Replace the distal fingertip collision meshes with capsules
    pub primitive_fingertip_collisions: bool,
    /// Limit wrist yaw (`WRJ2`) to about +-10 degrees
    pub restrict_wrist_yaw_range: bool,
}

/// A Shadow Hand with a torque sensor on every joint
#[derive(Debug, Clone)]
pub struct ShadowHand {
    document: ModelDocument,
    side: HandSide,
    joints: Vec<ElementId>,
    actuators: Vec<ElementId>,
    joint_torque_sensors: Vec<ElementId>,
}

impl ShadowHand {
    /// Prepare a loaded Shadow Hand document
    pub fn new(mut document: ModelDocument, options: ShadowHandOptions) -> Result<Self, HandError> {
        let side = options.side;
        let name = options
            .name
            .unwrap_or_else(|| default_name(side).to_string());
        document.set_model(name)?;

        if options.restrict_wrist_yaw_range {
            let joint = document.find_one(Namespace::Joint, "WRJ2")?;
            document.set_attr(joint, "range", RESTRICTED_WRJ2_RANGE)?;
            let actuator = document.find_one(Namespace::Actuator, "A_WRJ2")?;
            document.set_attr(actuator, "ctrlrange", RESTRICTED_WRJ2_RANGE)?;
        }

        let joints = document.find_all(Namespace::Joint, FindOptions::default())?;
        let actuators = document.find_all(Namespace::Actuator, FindOptions::default())?;
        let joint_torque_sensors = add_torque_sensors(&mut document, &joints)?;

        if options.primitive_fingertip_collisions {
            let count = simplify_fingertips(&mut document)?;
            tracing::debug!("Replaced {} fingertip collision meshes with capsules", count);
        }

        tracing::info!(
            "Built {} shadow hand '{}' ({} joints, {} actuators)",
            side,
            document.model(),
            joints.len(),
            actuators.len()
        );
        Ok(Self {
            document,
            side,
            joints,
            actuators,
            joint_torque_sensors,
        })
    }

    /// One `torque` sensor per joint, in joint order
    pub fn joint_torque_sensors(&self) -> &[ElementId] {
        &self.joint_torque_sensors
    }
}

impl Hand for ShadowHand {
    fn name(&self) -> &str {
        self.document.model()
    }

    fn hand_side(&self) -> HandSide {
        self.side
    }

    fn root_body(&self) -> Result<ElementId, NotFoundError> {
        let name = match self.side {
            HandSide::Right => "rh_forearm",
            HandSide::Left => "lh_forearm",
        };
        self.document.find_one(Namespace::Body, name)
    }

    fn joints(&self) -> &[ElementId] {
        &self.joints
    }

    fn actuators(&self) -> &[ElementId] {
        &self.actuators
    }

    fn document(&self) -> &ModelDocument {
        &self.document
    }

    fn into_document(self) -> ModelDocument {
        self.document
    }
}

fn default_name(side: HandSide) -> &'static str {
    match side {
        HandSide::Right => "right_shadow_hand",
        HandSide::Left => "left_shadow_hand",
    }
}

/// Add a small box site on each joint's body and a torque sensor reading it
fn add_torque_sensors(
    document: &mut ModelDocument,
    joints: &[ElementId],
) -> Result<Vec<ElementId>, HandError> {
    let mut sensors = Vec::with_capacity(joints.len());

    for &joint in joints {
        let name = document
            .get(joint)?
            .name()
            .map(str::to_string)
            .ok_or(HandError::UnnamedJoint(joint))?;
        let body = document
            .parent(joint)
            .ok_or(DocumentError::InvalidElement(joint))?;

        let site_name = format!("{name}_site");
        let site = document.add_named(body, Tag::Site, site_name.as_str())?;
        document.set_attr(site, "size", [SENSOR_SITE_SIZE; 3])?;
        document.set_attr(site, "type", "box")?;
        document.set_attr(site, "rgba", [0.0, 1.0, 0.0, 1.0])?;
        document.set_attr(site, "group", SENSOR_SITES_GROUP)?;

        // Sensors live in the sensor section of the joint's own scope
        let section = document
            .child_with_tag(document.scope_of(joint), Tag::Sensor)
            .unwrap_or(document.sensor());
        let sensor = document.add_named(section, Tag::Torque, format!("{name}_torque"))?;
        document.set_attr(sensor, "site", site_name)?;
        sensors.push(sensor);
    }

    Ok(sensors)
}

/// Turn distal fingertip collision meshes into capsules; returns how many changed
fn simplify_fingertips(document: &mut ModelDocument) -> Result<usize, DocumentError> {
    let mut fingertips = Vec::new();
    for geom in document.elements_in(Namespace::Geom) {
        let class = effective_class(document, geom)?;
        let mesh = document.attr_str(geom, "mesh")?;
        if class == Some(FINGERTIP_COLLISION_CLASS)
            && mesh.is_some_and(|mesh| mesh.ends_with(FINGERTIP_MESH_SUFFIX))
        {
            fingertips.push(geom);
        }
    }

    for &geom in &fingertips {
        document.set_attr(geom, "type", "capsule")?;
    }
    Ok(fingertips.len())
}

/// Explicit `class`, else the nearest enclosing body's `childclass`
fn effective_class(
    document: &ModelDocument,
    geom: ElementId,
) -> Result<Option<&str>, DocumentError> {
    if let Some(class) = document.attr_str(geom, "class")? {
        return Ok(Some(class));
    }
    let mut current = document.parent(geom);
    while let Some(id) = current {
        if document.tag(id)? == Tag::Body {
            if let Some(class) = document.attr_str(id, "childclass")? {
                return Ok(Some(class));
            }
        }
        current = document.parent(id);
    }
    Ok(None)
}

/// Hand construction errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum HandError {
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("Joint {0} has no name to derive sensor names from")]
    UnnamedJoint(ElementId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{SHADOW_HAND_NQ, SHADOW_HAND_NU};
    use menagerie_core::{Compiler, KinematicCompiler, attach};

    const FINGERS: [(&str, &[&str], &[&str]); 5] = [
        ("ff", &["FFJ4", "FFJ3", "FFJ2", "FFJ1"], &["FFJ4", "FFJ3", "FFJ2"]),
        ("mf", &["MFJ4", "MFJ3", "MFJ2", "MFJ1"], &["MFJ4", "MFJ3", "MFJ2"]),
        ("rf", &["RFJ4", "RFJ3", "RFJ2", "RFJ1"], &["RFJ4", "RFJ3", "RFJ2"]),
        (
            "lf",
            &["LFJ5", "LFJ4", "LFJ3", "LFJ2", "LFJ1"],
            &["LFJ5", "LFJ4", "LFJ3", "LFJ2"],
        ),
        (
            "th",
            &["THJ5", "THJ4", "THJ3", "THJ2", "THJ1"],
            &["THJ5", "THJ4", "THJ3", "THJ2", "THJ1"],
        ),
    ];

    fn add_link(doc: &mut ModelDocument, parent: ElementId, body: &str, joint: &str) -> ElementId {
        let link = doc.add_named(parent, Tag::Body, body).unwrap();
        doc.set_attr(link, "pos", [0.0, 0.0, 0.03]).unwrap();
        let inertial = doc.add(link, Tag::Inertial).unwrap();
        doc.set_attr(inertial, "mass", 0.02).unwrap();
        doc.set_attr(inertial, "diaginertia", [1e-6, 1e-6, 1e-6]).unwrap();
        let joint = doc.add_named(link, Tag::Joint, joint).unwrap();
        doc.set_attr(joint, "axis", [1.0, 0.0, 0.0]).unwrap();
        doc.set_attr(joint, "range", [-0.349066, 1.5708]).unwrap();
        link
    }

    /// Kinematic stand-in for the Shadow Hand description
    fn shadow_fixture(side: HandSide) -> ModelDocument {
        let prefix = match side {
            HandSide::Right => "rh",
            HandSide::Left => "lh",
        };
        let mut doc = ModelDocument::new("shadow_hand");
        let forearm = doc
            .add_named(doc.worldbody(), Tag::Body, format!("{prefix}_forearm"))
            .unwrap();
        let inertial = doc.add(forearm, Tag::Inertial).unwrap();
        doc.set_attr(inertial, "mass", 1.8).unwrap();
        doc.set_attr(inertial, "diaginertia", [0.01, 0.01, 0.002]).unwrap();

        let wrist = add_link(&mut doc, forearm, &format!("{prefix}_wrist"), "WRJ2");
        let wrj2 = doc.find_one(Namespace::Joint, "WRJ2").unwrap();
        doc.set_attr(wrj2, "range", [-0.523599, 0.174533]).unwrap();
        let palm = add_link(&mut doc, wrist, &format!("{prefix}_palm"), "WRJ1");
        for actuated in ["WRJ2", "WRJ1"] {
            let actuator = doc
                .add_named(doc.actuator(), Tag::Position, format!("A_{actuated}"))
                .unwrap();
            doc.set_attr(actuator, "joint", actuated).unwrap();
            doc.set_attr(actuator, "ctrlrange", [-0.523599, 0.174533]).unwrap();
        }

        for (finger, joints, actuated) in FINGERS {
            let mut parent = palm;
            for joint in joints {
                let body = format!("{prefix}_{}", joint.to_lowercase());
                parent = add_link(&mut doc, parent, &body, joint);
            }

            // Fingertip geoms on the distal link
            let mesh = format!("{finger}_distal_pst");
            doc.add_named(doc.asset(), Tag::Mesh, mesh.as_str()).unwrap();
            let visual = doc.add(parent, Tag::Geom).unwrap();
            doc.set_attr(visual, "mesh", mesh.as_str()).unwrap();
            doc.set_attr(visual, "class", "plastic_visual").unwrap();
            let collision = doc.add(parent, Tag::Geom).unwrap();
            doc.set_attr(collision, "type", "mesh").unwrap();
            doc.set_attr(collision, "mesh", mesh.as_str()).unwrap();
            if finger == "th" {
                // Inherited class; the visual geom's own class still wins
                doc.set_attr(parent, "childclass", FINGERTIP_COLLISION_CLASS)
                    .unwrap();
            } else {
                doc.set_attr(collision, "class", FINGERTIP_COLLISION_CLASS)
                    .unwrap();
            }

            for joint in actuated {
                let actuator = doc
                    .add_named(doc.actuator(), Tag::Position, format!("A_{joint}"))
                    .unwrap();
                doc.set_attr(actuator, "joint", *joint).unwrap();
            }
        }
        doc
    }

    fn right_hand(options: ShadowHandOptions) -> ShadowHand {
        ShadowHand::new(shadow_fixture(options.side), options).unwrap()
    }

    fn geom_types(hand: &ShadowHand) -> Vec<Option<String>> {
        let doc = hand.document();
        doc.elements_in(Namespace::Geom)
            .into_iter()
            .map(|geom| doc.attr_str(geom, "type").unwrap().map(str::to_string))
            .collect()
    }

    #[test]
    fn test_default_names() {
        let right = right_hand(ShadowHandOptions::default());
        assert_eq!(right.name(), "right_shadow_hand");
        assert_eq!(right.hand_side(), HandSide::Right);

        let left = right_hand(ShadowHandOptions {
            side: HandSide::Left,
            ..ShadowHandOptions::default()
        });
        assert_eq!(left.name(), "left_shadow_hand");
        assert_eq!(left.document().model(), "left_shadow_hand");
    }

    #[test]
    fn test_set_name() {
        let hand = right_hand(ShadowHandOptions {
            name: Some("larry".to_string()),
            ..ShadowHandOptions::default()
        });
        assert_eq!(hand.name(), "larry");
        assert_eq!(hand.document().model(), "larry");
    }

    #[test]
    fn test_joints_and_actuators() {
        let hand = right_hand(ShadowHandOptions::default());
        let doc = hand.document();
        assert_eq!(hand.joints().len(), SHADOW_HAND_NQ);
        for &joint in hand.joints() {
            assert_eq!(doc.tag(joint).unwrap(), Tag::Joint);
        }
        assert_eq!(hand.actuators().len(), SHADOW_HAND_NU);
        for &actuator in hand.actuators() {
            assert_eq!(doc.tag(actuator).unwrap(), Tag::Position);
        }
    }

    #[test]
    fn test_joint_torque_sensors() {
        let hand = right_hand(ShadowHandOptions::default());
        let doc = hand.document();
        assert_eq!(hand.joint_torque_sensors().len(), hand.joints().len());

        for (&joint, &sensor) in hand.joints().iter().zip(hand.joint_torque_sensors()) {
            let joint_name = doc.get(joint).unwrap().name().unwrap();
            assert_eq!(doc.tag(sensor).unwrap(), Tag::Torque);
            assert_eq!(
                doc.get(sensor).unwrap().name(),
                Some(format!("{joint_name}_torque").as_str())
            );

            let site_name = doc.attr_str(sensor, "site").unwrap().unwrap();
            let site = doc.find_one(Namespace::Site, site_name).unwrap();
            assert_eq!(doc.parent(site), doc.parent(joint));
            assert_eq!(doc.attr(site, "group").unwrap().as_i64(), Some(SENSOR_SITES_GROUP));
            assert_eq!(doc.attr_str(site, "type").unwrap(), Some("box"));
        }
    }

    #[test]
    fn test_compiles() {
        let hand = right_hand(ShadowHandOptions::default());
        let model = KinematicCompiler::default().compile(hand.document()).unwrap();
        assert_eq!(model.nq(), SHADOW_HAND_NQ);
        assert_eq!(model.nu(), SHADOW_HAND_NU);
    }

    #[test]
    fn test_root_body() {
        let right = right_hand(ShadowHandOptions::default());
        let root = right.root_body().unwrap();
        assert_eq!(right.document().get(root).unwrap().name(), Some("rh_forearm"));

        let left = right_hand(ShadowHandOptions {
            side: HandSide::Left,
            ..ShadowHandOptions::default()
        });
        let root = left.root_body().unwrap();
        assert_eq!(left.document().get(root).unwrap().name(), Some("lh_forearm"));
    }

    #[test]
    fn test_restrict_wrist_yaw_range() {
        let hand = right_hand(ShadowHandOptions::default());
        let doc = hand.document();
        let joint = doc.find_one(Namespace::Joint, "WRJ2").unwrap();
        assert_eq!(
            doc.attr_vector(joint, "range").unwrap(),
            Some(vec![-0.523599, 0.174533])
        );

        let hand = right_hand(ShadowHandOptions {
            restrict_wrist_yaw_range: true,
            ..ShadowHandOptions::default()
        });
        let doc = hand.document();
        let joint = doc.find_one(Namespace::Joint, "WRJ2").unwrap();
        assert_eq!(
            doc.attr_vector(joint, "range").unwrap(),
            Some(RESTRICTED_WRJ2_RANGE.to_vec())
        );
        let actuator = doc.find_one(Namespace::Actuator, "A_WRJ2").unwrap();
        assert_eq!(
            doc.attr_vector(actuator, "ctrlrange").unwrap(),
            Some(RESTRICTED_WRJ2_RANGE.to_vec())
        );
    }

    #[test]
    fn test_restrict_without_wrist_fails() {
        let mut doc = ModelDocument::new("stub");
        let body = doc.add_named(doc.worldbody(), Tag::Body, "rh_forearm").unwrap();
        doc.add_named(body, Tag::Joint, "FFJ1").unwrap();
        let options = ShadowHandOptions {
            restrict_wrist_yaw_range: true,
            ..ShadowHandOptions::default()
        };
        assert!(matches!(
            ShadowHand::new(doc, options),
            Err(HandError::NotFound(NotFoundError::Missing { .. }))
        ));
    }

    #[test]
    fn test_empty_document_fails() {
        let result = ShadowHand::new(ModelDocument::new("empty"), ShadowHandOptions::default());
        assert!(matches!(
            result,
            Err(HandError::NotFound(NotFoundError::NoneFound {
                namespace: Namespace::Joint
            }))
        ));
    }

    #[test]
    fn test_primitive_fingertip_collisions() {
        let meshes = right_hand(ShadowHandOptions::default());
        let capsules = right_hand(ShadowHandOptions {
            primitive_fingertip_collisions: true,
            ..ShadowHandOptions::default()
        });

        let count = |types: &[Option<String>], kind: &str| {
            types.iter().filter(|t| t.as_deref() == Some(kind)).count()
        };
        let before = geom_types(&meshes);
        let after = geom_types(&capsules);
        assert_eq!(count(&before, "capsule"), 0);
        // One collision geom per finger, thumb via its body's childclass
        assert_eq!(count(&after, "capsule"), FINGERS.len());
        assert_eq!(count(&after, "mesh"), 0);
        // Visual geoms keep their (unset) type
        assert_eq!(count(&after, "capsule") + count(&after, "mesh"), count(&before, "mesh"));
    }

    #[test]
    fn test_attach_to_arm() {
        let mut arm = ModelDocument::new("arm");
        let flange = arm.add_named(arm.worldbody(), Tag::Body, "flange").unwrap();
        let inertial = arm.add(flange, Tag::Inertial).unwrap();
        arm.set_attr(inertial, "mass", 0.5).unwrap();
        arm.add_named(flange, Tag::Joint, "joint7").unwrap();
        arm.add_named(flange, Tag::Site, "attachment_site").unwrap();

        let hand = right_hand(ShadowHandOptions::default());
        attach(&mut arm, hand.into_document()).unwrap();

        assert!(arm.find_one(Namespace::Joint, "right_shadow_hand/WRJ2").is_ok());
        assert!(
            arm.find_one(Namespace::Sensor, "right_shadow_hand/WRJ2_torque")
                .is_ok()
        );
        let model = KinematicCompiler::default().compile(&arm).unwrap();
        assert_eq!(model.nq(), SHADOW_HAND_NQ + 1);
    }
}
