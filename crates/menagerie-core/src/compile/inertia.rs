//! Mass properties and primitive inertia tensors

use glam::{DMat3, DQuat, DVec3};

use crate::constants::MIN_MASS;

/// Mass, centre of mass and inertia about the centre of mass (world frame)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassProperties {
    pub mass: f64,
    pub com: DVec3,
    pub inertia: DMat3,
}

impl Default for MassProperties {
    fn default() -> Self {
        Self {
            mass: 0.0,
            com: DVec3::ZERO,
            inertia: DMat3::ZERO,
        }
    }
}

impl MassProperties {
    /// Solid with principal moments `diagonal` in a frame rotated by `rotation`
    pub fn from_principal(mass: f64, diagonal: DVec3, com: DVec3, rotation: DQuat) -> Self {
        let r = DMat3::from_quat(rotation);
        Self {
            mass,
            com,
            inertia: r * DMat3::from_diagonal(diagonal) * r.transpose(),
        }
    }

    pub fn is_massless(&self) -> bool {
        self.mass < MIN_MASS
    }

    /// Rigidly join two solids (parallel axis theorem)
    pub fn combine(&self, other: &Self) -> Self {
        if other.is_massless() {
            return *self;
        }
        if self.is_massless() {
            return *other;
        }

        let mass = self.mass + other.mass;
        let com = (self.com * self.mass + other.com * other.mass) / mass;
        let inertia = self.inertia
            + parallel_axis(self.mass, self.com - com)
            + other.inertia
            + parallel_axis(other.mass, other.com - com);
        Self { mass, com, inertia }
    }

    /// Moment of inertia about the line through `anchor` along unit `axis`
    pub fn moment_about(&self, axis: DVec3, anchor: DVec3) -> f64 {
        let lever = axis.cross(self.com - anchor);
        axis.dot(self.inertia * axis) + self.mass * lever.length_squared()
    }
}

/// Inertia of a point mass at offset `d`: m (|d|^2 E - d d^T)
fn parallel_axis(mass: f64, d: DVec3) -> DMat3 {
    let outer = DMat3::from_cols(d * d.x, d * d.y, d * d.z);
    (DMat3::IDENTITY * d.length_squared() - outer) * mass
}

/// Primitive geom shape with MJCF size semantics (radii and half-lengths)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeomShape {
    Sphere { radius: f64 },
    Box { half_extents: DVec3 },
    Cylinder { radius: f64, half_length: f64 },
    Capsule { radius: f64, half_length: f64 },
    Ellipsoid { radii: DVec3 },
}

impl GeomShape {
    /// Parse a geom `type` and `size`.
    ///
    /// Returns `Ok(None)` for shapes without a volume known to the document
    /// (planes, height fields, meshes).
    pub fn from_mjcf(kind: &str, size: &[f64]) -> Result<Option<Self>, String> {
        let need = |n: usize| {
            if size.len() < n {
                Err(format!("{kind} needs {n} size values, got {}", size.len()))
            } else if size[..n].iter().any(|s| *s <= 0.0) {
                Err(format!("{kind} size must be positive"))
            } else {
                Ok(())
            }
        };

        let shape = match kind {
            "sphere" => {
                need(1)?;
                GeomShape::Sphere { radius: size[0] }
            }
            "box" => {
                need(3)?;
                GeomShape::Box {
                    half_extents: DVec3::new(size[0], size[1], size[2]),
                }
            }
            "cylinder" => {
                need(2)?;
                GeomShape::Cylinder {
                    radius: size[0],
                    half_length: size[1],
                }
            }
            "capsule" => {
                need(2)?;
                GeomShape::Capsule {
                    radius: size[0],
                    half_length: size[1],
                }
            }
            "ellipsoid" => {
                need(3)?;
                GeomShape::Ellipsoid {
                    radii: DVec3::new(size[0], size[1], size[2]),
                }
            }
            "plane" | "hfield" | "mesh" | "sdf" => return Ok(None),
            other => return Err(format!("unknown geom type '{other}'")),
        };
        Ok(Some(shape))
    }

    pub fn volume(&self) -> f64 {
        use std::f64::consts::PI;
        match *self {
            GeomShape::Sphere { radius } => 4.0 / 3.0 * PI * radius.powi(3),
            GeomShape::Box { half_extents } => {
                8.0 * half_extents.x * half_extents.y * half_extents.z
            }
            GeomShape::Cylinder {
                radius,
                half_length,
            } => PI * radius * radius * 2.0 * half_length,
            GeomShape::Capsule {
                radius,
                half_length,
            } => PI * radius * radius * 2.0 * half_length + 4.0 / 3.0 * PI * radius.powi(3),
            GeomShape::Ellipsoid { radii } => 4.0 / 3.0 * PI * radii.x * radii.y * radii.z,
        }
    }

    /// Principal moments about the centroid (axial direction is local Z)
    pub fn principal_inertia(&self, mass: f64) -> DVec3 {
        match *self {
            GeomShape::Sphere { radius } => DVec3::splat(2.0 * mass * radius * radius / 5.0),
            GeomShape::Box { half_extents } => {
                let full = half_extents * 2.0;
                let (w2, h2, d2) = (full.x * full.x, full.y * full.y, full.z * full.z);
                let k = mass / 12.0;
                DVec3::new(k * (h2 + d2), k * (w2 + d2), k * (w2 + h2))
            }
            GeomShape::Cylinder {
                radius,
                half_length,
            } => {
                let r2 = radius * radius;
                let l2 = 4.0 * half_length * half_length;
                let side = mass * (3.0 * r2 + l2) / 12.0;
                DVec3::new(side, side, mass * r2 / 2.0)
            }
            GeomShape::Capsule {
                radius,
                half_length,
            } => {
                // Cylinder plus two hemispherical caps, mass split by volume
                let cylinder_volume = std::f64::consts::PI * radius * radius * 2.0 * half_length;
                let cylinder_mass = mass * cylinder_volume / self.volume();
                let caps_mass = mass - cylinder_mass;
                let r2 = radius * radius;
                let length = 2.0 * half_length;
                let side = cylinder_mass * (length * length / 12.0 + r2 / 4.0)
                    + caps_mass
                        * (2.0 * r2 / 5.0 + length * length / 4.0 + 3.0 * length * radius / 8.0);
                let axial = cylinder_mass * r2 / 2.0 + caps_mass * 2.0 * r2 / 5.0;
                DVec3::new(side, side, axial)
            }
            GeomShape::Ellipsoid { radii } => {
                let (a2, b2, c2) = (radii.x * radii.x, radii.y * radii.y, radii.z * radii.z);
                DVec3::new(mass * (b2 + c2) / 5.0, mass * (a2 + c2) / 5.0, mass * (a2 + b2) / 5.0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_box_shape() {
        let shape = GeomShape::from_mjcf("box", &[0.5, 1.0, 1.5]).unwrap().unwrap();
        assert_relative_eq!(shape.volume(), 6.0);
        let inertia = shape.principal_inertia(12.0);
        // Full dimensions 1 x 2 x 3
        assert_relative_eq!(inertia.x, 4.0 + 9.0);
        assert_relative_eq!(inertia.y, 1.0 + 9.0);
        assert_relative_eq!(inertia.z, 1.0 + 4.0);
    }

    #[test]
    fn test_shape_errors() {
        assert!(GeomShape::from_mjcf("box", &[0.1, 0.1]).is_err());
        assert!(GeomShape::from_mjcf("sphere", &[0.0]).is_err());
        assert!(GeomShape::from_mjcf("blob", &[1.0]).is_err());
        assert_eq!(GeomShape::from_mjcf("plane", &[0.0, 0.0, 0.05]), Ok(None));
    }

    #[test]
    fn test_capsule_reduces_to_sphere() {
        let capsule = GeomShape::Capsule {
            radius: 0.1,
            half_length: 1e-9,
        };
        let sphere = GeomShape::Sphere { radius: 0.1 };
        assert_relative_eq!(capsule.volume(), sphere.volume(), epsilon = 1e-9);
        let a = capsule.principal_inertia(1.0);
        let b = sphere.principal_inertia(1.0);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-9);
        assert_relative_eq!(a.x, b.x, epsilon = 1e-6);
    }

    #[test]
    fn test_combine_point_masses() {
        let point = |x: f64| {
            let com = DVec3::new(x, 0.0, 0.0);
            MassProperties::from_principal(1.0, DVec3::ZERO, com, DQuat::IDENTITY)
        };
        let (a, b) = (point(-1.0), point(1.0));
        let both = a.combine(&b);
        assert_relative_eq!(both.mass, 2.0);
        assert_relative_eq!(both.com.x, 0.0);
        // Two unit masses at distance 1 from the z axis
        assert_relative_eq!(both.moment_about(DVec3::Z, DVec3::ZERO), 2.0);
        assert_relative_eq!(both.moment_about(DVec3::X, DVec3::ZERO), 0.0);
    }

    #[test]
    fn test_combine_with_massless_is_identity() {
        let a = MassProperties::from_principal(2.0, DVec3::ONE, DVec3::Y, DQuat::IDENTITY);
        assert_eq!(a.combine(&MassProperties::default()), a);
        assert_eq!(MassProperties::default().combine(&a), a);
    }

    #[test]
    fn test_rotated_principal_axes() {
        let rotation = DQuat::from_rotation_z(std::f64::consts::FRAC_PI_2);
        let solid =
            MassProperties::from_principal(1.0, DVec3::new(1.0, 2.0, 3.0), DVec3::ZERO, rotation);
        // Quarter turn about z swaps the x and y moments
        assert_relative_eq!(solid.moment_about(DVec3::X, DVec3::ZERO), 2.0, epsilon = 1e-12);
        assert_relative_eq!(solid.moment_about(DVec3::Y, DVec3::ZERO), 1.0, epsilon = 1e-12);
    }
}
