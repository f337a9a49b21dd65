use glam::{Quat, Vec3};

use crate::part::{InstanceTransform, PartRecord};

/// World placement of the object hosting the fractal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootPlacement {
    pub position: Vec3,
    pub rotation: Quat,
    /// Only `scale.x` is used; non-uniform scale is not supported.
    pub scale: Vec3,
}

impl Default for RootPlacement {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl RootPlacement {
    /// The single scale factor applied to the whole hierarchy.
    #[inline]
    pub fn object_scale(&self) -> f32 {
        self.scale.x
    }
}

/// Folds the host placement into the root part for one frame.
///
/// Advances the root's spin, then places it at the host position with the
/// host rotation applied on top of its own spun local rotation.
///
/// ### Returns
/// The root's instance transform, scaled by [`RootPlacement::object_scale`].
pub fn drive_root(root: &mut PartRecord, placement: &RootPlacement, dt: f32) -> InstanceTransform {
    root.advance_spin(dt);
    root.world_rotation = placement.rotation * root.spun_local_rotation();
    root.world_position = placement.position;

    InstanceTransform::from_rotation_translation_scale(
        root.world_rotation,
        root.world_position,
        placement.object_scale(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn root_takes_host_position_and_rotation() {
        let mut root = PartRecord::new(Quat::IDENTITY, 0.3, 0.0);
        let placement = RootPlacement {
            position: Vec3::new(4.0, -1.0, 2.0),
            rotation: Quat::from_rotation_x(FRAC_PI_2),
            scale: Vec3::splat(2.0),
        };

        let t = drive_root(&mut root, &placement, 0.1);

        assert_eq!(root.world_position, placement.position);
        assert!(root.world_rotation.abs_diff_eq(placement.rotation, 1e-6));
        assert_eq!(t.translation(), placement.position);
        assert!(t.up().abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-5));
    }

    #[test]
    fn root_spin_is_applied_under_host_rotation() {
        let mut root = PartRecord::new(Quat::IDENTITY, 0.0, 1.0);
        let placement = RootPlacement {
            rotation: Quat::from_rotation_z(0.5),
            ..RootPlacement::default()
        };

        drive_root(&mut root, &placement, 0.25);
        drive_root(&mut root, &placement, 0.25);

        assert_eq!(root.spin_angle, 0.5);
        let expected = Quat::from_rotation_z(0.5) * Quat::from_rotation_y(0.5);
        assert!(root.world_rotation.abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn only_first_scale_component_is_used() {
        let mut root = PartRecord::new(Quat::IDENTITY, 0.0, 0.0);
        let placement = RootPlacement {
            scale: Vec3::new(3.0, 1.0, 7.0),
            ..RootPlacement::default()
        };

        let t = drive_root(&mut root, &placement, 0.0);

        assert_eq!(placement.object_scale(), 3.0);
        for axis in [t.x_axis, t.y_axis, t.z_axis] {
            assert!((Vec3::from_array(axis).length() - 3.0).abs() < 1e-6);
        }
    }
}
