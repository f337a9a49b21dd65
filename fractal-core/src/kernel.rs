//! The per-part update applied to every non-root part each frame.
//!
//! [`update_part`] only reads its parent and only writes its own record, so
//! any number of calls within one level may run concurrently.

use glam::{Quat, Vec3};

use crate::part::{InstanceTransform, PartRecord};

/// Distance from a parent's base to its child's base, in units of the
/// child's scale: half the parent's length (twice the child's scale) plus
/// half of the child's own length.
pub const CHILD_OFFSET: f32 = 1.5;

/// The orientation a part hangs from after sag, before its own rotation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sag {
    /// `sin` of the angle between true vertical and the pre-sag up axis,
    /// always in `[0, 1]`.
    pub magnitude: f32,
    pub base_rotation: Quat,
}

/// Bends `parent_rotation` towards the ground.
///
/// The candidate up axis is where the part would point with no sag. The
/// bend rotates around `vertical × up` by `max_sag_angle * magnitude`, so a
/// part leaning further sags more. A candidate already parallel to vertical
/// yields `parent_rotation` untouched.
pub fn sag(parent_rotation: Quat, local_rotation: Quat, max_sag_angle: f32) -> Sag {
    let up_axis = (parent_rotation * local_rotation) * Vec3::Y;
    let sag_axis = Vec3::Y.cross(up_axis);
    let length = sag_axis.length();
    // Rounding can push |a x b| for unit a, b a hair past 1. Only the angle
    // is clamped; the axis is normalized by its true length.
    let magnitude = length.min(1.0);

    let base_rotation = if length > 0.0 {
        let sag_rotation = Quat::from_axis_angle(sag_axis / length, max_sag_angle * magnitude);
        sag_rotation * parent_rotation
    } else {
        parent_rotation
    };

    Sag {
        magnitude,
        base_rotation,
    }
}

/// Updates one part from its parent's finalized world state.
///
/// ### Parameters
/// - `parent` - The parent record; its world fields must already be final
///   for this frame.
/// - `part` - The part to update; spin, world position and rotation change.
/// - `dt` - Elapsed time since the previous frame, seconds.
/// - `scale` - The uniform scale of the part's level.
///
/// ### Returns
/// The instance transform for the part.
#[inline]
pub fn update_part(
    parent: &PartRecord,
    part: &mut PartRecord,
    dt: f32,
    scale: f32,
) -> InstanceTransform {
    part.advance_spin(dt);

    let Sag { base_rotation, .. } = sag(
        parent.world_rotation,
        part.local_rotation,
        part.max_sag_angle,
    );

    part.world_rotation = base_rotation * part.spun_local_rotation();
    part.world_position =
        parent.world_position + part.world_rotation * Vec3::new(0.0, CHILD_OFFSET * scale, 0.0);

    InstanceTransform::from_rotation_translation_scale(
        part.world_rotation,
        part.world_position,
        scale,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::{BRANCH_ROTATIONS, PartRecord};
    use std::f32::consts::FRAC_PI_2;

    fn root_at(position: Vec3, rotation: Quat) -> PartRecord {
        let mut root = PartRecord::new(Quat::IDENTITY, 0.0, 0.0);
        root.world_position = position;
        root.world_rotation = rotation;
        root
    }

    #[test]
    fn sag_is_zero_and_bitwise_identity_for_vertical_candidate() {
        let parent = Quat::from_rotation_y(0.73);
        let s = sag(parent, Quat::IDENTITY, 0.5);

        assert_eq!(s.magnitude, 0.0);
        assert_eq!(s.base_rotation.to_array(), parent.to_array());
    }

    #[test]
    fn sag_magnitude_is_one_for_horizontal_candidate() {
        let s = sag(Quat::IDENTITY, BRANCH_ROTATIONS[1], 0.25);

        assert!((s.magnitude - 1.0).abs() < 1e-6);
        // The candidate points along +X; sag axis is Y x X = -Z. Rotating by
        // a positive angle about -Z turns +X down towards -Y.
        let up = (s.base_rotation * BRANCH_ROTATIONS[1]) * Vec3::Y;
        let expected = Vec3::new(0.25f32.cos(), -0.25f32.sin(), 0.0);
        assert!(up.abs_diff_eq(expected, 1e-5), "{up:?} != {expected:?}");
    }

    #[test]
    fn sag_magnitude_stays_in_unit_range() {
        let mut angle = 0.0f32;
        while angle < 6.3 {
            let parent = Quat::from_rotation_x(angle) * Quat::from_rotation_z(angle * 0.7);
            for local in BRANCH_ROTATIONS {
                let s = sag(parent, local, 0.4);
                assert!((0.0..=1.0).contains(&s.magnitude), "{}", s.magnitude);
            }
            angle += 0.05;
        }
    }

    #[test]
    fn sag_rotation_is_unit_and_bounded_by_max_angle() {
        let max_sag = 0.4;
        let mut angle = 0.0f32;
        while angle < 6.3 {
            // Leans around horizontal are where |vertical x up| rounds past 1.
            let parent = Quat::from_rotation_z(FRAC_PI_2 + angle * 1e-3)
                * Quat::from_rotation_y(angle)
                * Quat::from_rotation_x(angle * 0.3);
            for local in BRANCH_ROTATIONS {
                let s = sag(parent, local, max_sag);
                let q = s.base_rotation * parent.inverse();
                assert!((q.length() - 1.0).abs() < 1e-6, "{}", q.length());
                let (_, bend) = q.to_axis_angle();
                assert!(bend <= max_sag + 1e-5, "{bend}");
            }
            angle += 0.05;
        }
    }

    #[test]
    fn sag_scales_with_lean() {
        // A 30 degree lean sags by max * sin(30) = max / 2.
        let parent = Quat::from_rotation_z(-30f32.to_radians());
        let s = sag(parent, Quat::IDENTITY, 0.4);

        assert!((s.magnitude - 0.5).abs() < 1e-6);
        let (axis, angle) = (s.base_rotation * parent.inverse()).to_axis_angle();
        assert!(axis.abs_diff_eq(Vec3::NEG_Z, 1e-5), "{axis:?}");
        assert!((angle - 0.2).abs() < 1e-5, "{angle}");
    }

    #[test]
    fn child_is_placed_one_and_a_half_scales_above_parent() {
        let parent = root_at(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_x(0.3));
        for (slot, local) in BRANCH_ROTATIONS.into_iter().enumerate() {
            let mut part = PartRecord::new(local, 0.35, 1.2);
            let scale = 0.25;
            let t = update_part(&parent, &mut part, 0.016, scale);

            let distance = (part.world_position - parent.world_position).length();
            assert!(
                (distance - 1.5 * scale).abs() < 1e-6,
                "slot {slot}: distance {distance}"
            );
            assert_eq!(t.translation(), part.world_position);
        }
    }

    #[test]
    fn update_without_sag_or_spin_stacks_local_rotations() {
        let parent = root_at(Vec3::ZERO, BRANCH_ROTATIONS[1]);
        let mut part = PartRecord::new(BRANCH_ROTATIONS[1], 0.0, 0.0);

        let t = update_part(&parent, &mut part, 0.1, 0.5);

        let expected_rotation = Quat::from_rotation_z(-2.0 * FRAC_PI_2);
        assert!(part.world_rotation.abs_diff_eq(expected_rotation, 1e-6));
        assert!(part.world_position.abs_diff_eq(Vec3::new(0.0, -0.75, 0.0), 1e-6));
        assert!(t.up().abs_diff_eq(Vec3::new(0.0, -0.5, 0.0), 1e-6));
    }

    #[test]
    fn spin_is_applied_after_local_rotation() {
        let parent = root_at(Vec3::ZERO, Quat::IDENTITY);
        let mut part = PartRecord::new(BRANCH_ROTATIONS[3], 0.0, FRAC_PI_2);

        update_part(&parent, &mut part, 1.0, 1.0);

        assert_eq!(part.spin_angle, FRAC_PI_2);
        let expected = BRANCH_ROTATIONS[3] * Quat::from_rotation_y(FRAC_PI_2);
        assert!(part.world_rotation.abs_diff_eq(expected, 1e-6));
        // Spin is about the part's own long axis, so its up axis is unchanged.
        assert!((part.world_rotation * Vec3::Y).abs_diff_eq(Vec3::Z, 1e-6));
    }

    #[test]
    fn instance_basis_is_scaled_orthonormal() {
        let parent = root_at(Vec3::ZERO, Quat::from_rotation_z(0.4));
        let mut part = PartRecord::new(BRANCH_ROTATIONS[4], 0.3, 0.9);
        let scale = 0.125;

        let t = update_part(&parent, &mut part, 0.5, scale);
        let m = t.to_affine().matrix3;

        for axis in [m.x_axis, m.y_axis, m.z_axis] {
            assert!((axis.length() - scale).abs() < 1e-6);
        }
        assert!(m.x_axis.dot(m.y_axis).abs() < 1e-6);
        assert!(m.y_axis.dot(m.z_axis).abs() < 1e-6);
    }
}
