use bytemuck::{Pod, Zeroable};
use glam::{Affine3A, Mat3, Quat, Vec3};

use crate::types::{BRANCH_FACTOR, PartIndex};

/// Child orientations relative to the parent, indexed by slot.
///
/// Slot 0 continues straight up, slots 1 and 2 twist out along `+X`/`-X`,
/// slots 3 and 4 tilt out along `+Z`/`-Z`.
pub const BRANCH_ROTATIONS: [Quat; BRANCH_FACTOR] = [
    Quat::IDENTITY,
    // rotate_z(-90°)
    Quat::from_xyzw(0.0, 0.0, -FRAC_PI_4_SIN, FRAC_PI_4_SIN),
    // rotate_z(+90°)
    Quat::from_xyzw(0.0, 0.0, FRAC_PI_4_SIN, FRAC_PI_4_SIN),
    // rotate_x(+90°)
    Quat::from_xyzw(FRAC_PI_4_SIN, 0.0, 0.0, FRAC_PI_4_SIN),
    // rotate_x(-90°)
    Quat::from_xyzw(-FRAC_PI_4_SIN, 0.0, 0.0, FRAC_PI_4_SIN),
];

/// `sin(45°) == cos(45°)`, the non-zero components of a 90° quaternion.
const FRAC_PI_4_SIN: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Returns the fixed local rotation of the part at `index` within a level.
#[inline]
pub fn branch_rotation(index: PartIndex) -> Quat {
    BRANCH_ROTATIONS[index % BRANCH_FACTOR]
}

/// Rotation about the vertical (`+Y`) axis, used for spin.
#[inline]
pub fn rotate_around_vertical(angle: f32) -> Quat {
    Quat::from_rotation_y(angle)
}

/// Per-part state of the fractal hierarchy.
///
/// The first three fields are fixed when the slot is created; `spin_angle`
/// accumulates over time; the world fields are recomputed every frame and
/// are meaningless before the owning level has been updated once.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PartRecord {
    pub local_rotation: Quat,
    /// Maximum sag, radians.
    pub max_sag_angle: f32,
    /// Signed spin rate, radians per second.
    pub spin_velocity: f32,
    /// Accumulated spin, radians.
    pub spin_angle: f32,
    pub world_position: Vec3,
    pub world_rotation: Quat,
}

impl PartRecord {
    pub fn new(local_rotation: Quat, max_sag_angle: f32, spin_velocity: f32) -> Self {
        Self {
            local_rotation,
            max_sag_angle,
            spin_velocity,
            spin_angle: 0.0,
            world_position: Vec3::ZERO,
            world_rotation: Quat::IDENTITY,
        }
    }

    /// Advances the spin accumulator by one frame.
    #[inline]
    pub fn advance_spin(&mut self, dt: f32) {
        self.spin_angle += self.spin_velocity * dt;
    }

    /// `local_rotation` followed by the current spin about the part's own axis.
    #[inline]
    pub fn spun_local_rotation(&self) -> Quat {
        self.local_rotation * rotate_around_vertical(self.spin_angle)
    }
}

/// Compact affine transform handed to instanced drawing.
///
/// Three basis columns, each already multiplied by the uniform scale, plus
/// a translation. This is a column-major 3x4 matrix with no redundant
/// fourth row; 48 bytes per instance.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct InstanceTransform {
    pub x_axis: [f32; 3],
    pub y_axis: [f32; 3],
    pub z_axis: [f32; 3],
    pub translation: [f32; 3],
}

impl InstanceTransform {
    pub const IDENTITY: Self = Self {
        x_axis: [1.0, 0.0, 0.0],
        y_axis: [0.0, 1.0, 0.0],
        z_axis: [0.0, 0.0, 1.0],
        translation: [0.0, 0.0, 0.0],
    };

    pub fn from_rotation_translation_scale(rotation: Quat, translation: Vec3, scale: f32) -> Self {
        let basis = Mat3::from_quat(rotation) * scale;
        Self {
            x_axis: basis.x_axis.to_array(),
            y_axis: basis.y_axis.to_array(),
            z_axis: basis.z_axis.to_array(),
            translation: translation.to_array(),
        }
    }

    #[inline]
    pub fn translation(&self) -> Vec3 {
        Vec3::from_array(self.translation)
    }

    /// The scaled local up axis, i.e. the direction the segment extends in.
    #[inline]
    pub fn up(&self) -> Vec3 {
        Vec3::from_array(self.y_axis)
    }

    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_mat3_translation(
            Mat3::from_cols(
                Vec3::from_array(self.x_axis),
                Vec3::from_array(self.y_axis),
                Vec3::from_array(self.z_axis),
            ),
            self.translation(),
        )
    }
}
