//! Math types for PetalSonic entity audio

pub use glam::{Mat3, Quat, Vec3};

/// Position and orientation of an owner, proxy or listener.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation,
        }
    }

    /// Applies `local` in this pose's frame (`self * local`).
    ///
    /// Used to place a proxy at its offset relative to the owner.
    pub fn compose(&self, local: &Pose) -> Pose {
        Pose {
            position: self.position + self.rotation * local.position,
            rotation: (self.rotation * local.rotation).normalize(),
        }
    }

    /// Returns a copy with `delta` added to the translation only.
    pub fn translated(&self, delta: Vec3) -> Pose {
        Pose {
            position: self.position + delta,
            rotation: self.rotation,
        }
    }

    /// True when every component of the translation and of the rotation
    /// basis differs by strictly less than `epsilon`.
    pub fn is_equivalent(&self, other: &Pose, epsilon: f32) -> bool {
        let position_delta = (self.position - other.position).abs().max_element();
        if position_delta >= epsilon {
            return false;
        }

        let a = Mat3::from_quat(self.rotation);
        let b = Mat3::from_quat(other.rotation);
        let rotation_delta = (a.x_axis - b.x_axis)
            .abs()
            .max_element()
            .max((a.y_axis - b.y_axis).abs().max_element())
            .max((a.z_axis - b.z_axis).abs().max_element());

        rotation_delta < epsilon
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite()
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}
