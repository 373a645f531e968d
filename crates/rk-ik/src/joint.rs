//! Joint type and builder for kinematic chains

use glam::{Quat, Vec3};

use crate::chain::ChainError;
use crate::constants::{DEFAULT_MAX_ANGLE, DEFAULT_MIN_ANGLE};

/// A single rotational degree of freedom
///
/// The joint sits at `offset` from its parent joint (expressed in the parent's
/// frame at zero rotation) and rotates about `axis`. Angles are in degrees and
/// always lie within `[min_angle, max_angle]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    name: String,
    /// Rotation axis (unit length)
    axis: Vec3,
    /// Offset from the parent joint
    offset: Vec3,
    min_angle: f32,
    max_angle: f32,
    /// Current angle, kept inside the limits on every write
    angle: f32,
}

impl Joint {
    /// Create a builder for constructing joints with fluent API
    pub fn builder(name: impl Into<String>) -> JointBuilder {
        JointBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn axis(&self) -> Vec3 {
        self.axis
    }

    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    pub fn min_angle(&self) -> f32 {
        self.min_angle
    }

    pub fn max_angle(&self) -> f32 {
        self.max_angle
    }

    /// Current angle (degrees)
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Clamp an angle into this joint's limits
    pub fn clamp_angle(&self, angle: f32) -> f32 {
        angle.clamp(self.min_angle, self.max_angle)
    }

    /// Set the current angle, clamped to the limits. Returns the stored value.
    pub fn set_angle(&mut self, angle: f32) -> f32 {
        self.angle = self.clamp_angle(angle);
        self.angle
    }

    /// Local rotation produced by `angle` degrees about the joint axis
    pub fn local_rotation(&self, angle: f32) -> Quat {
        Quat::from_axis_angle(self.axis, angle.to_radians())
    }

    /// Local rotation at the current angle
    pub fn current_rotation(&self) -> Quat {
        self.local_rotation(self.angle)
    }
}

/// Builder for creating joints with fluent API
#[derive(Debug, Clone)]
pub struct JointBuilder {
    name: String,
    axis: Vec3,
    offset: Vec3,
    min_angle: f32,
    max_angle: f32,
    angle: f32,
}

impl JointBuilder {
    /// Create a new joint builder (Z axis, no offset, default limits)
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            axis: Vec3::Z,
            offset: Vec3::ZERO,
            min_angle: DEFAULT_MIN_ANGLE,
            max_angle: DEFAULT_MAX_ANGLE,
            angle: 0.0,
        }
    }

    /// Set the rotation axis (normalized on build)
    pub fn axis(mut self, axis: Vec3) -> Self {
        self.axis = axis;
        self
    }

    /// Set the offset from the parent joint
    pub fn offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    /// Set the offset from x, y, z components
    pub fn offset_xyz(mut self, x: f32, y: f32, z: f32) -> Self {
        self.offset = Vec3::new(x, y, z);
        self
    }

    /// Set the angular limits (degrees)
    pub fn limits(mut self, min_angle: f32, max_angle: f32) -> Self {
        self.min_angle = min_angle;
        self.max_angle = max_angle;
        self
    }

    /// Set the initial angle (clamped on build)
    pub fn angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    /// Build the joint, validating its geometry and limits
    pub fn build(self) -> Result<Joint, ChainError> {
        let finite = self.axis.is_finite()
            && self.offset.is_finite()
            && self.min_angle.is_finite()
            && self.max_angle.is_finite()
            && self.angle.is_finite();
        if !finite {
            return Err(ChainError::NonFinite { joint: self.name });
        }
        if self.min_angle > self.max_angle {
            return Err(ChainError::InvalidLimits {
                joint: self.name,
                min: self.min_angle,
                max: self.max_angle,
            });
        }
        let Some(axis) = self.axis.try_normalize() else {
            return Err(ChainError::ZeroAxis { joint: self.name });
        };

        Ok(Joint {
            angle: self.angle.clamp(self.min_angle, self.max_angle),
            name: self.name,
            axis,
            offset: self.offset,
            min_angle: self.min_angle,
            max_angle: self.max_angle,
        })
    }
}
