//! Closed-form two-link IK
//!
//! Law-of-cosines solution for a chain of exactly two links. The planar
//! variant works in the XY plane (rotations about +Z). The spatial variant
//! first turns the chain about +Y towards the target (azimuth), then solves
//! the same triangle in the vertical plane that contains the target.
//!
//! All angles are returned in degrees.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::DEGENERATE_LENGTH_EPSILON;

/// Which two-link formulation to solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TwoLinkVariant {
    /// Target projected onto the XY plane, no azimuth
    #[default]
    Planar,
    /// Azimuth about +Y, then an in-plane solve including elevation
    Spatial,
}

/// Result of an analytic two-link solve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IkResult {
    /// Rotation of the root about +Y (always 0 for the planar variant)
    pub angle_azimuth: f32,
    /// Rotation of the first link about +Z
    pub angle0: f32,
    /// Bend of the second link relative to the first (0 = straight)
    pub angle1: f32,
    /// False when the target lies beyond full extension (or on the root)
    pub reachable: bool,
}

impl IkResult {
    /// Angle inside the triangle at the middle joint (180 = fully extended)
    pub fn elbow_interior_angle(&self) -> f32 {
        180.0 - self.angle1
    }

    /// Local rotation for the root joint: azimuth about +Y, then `angle0` about +Z
    pub fn root_rotation(&self) -> Quat {
        Quat::from_rotation_y(self.angle_azimuth.to_radians())
            * Quat::from_rotation_z(self.angle0.to_radians())
    }

    /// Local rotation for the middle joint
    pub fn mid_rotation(&self) -> Quat {
        Quat::from_rotation_z(self.angle1.to_radians())
    }

    pub fn is_finite(&self) -> bool {
        self.angle_azimuth.is_finite() && self.angle0.is_finite() && self.angle1.is_finite()
    }
}

/// Analytic solver for a root-mid-end chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoLinkSolver {
    /// Root to middle joint
    len0: f32,
    /// Middle joint to end
    len1: f32,
}

impl TwoLinkSolver {
    pub fn new(len0: f32, len1: f32) -> Result<Self, TwoLinkError> {
        check_length("len0", len0)?;
        check_length("len1", len1)?;
        Ok(Self { len0, len1 })
    }

    /// Measure the link lengths from rest positions of the three joints
    pub fn from_points(root: Vec3, mid: Vec3, end: Vec3) -> Result<Self, TwoLinkError> {
        Self::new(root.distance(mid), mid.distance(end))
    }

    pub fn len0(&self) -> f32 {
        self.len0
    }

    pub fn len1(&self) -> f32 {
        self.len1
    }

    /// Full extension length
    pub fn reach(&self) -> f32 {
        self.len0 + self.len1
    }

    pub fn solve(&self, root: Vec3, target: Vec3, variant: TwoLinkVariant) -> IkResult {
        match variant {
            TwoLinkVariant::Planar => self.solve_planar(root, target),
            TwoLinkVariant::Spatial => self.solve_spatial(root, target),
        }
    }

    /// Solve in the XY plane; the z offset of the target is ignored
    pub fn solve_planar(&self, root: Vec3, target: Vec3) -> IkResult {
        let dx = target.x - root.x;
        let dy = target.y - root.y;
        let len2 = (dx * dx + dy * dy).sqrt();
        let heading = dy.atan2(dx).to_degrees();

        let (angle0, angle1, reachable) = self.triangle(len2, heading);
        IkResult {
            angle_azimuth: 0.0,
            angle0,
            angle1,
            reachable,
        }
    }

    /// Solve in 3D with an azimuth turn about +Y
    pub fn solve_spatial(&self, root: Vec3, target: Vec3) -> IkResult {
        let d = target - root;
        let horizontal = (d.x * d.x + d.z * d.z).sqrt();
        let azimuth = -d.z.atan2(d.x);
        let elevation = d.y.atan2(horizontal).to_degrees();

        let (angle0, angle1, reachable) = self.triangle(d.length(), elevation);
        IkResult {
            angle_azimuth: azimuth.to_degrees(),
            angle0,
            angle1,
            reachable,
        }
    }

    /// In-plane solve for a target at distance `len2` in direction `heading` (degrees)
    fn triangle(&self, len2: f32, heading: f32) -> (f32, f32, bool) {
        let (len0, len1) = (self.len0, self.len1);

        if len2 < DEGENERATE_LENGTH_EPSILON {
            tracing::debug!("Two-link target coincides with the root; keeping rest pose");
            return (0.0, 0.0, false);
        }
        if len0 + len1 < len2 {
            tracing::debug!(
                "Two-link target out of reach ({:.4} > {:.4}); extending towards it",
                len2,
                len0 + len1
            );
            return (heading, 0.0, false);
        }

        let cos0 = (len2 * len2 + len0 * len0 - len1 * len1) / (2.0 * len2 * len0);
        let cos1 = (len1 * len1 + len0 * len0 - len2 * len2) / (2.0 * len1 * len0);
        // Rounding can push either cosine just outside [-1, 1] at the reach boundary
        let root_angle = cos0.clamp(-1.0, 1.0).acos().to_degrees();
        let mid_angle = cos1.clamp(-1.0, 1.0).acos().to_degrees();

        (heading - root_angle, 180.0 - mid_angle, true)
    }
}

/// Solve a two-link chain given its root position and link lengths
pub fn solve_two_link(
    root: Vec3,
    len0: f32,
    len1: f32,
    target: Vec3,
    variant: TwoLinkVariant,
) -> Result<IkResult, TwoLinkError> {
    Ok(TwoLinkSolver::new(len0, len1)?.solve(root, target, variant))
}

fn check_length(which: &'static str, value: f32) -> Result<(), TwoLinkError> {
    if value.is_finite() && value > DEGENERATE_LENGTH_EPSILON {
        Ok(())
    } else {
        Err(TwoLinkError::InvalidLength { which, value })
    }
}

/// Two-link construction errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TwoLinkError {
    #[error("Link length {which} must be positive and finite (got {value})")]
    InvalidLength { which: &'static str, value: f32 },
}
