//! Kinematic chain and forward kinematics
//!
//! A [`Chain`] is an ordered list of joints from the base (index 0) to the
//! effector mount (last index), rooted at a base [`Pose`]. Joint 0 sits at
//! `base.position + base.orientation * joints[0].offset` and is not moved by
//! any angle. Each following joint is placed by the orientation accumulated
//! through the previous joint's angle, so `angles[i]` moves joints `i + 1..`
//! and the last joint's angle never affects the effector.

use glam::Vec3;

use crate::joint::Joint;
use crate::pose::Pose;

/// An ordered chain of joints with a persistent solution vector
#[derive(Debug, Clone)]
pub struct Chain {
    base: Pose,
    joints: Vec<Joint>,
    /// Current angles, parallel to `joints` and clamped per joint
    solution: Vec<f32>,
}

impl Chain {
    /// Build a chain from a base pose and its joints
    ///
    /// The solution starts from each joint's current angle.
    pub fn new(base: Pose, joints: Vec<Joint>) -> Result<Self, ChainError> {
        if joints.is_empty() {
            return Err(ChainError::EmptyChain);
        }
        if !(base.position.is_finite() && base.orientation.is_finite()) {
            return Err(ChainError::NonFiniteBase);
        }
        let solution = joints.iter().map(Joint::angle).collect();
        Ok(Self {
            base: Pose::new(base.position, base.orientation.normalize()),
            joints,
            solution,
        })
    }

    /// Create a builder for constructing chains with fluent API
    pub fn builder() -> ChainBuilder {
        ChainBuilder::default()
    }

    pub fn base(&self) -> Pose {
        self.base
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    /// Whether the chain has no joints
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// Current solution (degrees, one per joint)
    pub fn solution(&self) -> &[f32] {
        &self.solution
    }

    /// Sum of all joint offset lengths (the reach measured from the base)
    pub fn reach(&self) -> f32 {
        self.joints.iter().map(|j| j.offset().length()).sum()
    }

    /// Forward kinematics for an arbitrary angle vector
    pub fn forward(&self, angles: &[f32]) -> Pose {
        forward(self.base, &self.joints, angles)
    }

    /// Effector pose at the current solution
    pub fn effector(&self) -> Pose {
        self.forward(&self.solution)
    }

    /// World position of every joint for the given angles (base joint first)
    pub fn joint_positions(&self, angles: &[f32]) -> Vec<Vec3> {
        let mut points = Vec::with_capacity(self.joints.len());
        walk(self.base, &self.joints, angles, |p| points.push(p));
        points
    }

    /// Replace the solution, clamping every angle into its joint's limits
    pub(crate) fn commit_solution(&mut self, angles: &[f32]) {
        for ((slot, joint), angle) in self.solution.iter_mut().zip(&self.joints).zip(angles) {
            *slot = joint.clamp_angle(*angle);
        }
    }

    /// Copy the solution into each joint's current angle
    pub fn sync_joints(&mut self) {
        for (joint, angle) in self.joints.iter_mut().zip(&self.solution) {
            joint.set_angle(*angle);
        }
    }
}

/// Forward kinematics over raw geometry
///
/// Returns the base pose for an empty joint list. Missing angles count as 0.
pub fn forward(base: Pose, joints: &[Joint], angles: &[f32]) -> Pose {
    walk(base, joints, angles, |_| {})
}

fn walk(base: Pose, joints: &[Joint], angles: &[f32], mut visit: impl FnMut(Vec3)) -> Pose {
    let Some(first) = joints.first() else {
        return base;
    };

    let mut rotation = base.orientation;
    let mut point = base.transform_point(first.offset());
    visit(point);

    for i in 1..joints.len() {
        let angle = angles.get(i - 1).copied().unwrap_or(0.0);
        rotation *= joints[i - 1].local_rotation(angle);
        point += rotation * joints[i].offset();
        visit(point);
    }

    Pose::new(point, rotation)
}

/// Builder for chains
#[derive(Debug, Clone, Default)]
pub struct ChainBuilder {
    base: Pose,
    joints: Vec<Joint>,
}

impl ChainBuilder {
    /// Set the base pose
    pub fn base(mut self, base: Pose) -> Self {
        self.base = base;
        self
    }

    /// Append a joint (towards the effector)
    pub fn joint(mut self, joint: Joint) -> Self {
        self.joints.push(joint);
        self
    }

    pub fn build(self) -> Result<Chain, ChainError> {
        Chain::new(self.base, self.joints)
    }
}

/// Chain construction errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChainError {
    #[error("Chain has no joints")]
    EmptyChain,
    #[error("Joint '{joint}' has min angle {min} greater than max angle {max}")]
    InvalidLimits { joint: String, min: f32, max: f32 },
    #[error("Joint '{joint}' has a zero-length axis")]
    ZeroAxis { joint: String },
    #[error("Joint '{joint}' has non-finite geometry")]
    NonFinite { joint: String },
    #[error("Base pose is not finite")]
    NonFiniteBase,
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    fn planar_chain(lengths: &[f32]) -> Chain {
        let mut builder = Chain::builder();
        for (i, len) in lengths.iter().enumerate() {
            builder = builder.joint(
                Joint::builder(format!("j{i}"))
                    .axis(Vec3::Z)
                    .offset_xyz(*len, 0.0, 0.0)
                    .build()
                    .unwrap(),
            );
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_empty_chain_rejected() {
        let result = Chain::new(Pose::IDENTITY, Vec::new());
        assert_eq!(result.unwrap_err(), ChainError::EmptyChain);
    }

    #[test]
    fn test_forward_empty_returns_base() {
        let base = Pose::new(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_y(0.3));
        assert_eq!(forward(base, &[], &[]), base);
    }

    #[test]
    fn test_forward_rest_pose_is_straight() {
        let chain = planar_chain(&[1.0, 1.0, 1.0]);
        let pose = chain.forward(&[0.0, 0.0, 0.0]);
        assert!((pose.position - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-6);
        assert!((chain.reach() - 3.0).abs() < 1e-6);
        assert_eq!(chain.len(), 3);
        assert!(!chain.is_empty());
    }

    #[test]
    fn test_forward_first_joint_unaffected_by_angles() {
        let chain = planar_chain(&[1.0, 1.0, 1.0]);
        let points = chain.joint_positions(&[73.0, -20.0, 45.0]);
        assert_eq!(points.len(), 3);
        assert!((points[0] - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn test_forward_last_angle_unused() {
        let chain = planar_chain(&[1.0, 1.0, 1.0]);
        let a = chain.forward(&[10.0, 20.0, 0.0]);
        let b = chain.forward(&[10.0, 20.0, 90.0]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_forward_angle_rotates_following_joints() {
        let chain = planar_chain(&[1.0, 1.0, 1.0]);
        // Joint 0 turned 90 degrees: everything after it points along +Y
        let pose = chain.forward(&[90.0, 0.0, 0.0]);
        assert!((pose.position - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-5);

        // Joint 1 turned 90 degrees: only the last link points along +Y
        let pose = chain.forward(&[0.0, 90.0, 0.0]);
        assert!((pose.position - Vec3::new(2.0, 1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_forward_applies_base_pose() {
        let base = Pose::new(
            Vec3::new(0.0, 0.0, 5.0),
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
        );
        let chain = Chain::new(base, planar_chain(&[1.0, 1.0]).joints().to_vec()).unwrap();
        let pose = chain.forward(&[0.0, 0.0]);
        assert!((pose.position - Vec3::new(0.0, 2.0, 5.0)).length() < 1e-5);
    }

    #[test]
    fn test_forward_is_deterministic() {
        let chain = planar_chain(&[0.7, 1.3, 0.4, 0.9]);
        let angles = [12.5, -33.0, 71.25, 4.0];
        let first = chain.forward(&angles);
        for _ in 0..10 {
            assert_eq!(chain.forward(&angles), first);
        }
    }

    #[test]
    fn test_solution_seeded_from_joint_angles() {
        let chain = Chain::builder()
            .joint(Joint::builder("a").angle(15.0).build().unwrap())
            .joint(Joint::builder("b").limits(-5.0, 5.0).angle(-30.0).build().unwrap())
            .build()
            .unwrap();
        assert_eq!(chain.solution(), &[15.0, -5.0]);
    }

    #[test]
    fn test_commit_solution_clamps() {
        let mut chain = Chain::builder()
            .joint(Joint::builder("a").limits(-10.0, 10.0).build().unwrap())
            .joint(Joint::builder("b").limits(0.0, 90.0).build().unwrap())
            .build()
            .unwrap();
        chain.commit_solution(&[50.0, -20.0]);
        assert_eq!(chain.solution(), &[10.0, 0.0]);

        chain.sync_joints();
        assert_eq!(chain.joints()[0].angle(), 10.0);
        assert_eq!(chain.joints()[1].angle(), 0.0);
    }
}
