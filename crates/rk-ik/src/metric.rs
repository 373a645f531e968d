//! Error metrics minimized by the iterative solver

use crate::chain::Chain;
use crate::pose::Pose;

/// Scalar error between a target and a candidate angle vector
///
/// Implementations must return a finite, non-negative value. The solver only
/// ever sees this trait, so alternative metrics plug in without changes to it.
/// Any `Fn(&Chain, &Pose, &[f32]) -> f32` closure is also a metric.
pub trait ErrorMetric {
    fn error(&self, chain: &Chain, target: &Pose, angles: &[f32]) -> f32;
}

impl<F> ErrorMetric for F
where
    F: Fn(&Chain, &Pose, &[f32]) -> f32,
{
    fn error(&self, chain: &Chain, target: &Pose, angles: &[f32]) -> f32 {
        self(chain, target, angles)
    }
}

/// Euclidean distance from the effector to the target position
///
/// The target orientation is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceMetric;

impl ErrorMetric for DistanceMetric {
    fn error(&self, chain: &Chain, target: &Pose, angles: &[f32]) -> f32 {
        chain.forward(angles).position.distance(target.position)
    }
}

/// Position distance plus weighted orientation error
///
/// The orientation term is the angle (radians) between the effector and
/// target orientations, scaled by `orientation_weight`.
#[derive(Debug, Clone, Copy)]
pub struct PoseMetric {
    pub orientation_weight: f32,
}

impl PoseMetric {
    pub fn new(orientation_weight: f32) -> Self {
        Self { orientation_weight }
    }
}

impl Default for PoseMetric {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl ErrorMetric for PoseMetric {
    fn error(&self, chain: &Chain, target: &Pose, angles: &[f32]) -> f32 {
        let effector = chain.forward(angles);
        let distance = effector.position.distance(target.position);
        let angle = effector.orientation.angle_between(target.orientation);
        distance + self.orientation_weight.abs() * angle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::Joint;
    use approx::assert_relative_eq;
    use glam::{Quat, Vec3};

    fn two_link() -> Chain {
        Chain::builder()
            .joint(Joint::builder("root").build().unwrap())
            .joint(Joint::builder("mid").offset_xyz(1.0, 0.0, 0.0).build().unwrap())
            .joint(Joint::builder("tip").offset_xyz(1.0, 0.0, 0.0).build().unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn test_distance_metric() {
        let chain = two_link();
        let target = Pose::from_position(Vec3::new(2.0, 3.0, 0.0));
        let e = DistanceMetric.error(&chain, &target, &[0.0, 0.0, 0.0]);
        assert_relative_eq!(e, 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_distance_metric_ignores_orientation() {
        let chain = two_link();
        let a = Pose::from_position(Vec3::new(2.0, 0.0, 0.0));
        let b = Pose::new(a.position, Quat::from_rotation_x(1.0));
        assert_eq!(
            DistanceMetric.error(&chain, &a, &[0.0; 3]),
            DistanceMetric.error(&chain, &b, &[0.0; 3])
        );
    }

    #[test]
    fn test_pose_metric_adds_orientation_term() {
        let chain = two_link();
        let target = Pose::new(Vec3::new(2.0, 0.0, 0.0), Quat::from_rotation_z(0.5));
        let e = PoseMetric::new(2.0).error(&chain, &target, &[0.0; 3]);
        assert_relative_eq!(e, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_closure_metric() {
        let chain = two_link();
        let metric = |chain: &Chain, target: &Pose, angles: &[f32]| {
            (chain.forward(angles).position.y - target.position.y).abs()
        };
        let target = Pose::from_position(Vec3::new(0.0, 0.5, 0.0));
        assert_relative_eq!(metric.error(&chain, &target, &[0.0; 3]), 0.5);
    }
}
