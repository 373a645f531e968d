//! Per-tick IK driver
//!
//! [`IkController`] sits between an input layer that supplies a destination
//! each tick and a scene layer that applies joint angles. The scene layer is
//! reached through [`JointSink`]; optional diagnostics go through
//! [`DebugDraw`]. Neither collaborator influences the solve.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::chain::Chain;
use crate::joint::Joint;
use crate::metric::{DistanceMetric, ErrorMetric};
use crate::pose::Pose;
use crate::solver::{GradientSolver, SolveReport, SolveStatus};

/// Receives joint angles after a solver pass changed them
pub trait JointSink {
    /// Apply `joint.angle()` (or `joint.current_rotation()`) to node `index`
    fn apply(&mut self, index: usize, joint: &Joint);
}

impl<F> JointSink for F
where
    F: FnMut(usize, &Joint),
{
    fn apply(&mut self, index: usize, joint: &Joint) {
        self(index, joint)
    }
}

/// Kind of diagnostic line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugLine {
    /// Segment between consecutive joints
    Skeleton,
    /// Effector to the current target
    Target,
}

/// Line-drawing collaborator for diagnostics
pub trait DebugDraw {
    fn line(&mut self, from: Vec3, to: Vec3, kind: DebugLine);
}

impl<F> DebugDraw for F
where
    F: FnMut(Vec3, Vec3, DebugLine),
{
    fn line(&mut self, from: Vec3, to: Vec3, kind: DebugLine) {
        self(from, to, kind)
    }
}

/// Controller settings
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Distance to stop short of the destination, along the base-destination line
    pub standoff: f32,
    /// Emit diagnostic lines when a drawer is supplied
    pub debug_draw: bool,
}

/// Summary of a controller tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Approach point the solver aimed at
    pub target: Vec3,
    pub solve: SolveReport,
    /// Whether joint angles were handed to the sink
    pub applied: bool,
}

/// Drives a chain towards a destination, one solver pass per tick
#[derive(Debug, Clone)]
pub struct IkController<M = DistanceMetric> {
    chain: Chain,
    solver: GradientSolver<M>,
    config: ControllerConfig,
}

impl<M: ErrorMetric> IkController<M> {
    pub fn new(chain: Chain, solver: GradientSolver<M>, config: ControllerConfig) -> Self {
        Self {
            chain,
            solver,
            config,
        }
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn solver(&self) -> &GradientSolver<M> {
        &self.solver
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ControllerConfig) {
        self.config = config;
    }

    /// Point the effector should reach for a given destination
    ///
    /// Backs off by `standoff` along the base-to-destination direction. A
    /// destination on the base leaves the point unchanged.
    pub fn approach_point(&self, destination: Vec3) -> Vec3 {
        let direction = (destination - self.chain.base().position).normalize_or_zero();
        destination - direction * self.config.standoff
    }

    /// Run one control tick
    pub fn tick(
        &mut self,
        destination: Vec3,
        sink: &mut impl JointSink,
        draw: Option<&mut dyn DebugDraw>,
    ) -> TickReport {
        let target = self.approach_point(destination);
        let solve = self
            .solver
            .solve_pose(&mut self.chain, &Pose::from_position(target));

        let applied = matches!(
            solve.status,
            SolveStatus::Converged | SolveStatus::InProgress
        );
        if applied {
            self.chain.sync_joints();
            for (index, joint) in self.chain.joints().iter().enumerate() {
                sink.apply(index, joint);
            }
        }

        if self.config.debug_draw {
            if let Some(draw) = draw {
                self.draw(target, draw);
            }
        }

        TickReport {
            target,
            solve,
            applied,
        }
    }

    fn draw(&self, target: Vec3, draw: &mut dyn DebugDraw) {
        let points = self.chain.joint_positions(self.chain.solution());
        let mut from = self.chain.base().position;
        for point in &points {
            draw.line(from, *point, DebugLine::Skeleton);
            from = *point;
        }
        draw.line(self.chain.effector().position, target, DebugLine::Target);
    }
}
