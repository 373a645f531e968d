//! Iterative IK Solver
//!
//! Finite-difference gradient descent over joint angles. Each call to
//! [`GradientSolver::solve`] is one pass (one control tick): joints are
//! visited from the effector back to the base, each one nudged against its
//! own error gradient and clamped into its limits. Updates are coordinate
//! descent: every joint sees the angles already changed earlier in the pass.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::chain::Chain;
use crate::constants::{
    DEFAULT_DELTA_GRADIENT, DEFAULT_LEARNING_RATE, DEFAULT_SLOWDOWN_THRESHOLD,
    DEFAULT_STOP_THRESHOLD,
};
use crate::metric::{DistanceMetric, ErrorMetric};
use crate::pose::Pose;

/// Tuning parameters for the gradient solver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Finite-difference step (degrees)
    pub delta_gradient: f32,
    /// Step multiplier applied to the gradient
    pub learning_rate: f32,
    /// Error at or below which the pose is accepted
    pub stop_threshold: f32,
    /// Error at or above which the full step size applies
    pub slowdown_threshold: f32,
}

/// Conservative tuning. With this learning rate a straight three-link unit arm
/// is still a full unit away from a target at distance 2 after 200 passes; rigs
/// that must settle within a few hundred ticks raise it with `with_learning_rate`.
impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            delta_gradient: DEFAULT_DELTA_GRADIENT,
            learning_rate: DEFAULT_LEARNING_RATE,
            stop_threshold: DEFAULT_STOP_THRESHOLD,
            slowdown_threshold: DEFAULT_SLOWDOWN_THRESHOLD,
        }
    }
}

impl SolverConfig {
    /// Set the finite-difference step
    pub fn with_delta_gradient(mut self, delta_gradient: f32) -> Self {
        self.delta_gradient = delta_gradient;
        self
    }

    /// Set the learning rate
    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set the stop and slowdown thresholds
    pub fn with_thresholds(mut self, stop_threshold: f32, slowdown_threshold: f32) -> Self {
        self.stop_threshold = stop_threshold;
        self.slowdown_threshold = slowdown_threshold;
        self
    }

    /// Check the configuration before it is used by a solver
    pub fn validate(&self) -> Result<(), SolverConfigError> {
        let fields = [
            ("delta_gradient", self.delta_gradient),
            ("learning_rate", self.learning_rate),
            ("stop_threshold", self.stop_threshold),
            ("slowdown_threshold", self.slowdown_threshold),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(SolverConfigError::NonFinite(*name));
        }
        if self.delta_gradient == 0.0 {
            return Err(SolverConfigError::ZeroDeltaGradient);
        }
        if self.stop_threshold < 0.0 {
            return Err(SolverConfigError::NegativeStopThreshold(self.stop_threshold));
        }
        if self.slowdown_threshold <= self.stop_threshold {
            return Err(SolverConfigError::ThresholdOrder {
                stop: self.stop_threshold,
                slowdown: self.slowdown_threshold,
            });
        }
        Ok(())
    }

    /// Step scale for the given error: 0 at the stop threshold, 1 at the slowdown threshold
    pub fn slowdown(&self, error: f32) -> f32 {
        let span = self.slowdown_threshold - self.stop_threshold;
        if span <= 0.0 {
            return if error >= self.stop_threshold { 1.0 } else { 0.0 };
        }
        ((error - self.stop_threshold) / span).clamp(0.0, 1.0)
    }
}

/// Outcome of a single solver pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    /// Error was already within the stop threshold; nothing changed
    AlreadyConverged,
    /// The pass brought the error within the stop threshold
    Converged,
    /// The pass finished without reaching the stop threshold
    InProgress,
    /// Target or error was not finite; nothing changed
    Rejected,
}

/// Summary of a solver pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
    pub status: SolveStatus,
    /// Error before the pass
    pub initial_error: f32,
    /// Error after the pass
    pub final_error: f32,
    /// Number of joints updated during the pass
    pub joints_visited: usize,
}

impl SolveReport {
    pub fn is_converged(&self) -> bool {
        matches!(
            self.status,
            SolveStatus::AlreadyConverged | SolveStatus::Converged
        )
    }
}

/// Gradient descent IK solver
#[derive(Debug, Clone)]
pub struct GradientSolver<M = DistanceMetric> {
    config: SolverConfig,
    metric: M,
}

impl GradientSolver<DistanceMetric> {
    /// Create a solver minimizing effector-to-target distance
    pub fn new(config: SolverConfig) -> Result<Self, SolverConfigError> {
        Self::with_metric(config, DistanceMetric)
    }
}

impl<M: ErrorMetric> GradientSolver<M> {
    /// Create a solver with a custom error metric
    pub fn with_metric(config: SolverConfig, metric: M) -> Result<Self, SolverConfigError> {
        config.validate()?;
        Ok(Self { config, metric })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn metric(&self) -> &M {
        &self.metric
    }

    /// Error of the chain's current solution
    pub fn error(&self, chain: &Chain, target: &Pose) -> f32 {
        self.metric.error(chain, target, chain.solution())
    }

    /// One pass towards a target position
    pub fn solve(&self, chain: &mut Chain, target: Vec3) -> SolveReport {
        self.solve_pose(chain, &Pose::from_position(target))
    }

    /// One pass towards a target pose
    pub fn solve_pose(&self, chain: &mut Chain, target: &Pose) -> SolveReport {
        let stop = self.config.stop_threshold;
        let finite_target = target.position.is_finite() && target.orientation.is_finite();
        let initial_error = if finite_target {
            self.error(chain, target)
        } else {
            f32::NAN
        };
        if !initial_error.is_finite() {
            tracing::debug!("IK pass rejected: non-finite target or error");
            return SolveReport {
                status: SolveStatus::Rejected,
                initial_error,
                final_error: initial_error,
                joints_visited: 0,
            };
        }
        if initial_error <= stop {
            return SolveReport {
                status: SolveStatus::AlreadyConverged,
                initial_error,
                final_error: initial_error,
                joints_visited: 0,
            };
        }

        // Work on a copy so the chain never holds a half-probed solution
        let mut angles = chain.solution().to_vec();
        let mut final_error = initial_error;
        let mut joints_visited = 0;

        for i in (0..chain.len()).rev() {
            let error = self.metric.error(chain, target, &angles);
            let slowdown = self.config.slowdown(error);
            let gradient = self.gradient(chain, target, &mut angles, i, error);

            let joint = &chain.joints()[i];
            let next = angles[i] - self.config.learning_rate * gradient * slowdown;
            if !next.is_finite() {
                tracing::trace!("joint {} '{}': non-finite step skipped", i, joint.name());
                continue;
            }
            let previous = angles[i];
            angles[i] = joint.clamp_angle(next);

            let error = self.metric.error(chain, target, &angles);
            if !error.is_finite() {
                angles[i] = previous;
                continue;
            }
            joints_visited += 1;
            final_error = error;
            tracing::trace!(
                "joint {} '{}': gradient={:.5} slowdown={:.3} angle={:.3} error={:.5}",
                i,
                joint.name(),
                gradient,
                slowdown,
                angles[i],
                final_error
            );

            if final_error <= stop {
                break;
            }
        }

        chain.commit_solution(&angles);

        let status = if final_error <= stop {
            SolveStatus::Converged
        } else {
            SolveStatus::InProgress
        };
        tracing::debug!(
            "IK pass: {:?}, error {:.5} -> {:.5} ({} joints)",
            status,
            initial_error,
            final_error,
            joints_visited
        );

        SolveReport {
            status,
            initial_error,
            final_error,
            joints_visited,
        }
    }

    /// Repeat passes until the pose is accepted or `max_steps` passes ran
    pub fn solve_until(&self, chain: &mut Chain, target: &Pose, max_steps: usize) -> SolveReport {
        let initial_error = self.error(chain, target);
        let mut report = SolveReport {
            status: if !initial_error.is_finite() {
                SolveStatus::Rejected
            } else if initial_error <= self.config.stop_threshold {
                SolveStatus::AlreadyConverged
            } else {
                SolveStatus::InProgress
            },
            initial_error,
            final_error: initial_error,
            joints_visited: 0,
        };

        for _ in 0..max_steps {
            if report.is_converged() || report.status == SolveStatus::Rejected {
                break;
            }
            let step = self.solve_pose(chain, target);
            report.status = step.status;
            report.final_error = step.final_error;
            report.joints_visited += step.joints_visited;
        }

        report
    }

    /// Forward-difference gradient of the error with respect to joint `index`
    fn gradient(
        &self,
        chain: &Chain,
        target: &Pose,
        angles: &mut [f32],
        index: usize,
        error: f32,
    ) -> f32 {
        let delta = self.config.delta_gradient;
        let perturbed = {
            let probe = AngleProbe::nudge(angles, index, delta);
            self.metric.error(chain, target, probe.angles())
        };
        (perturbed - error) / delta
    }
}

/// Temporarily offsets one angle; the original value is restored on drop
struct AngleProbe<'a> {
    angles: &'a mut [f32],
    index: usize,
    original: f32,
}

impl<'a> AngleProbe<'a> {
    fn nudge(angles: &'a mut [f32], index: usize, delta: f32) -> Self {
        let original = angles[index];
        angles[index] = original + delta;
        Self {
            angles,
            index,
            original,
        }
    }

    fn angles(&self) -> &[f32] {
        self.angles
    }
}

impl Drop for AngleProbe<'_> {
    fn drop(&mut self) {
        self.angles[self.index] = self.original;
    }
}

/// Solver configuration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolverConfigError {
    #[error("delta_gradient must be non-zero")]
    ZeroDeltaGradient,
    #[error("slowdown_threshold ({slowdown}) must be greater than stop_threshold ({stop})")]
    ThresholdOrder { stop: f32, slowdown: f32 },
    #[error("stop_threshold must not be negative (got {0})")]
    NegativeStopThreshold(f32),
    #[error("{0} must be finite")]
    NonFinite(&'static str),
}
