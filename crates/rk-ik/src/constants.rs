//! Global constants for rk-ik

/// Finite-difference step used to estimate the gradient (degrees)
pub const DEFAULT_DELTA_GRADIENT: f32 = 0.1;

/// Multiplier applied to the gradient on each joint update
pub const DEFAULT_LEARNING_RATE: f32 = 0.1;

/// Error at or below which a pose is accepted
pub const DEFAULT_STOP_THRESHOLD: f32 = 0.1;

/// Error at or above which the full step size applies
pub const DEFAULT_SLOWDOWN_THRESHOLD: f32 = 0.25;

/// Default lower joint limit (degrees)
pub const DEFAULT_MIN_ANGLE: f32 = -180.0;

/// Default upper joint limit (degrees)
pub const DEFAULT_MAX_ANGLE: f32 = 180.0;

/// Lengths below this are treated as zero by the analytic solver
pub const DEGENERATE_LENGTH_EPSILON: f32 = 1e-6;
