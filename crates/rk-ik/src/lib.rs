//! Inverse kinematics for articulated joint chains
//!
//! This crate provides:
//! - Joint: a single rotational degree of freedom with angular limits
//! - Chain: ordered joints on a base pose, with forward kinematics
//! - ErrorMetric: pluggable scalar error between effector and target
//! - GradientSolver: finite-difference coordinate descent over the chain
//! - TwoLinkSolver: closed-form planar and spatial two-link solutions
//! - IkController: per-tick driver that hands solved angles to a scene layer
//! - IkConfig: serializable rig description (RON)

pub mod analytic;
pub mod chain;
pub mod config;
pub mod constants;
pub mod controller;
pub mod joint;
pub mod metric;
pub mod pose;
pub mod solver;

pub use analytic::{IkResult, TwoLinkError, TwoLinkSolver, TwoLinkVariant, solve_two_link};
pub use chain::{Chain, ChainBuilder, ChainError, forward};
pub use config::{ChainConfig, ConfigError, IkConfig, JointConfig};
pub use constants::*;
pub use controller::{ControllerConfig, DebugDraw, DebugLine, IkController, JointSink, TickReport};
pub use joint::{Joint, JointBuilder};
pub use metric::{DistanceMetric, ErrorMetric, PoseMetric};
pub use pose::Pose;
pub use solver::{GradientSolver, SolveReport, SolveStatus, SolverConfig, SolverConfigError};
