//! Rig description files
//!
//! An [`IkConfig`] describes a chain, its solver tuning and controller
//! settings. It is stored as RON and validated when the runtime objects are
//! built from it, never during a solve.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::chain::{Chain, ChainError};
use crate::constants::{DEFAULT_MAX_ANGLE, DEFAULT_MIN_ANGLE};
use crate::controller::{ControllerConfig, IkController};
use crate::joint::Joint;
use crate::pose::Pose;
use crate::solver::{GradientSolver, SolverConfig, SolverConfigError};

/// Serialized form of a joint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointConfig {
    pub name: String,
    #[serde(default = "default_axis")]
    pub axis: Vec3,
    #[serde(default)]
    pub offset: Vec3,
    #[serde(default = "default_min_angle")]
    pub min_angle: f32,
    #[serde(default = "default_max_angle")]
    pub max_angle: f32,
    /// Initial angle (degrees)
    #[serde(default)]
    pub angle: f32,
}

fn default_axis() -> Vec3 {
    Vec3::Z
}

fn default_min_angle() -> f32 {
    DEFAULT_MIN_ANGLE
}

fn default_max_angle() -> f32 {
    DEFAULT_MAX_ANGLE
}

impl JointConfig {
    pub fn build(&self) -> Result<Joint, ChainError> {
        Joint::builder(self.name.clone())
            .axis(self.axis)
            .offset(self.offset)
            .limits(self.min_angle, self.max_angle)
            .angle(self.angle)
            .build()
    }
}

impl From<&Joint> for JointConfig {
    fn from(joint: &Joint) -> Self {
        Self {
            name: joint.name().to_string(),
            axis: joint.axis(),
            offset: joint.offset(),
            min_angle: joint.min_angle(),
            max_angle: joint.max_angle(),
            angle: joint.angle(),
        }
    }
}

/// Serialized form of a chain
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(default)]
    pub base: Pose,
    pub joints: Vec<JointConfig>,
}

impl ChainConfig {
    pub fn build(&self) -> Result<Chain, ChainError> {
        let joints = self
            .joints
            .iter()
            .map(JointConfig::build)
            .collect::<Result<Vec<_>, _>>()?;
        Chain::new(self.base, joints)
    }
}

impl From<&Chain> for ChainConfig {
    fn from(chain: &Chain) -> Self {
        Self {
            base: chain.base(),
            joints: chain.joints().iter().map(JointConfig::from).collect(),
        }
    }
}

/// Complete rig description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IkConfig {
    pub name: String,
    pub chain: ChainConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
}

impl IkConfig {
    pub fn new(name: impl Into<String>, chain: ChainConfig) -> Self {
        Self {
            name: name.into(),
            chain,
            solver: SolverConfig::default(),
            controller: ControllerConfig::default(),
        }
    }

    /// Save the rig to a RON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = self.to_ron_string()?;
        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))?;
        tracing::info!("Saved rig '{}' to {}", self.name, path.display());
        Ok(())
    }

    /// Load a rig from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config = Self::from_ron_str(&content)?;
        tracing::info!(
            "Loaded rig '{}' ({} joints) from {}",
            config.name,
            config.chain.joints.len(),
            path.display()
        );
        Ok(config)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        ron::from_str(content).map_err(|e| ConfigError::Deserialize(e.to_string()))
    }

    pub fn build_chain(&self) -> Result<Chain, ConfigError> {
        Ok(self.chain.build()?)
    }

    pub fn build_solver(&self) -> Result<GradientSolver, ConfigError> {
        Ok(GradientSolver::new(self.solver)?)
    }

    /// Build a ready-to-tick controller, validating chain and solver settings
    pub fn build_controller(&self) -> Result<IkController, ConfigError> {
        let chain = self.build_chain()?;
        let solver = self.build_solver()?;
        Ok(IkController::new(chain, solver, self.controller))
    }
}

/// Rig file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
    #[error("Invalid chain: {0}")]
    Chain(#[from] ChainError),
    #[error("Invalid solver settings: {0}")]
    Solver(#[from] SolverConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arm() -> IkConfig {
        let joints = (0..3)
            .map(|i| JointConfig {
                name: format!("link{i}"),
                axis: Vec3::Z,
                offset: Vec3::new(1.0, 0.0, 0.0),
                min_angle: -90.0,
                max_angle: 90.0,
                angle: 0.0,
            })
            .collect();
        IkConfig::new(
            "arm",
            ChainConfig {
                base: Pose::default(),
                joints,
            },
        )
    }

    #[test]
    fn test_save_load_file() {
        let config = arm();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arm.ron");
        config.save(&path).unwrap();

        let loaded = IkConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = IkConfig::load(dir.path().join("missing.ron"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = IkConfig::from_ron_str(
            r#"(
                name: "minimal",
                chain: (
                    joints: [
                        (name: "a", offset: (1.0, 0.0, 0.0)),
                        (name: "b", offset: (1.0, 0.0, 0.0), min_angle: -45.0, max_angle: 45.0),
                    ],
                ),
            )"#,
        )
        .unwrap();

        assert_eq!(config.solver, SolverConfig::default());
        assert_eq!(config.controller, ControllerConfig::default());
        assert_eq!(config.chain.base, Pose::IDENTITY);
        assert_eq!(config.chain.joints[0].axis, Vec3::Z);
        assert_eq!(config.chain.joints[0].min_angle, DEFAULT_MIN_ANGLE);

        let chain = config.build_chain().unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.joints()[1].max_angle(), 45.0);
    }

    #[test]
    fn test_malformed_ron() {
        let result = IkConfig::from_ron_str("(name: \"broken\", chain: ");
        assert!(matches!(result, Err(ConfigError::Deserialize(_))));
    }

    #[test]
    fn test_invalid_chain_surfaces_at_build() {
        let mut config = arm();
        config.chain.joints[1].min_angle = 100.0;
        assert!(matches!(
            config.build_controller(),
            Err(ConfigError::Chain(ChainError::InvalidLimits { .. }))
        ));

        config.chain.joints.clear();
        assert!(matches!(
            config.build_chain(),
            Err(ConfigError::Chain(ChainError::EmptyChain))
        ));
    }

    #[test]
    fn test_invalid_solver_surfaces_at_build() {
        let mut config = arm();
        config.solver.delta_gradient = 0.0;
        assert!(matches!(
            config.build_controller(),
            Err(ConfigError::Solver(SolverConfigError::ZeroDeltaGradient))
        ));
    }

    #[test]
    fn test_chain_config_from_chain() {
        let mut config = arm();
        config.chain.joints[0].angle = 20.0;
        let chain = config.build_chain().unwrap();
        let back = ChainConfig::from(&chain);
        assert_eq!(back, config.chain);
    }

    #[test]
    fn test_demo_rig_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/planar_arm.ron");
        let config = IkConfig::load(path).unwrap();
        assert_eq!(config.name, "planar-arm");
        assert!(config.controller.debug_draw);

        let ctrl = config.build_controller().unwrap();
        assert_eq!(ctrl.chain().solution(), &[20.0, 30.0, 0.0]);
        assert!((ctrl.chain().reach() - 1.8).abs() < 1e-6);
    }

    #[test]
    fn test_build_controller() {
        let mut config = arm();
        config.controller.standoff = 0.25;
        let ctrl = config.build_controller().unwrap();
        assert_eq!(ctrl.config().standoff, 0.25);
        assert_eq!(ctrl.chain().len(), 3);
    }
}
