//! Command line driver for rk-ik
//!
//! Loads a rig (or uses the built-in planar arm), drives it towards a
//! destination for a number of ticks and logs the result.
//!
//! ```text
//! rk-ik-cli [--rig FILE] [--ticks N] [--save FILE] [--two-link] X Y Z
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use glam::Vec3;
use rk_ik::{
    ChainConfig, DebugLine, IkConfig, Joint, JointConfig, Pose, SolveStatus, SolverConfig,
    TwoLinkSolver, TwoLinkVariant,
};

const DEFAULT_TICKS: usize = 200;

#[derive(Debug)]
struct Args {
    rig: Option<PathBuf>,
    save: Option<PathBuf>,
    ticks: usize,
    two_link: bool,
    destination: Vec3,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut rig = None;
    let mut save = None;
    let mut ticks = DEFAULT_TICKS;
    let mut two_link = false;
    let mut coords = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--rig" => rig = Some(PathBuf::from(args.next().ok_or("--rig needs a path")?)),
            "--save" => save = Some(PathBuf::from(args.next().ok_or("--save needs a path")?)),
            "--ticks" => {
                let value = args.next().ok_or("--ticks needs a number")?;
                ticks = value
                    .parse()
                    .map_err(|_| format!("Invalid tick count '{value}'"))?;
            }
            "--two-link" => two_link = true,
            other => {
                let value: f32 = other
                    .parse()
                    .map_err(|_| format!("Unexpected argument '{other}'"))?;
                coords.push(value);
            }
        }
    }

    let [x, y, z] = coords[..] else {
        return Err(format!(
            "Expected destination X Y Z, got {} value(s)",
            coords.len()
        ));
    };

    Ok(Args {
        rig,
        save,
        ticks,
        two_link,
        destination: Vec3::new(x, y, z),
    })
}

/// Three unit links in the XY plane
fn demo_rig() -> IkConfig {
    let joints = ["shoulder", "elbow", "wrist"]
        .iter()
        .map(|name| JointConfig {
            name: name.to_string(),
            axis: Vec3::Z,
            offset: Vec3::new(1.0, 0.0, 0.0),
            min_angle: -150.0,
            max_angle: 150.0,
            angle: 20.0,
        })
        .collect();

    let mut config = IkConfig::new(
        "planar-arm",
        ChainConfig {
            base: Pose::IDENTITY,
            joints,
        },
    );
    config.solver = SolverConfig::default()
        .with_learning_rate(400.0)
        .with_thresholds(0.05, 0.1);
    config
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.rig {
        Some(path) => IkConfig::load(path)?,
        None => demo_rig(),
    };
    if let Some(path) = &args.save {
        config.save(path)?;
    }

    let mut controller = config.build_controller()?;
    tracing::info!(
        "Rig '{}': {} joints, reach {:.3}",
        config.name,
        controller.chain().len(),
        controller.chain().reach()
    );

    let mut sink = |index: usize, joint: &Joint| {
        tracing::debug!("{} [{}] -> {:.3} deg", joint.name(), index, joint.angle());
    };
    let mut draw = |from: Vec3, to: Vec3, kind: DebugLine| {
        tracing::trace!("{:?}: {} -> {}", kind, from, to);
    };

    let mut last = None;
    for tick in 0..args.ticks {
        let report = controller.tick(args.destination, &mut sink, Some(&mut draw));
        last = Some(report);
        if report.solve.is_converged() {
            tracing::info!("Converged after {} tick(s)", tick + 1);
            break;
        }
        if report.solve.status == SolveStatus::Rejected {
            tracing::warn!("Destination {} is not finite", args.destination);
            break;
        }
    }

    if let Some(report) = last {
        tracing::info!(
            "Target {} error {:.4} ({:?})",
            report.target,
            report.solve.final_error,
            report.solve.status
        );
    }
    tracing::info!("Angles: {:?}", controller.chain().solution());
    tracing::info!("Effector: {}", controller.chain().effector().position);

    if args.two_link {
        compare_two_link(&config, args.destination)?;
    }

    Ok(())
}

/// Log the closed-form answer for the first two links at their rest pose
fn compare_two_link(
    config: &IkConfig,
    destination: Vec3,
) -> Result<(), Box<dyn std::error::Error>> {
    let chain = config.build_chain()?;
    let rest = chain.joint_positions(&vec![0.0; chain.len()]);
    let [root, mid, end, ..] = rest[..] else {
        tracing::warn!("Two-link comparison needs at least three joints");
        return Ok(());
    };

    let solver = TwoLinkSolver::from_points(root, mid, end)?;
    for variant in [TwoLinkVariant::Planar, TwoLinkVariant::Spatial] {
        let result = solver.solve(root, destination, variant);
        tracing::info!(
            "Two-link {:?}: azimuth {:.3} angle0 {:.3} angle1 {:.3} reachable {}",
            variant,
            result.angle_azimuth,
            result.angle0,
            result.angle1,
            result.reachable
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rk_ik=debug,rk_ik_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("usage: rk-ik-cli [--rig FILE] [--ticks N] [--save FILE] [--two-link] X Y Z");
            return ExitCode::FAILURE;
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
