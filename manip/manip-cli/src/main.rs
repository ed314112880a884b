//! Valve turning demo.
//!
//! Runs the grasp-and-turn routine against the in-process simulated robot.
//!
//! # Commands
//!
//! - `valve-demo run` - Supervised autonomous run with confirmation prompts
//! - `valve-demo plan` - Plan the whole routine offline and play it back
//!
//! Logging follows `RUST_LOG` when set, `--log-level` otherwise.

mod config;
mod console;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use manip_tasks::{PromptPolicy, Scheduler, SystemClock};
use manip_types::{GraspConfig, Hand, ObjectKind};
use manip_valve::{autonomous_queue, AutonomousPlan, SessionOptions, SimulatedRobot, ValveSession};
use tracing::info;

use crate::config::DemoConfig;

/// Valve and lever turning demo
#[derive(Parser)]
#[command(name = "valve-demo")]
#[command(about = "Grasp and turn a valve with a simulated humanoid", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON file with `grasp` and `session` settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Object placed in the simulated world
    #[arg(long, global = true, default_value = "valve")]
    object: ObjectKind,

    /// Grasping hand (overrides the config file)
    #[arg(long, global = true)]
    hand: Option<Hand>,

    /// Fallback log level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Supervised autonomous run
    Run {
        /// Number of turn cycles
        #[arg(long, default_value_t = 3)]
        turns: usize,

        /// Which confirmation gates ask
        #[arg(long, value_enum, default_value_t = Prompts::Required)]
        prompts: Prompts,

        /// Preview plans instead of executing them (`--vis-only false`
        /// executes even when the config file asks for previews)
        #[arg(long, num_args = 0..=1, default_missing_value = "true")]
        vis_only: Option<bool>,

        /// Scheduler tick interval in milliseconds
        #[arg(long, default_value_t = 100)]
        tick_ms: u64,
    },

    /// Plan the routine offline and play it back
    Plan {
        /// Teleport to the stance instead of planning footsteps
        #[arg(long)]
        no_footsteps: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Prompts {
    /// Every gate asks
    All,
    /// Only safety gates ask
    Required,
    /// Nothing asks
    None,
}

impl From<Prompts> for PromptPolicy {
    fn from(prompts: Prompts) -> Self {
        match prompts {
            Prompts::All => Self::all(),
            Prompts::Required => Self::default(),
            Prompts::None => Self::unattended(),
        }
    }
}

fn init_tracing(log_level: &str) -> Result<()> {
    let fallback = match log_level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {e}"))
}

fn load_settings(cli: &Cli) -> Result<(GraspConfig, SessionOptions)> {
    let mut file = match &cli.config {
        Some(path) => DemoConfig::load(path)?,
        None => DemoConfig::default(),
    };
    if let Commands::Run { vis_only, .. } = cli.command {
        file = file.with_vis_only_flag(vis_only);
    }
    let mut grasp = file.grasp.with_object(cli.object);
    if let Some(hand) = cli.hand {
        grasp = grasp.with_hand(hand);
    }
    Ok((grasp, file.session))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let (grasp, options) = load_settings(&cli)?;
    let robot = SimulatedRobot::new(cli.object).context("Failed to spawn the simulated object")?;

    match cli.command {
        Commands::Run {
            turns,
            prompts,
            tick_ms,
            ..
        } => {
            let vis_only = options.vis_only;
            let plan = AutonomousPlan {
                hand: grasp.hand,
                ..AutonomousPlan::default()
            }
            .with_turns(turns)
            .with_vis_only(vis_only);
            let mut session = ValveSession::new(robot, grasp, options)?;
            let mut queue = autonomous_queue(&plan, prompts.into())?;

            info!(turns, hand = %plan.hand, object = %cli.object, "Starting autonomous run");
            let mut scheduler =
                Scheduler::new(SystemClock).with_tick_interval(Duration::from_millis(tick_ms));
            let mut confirm = console::stdin_confirm();
            let state = scheduler.run(&mut queue, &mut session, &mut confirm);

            console::print_run_summary(&queue, &session);
            console::exit_status(state)
        }
        Commands::Plan { no_footsteps } => {
            let options = options.with_footstep_planner(!no_footsteps);
            let mut session = ValveSession::new(robot, grasp, options)?;
            session.plan_sequence()?;
            console::print_plan_summary(&session);
            Ok(())
        }
    }
}
