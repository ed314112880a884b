//! Valve and lever turning on a humanoid robot.
//!
//! This crate ties the geometry of `manip-geometry` and the task queue of
//! `manip-tasks` to a robot:
//!
//! - [`adapter`]: traits for the external planners, drivers and state
//!   estimation, bundled as [`Robot`]
//! - [`ValveSession`]: the single writer of the grasp configuration and plan
//!   history; every planning call derives frames, submits one request and
//!   records the plan
//! - [`sequence`]: the autonomous queue and the offline plan sequence
//! - [`sim`]: an in-process robot for demos and tests
//!
//! # Example
//!
//! ```
//! use manip_tasks::{ManualClock, PromptPolicy, QueueState, Scheduler};
//! use manip_types::{GraspConfig, Hand, ObjectKind};
//! use manip_valve::{autonomous_queue, AutonomousPlan, SessionOptions, SimulatedRobot, ValveSession};
//!
//! let robot = SimulatedRobot::new(ObjectKind::Valve).unwrap();
//! let config = GraspConfig::new(Hand::Right, ObjectKind::Valve);
//! let mut session = ValveSession::new(robot, config, SessionOptions::live()).unwrap();
//!
//! let plan = AutonomousPlan::default().with_turns(1);
//! let mut queue = autonomous_queue(&plan, PromptPolicy::unattended()).unwrap();
//! let state = Scheduler::new(ManualClock::default()).run(&mut queue, &mut session, &mut |_: &str| true);
//!
//! assert_eq!(state, QueueState::Completed);
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod adapter;
pub mod error;
pub mod history;
pub mod sequence;
pub mod session;
pub mod sim;

pub use adapter::{
    AffordanceSource, ControllerStatus, ExecutionHandle, GripMode, GripperCommand, GripperDriver,
    MotionPlanner, NamedPosture, PlanArtifact, Robot, RobotStateSource, SolverInfo,
};
pub use error::{Result, SolverError, ValveError};
pub use history::PlanHistory;
pub use sequence::{
    animate_last_plan, approach, autonomous_queue, autonomous_tasks, execute_turn_queue,
    execute_turn_tasks, turn_cycle, wait_for_controller, wait_for_sweeps, AutonomousPlan,
    ValveQueue, ValveTask,
};
pub use session::{Animation, Discovery, SessionOptions, ValveSession};
pub use sim::{SimFootsteps, SimPlan, SimulatedRobot};
