//! Task sequences for the grasp-and-turn routine.
//!
//! [`autonomous_queue`] builds the supervised run: fit the object, walk to
//! the stance, refit, raise the arm and turn several times. Every motion is
//! planned just before it runs, so later phases see the state left by
//! earlier ones. [`execute_turn_queue`] runs a single turn cycle on its own.
//! [`ValveSession::plan_sequence`] plans the same routine
//! offline in one call and plays it back.

use manip_tasks::{PromptLevel, PromptPolicy, Task, TaskQueue};
use manip_types::Hand;
use tracing::info;

use crate::adapter::{ControllerStatus, Robot};
use crate::error::{Result, ValveError};
use crate::session::{Animation, ValveSession};

/// A task over a session.
pub type ValveTask<R> = Task<ValveSession<R>, ValveError>;

/// A task queue over a session.
pub type ValveQueue<R> = TaskQueue<ValveSession<R>, ValveError>;

/// Parameters of the autonomous run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutonomousPlan {
    /// Grasping hand.
    pub hand: Hand,
    /// Scribe angle at the start of every turn cycle, in degrees.
    pub scribe_angle_deg: f64,
    /// Turn per cycle, in degrees.
    pub turn_angle_deg: f64,
    /// Number of turn cycles.
    pub turns: usize,
    /// Expected object radius passed to the fitter, in meters.
    pub fit_radius: f64,
    /// Sensor sweeps to wait for before each fit.
    pub sweeps: u64,
    /// Preview instead of executing.
    pub vis_only: bool,
}

impl Default for AutonomousPlan {
    fn default() -> Self {
        Self {
            hand: Hand::Right,
            scribe_angle_deg: 45.0,
            turn_angle_deg: 70.0,
            turns: 3,
            fit_radius: 0.23,
            sweeps: 2,
            vis_only: false,
        }
    }
}

impl AutonomousPlan {
    /// Sets the number of turn cycles.
    #[must_use]
    pub const fn with_turns(mut self, turns: usize) -> Self {
        self.turns = turns;
        self
    }

    /// Sets the grasping hand.
    #[must_use]
    pub const fn with_hand(mut self, hand: Hand) -> Self {
        self.hand = hand;
        self
    }

    /// Sets preview-only mode.
    #[must_use]
    pub const fn with_vis_only(mut self, vis_only: bool) -> Self {
        self.vis_only = vis_only;
        self
    }
}

fn action<R, F>(name: &str, f: F) -> ValveTask<R>
where
    R: Robot + 'static,
    F: FnMut(&mut ValveSession<R>) -> Result<()> + 'static,
{
    Task::action(name, f)
}

fn optional_prompt<R: Robot + 'static>(prompt: &str) -> ValveTask<R> {
    Task::confirm(prompt, PromptLevel::Optional)
}

/// Waits until the controller enters `status` and then leaves it.
#[must_use]
pub fn wait_for_controller<R: Robot + 'static>(status: ControllerStatus) -> ValveTask<R> {
    Task::sequence(
        format!("wait for {status}"),
        vec![
            Task::wait_until(format!("{status} started"), move |s: &mut ValveSession<R>| {
                s.controller_status() == status
            }),
            Task::wait_until(format!("{status} finished"), move |s: &mut ValveSession<R>| {
                s.controller_status() != status
            }),
        ],
    )
}

/// Waits for `sweeps` more sensor sweeps, counted from when the task starts.
#[must_use]
pub fn wait_for_sweeps<R: Robot + 'static>(sweeps: u64) -> ValveTask<R> {
    Task::expand("wait for sweep", move |s: &mut ValveSession<R>| {
        let target = s.sweep_count() + sweeps;
        Ok(vec![Task::wait_until("clean sweep", move |s: &mut ValveSession<R>| {
            s.sweep_count() >= target
        })])
    })
}

/// Previews or executes the most recent plan and waits until it is done.
#[must_use]
pub fn animate_last_plan<R: Robot + 'static>() -> ValveTask<R> {
    Task::expand("animate last plan", |s: &mut ValveSession<R>| {
        Ok(match s.animate_last_plan()? {
            Animation::Preview(duration) => vec![Task::delay("plan animation", duration)],
            Animation::Committed(_) => vec![wait_for_controller(ControllerStatus::Manipulating)],
        })
    })
}

fn fit_and_find<R: Robot + 'static>(plan: &AutonomousPlan, prompt: &str) -> Vec<ValveTask<R>> {
    let radius = plan.fit_radius;
    vec![
        wait_for_sweeps(plan.sweeps),
        action("fit affordance", move |s| s.fit_affordance(radius)),
        optional_prompt(prompt),
        action("find affordance", |s| s.find_affordance().map(drop)),
    ]
}

/// Approaches the stance, walking or teleporting per the session options.
#[must_use]
pub fn approach<R: Robot + 'static>() -> ValveTask<R> {
    Task::expand("approach stance", |s: &mut ValveSession<R>| {
        if !s.options().use_footstep_planner {
            s.move_to_stance()?;
            return Ok(Vec::new());
        }
        s.plan_footsteps_to_stance()?;
        Ok(vec![
            optional_prompt("Send footstep plan, continue?"),
            action("commit footsteps", |s| s.commit_footsteps()),
            wait_for_controller(ControllerStatus::Walking),
        ])
    })
}

/// One reach, grasp, turn and release cycle.
///
/// Both angles are fixed when the cycle is built. Rediscovering the object
/// resets the configured defaults, but not these.
#[must_use]
pub fn turn_cycle<R: Robot + 'static>(scribe_angle_deg: f64, turn_angle_deg: f64) -> Vec<ValveTask<R>> {
    vec![
        action("set scribe angle", move |s| {
            s.set_scribe_angle(scribe_angle_deg);
            Ok(())
        }),
        action("plan reach", |s| s.plan_reach().map(drop)),
        optional_prompt("Reach, continue?"),
        animate_last_plan(),
        action("plan grasp", |s| s.plan_grasp().map(drop)),
        optional_prompt("Grasp, continue?"),
        animate_last_plan(),
        action("close hand", ValveSession::close_hand),
        action("plan turn", move |s| s.plan_turn(turn_angle_deg).map(drop)),
        optional_prompt("Turn, continue?"),
        animate_last_plan(),
        action("open hand", ValveSession::open_hand),
        action("plan dereach", |s| s.plan_reach().map(drop)),
        optional_prompt("Dereach, continue?"),
        animate_last_plan(),
    ]
}

fn configure<R: Robot + 'static>(plan: &AutonomousPlan) -> ValveTask<R> {
    let setup = *plan;
    action("configure session", move |s| {
        let config = s.config().clone().with_hand(setup.hand);
        s.set_config(config)?;
        let options = s.options_mut();
        options.plan_from_current_state = true;
        options.vis_only = setup.vis_only;
        s.reset_turn_path();
        Ok(())
    })
}

/// Tasks of the autonomous run.
#[must_use]
pub fn autonomous_tasks<R: Robot + 'static>(plan: &AutonomousPlan) -> Vec<ValveTask<R>> {
    let mut tasks = vec![
        configure(plan),
        Task::sequence("fit", fit_and_find(plan, "Accept valve fit, continue?")),
        approach(),
        Task::sequence("refit", fit_and_find(plan, "Accept valve re-fit, continue?")),
        Task::sequence(
            "pregrasp",
            vec![
                action("plan pregrasp", |s| s.plan_pregrasp().map(drop)),
                optional_prompt("Pregrasp, continue?"),
                animate_last_plan(),
            ],
        ),
    ];

    for i in 1..=plan.turns {
        tasks.push(Task::sequence(
            format!("turn {i}"),
            turn_cycle(plan.scribe_angle_deg, plan.turn_angle_deg),
        ));
    }
    tasks.push(action("done", |s| {
        info!(plans = s.plans().len(), "Autonomous run finished");
        Ok(())
    }));
    tasks
}

/// Queue for the autonomous run.
///
/// # Errors
///
/// Never fails for a fresh queue; the result mirrors
/// [`TaskQueue::extend`].
pub fn autonomous_queue<R: Robot + 'static>(
    plan: &AutonomousPlan,
    policy: PromptPolicy,
) -> manip_tasks::Result<ValveQueue<R>> {
    let mut queue = TaskQueue::new(policy);
    queue.extend(autonomous_tasks(plan))?;
    Ok(queue)
}

/// Tasks of a single turn from where the hand already is.
///
/// No sweep wait, fit or walk: the object must already be registered with
/// the robot and the robot standing in reach of it. The registered object
/// is looked up again because configuring the hand drops earlier frames.
#[must_use]
pub fn execute_turn_tasks<R: Robot + 'static>(plan: &AutonomousPlan) -> Vec<ValveTask<R>> {
    vec![
        configure(plan),
        action("find affordance", |s| s.find_affordance().map(drop)),
        Task::sequence("turn", turn_cycle(plan.scribe_angle_deg, plan.turn_angle_deg)),
        action("done", |s| {
            info!(scribe_angle = s.config().scribe_angle_deg, "Turn executed");
            Ok(())
        }),
    ]
}

/// Queue that plans and executes one turn cycle without confirmation gates.
///
/// # Errors
///
/// Never fails for a fresh queue; the result mirrors
/// [`TaskQueue::extend`].
pub fn execute_turn_queue<R: Robot + 'static>(plan: &AutonomousPlan) -> manip_tasks::Result<ValveQueue<R>> {
    let mut queue = TaskQueue::new(PromptPolicy::unattended());
    queue.extend(execute_turn_tasks(plan))?;
    Ok(queue)
}

impl<R: Robot> ValveSession<R> {
    /// Plans the whole routine offline and plays it back.
    ///
    /// Each plan starts where the previous one ends. The footstep planner
    /// is used when enabled; otherwise the robot is placed on the stance.
    ///
    /// # Errors
    ///
    /// Stops at the first failing step; plans recorded before it are kept.
    pub fn plan_sequence(&mut self) -> Result<()> {
        self.clear_footsteps();
        self.reset_turn_path();
        self.options_mut().plan_from_current_state = false;
        self.find_affordance()?;
        self.clear_plans();

        if self.options().use_footstep_planner {
            self.plan_footsteps_to_stance()?;
            self.plan_walking()?;
        } else {
            self.move_to_stance()?;
        }

        self.plan_pregrasp()?;
        self.plan_reach()?;
        self.plan_grasp()?;
        let turn = self.config().turn_angle_deg;
        self.plan_turn(turn)?;

        self.plan_reach()?;
        self.plan_pregrasp()?;
        self.plan_nominal()?;
        self.play_sequence()
    }
}
