//! Terminal prompts and summaries.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Result};
use manip_tasks::{parse_answer, AbortReason, QueueOutcome, QueueState};
use manip_valve::{PlanArtifact, SimulatedRobot, ValveQueue, ValveSession};
use owo_colors::OwoColorize;

/// Confirmation callback reading `y`/`n` answers from stdin.
///
/// A closed or unreadable stdin declines.
pub fn stdin_confirm() -> impl FnMut(&str) -> bool {
    |prompt: &str| {
        print!("{} {} ", prompt.bold(), "[y/N]:".dimmed());
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut input = String::new();
        match io::stdin().lock().read_line(&mut input) {
            Ok(0) | Err(_) => false,
            Ok(_) => parse_answer(&input),
        }
    }
}

fn print_plans(session: &ValveSession<SimulatedRobot>) {
    for plan in session.plans().as_slice() {
        let (x, y, yaw) = plan.end_pose().base_xy_yaw();
        println!(
            "  {:>3}  {:<12} {:>4} knots  {:>6.2}s  base ({x:+.2}, {y:+.2}, {:+.0}°)",
            plan.id,
            plan.label.cyan(),
            plan.knots,
            plan.duration.as_secs_f64(),
            yaw.to_degrees(),
        );
    }
}

/// Prints the outcome of an autonomous run.
pub fn print_run_summary(queue: &ValveQueue<SimulatedRobot>, session: &ValveSession<SimulatedRobot>) {
    println!();
    println!("{}", "Autonomous run".bold().underline());
    match queue.outcome() {
        Some(QueueOutcome::Completed) => println!("  {}", "completed".green().bold()),
        Some(QueueOutcome::Aborted(AbortReason::UserDeclined { prompt })) => {
            println!("  {} at \"{prompt}\"", "declined".yellow().bold());
        }
        Some(QueueOutcome::Aborted(AbortReason::StopRequested)) => {
            println!("  {}", "stopped".yellow().bold());
        }
        Some(QueueOutcome::Failed { task, error }) => {
            println!("  {} in {}: {error}", "failed".red().bold(), task.bold());
        }
        None => println!("  {}", queue.state()),
    }
    println!("  tasks done: {}", queue.completed().len());

    let robot = session.robot();
    println!(
        "  plans: {}  committed: {}  previewed: {}",
        session.plans().len(),
        robot.committed().len(),
        robot.previewed().len(),
    );
    println!("  scribe angle: {:.1}°", session.config().scribe_angle_deg);
    print_plans(session);
}

/// Prints the plans of an offline sequence.
pub fn print_plan_summary(session: &ValveSession<SimulatedRobot>) {
    println!();
    println!("{}", "Offline sequence".bold().underline());
    println!(
        "  {} plans, {} played back",
        session.plans().len(),
        session.robot().played_back()
    );
    print_plans(session);
}

/// Maps the final queue state to the process result.
pub fn exit_status(state: QueueState) -> Result<()> {
    match state {
        QueueState::Completed => Ok(()),
        QueueState::Aborted => bail!("Run aborted by the operator"),
        other => bail!("Run ended {other}"),
    }
}
