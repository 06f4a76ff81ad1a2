use std::str::FromStr;

use anyhow::{anyhow, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::chart::ChartBackend;
use crate::client::{ApiError, SimulationResponse};
use crate::controller::{PendingRun, RunOutcome, SimulationController};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Slider movement without release.
    Drag(String),
    /// Slider released at a value.
    Threshold(String),
    CostFn(String),
    CostFp(String),
    Run,
    Show,
    Quit,
}

impl FromStr for SessionCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut parts = line.trim().splitn(2, char::is_whitespace);
        let verb = parts.next().unwrap_or_default().to_ascii_lowercase();
        let arg = parts.next().map(str::trim).unwrap_or_default().to_string();
        let needs_arg = |cmd: fn(String) -> SessionCommand| {
            if arg.is_empty() {
                Err(anyhow!("{verb} needs a value"))
            } else {
                Ok(cmd(arg.clone()))
            }
        };
        match verb.as_str() {
            "drag" => needs_arg(SessionCommand::Drag),
            "threshold" | "t" => needs_arg(SessionCommand::Threshold),
            "cost-fn" | "fn" => needs_arg(SessionCommand::CostFn),
            "cost-fp" | "fp" => needs_arg(SessionCommand::CostFp),
            "run" | "r" => Ok(SessionCommand::Run),
            "show" => Ok(SessionCommand::Show),
            "quit" | "q" | "exit" => Ok(SessionCommand::Quit),
            other => Err(anyhow!("unknown command: {other}")),
        }
    }
}

type Completion = (PendingRun, Result<SimulationResponse, ApiError>);

/// Drives the controller from line commands. Requests run concurrently and
/// complete in arrival order; `render` is called after each applied run and
/// on `show`. Ends on `quit` or, once input closes, when nothing is in flight.
pub async fn run_session<B, R, F>(
    controller: &mut SimulationController<B>,
    input: R,
    mut render: F,
) -> Result<()>
where
    B: ChartBackend,
    R: AsyncBufRead + Unpin,
    F: FnMut(&SimulationController<B>),
{
    let mut lines = input.lines();
    let mut in_flight: JoinSet<Completion> = JoinSet::new();
    let mut input_open = true;

    spawn_run(controller, &mut in_flight);

    loop {
        tokio::select! {
            line = lines.next_line(), if input_open => match line {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => match line.parse::<SessionCommand>() {
                    Ok(SessionCommand::Quit) => break,
                    Ok(command) => {
                        if dispatch(controller, command, &mut in_flight) {
                            render(&*controller);
                        }
                    }
                    Err(err) => warn!("{err}"),
                },
                Ok(None) => input_open = false,
                Err(err) => {
                    warn!("input closed: {err}");
                    input_open = false;
                }
            },
            Some(joined) = in_flight.join_next() => match joined {
                Ok((pending, result)) => {
                    if controller.complete_run(pending, result) == RunOutcome::Applied {
                        render(&*controller);
                    }
                }
                Err(err) => error!("simulation task failed: {err}"),
            },
            else => break,
        }
    }

    if !in_flight.is_empty() {
        info!("abandoning {} in-flight simulation(s)", in_flight.len());
    }
    in_flight.abort_all();
    controller.teardown();
    Ok(())
}

/// Returns true when the command changed something shown without a request.
fn dispatch<B: ChartBackend>(
    controller: &mut SimulationController<B>,
    command: SessionCommand,
    in_flight: &mut JoinSet<Completion>,
) -> bool {
    match command {
        SessionCommand::Drag(raw) => {
            controller.threshold_input(&raw);
            true
        }
        SessionCommand::Threshold(raw) => {
            if controller.threshold_input(&raw) {
                spawn_run(controller, in_flight);
            }
            false
        }
        SessionCommand::CostFn(raw) => {
            controller.set_cost_fn(&raw);
            false
        }
        SessionCommand::CostFp(raw) => {
            controller.set_cost_fp(&raw);
            false
        }
        SessionCommand::Run => {
            spawn_run(controller, in_flight);
            false
        }
        SessionCommand::Show => true,
        SessionCommand::Quit => false,
    }
}

fn spawn_run<B: ChartBackend>(
    controller: &mut SimulationController<B>,
    in_flight: &mut JoinSet<Completion>,
) {
    let pending = controller.begin_run();
    let api = controller.api();
    in_flight.spawn(async move {
        let result = api.simulate(pending.request()).await;
        (pending, result)
    });
}
