use anyhow::Result;
use arhan::agent::{Agent, RunOutcome};
use tracing::info;

use crate::prompt::rustyline::RustylinePrompt;
use crate::prompt::InputType;
use crate::ui;

/// How a session ended
#[derive(Debug, PartialEq)]
pub enum SessionEnd {
    Finished,
    Interrupted,
}

pub struct Session {
    agent: Agent,
    prompt: RustylinePrompt,
}

impl Session {
    pub fn new(agent: Agent, prompt: RustylinePrompt) -> Self {
        Session { agent, prompt }
    }

    /// Keep asking for tasks until the user leaves
    pub async fn start(&mut self) -> Result<SessionEnd> {
        loop {
            let input = self.prompt.get_input()?;
            match input.input_type {
                InputType::Exit => break,
                InputType::Clear => {
                    self.agent.clear_history()?;
                    self.prompt.say(&ui::history_cleared());
                }
                InputType::Message => {
                    if let Some(task) = input.content {
                        // A failed run is already reported; the user can try again
                        if self.run_task(&task).await.is_none() {
                            return Ok(SessionEnd::Interrupted);
                        }
                    }
                }
            }
        }

        self.prompt.say(&ui::goodbye());
        Ok(SessionEnd::Finished)
    }

    /// Run a single task and stop
    pub async fn headless_start(&mut self, task: &str) -> Result<SessionEnd> {
        match self.run_task(task).await {
            Some(_) => Ok(SessionEnd::Finished),
            None => Ok(SessionEnd::Interrupted),
        }
    }

    /// `None` when the user interrupted the run
    async fn run_task(&mut self, task: &str) -> Option<RunOutcome> {
        self.prompt.say(&ui::task_start(task));

        let outcome = tokio::select! {
            outcome = self.agent.run(task, &mut self.prompt) => Some(outcome),
            _ = tokio::signal::ctrl_c() => None,
        };

        match &outcome {
            Some(RunOutcome::Completed { iterations }) => {
                info!(iterations, "task completed");
                self.prompt.say(&ui::complete());
            }
            Some(RunOutcome::BudgetExhausted { iterations }) => {
                info!(iterations, "task stopped at the iteration limit");
            }
            Some(RunOutcome::Failed { iterations, error }) => {
                info!(iterations, %error, "task failed");
            }
            None => {
                // The turn in flight is dropped; earlier turns are already saved
                info!("task interrupted");
                self.prompt.say(&ui::goodbye());
            }
        }
        outcome
    }
}
