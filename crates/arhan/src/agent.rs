use anyhow::Result;
use tracing::{debug, info, warn};

use crate::confirm::ConfirmationGate;
use crate::dispatch::ToolDispatcher;
use crate::history::ConversationStore;
use crate::interface::{AgentEvent, Interface};
use crate::models::message::Message;
use crate::models::role::Role;
use crate::models::tool::Tool;
use crate::narration::{KeywordNarrationDetector, NarrationPolicy, CORRECTIVE_PROMPT};
use crate::prompt_template::system_prompt;
use crate::providers::base::Provider;
use crate::providers::errors::ProviderError;
use crate::stream::StreamAccumulator;
use crate::tools::{tools, ToolExecutor};

pub const DEFAULT_MAX_ITERATIONS: usize = 20;

/// Settings fixed for the lifetime of an agent
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub model: String,
    /// Run side-effecting tools without asking
    pub auto_approve: bool,
    /// Upper bound on model turns per `run`; must be positive
    pub max_iterations: usize,
}

impl AgentConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            auto_approve: false,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// How a `run` ended
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The model answered without asking for more tools
    Completed { iterations: usize },
    /// The iteration limit was reached while the model still had work to do
    BudgetExhausted { iterations: usize },
    /// A model turn failed; the error has already been rendered
    Failed {
        iterations: usize,
        error: ProviderError,
    },
}

enum Step {
    Continue,
    Complete,
    Failed(ProviderError),
}

/// Agent drives a model through a bounded loop of turns, running the tools it asks
/// for and keeping the conversation on disk
pub struct Agent {
    config: AgentConfig,
    provider: Box<dyn Provider>,
    executor: Box<dyn ToolExecutor>,
    gate: ConfirmationGate,
    narration: Box<dyn NarrationPolicy>,
    store: ConversationStore,
    tools: Vec<Tool>,
}

impl Agent {
    pub fn new(
        config: AgentConfig,
        provider: Box<dyn Provider>,
        executor: Box<dyn ToolExecutor>,
        store: ConversationStore,
    ) -> Self {
        Self {
            gate: ConfirmationGate::new(config.auto_approve),
            config,
            provider,
            executor,
            narration: Box::new(KeywordNarrationDetector::default()),
            store,
            tools: tools(),
        }
    }

    /// Replace the check for replies that narrate tool usage
    pub fn with_narration_policy(mut self, policy: Box<dyn NarrationPolicy>) -> Self {
        self.narration = policy;
        self
    }

    /// Make sure the conversation opens with the system prompt
    pub fn initialize(&mut self) -> Result<()> {
        let seeded = self
            .store
            .messages()
            .first()
            .is_some_and(|m| m.role == Role::System);

        if !seeded {
            let prompt = system_prompt(&self.tools)?;
            self.store.prepend(Message::system().with_text(prompt));
        }
        Ok(())
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn messages(&self) -> &[Message] {
        self.store.messages()
    }

    /// Forget the conversation, on disk too, and start again from the system prompt
    pub fn clear_history(&mut self) -> Result<()> {
        self.store.clear()?;
        self.initialize()
    }

    /// Work on one user message until the model is done, a turn fails, or the
    /// iteration budget runs out.
    pub async fn run(&mut self, user_message: &str, interface: &mut dyn Interface) -> RunOutcome {
        self.store
            .add_message(Message::user().with_text(user_message));

        let max_iterations = self.config.max_iterations;
        let mut iterations = 0;

        while iterations < max_iterations {
            iterations += 1;
            debug!(iteration = iterations, max_iterations, "starting model turn");

            let step = self.iterate(interface).await;
            self.persist(interface);

            match step {
                Step::Continue => {}
                Step::Complete => return RunOutcome::Completed { iterations },
                Step::Failed(error) => return RunOutcome::Failed { iterations, error },
            }
        }

        info!(max_iterations, "iteration budget exhausted");
        interface.render(AgentEvent::BudgetExhausted { max_iterations });
        RunOutcome::BudgetExhausted { iterations }
    }

    async fn iterate(&mut self, interface: &mut dyn Interface) -> Step {
        interface.render(AgentEvent::Thinking);

        let response = match self
            .provider
            .stream(&self.config.model, self.store.messages(), &self.tools)
            .await
        {
            Ok(rx) => StreamAccumulator::new().consume(rx, interface).await,
            Err(e) => Err(e),
        };

        let message = match response {
            Ok(response) => response.into_message(),
            Err(error) => {
                warn!(%error, "model turn failed");
                interface.render(AgentEvent::Error(&error));
                return Step::Failed(error);
            }
        };

        let tool_calls = message.tool_calls.clone();
        let narrating = tool_calls.is_empty() && self.narration.is_narrating(&message.content);
        self.store.add_message(message);

        if !tool_calls.is_empty() {
            let dispatcher = ToolDispatcher::new(self.executor.as_ref(), &self.gate);
            for call in &tool_calls {
                dispatcher.dispatch(call, &mut self.store, interface).await;
            }
            return Step::Continue;
        }

        if narrating {
            debug!("model narrated a tool call, nudging it to call the tool");
            interface.render(AgentEvent::NarrationDetected);
            self.store
                .add_message(Message::user().with_text(CORRECTIVE_PROMPT));
            return Step::Continue;
        }

        Step::Complete
    }

    fn persist(&self, interface: &mut dyn Interface) {
        if let Err(e) = self.store.save() {
            warn!(error = %e, "failed to save conversation history");
            interface.render(AgentEvent::Warning(&format!(
                "Could not save conversation history: {:#}",
                e
            )));
        }
    }
}
