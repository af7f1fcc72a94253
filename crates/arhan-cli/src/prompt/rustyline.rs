use std::io::{self, Write};

use anyhow::Result;
use arhan::confirm::ConfirmationRequest;
use arhan::interface::{AgentEvent, Interface};
use cliclack::spinner;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::warn;

use super::{parse_input, Input, InputType};
use crate::ui;

/// Exit status used when the user interrupts with Ctrl+C
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

pub struct RustylinePrompt {
    editor: DefaultEditor,
    spinner: Option<cliclack::ProgressBar>,
    // Streamed text has been printed without a trailing newline
    streaming: bool,
}

impl RustylinePrompt {
    pub fn new() -> Result<Self> {
        Ok(RustylinePrompt {
            editor: DefaultEditor::new()?,
            spinner: None,
            streaming: false,
        })
    }

    pub fn get_input(&mut self) -> Result<Input> {
        match self.editor.readline(&ui::prompt()) {
            Ok(line) => {
                let input = parse_input(&line);
                if input.input_type == InputType::Message {
                    let _ = self.editor.add_history_entry(line.trim());
                }
                Ok(input)
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(Input {
                input_type: InputType::Exit,
                content: None,
            }),
            Err(e) => Err(e.into()),
        }
    }

    pub fn show_busy(&mut self) {
        self.hide_busy();
        let spin = spinner();
        spin.start("Arhan is thinking...");
        self.spinner = Some(spin);
    }

    pub fn hide_busy(&mut self) {
        if let Some(spin) = self.spinner.take() {
            spin.stop("");
        }
    }

    pub fn say(&mut self, text: &str) {
        self.settle();
        println!("{}", text);
    }

    fn settle(&mut self) {
        self.hide_busy();
        if self.streaming {
            println!();
            self.streaming = false;
        }
    }
}

impl Interface for RustylinePrompt {
    fn render(&mut self, event: AgentEvent<'_>) {
        match event {
            AgentEvent::Thinking => self.show_busy(),
            AgentEvent::TextDelta(text) => {
                self.hide_busy();
                print!("{}", text);
                io::stdout().flush().unwrap_or_else(|e| warn!("failed to flush stdout: {}", e));
                self.streaming = true;
            }
            AgentEvent::TextComplete => self.settle(),
            AgentEvent::ToolRequested { args, .. } => self.say(&ui::tool_call_start(args)),
            AgentEvent::ToolCompleted { result, .. } => self.say(&ui::tool_result(result)),
            AgentEvent::ToolCancelled { .. } => self.say(&ui::cancelled()),
            AgentEvent::ToolSkipped { call, error } => {
                self.say(&ui::skipped(&call.name, &error.to_string()))
            }
            AgentEvent::NarrationDetected => self.say(&ui::narration_detected()),
            AgentEvent::Error(error) => {
                self.settle();
                eprintln!("{}", ui::error(&error.to_string()));
            }
            AgentEvent::Warning(message) => {
                self.settle();
                eprintln!("{}", ui::warning(message));
            }
            AgentEvent::BudgetExhausted { max_iterations } => {
                self.say(&ui::max_iterations(max_iterations))
            }
        }
    }

    fn confirm(&mut self, request: &ConfirmationRequest<'_>) -> bool {
        self.settle();
        match cliclack::confirm(ui::confirmation(request))
            .initial_value(request.default)
            .interact()
        {
            Ok(approved) => approved,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                println!("{}", ui::goodbye());
                std::process::exit(INTERRUPTED_EXIT_CODE);
            }
            Err(e) => {
                warn!("confirmation prompt failed: {}", e);
                false
            }
        }
    }
}
