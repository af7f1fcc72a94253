//! Terminal presentation. Every function here only builds the text to show;
//! printing is left to the caller.

use arhan::confirm::ConfirmationRequest;
use arhan::models::tool::ToolResult;
use arhan::tools::ToolArgs;
use console::{style, StyledObject};

const RULE_WIDTH: usize = 60;
const PREVIEW_LENGTH: usize = 50;
const CONFIRM_PREVIEW_LENGTH: usize = 40;

fn accent<D>(text: D) -> StyledObject<D> {
    style(text).color256(209)
}

fn keyword<D>(text: D) -> StyledObject<D> {
    style(text).color256(216)
}

fn dim<D>(text: D) -> StyledObject<D> {
    style(text).color256(244)
}

fn very_dim<D>(text: D) -> StyledObject<D> {
    style(text).color256(239)
}

fn rule() -> String {
    format!("  {}", very_dim("─".repeat(RULE_WIDTH)))
}

pub fn welcome(model: &str, auto_approve: bool) -> String {
    // Only the last path segment of the model id, e.g. "gemini-2.0-flash-exp:free"
    let model_name = model.rsplit('/').next().unwrap_or(model);
    format!(
        "\n{}{}\n\n{}\n{}\n",
        accent("* "),
        style("Welcome to Arhan!").bold(),
        info(&format!("Model: {}", model_name)),
        info(&format!(
            "Auto-approve: {}",
            if auto_approve { "enabled" } else { "disabled" }
        )),
    )
}

pub fn info(message: &str) -> String {
    format!("  {}", dim(message))
}

pub fn task_start(task: &str) -> String {
    format!(
        "{}{}\n{}\n  {}\n{}\n",
        accent("* "),
        keyword("Task"),
        rule(),
        task,
        rule()
    )
}

/// `read_file` becomes `Read File`
pub fn format_tool_name(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cut `text` to `max` characters, ending in `...` when anything was dropped
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

fn preview(args: &ToolArgs, max: usize) -> String {
    match args {
        ToolArgs::ReadFile { path } | ToolArgs::WriteFile { path, .. } => path.clone(),
        ToolArgs::ListFiles {
            path, recursive, ..
        } => {
            if *recursive {
                format!("{} (recursive)", path)
            } else {
                path.clone()
            }
        }
        ToolArgs::RunCommand { command, .. } => truncate(command, max),
    }
}

pub fn tool_call_start(args: &ToolArgs) -> String {
    let name = format_tool_name(args.name().as_ref());
    let preview = preview(args, PREVIEW_LENGTH);
    if preview.is_empty() {
        format!("{}{}", accent("* "), keyword(name))
    } else {
        format!(
            "{}{}{}",
            accent("* "),
            keyword(name),
            dim(format!(" → {}", preview))
        )
    }
}

/// A one-line summary of what a tool produced; never the output itself
pub fn summarize_output(output: &str) -> String {
    if output.is_empty() {
        return String::new();
    }

    if output.contains('📁') || output.contains('📄') {
        let lines: Vec<&str> = output.lines().filter(|l| !l.trim().is_empty()).collect();
        let files = lines.iter().filter(|l| l.contains('📄')).count();
        let dirs = lines.iter().filter(|l| l.contains('📁')).count();
        let mut parts = Vec::new();
        if files > 0 {
            parts.push(format!("{} file{}", files, if files == 1 { "" } else { "s" }));
        }
        if dirs > 0 {
            parts.push(format!("{} dir{}", dirs, if dirs == 1 { "" } else { "s" }));
        }
        if !parts.is_empty() {
            return parts.join(", ");
        }
    }

    if output.contains('\n') {
        return format!("{} lines", output.split('\n').count());
    }

    let chars = output.chars().count();
    if chars < 200 {
        format!("{} chars", chars)
    } else {
        "Content retrieved".to_string()
    }
}

pub fn tool_result(result: &ToolResult) -> String {
    if result.success {
        let summary = summarize_output(&result.output);
        if summary.is_empty() {
            format!("  {}", style("✓").green())
        } else {
            format!("  {} {}", style("✓").green(), dim(summary))
        }
    } else {
        let error = result.error.as_deref().unwrap_or("Failed");
        let first_line = error.lines().next().unwrap_or("Failed");
        format!("  {} {}", style("✗").red(), first_line)
    }
}

pub fn confirmation(request: &ConfirmationRequest<'_>) -> String {
    let name = format_tool_name(request.args.name().as_ref());
    let preview = preview(request.args, CONFIRM_PREVIEW_LENGTH);
    let marker = if request.destructive {
        style("⚠ ").red().bold()
    } else {
        style("▸ ").yellow()
    };
    format!(
        "{}{}{}{}",
        marker,
        keyword(name),
        dim(format!(" - {}", preview)),
        style(" → Proceed?").yellow()
    )
}

pub fn cancelled() -> String {
    format!("  {}", dim("✗ Cancelled"))
}

pub fn skipped(name: &str, error: &str) -> String {
    format!(
        "  {} {}",
        style("✗").red(),
        dim(format!("Skipped {}: {}", format_tool_name(name), error))
    )
}

pub fn complete() -> String {
    format!(
        "\n{}{}\n  {}\n",
        accent("* "),
        keyword("Complete"),
        style("✓ Task completed").green()
    )
}

/// The first line follows the label; the rest are indented under it
pub fn error(message: &str) -> String {
    let mut lines = message.lines();
    let mut out = format!(
        "\n  {}{}",
        style("✗ Error: ").red(),
        lines.next().unwrap_or_default()
    );
    for line in lines {
        out.push_str(&format!("\n    {}", line));
    }
    out.push('\n');
    out
}

pub fn warning(message: &str) -> String {
    format!("  {}", style(format!("⚠ {}", message)).yellow())
}

pub fn narration_detected() -> String {
    info("The model described a tool call instead of making it; asking it to call the tool.")
}

pub fn max_iterations(max_iterations: usize) -> String {
    format!(
        "\n  {}\n",
        style(format!("⚠ Maximum iterations reached ({})", max_iterations)).yellow()
    )
}

pub fn history_cleared() -> String {
    info("History cleared.")
}

pub fn goodbye() -> String {
    format!("\n{}\n", info("Exiting. Goodbye!"))
}

pub fn missing_api_key() -> String {
    format!(
        "{}\n\n{}\n{}\n{}",
        style("✘ Error: OPENROUTER_API_KEY environment variable is required").red(),
        style("Get your API key from: https://openrouter.ai/keys").yellow(),
        dim("Then set it in your .env file or export it:"),
        dim("  export OPENROUTER_API_KEY=your_key_here"),
    )
}

pub fn prompt() -> String {
    format!("{}", accent("> "))
}
