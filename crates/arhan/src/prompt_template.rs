use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Error as TeraError, Tera};

use crate::models::tool::Tool;

const SYSTEM_TEMPLATE: &str = include_str!("prompts/system.md");

pub fn load_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    let rendered = tera.render("inline_template", &context)?;
    Ok(rendered)
}

/// The system prompt that opens every conversation, listing the given tools
pub fn system_prompt(tools: &[Tool]) -> Result<String, TeraError> {
    let mut context = HashMap::new();
    context.insert("tools", tools);
    load_prompt(SYSTEM_TEMPLATE, &context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_load_prompt() {
        let template = "Hello, {{ name }}! You are {{ age }} years old.";
        let mut context = HashMap::new();
        context.insert("name".to_string(), "Alice".to_string());
        context.insert("age".to_string(), 30.to_string());

        let result = load_prompt(template, &context).unwrap();
        assert_eq!(result, "Hello, Alice! You are 30 years old.");
    }

    #[test]
    fn test_load_prompt_missing_variable() {
        let template = "Hello, {{ name }}! You are {{ age }} years old.";
        let mut context = HashMap::new();
        context.insert("name".to_string(), "Alice".to_string());
        let result = load_prompt(template, &context);
        assert!(result.is_err());
    }

    #[test]
    fn test_system_prompt_lists_tools() {
        let prompt = system_prompt(&crate::tools::tools()).unwrap();

        assert!(prompt.starts_with("You are Arhan"));
        for name in ["read_file", "write_file", "list_files", "run_command"] {
            assert!(prompt.contains(&format!("- {}: ", name)), "missing {}", name);
        }
    }

    #[test]
    fn test_system_prompt_renders_text_verbatim() {
        let tools = vec![Tool::new(
            "probe",
            "Checks <things> & \"stuff\"",
            json!({"type": "object"}),
        )];

        let prompt = system_prompt(&tools).unwrap();
        assert!(prompt.contains("- probe: Checks <things> & \"stuff\""));
    }
}
