pub mod rustyline;

pub struct Input {
    pub input_type: InputType,
    pub content: Option<String>, // Optional content as sometimes the user may be issuing a command eg. (Exit)
}

#[derive(Debug, PartialEq)]
pub enum InputType {
    Message, // User sent a message
    Clear,   // Wipe the conversation and keep prompting
    Exit,    // User wants to exit the session
}

impl Input {
    fn command(input_type: InputType) -> Self {
        Self {
            input_type,
            content: None,
        }
    }
}

/// Interpret one line typed at the interactive prompt
pub fn parse_input(line: &str) -> Input {
    let text = line.trim();

    if text.is_empty() || text.eq_ignore_ascii_case("exit") || text.eq_ignore_ascii_case("quit") {
        Input::command(InputType::Exit)
    } else if text.eq_ignore_ascii_case("clear") {
        Input::command(InputType::Clear)
    } else {
        Input {
            input_type: InputType::Message,
            content: Some(text.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input_commands() {
        for line in ["", "   ", "exit", "QUIT", " Exit "] {
            assert_eq!(parse_input(line).input_type, InputType::Exit, "{:?}", line);
        }
        assert_eq!(parse_input("clear").input_type, InputType::Clear);
    }

    #[test]
    fn test_parse_input_message() {
        let input = parse_input("  fix the failing test \n");
        assert_eq!(input.input_type, InputType::Message);
        assert_eq!(input.content.as_deref(), Some("fix the failing test"));

        // Commands only match the whole line
        assert_eq!(parse_input("clear the cache").input_type, InputType::Message);
    }
}
