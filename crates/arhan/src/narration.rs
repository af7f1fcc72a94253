/// Phrases that suggest the model is describing a tool call rather than making one
pub const DEFAULT_PHRASES: [&str; 9] = [
    "read_file",
    "write_file",
    "list_files",
    "run_command",
    "will use",
    "i'll use",
    "let me use",
    "i would like to",
    "my first step",
];

/// Sent back to the model when it narrated instead of acting
pub const CORRECTIVE_PROMPT: &str = "You described using a tool but did not call it. \
Do not describe tool usage in text. Call the appropriate tool now using the tool calling interface.";

/// Decides whether a finished assistant reply is narrating tool usage.
///
/// Only consulted for turns that produced no tool calls.
pub trait NarrationPolicy: Send + Sync {
    fn is_narrating(&self, content: &str) -> bool;
}

/// Case-insensitive substring match against a fixed phrase list
#[derive(Debug, Clone)]
pub struct KeywordNarrationDetector {
    phrases: Vec<String>,
}

impl KeywordNarrationDetector {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .collect(),
        }
    }
}

impl Default for KeywordNarrationDetector {
    fn default() -> Self {
        Self::new(DEFAULT_PHRASES)
    }
}

impl NarrationPolicy for KeywordNarrationDetector {
    fn is_narrating(&self, content: &str) -> bool {
        let content = content.to_lowercase();
        self.phrases.iter().any(|phrase| content.contains(phrase))
    }
}

/// Never fires
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNarrationCheck;

impl NarrationPolicy for NoNarrationCheck {
    fn is_narrating(&self, _content: &str) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_narration() {
        let detector = KeywordNarrationDetector::default();
        assert!(detector.is_narrating("I will use read_file to check the code"));
        assert!(detector.is_narrating("My first step is to look around."));
        assert!(detector.is_narrating("I WOULD LIKE TO inspect the repo"));
        assert!(detector.is_narrating("Let me use the shell."));
    }

    #[test]
    fn test_ignores_plain_answers() {
        let detector = KeywordNarrationDetector::default();
        assert!(!detector.is_narrating("The project builds cleanly and all tests pass."));
        assert!(!detector.is_narrating(""));
    }

    #[test]
    fn test_custom_phrases() {
        let detector = KeywordNarrationDetector::new(["Going To Run"]);
        assert!(detector.is_narrating("I'm going to run the tests"));
        assert!(!detector.is_narrating("I will use read_file"));
        assert!(!NoNarrationCheck.is_narrating("I will use read_file"));
    }
}
