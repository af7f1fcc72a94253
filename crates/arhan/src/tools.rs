use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::errors::{AgentError, AgentResult};
use crate::models::tool::{Tool, ToolResult};

/// Depth used by `list_files` when the model asks for a recursive listing
/// without saying how deep.
pub const DEFAULT_LIST_DEPTH: usize = 2;

/// The fixed set of capabilities exposed to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ToolName {
    ReadFile,
    WriteFile,
    ListFiles,
    RunCommand,
}

impl ToolName {
    /// The declaration sent to the model for this tool
    pub fn declaration(&self) -> Tool {
        match self {
            ToolName::ReadFile => Tool::new(
                self.as_ref(),
                "Read the contents of a file. Fails with a warning if the file is larger than 1MB.",
                json!({
                    "type": "object",
                    "properties": {
                        "path": {
                            "type": "string",
                            "description": "The path to the file to read (relative or absolute)"
                        }
                    },
                    "required": ["path"]
                }),
            ),
            ToolName::WriteFile => Tool::new(
                self.as_ref(),
                "Create or overwrite a file with the given content. Creates directories if needed.",
                json!({
                    "type": "object",
                    "properties": {
                        "path": {
                            "type": "string",
                            "description": "The path to the file to write (relative or absolute)"
                        },
                        "content": {
                            "type": "string",
                            "description": "The content to write to the file"
                        }
                    },
                    "required": ["path", "content"]
                }),
            ),
            ToolName::ListFiles => Tool::new(
                self.as_ref(),
                "List files and directories in a given path. Can recursively list subdirectories.",
                json!({
                    "type": "object",
                    "properties": {
                        "path": {
                            "type": "string",
                            "description": "The directory path to list (relative or absolute)"
                        },
                        "recursive": {
                            "type": "string",
                            "description": "Whether to list recursively",
                            "enum": ["true", "false"]
                        },
                        "depth": {
                            "type": "string",
                            "description": "Maximum depth for recursive listing (default: 2)"
                        }
                    },
                    "required": ["path"]
                }),
            ),
            ToolName::RunCommand => Tool::new(
                self.as_ref(),
                "Execute a shell command. Use this to install dependencies, run git commands, tests, etc.",
                json!({
                    "type": "object",
                    "properties": {
                        "command": {
                            "type": "string",
                            "description": "The shell command to execute"
                        },
                        "cwd": {
                            "type": "string",
                            "description": "Working directory for the command (optional)"
                        }
                    },
                    "required": ["command"]
                }),
            ),
        }
    }
}

/// Declarations for every tool, in a stable order
pub fn tools() -> Vec<Tool> {
    ToolName::iter().map(|name| name.declaration()).collect()
}

/// Validated arguments for one tool call
#[derive(Debug, Clone, PartialEq)]
pub enum ToolArgs {
    ReadFile {
        path: String,
    },
    WriteFile {
        path: String,
        content: String,
    },
    ListFiles {
        path: String,
        recursive: bool,
        depth: usize,
    },
    RunCommand {
        command: String,
        cwd: Option<String>,
    },
}

#[derive(Deserialize)]
struct PathParams {
    path: String,
}

#[derive(Deserialize)]
struct WriteParams {
    path: String,
    content: String,
}

#[derive(Deserialize)]
struct ListParams {
    path: String,
    #[serde(default)]
    recursive: Option<Value>,
    #[serde(default)]
    depth: Option<Value>,
}

#[derive(Deserialize)]
struct CommandParams {
    command: String,
    #[serde(default)]
    cwd: Option<String>,
}

impl ToolArgs {
    /// Parse the raw argument text of a tool call.
    ///
    /// Text that is not JSON at all is `MalformedArguments`; JSON that does not fit
    /// the named tool is `ToolNotFound` or `InvalidParameters`.
    pub fn parse(name: &str, raw: &str) -> AgentResult<Self> {
        let value: Value = serde_json::from_str(raw).map_err(|e| {
            AgentError::MalformedArguments(format!(
                "Could not interpret arguments for {} as JSON: {}",
                name, e
            ))
        })?;

        let tool = ToolName::from_str(name).map_err(|_| AgentError::ToolNotFound(name.to_string()))?;

        match tool {
            ToolName::ReadFile => {
                let params: PathParams = from_value(tool, value)?;
                Ok(ToolArgs::ReadFile { path: params.path })
            }
            ToolName::WriteFile => {
                let params: WriteParams = from_value(tool, value)?;
                Ok(ToolArgs::WriteFile {
                    path: params.path,
                    content: params.content,
                })
            }
            ToolName::ListFiles => {
                let params: ListParams = from_value(tool, value)?;
                Ok(ToolArgs::ListFiles {
                    path: params.path,
                    recursive: parse_flag(params.recursive.as_ref()),
                    depth: parse_depth(params.depth.as_ref())?,
                })
            }
            ToolName::RunCommand => {
                let params: CommandParams = from_value(tool, value)?;
                Ok(ToolArgs::RunCommand {
                    command: params.command,
                    cwd: params.cwd.filter(|cwd| !cwd.is_empty()),
                })
            }
        }
    }

    pub fn name(&self) -> ToolName {
        match self {
            ToolArgs::ReadFile { .. } => ToolName::ReadFile,
            ToolArgs::WriteFile { .. } => ToolName::WriteFile,
            ToolArgs::ListFiles { .. } => ToolName::ListFiles,
            ToolArgs::RunCommand { .. } => ToolName::RunCommand,
        }
    }
}

fn from_value<T: serde::de::DeserializeOwned>(tool: ToolName, value: Value) -> AgentResult<T> {
    serde_json::from_value(value)
        .map_err(|e| AgentError::InvalidParameters(format!("{}: {}", tool, e)))
}

// The declared schema uses strings for these, but models are not consistent about it
fn parse_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn parse_depth(value: Option<&Value>) -> AgentResult<usize> {
    match value {
        None | Some(Value::Null) => Ok(DEFAULT_LIST_DEPTH),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| AgentError::InvalidParameters(format!("list_files: invalid depth {}", n))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(DEFAULT_LIST_DEPTH),
        Some(Value::String(s)) => s.trim().parse().map_err(|_| {
            AgentError::InvalidParameters(format!("list_files: invalid depth '{}'", s))
        }),
        Some(other) => Err(AgentError::InvalidParameters(format!(
            "list_files: invalid depth {}",
            other
        ))),
    }
}

/// Runs validated tool calls. Implementations never fail: every problem is
/// reported through the returned `ToolResult`.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, args: &ToolArgs) -> ToolResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tools_declares_all_four() {
        let names: Vec<String> = tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["read_file", "write_file", "list_files", "run_command"]);
    }

    #[test]
    fn test_parse_read_file() {
        let args = ToolArgs::parse("read_file", r#"{"path":"src/main.rs"}"#).unwrap();
        assert_eq!(
            args,
            ToolArgs::ReadFile {
                path: "src/main.rs".into()
            }
        );
        assert_eq!(args.name(), ToolName::ReadFile);
    }

    #[test]
    fn test_parse_list_files_defaults() {
        let args = ToolArgs::parse("list_files", r#"{"path":"."}"#).unwrap();
        assert_eq!(
            args,
            ToolArgs::ListFiles {
                path: ".".into(),
                recursive: false,
                depth: DEFAULT_LIST_DEPTH
            }
        );
    }

    #[test]
    fn test_parse_list_files_string_and_native_values() {
        let from_strings =
            ToolArgs::parse("list_files", r#"{"path":"src","recursive":"true","depth":"3"}"#)
                .unwrap();
        let from_native =
            ToolArgs::parse("list_files", r#"{"path":"src","recursive":true,"depth":3}"#).unwrap();
        assert_eq!(from_strings, from_native);
        assert_eq!(
            from_native,
            ToolArgs::ListFiles {
                path: "src".into(),
                recursive: true,
                depth: 3
            }
        );
    }

    #[test]
    fn test_parse_run_command_drops_empty_cwd() {
        let args = ToolArgs::parse("run_command", r#"{"command":"ls","cwd":""}"#).unwrap();
        assert_eq!(
            args,
            ToolArgs::RunCommand {
                command: "ls".into(),
                cwd: None
            }
        );
    }

    #[test]
    fn test_parse_malformed_json() {
        let err = ToolArgs::parse("read_file", r#"{"path": "a.txt""#).unwrap_err();
        assert!(matches!(err, AgentError::MalformedArguments(_)));
    }

    #[test]
    fn test_parse_unknown_tool() {
        let err = ToolArgs::parse("delete_everything", "{}").unwrap_err();
        assert_eq!(err, AgentError::ToolNotFound("delete_everything".into()));
    }

    #[test]
    fn test_parse_missing_field() {
        let err = ToolArgs::parse("write_file", r#"{"path":"a.txt"}"#).unwrap_err();
        match err {
            AgentError::InvalidParameters(msg) => assert!(msg.contains("content")),
            other => panic!("Expected InvalidParameters, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_bad_depth() {
        let err =
            ToolArgs::parse("list_files", r#"{"path":".","depth":"deep"}"#).unwrap_err();
        assert!(matches!(err, AgentError::InvalidParameters(_)));
    }
}
