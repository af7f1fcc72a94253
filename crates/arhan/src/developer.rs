use async_trait::async_trait;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::debug;

use crate::models::tool::ToolResult;
use crate::tools::{ToolArgs, ToolExecutor};

/// Files above this size are refused by `read_file`
pub const MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Ceiling for each of stdout and stderr captured from `run_command`
pub const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Local implementation of the four developer tools
pub struct DeveloperSystem {
    cwd: PathBuf,
}

impl DeveloperSystem {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }

    /// Use the process working directory
    pub fn from_current_dir() -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    // Helper method to resolve a path relative to cwd
    fn resolve_path(&self, path_str: &str) -> PathBuf {
        let path = Path::new(path_str);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    async fn read_file(&self, path_str: &str) -> ToolResult {
        let path = self.resolve_path(path_str);

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) => return ToolResult::failure(format!("Failed to read file: {}", e)),
        };

        if metadata.len() > MAX_FILE_SIZE {
            return ToolResult::failure(format!(
                "Warning: File size is {:.2}MB, which exceeds 1MB. Consider reading a smaller file.",
                metadata.len() as f64 / 1024.0 / 1024.0
            ));
        }

        match tokio::fs::read(&path).await {
            Ok(bytes) => ToolResult::success(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) => ToolResult::failure(format!("Failed to read file: {}", e)),
        }
    }

    async fn write_file(&self, path_str: &str, content: &str) -> ToolResult {
        let path = self.resolve_path(path_str);

        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return ToolResult::failure(format!("Failed to write file: {}", e));
            }
        }

        match tokio::fs::write(&path, content).await {
            Ok(()) => ToolResult::success(format!("Successfully wrote to {}", path_str)),
            Err(e) => ToolResult::failure(format!("Failed to write file: {}", e)),
        }
    }

    fn list_files(&self, path_str: &str, recursive: bool, depth: usize) -> ToolResult {
        let path = self.resolve_path(path_str);
        let mut output = String::new();

        match list_dir(&path, recursive, depth, 0, &mut output) {
            Ok(()) if output.is_empty() => ToolResult::success("Empty directory"),
            Ok(()) => ToolResult::success(output),
            Err(e) => ToolResult::failure(format!("Failed to list files: {}", e)),
        }
    }

    async fn run_command(&self, command: &str, cwd: Option<&str>) -> ToolResult {
        let working_dir = cwd
            .map(|dir| self.resolve_path(dir))
            .unwrap_or_else(|| self.cwd.clone());

        debug!(command, cwd = %working_dir.display(), "running command");

        let mut child = match shell(command)
            .current_dir(&working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => return ToolResult::failure(format!("Failed to start command: {}", e)),
        };

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return ToolResult::failure("Failed to capture command output");
        };

        let captured = tokio::try_join!(read_capped(stdout), read_capped(stderr));
        let (stdout, stderr) = match captured {
            Ok(((stdout, false), (stderr, false))) => (stdout, stderr),
            Ok(_) => {
                let _ = child.kill().await;
                return ToolResult::failure(format!(
                    "Command output exceeded the {}MB buffer limit",
                    MAX_OUTPUT_BYTES / 1024 / 1024
                ));
            }
            Err(e) => {
                let _ = child.kill().await;
                return ToolResult::failure(format!("Failed to read command output: {}", e));
            }
        };

        let status = match child.wait().await {
            Ok(status) => status,
            Err(e) => return ToolResult::failure(format!("Command execution failed: {}", e)),
        };

        if status.success() {
            let output = if !stdout.is_empty() {
                stdout
            } else if !stderr.is_empty() {
                stderr
            } else {
                "Command executed successfully (no output)".to_string()
            };
            ToolResult::success(output)
        } else {
            let error = if !stderr.is_empty() {
                stderr
            } else {
                match status.code() {
                    Some(code) => format!("Command failed with exit code {}: {}", code, command),
                    None => format!("Command was terminated by a signal: {}", command),
                }
            };
            ToolResult::failure(error).with_output(stdout)
        }
    }
}

#[cfg(not(windows))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

// Returns the text read and whether the ceiling was hit
async fn read_capped<R: AsyncRead + Unpin>(reader: R) -> std::io::Result<(String, bool)> {
    let mut buf = Vec::new();
    reader
        .take(MAX_OUTPUT_BYTES as u64 + 1)
        .read_to_end(&mut buf)
        .await?;
    let overflow = buf.len() > MAX_OUTPUT_BYTES;
    Ok((String::from_utf8_lossy(&buf).into_owned(), overflow))
}

fn list_dir(
    dir: &Path,
    recursive: bool,
    max_depth: usize,
    depth: usize,
    output: &mut String,
) -> std::io::Result<()> {
    let mut entries = std::fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        let prefix = if is_dir { "📁" } else { "📄" };
        let _ = writeln!(
            output,
            "{}{} {}",
            "  ".repeat(depth),
            prefix,
            entry.file_name().to_string_lossy()
        );

        if recursive && is_dir && depth < max_depth {
            // An unreadable subdirectory is listed but not descended into
            let _ = list_dir(&entry.path(), true, max_depth, depth + 1, output);
        }
    }

    Ok(())
}

#[async_trait]
impl ToolExecutor for DeveloperSystem {
    async fn execute(&self, args: &ToolArgs) -> ToolResult {
        match args {
            ToolArgs::ReadFile { path } => self.read_file(path).await,
            ToolArgs::WriteFile { path, content } => self.write_file(path, content).await,
            ToolArgs::ListFiles {
                path,
                recursive,
                depth,
            } => self.list_files(path, *recursive, *depth),
            ToolArgs::RunCommand { command, cwd } => {
                self.run_command(command, cwd.as_deref()).await
            }
        }
    }
}
