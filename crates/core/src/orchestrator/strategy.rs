//! Execution strategies for the upstream notebook.
//!
//! The orchestrator walks an ordered list of strategies and stops at the
//! first that succeeds. Each attempt reports an [`ExecutionOutcome`]; none
//! of them return errors.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use super::convert::notebook_to_script;
use super::process::{run_captured, Completion, RunError};
use crate::layout::{ArtifactLayout, FALLBACK_SCRIPT};

pub const DEFAULT_JUPYTER: &str = "jupyter";
pub const DEFAULT_PYTHON: &str = "python3";

/// Position of a strategy in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Primary,
    Fallback,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Primary => write!(f, "primary"),
            StrategyKind::Fallback => write!(f, "fallback"),
        }
    }
}

/// How a single attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptStatus {
    Succeeded,
    /// The tooling for this strategy is missing; nothing was executed.
    ToolUnavailable { reason: String },
    /// The strategy ran and failed.
    Failed {
        exit_code: Option<i32>,
        reason: String,
    },
    TimedOut { after: Duration },
}

/// Result of one strategy attempt, with captured process output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub strategy: StrategyKind,
    pub status: AttemptStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionOutcome {
    pub fn new(strategy: StrategyKind, status: AttemptStatus) -> Self {
        Self {
            strategy,
            status,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == AttemptStatus::Succeeded
    }

    pub fn tool_unavailable(&self) -> bool {
        matches!(self.status, AttemptStatus::ToolUnavailable { .. })
    }
}

/// Inputs shared by every strategy in a run.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub layout: ArtifactLayout,
    /// Notebook to execute, already resolved against the layout root.
    pub notebook: PathBuf,
    /// Upper bound for each external command.
    pub timeout: Duration,
}

/// One way of executing the notebook.
pub trait ExecutionStrategy {
    fn kind(&self) -> StrategyKind;

    /// Short human-readable label used in logs.
    fn describe(&self) -> String;

    fn attempt(&self, ctx: &ExecutionContext) -> ExecutionOutcome;
}

/// Execute the notebook in place with `jupyter nbconvert`.
#[derive(Debug, Clone)]
pub struct NbconvertStrategy {
    program: String,
}

impl NbconvertStrategy {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for NbconvertStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_JUPYTER)
    }
}

impl ExecutionStrategy for NbconvertStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Primary
    }

    fn describe(&self) -> String {
        format!("{} nbconvert --execute --inplace", self.program)
    }

    fn attempt(&self, ctx: &ExecutionContext) -> ExecutionOutcome {
        let mut command = Command::new(&self.program);
        command
            .args(["nbconvert", "--to", "notebook", "--execute", "--inplace"])
            .arg(&ctx.notebook)
            .current_dir(ctx.layout.root());
        run_to_outcome(self.kind(), &self.program, &mut command, ctx.timeout)
    }
}

/// Convert the notebook to a script next to it, then run that script.
#[derive(Debug, Clone)]
pub struct ScriptStrategy {
    python: String,
}

impl ScriptStrategy {
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }

    /// Where the converted script is written for `notebook`.
    pub fn script_path(notebook: &Path) -> PathBuf {
        notebook
            .parent()
            .map(|dir| dir.join(FALLBACK_SCRIPT))
            .unwrap_or_else(|| PathBuf::from(FALLBACK_SCRIPT))
    }

    fn write_script(&self, notebook: &Path) -> Result<PathBuf, String> {
        let source = std::fs::read_to_string(notebook)
            .map_err(|e| format!("could not read '{}': {}", notebook.display(), e))?;
        let script = notebook_to_script(&source)
            .map_err(|e| format!("could not convert '{}': {}", notebook.display(), e))?;
        let path = Self::script_path(notebook);
        std::fs::write(&path, script)
            .map_err(|e| format!("could not write '{}': {}", path.display(), e))?;
        tracing::info!(script = %path.display(), "notebook converted to script");
        Ok(path)
    }
}

impl Default for ScriptStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_PYTHON)
    }
}

impl ExecutionStrategy for ScriptStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Fallback
    }

    fn describe(&self) -> String {
        format!("{} {}", self.python, FALLBACK_SCRIPT)
    }

    fn attempt(&self, ctx: &ExecutionContext) -> ExecutionOutcome {
        let script = match self.write_script(&ctx.notebook) {
            Ok(path) => path,
            Err(reason) => {
                return ExecutionOutcome::new(
                    self.kind(),
                    AttemptStatus::Failed {
                        exit_code: None,
                        reason,
                    },
                )
            }
        };

        let mut command = Command::new(&self.python);
        command.arg(&script).current_dir(ctx.layout.root());
        run_to_outcome(self.kind(), &self.python, &mut command, ctx.timeout)
    }
}

fn run_to_outcome(
    strategy: StrategyKind,
    program: &str,
    command: &mut Command,
    timeout: Duration,
) -> ExecutionOutcome {
    let run = match run_captured(command, timeout) {
        Ok(run) => run,
        Err(RunError::Launch(e)) => {
            return ExecutionOutcome::new(
                strategy,
                AttemptStatus::ToolUnavailable {
                    reason: format!("{}: {}", program, e),
                },
            )
        }
        Err(e @ RunError::Capture(_)) => {
            return ExecutionOutcome::new(
                strategy,
                AttemptStatus::Failed {
                    exit_code: None,
                    reason: format!("{}: {}", program, e),
                },
            )
        }
    };

    let status = match run.completion {
        Completion::Exited(status) if status.success() => AttemptStatus::Succeeded,
        Completion::Exited(status) => AttemptStatus::Failed {
            exit_code: status.code(),
            reason: format!("{} exited with {}", program, status),
        },
        Completion::TimedOut => AttemptStatus::TimedOut { after: timeout },
    };

    ExecutionOutcome {
        strategy,
        status,
        stdout: run.stdout,
        stderr: run.stderr,
    }
}
