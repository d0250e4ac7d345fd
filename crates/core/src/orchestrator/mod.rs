//! Execution orchestrator for the upstream computation.
//!
//! Runs the notebook through an ordered strategy chain (in-place
//! `nbconvert` first, convert-then-run second), then verifies that the
//! expected artifacts exist on disk.
//!
//! Stages: `RunningPrimary -> RunningFallback (only after a primary
//! failure) -> Verifying`. A run that executes but never succeeds is
//! reported as [`Verdict::Failed`]; only a chain in which no strategy
//! could even be launched is an error.

pub mod convert;
mod process;
pub mod strategy;
pub mod verify;

use std::path::PathBuf;
use std::time::Duration;

pub use strategy::{
    AttemptStatus, ExecutionContext, ExecutionOutcome, ExecutionStrategy, NbconvertStrategy,
    ScriptStrategy, StrategyKind,
};
pub use verify::{verify_artifacts, ArtifactCheck, ArtifactVerification, Verdict};

use crate::error::OrchestrateError;
use crate::layout::{ArtifactLayout, DEFAULT_NOTEBOOK};

/// Default bound on each external command.
pub const DEFAULT_EXECUTION_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Settings for the default strategy chain.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// Notebook path, relative to the layout root unless absolute.
    pub notebook: PathBuf,
    /// Program used for the primary strategy.
    pub jupyter: String,
    /// Interpreter used for the fallback strategy.
    pub python: String,
    pub timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            notebook: PathBuf::from(DEFAULT_NOTEBOOK),
            jupyter: strategy::DEFAULT_JUPYTER.to_string(),
            python: strategy::DEFAULT_PYTHON.to_string(),
            timeout: DEFAULT_EXECUTION_TIMEOUT,
        }
    }
}

/// What a single orchestration run did and concluded.
#[derive(Debug, Clone)]
pub struct OrchestrationReport {
    /// One outcome per strategy attempted, in order.
    pub outcomes: Vec<ExecutionOutcome>,
    /// Present only when some strategy succeeded.
    pub verification: Option<ArtifactVerification>,
    pub verdict: Verdict,
}

impl OrchestrationReport {
    /// The strategy that produced the artifacts, if any did.
    pub fn succeeded_with(&self) -> Option<StrategyKind> {
        self.outcomes
            .iter()
            .find(|o| o.succeeded())
            .map(|o| o.strategy)
    }
}

pub struct Orchestrator {
    layout: ArtifactLayout,
    notebook: PathBuf,
    timeout: Duration,
    strategies: Vec<Box<dyn ExecutionStrategy>>,
}

impl Orchestrator {
    /// Build the default chain: `nbconvert` in place, then convert-and-run.
    pub fn new(layout: ArtifactLayout, config: OrchestratorConfig) -> Self {
        let strategies: Vec<Box<dyn ExecutionStrategy>> = vec![
            Box::new(NbconvertStrategy::new(config.jupyter)),
            Box::new(ScriptStrategy::new(config.python)),
        ];
        Self::with_strategies(layout, config.notebook, config.timeout, strategies)
    }

    pub fn with_strategies(
        layout: ArtifactLayout,
        notebook: PathBuf,
        timeout: Duration,
        strategies: Vec<Box<dyn ExecutionStrategy>>,
    ) -> Self {
        Self {
            layout,
            notebook,
            timeout,
            strategies,
        }
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    /// Execute the notebook and verify its artifacts.
    pub fn run(&self) -> Result<OrchestrationReport, OrchestrateError> {
        if self.strategies.is_empty() {
            return Err(OrchestrateError::NoStrategies);
        }

        let notebook = self.layout.resolve(&self.notebook);
        if !notebook.exists() {
            tracing::error!(notebook = %notebook.display(), "source notebook not found");
            return Ok(OrchestrationReport {
                outcomes: Vec::new(),
                verification: None,
                verdict: Verdict::Failed,
            });
        }
        // Children run with the layout root as cwd, so hand them an absolute path.
        let notebook = std::fs::canonicalize(&notebook).unwrap_or(notebook);

        let ctx = ExecutionContext {
            layout: self.layout.clone(),
            notebook,
            timeout: self.timeout,
        };

        let outcomes = self.execute(&ctx);
        let succeeded = outcomes.last().is_some_and(ExecutionOutcome::succeeded);

        if !succeeded {
            if outcomes.iter().all(ExecutionOutcome::tool_unavailable) {
                let reasons = outcomes
                    .iter()
                    .filter_map(|o| match &o.status {
                        AttemptStatus::ToolUnavailable { reason } => Some(reason.clone()),
                        _ => None,
                    })
                    .collect();
                return Err(OrchestrateError::ToolchainExhausted { reasons });
            }
            tracing::error!("every execution strategy failed");
            return Ok(OrchestrationReport {
                outcomes,
                verification: None,
                verdict: Verdict::Failed,
            });
        }

        tracing::info!(stage = "verifying", "checking generated artifacts");
        let verification = verify_artifacts(&self.layout);
        let verdict = verification.verdict();
        tracing::info!(%verdict, "orchestration finished");

        Ok(OrchestrationReport {
            outcomes,
            verification: Some(verification),
            verdict,
        })
    }

    /// Walk the strategy chain until one attempt succeeds.
    fn execute(&self, ctx: &ExecutionContext) -> Vec<ExecutionOutcome> {
        let mut outcomes = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            let kind = strategy.kind();
            tracing::info!(
                strategy = %kind,
                command = %strategy.describe(),
                "running notebook"
            );

            let outcome = strategy.attempt(ctx);
            log_outcome(&outcome);

            let done = outcome.succeeded();
            outcomes.push(outcome);
            if done {
                break;
            }
        }
        outcomes
    }
}

fn log_outcome(outcome: &ExecutionOutcome) {
    let strategy = outcome.strategy;
    match &outcome.status {
        AttemptStatus::Succeeded => {
            tracing::info!(%strategy, "notebook executed successfully");
        }
        AttemptStatus::ToolUnavailable { reason } => {
            tracing::warn!(%strategy, %reason, "execution tooling unavailable");
        }
        AttemptStatus::Failed { exit_code, reason } => {
            tracing::error!(%strategy, ?exit_code, %reason, "notebook execution failed");
            if !outcome.stdout.is_empty() {
                tracing::error!(%strategy, stdout = %outcome.stdout);
            }
            if !outcome.stderr.is_empty() {
                tracing::error!(%strategy, stderr = %outcome.stderr);
            }
        }
        AttemptStatus::TimedOut { after } => {
            tracing::error!(%strategy, timeout_secs = after.as_secs(), "notebook execution timed out");
        }
    }
}
