use std::path::PathBuf;

/// Errors that abort the narration pipeline.
///
/// Missing artifacts are not errors: the loaders substitute empty data.
/// Only files that exist but cannot be read or parsed end up here, and
/// no report is written when one is returned.
#[derive(Debug, thiserror::Error)]
pub enum NarrateError {
    /// An artifact exists on disk but its contents cannot be decoded.
    #[error("corrupt artifact {}: {reason}", path.display())]
    CorruptArtifact { path: PathBuf, reason: String },

    /// A filesystem operation on an existing artifact or the report failed.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl NarrateError {
    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        NarrateError::CorruptArtifact {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NarrateError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors surfaced by the execution orchestrator.
///
/// Failed runs and missing outputs are reported through
/// [`crate::orchestrator::Verdict`]; this type covers the cases where no
/// execution could be attempted at all.
#[derive(Debug, thiserror::Error)]
pub enum OrchestrateError {
    /// Every strategy in the chain reported its tooling as unavailable.
    #[error("no execution strategy could be attempted: {}", reasons.join("; "))]
    ToolchainExhausted { reasons: Vec<String> },

    /// The orchestrator was built with an empty strategy chain.
    #[error("execution strategy chain is empty")]
    NoStrategies,
}
