//! dioph-core: execution and narration for Diophantine multiplicity runs.
//!
//! Two subsystems share one on-disk [`ArtifactLayout`]:
//!
//! - [`orchestrator`] executes the computation notebook through a
//!   primary/fallback strategy chain and verifies its outputs.
//! - [`narration`] loads the outputs and produces a Markdown report, from
//!   the narrative service when possible and from a deterministic
//!   fallback otherwise.
//!
//! # Public API
//!
//! - [`Orchestrator`] / [`OrchestratorConfig`] -- run and verify
//! - [`narrate()`] / [`NarrationConfig`] -- full narration pipeline
//! - [`analyze_with_llm()`] -- service call with fallback
//! - [`load_summary()`], [`load_samples()`], [`load_figures()`] -- artifact loaders
//! - [`write_report()`], [`preview()`] -- report output

pub mod artifacts;
pub mod error;
pub mod figures;
pub mod layout;
pub mod narration;
pub mod orchestrator;
pub mod report;

pub use artifacts::{load_samples, load_summary, ResultsSummary, SampleRecord, PLACEHOLDER};
pub use error::{NarrateError, OrchestrateError};
pub use figures::{encode_figure, load_figures, FigureArtifact, FigureKind};
pub use layout::ArtifactLayout;
pub use narration::{
    analyze_with_llm, fallback_narrative, narrate, NarrationConfig, NarrationOutcome, Narrative,
    NarrativeSource, ServiceSettings,
};
pub use orchestrator::{
    verify_artifacts, ArtifactVerification, OrchestrationReport, Orchestrator, OrchestratorConfig,
    Verdict,
};
pub use report::{preview, write_report};
