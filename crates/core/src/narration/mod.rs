//! Narration pipeline: artifacts in, Markdown report out.
//!
//! 1. Load summary, samples and figures from the layout.
//! 2. Build the multi-modal request.
//! 3. Ask the service, or fall back to the deterministic narrator.
//! 4. Write `results/llm_analysis.md`.
//!
//! Only a corrupt artifact or a failed report write stops the pipeline;
//! every service problem ends in the fallback narrative.

pub mod fallback;
pub mod request;
pub mod service;
#[cfg(test)]
mod test_server;

pub use fallback::fallback_narrative;
pub use request::{build_request, NarrationRequest, MAX_IMAGES};
pub use service::{
    request_narrative, service_credential, ServiceError, ServiceSettings, CREDENTIAL_ENV,
};

use std::path::PathBuf;

use crate::artifacts::{load_samples, load_summary, ResultsSummary, SampleRecord};
use crate::error::NarrateError;
use crate::figures::{load_figures, FigureArtifact};
use crate::layout::ArtifactLayout;
use crate::report::write_report;

/// Resolved once at startup and passed explicitly to the adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationConfig {
    /// Whether the service client can be used at all.
    pub service_available: bool,
    pub credential: Option<String>,
    pub service: ServiceSettings,
}

impl NarrationConfig {
    /// Client availability follows the `service` feature.
    pub fn new(credential: Option<String>, service: ServiceSettings) -> Self {
        Self {
            service_available: cfg!(feature = "service"),
            credential,
            service,
        }
    }

    /// A config that never contacts the service.
    pub fn offline() -> Self {
        Self {
            service_available: false,
            credential: None,
            service: ServiceSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrativeSource {
    Service,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narrative {
    pub text: String,
    pub source: NarrativeSource,
}

/// Produce a narrative, always.
///
/// The service result is a `Result<String, ServiceError>`; any error is
/// logged and replaced by [`fallback_narrative`] over the same inputs.
/// The request is only built once the client and credential are usable.
pub fn analyze_with_llm(
    config: &NarrationConfig,
    summary: &ResultsSummary,
    samples: &[SampleRecord],
    figures: &[FigureArtifact],
) -> Narrative {
    service_credential(config)
        .and_then(|credential| {
            let request = build_request(summary, samples, figures);
            service::send_request(&config.service, credential, &request)
        })
        .map(|text| Narrative {
            text,
            source: NarrativeSource::Service,
        })
        .unwrap_or_else(|e| {
            tracing::warn!(reason = %e, "using fallback narrative");
            Narrative {
                text: fallback_narrative(summary, samples, figures),
                source: NarrativeSource::Fallback,
            }
        })
}

/// What a narration run loaded and wrote.
#[derive(Debug, Clone)]
pub struct NarrationOutcome {
    pub summary_present: bool,
    pub sample_count: usize,
    pub figure_count: usize,
    pub narrative: Narrative,
    pub report_path: PathBuf,
}

/// Run the whole pipeline against `layout`.
pub fn narrate(
    layout: &ArtifactLayout,
    config: &NarrationConfig,
) -> Result<NarrationOutcome, NarrateError> {
    let summary = load_summary(layout)?;
    let samples = load_samples(layout)?;
    let figures = load_figures(layout)?;
    tracing::info!(
        summary = !summary.is_empty(),
        samples = samples.len(),
        figures = figures.len(),
        "artifacts loaded"
    );

    let narrative = analyze_with_llm(config, &summary, &samples, &figures);
    let report_path = write_report(layout, &narrative.text)?;

    Ok(NarrationOutcome {
        summary_present: !summary.is_empty(),
        sample_count: samples.len(),
        figure_count: figures.len(),
        narrative,
        report_path,
    })
}
