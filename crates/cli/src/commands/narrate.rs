use std::path::Path;

use dioph_core::narration::CREDENTIAL_ENV;
use dioph_core::{narrate, preview, ArtifactLayout, NarrationConfig, NarrativeSource};
use serde_json::json;

use crate::config::FileConfig;
use crate::{report_error, NarrateArgs, OutputFormat};

pub(crate) fn cmd_narrate(
    root: &Path,
    config: &FileConfig,
    args: &NarrateArgs,
    output: OutputFormat,
    quiet: bool,
) -> i32 {
    let narration = resolve_config(config, args);
    if narration.service_available && narration.credential.is_none() && !quiet {
        tracing::warn!("{} not set; the report will use the fallback narrative", CREDENTIAL_ENV);
    }

    let text_mode = output == OutputFormat::Text && !quiet;
    if text_mode {
        println!("{}", "=".repeat(70));
        println!("Diophantine Results Narration");
        println!("{}", "=".repeat(70));
    }

    let layout = ArtifactLayout::new(root);
    let outcome = match narrate(&layout, &narration) {
        Ok(o) => o,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            return 1;
        }
    };

    let source = match outcome.narrative.source {
        NarrativeSource::Service => "service",
        NarrativeSource::Fallback => "fallback",
    };

    match output {
        OutputFormat::Json => {
            println!(
                "{}",
                json!({
                    "report": outcome.report_path.display().to_string(),
                    "source": source,
                    "summary_present": outcome.summary_present,
                    "samples": outcome.sample_count,
                    "figures": outcome.figure_count,
                })
            );
        }
        OutputFormat::Text if !quiet => {
            println!("\nLoaded results:");
            println!(
                "  - Summary data: {}",
                if outcome.summary_present { "✓" } else { "✗" }
            );
            println!("  - Sample data: {} entries", outcome.sample_count);
            println!("  - Figures: {}", outcome.figure_count);
            println!("  - Narrative: {}", source);
            println!("\n✓ Analysis saved to {}", outcome.report_path.display());
            println!("\n{}", "=".repeat(70));
            println!("Analysis Summary");
            println!("{}", "=".repeat(70));
            println!("{}", preview(&outcome.narrative.text));
        }
        OutputFormat::Text => {}
    }
    0
}

/// Resolve the narration config once: offline flag, credential from the
/// environment, service settings from file and flags.
fn resolve_config(config: &FileConfig, args: &NarrateArgs) -> NarrationConfig {
    if args.offline {
        return NarrationConfig::offline();
    }
    let credential = std::env::var(CREDENTIAL_ENV)
        .ok()
        .filter(|key| !key.trim().is_empty());
    NarrationConfig::new(credential, config.service_settings(args))
}
