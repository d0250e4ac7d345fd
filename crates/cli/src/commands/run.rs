use std::path::Path;

use dioph_core::orchestrator::{AttemptStatus, ExecutionOutcome};
use dioph_core::{ArtifactLayout, OrchestrationReport, Orchestrator, Verdict};
use serde_json::json;

use crate::config::FileConfig;
use crate::{report_error, ExecArgs, OutputFormat};

/// Execute the notebook and verify artifacts. Returns the exit code and,
/// when execution was possible, the verdict.
pub(crate) fn run_and_verify(
    root: &Path,
    config: &FileConfig,
    args: &ExecArgs,
    strict: bool,
    output: OutputFormat,
    quiet: bool,
) -> (i32, Option<Verdict>) {
    let layout = ArtifactLayout::new(root);
    let orchestrator = Orchestrator::new(layout, config.orchestrator_config(args));

    if output == OutputFormat::Text && !quiet {
        println!("{}", "=".repeat(70));
        println!("Diophantine Analysis Runner");
        println!("{}", "=".repeat(70));
    }

    let report = match orchestrator.run() {
        Ok(r) => r,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            return (1, None);
        }
    };

    match output {
        OutputFormat::Json => println!("{}", report_json(&report)),
        OutputFormat::Text => {
            if !quiet {
                print_text(&report);
            }
        }
    }

    (report.verdict.exit_code(strict), Some(report.verdict))
}

pub(crate) fn cmd_run(
    root: &Path,
    config: &FileConfig,
    args: &ExecArgs,
    strict: bool,
    output: OutputFormat,
    quiet: bool,
) -> i32 {
    run_and_verify(root, config, args, strict, output, quiet).0
}

fn print_text(report: &OrchestrationReport) {
    if let Some(verification) = &report.verification {
        println!("\nChecking generated files...");
        for check in &verification.checks {
            match (check.present, check.required) {
                (true, _) => println!("✓ {}", check.path.display()),
                (false, true) => println!("✗ {} (missing)", check.path.display()),
                (false, false) => println!("⚠ {} (optional, missing)", check.path.display()),
            }
        }
    }

    match report.verdict {
        Verdict::Verified => println!("\n✓ Analysis complete! All artifacts generated."),
        Verdict::PartiallyVerified => {
            println!("\n⚠ Analysis complete, but some optional figures are missing.")
        }
        Verdict::Failed if report.verification.is_some() => {
            println!("\n✗ Analysis ran but required results are missing.")
        }
        Verdict::Failed => println!("\n✗ Analysis failed!"),
    }
}

fn report_json(report: &OrchestrationReport) -> serde_json::Value {
    let outcomes: Vec<serde_json::Value> = report.outcomes.iter().map(outcome_json).collect();
    let artifacts: Vec<serde_json::Value> = report
        .verification
        .iter()
        .flat_map(|v| v.checks.iter())
        .map(|c| {
            json!({
                "path": c.path.display().to_string(),
                "required": c.required,
                "present": c.present,
            })
        })
        .collect();

    json!({
        "verdict": verdict_name(report.verdict),
        "strategy": report.succeeded_with().map(|k| k.to_string()),
        "outcomes": outcomes,
        "artifacts": artifacts,
    })
}

fn outcome_json(outcome: &ExecutionOutcome) -> serde_json::Value {
    let (status, detail) = match &outcome.status {
        AttemptStatus::Succeeded => ("succeeded", None),
        AttemptStatus::ToolUnavailable { reason } => ("tool_unavailable", Some(reason.clone())),
        AttemptStatus::Failed { reason, .. } => ("failed", Some(reason.clone())),
        AttemptStatus::TimedOut { after } => {
            ("timed_out", Some(format!("after {}s", after.as_secs())))
        }
    };
    json!({
        "strategy": outcome.strategy.to_string(),
        "status": status,
        "detail": detail,
    })
}

fn verdict_name(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Verified => "verified",
        Verdict::PartiallyVerified => "partially_verified",
        Verdict::Failed => "failed",
    }
}
