//! End-to-end scenarios across the orchestrator and the narration pipeline.
//!
//! Each test builds a throwaway layout in a temp directory. Unix-only tests
//! stand in for `jupyter` and `python3` with small shell scripts.

use std::path::Path;
use std::time::Duration;

use dioph_core::narration::{build_request, MAX_IMAGES};
use dioph_core::orchestrator::{AttemptStatus, StrategyKind};
use dioph_core::{
    analyze_with_llm, fallback_narrative, load_figures, load_samples, load_summary, narrate,
    verify_artifacts, ArtifactLayout, FigureKind, NarrationConfig, NarrativeSource,
    OrchestrateError, Orchestrator, OrchestratorConfig, ServiceSettings, Verdict,
};
use tempfile::TempDir;

fn write(path: &Path, contents: &[u8]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn scenario_a_layout() -> (TempDir, ArtifactLayout) {
    let dir = TempDir::new().unwrap();
    let layout = ArtifactLayout::new(dir.path());
    write(
        &layout.summary_path(),
        br#"{"max_multiplicity": 12, "max_multiplicity_location": {"u": 3, "v": 7}, "total_computed": 500}"#,
    );
    write(
        &layout.samples_path(),
        b"u,v,multiplicity\n1,1,1\n2,4,3\n3,7,12\n",
    );
    write(&layout.figure_path(FigureKind::HeatmapLog), b"\x89PNG log");
    write(&layout.figure_path(FigureKind::SlicesFixedU), b"\x89PNG slices");
    (dir, layout)
}

#[test]
fn scenario_a_fallback_report_contents() {
    let (_dir, layout) = scenario_a_layout();
    let summary = load_summary(&layout).unwrap();
    let samples = load_samples(&layout).unwrap();
    let figures = load_figures(&layout).unwrap();

    let text = fallback_narrative(&summary, &samples, &figures);

    assert!(text.contains("M("));
    assert!(text.contains("Maximum multiplicity observed: 12"));
    assert!(text.contains("u=3, v=7"));
    assert!(text.contains("- heatmap_log.png\n"));
    assert!(text.contains("- slices_fixed_u.png\n"));
    assert_eq!(text.matches(".png\n").count(), 2);
    for observation in ["1. **", "2. **", "3. **"] {
        assert!(text.contains(observation));
    }
    assert!(!text.contains("4. **"));
}

#[test]
fn scenario_b_nothing_on_disk() {
    let dir = TempDir::new().unwrap();
    let layout = ArtifactLayout::new(dir.path());

    let verification = verify_artifacts(&layout);
    assert_eq!(verification.verdict(), Verdict::Failed);
    assert!(!verification.required_ok());

    let summary = load_summary(&layout).unwrap();
    let samples = load_samples(&layout).unwrap();
    let figures = load_figures(&layout).unwrap();
    assert!(summary.is_empty());
    assert!(samples.is_empty());
    assert!(figures.is_empty());

    let text = fallback_narrative(&summary, &samples, &figures);
    assert!(text.contains("## Recommendations"));
    assert_eq!(text.matches("N/A").count(), 4);
}

#[test]
fn fallback_output_is_stable_across_runs() {
    let (_dir, layout) = scenario_a_layout();
    let config = NarrationConfig::offline();

    let first = narrate(&layout, &config).unwrap();
    let second = narrate(&layout, &config).unwrap();
    assert_eq!(first.narrative.text, second.narrative.text);
    assert_eq!(first.narrative.source, NarrativeSource::Fallback);
}

#[test]
fn unset_credential_yields_exact_fallback() {
    let (_dir, layout) = scenario_a_layout();
    let summary = load_summary(&layout).unwrap();
    let samples = load_samples(&layout).unwrap();
    let figures = load_figures(&layout).unwrap();

    let config = NarrationConfig::new(None, ServiceSettings::default());
    let narrative = analyze_with_llm(&config, &summary, &samples, &figures);

    assert_eq!(narrative.text, fallback_narrative(&summary, &samples, &figures));
}

#[test]
fn request_never_carries_more_than_four_images() {
    let (_dir, layout) = scenario_a_layout();
    write(&layout.figure_path(FigureKind::HeatmapLinear), b"\x89PNG lin");
    write(&layout.figure_path(FigureKind::GrowthRate), b"\x89PNG growth");

    let figures = load_figures(&layout).unwrap();
    assert_eq!(figures.len(), 4);
    let request = build_request(&load_summary(&layout).unwrap(), &[], &figures);
    assert_eq!(request.image_count(), MAX_IMAGES);
}

#[test]
fn missing_toolchain_is_reported_as_error() {
    let dir = TempDir::new().unwrap();
    write(&dir.path().join("diophantine_exploration.ipynb"), br#"{"nbformat": 4, "cells": []}"#);

    let config = OrchestratorConfig {
        jupyter: "dioph-test-no-jupyter".into(),
        python: "dioph-test-no-python".into(),
        timeout: Duration::from_secs(10),
        ..OrchestratorConfig::default()
    };
    let result = Orchestrator::new(ArtifactLayout::new(dir.path()), config).run();
    assert!(matches!(result, Err(OrchestrateError::ToolchainExhausted { .. })));
}

#[cfg(unix)]
mod unix {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    fn executable(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    const NOTEBOOK: &str = r#"{"nbformat": 4, "nbformat_minor": 5, "metadata": {},
        "cells": [{"cell_type": "code", "source": ["%matplotlib inline\n", "print('sweep')"]}]}"#;

    const PRODUCE_ARTIFACTS: &str = r#"
mkdir -p results figures
printf '{"max_multiplicity": 12, "max_multiplicity_location": {"u": 3, "v": 7}}' > results/summary.json
printf 'u,v,multiplicity\n3,7,12\n' > results/multiplicity_samples.csv
printf 'png' > figures/heatmap_log.png
"#;

    fn workspace() -> (TempDir, TempDir) {
        let work = TempDir::new().unwrap();
        let tools = TempDir::new().unwrap();
        std::fs::write(work.path().join("diophantine_exploration.ipynb"), NOTEBOOK).unwrap();
        (work, tools)
    }

    #[test]
    fn scenario_c_missing_jupyter_runs_converted_script() {
        let (work, tools) = workspace();
        // Fake interpreter: insists on the converted script, then emits artifacts.
        let python = executable(
            tools.path(),
            "python3",
            &format!(
                "grep -q '# %matplotlib inline' \"$1\" || exit 9\n{}",
                PRODUCE_ARTIFACTS
            ),
        );

        let config = OrchestratorConfig {
            jupyter: "dioph-test-no-jupyter".into(),
            python: python.to_string_lossy().into_owned(),
            timeout: Duration::from_secs(30),
            ..OrchestratorConfig::default()
        };
        let layout = ArtifactLayout::new(work.path());
        let report = Orchestrator::new(layout.clone(), config).run().unwrap();

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].strategy, StrategyKind::Primary);
        assert!(report.outcomes[0].tool_unavailable());
        assert_eq!(report.outcomes[1].strategy, StrategyKind::Fallback);
        assert_eq!(report.outcomes[1].status, AttemptStatus::Succeeded);
        assert!(work.path().join("run_notebook_script.py").exists());
        assert_eq!(report.verdict, Verdict::PartiallyVerified);

        let outcome = narrate(&layout, &NarrationConfig::offline()).unwrap();
        assert!(outcome.narrative.text.contains("u=3, v=7"));
    }

    #[test]
    fn primary_success_executes_notebook_in_place() {
        let (work, tools) = workspace();
        let jupyter = executable(
            tools.path(),
            "jupyter",
            &format!(
                "[ \"$1\" = nbconvert ] || exit 9\n[ \"$5\" = --inplace ] || exit 9\n{}",
                PRODUCE_ARTIFACTS
            ),
        );

        let config = OrchestratorConfig {
            jupyter: jupyter.to_string_lossy().into_owned(),
            python: "dioph-test-no-python".into(),
            timeout: Duration::from_secs(30),
            ..OrchestratorConfig::default()
        };
        let report = Orchestrator::new(ArtifactLayout::new(work.path()), config)
            .run()
            .unwrap();

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.succeeded_with(), Some(StrategyKind::Primary));
        assert!(!work.path().join("run_notebook_script.py").exists());
    }

    #[test]
    fn failing_run_without_artifacts_is_failed_verdict() {
        let (work, tools) = workspace();
        let jupyter = executable(tools.path(), "jupyter", "echo kernel died >&2\nexit 1\n");
        let python = executable(tools.path(), "python3", "echo traceback >&2\nexit 1\n");

        let config = OrchestratorConfig {
            jupyter: jupyter.to_string_lossy().into_owned(),
            python: python.to_string_lossy().into_owned(),
            timeout: Duration::from_secs(30),
            ..OrchestratorConfig::default()
        };
        let report = Orchestrator::new(ArtifactLayout::new(work.path()), config)
            .run()
            .unwrap();

        assert_eq!(report.verdict, Verdict::Failed);
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].stderr, "kernel died\n");
        assert!(matches!(
            report.outcomes[1].status,
            AttemptStatus::Failed { exit_code: Some(1), .. }
        ));
    }

    #[test]
    fn hung_primary_times_out_and_falls_back() {
        let (work, tools) = workspace();
        let jupyter = executable(tools.path(), "jupyter", "sleep 30\n");
        let python = executable(tools.path(), "python3", PRODUCE_ARTIFACTS);

        let config = OrchestratorConfig {
            jupyter: jupyter.to_string_lossy().into_owned(),
            python: python.to_string_lossy().into_owned(),
            timeout: Duration::from_millis(500),
            ..OrchestratorConfig::default()
        };
        let report = Orchestrator::new(ArtifactLayout::new(work.path()), config)
            .run()
            .unwrap();

        assert!(matches!(report.outcomes[0].status, AttemptStatus::TimedOut { .. }));
        assert_eq!(report.succeeded_with(), Some(StrategyKind::Fallback));
    }
}
