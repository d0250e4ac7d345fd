//! Fixed on-disk layout shared by the orchestrator and the narration pipeline.

use std::path::{Path, PathBuf};

use crate::figures::FigureKind;

pub const RESULTS_DIR: &str = "results";
pub const FIGURES_DIR: &str = "figures";
pub const SUMMARY_FILE: &str = "summary.json";
pub const SAMPLES_FILE: &str = "multiplicity_samples.csv";
pub const REPORT_FILE: &str = "llm_analysis.md";
pub const DEFAULT_NOTEBOOK: &str = "diophantine_exploration.ipynb";
/// Intermediate script written next to the notebook by the fallback strategy.
pub const FALLBACK_SCRIPT: &str = "run_notebook_script.py";

/// Resolves every artifact path relative to a working root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    root: PathBuf,
}

impl ArtifactLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn results_dir(&self) -> PathBuf {
        self.root.join(RESULTS_DIR)
    }

    pub fn figures_dir(&self) -> PathBuf {
        self.root.join(FIGURES_DIR)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.results_dir().join(SUMMARY_FILE)
    }

    pub fn samples_path(&self) -> PathBuf {
        self.results_dir().join(SAMPLES_FILE)
    }

    pub fn figure_path(&self, kind: FigureKind) -> PathBuf {
        self.figures_dir().join(kind.file_name())
    }

    pub fn report_path(&self) -> PathBuf {
        self.results_dir().join(REPORT_FILE)
    }

    /// Resolve a notebook path; relative paths are taken from the root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Required outputs of the computation, in verification order.
    pub fn required_artifacts(&self) -> Vec<PathBuf> {
        vec![self.summary_path(), self.samples_path()]
    }

    /// Optional outputs; their absence only downgrades verification.
    pub fn optional_artifacts(&self) -> Vec<PathBuf> {
        FigureKind::ALL
            .iter()
            .map(|kind| self.figure_path(*kind))
            .collect()
    }
}

impl Default for ArtifactLayout {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_fixed_layout() {
        let layout = ArtifactLayout::new("/work");
        assert_eq!(layout.summary_path(), Path::new("/work/results/summary.json"));
        assert_eq!(
            layout.samples_path(),
            Path::new("/work/results/multiplicity_samples.csv")
        );
        assert_eq!(layout.report_path(), Path::new("/work/results/llm_analysis.md"));
        assert_eq!(
            layout.figure_path(FigureKind::GrowthRate),
            Path::new("/work/figures/growth_rate.png")
        );
    }

    #[test]
    fn optional_artifacts_follow_figure_order() {
        let layout = ArtifactLayout::new("r");
        let names: Vec<String> = layout
            .optional_artifacts()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "heatmap_log.png",
                "heatmap_linear.png",
                "slices_fixed_u.png",
                "growth_rate.png"
            ]
        );
    }

    #[test]
    fn resolve_keeps_absolute_paths() {
        let layout = ArtifactLayout::new("/work");
        assert_eq!(
            layout.resolve(Path::new("nb.ipynb")),
            Path::new("/work/nb.ipynb")
        );
        assert_eq!(
            layout.resolve(Path::new("/elsewhere/nb.ipynb")),
            Path::new("/elsewhere/nb.ipynb")
        );
    }
}
