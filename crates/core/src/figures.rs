//! Figure discovery and transport encoding.
//!
//! Only the four known figure kinds are ever loaded; anything else in the
//! figures directory is ignored. A missing figure is silently skipped.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::error::NarrateError;
use crate::layout::ArtifactLayout;

/// The closed set of figures the computation can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FigureKind {
    HeatmapLog,
    HeatmapLinear,
    SlicesFixedU,
    GrowthRate,
}

impl FigureKind {
    /// All kinds in their fixed enumeration order.
    pub const ALL: [FigureKind; 4] = [
        FigureKind::HeatmapLog,
        FigureKind::HeatmapLinear,
        FigureKind::SlicesFixedU,
        FigureKind::GrowthRate,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            FigureKind::HeatmapLog => "heatmap_log.png",
            FigureKind::HeatmapLinear => "heatmap_linear.png",
            FigureKind::SlicesFixedU => "slices_fixed_u.png",
            FigureKind::GrowthRate => "growth_rate.png",
        }
    }

    /// Look up a kind by its file name.
    pub fn from_file_name(name: &str) -> Option<FigureKind> {
        FigureKind::ALL
            .into_iter()
            .find(|kind| kind.file_name() == name)
    }
}

/// A rendered figure read from disk, ready for embedding in a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FigureArtifact {
    pub kind: FigureKind,
    pub path: PathBuf,
    /// Standard base64 of the file contents.
    pub encoded: String,
}

impl FigureArtifact {
    pub fn name(&self) -> &'static str {
        self.kind.file_name()
    }

    /// `data:` URL carrying the encoded PNG.
    pub fn data_url(&self) -> String {
        format!("data:image/png;base64,{}", self.encoded)
    }
}

/// Read a file and return the standard base64 encoding of its bytes.
pub fn encode_figure(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(BASE64.encode(bytes))
}

/// Load every present figure, in [`FigureKind::ALL`] order.
///
/// Absent files are skipped. A file that exists but cannot be read is an
/// error and aborts narration.
pub fn load_figures(layout: &ArtifactLayout) -> Result<Vec<FigureArtifact>, NarrateError> {
    let mut figures = Vec::new();
    for kind in FigureKind::ALL {
        let path = layout.figure_path(kind);
        if !path.exists() {
            tracing::debug!(figure = kind.file_name(), "figure not present");
            continue;
        }
        let encoded = encode_figure(&path).map_err(|e| NarrateError::io(&path, e))?;
        figures.push(FigureArtifact {
            kind,
            path,
            encoded,
        });
    }
    Ok(figures)
}
