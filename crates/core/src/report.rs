use std::path::PathBuf;

use crate::error::NarrateError;
use crate::layout::ArtifactLayout;

/// Characters shown by [`preview`].
pub const PREVIEW_CHARS: usize = 500;

/// Write the report, replacing any previous one. Returns its path.
pub fn write_report(layout: &ArtifactLayout, text: &str) -> Result<PathBuf, NarrateError> {
    let dir = layout.results_dir();
    std::fs::create_dir_all(&dir).map_err(|e| NarrateError::io(&dir, e))?;

    let path = layout.report_path();
    std::fs::write(&path, text).map_err(|e| NarrateError::io(&path, e))?;
    tracing::info!(path = %path.display(), bytes = text.len(), "report written");
    Ok(path)
}

/// First [`PREVIEW_CHARS`] characters, with `...` appended when cut.
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
