//! Loaders for the summary record and the sampled multiplicity table.
//!
//! Both loaders treat an absent file as "no data" and return an empty
//! container. A file that exists but cannot be parsed is a
//! [`NarrateError::CorruptArtifact`].

use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::error::NarrateError;
use crate::layout::ArtifactLayout;

/// Token substituted for a summary field that is absent.
pub const PLACEHOLDER: &str = "N/A";
/// Token substituted for a sample column that is absent.
pub const SAMPLE_PLACEHOLDER: &str = "?";

/// Summary statistics produced by the computation, in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultsSummary(Map<String, Value>);

impl ResultsSummary {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Render a top-level field, or [`PLACEHOLDER`] when absent.
    pub fn display(&self, key: &str) -> String {
        self.get(key)
            .map(|v| display_value(v, PLACEHOLDER))
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    }

    /// Render `key.field` for an object-valued field, or [`PLACEHOLDER`].
    pub fn display_nested(&self, key: &str, field: &str) -> String {
        self.get(key)
            .and_then(|v| v.get(field))
            .map(|v| display_value(v, PLACEHOLDER))
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// One row of the sampled (u, v, multiplicity) table, columns in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SampleRecord(Map<String, Value>);

impl SampleRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// Render a column, or [`SAMPLE_PLACEHOLDER`] when absent.
    pub fn display(&self, column: &str) -> String {
        self.get(column)
            .map(|v| display_value(v, SAMPLE_PLACEHOLDER))
            .unwrap_or_else(|| SAMPLE_PLACEHOLDER.to_string())
    }
}

/// Read `results/summary.json`. Absent file -> empty summary.
pub fn load_summary(layout: &ArtifactLayout) -> Result<ResultsSummary, NarrateError> {
    let path = layout.summary_path();
    if !path.exists() {
        tracing::warn!(path = %path.display(), "summary not found; continuing without it");
        return Ok(ResultsSummary::default());
    }
    let content = std::fs::read_to_string(&path).map_err(|e| NarrateError::io(&path, e))?;
    parse_summary(&content).map_err(|reason| NarrateError::corrupt(&path, reason))
}

/// Read `results/multiplicity_samples.csv`. Absent file -> empty set.
pub fn load_samples(layout: &ArtifactLayout) -> Result<Vec<SampleRecord>, NarrateError> {
    let path = layout.samples_path();
    if !path.exists() {
        tracing::warn!(path = %path.display(), "sample table not found; continuing without it");
        return Ok(Vec::new());
    }
    let bytes = std::fs::read(&path).map_err(|e| NarrateError::io(&path, e))?;
    parse_samples(&bytes, &path)
}

fn parse_summary(content: &str) -> Result<ResultsSummary, String> {
    match serde_json::from_str::<Value>(content).map_err(|e| e.to_string())? {
        Value::Object(fields) => Ok(ResultsSummary(fields)),
        other => Err(format!(
            "expected a JSON object, found {}",
            json_kind(&other)
        )),
    }
}

fn parse_samples(bytes: &[u8], path: &Path) -> Result<Vec<SampleRecord>, NarrateError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| NarrateError::corrupt(path, e))?
        .clone();

    let mut samples = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| NarrateError::corrupt(path, e))?;
        let fields = headers
            .iter()
            .zip(record.iter())
            .map(|(column, cell)| (column.to_string(), parse_cell(cell)))
            .collect();
        samples.push(SampleRecord(fields));
    }
    Ok(samples)
}

/// Infer a JSON value for a CSV cell: integer, float, bool, null, or text.
fn parse_cell(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = cell.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(f) = cell.parse::<f64>() {
        if let Some(n) = Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    match cell {
        "True" | "true" | "TRUE" => Value::Bool(true),
        "False" | "false" | "FALSE" => Value::Bool(false),
        _ => Value::String(cell.to_string()),
    }
}

/// Strings render bare; null renders as the placeholder.
fn display_value(value: &Value, placeholder: &str) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => placeholder.to_string(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn layout() -> (TempDir, ArtifactLayout) {
        let dir = TempDir::new().unwrap();
        let layout = ArtifactLayout::new(dir.path());
        std::fs::create_dir_all(layout.results_dir()).unwrap();
        (dir, layout)
    }

    #[test]
    fn absent_summary_is_empty() {
        let dir = TempDir::new().unwrap();
        let summary = load_summary(&ArtifactLayout::new(dir.path())).unwrap();
        assert!(summary.is_empty());
        assert_eq!(summary.display("max_multiplicity"), "N/A");
        assert_eq!(summary.display_nested("max_multiplicity_location", "u"), "N/A");
    }

    #[test]
    fn summary_fields_render_without_quotes() {
        let (_dir, layout) = layout();
        std::fs::write(
            layout.summary_path(),
            r#"{"max_multiplicity": 12, "max_multiplicity_location": {"u": 3, "v": 7}, "label": "sweep-a", "ratio": 0.5}"#,
        )
        .unwrap();

        let summary = load_summary(&layout).unwrap();
        assert_eq!(summary.display("max_multiplicity"), "12");
        assert_eq!(summary.display_nested("max_multiplicity_location", "u"), "3");
        assert_eq!(summary.display_nested("max_multiplicity_location", "v"), "7");
        assert_eq!(summary.display("label"), "sweep-a");
        assert_eq!(summary.display("ratio"), "0.5");
        assert_eq!(summary.display("total_computed"), "N/A");
    }

    #[test]
    fn summary_preserves_file_key_order() {
        let (_dir, layout) = layout();
        std::fs::write(layout.summary_path(), r#"{"z": 1, "a": 2, "m": 3}"#).unwrap();

        let summary = load_summary(&layout).unwrap();
        let keys: Vec<&str> = summary.as_map().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn malformed_summary_is_corrupt() {
        let (_dir, layout) = layout();
        std::fs::write(layout.summary_path(), "{not json").unwrap();
        let err = load_summary(&layout).unwrap_err();
        assert!(matches!(err, NarrateError::CorruptArtifact { .. }), "{err}");
    }

    #[test]
    fn non_object_summary_is_corrupt() {
        let (_dir, layout) = layout();
        std::fs::write(layout.summary_path(), "[1, 2, 3]").unwrap();
        let err = load_summary(&layout).unwrap_err();
        assert!(err.to_string().contains("expected a JSON object, found an array"));
    }

    #[test]
    fn absent_samples_are_empty() {
        let dir = TempDir::new().unwrap();
        assert!(load_samples(&ArtifactLayout::new(dir.path()))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn samples_keep_file_order_and_infer_types() {
        let (_dir, layout) = layout();
        std::fs::write(
            layout.samples_path(),
            "u,v,multiplicity,density\n3,7,12,0.25\n1,1,1,\n2,5,4,1e-3\n",
        )
        .unwrap();

        let samples = load_samples(&layout).unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].get("u"), Some(&json!(3)));
        assert_eq!(samples[0].get("density"), Some(&json!(0.25)));
        assert_eq!(samples[1].get("density"), Some(&Value::Null));
        assert_eq!(samples[2].display("multiplicity"), "4");
        assert_eq!(samples[2].display("missing_column"), "?");

        let columns: Vec<&str> = samples[0].0.keys().map(String::as_str).collect();
        assert_eq!(columns, vec!["u", "v", "multiplicity", "density"]);
    }

    #[test]
    fn ragged_csv_is_corrupt() {
        let (_dir, layout) = layout();
        std::fs::write(layout.samples_path(), "u,v,multiplicity\n1,2\n").unwrap();
        let err = load_samples(&layout).unwrap_err();
        assert!(matches!(err, NarrateError::CorruptArtifact { .. }), "{err}");
    }

    #[test]
    fn cells_parse_to_expected_json() {
        assert_eq!(parse_cell("42"), json!(42));
        assert_eq!(parse_cell("-3"), json!(-3));
        assert_eq!(parse_cell("2.5"), json!(2.5));
        assert_eq!(parse_cell("True"), json!(true));
        assert_eq!(parse_cell("NaN"), json!("NaN"));
        assert_eq!(parse_cell("feasible"), json!("feasible"));
        assert_eq!(parse_cell(""), Value::Null);
    }
}
