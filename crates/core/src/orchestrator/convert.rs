//! Notebook-to-script conversion used by the fallback strategy.
//!
//! Code cells are emitted in order behind `# In[n]:` markers. Markdown
//! cells become comment blocks. IPython magics and shell escapes have no
//! meaning to a plain interpreter, so they are commented out; a cell
//! magic (`%%...`) comments out its whole cell.

use serde::Deserialize;

/// Oldest nbformat major version with a flat `cells` list.
const MIN_NBFORMAT: u32 = 4;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("notebook is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported nbformat {0} (need {min} or later)", min = MIN_NBFORMAT)]
    UnsupportedFormat(u32),
}

#[derive(Deserialize)]
struct Notebook {
    nbformat: u32,
    #[serde(default)]
    cells: Vec<Cell>,
}

#[derive(Deserialize)]
struct Cell {
    cell_type: String,
    #[serde(default)]
    source: CellSource,
}

/// nbformat allows a cell's source as one string or a list of lines.
#[derive(Deserialize)]
#[serde(untagged)]
enum CellSource {
    Lines(Vec<String>),
    Text(String),
}

impl Default for CellSource {
    fn default() -> Self {
        CellSource::Text(String::new())
    }
}

impl CellSource {
    fn text(&self) -> String {
        match self {
            CellSource::Lines(lines) => lines.concat(),
            CellSource::Text(text) => text.clone(),
        }
    }
}

/// Convert notebook JSON into a runnable Python script.
pub fn notebook_to_script(notebook_json: &str) -> Result<String, ConvertError> {
    let notebook: Notebook = serde_json::from_str(notebook_json)?;
    if notebook.nbformat < MIN_NBFORMAT {
        return Err(ConvertError::UnsupportedFormat(notebook.nbformat));
    }

    let mut script = String::from("#!/usr/bin/env python\n# coding: utf-8\n");
    let mut counter = 0;
    for cell in &notebook.cells {
        let source = cell.source.text();
        match cell.cell_type.as_str() {
            "code" => {
                counter += 1;
                script.push_str(&format!("\n# In[{}]:\n\n\n", counter));
                script.push_str(&neutralize_magics(&source));
                script.push_str("\n\n");
            }
            "markdown" => {
                script.push('\n');
                for line in source.lines() {
                    if line.is_empty() {
                        script.push_str("#\n");
                    } else {
                        script.push_str(&format!("# {}\n", line));
                    }
                }
                script.push('\n');
            }
            _ => {}
        }
    }
    Ok(script)
}

fn neutralize_magics(source: &str) -> String {
    let cell_magic = source.trim_start().starts_with("%%");
    source
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            if cell_magic || trimmed.starts_with('%') || trimmed.starts_with('!') {
                format!("# {}", line)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
