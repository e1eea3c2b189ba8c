//! Storyboard rows as exported by the editor, and their reduction to timed playback items.
//!
//! Rows come from the editor's JSON export. The editor's spreadsheet headers are accepted as
//! field aliases so an exported sheet can be fed in without renaming columns.

use std::{fs::File, io::BufReader, path::Path, time::Duration};

use anyhow::Context as _;
use serde::Deserialize as _;

use crate::foundation::core::{DEFAULT_ITEM_DURATION, StoryboardItem};
use crate::foundation::error::{ReelError, ReelResult};

/// One editable storyboard row.
///
/// Only `duration` matters to playback; the remaining cells are carried for viewports that
/// render them.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StoryboardRow {
    /// Editor-assigned row id.
    pub id: Option<u64>,
    /// Shot number.
    #[serde(alias = "镜号", deserialize_with = "de_cell")]
    pub shot: String,
    /// Framing (wide, close-up, ...).
    #[serde(alias = "景别", deserialize_with = "de_cell")]
    pub angle: String,
    /// Camera position.
    #[serde(alias = "机位", deserialize_with = "de_cell")]
    pub camera: String,
    /// Camera movement.
    #[serde(alias = "运镜", deserialize_with = "de_cell")]
    pub movement: String,
    /// Free-form content notes.
    #[serde(deserialize_with = "de_cell")]
    pub content: String,
    /// Shot analysis / script text.
    #[serde(alias = "镜头分析", deserialize_with = "de_cell")]
    pub script: String,
    /// Raw duration cell in milliseconds; see [`resolve_duration`].
    #[serde(alias = "时长")]
    pub duration: Option<serde_json::Value>,
    /// Optional path of an image attached to the row.
    pub image: Option<String>,
}

impl StoryboardRow {
    /// Attached image path, ignoring empty cells.
    pub fn image_path(&self) -> Option<&Path> {
        self.image
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Path::new)
    }
}

/// Spreadsheet cells may hold numbers where the editor expects text.
fn de_cell<'de, D>(d: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(d)? {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Resolve a raw duration cell into a positive playback duration.
///
/// Numbers and numeric strings are read as milliseconds (fractions are truncated). Anything
/// missing, non-numeric, non-finite or below one millisecond falls back to
/// [`DEFAULT_ITEM_DURATION`].
pub fn resolve_duration(cell: Option<&serde_json::Value>) -> Duration {
    let millis = match cell {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match millis {
        Some(ms) if ms.is_finite() && ms >= 1.0 => Duration::from_millis(ms.floor() as u64),
        _ => DEFAULT_ITEM_DURATION,
    }
}

/// Ordered storyboard rows.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Storyboard {
    /// Rows in playback order.
    pub rows: Vec<StoryboardRow>,
}

impl Storyboard {
    /// Wrap already-parsed rows.
    pub fn new(rows: Vec<StoryboardRow>) -> Self {
        Self { rows }
    }

    /// Parse a storyboard from a JSON array of rows.
    pub fn from_json_str(json: &str) -> ReelResult<Self> {
        serde_json::from_str(json).map_err(|e| ReelError::serde(format!("storyboard JSON: {e}")))
    }

    /// Read a storyboard JSON file.
    pub fn load(path: &Path) -> ReelResult<Self> {
        let f = File::open(path)
            .with_context(|| format!("open storyboard '{}'", path.display()))?;
        serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            ReelError::serde(format!("storyboard '{}': {e}", path.display()))
        })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Return `true` when there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Snapshot the rows into playback items, resolving every duration once.
    pub fn items(&self) -> Vec<StoryboardItem> {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let duration = resolve_duration(row.duration.as_ref());
                StoryboardItem::new(i, duration)
                    .unwrap_or_else(|_| StoryboardItem::with_default_duration(i))
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "../tests/unit/storyboard.rs"]
mod tests;
