//! Declared metadata columns and alignment of transform metadata to them.

use log::warn;
use serde_json::Value;

use crate::Metadata;

/// Columns every log row starts with. Declared metadata columns may not reuse these names.
pub const RESERVED_COLUMNS: [&str; 3] = ["filepath", "success", "message"];

/// Ordered metadata column set agreed once per run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetadataSchema {
    columns: Vec<String>,
}

/// Result of [`MetadataSchema::align`]: values in column order plus the keys that did not fit.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AlignedMetadata {
    pub values: Vec<String>,
    /// Declared columns the transform did not provide (padded with empty values).
    pub missing: Vec<String>,
    /// Keys the transform provided that are not declared (dropped).
    pub extra: Vec<String>,
}

impl MetadataSchema {
    /// Build a schema, dropping reserved names and duplicates while keeping declaration order.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut kept: Vec<String> = Vec::new();
        for col in columns {
            let col = col.into();
            if RESERVED_COLUMNS.contains(&col.as_str()) {
                warn!("Metadata column '{}' is reserved; ignoring it", col);
                continue;
            }
            if kept.contains(&col) {
                warn!("Metadata column '{}' declared twice; keeping the first", col);
                continue;
            }
            kept.push(col);
        }
        Self { columns: kept }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Full log column order: reserved columns, then declared metadata columns.
    pub fn column_order(&self) -> Vec<String> {
        RESERVED_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.columns.iter().cloned())
            .collect()
    }

    /// One empty value per declared column.
    pub fn empty_values(&self) -> Vec<String> {
        vec![String::new(); self.columns.len()]
    }

    /// Project `metadata` onto the declared columns. Missing keys become empty values, unknown
    /// keys are dropped. The returned `values` always has exactly [`Self::len`] entries.
    pub fn align(&self, metadata: Option<&Metadata>) -> AlignedMetadata {
        let Some(metadata) = metadata else {
            return AlignedMetadata {
                values: self.empty_values(),
                ..AlignedMetadata::default()
            };
        };
        let mut aligned = AlignedMetadata::default();
        for col in &self.columns {
            match metadata.get(col) {
                Some(v) => aligned.values.push(render_value(v)),
                None => {
                    aligned.values.push(String::new());
                    aligned.missing.push(col.clone());
                }
            }
        }
        let mut extra: Vec<String> = metadata
            .keys()
            .filter(|k| !self.columns.contains(k))
            .cloned()
            .collect();
        extra.sort();
        aligned.extra = extra;
        aligned
    }
}

/// Log text for one metadata value: strings verbatim, `null` empty, anything else compact JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        other => other.to_string(),
    }
}
