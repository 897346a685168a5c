//! Turn raw model answers into tables
//!
//! Each answer is parsed as JSON (markdown fences tolerated) and flattened.
//! Answers that do not parse are kept verbatim under [`RAW_KEY`].

use crate::flatten::flatten;
use crate::table::Table;
use crate::types::ExtractionResults;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

/// Key holding an answer that could not be parsed
pub const RAW_KEY: &str = "result_raw";

/// Top-level key the model uses for provenance notes; left out of tables
pub const EXPLAIN_KEY: &str = "explain";

/// A model answer after parsing
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedAnswer {
    /// Parsed JSON, flattened to key paths
    Flat(IndexMap<String, Value>),
    /// Unparseable answer, verbatim
    Raw(String),
}

impl NormalizedAnswer {
    /// Parse and flatten a raw answer
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(strip_fences(raw)) {
            Ok(value) => NormalizedAnswer::Flat(flatten(&value)),
            Err(e) => {
                debug!(error = %e, "Answer is not JSON; keeping raw text");
                NormalizedAnswer::Raw(raw.to_string())
            }
        }
    }

    /// Key paths and values, with the raw fallback under [`RAW_KEY`]
    pub fn into_map(self) -> IndexMap<String, Value> {
        match self {
            NormalizedAnswer::Flat(map) => map,
            NormalizedAnswer::Raw(raw) => {
                let mut map = IndexMap::new();
                map.insert(RAW_KEY.to_string(), Value::String(raw));
                map
            }
        }
    }
}

/// Remove surrounding whitespace and a markdown code fence, if any
fn strip_fences(response: &str) -> &str {
    let trimmed = response.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }

    // Drop the opening fence line (```json or ```) and the closing fence
    let body = match trimmed.find('\n') {
        Some(newline) => &trimmed[newline + 1..],
        None => return trimmed,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

fn is_explain(key: &str) -> bool {
    key == EXPLAIN_KEY
        || key
            .strip_prefix(EXPLAIN_KEY)
            .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('['))
}

/// One row per document: `filename`, then `<field>.<key>` for every
/// flattened key, or the bare `<field>` for an unparseable answer
pub fn wide_table(results: &ExtractionResults) -> Table {
    let mut table = Table::new();

    for (filename, records) in results {
        let mut row = IndexMap::new();
        row.insert("filename".to_string(), Value::String(filename.clone()));

        for record in records {
            match NormalizedAnswer::parse(&record.result) {
                NormalizedAnswer::Raw(raw) => {
                    warn!(document = %filename, field = %record.field, "Unparseable answer kept verbatim");
                    row.insert(raw_column(&record.field), Value::String(raw));
                }
                NormalizedAnswer::Flat(mut flat) if is_raw_only(&flat) => {
                    if let Some(raw) = flat.shift_remove(RAW_KEY) {
                        row.insert(raw_column(&record.field), raw);
                    }
                }
                NormalizedAnswer::Flat(flat) => {
                    if flat.is_empty() {
                        debug!(document = %filename, field = %record.field, "Empty answer");
                    }
                    for (key, value) in flat {
                        if is_explain(&key) {
                            continue;
                        }
                        row.insert(join_column(&record.field, &key), value);
                    }
                }
            }
        }

        table.push_row(row);
    }

    table
}

/// One row per (document, field): `filename`, `field`, then the flattened keys
pub fn long_table(results: &ExtractionResults) -> Table {
    let mut table = Table::new();

    for (filename, records) in results {
        for record in records {
            let mut row = IndexMap::new();
            row.insert("filename".to_string(), Value::String(filename.clone()));
            row.insert("field".to_string(), Value::String(record.field.clone()));

            for (key, value) in NormalizedAnswer::parse(&record.result).into_map() {
                if !is_explain(&key) {
                    row.insert(answer_column(key), value);
                }
            }
            table.push_row(row);
        }
    }

    table
}

/// Identity columns of the long table; answer keys never overwrite them
const IDENTITY_COLUMNS: [&str; 2] = ["filename", "field"];

/// Prefix for answer keys that collide with an identity column
const ANSWER_PREFIX: &str = "result";

fn answer_column(key: String) -> String {
    if IDENTITY_COLUMNS.contains(&key.as_str()) {
        format!("{}.{}", ANSWER_PREFIX, key)
    } else {
        key
    }
}

/// Wide column holding a field's verbatim answer
fn raw_column(field: &str) -> String {
    if field == IDENTITY_COLUMNS[0] {
        join_column(field, RAW_KEY)
    } else {
        field.to_string()
    }
}

fn is_raw_only(flat: &IndexMap<String, Value>) -> bool {
    flat.len() == 1 && flat.contains_key(RAW_KEY)
}

fn join_column(field: &str, key: &str) -> String {
    if key.starts_with('[') {
        format!("{}{}", field, key)
    } else {
        format!("{}.{}", field, key)
    }
}
