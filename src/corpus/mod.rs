//! Document source: line-delimited JSON part records
//!
//! The whole source is parsed before anything is handed to the indexer, so a
//! malformed line aborts indexing without touching a previously persisted
//! index.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::errors::{AssistantError, Result};
use crate::types::PartRecord;

/// Read every record from a JSONL file
pub fn load_records(path: &Path) -> Result<Vec<PartRecord>> {
    let file = File::open(path).map_err(|e| AssistantError::CorpusFormat {
        line: 0,
        reason: format!("cannot open {}: {}", path.display(), e),
    })?;
    let records = parse_records(BufReader::new(file))?;
    tracing::info!(path = %path.display(), records = records.len(), "loaded part corpus");
    Ok(records)
}

/// Parse JSONL from any reader. Blank lines are skipped; line numbers in
/// errors are 1-based.
pub fn parse_records<R: BufRead>(reader: R) -> Result<Vec<PartRecord>> {
    let mut records = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|e| AssistantError::CorpusFormat {
            line: line_no,
            reason: e.to_string(),
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let record: PartRecord =
            serde_json::from_str(&line).map_err(|e| AssistantError::CorpusFormat {
                line: line_no,
                reason: e.to_string(),
            })?;
        records.push(record);
    }

    Ok(records)
}
