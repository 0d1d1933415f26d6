//! SQLite-backed semantic index
//!
//! The index directory holds one `index.sqlite` database with two tables:
//! - `index_meta`: format version, creation time and, once fixed, the
//!   embedding dimension
//! - `units`: one row per indexed unit (text, metadata JSON, f32 blob)
//!
//! Every `add` is a single transaction that also records the dimension, so a
//! failed or interrupted batch leaves the previously committed units and the
//! recorded dimension untouched. Rows are mirrored in memory and searched
//! exhaustively by cosine similarity.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

use crate::errors::{AssistantError, Result};
use crate::types::PartRecord;

const INDEX_FILE: &str = "index.sqlite";
const FORMAT_VERSION: u32 = 2;

const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS index_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS units (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL,
    text TEXT NOT NULL,
    metadata TEXT NOT NULL,
    dimension INTEGER NOT NULL,
    embedding BLOB NOT NULL
);
";

/// Index shared between the indexer (writer) and retrievers (readers)
pub type SharedIndex = Arc<RwLock<SemanticIndex>>;

/// Searchable unit derived from one part record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedUnit {
    pub id: String,
    pub text: String,
    pub metadata: PartRecord,
    pub embedding: Vec<f32>,
}

/// A unit together with its similarity to the query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredUnit {
    pub unit: IndexedUnit,
    pub score: f32,
}

/// Persistent collection of indexed units
#[derive(Debug)]
pub struct SemanticIndex {
    // Connection is Send but not Sync; the mutex lets the index sit behind
    // a shared RwLock. Writers reach it through `get_mut`.
    conn: Mutex<Connection>,
    dimension: Option<usize>,
    units: Vec<IndexedUnit>,
}

impl SemanticIndex {
    /// Open the index at `dir`, creating the directory and database when
    /// absent and resuming every committed unit otherwise.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| unavailable(dir, e))?;
        let db_path: PathBuf = dir.join(INDEX_FILE);
        let fresh = !db_path.exists();

        let conn = Connection::open(&db_path)?;
        conn.execute_batch(SCHEMA_SQL)?;

        conn.execute(
            "INSERT OR IGNORE INTO index_meta (key, value) VALUES ('format_version', ?1), ('created_at', ?2)",
            params![FORMAT_VERSION.to_string(), Utc::now().to_rfc3339()],
        )?;

        let version = read_meta(&conn, "format_version")?;
        if version.as_deref() != Some(FORMAT_VERSION.to_string().as_str()) {
            return Err(AssistantError::RetrievalUnavailable(format!(
                "{}: unsupported index format version {}",
                db_path.display(),
                version.unwrap_or_else(|| "(missing)".to_string())
            )));
        }

        let dimension = read_meta(&conn, "dimension")?
            .map(|raw| {
                raw.parse::<usize>().map_err(|e| {
                    AssistantError::RetrievalUnavailable(format!("invalid stored dimension {raw}: {e}"))
                })
            })
            .transpose()?;
        let units = read_units(&conn, dimension)?;

        if fresh {
            tracing::info!(dir = %dir.display(), "initialized new semantic index");
        } else {
            tracing::info!(dir = %dir.display(), units = units.len(), "resumed semantic index");
        }
        Ok(Self {
            conn: Mutex::new(conn),
            dimension,
            units,
        })
    }

    /// Append units and persist them durably.
    ///
    /// The batch is validated as a whole first and then written in one
    /// transaction; nothing is kept if any part fails. No deduplication is
    /// performed.
    pub fn add(&mut self, units: Vec<IndexedUnit>) -> Result<()> {
        if units.is_empty() {
            return Ok(());
        }

        let dimension = validate_batch(&units, self.dimension)?;

        let conn = self
            .conn
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let tx = conn.transaction()?;
        if self.dimension.is_none() {
            tx.execute(
                "INSERT OR REPLACE INTO index_meta (key, value) VALUES ('dimension', ?1)",
                params![dimension.to_string()],
            )?;
        }
        {
            let mut stmt = tx.prepare(
                "INSERT INTO units (id, text, metadata, dimension, embedding) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for unit in &units {
                stmt.execute(params![
                    unit.id,
                    unit.text,
                    serde_json::to_string(&unit.metadata)?,
                    dimension as i64,
                    encode_embedding(&unit.embedding),
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!(added = units.len(), total = self.units.len() + units.len(), "persisted units");
        self.dimension = Some(dimension);
        self.units.extend(units);
        Ok(())
    }

    /// Up to `k` units ordered by descending cosine similarity.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredUnit>> {
        if k == 0 || self.units.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(expected) = self.dimension {
            if expected != query.len() {
                return Err(AssistantError::DimensionMismatch {
                    expected,
                    actual: query.len(),
                });
            }
        }

        let mut scored: Vec<(usize, f32)> = self
            .units
            .iter()
            .enumerate()
            .map(|(idx, unit)| (idx, cosine_similarity(query, &unit.embedding)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(idx, score)| ScoredUnit {
                unit: self.units[idx].clone(),
                score,
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Embedding length fixed by the first committed batch
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn into_shared(self) -> SharedIndex {
        Arc::new(RwLock::new(self))
    }
}

/// Cosine similarity; zero-length vectors score 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Check every unit and return the dimension the batch commits to
fn validate_batch(units: &[IndexedUnit], current: Option<usize>) -> Result<usize> {
    let mut dimension = current;
    for unit in units {
        if unit.text.trim().is_empty() {
            return Err(AssistantError::InvalidUnit(format!(
                "unit for part {} has empty text",
                unit.metadata.part_number
            )));
        }
        if unit.embedding.is_empty() {
            return Err(AssistantError::InvalidUnit(format!(
                "unit for part {} has an empty embedding",
                unit.metadata.part_number
            )));
        }
        match dimension {
            Some(expected) if expected != unit.embedding.len() => {
                return Err(AssistantError::DimensionMismatch {
                    expected,
                    actual: unit.embedding.len(),
                });
            }
            Some(_) => {}
            None => dimension = Some(unit.embedding.len()),
        }
    }
    dimension.ok_or_else(|| AssistantError::InvalidUnit("empty batch".to_string()))
}

fn read_meta(conn: &Connection, key: &str) -> Result<Option<String>> {
    Ok(conn
        .query_row(
            "SELECT value FROM index_meta WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?)
}

fn read_units(conn: &Connection, dimension: Option<usize>) -> Result<Vec<IndexedUnit>> {
    let mut stmt =
        conn.prepare("SELECT seq, id, text, metadata, dimension, embedding FROM units ORDER BY seq")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, i64>(4)?,
            row.get::<_, Vec<u8>>(5)?,
        ))
    })?;

    let mut units = Vec::new();
    for row in rows {
        let (seq, id, text, metadata, row_dim, blob) = row?;
        let corrupt = |reason: String| {
            AssistantError::RetrievalUnavailable(format!("corrupt unit row {seq}: {reason}"))
        };

        if dimension != Some(row_dim as usize) {
            return Err(corrupt(format!(
                "dimension {row_dim} does not match the index dimension {dimension:?}"
            )));
        }
        let metadata: PartRecord =
            serde_json::from_str(&metadata).map_err(|e| corrupt(e.to_string()))?;
        let embedding = decode_embedding(&blob, row_dim as usize).map_err(corrupt)?;

        units.push(IndexedUnit {
            id,
            text,
            metadata,
            embedding,
        });
    }
    Ok(units)
}

fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(std::mem::size_of_val(vector));
    for &value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn decode_embedding(blob: &[u8], dimension: usize) -> std::result::Result<Vec<f32>, String> {
    if blob.len() != dimension * std::mem::size_of::<f32>() {
        return Err(format!(
            "embedding blob is {} bytes, expected {}",
            blob.len(),
            dimension * std::mem::size_of::<f32>()
        ));
    }
    Ok(blob
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

fn unavailable(path: &Path, err: impl std::fmt::Display) -> AssistantError {
    AssistantError::RetrievalUnavailable(format!("{}: {}", path.display(), err))
}
