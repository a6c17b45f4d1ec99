//! PlateRegistry - Durable Gate Event Registry
//!
//! ## Responsibilities
//!
//! - Load the append-only CSV registry at startup (fatal on corruption)
//! - Resolve a plate's current state (most recent record wins)
//! - Append toggle events: durable write first, in-memory index second
//! - Notify the optional mirror sink after a successful durable append
//!
//! The CSV file is the single source of truth. A failed append leaves the
//! in-memory index untouched so log and memory can never diverge.

use crate::error::{Error, Result};
use crate::mirror::MirrorEntry;
use crate::normalizer::normalize;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Timestamp layout used in the CSV and the mirror (local wall clock)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const CSV_HEADER: [&str; 5] = ["ID", "Plate", "Event", "Timestamp", "Owner"];

/// UTF-8 byte order mark; the log is written signature-safe so
/// spreadsheet tools open it correctly, and tolerated on read.
const UTF8_BOM: &str = "\u{feff}";

/// Gate event state, exactly two values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateEvent {
    Entrada,
    Salida,
}

impl GateEvent {
    /// The toggle rule: a new event is always the opposite of the last one
    pub fn opposite(self) -> Self {
        match self {
            GateEvent::Entrada => GateEvent::Salida,
            GateEvent::Salida => GateEvent::Entrada,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GateEvent::Entrada => "entrada",
            GateEvent::Salida => "salida",
        }
    }
}

impl std::fmt::Display for GateEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GateEvent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "entrada" => Ok(GateEvent::Entrada),
            "salida" => Ok(GateEvent::Salida),
            other => Err(Error::Parse(format!("unknown gate event '{other}'"))),
        }
    }
}

/// One observed gate event, one CSV row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlateRecord {
    /// Monotonically increasing, never reused, survives reloads
    pub id: u64,
    /// Canonical uppercase alphanumeric plate
    pub plate: String,
    pub event: GateEvent,
    /// Local wall-clock time, second resolution
    pub timestamp: NaiveDateTime,
    /// Free text, immutable per plate once first recorded
    pub owner: String,
}

/// PlateRegistry instance
///
/// Owned by the recognition loop; single writer, no locking.
#[derive(Debug)]
pub struct PlateRegistry {
    path: PathBuf,
    records: Vec<PlateRecord>,
    mirror: Option<mpsc::UnboundedSender<MirrorEntry>>,
}

impl PlateRegistry {
    /// Load the registry from the durable CSV log.
    ///
    /// A missing file yields an empty registry (header is written on the
    /// first append). Any structurally bad row is fatal: silently skipping
    /// rows would miscompute `next_id` and could misread a plate's state.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            tracing::warn!(path = %path.display(), "Registry CSV not found, starting empty");
            return Ok(Self {
                path,
                records: Vec::new(),
                mirror: None,
            });
        }

        let content = std::fs::read_to_string(&path)?;
        let content = content.strip_prefix(UTF8_BOM).unwrap_or(&content);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut records = Vec::new();
        for (idx, row) in reader.records().enumerate() {
            // +2: one-based, plus the header row
            let line = idx + 2;
            let row = row.map_err(|e| Error::CorruptLog {
                line,
                reason: e.to_string(),
            })?;

            if row.len() < 5 {
                return Err(Error::CorruptLog {
                    line,
                    reason: format!("expected 5 fields, found {}", row.len()),
                });
            }

            let id = row[0].trim().parse::<u64>().map_err(|_| Error::CorruptLog {
                line,
                reason: format!("bad record id '{}'", &row[0]),
            })?;
            let event = row[2].parse::<GateEvent>().map_err(|_| Error::CorruptLog {
                line,
                reason: format!("bad event '{}'", &row[2]),
            })?;
            let timestamp = NaiveDateTime::parse_from_str(row[3].trim(), TIMESTAMP_FORMAT)
                .map_err(|_| Error::CorruptLog {
                    line,
                    reason: format!("bad timestamp '{}'", &row[3]),
                })?;

            records.push(PlateRecord {
                id,
                // Re-normalize so an externally re-hyphenated file
                // (ABC-123 vs ABC123) keeps matching lookups
                plate: normalize(&row[1]),
                event,
                timestamp,
                owner: row[4].trim().to_string(),
            });
        }

        tracing::info!(
            path = %path.display(),
            records = records.len(),
            "Registry loaded"
        );

        Ok(Self {
            path,
            records,
            mirror: None,
        })
    }

    /// Attach the mirror sink channel (observer, post-durable-append only)
    pub fn with_mirror(mut self, tx: mpsc::UnboundedSender<MirrorEntry>) -> Self {
        self.mirror = Some(tx);
        self
    }

    /// Most recent record for a canonical plate, newest first
    pub fn lookup(&self, plate: &str) -> Option<&PlateRecord> {
        self.records.iter().rev().find(|r| r.plate == plate)
    }

    /// Next record id: max existing + 1, or 1 when empty
    pub fn next_id(&self) -> u64 {
        self.records.iter().map(|r| r.id).max().map_or(1, |m| m + 1)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append one gate event.
    ///
    /// Ordering is load-bearing: CSV row written and fsynced first, then
    /// the in-memory index, then the best-effort mirror notification. On a
    /// write failure the record is not indexed and the id is not consumed;
    /// the caller treats this as retryable infrastructure failure.
    pub fn append(&mut self, plate: &str, event: GateEvent, owner: &str) -> Result<PlateRecord> {
        let record = PlateRecord {
            id: self.next_id(),
            plate: plate.to_string(),
            event,
            timestamp: Local::now().naive_local(),
            owner: owner.to_string(),
        };

        self.write_durable(&record)?;

        self.records.push(record.clone());

        if let Some(tx) = &self.mirror {
            let entry = MirrorEntry {
                plate: record.plate.clone(),
                event: record.event,
                timestamp: record.timestamp,
                owner: record.owner.clone(),
            };
            if tx.send(entry).is_err() {
                tracing::warn!("Mirror task gone, entry dropped");
            }
        }

        tracing::info!(
            id = record.id,
            plate = %record.plate,
            event = %record.event,
            "Registry row appended"
        );

        Ok(record)
    }

    /// Append the row to the CSV and flush it all the way to disk
    fn write_durable(&self, record: &PlateRecord) -> Result<()> {
        // Missing or zero-length file still needs the signature + header
        let needs_header = std::fs::metadata(&self.path).map_or(true, |m| m.len() == 0);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if needs_header {
            file.write_all(UTF8_BOM.as_bytes())?;
        }

        let id = record.id.to_string();
        let timestamp = record.timestamp.format(TIMESTAMP_FORMAT).to_string();

        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(&mut file);
            if needs_header {
                writer.write_record(CSV_HEADER)?;
            }
            writer.write_record([
                id.as_str(),
                record.plate.as_str(),
                record.event.as_str(),
                timestamp.as_str(),
                record.owner.as_str(),
            ])?;
            writer.flush()?;
        }

        file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_csv() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registro.csv");
        (dir, path)
    }

    #[test]
    fn test_event_toggle() {
        assert_eq!(GateEvent::Entrada.opposite(), GateEvent::Salida);
        assert_eq!(GateEvent::Salida.opposite(), GateEvent::Entrada);
        assert_eq!("ENTRADA".parse::<GateEvent>().unwrap(), GateEvent::Entrada);
        assert!("abierto".parse::<GateEvent>().is_err());
    }

    #[test]
    fn test_missing_file_starts_empty() {
        let (_dir, path) = temp_csv();
        let registry = PlateRegistry::load(&path).unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.next_id(), 1);
    }

    #[test]
    fn test_first_append_writes_header_and_row() {
        let (_dir, path) = temp_csv();
        let mut registry = PlateRegistry::load(&path).unwrap();

        let record = registry
            .append("ABC123", GateEvent::Entrada, "Jane Doe")
            .unwrap();
        assert_eq!(record.id, 1);

        let content = std::fs::read_to_string(&path).unwrap();
        let content = content.strip_prefix(UTF8_BOM).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("ID,Plate,Event,Timestamp,Owner"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("1,ABC123,entrada,"));
        assert!(row.ends_with(",Jane Doe"));
        assert_eq!(lines.next(), None);

        let found = registry.lookup("ABC123").unwrap();
        assert_eq!(found.id, 1);
        assert_eq!(found.event, GateEvent::Entrada);
    }

    #[test]
    fn test_most_recent_wins_and_ids_increase() {
        let (_dir, path) = temp_csv();
        let mut registry = PlateRegistry::load(&path).unwrap();

        registry.append("XYZ999", GateEvent::Entrada, "Bob").unwrap();
        registry.append("AAA111", GateEvent::Entrada, "Ana").unwrap();
        let last = registry.append("XYZ999", GateEvent::Salida, "Bob").unwrap();

        assert_eq!(last.id, 3);
        let current = registry.lookup("XYZ999").unwrap();
        assert_eq!(current.event, GateEvent::Salida);
        assert_eq!(current.owner, "Bob");
    }

    #[test]
    fn test_next_id_survives_reload() {
        let (_dir, path) = temp_csv();
        {
            let mut registry = PlateRegistry::load(&path).unwrap();
            registry.append("ABC123", GateEvent::Entrada, "Jane Doe").unwrap();
            registry.append("ABC123", GateEvent::Salida, "Jane Doe").unwrap();
        }

        let reloaded = PlateRegistry::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.next_id(), 3);
        assert_eq!(
            reloaded.lookup("ABC123").unwrap().event,
            GateEvent::Salida
        );
    }

    #[test]
    fn test_rehyphenated_file_still_matches() {
        let (_dir, path) = temp_csv();
        std::fs::write(
            &path,
            "ID,Plate,Event,Timestamp,Owner\n1,ABC-123,entrada,2026-08-01 09:30:00,Jane Doe\n",
        )
        .unwrap();

        let registry = PlateRegistry::load(&path).unwrap();
        assert!(registry.lookup("ABC123").is_some());
    }

    #[test]
    fn test_bom_tolerated_on_load() {
        let (_dir, path) = temp_csv();
        std::fs::write(
            &path,
            "\u{feff}ID,Plate,Event,Timestamp,Owner\n1,ABC123,salida,2026-08-01 09:30:00,Jane Doe\n",
        )
        .unwrap();

        let registry = PlateRegistry::load(&path).unwrap();
        assert_eq!(registry.next_id(), 2);
    }

    #[test]
    fn test_short_row_is_fatal() {
        let (_dir, path) = temp_csv();
        std::fs::write(
            &path,
            "ID,Plate,Event,Timestamp,Owner\n1,ABC123,entrada\n",
        )
        .unwrap();

        match PlateRegistry::load(&path) {
            Err(Error::CorruptLog { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected CorruptLog, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_event_is_fatal() {
        let (_dir, path) = temp_csv();
        std::fs::write(
            &path,
            "ID,Plate,Event,Timestamp,Owner\n1,ABC123,open,2026-08-01 09:30:00,Jane Doe\n",
        )
        .unwrap();

        assert!(matches!(
            PlateRegistry::load(&path),
            Err(Error::CorruptLog { .. })
        ));
    }

    #[test]
    fn test_failed_write_leaves_memory_untouched() {
        let (dir, _) = temp_csv();
        let missing = dir.path().join("no_such_dir").join("registro.csv");
        let mut registry = PlateRegistry::load(&missing).unwrap();

        let result = registry.append("ABC123", GateEvent::Entrada, "Jane Doe");
        assert!(result.is_err());
        assert!(registry.is_empty());
        assert_eq!(registry.next_id(), 1);
        assert!(registry.lookup("ABC123").is_none());
    }

    #[test]
    fn test_mirror_notified_after_append() {
        let (_dir, path) = temp_csv();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut registry = PlateRegistry::load(&path).unwrap().with_mirror(tx);

        registry.append("XYZ999", GateEvent::Entrada, "Bob").unwrap();

        let entry = rx.try_recv().unwrap();
        assert_eq!(entry.plate, "XYZ999");
        assert_eq!(entry.event, GateEvent::Entrada);
        assert_eq!(entry.owner, "Bob");

        // By notification time the record is already indexed
        assert!(registry.lookup("XYZ999").is_some());
    }

    #[test]
    fn test_closed_mirror_channel_does_not_fail_append() {
        let (_dir, path) = temp_csv();
        let (tx, rx) = mpsc::unbounded_channel::<MirrorEntry>();
        drop(rx);
        let mut registry = PlateRegistry::load(&path).unwrap().with_mirror(tx);

        assert!(registry.append("ABC123", GateEvent::Entrada, "Jane Doe").is_ok());
        assert_eq!(registry.len(), 1);
    }
}
