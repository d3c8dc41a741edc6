//! Record store for measurement history.
//!
//! Records are appended to a JSONL (JSON Lines) file with file locking
//! to ensure safe concurrent access. Identifiers are assigned under the
//! exclusive lock, so concurrent writers never hand out the same id.

use crate::{HistoryRecord, NewRecord, RecordId, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// Storage for history records
///
/// Implementations hand out records newest first; consumers never re-sort.
pub trait RecordStore {
    /// Store a record and return it with its assigned id
    fn insert(&mut self, record: NewRecord) -> Result<HistoryRecord>;

    /// All records, newest first
    fn records(&self) -> Result<Vec<HistoryRecord>>;

    /// Look up a single record
    fn record_by_id(&self, id: RecordId) -> Result<Option<HistoryRecord>> {
        Ok(self.records()?.into_iter().find(|r| r.id == id))
    }

    /// Subscribe to record list updates.
    ///
    /// The current list is delivered immediately, then a fresh list after
    /// every insert made through this store handle.
    fn subscribe(&mut self) -> Result<Subscription>;
}

/// Push-based stream of newest-first record lists
pub struct Subscription {
    rx: Receiver<Vec<HistoryRecord>>,
}

impl Subscription {
    /// Block until the next snapshot; `None` once the store is gone
    pub fn recv(&self) -> Option<Vec<HistoryRecord>> {
        self.rx.recv().ok()
    }

    /// Most recent pending snapshot, skipping older ones
    pub fn latest(&self) -> Option<Vec<HistoryRecord>> {
        let mut latest = None;
        loop {
            match self.rx.try_recv() {
                Ok(snapshot) => latest = Some(snapshot),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return latest,
            }
        }
    }
}

#[derive(Default)]
struct Subscribers {
    senders: Vec<Sender<Vec<HistoryRecord>>>,
}

impl Subscribers {
    fn add(&mut self, snapshot: Vec<HistoryRecord>) -> Subscription {
        let (tx, rx) = mpsc::channel();
        // Receiver is alive here, send cannot fail
        let _ = tx.send(snapshot);
        self.senders.push(tx);
        Subscription { rx }
    }

    fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    fn publish(&mut self, snapshot: &[HistoryRecord]) {
        self.senders.retain(|tx| tx.send(snapshot.to_vec()).is_ok());
        tracing::debug!("Published snapshot to {} subscribers", self.senders.len());
    }
}

/// Order records newest first; ties go to the higher id
pub fn sort_newest_first(records: &mut [HistoryRecord]) {
    records.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

// ============================================================================
// JSONL store
// ============================================================================

/// JSONL-based record store with file locking
pub struct JsonlStore {
    path: PathBuf,
    subscribers: Subscribers,
}

impl JsonlStore {
    /// Create a new JSONL store for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            subscribers: Subscribers::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl RecordStore for JsonlStore {
    fn insert(&mut self, record: NewRecord) -> Result<HistoryRecord> {
        self.ensure_parent_dir()?;

        // Read + append so the id scan and the write happen under one lock
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        // Acquire exclusive lock
        file.lock_exclusive()?;

        let mut existing = Vec::new();
        (&file).read_to_end(&mut existing)?;
        let max_id = parse_lines(&existing)
            .iter()
            .map(|r| r.id.0)
            .max()
            .unwrap_or(0);
        let stored = HistoryRecord::from_new(RecordId(max_id + 1), record);

        let mut writer = std::io::BufWriter::new(&file);
        // A torn final line must not swallow the record appended after it
        if existing.last().is_some_and(|&b| b != b'\n') {
            tracing::warn!("{:?} ends in a partial line, terminating it", self.path);
            writer.write_all(b"\n")?;
        }
        let line = serde_json::to_string(&stored)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended record {} to {:?}", stored.id, self.path);

        if !self.subscribers.is_empty() {
            let snapshot = self.records()?;
            self.subscribers.publish(&snapshot);
        }
        Ok(stored)
    }

    fn records(&self) -> Result<Vec<HistoryRecord>> {
        let mut records = read_records(&self.path)?;
        sort_newest_first(&mut records);
        Ok(records)
    }

    fn subscribe(&mut self) -> Result<Subscription> {
        let snapshot = self.records()?;
        Ok(self.subscribers.add(snapshot))
    }
}

/// Parse JSONL bytes, skipping lines that are not valid UTF-8 JSON records
fn parse_lines(bytes: &[u8]) -> Vec<HistoryRecord> {
    let mut records = Vec::new();

    for (line_num, line) in bytes.split(|&b| b == b'\n').enumerate() {
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        match serde_json::from_slice::<HistoryRecord>(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("Failed to parse record at line {}: {}", line_num + 1, e);
            }
        }
    }

    records
}

/// Read all records from a JSONL file, in file order
pub fn read_records(path: &Path) -> Result<Vec<HistoryRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    // Acquire shared lock for reading
    file.lock_shared()?;

    let mut bytes = Vec::new();
    let read = (&file).read_to_end(&mut bytes);
    file.unlock()?;
    read?;

    let records = parse_lines(&bytes);
    tracing::debug!("Read {} records from {:?}", records.len(), path);
    Ok(records)
}

// ============================================================================
// In-memory store
// ============================================================================

/// In-process record store
#[derive(Default)]
pub struct MemoryStore {
    records: Vec<HistoryRecord>,
    subscribers: Subscribers,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn insert(&mut self, record: NewRecord) -> Result<HistoryRecord> {
        let next_id = self.records.iter().map(|r| r.id.0).max().unwrap_or(0) + 1;
        let stored = HistoryRecord::from_new(RecordId(next_id), record);
        self.records.push(stored.clone());

        if !self.subscribers.is_empty() {
            let snapshot = self.records()?;
            self.subscribers.publish(&snapshot);
        }
        Ok(stored)
    }

    fn records(&self) -> Result<Vec<HistoryRecord>> {
        let mut records = self.records.clone();
        sort_newest_first(&mut records);
        Ok(records)
    }

    fn subscribe(&mut self) -> Result<Subscription> {
        let snapshot = self.records()?;
        Ok(self.subscribers.add(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compute_metrics, ActivityLevel, MeasurementInput, Sex};
    use chrono::{Duration, TimeZone, Utc};

    fn create_test_record(days_ago: i64, weight_kg: f64) -> NewRecord {
        let input = MeasurementInput {
            height_cm: 175.0,
            weight_kg,
            age_years: 35,
            sex: Sex::Female,
            activity: ActivityLevel::Moderate,
        };
        NewRecord {
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
                - Duration::days(days_ago),
            input,
            metrics: compute_metrics(&input).unwrap(),
        }
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        crate::logging::init_test();
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JsonlStore::new(temp_dir.path().join("records.jsonl"));

        let first = store.insert(create_test_record(2, 70.0)).unwrap();
        let second = store.insert(create_test_record(1, 71.0)).unwrap();
        assert_eq!(first.id, RecordId(1));
        assert_eq!(second.id, RecordId(2));
    }

    #[test]
    fn test_records_newest_first() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JsonlStore::new(temp_dir.path().join("records.jsonl"));

        // Insert out of chronological order
        store.insert(create_test_record(1, 71.0)).unwrap();
        store.insert(create_test_record(5, 69.0)).unwrap();
        store.insert(create_test_record(3, 70.0)).unwrap();

        let records = store.records().unwrap();
        let weights: Vec<f64> = records.iter().map(|r| r.input.weight_kg).collect();
        assert_eq!(weights, vec![71.0, 70.0, 69.0]);
    }

    #[test]
    fn test_record_round_trips_through_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("records.jsonl");
        let mut store = JsonlStore::new(&path);

        let stored = store.insert(create_test_record(0, 68.5)).unwrap();

        // A second handle sees the same data
        let reopened = JsonlStore::new(&path);
        let found = reopened.record_by_id(stored.id).unwrap();
        assert_eq!(found, Some(stored));
        assert_eq!(reopened.record_by_id(RecordId(99)).unwrap(), None);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonlStore::new(temp_dir.path().join("nonexistent.jsonl"));
        assert!(store.records().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("records.jsonl");
        let mut store = JsonlStore::new(&path);
        store.insert(create_test_record(1, 70.0)).unwrap();

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{ not json").unwrap();
        drop(file);

        let next = store.insert(create_test_record(0, 71.0)).unwrap();
        assert_eq!(next.id, RecordId(2));
        assert_eq!(store.records().unwrap().len(), 2);
    }

    #[test]
    fn test_partial_last_line_does_not_swallow_next_record() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("records.jsonl");
        let mut store = JsonlStore::new(&path);
        store.insert(create_test_record(2, 70.0)).unwrap();

        // Simulate a crash in the middle of an append
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(br#"{"id":2,"created_"#).unwrap();
        drop(file);

        let next = store.insert(create_test_record(1, 71.0)).unwrap();
        assert_eq!(next.id, RecordId(2));

        let records = store.records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(store.record_by_id(next.id).unwrap(), Some(next));

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.ends_with('\n'));
        assert_eq!(contents.lines().count(), 3);
    }

    #[test]
    fn test_invalid_utf8_lines_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("records.jsonl");
        let mut store = JsonlStore::new(&path);
        store.insert(create_test_record(1, 70.0)).unwrap();

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"\xff\xfe garbage\n").unwrap();
        file.write_all(b"{\"id\":\"\xc3\x28\"}\n").unwrap();
        drop(file);

        assert_eq!(store.records().unwrap().len(), 1);

        let next = store.insert(create_test_record(0, 71.0)).unwrap();
        assert_eq!(next.id, RecordId(2));
        assert_eq!(store.records().unwrap().len(), 2);
    }

    #[test]
    fn test_subscription_receives_updates() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JsonlStore::new(temp_dir.path().join("records.jsonl"));

        let sub = store.subscribe().unwrap();
        assert_eq!(sub.recv().unwrap().len(), 0);

        store.insert(create_test_record(2, 70.0)).unwrap();
        store.insert(create_test_record(1, 71.0)).unwrap();

        assert_eq!(sub.recv().unwrap().len(), 1);
        let latest = sub.recv().unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].id, RecordId(2));
        assert!(sub.latest().is_none());
    }

    #[test]
    fn test_dropped_subscription_is_pruned() {
        let mut store = MemoryStore::new();
        let sub = store.subscribe().unwrap();
        drop(sub);

        store.insert(create_test_record(0, 70.0)).unwrap();
        assert!(store.subscribers.is_empty());
    }

    #[test]
    fn test_memory_store_latest_snapshot() {
        let mut store = MemoryStore::new();
        let sub = store.subscribe().unwrap();
        for days in [3, 2, 1] {
            store.insert(create_test_record(days, 70.0)).unwrap();
        }

        let latest = sub.latest().unwrap();
        assert_eq!(latest.len(), 3);
        assert_eq!(latest[0].id, RecordId(3));
        assert_eq!(store.record_by_id(RecordId(2)).unwrap().unwrap().id, RecordId(2));
    }

    #[test]
    fn test_same_timestamp_orders_by_id() {
        let mut store = MemoryStore::new();
        store.insert(create_test_record(0, 70.0)).unwrap();
        store.insert(create_test_record(0, 71.0)).unwrap();

        let records = store.records().unwrap();
        assert_eq!(records[0].id, RecordId(2));
        assert_eq!(records[1].id, RecordId(1));
    }
}
