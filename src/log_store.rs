use log::warn;

use crate::error::ScanError;
use crate::log_entry::LogEntry;
use crate::storage::KeyValueStore;

/// Storage key the history is persisted under.
pub const HISTORY_KEY: &str = "nfc_logs";

/// Maximum number of retained scans.
pub const HISTORY_CAP: usize = 20;

/// Bounded, newest-first scan history backed by a key-value store.
///
/// Loaded once at startup; every append rewrites the whole persisted list so
/// storage and memory never diverge.
pub struct LogStore<S: KeyValueStore> {
    store: S,
    entries: Vec<LogEntry>,
}

impl<S: KeyValueStore> LogStore<S> {
    /// Read the persisted history. Unparseable entries are dropped with a
    /// warning so a corrupt local history never blocks startup.
    pub async fn load(store: S) -> Self {
        let stored = match store.get_string_list(HISTORY_KEY).await {
            Ok(list) => list.unwrap_or_default(),
            Err(e) => {
                warn!("Failed to read scan history: {}", e);
                Vec::new()
            }
        };

        let mut entries = Vec::with_capacity(stored.len());
        for raw in &stored {
            match serde_json::from_str::<LogEntry>(raw) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Dropping unparseable history entry: {}", e),
            }
        }
        entries.truncate(HISTORY_CAP);

        Self { store, entries }
    }

    /// Prepend a capture, evict past the cap, and rewrite the persisted list
    /// before returning the new history.
    ///
    /// The in-memory history keeps the entry even when the write fails; the
    /// error still propagates so a failed write is never reported as success.
    pub async fn append(&mut self, entry: LogEntry) -> Result<&[LogEntry], ScanError> {
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_CAP);

        let mut serialized = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            serialized.push(serde_json::to_string(entry)?);
        }
        self.store.set_string_list(HISTORY_KEY, &serialized).await?;

        Ok(&self.entries)
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use pretty_assertions::assert_eq;

    fn entry(n: usize) -> LogEntry {
        LogEntry::new(
            format!("2026-08-07T09:{:02}:00+00:00", n % 60),
            format!("NDEF text: entry {}", n),
            "{}".to_string(),
        )
    }

    #[tokio::test]
    async fn loads_empty_history_from_empty_store() {
        let history = LogStore::load(MemoryStore::new()).await;
        assert!(history.entries().is_empty());
    }

    #[tokio::test]
    async fn append_prepends_newest_first() {
        let mut history = LogStore::load(MemoryStore::new()).await;

        history.append(entry(1)).await.unwrap();
        history.append(entry(2)).await.unwrap();

        assert_eq!(history.entries().len(), 2);
        assert_eq!(history.entries()[0], entry(2));
        assert_eq!(history.entries()[1], entry(1));
    }

    #[tokio::test]
    async fn append_evicts_oldest_past_the_cap() {
        let mut history = LogStore::load(MemoryStore::new()).await;

        for n in 0..HISTORY_CAP {
            history.append(entry(n)).await.unwrap();
        }
        assert_eq!(history.entries().len(), HISTORY_CAP);

        history.append(entry(99)).await.unwrap();

        assert_eq!(history.entries().len(), HISTORY_CAP);
        assert_eq!(history.entries()[0], entry(99));
        // entry(0) was the oldest and is gone
        assert!(!history.entries().contains(&entry(0)));
    }

    #[tokio::test]
    async fn append_rewrites_the_persisted_list() {
        let store = MemoryStore::new();
        let inspector = store.handle();
        let mut history = LogStore::load(store).await;

        history.append(entry(1)).await.unwrap();
        history.append(entry(2)).await.unwrap();

        let stored = inspector.stored(HISTORY_KEY).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(
            serde_json::from_str::<LogEntry>(&stored[0]).unwrap(),
            entry(2)
        );

        // a reload sees exactly what was appended
        let reloaded = LogStore::load(inspector).await;
        assert_eq!(reloaded.entries(), history.entries());
    }

    #[tokio::test]
    async fn load_drops_only_malformed_entries() {
        let store = MemoryStore::new();
        store.seed(
            HISTORY_KEY,
            vec![
                serde_json::to_string(&entry(1)).unwrap(),
                "not json".to_string(),
                r#"{"timestamp":"x"}"#.to_string(),
                serde_json::to_string(&entry(2)).unwrap(),
            ],
        );

        let history = LogStore::load(store).await;

        assert_eq!(history.entries(), &[entry(1), entry(2)]);
    }

    #[tokio::test]
    async fn failed_write_propagates_but_keeps_memory() {
        let mut history = LogStore::load(MemoryStore::failing_writes()).await;

        let result = history.append(entry(1)).await;

        assert!(result.is_err());
        assert_eq!(history.entries(), &[entry(1)]);
    }
}
