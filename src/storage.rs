use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use tokio::fs;

use crate::error::ScanError;

/// Keyed string-list persistence for the scan history.
///
/// Injected into `LogStore` at construction so tests can swap in an
/// in-memory double.
pub trait KeyValueStore {
    async fn get_string_list(&self, key: &str) -> Result<Option<Vec<String>>, ScanError>;

    async fn set_string_list(&mut self, key: &str, values: &[String]) -> Result<(), ScanError>;
}

/// File-backed store: the whole key space lives in one JSON object on disk,
/// rewritten on every set.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    async fn read_map(&self) -> Result<BTreeMap<String, Vec<String>>, ScanError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        Ok(serde_json::from_str(&content)?)
    }
}

impl KeyValueStore for FileStore {
    async fn get_string_list(&self, key: &str) -> Result<Option<Vec<String>>, ScanError> {
        let mut map = self.read_map().await?;
        Ok(map.remove(key))
    }

    async fn set_string_list(&mut self, key: &str, values: &[String]) -> Result<(), ScanError> {
        let mut map = self.read_map().await?;
        map.insert(key.to_string(), values.to_vec());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        fs::write(&self.path, serde_json::to_string_pretty(&map)?).await?;
        Ok(())
    }
}

/// In-memory test double. The backing map is shared so a test can keep a
/// handle after moving the store into a `LogStore`.
#[cfg(test)]
pub struct MemoryStore {
    lists: std::sync::Arc<std::sync::Mutex<std::collections::HashMap<String, Vec<String>>>>,
    fail_writes: bool,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self {
            lists: std::sync::Arc::new(std::sync::Mutex::new(std::collections::HashMap::new())),
            fail_writes: false,
        }
    }

    pub fn failing_writes() -> Self {
        let mut store = Self::new();
        store.fail_writes = true;
        store
    }

    pub fn seed(&self, key: &str, values: Vec<String>) {
        self.lists.lock().unwrap().insert(key.to_string(), values);
    }

    pub fn handle(&self) -> Self {
        Self {
            lists: std::sync::Arc::clone(&self.lists),
            fail_writes: self.fail_writes,
        }
    }

    pub fn stored(&self, key: &str) -> Option<Vec<String>> {
        self.lists.lock().unwrap().get(key).cloned()
    }
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    async fn get_string_list(&self, key: &str) -> Result<Option<Vec<String>>, ScanError> {
        Ok(self.lists.lock().unwrap().get(key).cloned())
    }

    async fn set_string_list(&mut self, key: &str, values: &[String]) -> Result<(), ScanError> {
        if self.fail_writes {
            return Err(ScanError::Io(std::io::Error::new(
                ErrorKind::Other,
                "simulated write failure",
            )));
        }
        self.lists
            .lock()
            .unwrap()
            .insert(key.to_string(), values.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("history.json"));

        assert_eq!(store.get_string_list("nfc_logs").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("history.json"));

        let values = vec!["a".to_string(), "b".to_string()];
        store.set_string_list("nfc_logs", &values).await.unwrap();

        assert_eq!(
            store.get_string_list("nfc_logs").await.unwrap(),
            Some(values)
        );
    }

    #[tokio::test]
    async fn persists_across_store_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut store = FileStore::new(path.clone());
        store
            .set_string_list("nfc_logs", &["entry".to_string()])
            .await
            .unwrap();

        let reopened = FileStore::new(path);
        assert_eq!(
            reopened.get_string_list("nfc_logs").await.unwrap(),
            Some(vec!["entry".to_string()])
        );
    }

    #[tokio::test]
    async fn set_replaces_only_its_own_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("history.json"));

        store
            .set_string_list("nfc_logs", &["old".to_string()])
            .await
            .unwrap();
        store
            .set_string_list("other", &["kept".to_string()])
            .await
            .unwrap();
        store
            .set_string_list("nfc_logs", &["new".to_string()])
            .await
            .unwrap();

        assert_eq!(
            store.get_string_list("nfc_logs").await.unwrap(),
            Some(vec!["new".to_string()])
        );
        assert_eq!(
            store.get_string_list("other").await.unwrap(),
            Some(vec!["kept".to_string()])
        );
    }

    #[tokio::test]
    async fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("nested").join("history.json"));

        store
            .set_string_list("nfc_logs", &["entry".to_string()])
            .await
            .unwrap();

        assert_eq!(
            store.get_string_list("nfc_logs").await.unwrap(),
            Some(vec!["entry".to_string()])
        );
    }
}
