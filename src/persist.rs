//! Durable, best-effort persistence of store snapshots.
//!
//! The backend is a minimal fallible key-value facility. Failures never reach
//! the UI layer: a failed write degrades to a non-durable session, a failed
//! or corrupt read hydrates as absent. The in-memory [`Store`] stays
//! authoritative either way.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Context;

use crate::{
    error::{TuftError, TuftResult},
    model::Project,
    store::Store,
};

/// Fixed key under which the one snapshot record lives.
pub const SNAPSHOT_KEY: &str = "tuftline.snapshot";

/// Asynchronous-completion key-value storage, reduced to its essentials.
/// Implementations must not panic; every failure is an `Err` the callers
/// downgrade to best-effort behavior.
pub trait StorageBackend {
    fn get(&self, key: &str) -> TuftResult<Option<Vec<u8>>>;
    fn set(&mut self, key: &str, value: &[u8]) -> TuftResult<()>;
    fn remove(&mut self, key: &str) -> TuftResult<()>;
}

/// Wire schema of the persisted snapshot.
///
/// The hidden-id set has no native serialized form, so it crosses the wire as
/// an ordered list and is reconstructed into a set on read. Processing status
/// is deliberately absent: a reload must never resume "in progress" for work
/// that cannot be resumed.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub project: Option<Project>,
    pub active_tab: String,
    pub show_outline: bool,
    pub outline_width: f32,
    pub hidden_color_ids: Vec<String>,
}

impl Snapshot {
    pub fn capture(store: &Store) -> Self {
        let ui = store.ui();
        Self {
            project: store.project().cloned(),
            active_tab: ui.active_tab.clone(),
            show_outline: ui.show_outline,
            outline_width: ui.outline_width,
            hidden_color_ids: ui.hidden_color_ids.iter().cloned().collect(),
        }
    }
}

/// Write the current snapshot. Fire-and-forget: a failing backend is logged
/// and otherwise invisible.
pub fn persist(store: &Store, backend: &mut dyn StorageBackend) {
    let snapshot = Snapshot::capture(store);
    let bytes = match serde_json::to_vec(&snapshot) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "snapshot serialization failed; skipping persist");
            return;
        }
    };
    if let Err(e) = backend.set(SNAPSHOT_KEY, &bytes) {
        tracing::warn!(error = %e, "snapshot write failed; session continues non-durable");
    }
}

/// Resolve the initial read and merge it into the store, then flip the
/// one-shot hydrated flag. Unavailable or corrupt records hydrate as absent.
/// Subsequent calls are no-ops; the flag flips exactly once.
#[tracing::instrument(skip_all)]
pub fn hydrate(store: &mut Store, backend: &dyn StorageBackend) {
    if store.is_hydrated() {
        return;
    }

    let record = match backend.get(SNAPSHOT_KEY) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(error = %e, "snapshot read failed; hydrating as absent");
            None
        }
    };

    if let Some(bytes) = record {
        match serde_json::from_slice::<Snapshot>(&bytes) {
            Ok(snapshot) => {
                let hidden: BTreeSet<String> = snapshot.hidden_color_ids.into_iter().collect();
                store.restore(
                    snapshot.project,
                    snapshot.active_tab,
                    snapshot.show_outline,
                    snapshot.outline_width,
                    hidden,
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "snapshot record corrupt; hydrating as absent");
            }
        }
    }

    store.mark_hydrated();
}

/// Drop the durable record, e.g. alongside an explicit project reset.
/// Best-effort like every other storage call.
pub fn clear(backend: &mut dyn StorageBackend) {
    if let Err(e) = backend.remove(SNAPSHOT_KEY) {
        tracing::warn!(error = %e, "snapshot remove failed");
    }
}

/// Filesystem backend: one file per key under a root directory.
#[derive(Clone, Debug)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> TuftResult<PathBuf> {
        if key.is_empty()
            || key
                .chars()
                .any(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
        {
            return Err(TuftError::storage(format!("invalid storage key '{key}'")));
        }
        Ok(self.root.join(key))
    }
}

impl StorageBackend for FsStorage {
    fn get(&self, key: &str) -> TuftResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TuftError::Other(
                anyhow::Error::new(e).context(format!("read {}", path.display())),
            )),
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> TuftResult<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("create {}", self.root.display()))?;
        std::fs::write(&path, value).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> TuftResult<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TuftError::Other(
                anyhow::Error::new(e).context(format!("remove {}", path.display())),
            )),
        }
    }
}

/// In-memory backend for tests and non-durable sessions.
#[derive(Clone, Debug, Default)]
pub struct MemStorage {
    records: std::collections::BTreeMap<String, Vec<u8>>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemStorage {
    fn get(&self, key: &str) -> TuftResult<Option<Vec<u8>>> {
        Ok(self.records.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> TuftResult<()> {
        self.records.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> TuftResult<()> {
        self.records.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ProcessingStatus;

    struct FailingStorage;

    impl StorageBackend for FailingStorage {
        fn get(&self, _key: &str) -> TuftResult<Option<Vec<u8>>> {
            Err(TuftError::storage("backend unavailable"))
        }
        fn set(&mut self, _key: &str, _value: &[u8]) -> TuftResult<()> {
            Err(TuftError::storage("quota exceeded"))
        }
        fn remove(&mut self, _key: &str) -> TuftResult<()> {
            Err(TuftError::storage("backend unavailable"))
        }
    }

    #[test]
    fn snapshot_roundtrip_preserves_hidden_set() {
        let mut store = Store::new();
        store.init_project(vec![7]);
        store.set_active_tab("palette");
        store.set_show_outline(true);
        store.set_outline_width(2.5);

        let mut snapshot = Snapshot::capture(&store);
        snapshot.hidden_color_ids = vec!["c2".into(), "c0".into(), "c1".into()];
        let bytes = serde_json::to_vec(&snapshot).unwrap();

        let mut backend = MemStorage::new();
        backend.set(SNAPSHOT_KEY, &bytes).unwrap();

        let mut fresh = Store::new();
        hydrate(&mut fresh, &backend);
        assert!(fresh.is_hydrated());
        let ids: Vec<&str> = fresh
            .ui()
            .hidden_color_ids
            .iter()
            .map(String::as_str)
            .collect();
        // Set membership is exact and order-independent.
        assert_eq!(ids, vec!["c0", "c1", "c2"]);
        assert_eq!(fresh.ui().active_tab, "palette");
        assert!(fresh.ui().show_outline);
        assert_eq!(fresh.ui().outline_width, 2.5);
        assert!(fresh.project().is_some());
    }

    #[test]
    fn status_is_never_persisted_and_resets_to_idle() {
        let mut store = Store::new();
        store.init_project(vec![7]);
        store.set_processing_status(ProcessingStatus::Processing, None);

        let mut backend = MemStorage::new();
        persist(&store, &mut backend);

        let raw = backend.get(SNAPSHOT_KEY).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert!(json.get("status").is_none());
        assert!(json.get("processingStatus").is_none());

        let mut fresh = Store::new();
        fresh.set_processing_status(ProcessingStatus::Error, Some("old".into()));
        hydrate(&mut fresh, &backend);
        assert_eq!(fresh.ui().status, ProcessingStatus::Idle);
        assert!(fresh.ui().status_error.is_none());
    }

    #[test]
    fn wire_keys_are_camel_case() {
        let store = Store::new();
        let json = serde_json::to_value(Snapshot::capture(&store)).unwrap();
        for key in ["project", "activeTab", "showOutline", "outlineWidth", "hiddenColorIds"] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
    }

    #[test]
    fn corrupt_record_hydrates_as_absent() {
        let mut backend = MemStorage::new();
        backend.set(SNAPSHOT_KEY, b"{not json").unwrap();
        let mut store = Store::new();
        hydrate(&mut store, &backend);
        assert!(store.is_hydrated());
        assert!(store.project().is_none());
    }

    #[test]
    fn failing_backend_degrades_silently() {
        let mut store = Store::new();
        store.init_project(vec![1]);
        let mut backend = FailingStorage;
        // None of these may panic or surface an error.
        persist(&store, &mut backend);
        clear(&mut backend);
        hydrate(&mut store, &backend);
        assert!(store.is_hydrated());
        assert!(store.project().is_some(), "in-memory state stays authoritative");
    }

    #[test]
    fn hydrate_is_one_shot() {
        let mut backend = MemStorage::new();
        let mut store = Store::new();
        hydrate(&mut store, &backend);

        // A record appearing later must not be merged by a second call.
        let mut seeded = Store::new();
        seeded.init_project(vec![1]);
        persist(&seeded, &mut backend);
        hydrate(&mut store, &backend);
        assert!(store.project().is_none());
    }

    #[test]
    fn fs_storage_roundtrip_and_missing_key() {
        let root = std::env::temp_dir().join(format!(
            "tuftline_persist_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let mut storage = FsStorage::new(&root);
        assert_eq!(storage.get("absent.key").unwrap(), None);
        storage.set("a.key", b"payload").unwrap();
        assert_eq!(storage.get("a.key").unwrap().as_deref(), Some(&b"payload"[..]));
        storage.remove("a.key").unwrap();
        storage.remove("a.key").unwrap(); // idempotent
        assert_eq!(storage.get("a.key").unwrap(), None);
        assert!(storage.get("../escape").is_err());
        std::fs::remove_dir_all(&root).ok();
    }
}
