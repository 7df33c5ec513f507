//! CollectionsContext - I/O primitives for the collection store
//!
//! The context provides access to storage and collaborators. No business
//! logic methods, just data access primitives. Commands do all the work.

use crate::catalog::Catalog;
use crate::error::{CollectionsError, Result};
use crate::items::{AlertNotifier, InMemoryItemStore, ItemStore, RecordingAlertNotifier};
use crate::types::{ActivityEntry, GraphDoc};
use fs2::FileExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Context passed to every command - provides access, not logic
pub struct CollectionsContext {
    /// Path to the .trove directory
    root: PathBuf,
    items: Arc<dyn ItemStore>,
    alerts: Arc<dyn AlertNotifier>,
}

impl CollectionsContext {
    /// Create a new context for the given .trove directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            items: Arc::new(InMemoryItemStore::new()),
            alerts: Arc::new(RecordingAlertNotifier::new()),
        }
    }

    /// Create a context by finding the .trove directory from a starting path
    pub fn find(start: impl AsRef<Path>) -> Result<Self> {
        let mut current = start.as_ref().to_path_buf();

        loop {
            let trove_dir = current.join(".trove");
            if trove_dir.is_dir() {
                return Ok(Self::new(trove_dir));
            }

            if !current.pop() {
                return Err(CollectionsError::NotInitialized {
                    path: start.as_ref().to_path_buf(),
                });
            }
        }
    }

    /// Replace the item store collaborator
    pub fn with_item_store(mut self, items: Arc<dyn ItemStore>) -> Self {
        self.items = items;
        self
    }

    /// Replace the alert notifier collaborator
    pub fn with_alert_notifier(mut self, alerts: Arc<dyn AlertNotifier>) -> Self {
        self.alerts = alerts;
        self
    }

    /// The item store holding cards, dashboards, and pulses
    pub fn items(&self) -> &dyn ItemStore {
        self.items.as_ref()
    }

    /// The alert notifier used when archiving cancels alerts
    pub fn alerts(&self) -> &dyn AlertNotifier {
        self.alerts.as_ref()
    }

    // =========================================================================
    // Path helpers
    // =========================================================================

    /// Get the root .trove directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the collection catalog
    pub fn catalog_path(&self) -> PathBuf {
        self.root.join("catalog.yaml")
    }

    /// Path to the permission graph
    pub fn graph_path(&self) -> PathBuf {
        self.root.join("permissions.yaml")
    }

    /// Path to the activity directory
    pub fn activity_dir(&self) -> PathBuf {
        self.root.join("activity")
    }

    /// Path to the current activity log
    pub fn activity_path(&self) -> PathBuf {
        self.root.join("activity").join("current.jsonl")
    }

    /// Path to the lock file
    pub fn lock_path(&self) -> PathBuf {
        self.root.join(".lock")
    }

    // =========================================================================
    // Directory initialization
    // =========================================================================

    /// Check if all required directories exist
    pub fn directories_exist(&self) -> bool {
        self.root.exists() && self.activity_dir().exists()
    }

    /// Create the directory structure for a new store
    ///
    /// This is idempotent - safe to call multiple times.
    pub async fn create_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        fs::create_dir_all(self.activity_dir()).await?;
        Ok(())
    }

    /// Ensure directories exist, creating them if needed
    ///
    /// This should be called at the start of operations that write.
    /// It's idempotent and fast when directories already exist.
    pub async fn ensure_directories(&self) -> Result<()> {
        if !self.directories_exist() {
            self.create_directories().await?;
        }
        Ok(())
    }

    // =========================================================================
    // Catalog I/O
    // =========================================================================

    /// Read the catalog. A store with no catalog file yet is empty.
    pub async fn read_catalog(&self) -> Result<Catalog> {
        let path = self.catalog_path();
        if !path.exists() {
            return Ok(Catalog::default());
        }

        let content = fs::read_to_string(&path).await?;
        let mut catalog: Catalog = serde_yaml_ng::from_str(&content)?;
        catalog.verify_ids()?;
        Ok(catalog)
    }

    /// Write the whole catalog (atomic write via temp file)
    ///
    /// Multi-record rewrites such as a subtree move land in one rename,
    /// readers never observe a half-applied catalog.
    pub async fn write_catalog(&self, catalog: &Catalog) -> Result<()> {
        self.ensure_directories().await?;
        let content = serde_yaml_ng::to_string(catalog)?;
        atomic_write(&self.catalog_path(), content.as_bytes()).await
    }

    // =========================================================================
    // Permission graph I/O
    // =========================================================================

    /// Read the permission graph. A store with no graph file yet has an
    /// empty graph at revision zero.
    pub async fn read_graph(&self) -> Result<GraphDoc> {
        let path = self.graph_path();
        if !path.exists() {
            return Ok(GraphDoc::default());
        }

        let content = fs::read_to_string(&path).await?;
        let doc: GraphDoc = serde_yaml_ng::from_str(&content)?;
        Ok(doc)
    }

    /// Write the permission graph (atomic write via temp file)
    pub async fn write_graph(&self, doc: &GraphDoc) -> Result<()> {
        self.ensure_directories().await?;
        let content = serde_yaml_ng::to_string(doc)?;
        atomic_write(&self.graph_path(), content.as_bytes()).await
    }

    // =========================================================================
    // Activity logging
    // =========================================================================

    /// Append a log entry to the activity log
    pub async fn append_activity(&self, entry: &ActivityEntry) -> Result<()> {
        self.ensure_directories().await?;

        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.activity_path())
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }

    /// Read activity log entries (from current.jsonl), newest first
    pub async fn read_activity(&self, limit: Option<usize>) -> Result<Vec<ActivityEntry>> {
        let path = self.activity_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).await?;
        let mut entries: Vec<ActivityEntry> = content
            .lines()
            .filter(|line| !line.is_empty())
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect();

        entries.reverse();

        if let Some(limit) = limit {
            entries.truncate(limit);
        }

        Ok(entries)
    }

    // =========================================================================
    // Locking
    // =========================================================================

    /// Try to acquire the store's exclusive mutation lock (non-blocking).
    /// Mutations are serialized through this lock; reads never take it.
    pub async fn lock(&self) -> Result<CollectionsLock> {
        let lock_path = self.lock_path();

        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&lock_path)?;

        // Non-blocking lock attempt
        match file.try_lock_exclusive() {
            Ok(()) => Ok(CollectionsLock {
                file,
                path: lock_path,
            }),
            Err(_) => Err(CollectionsError::LockBusy),
        }
    }
}

/// RAII lock guard - releases on drop
pub struct CollectionsLock {
    file: std::fs::File,
    #[allow(dead_code)]
    path: PathBuf,
}

impl Drop for CollectionsLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Atomic write via temp file and rename
async fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    // Write to temp file in same directory
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content).await?;

    // Rename (atomic on same filesystem)
    fs::rename(&temp_path, path).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CollectionId, Grant, Location, PermissionLevel};

    use tempfile::TempDir;

    async fn setup() -> (TempDir, CollectionsContext) {
        let temp = TempDir::new().unwrap();
        let trove_dir = temp.path().join(".trove");
        std::fs::create_dir_all(&trove_dir).unwrap();
        let ctx = CollectionsContext::new(trove_dir);
        ctx.create_directories().await.unwrap();
        (temp, ctx)
    }

    #[tokio::test]
    async fn test_paths() {
        let (temp, ctx) = setup().await;
        let root = temp.path().join(".trove");

        assert_eq!(ctx.root(), root);
        assert_eq!(ctx.catalog_path(), root.join("catalog.yaml"));
        assert_eq!(ctx.graph_path(), root.join("permissions.yaml"));
        assert_eq!(
            ctx.activity_path(),
            root.join("activity").join("current.jsonl")
        );
    }

    #[tokio::test]
    async fn test_find_walks_up() {
        let (temp, _ctx) = setup().await;
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let found = CollectionsContext::find(&nested).unwrap();
        assert_eq!(found.root(), temp.path().join(".trove"));

        let elsewhere = TempDir::new().unwrap();
        assert!(matches!(
            CollectionsContext::find(elsewhere.path()),
            Err(CollectionsError::NotInitialized { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_catalog_reads_empty() {
        let (_temp, ctx) = setup().await;
        let catalog = ctx.read_catalog().await.unwrap();
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn test_catalog_round_trip() {
        let (_temp, ctx) = setup().await;

        let mut catalog = Catalog::default();
        let id = catalog.allocate_id();
        catalog.put(crate::types::Collection::new(
            id,
            "Reports",
            "509EE3",
            Location::root(),
        ));
        ctx.write_catalog(&catalog).await.unwrap();

        let loaded = ctx.read_catalog().await.unwrap();
        assert_eq!(loaded.len(), 1);
        let record = loaded.get(id).unwrap();
        assert_eq!(record.name, "Reports");
        assert_eq!(record.id, id);
    }

    #[tokio::test]
    async fn test_graph_round_trip() {
        let (_temp, ctx) = setup().await;

        let doc = GraphDoc {
            revision: 2,
            grants: vec![Grant {
                group: crate::types::GroupId::new(1).unwrap(),
                collection: crate::types::CollectionKey::Id(CollectionId::new(4).unwrap()),
                level: PermissionLevel::Read,
            }],
        };
        ctx.write_graph(&doc).await.unwrap();

        let loaded = ctx.read_graph().await.unwrap();
        assert_eq!(loaded.revision, 2);
        assert_eq!(loaded.grants.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_graph_reads_empty() {
        let (_temp, ctx) = setup().await;
        let doc = ctx.read_graph().await.unwrap();
        assert_eq!(doc.revision, 0);
        assert!(doc.grants.is_empty());
    }

    #[tokio::test]
    async fn test_activity_append_and_read() {
        let (_temp, ctx) = setup().await;

        for i in 0..3 {
            let entry = ActivityEntry::new(
                "create collection",
                serde_json::json!({"n": i}),
                serde_json::Value::Null,
                1,
            );
            ctx.append_activity(&entry).await.unwrap();
        }

        let entries = ctx.read_activity(None).await.unwrap();
        assert_eq!(entries.len(), 3);
        // Newest first
        assert_eq!(entries[0].input["n"], 2);

        let limited = ctx.read_activity(Some(2)).await.unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn test_locking() {
        let (_temp, ctx) = setup().await;

        let lock1 = ctx.lock().await.unwrap();

        let result = ctx.lock().await;
        assert!(matches!(result, Err(CollectionsError::LockBusy)));

        drop(lock1);
        let _lock2 = ctx.lock().await.unwrap();
    }
}
