//! Inventory module
//!
//! This module keeps the reconciled list of media items shown to the user.
//! The server has no per-item status endpoint, so both a full refresh and a
//! single-item refresh go through a complete rescan of the library root.

use crate::WorkflowError;
use crate::api::{Artifacts, Backend, Item};
use tracing::{info, warn};

impl Item {
    /// Artifact flags of this item
    pub fn artifacts(&self) -> Artifacts {
        Artifacts {
            poster: self.has_poster,
            nfo: self.has_nfo,
            fanart: self.has_fanart,
        }
    }

    /// Card status line listing the artifacts present on disk
    ///
    /// Returns `not scraped` when none of them exist.
    pub fn artifact_label(&self) -> String {
        let present: Vec<&str> = [
            (self.has_poster, "poster"),
            (self.has_nfo, "NFO"),
            (self.has_fanart, "fanart"),
        ]
        .into_iter()
        .filter_map(|(present, label)| present.then_some(label))
        .collect();

        if present.is_empty() {
            "not scraped".to_string()
        } else {
            present.join(" / ")
        }
    }
}

/// The media items of the last scanned library root
#[derive(Debug, Default)]
pub struct InventoryView {
    root: Option<String>,
    items: Vec<Item>,
}

impl InventoryView {
    pub fn new() -> Self {
        Self::default()
    }

    /// The root of the last successful scan
    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Finds an item by its path
    pub fn get(&self, path: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.path == path)
    }

    /// Finds an item by path, falling back to its file name
    pub fn lookup(&self, needle: &str) -> Option<&Item> {
        self.get(needle)
            .or_else(|| self.items.iter().find(|item| item.name == needle))
    }

    /// Scans `root` and replaces the whole inventory with the result
    ///
    /// This is the only way new items enter the inventory. On failure the
    /// previous inventory is kept.
    pub async fn scan<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        root: &str,
    ) -> Result<&[Item], WorkflowError> {
        let root = root.trim();
        if root.is_empty() {
            return Err(WorkflowError::Validation(
                "please enter a library root directory".to_string(),
            ));
        }

        let items = backend
            .scan(root)
            .await
            .map_err(|e| WorkflowError::from_api(e, "scan failed"))?;

        info!(root, count = items.len(), "scan completed");
        self.root = Some(root.to_string());
        self.items = items;
        Ok(&self.items)
    }

    /// Re-fetches the record of a single item
    ///
    /// Rescans the current root and replaces only the matching record,
    /// leaving every other item untouched.
    pub async fn refresh_one<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        path: &str,
    ) -> Result<Item, WorkflowError> {
        let root = self.root.as_deref().ok_or_else(|| {
            WorkflowError::Validation("no library root has been scanned yet".to_string())
        })?;

        let fresh = backend
            .scan(root)
            .await
            .map_err(|e| WorkflowError::from_api(e, "scan failed"))?
            .into_iter()
            .find(|item| item.path == path);

        let Some(fresh) = fresh else {
            warn!(path, "item vanished from the library during refresh");
            return Err(WorkflowError::NotFound(path.to_string()));
        };

        if let Some(slot) = self.items.iter_mut().find(|item| item.path == path) {
            *slot = fresh.clone();
        }
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::testing::{Call, ScriptedBackend, item};

    #[test]
    fn test_unscraped_item_label() {
        let item = item("/m/A.mkv", false, false, false);
        assert_eq!(item.artifact_label(), "not scraped");
    }

    #[test]
    fn test_artifact_label_order() {
        assert_eq!(
            item("/m/A.mkv", true, false, true).artifact_label(),
            "poster / fanart"
        );
        assert_eq!(
            item("/m/A.mkv", true, true, true).artifact_label(),
            "poster / NFO / fanart"
        );
    }

    #[tokio::test]
    async fn test_scan_rejects_blank_root_without_request() {
        let backend = ScriptedBackend::default();
        let mut inventory = InventoryView::new();

        let err = inventory.scan(&backend, "   ").await.unwrap_err();

        assert!(matches!(err, WorkflowError::Validation(_)));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_scan_single_unscraped_item() {
        let backend =
            ScriptedBackend::default().with_scan(Ok(vec![item("/m/A.mkv", false, false, false)]));
        let mut inventory = InventoryView::new();

        let items = inventory.scan(&backend, " /m ").await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].artifact_label(), "not scraped");
        assert_eq!(inventory.root(), Some("/m"));
        assert_eq!(backend.calls(), vec![Call::Scan("/m".to_string())]);
    }

    #[tokio::test]
    async fn test_failed_scan_keeps_previous_inventory() {
        let backend = ScriptedBackend::default()
            .with_scan(Ok(vec![item("/m/A.mkv", false, false, false)]))
            .with_scan(Err(ApiError::Rejected(None)));
        let mut inventory = InventoryView::new();
        inventory.scan(&backend, "/m").await.unwrap();

        let err = inventory.scan(&backend, "/other").await.unwrap_err();

        assert!(matches!(err, WorkflowError::Backend(ref m) if m == "scan failed"));
        assert_eq!(inventory.items().len(), 1);
        assert_eq!(inventory.root(), Some("/m"));
    }

    #[tokio::test]
    async fn test_refresh_one_replaces_only_that_item() {
        let backend = ScriptedBackend::default()
            .with_scan(Ok(vec![
                item("/m/A.mkv", false, false, false),
                item("/m/B.mkv", false, false, false),
            ]))
            .with_scan(Ok(vec![
                item("/m/A.mkv", true, true, true),
                item("/m/B.mkv", true, false, false),
            ]));
        let mut inventory = InventoryView::new();
        inventory.scan(&backend, "/m").await.unwrap();

        let fresh = inventory.refresh_one(&backend, "/m/A.mkv").await.unwrap();

        assert!(fresh.has_nfo);
        assert_eq!(inventory.get("/m/A.mkv"), Some(&fresh));
        // B changed on the server too, but only A is reconciled
        assert!(!inventory.get("/m/B.mkv").unwrap().has_poster);
        assert_eq!(
            backend.calls(),
            vec![Call::Scan("/m".to_string()), Call::Scan("/m".to_string())]
        );
    }

    #[tokio::test]
    async fn test_refresh_one_missing_item() {
        let backend = ScriptedBackend::default()
            .with_scan(Ok(vec![item("/m/A.mkv", false, false, false)]))
            .with_scan(Ok(vec![]));
        let mut inventory = InventoryView::new();
        inventory.scan(&backend, "/m").await.unwrap();

        let err = inventory.refresh_one(&backend, "/m/A.mkv").await.unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_refresh_one_requires_scanned_root() {
        let backend = ScriptedBackend::default();
        let mut inventory = InventoryView::new();

        let err = inventory.refresh_one(&backend, "/m/A.mkv").await.unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
    }

    #[test]
    fn test_lookup_by_name() {
        let mut inventory = InventoryView::new();
        inventory.items = vec![item("/m/A.mkv", false, false, false)];
        assert_eq!(inventory.lookup("A.mkv").map(|i| i.path.as_str()), Some("/m/A.mkv"));
        assert!(inventory.lookup("B.mkv").is_none());
    }
}
