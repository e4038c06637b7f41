use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use tokio_util::sync::CancellationToken;

use crate::aws::{DownloadOutcome, Storage};
use crate::models::{BucketInfo, Node};

/// In-memory storage: fixed listings, and downloads that either finish at
/// once or wait for cancellation.
#[derive(Clone, Default)]
pub struct FakeStorage {
    pub buckets: Vec<BucketInfo>,
    listings: HashMap<(String, String), Vec<Node>>,
    calls: Arc<Mutex<Vec<String>>>,
    hold_downloads: bool,
    cancelled: Arc<AtomicBool>,
}

impl FakeStorage {
    /// `logs` (unlistable) and `photos` with `2023/`, `2024/summer/` and
    /// `2024/cat.jpg`.
    pub fn with_tree() -> Self {
        let mut listings = HashMap::new();
        listings.insert(
            ("photos".to_string(), String::new()),
            vec![Node::directory("", "2023/"), Node::directory("", "2024/")],
        );
        listings.insert(
            ("photos".to_string(), "2024/".to_string()),
            vec![
                Node::directory("2024/", "2024/summer/"),
                Node::file("2024/", "2024/cat.jpg", 4096),
            ],
        );
        listings.insert(
            ("photos".to_string(), "2024/summer/".to_string()),
            vec![Node::file("2024/summer/", "2024/summer/beach.png", 10)],
        );
        Self {
            buckets: vec![BucketInfo::new("logs", None), BucketInfo::new("photos", None)],
            listings,
            ..Self::default()
        }
    }

    pub fn holding_downloads(mut self) -> Self {
        self.hold_downloads = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn saw_cancel(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Storage for FakeStorage {
    async fn list_buckets(&self) -> Result<Vec<BucketInfo>> {
        Ok(self.buckets.clone())
    }

    async fn list_nodes(&self, bucket: &str, prefix: &str) -> Result<Vec<Node>> {
        self.calls.lock().unwrap().push(format!("{bucket}/{prefix}"));
        self.listings
            .get(&(bucket.to_string(), prefix.to_string()))
            .cloned()
            .ok_or_else(|| anyhow!("no such listing {bucket}/{prefix}"))
    }

    async fn download(
        &self,
        _bucket: &str,
        _key: &str,
        dest: &Path,
        cancel: CancellationToken,
    ) -> Result<DownloadOutcome> {
        if self.hold_downloads {
            cancel.cancelled().await;
            self.cancelled.store(true, Ordering::SeqCst);
            return Ok(DownloadOutcome::Cancelled);
        }
        Ok(DownloadOutcome::Completed {
            dest: dest.to_path_buf(),
            bytes: 0,
        })
    }
}
