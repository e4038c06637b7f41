use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::aws::{DownloadOutcome, Storage};
use crate::error::BrowserError;
use crate::models::{BucketInfo, Node};
use crate::tui::listing::BUCKETS_TITLE;

const STATUS_LIMIT: usize = 20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum View {
    Buckets,
    Directory { bucket: String, prefix: String },
}

/// A message that stays on screen until it expires or a key dismisses it.
#[derive(Clone, Debug)]
pub struct Flash {
    pub message: String,
    shown_at: Instant,
    ttl: Duration,
}

impl Flash {
    pub fn new(message: impl Into<String>, ttl: Duration) -> Self {
        Self {
            message: message.into(),
            shown_at: Instant::now(),
            ttl,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.shown_at) >= self.ttl
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.ttl.saturating_sub(now.duration_since(self.shown_at))
    }
}

#[derive(Debug, Default)]
pub enum DownloadStatus {
    #[default]
    Idle,
    Running {
        dest: PathBuf,
        cancel: CancellationToken,
    },
    Finished {
        dest: PathBuf,
    },
    Cancelled,
}

/// A file the user asked to open; the event loop turns it into a download.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadTarget {
    pub bucket: String,
    pub key: String,
    pub file_name: String,
}

pub struct App {
    pub buckets: Vec<BucketInfo>,
    pub nodes: Vec<Node>,
    pub view: View,
    pub selection: usize,
    pub flash: Option<Flash>,
    pub download: DownloadStatus,
    pub status: VecDeque<String>,
    pub showing_log: bool,
    back_stack: Vec<usize>,
    error_ttl: Duration,
}

impl App {
    pub fn new(buckets: Vec<BucketInfo>, error_ttl: Duration) -> Self {
        Self {
            buckets,
            nodes: Vec::new(),
            view: View::Buckets,
            selection: 0,
            flash: None,
            download: DownloadStatus::Idle,
            status: VecDeque::with_capacity(STATUS_LIMIT),
            showing_log: false,
            back_stack: Vec::new(),
            error_ttl,
        }
    }

    pub fn len(&self) -> usize {
        match self.view {
            View::Buckets => self.buckets.len(),
            View::Directory { .. } => self.nodes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn title(&self) -> String {
        match &self.view {
            View::Buckets => BUCKETS_TITLE.into(),
            View::Directory { bucket, prefix } => format!("{bucket}/{prefix}"),
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.is_empty() {
            self.selection = 0;
            return;
        }
        let last = self.len() - 1;
        self.selection = self.selection.saturating_add_signed(delta).min(last);
    }

    pub fn jump_selection(&mut self, start: bool) {
        self.selection = if start {
            0
        } else {
            self.len().saturating_sub(1)
        };
    }

    pub fn push_status(&mut self, status: &str) {
        if self.status.len() == STATUS_LIMIT {
            self.status.pop_front();
        }
        self.status.push_back(status.to_string());
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!("{message}");
        self.push_status(&message);
        self.flash = Some(Flash::new(message, self.error_ttl));
    }

    pub fn expire_flash(&mut self, now: Instant) {
        if self.flash.as_ref().is_some_and(|f| f.is_expired(now)) {
            self.flash = None;
        }
    }

    pub fn dismiss_flash(&mut self) -> bool {
        self.flash.take().is_some()
    }

    /// Drills into the selected bucket or directory, or reports the selected
    /// file as a download target.
    pub async fn open_selected<S: Storage>(&mut self, storage: &S) -> Option<DownloadTarget> {
        match self.view.clone() {
            View::Buckets => {
                let bucket = self.buckets.get(self.selection)?.name.clone();
                self.enter(storage, bucket, String::new()).await;
                None
            }
            View::Directory { bucket, .. } => {
                let node = self.nodes.get(self.selection)?.clone();
                if node.is_dir {
                    self.enter(storage, bucket, node.key).await;
                    None
                } else {
                    Some(DownloadTarget {
                        bucket,
                        file_name: node.file_name().to_string(),
                        key: node.key,
                    })
                }
            }
        }
    }

    async fn enter<S: Storage>(&mut self, storage: &S, bucket: String, prefix: String) {
        match storage.list_nodes(&bucket, &prefix).await {
            Ok(nodes) => {
                info!(bucket = %bucket, prefix = %prefix, "entered listing");
                self.back_stack.push(self.selection);
                self.nodes = nodes;
                self.selection = 0;
                self.push_status(&format!("Opened {bucket}/{prefix}"));
                self.view = View::Directory { bucket, prefix };
            }
            Err(err) => self.show_error(BrowserError::listing(&err).to_string()),
        }
    }

    /// Returns to the parent prefix, or to the bucket list from a bucket root.
    pub async fn go_back<S: Storage>(&mut self, storage: &S) {
        let View::Directory { bucket, prefix } = self.view.clone() else {
            return;
        };
        if prefix.is_empty() {
            self.view = View::Buckets;
            self.nodes.clear();
            self.selection = self.restore_selection();
            return;
        }
        let parent = parent_prefix(&prefix);
        match storage.list_nodes(&bucket, &parent).await {
            Ok(nodes) => {
                self.nodes = nodes;
                self.selection = self.restore_selection();
                self.view = View::Directory {
                    bucket,
                    prefix: parent,
                };
            }
            Err(err) => self.show_error(BrowserError::listing(&err).to_string()),
        }
    }

    pub async fn refresh<S: Storage>(&mut self, storage: &S) {
        let result = match &self.view {
            View::Buckets => storage.list_buckets().await.map(|b| self.buckets = b),
            View::Directory { bucket, prefix } => storage
                .list_nodes(bucket, prefix)
                .await
                .map(|n| self.nodes = n),
        };
        match result {
            Ok(()) => {
                self.selection = self.selection.min(self.len().saturating_sub(1));
                self.push_status(&format!("Refreshed {}", self.title()));
            }
            Err(err) => self.show_error(BrowserError::listing(&err).to_string()),
        }
    }

    fn restore_selection(&mut self) -> usize {
        let selection = self.back_stack.pop().unwrap_or(0);
        selection.min(self.len().saturating_sub(1))
    }

    pub fn download_running(&self) -> bool {
        matches!(self.download, DownloadStatus::Running { .. })
    }

    pub fn start_download(&mut self, dest: PathBuf, cancel: CancellationToken) {
        self.push_status(&format!("Downloading to {}", dest.display()));
        self.download = DownloadStatus::Running { dest, cancel };
    }

    pub fn cancel_download(&mut self) -> bool {
        if let DownloadStatus::Running { cancel, .. } = &self.download {
            cancel.cancel();
            return true;
        }
        false
    }

    /// Clears a finished or cancelled download notice once the user moves on.
    pub fn acknowledge_download(&mut self) {
        if matches!(
            self.download,
            DownloadStatus::Finished { .. } | DownloadStatus::Cancelled
        ) {
            self.download = DownloadStatus::Idle;
        }
    }

    pub fn finish_download(&mut self, result: Result<DownloadOutcome, String>) {
        match result {
            Ok(DownloadOutcome::Completed { dest, bytes }) => {
                info!(bytes, dest = %dest.display(), "download finished");
                self.push_status(&format!("File Downloaded: {}", dest.display()));
                self.download = DownloadStatus::Finished { dest };
            }
            Ok(DownloadOutcome::Cancelled) => {
                self.push_status("Download cancelled");
                self.download = DownloadStatus::Cancelled;
            }
            Err(message) => {
                self.download = DownloadStatus::Idle;
                self.show_error(format!("Download failed: {message}"));
            }
        }
    }
}

fn parent_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => trimmed[..=idx].to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeStorage;

    fn app(storage: &FakeStorage) -> App {
        App::new(storage.buckets.clone(), Duration::from_secs(2))
    }

    #[test]
    fn selection_is_clamped_to_collection() {
        let mut app = App::new(
            vec![BucketInfo::new("a", None), BucketInfo::new("b", None)],
            Duration::from_secs(2),
        );
        app.move_selection(-1);
        assert_eq!(app.selection, 0);
        app.move_selection(5);
        assert_eq!(app.selection, 1);
        app.jump_selection(true);
        assert_eq!(app.selection, 0);
    }

    #[test]
    fn empty_collection_pins_selection_to_zero() {
        let mut app = App::new(Vec::new(), Duration::from_secs(2));
        app.move_selection(1);
        app.jump_selection(false);
        assert_eq!(app.selection, 0);
    }

    #[test]
    fn parent_prefix_walks_up_one_level() {
        assert_eq!(parent_prefix("a/b/c/"), "a/b/");
        assert_eq!(parent_prefix("a/"), "");
        assert_eq!(parent_prefix(""), "");
    }

    #[test]
    fn flash_expires_after_ttl() {
        let flash = Flash::new("oops", Duration::from_millis(50));
        let start = flash.shown_at;
        assert!(!flash.is_expired(start));
        assert!(flash.is_expired(start + Duration::from_millis(50)));
        assert_eq!(flash.remaining(start + Duration::from_millis(20)), Duration::from_millis(30));

        let mut app = App::new(Vec::new(), Duration::from_millis(50));
        app.show_error("oops");
        app.expire_flash(Instant::now() + Duration::from_secs(1));
        assert!(app.flash.is_none());
    }

    #[test]
    fn status_log_is_bounded() {
        let mut app = App::new(Vec::new(), Duration::from_secs(2));
        for i in 0..30 {
            app.push_status(&format!("msg {i}"));
        }
        assert_eq!(app.status.len(), STATUS_LIMIT);
        assert_eq!(app.status.front().map(String::as_str), Some("msg 10"));
    }

    #[tokio::test]
    async fn drill_down_and_back_restores_selection() {
        let storage = FakeStorage::with_tree();
        let mut app = app(&storage);

        app.move_selection(1);
        assert!(app.open_selected(&storage).await.is_none());
        assert_eq!(
            app.view,
            View::Directory {
                bucket: "photos".into(),
                prefix: String::new()
            }
        );
        assert_eq!(app.selection, 0);

        app.move_selection(1);
        app.open_selected(&storage).await;
        assert_eq!(app.title(), "photos/2024/");
        assert_eq!(app.nodes.len(), 2);

        app.open_selected(&storage).await;
        assert_eq!(app.title(), "photos/2024/summer/");

        app.go_back(&storage).await;
        assert_eq!(app.title(), "photos/2024/");
        assert_eq!(app.selection, 0);

        app.go_back(&storage).await;
        assert_eq!(app.title(), "photos/");
        assert_eq!(app.selection, 1);

        app.go_back(&storage).await;
        assert_eq!(app.view, View::Buckets);
        assert_eq!(app.selection, 1);
    }

    #[tokio::test]
    async fn opening_a_file_yields_download_target() {
        let storage = FakeStorage::with_tree();
        let mut app = app(&storage);
        app.move_selection(1);
        app.open_selected(&storage).await;
        app.move_selection(1);
        app.open_selected(&storage).await;
        app.move_selection(1);

        let target = app.open_selected(&storage).await.unwrap();
        assert_eq!(
            target,
            DownloadTarget {
                bucket: "photos".into(),
                key: "2024/cat.jpg".into(),
                file_name: "cat.jpg".into(),
            }
        );
        assert_eq!(app.title(), "photos/2024/");
    }

    #[tokio::test]
    async fn failed_listing_keeps_previous_view() {
        let storage = FakeStorage::with_tree();
        let mut app = app(&storage);

        app.open_selected(&storage).await;
        assert_eq!(app.view, View::Buckets);
        assert_eq!(app.selection, 0);
        let flash = app.flash.as_ref().unwrap();
        assert!(flash.message.starts_with("Listing unavailable"));
        assert_eq!(storage.calls(), ["logs/"]);
    }

    #[tokio::test]
    async fn open_on_empty_collection_is_a_no_op() {
        let storage = FakeStorage::default();
        let mut app = App::new(Vec::new(), Duration::from_secs(2));
        assert!(app.open_selected(&storage).await.is_none());
        app.go_back(&storage).await;
        assert_eq!(app.view, View::Buckets);
        assert!(storage.calls().is_empty());
    }

    #[tokio::test]
    async fn refresh_clamps_selection() {
        let storage = FakeStorage::with_tree();
        let mut app = App::new(Vec::new(), Duration::from_secs(2));
        app.refresh(&storage).await;
        assert_eq!(app.buckets.len(), 2);
        app.jump_selection(false);
        assert_eq!(app.selection, 1);
    }

    #[test]
    fn download_lifecycle() {
        let mut app = App::new(Vec::new(), Duration::from_secs(2));
        let token = CancellationToken::new();
        app.start_download(PathBuf::from("dl/a.bin"), token.clone());
        assert!(app.download_running());
        assert!(app.cancel_download());
        assert!(token.is_cancelled());

        app.finish_download(Ok(DownloadOutcome::Cancelled));
        assert!(matches!(app.download, DownloadStatus::Cancelled));
        assert!(!app.download_running());
        assert!(!app.cancel_download());
        app.acknowledge_download();
        assert!(matches!(app.download, DownloadStatus::Idle));

        app.finish_download(Ok(DownloadOutcome::Completed {
            dest: PathBuf::from("dl/a.bin"),
            bytes: 3,
        }));
        assert!(matches!(app.download, DownloadStatus::Finished { .. }));

        app.finish_download(Err("denied".into()));
        assert!(matches!(app.download, DownloadStatus::Idle));
        assert_eq!(
            app.flash.as_ref().map(|f| f.message.as_str()),
            Some("Download failed: denied")
        );
    }
}
