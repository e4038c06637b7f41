use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::{BucketInfo, Node, assign_bucket_display_strings};

/// Outcome of a download that was allowed to run to its end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DownloadOutcome {
    Completed { dest: PathBuf, bytes: u64 },
    Cancelled,
}

/// Listing and download operations the browser needs from object storage.
pub trait Storage {
    fn list_buckets(&self) -> impl Future<Output = Result<Vec<BucketInfo>>> + Send;

    fn list_nodes(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> impl Future<Output = Result<Vec<Node>>> + Send;

    fn download(
        &self,
        bucket: &str,
        key: &str,
        dest: &Path,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<DownloadOutcome>> + Send;
}

#[derive(Clone)]
pub struct S3Service {
    client: Client,
}

impl S3Service {
    pub async fn new(config: &Config) -> Result<Self> {
        let mut loader = aws_config::from_env();
        if let Some(profile) = &config.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.force_path_style)
            .build();
        Ok(Self {
            client: Client::from_conf(s3_config),
        })
    }
}

impl Storage for S3Service {
    async fn list_buckets(&self) -> Result<Vec<BucketInfo>> {
        let output = self
            .client
            .list_buckets()
            .send()
            .await
            .context("failed to list buckets")?;
        let mut buckets = Vec::new();
        for bucket in output.buckets() {
            if let Some(name) = bucket.name() {
                let created = bucket.creation_date().and_then(|dt| {
                    chrono::DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
                        .map(|dt| dt.format("%Y-%m-%d").to_string())
                });
                buckets.push(BucketInfo::new(name, created));
            }
        }
        buckets.sort_by(|a, b| a.name.cmp(&b.name));
        assign_bucket_display_strings(&mut buckets);
        info!(count = buckets.len(), "listed buckets");
        Ok(buckets)
    }

    async fn list_nodes(&self, bucket: &str, prefix: &str) -> Result<Vec<Node>> {
        let mut continuation_token: Option<String> = None;
        let mut dirs = Vec::new();
        let mut files = Vec::new();
        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .delimiter("/");
            if !prefix.is_empty() {
                request = request.prefix(prefix);
            }
            if let Some(token) = &continuation_token {
                request = request.continuation_token(token);
            }
            let response = request
                .send()
                .await
                .with_context(|| format!("failed to list s3://{bucket}/{prefix}"))?;

            for common in response.common_prefixes() {
                if let Some(p) = common.prefix() {
                    dirs.push(Node::directory(prefix, p));
                }
            }
            for object in response.contents() {
                if let Some(key) = object.key() {
                    if key == prefix {
                        continue;
                    }
                    files.push(Node::file(prefix, key, object.size().unwrap_or_default()));
                }
            }

            if response.is_truncated().unwrap_or(false) {
                continuation_token = response
                    .next_continuation_token()
                    .map(|token| token.to_string());
            } else {
                break;
            }
        }
        dirs.sort_by(|a, b| a.key.cmp(&b.key));
        files.sort_by(|a, b| a.key.cmp(&b.key));
        dirs.extend(files);
        info!(bucket, prefix, count = dirs.len(), "listed nodes");
        Ok(dirs)
    }

    async fn download(
        &self,
        bucket: &str,
        key: &str,
        dest: &Path,
        cancel: CancellationToken,
    ) -> Result<DownloadOutcome> {
        let request = self.client.get_object().bucket(bucket).key(key).send();
        let output = tokio::select! {
            _ = cancel.cancelled() => {
                info!(bucket, key, "download cancelled");
                return Ok(DownloadOutcome::Cancelled);
            }
            output = request => output.with_context(|| format!("failed to fetch s3://{bucket}/{key}"))?,
        };
        let outcome = remove_unless_completed(dest, save_body(output.body, dest, &cancel)).await;
        match &outcome {
            Ok(DownloadOutcome::Completed { bytes, .. }) => {
                info!(bucket, key, bytes = *bytes, dest = %dest.display(), "download complete");
            }
            Ok(DownloadOutcome::Cancelled) => info!(bucket, key, "download cancelled"),
            Err(_) => {}
        }
        outcome
    }
}

async fn save_body(
    mut body: ByteStream,
    dest: &Path,
    cancel: &CancellationToken,
) -> Result<DownloadOutcome> {
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let mut file = fs::File::create(dest)
        .await
        .with_context(|| format!("failed to create {}", dest.display()))?;

    let mut bytes = 0u64;
    loop {
        let chunk = tokio::select! {
            _ = cancel.cancelled() => return Ok(DownloadOutcome::Cancelled),
            chunk = body.try_next() => chunk.context("download stream failed")?,
        };
        match chunk {
            Some(data) => {
                file.write_all(&data)
                    .await
                    .with_context(|| format!("failed to write {}", dest.display()))?;
                bytes += data.len() as u64;
                debug!(bytes, "download progress");
            }
            None => break,
        }
    }
    file.flush()
        .await
        .with_context(|| format!("failed to flush {}", dest.display()))?;
    Ok(DownloadOutcome::Completed {
        dest: dest.to_path_buf(),
        bytes,
    })
}

/// Runs a download and deletes whatever it left at `dest` unless it completed.
pub(crate) async fn remove_unless_completed(
    dest: &Path,
    download: impl Future<Output = Result<DownloadOutcome>>,
) -> Result<DownloadOutcome> {
    let outcome = download.await;
    if !matches!(outcome, Ok(DownloadOutcome::Completed { .. })) {
        match fs::remove_file(dest).await {
            Ok(()) => debug!(dest = %dest.display(), "removed partial download"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                warn!(error = %err, dest = %dest.display(), "could not remove partial download")
            }
        }
    }
    outcome
}
