//! Bounded-concurrency thumbnail downloader.
//!
//! Fans out HTTP fetches over a fixed-size worker pool, skips files that are
//! already on disk, and folds per-task outcomes into a single report. An
//! individual failure is logged and counted, never propagated as a batch
//! failure; there are no retries and no batch-level timeout.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tokio::sync::Semaphore;
use tracing::{Instrument, debug, error, info, warn};

use crate::document::Document;
use crate::fetch::{HttpClient, fetch_bytes};
use crate::record::InfluencerType;

/// Default worker cap for a download batch.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// One pending thumbnail download.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub id: u64,
    pub url: String,
    pub kind: Option<InfluencerType>,
}

/// Where downloaded files land on disk.
#[derive(Debug, Clone)]
pub enum StoreLayout {
    /// Everything in one directory.
    Single(PathBuf),
    /// One directory per influencer type: `<base>_regular` and `<base>_sales`.
    /// Untyped records are treated as regular.
    ByType(PathBuf),
}

impl StoreLayout {
    fn dir_for(&self, kind: Option<InfluencerType>) -> PathBuf {
        match self {
            StoreLayout::Single(dir) => dir.clone(),
            StoreLayout::ByType(base) => {
                let kind = kind.unwrap_or(InfluencerType::Regular);
                let name = format!(
                    "{}_{}",
                    base.file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("thumbnails"),
                    kind.as_str()
                );
                base.with_file_name(name)
            }
        }
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        match self {
            StoreLayout::Single(dir) => std::fs::create_dir_all(dir),
            StoreLayout::ByType(_) => {
                std::fs::create_dir_all(self.dir_for(Some(InfluencerType::Regular)))?;
                std::fs::create_dir_all(self.dir_for(Some(InfluencerType::Sales)))
            }
        }
    }
}

/// Outcome tallies and the per-record path mapping for one batch.
#[derive(Debug, Default)]
pub struct DownloadReport {
    pub results: HashMap<u64, Option<String>>,
    pub succeeded: usize,
    pub failed: usize,
}

struct Outcome {
    id: u64,
    local_path: Option<String>,
    kind: Option<InfluencerType>,
}

/// Collects download tasks from a document: one per record that has both an
/// identifier and a thumbnail URL.
pub fn collect_tasks(document: &Document) -> Vec<DownloadTask> {
    document
        .data
        .iter()
        .filter_map(|record| {
            let id = record.id?;
            let url = record.thumbnail_url.clone()?;
            Some(DownloadTask {
                id,
                url,
                kind: record.influencer_type,
            })
        })
        .collect()
}

/// Runs a batch of downloads through a fixed-size worker pool.
///
/// Already-present files count as successes without touching the network, so
/// re-running a finished batch is a no-op.
pub async fn download_all<C>(
    client: Arc<C>,
    tasks: Vec<DownloadTask>,
    layout: &StoreLayout,
    concurrency: usize,
) -> Result<DownloadReport>
where
    C: HttpClient + 'static,
{
    layout.ensure_dirs()?;

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut handles = Vec::with_capacity(tasks.len());

    for task in tasks {
        let sem = semaphore.clone();
        let client = client.clone();
        let dir = layout.dir_for(task.kind);

        let span = tracing::info_span!("download_thumbnail", id = task.id);
        handles.push(tokio::spawn(
            async move {
                let _permit = sem.acquire().await.unwrap();
                download_one(client.as_ref(), &task, &dir).await
            }
            .instrument(span),
        ));
    }

    let mut report = DownloadReport::default();
    let mut regular = (0usize, 0usize);
    let mut sales = (0usize, 0usize);

    for handle in handles {
        let Ok(outcome) = handle.await else { continue };

        let tally = match outcome.kind {
            Some(InfluencerType::Sales) => &mut sales,
            _ => &mut regular,
        };
        if outcome.local_path.is_some() {
            report.succeeded += 1;
            tally.0 += 1;
        } else {
            report.failed += 1;
            tally.1 += 1;
        }
        report.results.insert(outcome.id, outcome.local_path);
    }

    if matches!(layout, StoreLayout::ByType(_)) {
        info!(succeeded = regular.0, failed = regular.1, "regular downloads");
        info!(succeeded = sales.0, failed = sales.1, "sales downloads");
    }
    info!(
        succeeded = report.succeeded,
        failed = report.failed,
        "download batch finished"
    );

    Ok(report)
}

async fn download_one<C: HttpClient>(client: &C, task: &DownloadTask, dir: &Path) -> Outcome {
    let dest = dir.join(format!("{}.jpg", task.id));
    let relative = dest.display().to_string();

    if dest.exists() {
        debug!(path = %relative, "thumbnail already present, skipping");
        return Outcome {
            id: task.id,
            local_path: Some(relative),
            kind: task.kind,
        };
    }

    let fetch_start = Instant::now();
    match fetch_bytes(client, &task.url).await {
        Ok(bytes) => {
            let elapsed = fetch_start.elapsed();
            if elapsed.as_secs() > 15 {
                warn!(elapsed_secs = elapsed.as_secs(), "thumbnail fetch was slow");
            }
            match std::fs::write(&dest, &bytes) {
                Ok(()) => {
                    debug!(bytes = bytes.len(), path = %relative, "thumbnail downloaded");
                    Outcome {
                        id: task.id,
                        local_path: Some(relative),
                        kind: task.kind,
                    }
                }
                Err(e) => {
                    error!(error = %e, path = %relative, "failed to write thumbnail");
                    Outcome {
                        id: task.id,
                        local_path: None,
                        kind: task.kind,
                    }
                }
            }
        }
        Err(e) => {
            error!(error = %e, url = %task.url, "thumbnail fetch failed");
            Outcome {
                id: task.id,
                local_path: None,
                kind: task.kind,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::BasicClient;
    use std::env;
    use std::fs;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn temp_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn task(id: u64, url: String, kind: Option<InfluencerType>) -> DownloadTask {
        DownloadTask { id, url, kind }
    }

    #[test]
    fn test_by_type_layout_dirs() {
        let layout = StoreLayout::ByType(PathBuf::from("thumbnails"));

        assert_eq!(
            layout.dir_for(Some(InfluencerType::Sales)),
            PathBuf::from("thumbnails_sales")
        );
        assert_eq!(
            layout.dir_for(Some(InfluencerType::Regular)),
            PathBuf::from("thumbnails_regular")
        );
        // untyped records fall back to the regular directory
        assert_eq!(layout.dir_for(None), PathBuf::from("thumbnails_regular"));
    }

    #[test]
    fn test_single_layout_ignores_kind() {
        let layout = StoreLayout::Single(PathBuf::from("thumbnails"));
        assert_eq!(
            layout.dir_for(Some(InfluencerType::Sales)),
            PathBuf::from("thumbnails")
        );
    }

    #[tokio::test]
    async fn test_existing_files_skip_network_entirely() {
        let server = MockServer::start().await;
        let dir = temp_dir("reel_metrics_thumbs_skip");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("1.jpg"), b"cached").unwrap();
        fs::write(dir.join("2.jpg"), b"cached").unwrap();

        let tasks = vec![
            task(1, format!("{}/1.jpg", server.uri()), None),
            task(2, format!("{}/2.jpg", server.uri()), None),
        ];

        let client = Arc::new(BasicClient::new().unwrap());
        let report = download_all(client, tasks, &StoreLayout::Single(dir.clone()), 4)
            .await
            .unwrap();

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 0);
        assert!(report.results.values().all(|p| p.is_some()));
        assert!(server.received_requests().await.unwrap().is_empty());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_failures_do_not_abort_batch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = temp_dir("reel_metrics_thumbs_mixed");
        let tasks = vec![
            task(1, format!("{}/ok.jpg", server.uri()), None),
            task(2, format!("{}/gone.jpg", server.uri()), None),
        ];

        let client = Arc::new(BasicClient::new().unwrap());
        let report = download_all(client, tasks, &StoreLayout::Single(dir.clone()), 4)
            .await
            .unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
        assert!(report.results[&1].is_some());
        assert_eq!(report.results[&2], None);
        assert_eq!(fs::read(dir.join("1.jpg")).unwrap(), b"jpeg");
        assert!(!dir.join("2.jpg").exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_by_type_routes_to_partitioned_dirs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg".to_vec()))
            .mount(&server)
            .await;

        let base = temp_dir("reel_metrics_thumbs_by_type");
        let layout = StoreLayout::ByType(base.clone());
        let _ = fs::remove_dir_all(layout.dir_for(Some(InfluencerType::Regular)));
        let _ = fs::remove_dir_all(layout.dir_for(Some(InfluencerType::Sales)));
        let tasks = vec![
            task(1, format!("{}/a.jpg", server.uri()), Some(InfluencerType::Regular)),
            task(2, format!("{}/b.jpg", server.uri()), Some(InfluencerType::Sales)),
        ];

        let client = Arc::new(BasicClient::new().unwrap());
        let report = download_all(client, tasks, &layout, 4).await.unwrap();

        assert_eq!(report.succeeded, 2);
        assert!(layout.dir_for(Some(InfluencerType::Regular)).join("1.jpg").exists());
        assert!(layout.dir_for(Some(InfluencerType::Sales)).join("2.jpg").exists());

        fs::remove_dir_all(layout.dir_for(Some(InfluencerType::Regular))).unwrap();
        fs::remove_dir_all(layout.dir_for(Some(InfluencerType::Sales))).unwrap();
    }

    #[test]
    fn test_collect_tasks_requires_id_and_url() {
        use crate::document::SummarySection;
        use crate::record::InfluencerRecord;
        use crate::summary::Summary;

        let document = Document {
            summary: SummarySection::Single(Summary::default()),
            data: vec![
                InfluencerRecord {
                    id: Some(1),
                    thumbnail_url: Some("https://x/1.jpg".into()),
                    ..Default::default()
                },
                InfluencerRecord {
                    id: Some(2),
                    ..Default::default()
                },
                InfluencerRecord {
                    thumbnail_url: Some("https://x/3.jpg".into()),
                    ..Default::default()
                },
            ],
        };

        let tasks = collect_tasks(&document);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, 1);
    }
}
