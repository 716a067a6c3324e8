pub mod creator;
pub mod types;
pub mod worker;

pub use creator::RetryPolicy;
pub use types::{LinkResult, OutcomeStatus, RunSummary};

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};
use tracing::{info, warn};

use crate::github::GithubApi;

/// How often to log batch progress, in completed links.
const PROGRESS_EVERY: usize = 5;

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Ceiling on simultaneously outstanding workers, bounding concurrent
    /// remote calls against the provider's rate limits.
    pub concurrency: usize,
    pub retry: RetryPolicy,
}

impl Default for BatchOptions {
    fn default() -> Self {
        BatchOptions {
            concurrency: 5,
            retry: RetryPolicy::default(),
        }
    }
}

/// Run one worker per compare link under the concurrency cap and fold the
/// completed results into a summary.
///
/// Results arrive in completion order, not input order. The `join_next` loop
/// is the single consumer that owns the result vector and summary; workers
/// only produce immutable LinkResult values, so no counter is ever shared.
/// Every link yields exactly one row — even a panicked worker task is
/// converted to an Error row rather than lost.
pub async fn run(
    api: Arc<dyn GithubApi>,
    links: Vec<String>,
    title: &str,
    options: &BatchOptions,
) -> (Vec<LinkResult>, RunSummary) {
    let total = links.len();
    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let mut workers = JoinSet::new();
    // Task id -> input link, so a panicked task's row still names its link.
    let mut pending: HashMap<Id, String> = HashMap::with_capacity(total);

    info!(total, concurrency = options.concurrency, "starting batch");

    for link in links {
        let api = Arc::clone(&api);
        let semaphore = Arc::clone(&semaphore);
        let title = title.to_string();
        let policy = options.retry.clone();
        let task_link = link.clone();

        let handle = workers.spawn(async move {
            // The semaphore is never closed; acquisition only fails during
            // runtime teardown.
            let _permit = semaphore.acquire_owned().await.ok();
            worker::process_link(api.as_ref(), &link, &title, &policy).await
        });
        pending.insert(handle.id(), task_link);
    }

    let mut results = Vec::with_capacity(total);
    let mut summary = RunSummary::default();

    while let Some(joined) = workers.join_next_with_id().await {
        let result = match joined {
            Ok((id, result)) => {
                pending.remove(&id);
                result
            }
            Err(e) => {
                let link = pending.remove(&e.id()).unwrap_or_default();
                warn!(error = %e, %link, "worker task failed");
                LinkResult::failure(link, format!("Worker task failed: {e}"))
            }
        };

        summary.record(result.status);
        results.push(result);

        let completed = results.len();
        if completed % PROGRESS_EVERY == 0 || completed == total {
            info!(completed, total, "processed links");
        }
    }

    (results, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::testing::ScriptedApi;
    use crate::github::{Comparison, CreateResponse, FilesChanged, GithubError, PullRequestRef};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const LINK: &str = "https://github.com/org/repo/compare/main...feature";

    fn options() -> BatchOptions {
        BatchOptions {
            concurrency: 3,
            retry: RetryPolicy {
                max_attempts: 3,
                backoff: Duration::ZERO,
            },
        }
    }

    fn comparison(commits: u64) -> Comparison {
        Comparison {
            total_commits: commits,
            files_changed: FilesChanged::Exact(1),
        }
    }

    #[tokio::test]
    async fn test_every_link_yields_one_result() {
        let mut api = ScriptedApi::new();
        for _ in 0..6 {
            api = api.queue_comparison(Ok(Some(comparison(0))));
        }

        let links = vec![LINK.to_string(); 6];
        let (results, summary) = run(Arc::new(api), links, "t", &options()).await;

        assert_eq!(results.len(), 6);
        assert_eq!(summary.total(), 6);
        assert_eq!(summary.skipped, 6);
    }

    #[tokio::test]
    async fn test_mixed_outcomes_are_counted_once_each() {
        // One skipped (0 commits), one invalid comparison, one created, and
        // one malformed link that never reaches the remote.
        let api = ScriptedApi::new()
            .queue_comparison(Ok(Some(comparison(0))))
            .queue_comparison(Ok(None))
            .queue_comparison(Ok(Some(comparison(2))))
            .queue_creation(Ok(CreateResponse::Created {
                url: "https://github.com/org/repo/pull/1".to_string(),
            }));

        let links = vec![
            LINK.to_string(),
            LINK.to_string(),
            LINK.to_string(),
            "https://github.com/org/repo".to_string(),
        ];
        let (results, summary) = run(Arc::new(api), links, "t", &options()).await;

        assert_eq!(results.len(), 4);
        assert_eq!(summary.total(), 4);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.created, 1);
        assert_eq!(summary.error, 2);
    }

    #[tokio::test]
    async fn test_panicked_worker_still_reports_its_link() {
        // No scripted responses queued, so the worker's compare call panics.
        let (results, summary) = run(
            Arc::new(ScriptedApi::new()),
            vec![LINK.to_string()],
            "t",
            &options(),
        )
        .await;

        assert_eq!(results.len(), 1);
        assert_eq!(summary.error, 1);
        assert_eq!(results[0].link, LINK);
        assert_eq!(results[0].status, OutcomeStatus::Error);
        assert!(results[0].reason.contains("Worker task failed"));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let (results, summary) = run(Arc::new(ScriptedApi::new()), vec![], "t", &options()).await;
        assert!(results.is_empty());
        assert_eq!(summary, RunSummary::default());
    }

    /// Records the peak number of in-flight compare calls.
    #[derive(Default)]
    struct GaugeApi {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl crate::github::GithubApi for GaugeApi {
        async fn list_open_pulls(
            &self,
            _org: &str,
            _repo: &str,
        ) -> Result<Vec<PullRequestRef>, GithubError> {
            Ok(vec![])
        }

        async fn compare(
            &self,
            _org: &str,
            _repo: &str,
            _base: &str,
            _head: &str,
        ) -> Result<Option<Comparison>, GithubError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(Some(Comparison {
                total_commits: 0,
                files_changed: FilesChanged::Exact(0),
            }))
        }

        async fn create_pull(
            &self,
            _org: &str,
            _repo: &str,
            _base: &str,
            _head: &str,
            _title: &str,
        ) -> Result<CreateResponse, GithubError> {
            panic!("create_pull should not be reached");
        }
    }

    #[tokio::test]
    async fn test_concurrency_cap_bounds_in_flight_calls() {
        let api = Arc::new(GaugeApi::default());
        let links = vec![LINK.to_string(); 10];
        let opts = BatchOptions {
            concurrency: 2,
            ..options()
        };

        let handle: Arc<dyn GithubApi> = api.clone();
        let (results, summary) = run(handle, links, "t", &opts).await;

        assert_eq!(results.len(), 10);
        assert_eq!(summary.skipped, 10);
        assert!(api.peak.load(Ordering::SeqCst) <= 2);
    }
}
