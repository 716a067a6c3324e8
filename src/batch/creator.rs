use std::time::Duration;

use tracing::{debug, warn};

use crate::batch::types::OutcomeStatus;
use crate::github::{CreateResponse, GithubApi, GithubError, PullRequestRef};
use crate::link::CompareSpec;

/// Retry bounds for the create call. Only transient 5xx responses retry;
/// every other class is terminal on first observation because the create
/// endpoint is not idempotent.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total create attempts; values below 1 are treated as 1.
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Terminal classification of one create-or-detect run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOutcome {
    pub status: OutcomeStatus,
    pub pr_link: Option<String>,
    pub reason: String,
}

impl CreateOutcome {
    fn error(reason: impl Into<String>) -> Self {
        CreateOutcome {
            status: OutcomeStatus::Error,
            pr_link: None,
            reason: reason.into(),
        }
    }
}

/// Find an already-open pull request with exactly these base and head
/// branches. Comparison is case-sensitive string equality, matching what the
/// provider stores. Returns None both when no match exists and when the
/// listing itself fails — the caller's reason string distinguishes the two.
pub async fn find_existing_pr(
    api: &dyn GithubApi,
    spec: &CompareSpec,
) -> Option<PullRequestRef> {
    match api
        .list_open_pulls(&spec.organization, &spec.repository)
        .await
    {
        Ok(pulls) => pulls
            .into_iter()
            .find(|pr| pr.base == spec.base && pr.head == spec.head),
        Err(e) => {
            warn!(
                org = %spec.organization,
                repo = %spec.repository,
                error = %e,
                "could not confirm existing pull request"
            );
            None
        }
    }
}

/// Create a pull request, or detect that one already exists.
///
/// Drives the create call through an exhaustive match over the response
/// classes: 201 and every 4xx class terminate on the first attempt, while
/// 500/502/503/504 back off and retry up to `policy.max_attempts`. Transport
/// errors propagate to the caller.
pub async fn create_or_detect(
    api: &dyn GithubApi,
    spec: &CompareSpec,
    title: &str,
    policy: &RetryPolicy,
) -> Result<CreateOutcome, GithubError> {
    let max_attempts = policy.max_attempts.max(1);
    for attempt in 1..=max_attempts {
        let response = api
            .create_pull(
                &spec.organization,
                &spec.repository,
                &spec.base,
                &spec.head,
                title,
            )
            .await?;

        match response {
            CreateResponse::Created { url } => {
                debug!(org = %spec.organization, repo = %spec.repository, %url, "created pull request");
                return Ok(CreateOutcome {
                    status: OutcomeStatus::Created,
                    pr_link: Some(url),
                    reason: String::new(),
                });
            }
            CreateResponse::AlreadyExists => {
                let outcome = match find_existing_pr(api, spec).await {
                    Some(pr) => CreateOutcome {
                        status: OutcomeStatus::Duplicate,
                        pr_link: Some(pr.url),
                        reason: "Pull request already exists.".to_string(),
                    },
                    None => CreateOutcome {
                        status: OutcomeStatus::Duplicate,
                        pr_link: None,
                        reason: "PR exists but URL not found.".to_string(),
                    },
                };
                return Ok(outcome);
            }
            CreateResponse::NotFound => {
                return Ok(CreateOutcome::error("Repository or branch not found."));
            }
            CreateResponse::Forbidden => {
                return Ok(CreateOutcome::error(
                    "Rate limit exceeded or token permissions insufficient.",
                ));
            }
            CreateResponse::Unauthorized => {
                return Ok(CreateOutcome::error("Invalid GitHub token."));
            }
            CreateResponse::ServerError(code) => {
                warn!(
                    org = %spec.organization,
                    repo = %spec.repository,
                    code,
                    attempt,
                    "server error, retrying"
                );
                if attempt < max_attempts {
                    tokio::time::sleep(policy.backoff).await;
                }
            }
            CreateResponse::Unexpected(code) => {
                return Ok(CreateOutcome::error(format!("Unexpected error: {code}")));
            }
        }
    }

    Ok(CreateOutcome::error(
        "Failed after max retries due to server error.",
    ))
}
