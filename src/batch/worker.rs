use thiserror::Error;
use tracing::{debug, instrument};

use crate::batch::creator::{create_or_detect, RetryPolicy};
use crate::batch::types::{LinkResult, OutcomeStatus};
use crate::github::{Comparison, GithubApi, GithubError};
use crate::link::{parse_compare_link, LinkError};

#[derive(Debug, Error)]
enum WorkerError {
    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Github(#[from] GithubError),
}

/// Process one compare link end to end: parse, fetch the comparison, skip
/// empty diffs, otherwise create or detect the pull request.
///
/// Infallible at this boundary: every internal failure becomes an Error
/// result carrying the failure's message, so one bad link never aborts the
/// batch.
#[instrument(skip(api, title, policy))]
pub async fn process_link(
    api: &dyn GithubApi,
    link: &str,
    title: &str,
    policy: &RetryPolicy,
) -> LinkResult {
    match run_pipeline(api, link, title, policy).await {
        Ok(result) => result,
        Err(e) => {
            debug!(error = %e, "link processing failed");
            LinkResult::failure(link, e.to_string())
        }
    }
}

async fn run_pipeline(
    api: &dyn GithubApi,
    link: &str,
    title: &str,
    policy: &RetryPolicy,
) -> Result<LinkResult, WorkerError> {
    let spec = parse_compare_link(link)?;

    let Some(comparison) = api
        .compare(&spec.organization, &spec.repository, &spec.base, &spec.head)
        .await?
    else {
        return Ok(LinkResult::failure(link, "Compare link not valid."));
    };

    let Comparison {
        total_commits,
        files_changed,
    } = comparison;

    // Nothing to publish; the remote would reject an empty PR anyway.
    if total_commits == 0 {
        return Ok(LinkResult {
            link: link.to_string(),
            status: OutcomeStatus::Skipped,
            pr_link: None,
            commits: Some(0),
            files_changed: Some(files_changed),
            reason: "No new commits to publish.".to_string(),
        });
    }

    let outcome = create_or_detect(api, &spec, title, policy).await?;
    Ok(LinkResult {
        link: link.to_string(),
        status: outcome.status,
        pr_link: outcome.pr_link,
        commits: Some(total_commits),
        files_changed: Some(files_changed),
        reason: outcome.reason,
    })
}
