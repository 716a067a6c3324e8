pub mod types;

pub use types::{Comparison, CreateResponse, FilesChanged, PullRequestRef};

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use types::PullItem;

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("GitHub API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {endpoint}")]
    UnexpectedStatus { endpoint: String, status: u16 },
}

/// The three GitHub calls the pipeline needs, behind a trait so the creator,
/// worker, and scheduler can run against a scripted double in tests.
#[async_trait]
pub trait GithubApi: Send + Sync {
    /// List all open pull requests for a repository.
    async fn list_open_pulls(
        &self,
        org: &str,
        repo: &str,
    ) -> Result<Vec<PullRequestRef>, GithubError>;

    /// Fetch the base...head comparison. Ok(None) means the remote reported
    /// the comparison not found (missing repo or branch).
    async fn compare(
        &self,
        org: &str,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<Option<Comparison>, GithubError>;

    /// Attempt to create a pull request and classify the response.
    async fn create_pull(
        &self,
        org: &str,
        repo: &str,
        base: &str,
        head: &str,
        title: &str,
    ) -> Result<CreateResponse, GithubError>;
}

/// Transport-level retries per request, on top of the first attempt. This is
/// distinct from the application-level 5xx retry in the PR creator.
const TRANSPORT_RETRIES: usize = 2;

/// GitHub's maximum page size for list endpoints.
const PAGE_SIZE: usize = 100;

/// Authenticated reqwest-based client bound to one token and API base URL.
/// The token is read-only shared configuration — set once at construction.
pub struct GithubClient {
    http: reqwest::Client,
    token: String,
    api_base: String,
}

impl GithubClient {
    pub fn new(token: &str, api_base: &str) -> Result<Self, GithubError> {
        let http = reqwest::Client::builder()
            .user_agent("pr-publisher")
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            token: token.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    /// Send a request, retrying connect and timeout failures a bounded number
    /// of times. Other transport errors surface immediately.
    async fn send_with_retry(&self, request: RequestBuilder) -> Result<Response, reqwest::Error> {
        let mut last_error = None;
        for attempt in 0..=TRANSPORT_RETRIES {
            let Some(cloned) = request.try_clone() else {
                break;
            };
            match cloned.send().await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_connect() || e.is_timeout() => {
                    warn!(attempt, error = %e, "transport failure, retrying");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        match last_error {
            Some(e) => Err(e),
            // Request body was not clonable; fall back to a single attempt.
            None => request.send().await,
        }
    }
}

#[derive(Deserialize)]
struct CompareBody {
    total_commits: u64,
    #[serde(default)]
    files: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct CreatedPull {
    html_url: String,
}

#[async_trait]
impl GithubApi for GithubClient {
    async fn list_open_pulls(
        &self,
        org: &str,
        repo: &str,
    ) -> Result<Vec<PullRequestRef>, GithubError> {
        let url = format!("{}/repos/{org}/{repo}/pulls", self.api_base);
        let mut pulls = Vec::new();
        let mut page = 1u32;

        // Open PRs can span several pages; read them all so the duplicate
        // check never misses a match beyond the first page.
        loop {
            let per_page = PAGE_SIZE.to_string();
            let page_param = page.to_string();
            let response = self
                .send_with_retry(self.request(Method::GET, &url).query(&[
                    ("state", "open"),
                    ("per_page", per_page.as_str()),
                    ("page", page_param.as_str()),
                ]))
                .await?;

            if !response.status().is_success() {
                return Err(GithubError::UnexpectedStatus {
                    endpoint: format!("list pulls for {org}/{repo}"),
                    status: response.status().as_u16(),
                });
            }

            let items: Vec<PullItem> = response.json().await?;
            let count = items.len();
            pulls.extend(items.into_iter().map(PullRequestRef::from));

            if count < PAGE_SIZE {
                break;
            }
            page += 1;
        }

        debug!(org, repo, open_pulls = pulls.len(), "listed open pull requests");
        Ok(pulls)
    }

    async fn compare(
        &self,
        org: &str,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<Option<Comparison>, GithubError> {
        let url = format!(
            "{}/repos/{org}/{repo}/compare/{base}...{head}",
            self.api_base
        );
        let response = self.send_with_retry(self.request(Method::GET, &url)).await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!(org, repo, base, head, "comparison not found");
                Ok(None)
            }
            status if status.is_success() => {
                let body: CompareBody = response.json().await?;
                let comparison = Comparison {
                    total_commits: body.total_commits,
                    files_changed: FilesChanged::from_file_count(body.files.len()),
                };
                debug!(
                    org,
                    repo,
                    base,
                    head,
                    commits = comparison.total_commits,
                    files = %comparison.files_changed,
                    "fetched comparison"
                );
                Ok(Some(comparison))
            }
            status => Err(GithubError::UnexpectedStatus {
                endpoint: format!("compare for {org}/{repo}"),
                status: status.as_u16(),
            }),
        }
    }

    async fn create_pull(
        &self,
        org: &str,
        repo: &str,
        base: &str,
        head: &str,
        title: &str,
    ) -> Result<CreateResponse, GithubError> {
        let url = format!("{}/repos/{org}/{repo}/pulls", self.api_base);
        let body = serde_json::json!({ "title": title, "head": head, "base": base });

        let response = self
            .send_with_retry(self.request(Method::POST, &url).json(&body))
            .await?;

        let status = response.status().as_u16();
        let classified = match status {
            201 => {
                let created: CreatedPull = response.json().await?;
                CreateResponse::Created {
                    url: created.html_url,
                }
            }
            422 => CreateResponse::AlreadyExists,
            404 => CreateResponse::NotFound,
            403 => CreateResponse::Forbidden,
            401 => CreateResponse::Unauthorized,
            500 | 502 | 503 | 504 => CreateResponse::ServerError(status),
            other => CreateResponse::Unexpected(other),
        };

        debug!(org, repo, base, head, status, response = ?classified, "create pull request");
        Ok(classified)
    }
}
