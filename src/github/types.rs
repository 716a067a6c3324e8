use serde::Deserialize;

/// An open or newly created pull request, reduced to the fields the
/// duplicate check and the result report need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    /// Absolute html_url of the pull request
    pub url: String,
    /// Base branch name
    pub base: String,
    /// Head branch name
    pub head: String,
}

/// Files-changed count from the compare endpoint. GitHub caps the file list
/// at 300 entries, so a full page means the true count is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilesChanged {
    Exact(u64),
    Truncated,
}

impl FilesChanged {
    /// Number of entries GitHub returns before truncating the file list.
    pub const FILE_LIST_CAP: usize = 300;

    /// Normalize a raw file-list length: a count at the cap becomes the
    /// truncation sentinel since the remote stops reporting there.
    pub fn from_file_count(count: usize) -> Self {
        if count >= Self::FILE_LIST_CAP {
            FilesChanged::Truncated
        } else {
            FilesChanged::Exact(count as u64)
        }
    }
}

impl std::fmt::Display for FilesChanged {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilesChanged::Exact(count) => write!(f, "{count}"),
            FilesChanged::Truncated => write!(f, "300+"),
        }
    }
}

/// Result of a base...head comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comparison {
    /// Commits on head that are not on base
    pub total_commits: u64,
    /// Changed files, normalized at the 300-entry cap
    pub files_changed: FilesChanged,
}

/// Classification of the create-pull-request response, one variant per
/// response-code class the provider documents. Keeping this closed lets the
/// retry state machine match exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateResponse {
    /// 201 — pull request created
    Created { url: String },
    /// 422 — a pull request for these branches already exists
    AlreadyExists,
    /// 404 — repository or branch not found
    NotFound,
    /// 403 — rate limited or insufficient token permission
    Forbidden,
    /// 401 — invalid credential
    Unauthorized,
    /// 500/502/503/504 — transient server error, safe to retry
    ServerError(u16),
    /// Anything else
    Unexpected(u16),
}

/// Wire shape of one element of the list-pulls response.
#[derive(Debug, Deserialize)]
pub(super) struct PullItem {
    pub html_url: String,
    pub base: BranchRef,
    pub head: BranchRef,
}

#[derive(Debug, Deserialize)]
pub(super) struct BranchRef {
    #[serde(rename = "ref")]
    pub ref_field: String,
}

impl From<PullItem> for PullRequestRef {
    fn from(item: PullItem) -> Self {
        PullRequestRef {
            url: item.html_url,
            base: item.base.ref_field,
            head: item.head.ref_field,
        }
    }
}
