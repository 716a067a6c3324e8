use crate::github::FilesChanged;

/// Terminal classification for one processed compare link. Never revised
/// after the worker completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Created,
    Duplicate,
    Skipped,
    Error,
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeStatus::Created => write!(f, "Created"),
            OutcomeStatus::Duplicate => write!(f, "Duplicate"),
            OutcomeStatus::Skipped => write!(f, "Skipped"),
            OutcomeStatus::Error => write!(f, "Error"),
        }
    }
}

/// One result row per input link, produced by its worker and immutable
/// thereafter. Absent fields render as "-" in the report.
#[derive(Debug, Clone)]
pub struct LinkResult {
    pub link: String,
    pub status: OutcomeStatus,
    pub pr_link: Option<String>,
    pub commits: Option<u64>,
    pub files_changed: Option<FilesChanged>,
    pub reason: String,
}

impl LinkResult {
    /// An Error row with no remote data, carrying the failure's message.
    pub fn failure(link: impl Into<String>, reason: impl Into<String>) -> Self {
        LinkResult {
            link: link.into(),
            status: OutcomeStatus::Error,
            pr_link: None,
            commits: None,
            files_changed: None,
            reason: reason.into(),
        }
    }
}

/// Outcome counts for one batch run. Owned exclusively by the scheduler's
/// aggregation loop; incremented exactly once per completed worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub created: usize,
    pub duplicate: usize,
    pub skipped: usize,
    pub error: usize,
}

impl RunSummary {
    pub fn record(&mut self, status: OutcomeStatus) {
        match status {
            OutcomeStatus::Created => self.created += 1,
            OutcomeStatus::Duplicate => self.duplicate += 1,
            OutcomeStatus::Skipped => self.skipped += 1,
            OutcomeStatus::Error => self.error += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.created + self.duplicate + self.skipped + self.error
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} Created, {} Skipped, {} Duplicate, {} Error",
            self.created, self.skipped, self.duplicate, self.error
        )
    }
}
