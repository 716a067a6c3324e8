use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Invalid compare link format: {0}")]
    Malformed(String),
}

/// The four components of a GitHub compare URL, extracted by
/// parse_compare_link(). All fields are non-empty once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareSpec {
    pub organization: String,
    pub repository: String,
    pub base: String,
    pub head: String,
}

/// Parse a GitHub compare URL into its component parts.
///
/// Expected format: https://github.com/{org}/{repo}/compare/{base}...{head}
/// Returns LinkError::Malformed when the path has fewer than four segments,
/// the third segment is not the literal "compare", or the final segment does
/// not split into two non-empty branch names on "...".
///
/// Branch names are kept verbatim: URL-encoded characters pass through
/// untouched, and everything after "compare/" is rejoined so branch names
/// containing slashes parse correctly.
pub fn parse_compare_link(link: &str) -> Result<CompareSpec, LinkError> {
    let parsed =
        reqwest::Url::parse(link).map_err(|_| LinkError::Malformed(link.to_string()))?;

    let segments: Vec<_> = parsed
        .path_segments()
        .ok_or_else(|| LinkError::Malformed(link.to_string()))?
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.len() < 4 || segments[2] != "compare" {
        return Err(LinkError::Malformed(link.to_string()));
    }

    let compare_part = segments[3..].join("/");
    let (base, head) = compare_part
        .split_once("...")
        .ok_or_else(|| LinkError::Malformed(link.to_string()))?;

    if base.is_empty() || head.is_empty() {
        return Err(LinkError::Malformed(link.to_string()));
    }

    Ok(CompareSpec {
        organization: segments[0].to_string(),
        repository: segments[1].to_string(),
        base: base.to_string(),
        head: head.to_string(),
    })
}
