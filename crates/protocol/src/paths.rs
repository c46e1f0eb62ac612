//! URL and path building for the API and push endpoints.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::constants::RESULTS_PATH;
use crate::types::JobHandle;

/// Characters left unescaped in a single path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encodes a value for use as one path segment.
pub fn encode_segment(value: &str) -> String {
    utf8_percent_encode(value, SEGMENT).to_string()
}

/// Status path for a job: `/results/{jobId}`.
pub fn results_path(job: &JobHandle) -> String {
    format!("{RESULTS_PATH}/{}", encode_segment(job.as_str()))
}

/// Push channel address for a job: `{base}/results/{jobId}`.
pub fn push_url(base: &str, job: &JobHandle) -> String {
    format!("{}{}", base.trim_end_matches('/'), results_path(job))
}

/// Joins `path` onto `base`.
///
/// Absolute `http://` / `https://` paths are returned unchanged. Duplicate
/// slashes in the relative path collapse to one.
pub fn join_url(base: &str, path: &str) -> String {
    if is_absolute(path) {
        return path.to_string();
    }
    let mut normalized = String::with_capacity(path.len() + 1);
    normalized.push('/');
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if normalized.len() > 1 {
            normalized.push('/');
        }
        normalized.push_str(segment);
    }
    if path.ends_with('/') && normalized.len() > 1 {
        normalized.push('/');
    }
    format!("{}{}", base.trim_end_matches('/'), normalized)
}

fn is_absolute(path: &str) -> bool {
    let lower = path.get(..8).unwrap_or(path).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
