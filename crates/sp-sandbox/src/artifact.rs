// artifact.rs — Immutable run artifacts with secret redaction and caps.
//
// Every captured byte stream is redacted first and capped second, so a
// truncated artifact can never end mid-secret. The stored hash and size
// describe the post-redaction content.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Artifact size cap after redaction.
pub const MAX_ARTIFACT_BYTES: usize = 256 * 1024;

/// Appended when content is cut at the cap.
pub const TRUNCATED_SUFFIX: &str = "\n...[TRUNCATED]";

static AUTH_BEARER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(authorization:\s*bearer)\s+[A-Za-z0-9._\-+/=]+").unwrap()
});
static BARE_BEARER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(bearer)\s+[A-Za-z0-9._\-+/=]+").unwrap());
static KEY_VALUE_SECRET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(api[_-]?key|token|secret|password)\b\s*[:=]\s*([^\s,;]+)").unwrap()
});

/// What kind of byproduct an artifact is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    Stdout,
    Stderr,
    ReportJson,
    CoverageJson,
    ResultJson,
}

/// An immutable byproduct of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub run_id: Uuid,
    pub artifact_type: ArtifactType,
    pub content: String,
    pub size_bytes: u64,
    pub sha256_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    /// Build an artifact from already-sanitized content.
    pub fn new(
        tenant_id: Uuid,
        run_id: Uuid,
        artifact_type: ArtifactType,
        content: String,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            run_id,
            artifact_type,
            size_bytes: content.len() as u64,
            sha256_hash: format!("{:x}", hasher.finalize()),
            content,
            created_at: Utc::now(),
        }
    }
}

fn redact_secrets(content: &str) -> String {
    let redacted = AUTH_BEARER.replace_all(content, "$1 ***REDACTED***");
    let redacted = BARE_BEARER.replace_all(&redacted, "$1 ***REDACTED***");
    KEY_VALUE_SECRET
        .replace_all(&redacted, "$1=***REDACTED***")
        .into_owned()
}

fn cap_output(content: String) -> (String, bool) {
    if content.len() <= MAX_ARTIFACT_BYTES {
        return (content, false);
    }
    // Cut on a char boundary at or below the cap.
    let mut cut = MAX_ARTIFACT_BYTES;
    while !content.is_char_boundary(cut) {
        cut -= 1;
    }
    let mut truncated = content[..cut].to_string();
    truncated.push_str(TRUNCATED_SUFFIX);
    (truncated, true)
}

/// Redact then cap raw captured output. Returns the stored content and
/// whether it was truncated.
pub fn sanitize_artifact_content(raw: &str) -> (String, bool) {
    cap_output(redact_secrets(raw))
}
