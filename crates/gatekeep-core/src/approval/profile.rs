//! Reviewer profile resolution.
//!
//! # Sources
//!
//! A [`ReviewerProfile`] is assembled from, in increasing priority:
//!
//! 1. Built-in defaults (`local-reviewer`, allow everything, deny nothing)
//! 2. Environment identity and log path (`AGENT_APPROVER_ID`, ...)
//! 3. A JSON config document at `AGENT_APPROVAL_CONFIG`, if set
//!
//! When no config document is set, or it cannot be read or parsed, the
//! allow/deny lists come from `AGENT_APPROVAL_ALLOW` / `AGENT_APPROVAL_DENY`.
//!
//! # Config Format
//!
//! ```json
//! {
//!   "id": "alice",
//!   "name": "Alice",
//!   "allow": ["notes/**", "drafts/*"],
//!   "deny": "notes/secret.md, notes/private/**",
//!   "logPath": "audit/approvals.jsonl"
//! }
//! ```
//!
//! Every field is optional. A missing, blank, or wrongly typed field falls
//! back to the value from the lower-priority source; a bad config never
//! aborts decision-making.
//!
//! The environment is read once into [`ReviewerSettings`] by the caller and
//! the resolved profile is passed explicitly to the resume loop.

use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_REVIEWER_ID: &str = "local-reviewer";
pub const DEFAULT_REVIEWER_NAME: &str = "Local Reviewer";
pub const DEFAULT_LOG_PATH: &str = ".agent-approvals.jsonl";

pub const ENV_APPROVER_ID: &str = "AGENT_APPROVER_ID";
pub const ENV_APPROVER_NAME: &str = "AGENT_APPROVER_NAME";
pub const ENV_APPROVAL_LOG: &str = "AGENT_APPROVAL_LOG";
pub const ENV_APPROVAL_CONFIG: &str = "AGENT_APPROVAL_CONFIG";
pub const ENV_APPROVAL_ALLOW: &str = "AGENT_APPROVAL_ALLOW";
pub const ENV_APPROVAL_DENY: &str = "AGENT_APPROVAL_DENY";

/// Identity and path rules for one approval session.
///
/// Immutable for the duration of a resume-loop invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewerProfile {
    pub id: String,
    pub name: String,
    /// Paths that may be written, in order.
    pub allow: Vec<String>,
    /// Paths that are always refused, in order. Outranks `allow`.
    pub deny: Vec<String>,
    /// Where decision records are appended.
    pub log_path: PathBuf,
}

impl Default for ReviewerProfile {
    fn default() -> Self {
        Self {
            id: DEFAULT_REVIEWER_ID.to_string(),
            name: DEFAULT_REVIEWER_NAME.to_string(),
            allow: vec!["**".to_string()],
            deny: Vec::new(),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
        }
    }
}

/// Raw reviewer settings captured from the environment (or elsewhere).
///
/// Blank values are treated as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewerSettings {
    pub approver_id: Option<String>,
    pub approver_name: Option<String>,
    pub log_path: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    /// Comma-separated allow patterns.
    pub allow: Option<String>,
    /// Comma-separated deny patterns.
    pub deny: Option<String>,
}

impl ReviewerSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            approver_id: get(ENV_APPROVER_ID),
            approver_name: get(ENV_APPROVER_NAME),
            log_path: get(ENV_APPROVAL_LOG).map(PathBuf::from),
            config_path: get(ENV_APPROVAL_CONFIG).map(PathBuf::from),
            allow: get(ENV_APPROVAL_ALLOW),
            deny: get(ENV_APPROVAL_DENY),
        }
    }

    /// Defaults overlaid with the identity and log path from these settings.
    fn base_profile(&self) -> ReviewerProfile {
        let defaults = ReviewerProfile::default();
        ReviewerProfile {
            id: self.approver_id.clone().unwrap_or(defaults.id),
            name: self.approver_name.clone().unwrap_or(defaults.name),
            log_path: self.log_path.clone().unwrap_or(defaults.log_path),
            ..defaults
        }
    }

    /// Resolve the effective profile. Never fails.
    pub fn resolve(&self) -> ReviewerProfile {
        let base = self.base_profile();

        if let Some(config_path) = &self.config_path {
            match read_config_document(config_path) {
                Ok(document) => return profile_from_document(&document, base),
                Err(e) => {
                    log::warn!(
                        "Failed to read approval config at {}: {}",
                        config_path.display(),
                        e
                    );
                }
            }
        }

        ReviewerProfile {
            allow: parse_pattern_list(self.allow.as_deref(), &base.allow),
            deny: parse_pattern_list(self.deny.as_deref(), &base.deny),
            ..base
        }
    }
}

fn read_config_document(path: &Path) -> Result<Value, std::io::Error> {
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

/// Overlay a parsed config document onto `base`, field by field.
pub fn profile_from_document(document: &Value, base: ReviewerProfile) -> ReviewerProfile {
    let text = |key: &str| {
        document
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    ReviewerProfile {
        id: text("id").unwrap_or(base.id),
        name: text("name").unwrap_or(base.name),
        allow: normalize_pattern_list(document.get("allow"), &base.allow),
        deny: normalize_pattern_list(document.get("deny"), &base.deny),
        log_path: text("logPath").map(PathBuf::from).unwrap_or(base.log_path),
    }
}

/// Accept a pattern list as a JSON array of strings or a comma-separated string.
fn normalize_pattern_list(source: Option<&Value>, fallback: &[String]) -> Vec<String> {
    match source {
        Some(Value::Array(items)) => {
            let values: Vec<String> = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect();
            if values.is_empty() {
                fallback.to_vec()
            } else {
                values
            }
        }
        Some(Value::String(s)) => parse_pattern_list(Some(s), fallback),
        _ => fallback.to_vec(),
    }
}

/// Split a comma-separated pattern list, dropping blanks.
///
/// Returns `fallback` when the input is absent or holds no patterns.
pub fn parse_pattern_list(value: Option<&str>, fallback: &[String]) -> Vec<String> {
    let segments: Vec<String> = value
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if segments.is_empty() {
        fallback.to_vec()
    } else {
        segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn settings(pairs: &[(&str, &str)]) -> ReviewerSettings {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ReviewerSettings::from_lookup(|key| map.get(key).cloned())
    }

    mod defaults {
        use super::*;

        #[test]
        fn empty_environment_yields_default_profile() {
            let profile = settings(&[]).resolve();
            assert_eq!(profile, ReviewerProfile::default());
            assert_eq!(profile.id, "local-reviewer");
            assert_eq!(profile.name, "Local Reviewer");
            assert_eq!(profile.allow, vec!["**"]);
            assert!(profile.deny.is_empty());
            assert_eq!(profile.log_path, PathBuf::from(".agent-approvals.jsonl"));
        }

        #[test]
        fn blank_values_are_ignored() {
            let s = settings(&[(ENV_APPROVER_ID, "   "), (ENV_APPROVAL_ALLOW, " , ,")]);
            assert!(s.approver_id.is_none());
            let profile = s.resolve();
            assert_eq!(profile.id, DEFAULT_REVIEWER_ID);
            assert_eq!(profile.allow, vec!["**"]);
        }
    }

    mod environment {
        use super::*;

        #[test]
        fn identity_and_patterns_come_from_env() {
            let profile = settings(&[
                (ENV_APPROVER_ID, " alice "),
                (ENV_APPROVER_NAME, "Alice"),
                (ENV_APPROVAL_LOG, "logs/approvals.jsonl"),
                (ENV_APPROVAL_ALLOW, "notes/**, drafts/*"),
                (ENV_APPROVAL_DENY, "notes/secret.md"),
            ])
            .resolve();

            assert_eq!(profile.id, "alice");
            assert_eq!(profile.name, "Alice");
            assert_eq!(profile.log_path, PathBuf::from("logs/approvals.jsonl"));
            assert_eq!(profile.allow, vec!["notes/**", "drafts/*"]);
            assert_eq!(profile.deny, vec!["notes/secret.md"]);
        }
    }

    mod config_document {
        use super::*;

        #[test]
        fn config_file_overrides_environment() {
            let dir = tempdir().unwrap();
            let path = dir.path().join("reviewer.json");
            fs::write(
                &path,
                json!({
                    "id": "bob",
                    "allow": ["notes/**", "  "],
                    "deny": "notes/secret.md, notes/private/**",
                    "logPath": "audit.jsonl"
                })
                .to_string(),
            )
            .unwrap();

            let profile = settings(&[
                (ENV_APPROVER_NAME, "Env Name"),
                (ENV_APPROVAL_CONFIG, path.to_str().unwrap()),
                (ENV_APPROVAL_ALLOW, "ignored/**"),
            ])
            .resolve();

            assert_eq!(profile.id, "bob");
            assert_eq!(profile.name, "Env Name");
            assert_eq!(profile.allow, vec!["notes/**"]);
            assert_eq!(profile.deny, vec!["notes/secret.md", "notes/private/**"]);
            assert_eq!(profile.log_path, PathBuf::from("audit.jsonl"));
        }

        #[test]
        fn wrongly_typed_fields_fall_back() {
            let base = ReviewerProfile::default();
            let profile = profile_from_document(
                &json!({ "id": 42, "name": "", "allow": [], "deny": {"x": 1}, "logPath": null }),
                base.clone(),
            );
            assert_eq!(profile, base);
        }

        #[test]
        fn unreadable_config_falls_back_to_env_patterns() {
            let profile = settings(&[
                (ENV_APPROVAL_CONFIG, "/definitely/not/here.json"),
                (ENV_APPROVAL_DENY, "secret/**"),
            ])
            .resolve();
            assert_eq!(profile.deny, vec!["secret/**"]);
            assert_eq!(profile.allow, vec!["**"]);
        }

        #[test]
        fn malformed_config_falls_back_to_env_patterns() {
            let dir = tempdir().unwrap();
            let path = dir.path().join("reviewer.json");
            fs::write(&path, "{ not json").unwrap();

            let profile = settings(&[
                (ENV_APPROVER_ID, "carol"),
                (ENV_APPROVAL_CONFIG, path.to_str().unwrap()),
                (ENV_APPROVAL_ALLOW, "notes/**"),
            ])
            .resolve();
            assert_eq!(profile.id, "carol");
            assert_eq!(profile.allow, vec!["notes/**"]);
        }
    }

    #[test]
    fn parse_pattern_list_splits_and_trims() {
        let fallback = vec!["**".to_string()];
        assert_eq!(
            parse_pattern_list(Some(" a/** ,b ,, "), &fallback),
            vec!["a/**", "b"]
        );
        assert_eq!(parse_pattern_list(None, &fallback), fallback);
        assert_eq!(parse_pattern_list(Some(""), &fallback), fallback);
    }
}
