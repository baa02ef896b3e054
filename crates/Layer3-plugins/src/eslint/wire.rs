//! 서버 메시지 payload와 정규화
//!
//! 서버가 보낸 finding은 필드가 일부 빠져 있을 수 있습니다. 위치 키가 없으면
//! `filePath` + `line` + `column`으로 만들고, 줄 정보도 없으면 resource 단위
//! 이슈로 분류합니다.

use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;
use uilint_core::{Issue, LocationKey, RuleMeta, Severity};

// ============================================================================
// Message types
// ============================================================================

pub const MSG_LINT_RESULT: &str = "lint:result";
pub const MSG_LINT_PROGRESS: &str = "lint:progress";
pub const MSG_FILE_CHANGED: &str = "file:changed";
pub const MSG_RULES_METADATA: &str = "rules:metadata";
pub const MSG_RULE_CONFIG_CHANGED: &str = "rule:config:changed";
pub const MSG_WORKSPACE_INFO: &str = "workspace:info";

pub const REQ_LINT_FILE: &str = "lint:file";
pub const REQ_SUBSCRIBE_FILE: &str = "subscribe:file";
pub const REQ_RULE_CONFIG_SET: &str = "rule:config:set";

// ============================================================================
// Payloads
// ============================================================================

/// 숫자(ESLint 0/1/2) 또는 문자열 심각도
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawSeverity {
    Level(u64),
    Label(String),
}

impl RawSeverity {
    pub fn normalize(&self) -> Severity {
        match self {
            Self::Level(level) => Severity::from_eslint(*level),
            Self::Label(label) => Severity::from_label(label),
        }
    }
}

/// 서버가 보낸 finding 하나
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIssue {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub rule_id: Option<String>,
    #[serde(default)]
    pub severity: Option<RawSeverity>,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub column: Option<u32>,
    #[serde(default, alias = "dataLoc")]
    pub location_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LintResultPayload {
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default, alias = "messages")]
    pub issues: Vec<RawIssue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPayload {
    #[serde(default)]
    pub current: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChangedPayload {
    pub file_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RulesMetadataPayload {
    #[serde(default)]
    pub rules: Vec<RuleMeta>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleConfigChangedPayload {
    pub rule_id: String,
    pub severity: String,
    #[serde(default)]
    pub options: Option<Value>,
}

// ============================================================================
// Grouping
// ============================================================================

/// 한 메시지에서 나온 이슈 묶음
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedIssues {
    /// 위치 키 → 이슈
    pub by_location: BTreeMap<String, Vec<Issue>>,

    /// resource → 위치 없는 이슈
    pub unlocated: BTreeMap<String, Vec<Issue>>,

    /// 이 메시지가 결과를 보고한 resource (이슈가 없어도 포함)
    ///
    /// `filePath`가 있으면 그 하나뿐이고, 없을 때만 위치 키에서 모읍니다.
    pub resources: BTreeSet<String>,
}

/// finding을 정규화해 위치 키별로 묶음
pub fn group_issues(plugin_id: &str, file_path: Option<&str>, raw: Vec<RawIssue>) -> GroupedIssues {
    let mut grouped = GroupedIssues::default();
    if let Some(path) = file_path {
        grouped.resources.insert(path.to_string());
    }

    for finding in raw {
        let severity = finding
            .severity
            .as_ref()
            .map(RawSeverity::normalize)
            .unwrap_or_default();

        let location = match (&finding.location_key, file_path, finding.line) {
            (Some(key), _, _) => match LocationKey::parse(key) {
                Ok(loc) => Some(loc),
                Err(e) => {
                    warn!(error = %e, "Ignoring unparsable location key on finding");
                    file_path.zip(finding.line).map(|(path, line)| {
                        LocationKey::new(path, line, finding.column.unwrap_or(0))
                    })
                }
            },
            (None, Some(path), Some(line)) => {
                Some(LocationKey::new(path, line, finding.column.unwrap_or(0)))
            }
            _ => None,
        };

        match location {
            Some(loc) => {
                let key = loc.to_key();
                let issue = build(plugin_id, severity, finding.message, &key, finding.rule_id);
                if file_path.is_none() {
                    grouped.resources.insert(loc.resource);
                }
                grouped.by_location.entry(key).or_default().push(issue);
            }
            None => match file_path {
                Some(path) => {
                    let issue = build(plugin_id, severity, finding.message, path, finding.rule_id);
                    grouped.unlocated.entry(path.to_string()).or_default().push(issue);
                }
                None => warn!(message = %finding.message, "Dropping finding without resource"),
            },
        }
    }

    grouped
}

fn build(
    plugin_id: &str,
    severity: Severity,
    message: String,
    key: &str,
    rule_id: Option<String>,
) -> Issue {
    let issue = Issue::new(plugin_id, severity, message, key);
    match rule_id {
        Some(rule) => issue.with_rule(rule),
        None => issue,
    }
}
