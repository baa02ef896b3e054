//! ESLint slice - 이슈 캐시와 스캔 상태
//!
//! 캐시는 항상 원본 그대로 보관하고 `disabledRules` 필터는 읽을 때만 적용합니다.
//! 빈 배열은 키 부재와 같으므로 저장하지 않습니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use uilint_core::{Issue, LocationKey, RuleMeta, Severity};

/// 상태 slice 이름
pub const ESLINT_SLICE: &str = "eslint";

// ============================================================================
// ScanStatus
// ============================================================================

/// 스캔 세션 상태: idle → scanning → complete | error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    #[default]
    Idle,
    Scanning,
    Complete,
    Error,
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Scanning => write!(f, "scanning"),
            Self::Complete => write!(f, "complete"),
            Self::Error => write!(f, "error"),
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// 룰별 설정 ("error" / "warn" / "off" + 옵션)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleConfig {
    pub severity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
}

/// 서버가 알려준 워크스페이스 경로
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkspaceInfo {
    pub workspace_root: Option<String>,
    pub app_root: Option<String>,
    pub server_cwd: Option<String>,
}

/// 진행률
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanProgress {
    pub current: u32,
    pub total: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// 심각도별 개수
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSummary {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub resources: usize,
}

impl IssueSummary {
    pub fn total(&self) -> usize {
        self.errors + self.warnings + self.infos
    }
}

// ============================================================================
// EslintSlice
// ============================================================================

/// 공유 상태에 저장되는 ESLint slice 전체
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EslintSlice {
    pub scan_status: ScanStatus,
    pub scan_error: Option<String>,

    /// 위치 키 → 이슈
    pub issue_cache: BTreeMap<String, Vec<Issue>>,

    /// resource → 위치 없는 이슈
    pub file_issues: BTreeMap<String, Vec<Issue>>,

    /// 이번 세션에서 이미 요청한 resource
    pub requested_files: BTreeSet<String>,

    pub disabled_rules: BTreeSet<String>,
    pub available_rules: Vec<RuleMeta>,
    pub rule_configs: BTreeMap<String, RuleConfig>,
    pub workspace: Option<WorkspaceInfo>,
    pub progress: Option<ScanProgress>,
    pub connected: bool,
}

impl EslintSlice {
    fn is_visible(&self, issue: &Issue) -> bool {
        issue
            .rule_id
            .as_ref()
            .map_or(true, |rule| !self.disabled_rules.contains(rule))
    }

    fn visible<'a>(&'a self, issues: &'a [Issue]) -> impl Iterator<Item = &'a Issue> + 'a {
        issues.iter().filter(move |issue| self.is_visible(issue))
    }

    /// 한 위치의 보이는 이슈
    pub fn issues_for_location(&self, location_key: &str) -> Vec<Issue> {
        self.issue_cache
            .get(location_key)
            .map(|issues| self.visible(issues).cloned().collect())
            .unwrap_or_default()
    }

    /// resource 단위(위치 없는) 보이는 이슈
    pub fn file_level_issues(&self, resource: &str) -> Vec<Issue> {
        self.file_issues
            .get(resource)
            .map(|issues| self.visible(issues).cloned().collect())
            .unwrap_or_default()
    }

    /// 한 resource의 보이는 이슈 (위치 없는 이슈 먼저)
    pub fn issues_for_resource(&self, resource: &str) -> Vec<Issue> {
        let mut result = self.file_level_issues(resource);

        for (key, issues) in &self.issue_cache {
            if LocationKey::resource_of(key).as_deref() == Some(resource) {
                result.extend(self.visible(issues).cloned());
            }
        }
        result
    }

    /// 모든 보이는 이슈
    pub fn all_issues(&self) -> Vec<Issue> {
        self.file_issues
            .values()
            .chain(self.issue_cache.values())
            .flat_map(|issues| self.visible(issues).cloned())
            .collect()
    }

    /// 이슈가 있는 resource 목록
    pub fn resources(&self) -> BTreeSet<String> {
        let mut resources: BTreeSet<String> = self.file_issues.keys().cloned().collect();
        resources.extend(self.issue_cache.keys().filter_map(|k| LocationKey::resource_of(k)));
        resources
    }

    pub fn summary(&self) -> IssueSummary {
        let mut summary = IssueSummary::default();
        let mut resources = BTreeSet::new();

        let located = self.issue_cache.iter().map(|(k, v)| (LocationKey::resource_of(k), v));
        let unlocated = self.file_issues.iter().map(|(r, v)| (Some(r.clone()), v));

        for (resource, issues) in located.chain(unlocated) {
            let mut any = false;
            for issue in self.visible(issues) {
                any = true;
                match issue.severity {
                    Severity::Error => summary.errors += 1,
                    Severity::Warning => summary.warnings += 1,
                    Severity::Info => summary.infos += 1,
                }
            }
            if let (true, Some(resource)) = (any, resource) {
                resources.insert(resource);
            }
        }

        summary.resources = resources.len();
        summary
    }

    pub fn rule(&self, rule_id: &str) -> Option<&RuleMeta> {
        self.available_rules.iter().find(|r| r.id == rule_id)
    }
}

// ============================================================================
// EslintPatch - 한 번의 set_state로 쓰는 부분 갱신
// ============================================================================

/// slice 부분 갱신 (None 필드는 건드리지 않음)
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EslintPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_status: Option<ScanStatus>,

    /// Some(None)은 에러 해제
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_error: Option<Option<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_cache: Option<BTreeMap<String, Vec<Issue>>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_issues: Option<BTreeMap<String, Vec<Issue>>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_files: Option<BTreeSet<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_rules: Option<BTreeSet<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_rules: Option<Vec<RuleMeta>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_configs: Option<BTreeMap<String, RuleConfig>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<WorkspaceInfo>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Option<ScanProgress>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected: Option<bool>,
}

impl EslintPatch {
    /// 캐시와 요청 기록을 비우고 idle로
    pub fn reset() -> Self {
        Self {
            scan_status: Some(ScanStatus::Idle),
            scan_error: Some(None),
            issue_cache: Some(BTreeMap::new()),
            file_issues: Some(BTreeMap::new()),
            requested_files: Some(BTreeSet::new()),
            progress: Some(None),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(key: &str, rule: &str, severity: Severity) -> Issue {
        Issue::new("eslint", severity, format!("{rule} at {key}"), key).with_rule(rule)
    }

    fn sample() -> EslintSlice {
        let mut slice = EslintSlice::default();
        slice.issue_cache.insert(
            "src/App.tsx:3:1".into(),
            vec![
                issue("src/App.tsx:3:1", "no-unused-vars", Severity::Warning),
                issue("src/App.tsx:3:1", "eqeqeq", Severity::Error),
            ],
        );
        slice.issue_cache.insert(
            "src/Card.tsx:1:1".into(),
            vec![issue("src/Card.tsx:1:1", "eqeqeq", Severity::Error)],
        );
        slice.file_issues.insert(
            "src/App.tsx".into(),
            vec![Issue::new("eslint", Severity::Info, "parse warning", "src/App.tsx")],
        );
        slice
    }

    #[test]
    fn test_disabled_rules_filter_on_read() {
        let mut slice = sample();
        assert_eq!(slice.issues_for_location("src/App.tsx:3:1").len(), 2);

        slice.disabled_rules.insert("eqeqeq".into());
        assert_eq!(slice.issues_for_location("src/App.tsx:3:1").len(), 1);
        assert!(slice.issues_for_location("src/Card.tsx:1:1").is_empty());
        // 캐시는 그대로
        assert_eq!(slice.issue_cache["src/App.tsx:3:1"].len(), 2);
    }

    #[test]
    fn test_issues_for_resource_includes_file_issues() {
        let slice = sample();
        let issues = slice.issues_for_resource("src/App.tsx");

        assert_eq!(issues.len(), 3);
        assert_eq!(issues[0].message, "parse warning");
    }

    #[test]
    fn test_summary_counts_visible_issues() {
        let mut slice = sample();
        let summary = slice.summary();
        assert_eq!(summary.errors, 2);
        assert_eq!(summary.warnings, 1);
        assert_eq!(summary.infos, 1);
        assert_eq!(summary.resources, 2);

        slice.disabled_rules.insert("eqeqeq".into());
        let summary = slice.summary();
        assert_eq!(summary.errors, 0);
        assert_eq!(summary.resources, 1);
    }

    #[test]
    fn test_patch_skips_unset_fields() {
        let patch = EslintPatch {
            scan_status: Some(ScanStatus::Scanning),
            scan_error: Some(None),
            ..Default::default()
        };
        let value = serde_json::to_value(&patch).unwrap();

        assert_eq!(value["scanStatus"], "scanning");
        assert_eq!(value.get("scanError"), Some(&Value::Null));
        assert!(value.get("issueCache").is_none());
    }

    #[test]
    fn test_slice_roundtrips_through_state() {
        let slice = sample();
        let value = serde_json::to_value(&slice).unwrap();
        let back: EslintSlice = serde_json::from_value(value).unwrap();
        assert_eq!(back, slice);
    }
}
