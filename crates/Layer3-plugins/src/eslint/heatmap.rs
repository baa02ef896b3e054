//! Heatmap - 요소별 이슈 마커 집계
//!
//! resource마다 처음 본 요소 하나를 대표로 정하고, 대표에게만 resource 단위
//! 이슈 수를 더합니다. 다른 요소는 자기 위치의 이슈만 가집니다.
//! 같은 위치 키를 가진 요소가 여럿이면 처음 본 요소만 그 위치를 셉니다.
//! 그래서 모든 항목의 합은 보이는 이슈 수와 같습니다.

use super::state::EslintSlice;
use serde::Serialize;
use std::collections::HashSet;
use uilint_core::{ElementDescriptor, LocationKey, Severity};

/// 요소 하나의 히트맵 값
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapEntry {
    pub element_id: String,
    pub resource: String,
    pub location_key: String,

    /// 요소 위치의 보이는 이슈 수
    pub issue_count: usize,

    /// resource 단위 이슈 수 (대표 요소만 0이 아님)
    pub file_issue_count: usize,

    pub max_severity: Option<Severity>,
}

impl HeatmapEntry {
    pub fn total(&self) -> usize {
        self.issue_count + self.file_issue_count
    }
}

/// 이슈가 있는 요소의 히트맵 값
///
/// 위치 키를 해석할 수 없는 요소는 건너뜁니다.
pub fn compute_heatmap_data(elements: &[ElementDescriptor], slice: &EslintSlice) -> Vec<HeatmapEntry> {
    let mut representatives: HashSet<String> = HashSet::new();
    let mut counted_locations: HashSet<&str> = HashSet::new();
    let mut entries = Vec::new();

    for element in elements {
        let Ok(location) = LocationKey::parse(&element.location_key) else {
            continue;
        };

        let own = if counted_locations.insert(element.location_key.as_str()) {
            slice.issues_for_location(&element.location_key)
        } else {
            Vec::new()
        };
        let file_level = if representatives.insert(location.resource.clone()) {
            slice.file_level_issues(&location.resource)
        } else {
            Vec::new()
        };

        let max_severity = own.iter().chain(file_level.iter()).map(|i| i.severity).max();
        let entry = HeatmapEntry {
            element_id: element.id.clone(),
            resource: location.resource,
            location_key: element.location_key.clone(),
            issue_count: own.len(),
            file_issue_count: file_level.len(),
            max_severity,
        };

        if entry.total() > 0 {
            entries.push(entry);
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use uilint_core::Issue;

    fn slice() -> EslintSlice {
        let mut slice = EslintSlice::default();
        slice.issue_cache.insert(
            "src/App.tsx:3:1".into(),
            vec![Issue::new("eslint", Severity::Warning, "w", "src/App.tsx:3:1").with_rule("a")],
        );
        slice.file_issues.insert(
            "src/App.tsx".into(),
            vec![
                Issue::new("eslint", Severity::Error, "e1", "src/App.tsx").with_rule("b"),
                Issue::new("eslint", Severity::Error, "e2", "src/App.tsx").with_rule("b"),
            ],
        );
        slice
    }

    #[test]
    fn test_file_issues_only_on_representative() {
        let elements = vec![
            ElementDescriptor::new("el-1", "src/App.tsx:10:1"),
            ElementDescriptor::new("el-2", "src/App.tsx:3:1"),
            ElementDescriptor::new("el-3", "src/App.tsx:3:1"),
        ];
        let data = compute_heatmap_data(&elements, &slice());

        // el-3은 el-2와 같은 위치라 항목이 없음
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].element_id, "el-1");
        assert_eq!((data[0].issue_count, data[0].file_issue_count), (0, 2));
        assert_eq!((data[1].issue_count, data[1].file_issue_count), (1, 0));
        assert_eq!(data[0].max_severity, Some(Severity::Error));

        let file_total: usize = data.iter().map(|e| e.file_issue_count).sum();
        assert_eq!(file_total, 2);
    }

    #[test]
    fn test_totals_match_visible_issues() {
        let elements = vec![
            ElementDescriptor::new("el-1", "src/App.tsx:3:1"),
            ElementDescriptor::new("el-2", "src/App.tsx:3:1"),
            ElementDescriptor::new("el-3", "src/App.tsx:3:1"),
        ];
        let slice = slice();
        let data = compute_heatmap_data(&elements, &slice);

        let total: usize = data.iter().map(HeatmapEntry::total).sum();
        assert_eq!(total, slice.all_issues().len());
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn test_disabled_rules_respected() {
        let mut slice = slice();
        slice.disabled_rules.insert("b".into());
        let elements = vec![ElementDescriptor::new("el-1", "src/App.tsx:10:1")];

        assert!(compute_heatmap_data(&elements, &slice).is_empty());
    }

    #[test]
    fn test_unlocated_elements_skipped() {
        let elements = vec![ElementDescriptor::new("el-1", "no-location")];
        assert!(compute_heatmap_data(&elements, &slice()).is_empty());
    }
}
