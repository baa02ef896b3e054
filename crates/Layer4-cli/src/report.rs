//! 터미널 / JSON 출력

use serde::Serialize;
use std::fmt::Write as _;
use uilint_core::{Issue, LocationKey, PluginRegistry, Severity};
use uilint_plugins::{EslintSlice, IssueSummary};

// ============================================================================
// check
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckReport<'a> {
    status: String,
    summary: IssueSummary,
    disabled_rules: Vec<&'a str>,
    issues: Vec<Issue>,
}

fn sorted_issues(slice: &EslintSlice) -> Vec<(String, Issue)> {
    let mut issues: Vec<(String, Issue)> = slice
        .resources()
        .into_iter()
        .flat_map(|resource| {
            slice
                .issues_for_resource(&resource)
                .into_iter()
                .map(move |issue| (resource.clone(), issue))
        })
        .collect();

    issues.sort_by(|(ra, a), (rb, b)| {
        let pa = LocationKey::parse(&a.location_key).ok();
        let pb = LocationKey::parse(&b.location_key).ok();
        ra.cmp(rb)
            .then_with(|| pa.map(|p| (p.line, p.column)).cmp(&pb.map(|p| (p.line, p.column))))
    });
    issues
}

/// resource별로 묶은 사람용 출력
pub fn check_text(slice: &EslintSlice) -> String {
    let mut out = String::new();
    let mut current: Option<String> = None;

    for (resource, issue) in sorted_issues(slice) {
        if current.as_deref() != Some(resource.as_str()) {
            if current.is_some() {
                out.push('\n');
            }
            let _ = writeln!(out, "{resource}");
            current = Some(resource);
        }

        let position = LocationKey::parse(&issue.location_key)
            .map(|p| format!("{}:{}", p.line, p.column))
            .unwrap_or_else(|_| "-".to_string());
        let rule = issue
            .rule_id
            .as_deref()
            .map(|r| format!("  ({r})"))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "  {position:<8} {:<8} {}{rule}",
            issue.severity.to_string(),
            issue.message
        );
    }

    let summary = slice.summary();
    if current.is_some() {
        out.push('\n');
    }
    let mark = if summary.errors > 0 { "✗" } else { "✓" };
    let _ = writeln!(
        out,
        "{mark} {} errors, {} warnings, {} infos in {} files",
        summary.errors, summary.warnings, summary.infos, summary.resources
    );
    out
}

pub fn check_json(slice: &EslintSlice) -> serde_json::Result<String> {
    let report = CheckReport {
        status: slice.scan_status.to_string(),
        summary: slice.summary(),
        disabled_rules: slice.disabled_rules.iter().map(String::as_str).collect(),
        issues: sorted_issues(slice).into_iter().map(|(_, issue)| issue).collect(),
    };
    serde_json::to_string_pretty(&report)
}

/// 보이는 에러가 하나라도 있으면 실패
pub fn has_errors(slice: &EslintSlice) -> bool {
    slice.all_issues().iter().any(|i| i.severity == Severity::Error)
}

// ============================================================================
// rules
// ============================================================================

/// 룰 목록과 소유 플러그인
pub fn rules_text(slice: &EslintSlice, registry: &PluginRegistry) -> String {
    let mut out = String::new();

    if slice.available_rules.is_empty() {
        out.push_str("No rule metadata available\n");
        return out;
    }

    for rule in &slice.available_rules {
        let owner = registry.get_plugin_for_rule(&rule.id, Some(rule));
        let owner_id = owner.manifest().id;
        let state = if slice.disabled_rules.contains(&rule.id) {
            "off"
        } else {
            "on"
        };

        let _ = write!(out, "{:<40} {:<8} {state:<3}", rule.id, owner_id);
        if let Some(category) = &rule.category {
            let _ = write!(out, " [{category}]");
        }
        if let Some(contribution) = registry.get_rule_contribution(&rule.id) {
            if let Some(panel) = contribution.panel_id {
                let _ = write!(out, " panel={panel}");
            }
        }
        out.push('\n');
    }
    out
}

// ============================================================================
// plugins
// ============================================================================

/// 초기화 순서대로 플러그인과 기여 목록
pub fn plugins_text(registry: &PluginRegistry) -> String {
    let mut out = String::new();
    let commands = registry.get_all_commands();
    let panels = registry.get_all_inspector_panels();

    for (index, manifest) in registry.resolved_order().iter().enumerate() {
        let status = registry
            .status(&manifest.id)
            .map(|s| s.to_string())
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{}. {} {} ({status})",
            index + 1,
            manifest.id,
            manifest.version
        );
        if !manifest.dependencies.is_empty() {
            let _ = writeln!(out, "   depends on: {}", manifest.dependencies.join(", "));
        }
    }

    if !commands.is_empty() {
        out.push_str("\nCommands:\n");
        for command in &commands {
            let _ = writeln!(out, "  {:<28} {}", command.id, command.title);
        }
    }

    if !panels.is_empty() {
        out.push_str("\nInspector panels:\n");
        for panel in &panels {
            let _ = writeln!(out, "  {:<28} {} (priority {})", panel.id, panel.title, panel.priority);
        }
    }
    out
}
