//! Plugin Contributions - 호스트가 집계하는 기여 항목
//!
//! 종류별로 명시적인 레코드 타입을 둡니다. 레지스트리는 등록 시점에
//! `PluginContributions`를 한 번 스냅샷하고, 집계 쿼리는 이를 이어 붙이기만 합니다.

use super::services::Services;
use crate::issue::Issue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uilint_foundation::ElementDescriptor;

// ============================================================================
// Command
// ============================================================================

/// 커맨드 실행 함수
pub type CommandAction = Arc<dyn Fn(&Services) + Send + Sync>;

/// 커맨드 팔레트 항목
#[derive(Clone)]
pub struct Command {
    pub id: String,
    pub title: String,
    pub keywords: Vec<String>,
    pub category: Option<String>,
    pub shortcut: Option<String>,
    action: CommandAction,
}

impl Command {
    pub fn new<F>(id: impl Into<String>, title: impl Into<String>, action: F) -> Self
    where
        F: Fn(&Services) + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            title: title.into(),
            keywords: Vec::new(),
            category: None,
            shortcut: None,
            action: Arc::new(action),
        }
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_shortcut(mut self, shortcut: impl Into<String>) -> Self {
        self.shortcut = Some(shortcut.into());
        self
    }

    /// 커맨드 실행
    pub fn execute(&self, services: &Services) {
        (self.action)(services);
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("category", &self.category)
            .finish()
    }
}

// ============================================================================
// Analyzer
// ============================================================================

/// 요소 분석 함수
pub type AnalyzeFn = Arc<dyn Fn(&[ElementDescriptor]) -> Vec<Issue> + Send + Sync>;

/// 페이지 요소 분석기
#[derive(Clone)]
pub struct Analyzer {
    pub id: String,
    pub name: String,
    pub description: String,
    analyze: AnalyzeFn,
}

impl Analyzer {
    pub fn new<F>(id: impl Into<String>, name: impl Into<String>, analyze: F) -> Self
    where
        F: Fn(&[ElementDescriptor]) -> Vec<Issue> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            analyze: Arc::new(analyze),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn run(&self, elements: &[ElementDescriptor]) -> Vec<Issue> {
        (self.analyze)(elements)
    }
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

// ============================================================================
// Inspector Panel
// ============================================================================

/// 인스펙터 패널 (priority가 높을수록 먼저 표시)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectorPanel {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl InspectorPanel {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            priority: 0,
            icon: None,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

// ============================================================================
// Rule UI Contribution
// ============================================================================

/// 룰 ID → UI 매핑 (명시적 소유권)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleUiContribution {
    pub rule_id: String,

    /// 이 룰을 보여줄 인스펙터 패널
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panel_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heatmap_color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl RuleUiContribution {
    pub fn new(rule_id: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            panel_id: None,
            heatmap_color: None,
            icon: None,
        }
    }

    pub fn with_panel(mut self, panel_id: impl Into<String>) -> Self {
        self.panel_id = Some(panel_id.into());
        self
    }

    pub fn with_heatmap_color(mut self, color: impl Into<String>) -> Self {
        self.heatmap_color = Some(color.into());
        self
    }
}

// ============================================================================
// PluginContributions
// ============================================================================

/// 등록 시점에 고정되는 플러그인 기여 항목 묶음
#[derive(Debug, Clone, Default)]
pub struct PluginContributions {
    pub commands: Vec<Command>,
    pub analyzers: Vec<Analyzer>,
    pub inspector_panels: Vec<InspectorPanel>,
    pub rule_contributions: Vec<RuleUiContribution>,
    pub rule_categories: Vec<String>,
}

impl PluginContributions {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
            && self.analyzers.is_empty()
            && self.inspector_panels.is_empty()
            && self.rule_contributions.is_empty()
            && self.rule_categories.is_empty()
    }

    pub fn rule_contribution(&self, rule_id: &str) -> Option<&RuleUiContribution> {
        self.rule_contributions.iter().find(|c| c.rule_id == rule_id)
    }

    pub fn owns_category(&self, category: &str) -> bool {
        self.rule_categories.iter().any(|c| c == category)
    }
}
