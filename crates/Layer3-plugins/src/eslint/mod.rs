//! # ESLint Plugin
//!
//! 개발 서버가 보내는 ESLint 결과를 페이지 요소 단위로 캐시합니다.
//!
//! ```text
//! elements added ──▶ resource 추출 ──▶ lint:file / subscribe:file (resource당 1회)
//! lint:result    ──▶ 위치 키별 그룹 ──▶ update_state 1회 (filePath 항목만 교체)
//! file:changed   ──▶ resource 항목 삭제 + requestedFiles에서 제거
//! manifest       ──▶ 한 번 읽기 ──▶ set_state 1회 ──▶ complete
//! ```

mod engine;
mod heatmap;
mod manifest;
mod state;
pub mod wire;

pub use engine::{EslintEngine, ESLINT_CATEGORY};
pub use heatmap::{compute_heatmap_data, HeatmapEntry};
pub use manifest::{LintManifest, ManifestFile, ManifestSource, ManifestSummary};
pub use state::{
    EslintPatch, EslintSlice, IssueSummary, RuleConfig, ScanProgress, ScanStatus, WorkspaceInfo,
    ESLINT_SLICE,
};

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;
use uilint_core::{
    Cleanup, Command, InspectorPanel, Issue, Plugin, PluginManifest, RuleMeta, Services,
    Subscription,
};
use uilint_foundation::Result;
use wire::{
    MSG_FILE_CHANGED, MSG_LINT_PROGRESS, MSG_LINT_RESULT, MSG_RULES_METADATA,
    MSG_RULE_CONFIG_CHANGED, MSG_WORKSPACE_INFO,
};

/// 플러그인 ID
pub const ESLINT_PLUGIN_ID: &str = "eslint";

/// 플러그인 옵션
#[derive(Debug, Clone, Default)]
pub struct EslintOptions {
    /// 초기화 직후 스캔 시작
    pub live_scan: bool,

    /// 처음부터 숨길 룰
    pub disabled_rules: BTreeSet<String>,
}

/// ESLint 플러그인
pub struct EslintPlugin {
    engine: Arc<EslintEngine>,
    options: EslintOptions,
}

impl EslintPlugin {
    pub fn new(options: EslintOptions) -> Self {
        Self {
            engine: Arc::new(EslintEngine::new(ESLINT_PLUGIN_ID)),
            options,
        }
    }

    pub fn engine(&self) -> &Arc<EslintEngine> {
        &self.engine
    }

    pub fn state(&self, services: &Services) -> EslintSlice {
        self.engine.state(services)
    }

    pub fn start_scan(&self, services: &Services) -> bool {
        self.engine.start_scan(services)
    }

    pub fn stop_scan(&self, services: &Services) {
        self.engine.stop_scan(services)
    }

    pub fn toggle_rule(&self, services: &Services, rule_id: &str) -> bool {
        self.engine.toggle_rule(services, rule_id)
    }

    pub fn issues_for_location(&self, services: &Services, location_key: &str) -> Vec<Issue> {
        self.state(services).issues_for_location(location_key)
    }

    pub fn issues_for_resource(&self, services: &Services, resource: &str) -> Vec<Issue> {
        self.state(services).issues_for_resource(resource)
    }

    pub fn all_issues(&self, services: &Services) -> Vec<Issue> {
        self.state(services).all_issues()
    }

    pub fn summary(&self, services: &Services) -> IssueSummary {
        self.state(services).summary()
    }

    pub async fn load_manifest(
        &self,
        services: &Services,
        source: &ManifestSource,
    ) -> Result<ManifestSummary> {
        self.engine.load_manifest(services, source).await
    }

    pub fn heatmap(&self, services: &Services) -> Vec<HeatmapEntry> {
        self.engine.heatmap(services)
    }

    fn subscribe(&self, services: &Services) -> Vec<Subscription> {
        type Handler = fn(&EslintEngine, &Services, &uilint_core::RemoteMessage);
        let routes: [(&str, Handler); 6] = [
            (MSG_LINT_RESULT, EslintEngine::handle_lint_result),
            (MSG_LINT_PROGRESS, EslintEngine::handle_progress),
            (MSG_FILE_CHANGED, EslintEngine::handle_file_changed),
            (MSG_RULES_METADATA, EslintEngine::handle_rules_metadata),
            (MSG_RULE_CONFIG_CHANGED, EslintEngine::handle_rule_config_changed),
            (MSG_WORKSPACE_INFO, EslintEngine::handle_workspace_info),
        ];

        let mut subs: Vec<Subscription> = routes
            .into_iter()
            .map(|(message_type, handler)| {
                let engine = Arc::clone(&self.engine);
                let svc = services.clone();
                services.on_message(message_type, move |msg| handler(engine.as_ref(), &svc, msg))
            })
            .collect();

        let engine = Arc::clone(&self.engine);
        let svc = services.clone();
        subs.push(services.on_elements_added(move |batch| engine.on_elements_added(&svc, batch)));

        let engine = Arc::clone(&self.engine);
        subs.push(services.on_elements_removed(move |batch| engine.on_elements_removed(batch)));

        let engine = Arc::clone(&self.engine);
        let svc = services.clone();
        subs.push(
            services.on_connection_change(move |connected| {
                engine.on_connection_change(&svc, connected)
            }),
        );

        subs
    }
}

impl Default for EslintPlugin {
    fn default() -> Self {
        Self::new(EslintOptions::default())
    }
}

#[async_trait]
impl Plugin for EslintPlugin {
    fn manifest(&self) -> PluginManifest {
        PluginManifest::new(ESLINT_PLUGIN_ID, "ESLint")
            .with_description("ESLint issues from the dev server, mapped to page elements")
            .with_dependency("core")
    }

    fn commands(&self) -> Vec<Command> {
        let start = Arc::clone(&self.engine);
        let stop = Arc::clone(&self.engine);
        let clear = Arc::clone(&self.engine);

        vec![
            Command::new("eslint.start-scan", "ESLint: Start scanning", move |svc| {
                start.start_scan(svc);
            })
            .with_keywords(["lint", "scan", "start"])
            .with_category("ESLint"),
            Command::new("eslint.stop-scan", "ESLint: Stop scanning", move |svc| {
                stop.stop_scan(svc);
            })
            .with_keywords(["lint", "scan", "stop"])
            .with_category("ESLint"),
            Command::new("eslint.clear-cache", "ESLint: Clear cached results", move |svc| {
                clear.clear_cache(svc);
            })
            .with_keywords(["lint", "cache", "clear"])
            .with_category("ESLint"),
        ]
    }

    fn inspector_panels(&self) -> Vec<InspectorPanel> {
        vec![
            InspectorPanel::new("eslint-rule", "Rule").with_priority(10),
            InspectorPanel::new("eslint-issues", "ESLint Issues").with_priority(5),
        ]
    }

    fn rule_categories(&self) -> Vec<String> {
        vec![ESLINT_CATEGORY.to_string()]
    }

    fn handles_rule(&self, rule_id: &str, _meta: Option<&RuleMeta>) -> bool {
        self.engine.knows_rule(rule_id)
    }

    async fn initialize(&self, services: &Services) -> Result<Option<Cleanup>> {
        self.engine.reset_slice(services, self.options.disabled_rules.clone());
        let subs = self.subscribe(services);
        debug!(subscriptions = subs.len(), "ESLint plugin subscribed");

        if self.options.live_scan {
            self.engine.start_scan(services);
        }

        Ok(Some(Cleanup::new(move || {
            for sub in subs {
                sub.unsubscribe();
            }
        })))
    }

    async fn dispose(&self, services: &Services) -> Result<()> {
        self.engine.stop_scan(services);
        self.engine.forget_elements();
        Ok(())
    }
}
