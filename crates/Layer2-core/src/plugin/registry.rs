//! Plugin Registry - 플러그인 저장소와 수명주기
//!
//! - 등록 순서를 유지합니다 (집계 쿼리는 등록 순서로 이어 붙임).
//! - 초기화는 의존성 순서로 하나씩 순차 실행하며, 한 플러그인의 실패가
//!   나머지를 막지 않습니다. 실패한 플러그인은 다음 호출에서 재시도됩니다.
//! - 해제는 초기화가 실제로 성공한 순서의 역순입니다 (의존하는 쪽이 먼저).
//! - 락은 `await` 중이나 플러그인 코드를 호출하는 동안 잡지 않습니다.

use super::contribution::{Analyzer, Command, InspectorPanel, PluginContributions, RuleUiContribution};
use super::manifest::PluginManifest;
use super::resolver;
use super::services::Services;
use super::traits::{Cleanup, Plugin, PluginStatus};
use crate::issue::RuleMeta;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 전역 폴백 플러그인 ID
pub const CORE_PLUGIN_ID: &str = "core";

/// 레지스트리가 비어 있을 때 반환하는 자리표시 플러그인 ID
pub const DEFAULT_PLUGIN_ID: &str = "default";

// ============================================================================
// Entry / Lifecycle state
// ============================================================================

#[derive(Clone)]
struct PluginEntry {
    plugin: Arc<dyn Plugin>,
    manifest: PluginManifest,
    contributions: Arc<PluginContributions>,
}

#[derive(Default)]
struct Lifecycle {
    initialized: HashSet<String>,
    /// 초기화가 성공한 순서
    init_order: Vec<String>,
    in_flight: HashSet<String>,
    failed: HashSet<String>,
    cleanups: HashMap<String, Cleanup>,
}

// ============================================================================
// LifecycleReport
// ============================================================================

/// 플러그인 하나의 실패 기록
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginFailure {
    pub plugin_id: String,
    pub message: String,
}

/// `initialize_all` / `dispose_all` 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleReport {
    /// 이번 호출에서 성공한 플러그인 (실행 순서)
    pub succeeded: Vec<String>,

    /// 이미 처리되어 건너뛴 플러그인
    pub skipped: Vec<String>,

    pub failed: Vec<PluginFailure>,
}

impl LifecycleReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_ids(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.plugin_id.as_str()).collect()
    }
}

// ============================================================================
// PluginRegistry
// ============================================================================

/// 플러그인 레지스트리
///
/// 전역 싱글톤이 아니라 생성 가능한 객체입니다. 프로세스 기본 인스턴스는
/// 조립 지점(CLI)에서 하나만 만듭니다.
pub struct PluginRegistry {
    /// 등록 순서 유지
    plugins: RwLock<Vec<PluginEntry>>,

    lifecycle: Mutex<Lifecycle>,

    /// 첫 `initialize_all`에서 캡처, 해제 후 None
    services: RwLock<Option<Services>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            plugins: RwLock::new(Vec::new()),
            lifecycle: Mutex::new(Lifecycle::default()),
            services: RwLock::new(None),
        }
    }

    // === Registration ===

    /// 플러그인 등록 (같은 ID가 이미 있으면 경고 후 false)
    pub fn register(&self, plugin: Arc<dyn Plugin>) -> bool {
        let manifest = plugin.manifest();
        let id = manifest.id.clone();
        // 플러그인 코드는 락 밖에서 호출
        let contributions = Arc::new(plugin.contributions());

        let mut plugins = self.plugins.write();
        if plugins.iter().any(|entry| entry.manifest.id == id) {
            warn!(plugin_id = %id, "Plugin is already registered, ignoring");
            return false;
        }

        for dep in &manifest.dependencies {
            if !plugins.iter().any(|entry| &entry.manifest.id == dep) {
                warn!(
                    plugin_id = %id,
                    dependency = %dep,
                    "Dependency is not registered yet"
                );
            }
        }

        info!(plugin_id = %id, version = %manifest.version, "Registered plugin");
        plugins.push(PluginEntry {
            plugin,
            manifest,
            contributions,
        });
        true
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins
            .read()
            .iter()
            .find(|entry| entry.manifest.id == id)
            .map(|entry| Arc::clone(&entry.plugin))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.plugins.read().iter().any(|entry| entry.manifest.id == id)
    }

    pub fn len(&self) -> usize {
        self.plugins.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.read().is_empty()
    }

    /// 등록 순서의 플러그인 ID
    pub fn plugin_ids(&self) -> Vec<String> {
        self.plugins
            .read()
            .iter()
            .map(|entry| entry.manifest.id.clone())
            .collect()
    }

    /// 의존성 해석 순서의 매니페스트
    pub fn resolved_order(&self) -> Vec<PluginManifest> {
        resolver::resolve(&self.manifests())
    }

    pub fn manifests(&self) -> Vec<PluginManifest> {
        self.plugins
            .read()
            .iter()
            .map(|entry| entry.manifest.clone())
            .collect()
    }

    pub fn is_initialized(&self, id: &str) -> bool {
        self.lifecycle.lock().initialized.contains(id)
    }

    pub fn status(&self, id: &str) -> Option<PluginStatus> {
        if !self.contains(id) {
            return None;
        }
        let lifecycle = self.lifecycle.lock();
        Some(if lifecycle.initialized.contains(id) {
            PluginStatus::Initialized
        } else if lifecycle.failed.contains(id) {
            PluginStatus::Failed
        } else {
            PluginStatus::Registered
        })
    }

    /// 캡처된 Services (초기화 전/해제 후 None)
    pub fn services(&self) -> Option<Services> {
        self.services.read().clone()
    }

    // === Lifecycle ===

    /// 등록된 플러그인을 의존성 순서로 초기화
    ///
    /// 이미 초기화된 플러그인은 건너뜁니다. 실패는 로그와 리포트로만 남습니다.
    pub async fn initialize_all(&self, services: &Services) -> LifecycleReport {
        let services = {
            let mut slot = self.services.write();
            slot.get_or_insert_with(|| services.clone()).clone()
        };

        let order = self.ordered_entries();
        let mut report = LifecycleReport::default();
        debug!(count = order.len(), "Initializing plugins");

        for entry in order {
            let id = entry.manifest.id.clone();

            {
                let mut lifecycle = self.lifecycle.lock();
                if lifecycle.initialized.contains(&id) || lifecycle.in_flight.contains(&id) {
                    report.skipped.push(id);
                    continue;
                }
                lifecycle.in_flight.insert(id.clone());
            }

            let result = entry.plugin.initialize(&services).await;

            let mut lifecycle = self.lifecycle.lock();
            lifecycle.in_flight.remove(&id);
            match result {
                Ok(cleanup) => {
                    lifecycle.initialized.insert(id.clone());
                    lifecycle.init_order.push(id.clone());
                    lifecycle.failed.remove(&id);
                    if let Some(cleanup) = cleanup {
                        lifecycle.cleanups.insert(id.clone(), cleanup);
                    }
                    info!(plugin_id = %id, "Plugin initialized");
                    report.succeeded.push(id);
                }
                Err(e) => {
                    lifecycle.failed.insert(id.clone());
                    error!(plugin_id = %id, error = %e, "Plugin failed to initialize");
                    report.failed.push(PluginFailure {
                        plugin_id: id,
                        message: e.to_string(),
                    });
                }
            }
        }

        report
    }

    /// 초기화된 플러그인을 초기화의 역순으로 해제
    ///
    /// 재시도 없이 한 번에 초기화됐다면 의존성 역순과 같습니다.
    /// 플러그인별 cleanup을 먼저 실행한 뒤 `dispose`를 호출합니다.
    /// 끝나면 초기화 집합과 Services를 비웁니다.
    pub async fn dispose_all(&self) -> LifecycleReport {
        let mut report = LifecycleReport::default();
        let Some(services) = self.services.read().clone() else {
            debug!("dispose_all called before initialize_all");
            return report;
        };

        let order: Vec<String> = self.lifecycle.lock().init_order.iter().rev().cloned().collect();
        let entries = self.plugins.read().clone();

        for id in order {
            let Some(entry) = entries.iter().find(|e| e.manifest.id == id) else {
                continue;
            };
            let cleanup = self.lifecycle.lock().cleanups.remove(&id);

            if let Some(cleanup) = cleanup {
                cleanup.run();
            }

            match entry.plugin.dispose(&services).await {
                Ok(()) => {
                    debug!(plugin_id = %id, "Plugin disposed");
                    report.succeeded.push(id);
                }
                Err(e) => {
                    error!(plugin_id = %id, error = %e, "Plugin failed to dispose");
                    report.failed.push(PluginFailure {
                        plugin_id: id,
                        message: e.to_string(),
                    });
                }
            }
        }

        {
            let mut lifecycle = self.lifecycle.lock();
            lifecycle.initialized.clear();
            lifecycle.init_order.clear();
            lifecycle.failed.clear();
            lifecycle.cleanups.clear();
        }
        *self.services.write() = None;

        info!(count = report.succeeded.len(), "Plugins disposed");
        report
    }

    /// 전부 해제 후 등록 해제
    pub async fn clear(&self) -> LifecycleReport {
        let report = self.dispose_all().await;
        self.plugins.write().clear();
        report
    }

    fn ordered_entries(&self) -> Vec<PluginEntry> {
        let entries = self.plugins.read().clone();
        let order = resolver::resolve(&self.manifests());

        let mut by_id: HashMap<String, PluginEntry> = entries
            .into_iter()
            .map(|entry| (entry.manifest.id.clone(), entry))
            .collect();
        order
            .into_iter()
            .filter_map(|manifest| by_id.remove(&manifest.id))
            .collect()
    }

    fn contributions(&self) -> Vec<(String, Arc<PluginContributions>)> {
        self.plugins
            .read()
            .iter()
            .map(|entry| (entry.manifest.id.clone(), Arc::clone(&entry.contributions)))
            .collect()
    }

    // === Aggregation ===

    /// 모든 커맨드 (등록 순서)
    pub fn get_all_commands(&self) -> Vec<Command> {
        self.contributions()
            .iter()
            .flat_map(|(_, c)| c.commands.iter().cloned())
            .collect()
    }

    /// 모든 분석기 (등록 순서)
    pub fn get_all_analyzers(&self) -> Vec<Analyzer> {
        self.contributions()
            .iter()
            .flat_map(|(_, c)| c.analyzers.iter().cloned())
            .collect()
    }

    /// 모든 인스펙터 패널 (priority 내림차순, 같으면 등록 순서)
    pub fn get_all_inspector_panels(&self) -> Vec<InspectorPanel> {
        let mut panels: Vec<InspectorPanel> = self
            .contributions()
            .iter()
            .flat_map(|(_, c)| c.inspector_panels.iter().cloned())
            .collect();
        panels.sort_by(|a, b| b.priority.cmp(&a.priority));
        panels
    }

    /// 룰 ID에 대한 첫 번째 명시적 UI 매핑
    pub fn get_rule_contribution(&self, rule_id: &str) -> Option<RuleUiContribution> {
        self.contributions()
            .iter()
            .find_map(|(_, c)| c.rule_contribution(rule_id).cloned())
    }

    /// 룰을 소유하는 플러그인 (항상 무언가를 반환)
    ///
    /// 1. 명시적 rule contribution
    /// 2. `"{plugin_id}/"` 접두사
    /// 3. 룰 카테고리
    /// 4. `handles_rule` 판정
    /// 5. `"core"` 플러그인
    /// 6. 첫 번째 등록 플러그인
    /// 7. 자리표시 `"default"` 플러그인
    pub fn get_plugin_for_rule(&self, rule_id: &str, meta: Option<&RuleMeta>) -> Arc<dyn Plugin> {
        let entries = self.plugins.read().clone();

        let owner = entries
            .iter()
            .find(|e| e.contributions.rule_contribution(rule_id).is_some())
            .or_else(|| {
                entries.iter().find(|e| {
                    rule_id
                        .strip_prefix(e.manifest.id.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
                })
            })
            .or_else(|| {
                let category = meta.and_then(|m| m.category.as_deref())?;
                entries
                    .iter()
                    .find(|e| e.contributions.owns_category(category))
            })
            .or_else(|| entries.iter().find(|e| e.plugin.handles_rule(rule_id, meta)))
            .or_else(|| entries.iter().find(|e| e.manifest.id == CORE_PLUGIN_ID))
            .or_else(|| entries.first());

        match owner {
            Some(entry) => Arc::clone(&entry.plugin),
            None => {
                debug!(rule_id, "No plugins registered, using default owner");
                Arc::new(DefaultPlugin)
            }
        }
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.plugin_ids())
            .finish()
    }
}

// ============================================================================
// DefaultPlugin
// ============================================================================

/// 빈 레지스트리용 자리표시 플러그인
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPlugin;

#[async_trait]
impl Plugin for DefaultPlugin {
    fn manifest(&self) -> PluginManifest {
        PluginManifest::new(DEFAULT_PLUGIN_ID, "Default")
    }

    async fn initialize(&self, _services: &Services) -> uilint_foundation::Result<Option<Cleanup>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::services::ServiceHub;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uilint_foundation::Error;

    struct TestPlugin {
        manifest: PluginManifest,
        panels: Vec<InspectorPanel>,
        categories: Vec<String>,
        rules: Vec<RuleUiContribution>,
        fail_init: bool,
        init_calls: AtomicUsize,
    }

    impl TestPlugin {
        fn new(id: &str) -> Self {
            Self {
                manifest: PluginManifest::new(id, id),
                panels: vec![],
                categories: vec![],
                rules: vec![],
                fail_init: false,
                init_calls: AtomicUsize::new(0),
            }
        }

        fn depends_on(mut self, id: &str) -> Self {
            self.manifest = self.manifest.with_dependency(id);
            self
        }

        fn panel(mut self, id: &str, priority: i32) -> Self {
            self.panels.push(InspectorPanel::new(id, id).with_priority(priority));
            self
        }

        fn category(mut self, category: &str) -> Self {
            self.categories.push(category.to_string());
            self
        }

        fn rule(mut self, rule_id: &str) -> Self {
            self.rules.push(RuleUiContribution::new(rule_id));
            self
        }

        fn failing(mut self) -> Self {
            self.fail_init = true;
            self
        }
    }

    #[async_trait]
    impl Plugin for TestPlugin {
        fn manifest(&self) -> PluginManifest {
            self.manifest.clone()
        }

        fn inspector_panels(&self) -> Vec<InspectorPanel> {
            self.panels.clone()
        }

        fn rule_categories(&self) -> Vec<String> {
            self.categories.clone()
        }

        fn rule_contributions(&self) -> Vec<RuleUiContribution> {
            self.rules.clone()
        }

        async fn initialize(&self, _services: &Services) -> uilint_foundation::Result<Option<Cleanup>> {
            self.init_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_init {
                return Err(Error::plugin_init(&self.manifest.id, "boom"));
            }
            Ok(None)
        }
    }

    #[test]
    fn test_duplicate_register_rejected() {
        let registry = PluginRegistry::new();
        assert!(registry.register(Arc::new(TestPlugin::new("eslint"))));
        assert!(!registry.register(Arc::new(TestPlugin::new("eslint").panel("x", 1))));

        assert_eq!(registry.len(), 1);
        // 첫 번째 등록이 유지됨
        assert!(registry.get_all_inspector_panels().is_empty());
    }

    #[test]
    fn test_missing_dependency_still_registered() {
        let registry = PluginRegistry::new();
        assert!(registry.register(Arc::new(TestPlugin::new("eslint").depends_on("core"))));
        assert!(registry.contains("eslint"));
    }

    #[test]
    fn test_panels_sorted_by_priority_stable() {
        let registry = PluginRegistry::new();
        registry.register(Arc::new(TestPlugin::new("a").panel("a-low", 0).panel("a-high", 10)));
        registry.register(Arc::new(TestPlugin::new("b").panel("b-low", 0).panel("b-mid", 5)));

        let ids: Vec<String> = registry
            .get_all_inspector_panels()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["a-high", "b-mid", "a-low", "b-low"]);
    }

    #[test]
    fn test_rule_owner_tiers() {
        let registry = PluginRegistry::new();
        assert_eq!(
            registry.get_plugin_for_rule("anything", None).manifest().id,
            DEFAULT_PLUGIN_ID
        );

        registry.register(Arc::new(TestPlugin::new("vision")));
        assert_eq!(registry.get_plugin_for_rule("x", None).manifest().id, "vision");

        registry.register(Arc::new(TestPlugin::new("core")));
        assert_eq!(registry.get_plugin_for_rule("x", None).manifest().id, "core");

        registry.register(Arc::new(TestPlugin::new("eslint").category("static")));
        let meta = RuleMeta::new("no-unused-vars").with_category("static");
        assert_eq!(
            registry.get_plugin_for_rule("no-unused-vars", Some(&meta)).manifest().id,
            "eslint"
        );

        registry.register(Arc::new(TestPlugin::new("semantic")));
        assert_eq!(
            registry.get_plugin_for_rule("semantic/button-role", Some(&meta)).manifest().id,
            "semantic"
        );

        registry.register(Arc::new(TestPlugin::new("a11y").rule("semantic/button-role")));
        assert_eq!(
            registry.get_plugin_for_rule("semantic/button-role", None).manifest().id,
            "a11y"
        );
    }

    #[test]
    fn test_prefix_requires_segment_boundary() {
        let registry = PluginRegistry::new();
        registry.register(Arc::new(TestPlugin::new("first")));
        registry.register(Arc::new(TestPlugin::new("sem")));

        // "sem"은 "semantic/x"의 세그먼트가 아님
        assert_eq!(registry.get_plugin_for_rule("semantic/x", None).manifest().id, "first");
        assert_eq!(registry.get_plugin_for_rule("sem/x", None).manifest().id, "sem");
    }

    #[tokio::test]
    async fn test_failed_plugin_retried() {
        let registry = PluginRegistry::new();
        let hub = ServiceHub::new();
        let bad = Arc::new(TestPlugin::new("bad").failing());
        registry.register(Arc::new(TestPlugin::new("good")));
        registry.register(bad.clone());

        let report = registry.initialize_all(&hub.services()).await;
        assert_eq!(report.succeeded, vec!["good".to_string()]);
        assert_eq!(report.failed_ids(), vec!["bad"]);
        assert_eq!(registry.status("bad"), Some(PluginStatus::Failed));

        let report = registry.initialize_all(&hub.services()).await;
        assert_eq!(report.skipped, vec!["good".to_string()]);
        assert_eq!(bad.init_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_services_captured_and_dropped() {
        let registry = PluginRegistry::new();
        let hub = ServiceHub::new();
        registry.register(Arc::new(TestPlugin::new("core")));

        assert!(registry.services().is_none());
        registry.initialize_all(&hub.services()).await;
        assert!(registry.services().is_some());
        assert!(registry.is_initialized("core"));

        registry.dispose_all().await;
        assert!(registry.services().is_none());
        assert!(!registry.is_initialized("core"));
        assert_eq!(registry.len(), 1);

        registry.clear().await;
        assert!(registry.is_empty());
    }
}
