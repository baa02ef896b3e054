//! ESLint engine - 스캔 상태 머신과 캐시 갱신
//!
//! 현재 slice에 의존하는 갱신은 모두 `update_state` 한 번으로 처리합니다.
//! 읽기-변경-쓰기가 한 락 안에서 끝나므로 동시에 도착한 결과끼리 덮어쓰지 않고,
//! 한 메시지가 여러 위치 키를 담고 있어도 갱신은 한 번입니다.

use super::heatmap::{compute_heatmap_data, HeatmapEntry};
use super::manifest::{LintManifest, ManifestSource, ManifestSummary};
use super::state::{
    EslintPatch, EslintSlice, RuleConfig, ScanProgress, ScanStatus, WorkspaceInfo, ESLINT_SLICE,
};
use super::wire::{
    group_issues, FileChangedPayload, LintResultPayload, ProgressPayload, RuleConfigChangedPayload,
    RulesMetadataPayload, REQ_LINT_FILE, REQ_RULE_CONFIG_SET, REQ_SUBSCRIBE_FILE,
};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};
use uilint_core::{
    ElementDescriptor, Issue, LocationKey, OutboundRequest, RemoteMessage, RuleMeta, Services,
};
use uilint_foundation::{Error, Result};

/// ESLint 룰이 기본으로 속하는 카테고리
pub const ESLINT_CATEGORY: &str = "static";

/// 스캔 상태와 페이지 요소를 추적하는 엔진
pub struct EslintEngine {
    plugin_id: String,

    /// scanning 진입 가드
    scan_guard: AtomicBool,

    /// 페이지에 있는 요소 (처음 본 순서)
    elements: Mutex<Vec<ElementDescriptor>>,

    /// 메타데이터로 알려진 룰 ID
    known_rules: RwLock<HashSet<String>>,
}

impl EslintEngine {
    pub fn new(plugin_id: impl Into<String>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            scan_guard: AtomicBool::new(false),
            elements: Mutex::new(Vec::new()),
            known_rules: RwLock::new(HashSet::new()),
        }
    }

    pub fn state(&self, services: &Services) -> EslintSlice {
        services.get_state(ESLINT_SLICE)
    }

    fn apply(&self, services: &Services, patch: &EslintPatch) {
        if let Err(e) = services.set_state(ESLINT_SLICE, patch) {
            warn!(plugin_id = %self.plugin_id, error = %e, "Failed to update slice");
        }
    }

    /// 현재 slice 기준 갱신 (`None`이면 쓰지 않음)
    fn update<R>(
        &self,
        services: &Services,
        f: impl FnOnce(&mut EslintSlice) -> Option<R>,
    ) -> Option<R> {
        match services.update_state(ESLINT_SLICE, f) {
            Ok(result) => result,
            Err(e) => {
                warn!(plugin_id = %self.plugin_id, error = %e, "Failed to update slice");
                None
            }
        }
    }

    /// 빈 캐시로 slice 생성
    pub fn reset_slice(&self, services: &Services, disabled_rules: BTreeSet<String>) {
        let patch = EslintPatch {
            disabled_rules: Some(disabled_rules),
            connected: Some(services.is_connected()),
            ..EslintPatch::reset()
        };
        self.apply(services, &patch);
    }

    // === Scan state machine ===

    pub fn is_scanning(&self) -> bool {
        self.scan_guard.load(Ordering::SeqCst)
    }

    /// idle → scanning (이미 스캔 중이거나 idle이 아니면 false)
    pub fn start_scan(&self, services: &Services) -> bool {
        if self
            .scan_guard
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Scan already running");
            return false;
        }

        let started = self
            .update(services, |slice| {
                (slice.scan_status == ScanStatus::Idle).then(|| {
                    slice.scan_status = ScanStatus::Scanning;
                    slice.scan_error = None;
                })
            })
            .is_some();
        if !started {
            self.scan_guard.store(false, Ordering::SeqCst);
            let status = self.state(services).scan_status;
            debug!(%status, "Scan can only start from idle");
            return false;
        }
        info!("ESLint scan started");

        let elements = self.tracked_elements();
        self.request_resources(services, &elements);
        true
    }

    /// 스캔 중지: 캐시와 요청 기록을 비우고 idle로
    pub fn stop_scan(&self, services: &Services) {
        self.apply(services, &EslintPatch::reset());
        self.scan_guard.store(false, Ordering::SeqCst);
        info!("ESLint scan stopped");
    }

    /// 캐시만 비움 (스캔 중이면 현재 요소를 다시 요청)
    pub fn clear_cache(&self, services: &Services) {
        self.apply(
            services,
            &EslintPatch {
                issue_cache: Some(BTreeMap::new()),
                file_issues: Some(BTreeMap::new()),
                requested_files: Some(BTreeSet::new()),
                ..Default::default()
            },
        );
        debug!("ESLint cache cleared");

        if self.is_scanning() {
            let elements = self.tracked_elements();
            self.request_resources(services, &elements);
        }
    }

    /// 아직 요청하지 않은 resource마다 요청 하나씩, 보낸 개수 반환
    fn request_resources(&self, services: &Services, elements: &[ElementDescriptor]) -> usize {
        let resources: BTreeSet<String> = elements
            .iter()
            .filter_map(|e| LocationKey::resource_of(&e.location_key))
            .collect();
        if resources.is_empty() {
            return 0;
        }

        let Some(fresh) = self.update(services, |slice| {
            let fresh: Vec<String> = resources
                .into_iter()
                .filter(|r| slice.requested_files.insert(r.clone()))
                .collect();
            (!fresh.is_empty()).then_some(fresh)
        }) else {
            return 0;
        };

        for resource in &fresh {
            let lint = OutboundRequest::new(REQ_LINT_FILE).with("filePath", resource.as_str());
            let watch = OutboundRequest::new(REQ_SUBSCRIBE_FILE).with("filePath", resource.as_str());
            for request in [lint, watch] {
                if let Err(e) = services.send(request) {
                    warn!(resource = %resource, error = %e, "Failed to send request");
                }
            }
        }

        debug!(count = fresh.len(), "Requested lint for resources");
        fresh.len()
    }

    // === Elements ===

    pub fn tracked_elements(&self) -> Vec<ElementDescriptor> {
        self.elements.lock().clone()
    }

    pub fn on_elements_added(&self, services: &Services, batch: &[ElementDescriptor]) {
        {
            let mut elements = self.elements.lock();
            let known: HashSet<String> = elements.iter().map(|e| e.id.clone()).collect();
            elements.extend(batch.iter().filter(|e| !known.contains(&e.id)).cloned());
        }

        if self.is_scanning() {
            self.request_resources(services, batch);
        }
    }

    pub fn on_elements_removed(&self, batch: &[ElementDescriptor]) {
        let removed: HashSet<&str> = batch.iter().map(|e| e.id.as_str()).collect();
        self.elements.lock().retain(|e| !removed.contains(e.id.as_str()));
    }

    pub fn forget_elements(&self) {
        self.elements.lock().clear();
    }

    // === Inbound messages ===

    /// `lint:result`: 보고된 resource의 이전 항목을 새 결과로 교체
    pub fn handle_lint_result(&self, services: &Services, message: &RemoteMessage) {
        let payload: LintResultPayload = match message.payload_as() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Ignoring malformed lint result");
                return;
            }
        };

        let grouped = group_issues(&self.plugin_id, payload.file_path.as_deref(), payload.issues);
        if grouped.resources.is_empty() {
            debug!("Lint result without resource");
            return;
        }

        let locations = grouped.by_location.len();
        let resources = grouped.resources.len();
        self.update(services, |slice| {
            slice.issue_cache.retain(|key, _| {
                LocationKey::resource_of(key).map_or(true, |r| !grouped.resources.contains(&r))
            });
            slice
                .file_issues
                .retain(|resource, _| !grouped.resources.contains(resource));

            merge_non_empty(&mut slice.issue_cache, grouped.by_location);
            merge_non_empty(&mut slice.file_issues, grouped.unlocated);
            Some(())
        });
        debug!(resources, locations, "Applied lint result");
    }

    pub fn handle_progress(&self, services: &Services, message: &RemoteMessage) {
        let Ok(payload) = message.payload_as::<ProgressPayload>() else {
            warn!("Ignoring malformed progress message");
            return;
        };

        self.apply(
            services,
            &EslintPatch {
                progress: Some(Some(ScanProgress {
                    current: payload.current,
                    total: payload.total,
                    file_path: payload.file_path,
                    updated_at: Utc::now(),
                })),
                ..Default::default()
            },
        );
    }

    pub fn handle_file_changed(&self, services: &Services, message: &RemoteMessage) {
        match message.payload_as::<FileChangedPayload>() {
            Ok(payload) => {
                self.invalidate(services, &payload.file_path);
            }
            Err(e) => warn!(error = %e, "Ignoring malformed file change"),
        }
    }

    /// resource의 캐시 항목을 지우고 다시 요청할 수 있게 함, 지운 위치 키 수 반환
    pub fn invalidate(&self, services: &Services, resource: &str) -> usize {
        let removed = self
            .update(services, |slice| {
                let before = slice.issue_cache.len();
                slice
                    .issue_cache
                    .retain(|key, _| LocationKey::resource_of(key).as_deref() != Some(resource));
                slice.file_issues.remove(resource);
                slice.requested_files.remove(resource);
                Some(before - slice.issue_cache.len())
            })
            .unwrap_or(0);
        debug!(resource, removed, "Invalidated resource");
        removed
    }

    pub fn handle_rules_metadata(&self, services: &Services, message: &RemoteMessage) {
        match message.payload_as::<RulesMetadataPayload>() {
            Ok(payload) => self.set_available_rules(services, payload.rules),
            Err(e) => warn!(error = %e, "Ignoring malformed rules metadata"),
        }
    }

    fn set_available_rules(&self, services: &Services, rules: Vec<RuleMeta>) {
        let rules = self.adopt_rules(rules);
        self.apply(
            services,
            &EslintPatch {
                available_rules: Some(rules),
                ..Default::default()
            },
        );
    }

    /// 기본 카테고리를 채우고 알려진 룰 목록 교체
    fn adopt_rules(&self, rules: Vec<RuleMeta>) -> Vec<RuleMeta> {
        let rules: Vec<RuleMeta> = rules
            .into_iter()
            .map(|mut rule| {
                rule.category.get_or_insert_with(|| ESLINT_CATEGORY.to_string());
                rule
            })
            .collect();

        *self.known_rules.write() = rules.iter().map(|r| r.id.clone()).collect();
        rules
    }

    pub fn handle_rule_config_changed(&self, services: &Services, message: &RemoteMessage) {
        let payload = match message.payload_as::<RuleConfigChangedPayload>() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Ignoring malformed rule config change");
                return;
            }
        };

        self.update(services, |slice| {
            slice.rule_configs.insert(
                payload.rule_id,
                RuleConfig {
                    severity: payload.severity,
                    options: payload.options,
                },
            );
            Some(())
        });
    }

    pub fn handle_workspace_info(&self, services: &Services, message: &RemoteMessage) {
        match message.payload_as::<WorkspaceInfo>() {
            Ok(info) => self.apply(
                services,
                &EslintPatch {
                    workspace: Some(info),
                    ..Default::default()
                },
            ),
            Err(e) => warn!(error = %e, "Ignoring malformed workspace info"),
        }
    }

    pub fn on_connection_change(&self, services: &Services, connected: bool) {
        self.apply(
            services,
            &EslintPatch {
                connected: Some(connected),
                ..Default::default()
            },
        );
    }

    // === Rules ===

    pub fn knows_rule(&self, rule_id: &str) -> bool {
        self.known_rules.read().contains(rule_id)
    }

    /// 룰 표시 토글, 토글 후 비활성 여부 반환
    pub fn toggle_rule(&self, services: &Services, rule_id: &str) -> bool {
        self.update(services, |slice| {
            if slice.disabled_rules.remove(rule_id) {
                Some(false)
            } else {
                slice.disabled_rules.insert(rule_id.to_string());
                Some(true)
            }
        })
        .unwrap_or(false)
    }

    /// 서버에 룰 설정 변경 요청 (반영은 `rule:config:changed`로 돌아옴)
    pub fn set_rule_config(
        &self,
        services: &Services,
        rule_id: &str,
        severity: &str,
        options: Option<Value>,
    ) -> Result<()> {
        let mut request = OutboundRequest::new(REQ_RULE_CONFIG_SET)
            .with("ruleId", rule_id)
            .with("severity", severity);
        if let Some(options) = options {
            request = request.with("options", options);
        }
        services.send(request)
    }

    // === Manifest mode ===

    /// manifest 전체(룰 메타데이터 포함)를 한 번의 갱신으로 반영하고 complete로
    pub fn apply_manifest(&self, services: &Services, manifest: LintManifest) -> ManifestSummary {
        let mut issue_cache: BTreeMap<String, Vec<Issue>> = BTreeMap::new();
        let mut file_issues: BTreeMap<String, Vec<Issue>> = BTreeMap::new();
        let files = manifest.files.len();

        for file in manifest.files {
            let grouped = group_issues(&self.plugin_id, Some(file.file_path.as_str()), file.issues);
            for (key, issues) in grouped.by_location {
                issue_cache.entry(key).or_default().extend(issues);
            }
            for (resource, issues) in grouped.unlocated {
                file_issues.entry(resource).or_default().extend(issues);
            }
        }
        issue_cache.retain(|_, issues| !issues.is_empty());
        file_issues.retain(|_, issues| !issues.is_empty());

        let summary = ManifestSummary {
            files,
            locations: issue_cache.len(),
            issues: issue_cache.values().chain(file_issues.values()).map(Vec::len).sum(),
            rules: manifest.rules.len(),
        };

        let available_rules =
            (!manifest.rules.is_empty()).then(|| self.adopt_rules(manifest.rules));

        let workspace = manifest.workspace_root.map(|root| WorkspaceInfo {
            workspace_root: Some(root),
            ..Default::default()
        });

        self.scan_guard.store(false, Ordering::SeqCst);
        self.apply(
            services,
            &EslintPatch {
                scan_status: Some(ScanStatus::Complete),
                scan_error: Some(None),
                issue_cache: Some(issue_cache),
                file_issues: Some(file_issues),
                requested_files: Some(BTreeSet::new()),
                workspace,
                progress: Some(None),
                available_rules,
                ..Default::default()
            },
        );
        info!(
            files = summary.files,
            issues = summary.issues,
            "Applied lint manifest"
        );
        summary
    }

    /// manifest 한 번 가져와 반영 (실패 시 scanStatus = error)
    pub async fn load_manifest(
        &self,
        services: &Services,
        source: &ManifestSource,
    ) -> Result<ManifestSummary> {
        if self.is_scanning() {
            return Err(Error::InvalidInput(
                "cannot load a manifest while a live scan is running".to_string(),
            ));
        }

        match source.fetch().await {
            Ok(manifest) => Ok(self.apply_manifest(services, manifest)),
            Err(e) => {
                error!(source = %source, error = %e, "Failed to load lint manifest");
                self.apply(
                    services,
                    &EslintPatch {
                        scan_status: Some(ScanStatus::Error),
                        scan_error: Some(Some(e.to_string())),
                        ..Default::default()
                    },
                );
                Err(e)
            }
        }
    }

    pub fn heatmap(&self, services: &Services) -> Vec<HeatmapEntry> {
        compute_heatmap_data(&self.tracked_elements(), &self.state(services))
    }
}

fn merge_non_empty(target: &mut BTreeMap<String, Vec<Issue>>, incoming: BTreeMap<String, Vec<Issue>>) {
    for (key, issues) in incoming {
        if !issues.is_empty() {
            target.insert(key, issues);
        }
    }
}
