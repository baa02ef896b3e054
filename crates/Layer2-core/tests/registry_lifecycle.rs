//! 레지스트리 수명주기 통합 테스트
//!
//! 초기화 순서, 멱등성, 역순 해제, 실패 격리, cleanup 실행을 검증합니다.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uilint_core::{
    Cleanup, Error, Plugin, PluginManifest, PluginRegistry, PluginStatus, RemoteMessage, Result,
    ServiceHub, Services,
};

type Journal = Arc<Mutex<Vec<String>>>;

/// 호출 기록을 남기는 플러그인
struct Recorder {
    manifest: PluginManifest,
    journal: Journal,
    fail_init: bool,
    fail_once: AtomicBool,
    fail_dispose: bool,
    subscribe: bool,
}

impl Recorder {
    fn new(id: &str, deps: &[&str], journal: &Journal) -> Self {
        let mut manifest = PluginManifest::new(id, id);
        for dep in deps {
            manifest = manifest.with_dependency(*dep);
        }
        Self {
            manifest,
            journal: Arc::clone(journal),
            fail_init: false,
            fail_once: AtomicBool::new(false),
            fail_dispose: false,
            subscribe: false,
        }
    }

    fn fail_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    fn fail_first_init(self) -> Self {
        self.fail_once.store(true, Ordering::SeqCst);
        self
    }

    fn fail_dispose(mut self) -> Self {
        self.fail_dispose = true;
        self
    }

    fn subscribing(mut self) -> Self {
        self.subscribe = true;
        self
    }
}

#[async_trait]
impl Plugin for Recorder {
    fn manifest(&self) -> PluginManifest {
        self.manifest.clone()
    }

    async fn initialize(&self, services: &Services) -> Result<Option<Cleanup>> {
        let id = self.manifest.id.clone();
        self.journal.lock().push(format!("init:{id}"));
        if self.fail_init || self.fail_once.swap(false, Ordering::SeqCst) {
            return Err(Error::plugin_init(id, "initializer failed"));
        }

        if !self.subscribe {
            return Ok(None);
        }

        let journal = Arc::clone(&self.journal);
        let tag = id.clone();
        let sub = services.on_message("ping", move |_| {
            journal.lock().push(format!("ping:{tag}"));
        });

        let journal = Arc::clone(&self.journal);
        Ok(Some(Cleanup::new(move || {
            sub.unsubscribe();
            journal.lock().push(format!("cleanup:{id}"));
        })))
    }

    async fn dispose(&self, _services: &Services) -> Result<()> {
        let id = &self.manifest.id;
        self.journal.lock().push(format!("dispose:{id}"));
        if self.fail_dispose {
            return Err(Error::plugin_dispose(id, "dispose failed"));
        }
        Ok(())
    }
}

fn entries(journal: &Journal, prefix: &str) -> Vec<String> {
    journal
        .lock()
        .iter()
        .filter_map(|e| e.strip_prefix(prefix).map(str::to_string))
        .collect()
}

#[tokio::test]
async fn initialize_follows_dependencies_and_dispose_reverses_it() {
    let journal: Journal = Arc::default();
    let registry = PluginRegistry::new();
    let hub = ServiceHub::new();

    registry.register(Arc::new(Recorder::new("eslint", &["core", "vision"], &journal)));
    registry.register(Arc::new(Recorder::new("vision", &["core"], &journal)));
    registry.register(Arc::new(Recorder::new("core", &[], &journal)));

    let report = registry.initialize_all(&hub.services()).await;
    assert!(report.is_success());

    let init = entries(&journal, "init:");
    assert_eq!(init, vec!["core", "vision", "eslint"]);

    registry.dispose_all().await;
    let mut dispose = entries(&journal, "dispose:");
    dispose.reverse();
    assert_eq!(dispose, init);
}

#[tokio::test]
async fn initialize_all_is_idempotent() {
    let journal: Journal = Arc::default();
    let registry = PluginRegistry::new();
    let hub = ServiceHub::new();

    registry.register(Arc::new(Recorder::new("core", &[], &journal)));
    registry.register(Arc::new(Recorder::new("eslint", &["core"], &journal)));

    registry.initialize_all(&hub.services()).await;
    let second = registry.initialize_all(&hub.services()).await;

    assert!(second.succeeded.is_empty());
    assert_eq!(second.skipped.len(), 2);
    assert_eq!(entries(&journal, "init:").len(), 2);
}

#[tokio::test]
async fn late_registration_initialized_on_next_call() {
    let journal: Journal = Arc::default();
    let registry = PluginRegistry::new();
    let hub = ServiceHub::new();

    registry.register(Arc::new(Recorder::new("core", &[], &journal)));
    registry.initialize_all(&hub.services()).await;

    registry.register(Arc::new(Recorder::new("eslint", &["core"], &journal)));
    let report = registry.initialize_all(&hub.services()).await;

    assert_eq!(report.succeeded, vec!["eslint".to_string()]);
    assert_eq!(entries(&journal, "init:"), vec!["core", "eslint"]);
}

#[tokio::test]
async fn failing_plugin_does_not_block_others() {
    let journal: Journal = Arc::default();
    let registry = PluginRegistry::new();
    let hub = ServiceHub::new();

    registry.register(Arc::new(Recorder::new("core", &[], &journal).fail_init()));
    registry.register(Arc::new(Recorder::new("eslint", &["core"], &journal)));

    let report = registry.initialize_all(&hub.services()).await;
    assert_eq!(report.failed_ids(), vec!["core"]);
    assert_eq!(report.succeeded, vec!["eslint".to_string()]);
    assert_eq!(registry.status("core"), Some(PluginStatus::Failed));
    assert_eq!(registry.status("eslint"), Some(PluginStatus::Initialized));

    // 초기화되지 않은 플러그인은 해제 대상이 아님
    registry.dispose_all().await;
    assert_eq!(entries(&journal, "dispose:"), vec!["eslint"]);
}

#[tokio::test]
async fn retried_plugin_disposed_in_reverse_of_actual_init_order() {
    let journal: Journal = Arc::default();
    let registry = PluginRegistry::new();
    let hub = ServiceHub::new();

    registry.register(Arc::new(Recorder::new("core", &[], &journal)));
    registry.register(Arc::new(Recorder::new("vision", &["core"], &journal).fail_first_init()));
    registry.register(Arc::new(Recorder::new("eslint", &["core"], &journal)));

    let first = registry.initialize_all(&hub.services()).await;
    assert_eq!(first.failed_ids(), vec!["vision"]);

    let second = registry.initialize_all(&hub.services()).await;
    assert_eq!(second.succeeded, vec!["vision".to_string()]);

    registry.dispose_all().await;
    assert_eq!(entries(&journal, "dispose:"), vec!["vision", "eslint", "core"]);
}

#[tokio::test]
async fn dispose_failure_is_isolated() {
    let journal: Journal = Arc::default();
    let registry = PluginRegistry::new();
    let hub = ServiceHub::new();

    registry.register(Arc::new(Recorder::new("core", &[], &journal)));
    registry.register(Arc::new(Recorder::new("eslint", &["core"], &journal).fail_dispose()));

    registry.initialize_all(&hub.services()).await;
    let report = registry.dispose_all().await;

    assert_eq!(report.failed_ids(), vec!["eslint"]);
    assert_eq!(report.succeeded, vec!["core".to_string()]);
    assert!(!registry.is_initialized("core"));
    assert!(registry.services().is_none());
}

#[tokio::test]
async fn cleanup_runs_before_dispose_and_releases_subscriptions() {
    let journal: Journal = Arc::default();
    let registry = PluginRegistry::new();
    let hub = ServiceHub::new();

    registry.register(Arc::new(Recorder::new("core", &[], &journal).subscribing()));
    registry.initialize_all(&hub.services()).await;

    assert_eq!(hub.deliver_message(&RemoteMessage::new("ping")), 1);

    registry.dispose_all().await;
    assert_eq!(hub.deliver_message(&RemoteMessage::new("ping")), 0);

    let log = journal.lock().clone();
    let cleanup = log.iter().position(|e| e == "cleanup:core");
    let dispose = log.iter().position(|e| e == "dispose:core");
    assert!(cleanup.is_some());
    assert!(cleanup < dispose);
}

#[tokio::test]
async fn clear_allows_reregistration() {
    let journal: Journal = Arc::default();
    let registry = PluginRegistry::new();
    let hub = ServiceHub::new();

    registry.register(Arc::new(Recorder::new("core", &[], &journal)));
    registry.initialize_all(&hub.services()).await;
    registry.clear().await;

    assert!(registry.is_empty());
    assert!(registry.register(Arc::new(Recorder::new("core", &[], &journal))));

    registry.initialize_all(&hub.services()).await;
    assert_eq!(entries(&journal, "init:").len(), 2);
    assert!(registry.is_initialized("core"));
}

#[tokio::test]
async fn duplicate_register_keeps_first_plugin() {
    let journal: Journal = Arc::default();
    let registry = PluginRegistry::new();
    let hub = ServiceHub::new();

    assert!(registry.register(Arc::new(Recorder::new("core", &[], &journal))));
    assert!(!registry.register(Arc::new(Recorder::new("core", &["eslint"], &journal))));

    assert_eq!(registry.len(), 1);
    let kept = registry.get("core").unwrap();
    assert!(kept.manifest().dependencies.is_empty());

    registry.initialize_all(&hub.services()).await;
    assert_eq!(entries(&journal, "init:"), vec!["core"]);
}

#[test]
fn contributions_may_query_the_registry() {
    use uilint_core::Command;

    struct Introspecting {
        registry: Arc<PluginRegistry>,
    }

    #[async_trait]
    impl Plugin for Introspecting {
        fn manifest(&self) -> PluginManifest {
            PluginManifest::new("introspect", "Introspect")
        }

        fn commands(&self) -> Vec<Command> {
            let count = self.registry.len();
            vec![Command::new(format!("introspect.{count}"), "Count", |_| {})]
        }

        async fn initialize(&self, _services: &Services) -> Result<Option<Cleanup>> {
            Ok(None)
        }
    }

    let registry = Arc::new(PluginRegistry::new());
    assert!(registry.register(Arc::new(Introspecting {
        registry: Arc::clone(&registry),
    })));

    let ids: Vec<String> = registry.get_all_commands().into_iter().map(|c| c.id).collect();
    assert_eq!(ids, vec!["introspect.0"]);
}

#[test]
fn rule_owner_prefers_explicit_contribution_over_prefix() {
    use uilint_core::RuleUiContribution;

    struct Explicit;

    #[async_trait]
    impl Plugin for Explicit {
        fn manifest(&self) -> PluginManifest {
            PluginManifest::new("a11y", "Accessibility")
        }

        fn rule_contributions(&self) -> Vec<RuleUiContribution> {
            vec![RuleUiContribution::new("semantic/button-role").with_panel("a11y-panel")]
        }

        async fn initialize(&self, _services: &Services) -> Result<Option<Cleanup>> {
            Ok(None)
        }
    }

    let journal: Journal = Arc::default();
    let registry = PluginRegistry::new();
    registry.register(Arc::new(Recorder::new("semantic", &[], &journal)));
    assert_eq!(
        registry.get_plugin_for_rule("semantic/button-role", None).manifest().id,
        "semantic"
    );

    registry.register(Arc::new(Explicit));
    assert_eq!(
        registry.get_plugin_for_rule("semantic/button-role", None).manifest().id,
        "a11y"
    );
    assert_eq!(
        registry
            .get_rule_contribution("semantic/button-role")
            .and_then(|c| c.panel_id),
        Some("a11y-panel".to_string())
    );
}
