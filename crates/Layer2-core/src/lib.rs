//! uilint-core: Core Runtime for UILint
//!
//! Layer2 - 플러그인 오케스트레이션 레이어
//!
//! # 주요 모듈
//!
//! - `plugin`: 플러그인 계약, 의존성 해석, 레지스트리, Services façade
//! - `issue`: 정규화된 이슈 / 위치 키 / 룰 메타데이터
//!
//! # 사용 예시
//!
//! ```ignore
//! use uilint_core::{PluginRegistry, ServiceHub};
//!
//! let hub = ServiceHub::new();
//! let registry = PluginRegistry::new();
//! registry.register(Arc::new(CorePlugin::new()));
//!
//! let report = registry.initialize_all(&hub.services()).await;
//! hub.deliver_raw(r#"{"type":"lint:result","filePath":"src/App.tsx","issues":[]}"#);
//!
//! let owner = registry.get_plugin_for_rule("no-unused-vars", None);
//! ```

pub mod issue;
pub mod plugin;

// ============================================================================
// Issue model
// ============================================================================
pub use issue::{Issue, LocationKey, ParseLocationError, RuleMeta, Severity};

// ============================================================================
// Plugin system
// ============================================================================
pub use plugin::{
    // Contract
    Cleanup,
    Plugin,
    PluginManifest,
    PluginStatus,
    PluginVersion,
    // Contributions
    Analyzer,
    Command,
    InspectorPanel,
    PluginContributions,
    RuleUiContribution,
    // Registry
    DefaultPlugin,
    LifecycleReport,
    PluginFailure,
    PluginRegistry,
    CORE_PLUGIN_ID,
    DEFAULT_PLUGIN_ID,
    // Resolver
    resolve,
    DependencyNode,
    // Services
    InspectorRequest,
    NoopUi,
    ServiceHub,
    Services,
    UiActions,
};

// Re-export foundation types plugins commonly need
pub use uilint_foundation::{
    ElementDescriptor, Error, OutboundRequest, RemoteMessage, Result, Subscription,
};
