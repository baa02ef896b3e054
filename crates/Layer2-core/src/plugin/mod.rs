//! # Plugin System
//!
//! 오버레이 분석 플러그인의 계약, 의존성 해석, 수명주기 관리
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     PluginRegistry                          │
//! │  ┌────────────┬────────────┬────────────┐                  │
//! │  │  core      │  eslint    │  ...       │  (등록 순서)      │
//! │  └────────────┴────────────┴────────────┘                  │
//! │         │ resolver::resolve (의존성 순서)                   │
//! │         ▼                                                   │
//! │  initialize_all(services) ──▶ Plugin::initialize            │
//! │  dispose_all()            ──▶ Cleanup + Plugin::dispose     │
//! │                                                             │
//! │  get_all_commands / get_all_inspector_panels /              │
//! │  get_plugin_for_rule / get_rule_contribution                │
//! └─────────────────────────────────────────────────────────────┘
//!                  │ Services (state / messages / connection /
//!                  │           elements / UI actions)
//!                  ▼
//!             ServiceHub (host)
//! ```
//!
//! ## 예시
//!
//! ```ignore
//! struct MyPlugin;
//!
//! #[async_trait]
//! impl Plugin for MyPlugin {
//!     fn manifest(&self) -> PluginManifest {
//!         PluginManifest::new("my-plugin", "My Plugin").with_dependency("core")
//!     }
//!
//!     async fn initialize(&self, services: &Services) -> Result<Option<Cleanup>> {
//!         let sub = services.on_message("lint:result", |msg| { ... });
//!         Ok(Some(Cleanup::new(move || sub.unsubscribe())))
//!     }
//! }
//!
//! let registry = PluginRegistry::new();
//! registry.register(Arc::new(MyPlugin));
//! registry.initialize_all(&hub.services()).await;
//! ```

mod contribution;
mod manifest;
pub mod resolver;
mod registry;
mod services;
mod traits;

pub use contribution::{
    AnalyzeFn, Analyzer, Command, CommandAction, InspectorPanel, PluginContributions,
    RuleUiContribution,
};
pub use manifest::{PluginManifest, PluginVersion};
pub use registry::{
    DefaultPlugin, LifecycleReport, PluginFailure, PluginRegistry, CORE_PLUGIN_ID,
    DEFAULT_PLUGIN_ID,
};
pub use resolver::{resolve, resolve_with_report, DependencyNode, Resolution};
pub use services::{InspectorRequest, NoopUi, ServiceHub, Services, UiActions};
pub use traits::{Cleanup, Plugin, PluginStatus};
