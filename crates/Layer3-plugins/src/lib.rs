//! uilint-plugins: Built-in plugins for UILint
//!
//! Layer3 - 기본 제공 플러그인
//!
//! - `core_plugin`: 요소 추적, 커맨드 팔레트/인스펙터 기본 기여, 룰 소유권 폴백
//! - `eslint`: ESLint 결과 캐시 (라이브 스캔 + 정적 manifest 모드, 히트맵)

pub mod core_plugin;
pub mod eslint;

pub use core_plugin::{CorePlugin, CoreSlice, CORE_SLICE};
pub use eslint::{
    EslintOptions, EslintPlugin, EslintSlice, IssueSummary, ManifestSource, ScanStatus,
    ESLINT_PLUGIN_ID, ESLINT_SLICE,
};

use std::sync::Arc;
use uilint_core::PluginRegistry;

/// 기본 플러그인 등록 (core → eslint)
///
/// 이미 등록된 ID는 건너뜁니다. 이번에 등록된 ESLint 플러그인 핸들을 반환합니다.
pub fn register_builtins(
    registry: &PluginRegistry,
    eslint: EslintOptions,
) -> Option<Arc<EslintPlugin>> {
    let eslint = Arc::new(EslintPlugin::new(eslint));
    registry.register(Arc::new(CorePlugin::new()));
    registry.register(eslint.clone()).then_some(eslint)
}
