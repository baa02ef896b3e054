//! Plugin traits - 핵심 플러그인 인터페이스

use super::contribution::{
    Analyzer, Command, InspectorPanel, PluginContributions, RuleUiContribution,
};
use super::manifest::PluginManifest;
use super::services::Services;
use crate::issue::RuleMeta;
use async_trait::async_trait;
use uilint_foundation::Result;

// ============================================================================
// Cleanup - initialize가 반환하는 정리 콜백
// ============================================================================

/// 초기화 시 등록한 자원을 정리하는 콜백
///
/// 레지스트리는 `dispose_all`에서 해당 플러그인의 `dispose` 직전에 실행합니다.
pub struct Cleanup(Box<dyn FnOnce() + Send + Sync>);

impl Cleanup {
    pub fn new(f: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self(Box::new(f))
    }

    pub fn run(self) {
        (self.0)()
    }
}

impl std::fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Cleanup")
    }
}

// ============================================================================
// Plugin Trait - 모든 플러그인이 구현해야 하는 인터페이스
// ============================================================================

/// 플러그인 트레이트
///
/// 기여 항목(commands, panels, ...)은 등록 시 한 번만 읽히므로
/// 같은 값을 반환해야 합니다. 플러그인끼리는 직접 참조하지 않고
/// `Services`를 통해서만 상호작용합니다.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// 플러그인 매니페스트 반환
    fn manifest(&self) -> PluginManifest;

    /// 커맨드 팔레트 항목
    fn commands(&self) -> Vec<Command> {
        vec![]
    }

    /// 요소 분석기
    fn analyzers(&self) -> Vec<Analyzer> {
        vec![]
    }

    /// 인스펙터 패널
    fn inspector_panels(&self) -> Vec<InspectorPanel> {
        vec![]
    }

    /// 명시적 룰 → UI 매핑
    fn rule_contributions(&self) -> Vec<RuleUiContribution> {
        vec![]
    }

    /// 소유하는 룰 카테고리
    fn rule_categories(&self) -> Vec<String> {
        vec![]
    }

    /// 함수 기반 룰 소유권
    fn handles_rule(&self, _rule_id: &str, _meta: Option<&RuleMeta>) -> bool {
        false
    }

    /// 초기화: 이벤트 구독, 상태 slice 생성 등
    async fn initialize(&self, services: &Services) -> Result<Option<Cleanup>>;

    /// 해제
    async fn dispose(&self, _services: &Services) -> Result<()> {
        Ok(())
    }

    /// 기여 항목 스냅샷
    fn contributions(&self) -> PluginContributions {
        PluginContributions {
            commands: self.commands(),
            analyzers: self.analyzers(),
            inspector_panels: self.inspector_panels(),
            rule_contributions: self.rule_contributions(),
            rule_categories: self.rule_categories(),
        }
    }
}

/// 플러그인 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginStatus {
    /// 등록됨 (아직 초기화 안됨)
    Registered,

    /// 초기화 완료
    Initialized,

    /// 마지막 초기화 실패 (재시도 가능)
    Failed,
}

impl std::fmt::Display for PluginStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registered => write!(f, "registered"),
            Self::Initialized => write!(f, "initialized"),
            Self::Failed => write!(f, "failed"),
        }
    }
}
