//! App - 프로세스 단위 플러그인 호스트 조립
//!
//! 레지스트리 기본 인스턴스는 여기서 하나만 만듭니다.

use anyhow::Context;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};
use uilint_core::{PluginRegistry, ServiceHub, Services};
use uilint_foundation::{Error, UilintConfig};
use uilint_plugins::eslint::ManifestSummary;
use uilint_plugins::{register_builtins, EslintOptions, EslintPlugin, EslintSlice, ManifestSource};

/// 조립된 호스트
pub struct App {
    hub: ServiceHub,
    registry: PluginRegistry,
    eslint: Arc<EslintPlugin>,
}

impl App {
    /// 기본 플러그인을 등록하고 초기화
    ///
    /// CLI에는 원격 채널이 없으므로 라이브 스캔은 끄고 NullSink를 씁니다.
    pub async fn start(config: &UilintConfig, extra_disabled: &[String]) -> anyhow::Result<Self> {
        let disabled_rules: BTreeSet<String> = config
            .disabled_rules
            .iter()
            .chain(extra_disabled)
            .cloned()
            .collect();

        let hub = ServiceHub::new();
        let registry = PluginRegistry::new();
        let eslint = register_builtins(
            &registry,
            EslintOptions {
                live_scan: false,
                disabled_rules,
            },
        )
        .context("built-in plugins were already registered")?;

        let report = registry.initialize_all(&hub.services()).await;
        for failure in &report.failed {
            warn!(plugin_id = %failure.plugin_id, "Plugin unavailable: {}", failure.message);
        }
        debug!(initialized = report.succeeded.len(), "Plugin host ready");

        Ok(Self {
            hub,
            registry,
            eslint,
        })
    }

    pub fn services(&self) -> Services {
        self.hub.services()
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn eslint_state(&self) -> EslintSlice {
        self.eslint.state(&self.services())
    }

    /// 인자 → 설정 순으로 manifest 위치 결정 후 로드
    pub async fn load_manifest(
        &self,
        arg: Option<&str>,
        config: &UilintConfig,
    ) -> anyhow::Result<ManifestSummary> {
        let Some(source) = arg.or(config.manifest.as_deref()) else {
            return Err(Error::Config(
                "no lint manifest configured (use --manifest or UILINT_MANIFEST)".to_string(),
            )
            .into());
        };

        let source = ManifestSource::parse(source);
        self.eslint
            .load_manifest(&self.services(), &source)
            .await
            .with_context(|| format!("failed to load manifest from {source}"))
    }

    pub async fn shutdown(self) {
        let report = self.registry.clear().await;
        if !report.is_success() {
            warn!(failed = ?report.failed_ids(), "Some plugins failed to dispose");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_start_registers_builtins() {
        let app = App::start(&UilintConfig::default(), &["eqeqeq".to_string()])
            .await
            .unwrap();

        assert_eq!(app.registry().plugin_ids(), vec!["core", "eslint"]);
        assert!(app.eslint_state().disabled_rules.contains("eqeqeq"));
        app.shutdown().await;
    }

    #[tokio::test]
    async fn test_missing_manifest_is_an_error() {
        let app = App::start(&UilintConfig::default(), &[]).await.unwrap();
        let err = app
            .load_manifest(None, &UilintConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_manifest_from_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"files":[{{"filePath":"a.tsx","issues":[{{"line":1,"column":1,"message":"m"}}]}}]}}"#)
            .unwrap();
        let config = UilintConfig::default().manifest(file.path().to_string_lossy());

        let app = App::start(&config, &[]).await.unwrap();
        let summary = app.load_manifest(None, &config).await.unwrap();
        assert_eq!(summary.issues, 1);
    }
}
