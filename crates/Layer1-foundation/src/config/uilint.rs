//! UILint Config - 통합 설정
//!
//! 글로벌(`~/.config/uilint/config.json`)과 프로젝트(`.uilint/config.json`)
//! 설정을 차례로 병합하고(프로젝트 우선), 환경 변수로 덮어씁니다.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 설정 파일명
pub const UILINT_CONFIG_FILE: &str = "config.json";

/// 프로젝트 설정 디렉토리 이름
const PROJECT_DIR: &str = ".uilint";

/// 매니페스트 경로 환경 변수
pub const ENV_MANIFEST: &str = "UILINT_MANIFEST";

/// 서버 URL 환경 변수
pub const ENV_SERVER_URL: &str = "UILINT_SERVER_URL";

// ============================================================================
// UILint Config
// ============================================================================

/// UILint 통합 설정
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UilintConfig {
    /// 버전 (마이그레이션용)
    #[serde(default = "default_version")]
    pub version: u32,

    /// 원격 분석 서버 주소 (예: ws://localhost:9234)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,

    /// 정적 린트 매니페스트 (파일 경로 또는 http(s) URL)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<String>,

    /// 초기화 시 바로 스캔 시작
    #[serde(default)]
    pub live_scan: bool,

    /// 처음부터 숨길 룰 목록
    #[serde(default)]
    pub disabled_rules: Vec<String>,

    /// 로그 레벨
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for UilintConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            server_url: None,
            manifest: None,
            live_scan: false,
            disabled_rules: Vec::new(),
            log_level: default_log_level(),
        }
    }
}

impl UilintConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// 글로벌 + 프로젝트 병합 로드 후 환경 변수 적용
    pub fn load() -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| Error::Config(format!("Cannot get current directory: {}", e)))?;
        let mut config = Self::load_layers(global_dir().as_deref(), &cwd)?;
        config.apply_env();
        Ok(config)
    }

    /// 특정 파일에서 로드 (CLI `--config`)
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = read_config(path)?;
        config.apply_env();
        Ok(config)
    }

    /// 글로벌(~/.config/uilint/) 다음 프로젝트(.uilint/) 순서로 병합
    fn load_layers(global: Option<&Path>, project_root: &Path) -> Result<Self> {
        let mut config = Self::new();

        let project = project_root.join(PROJECT_DIR);
        for dir in global.into_iter().chain([project.as_path()]) {
            let path = dir.join(UILINT_CONFIG_FILE);
            if path.exists() {
                config.merge(read_config(&path)?);
            }
        }
        Ok(config)
    }

    // ========================================================================
    // Merge
    // ========================================================================

    /// 다른 설정과 병합 (other가 우선)
    pub fn merge(&mut self, other: UilintConfig) {
        if other.server_url.is_some() {
            self.server_url = other.server_url;
        }
        if other.manifest.is_some() {
            self.manifest = other.manifest;
        }
        if other.live_scan {
            self.live_scan = true;
        }
        for rule in other.disabled_rules {
            if !self.disabled_rules.contains(&rule) {
                self.disabled_rules.push(rule);
            }
        }
        if other.log_level != default_log_level() {
            self.log_level = other.log_level;
        }
        self.version = self.version.max(other.version);
    }

    /// 환경 변수 덮어쓰기
    fn apply_env(&mut self) {
        if let Ok(manifest) = std::env::var(ENV_MANIFEST) {
            if !manifest.is_empty() {
                self.manifest = Some(manifest);
            }
        }
        if let Ok(url) = std::env::var(ENV_SERVER_URL) {
            if !url.is_empty() {
                self.server_url = Some(url);
            }
        }
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn manifest(mut self, manifest: impl Into<String>) -> Self {
        self.manifest = Some(manifest.into());
        self
    }

    pub fn live_scan(mut self, enabled: bool) -> Self {
        self.live_scan = enabled;
        self
    }

    pub fn disable_rule(mut self, rule_id: impl Into<String>) -> Self {
        let rule_id = rule_id.into();
        if !self.disabled_rules.contains(&rule_id) {
            self.disabled_rules.push(rule_id);
        }
        self
    }
}

fn global_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("uilint"))
}

fn read_config(path: &Path) -> Result<UilintConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

fn default_version() -> u32 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}
