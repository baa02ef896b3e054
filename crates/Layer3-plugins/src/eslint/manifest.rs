//! Lint manifest - 정적 모드의 사전 계산된 결과
//!
//! 원격 채널이 없을 때 JSON 문서 하나를 한 번 읽어 캐시를 채웁니다.
//!
//! ```json
//! {
//!   "version": 1,
//!   "generatedAt": "2026-01-01T00:00:00Z",
//!   "workspaceRoot": "/work/app",
//!   "files": [
//!     { "filePath": "src/App.tsx", "issues": [{ "line": 3, "column": 1, "message": "...", "ruleId": "eqeqeq", "severity": 2 }] }
//!   ],
//!   "rules": [{ "id": "eqeqeq", "category": "static" }]
//! }
//! ```

use super::wire::RawIssue;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};
use uilint_core::RuleMeta;
use uilint_foundation::{Error, Result};

/// manifest 위치
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    File(PathBuf),
    Url(String),
}

impl ManifestSource {
    /// `http(s)://`로 시작하면 URL, 아니면 파일 경로
    pub fn parse(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            Self::Url(source.to_string())
        } else {
            Self::File(PathBuf::from(source))
        }
    }

    /// 문서 한 번 가져오기
    pub async fn fetch(&self) -> Result<LintManifest> {
        let text = match self {
            Self::File(path) => {
                debug!(path = %path.display(), "Reading lint manifest");
                tokio::fs::read_to_string(path).await?
            }
            Self::Url(url) => {
                debug!(url = %url, "Fetching lint manifest");
                let response = reqwest::get(url)
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| Error::Http(e.to_string()))?;
                response.text().await.map_err(|e| Error::Http(e.to_string()))?
            }
        };

        let manifest = LintManifest::from_json(&text)?;
        info!(
            source = %self,
            files = manifest.files.len(),
            rules = manifest.rules.len(),
            "Loaded lint manifest"
        );
        Ok(manifest)
    }
}

impl fmt::Display for ManifestSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

/// manifest 안의 파일 하나
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestFile {
    pub file_path: String,
    #[serde(default)]
    pub issues: Vec<RawIssue>,
}

/// 정적 lint 결과 문서
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LintManifest {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub workspace_root: Option<String>,
    #[serde(default)]
    pub files: Vec<ManifestFile>,
    #[serde(default)]
    pub rules: Vec<RuleMeta>,
}

fn default_version() -> u32 {
    1
}

impl LintManifest {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Manifest(format!("invalid manifest: {e}")))
    }
}

/// 적용 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManifestSummary {
    pub files: usize,
    pub locations: usize,
    pub issues: usize,
    pub rules: usize,
}
