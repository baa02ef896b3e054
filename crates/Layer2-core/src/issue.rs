//! Issue model - 위치 키, 심각도, 룰 메타데이터
//!
//! 위치 키는 `resource:line:column` 형식입니다. resource 자체에 콜론이
//! 들어갈 수 있으므로(`C:\app\src\App.tsx`) 항상 **마지막 두 콜론**에서 자릅니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Severity
// ============================================================================

/// 이슈 심각도
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    /// ESLint 숫자 심각도 (2 = error, 1 = warn)
    pub fn from_eslint(level: u64) -> Self {
        match level {
            2 => Self::Error,
            1 => Self::Warning,
            _ => Self::Info,
        }
    }

    /// 문자열 심각도 ("error", "warn", "warning", ...)
    pub fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "error" | "err" => Self::Error,
            "warn" | "warning" => Self::Warning,
            _ => Self::Info,
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Self::Warning
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

// ============================================================================
// LocationKey
// ============================================================================

/// 위치 키 파싱 에러
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseLocationError {
    #[error("location key '{0}' is missing line/column segments")]
    MissingSegments(String),

    #[error("location key '{key}' has a non-numeric {segment}")]
    NotNumeric { key: String, segment: &'static str },

    #[error("location key '{0}' has an empty resource")]
    EmptyResource(String),
}

/// `resource:line:column` 위치 키
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationKey {
    pub resource: String,
    pub line: u32,
    pub column: u32,
}

impl LocationKey {
    pub fn new(resource: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            resource: resource.into(),
            line,
            column,
        }
    }

    pub fn parse(key: &str) -> Result<Self, ParseLocationError> {
        let mut parts = key.rsplitn(3, ':');
        let column = parts.next();
        let line = parts.next();
        let resource = parts.next();

        let (Some(column), Some(line), Some(resource)) = (column, line, resource) else {
            return Err(ParseLocationError::MissingSegments(key.to_string()));
        };

        let line = line.parse().map_err(|_| ParseLocationError::NotNumeric {
            key: key.to_string(),
            segment: "line",
        })?;
        let column = column.parse().map_err(|_| ParseLocationError::NotNumeric {
            key: key.to_string(),
            segment: "column",
        })?;
        if resource.is_empty() {
            return Err(ParseLocationError::EmptyResource(key.to_string()));
        }

        Ok(Self::new(resource, line, column))
    }

    /// 위치 키에서 resource 부분만 추출
    pub fn resource_of(key: &str) -> Option<String> {
        Self::parse(key).ok().map(|loc| loc.resource)
    }

    pub fn to_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.resource, self.line, self.column)
    }
}

impl FromStr for LocationKey {
    type Err = ParseLocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ============================================================================
// Issue
// ============================================================================

/// 플러그인이 보고하는 정규화된 이슈
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub severity: Severity,

    /// 사람이 읽는 메시지
    pub message: String,

    /// 위치 키 (resource 단위 이슈는 resource 자체)
    pub location_key: String,

    /// 소유 룰 ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,

    /// 보고한 플러그인 ID
    pub plugin_id: String,
}

impl Issue {
    pub fn new(
        plugin_id: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        location_key: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            message: message.into(),
            location_key: location_key.into(),
            rule_id: None,
            plugin_id: plugin_id.into(),
        }
    }

    pub fn with_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }
}

// ============================================================================
// RuleMeta
// ============================================================================

/// 룰 메타데이터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleMeta {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// 거친 소유권 분류 (예: "static", "semantic")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default)]
    pub default_severity: Severity,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,
}

impl RuleMeta {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: String::new(),
            category: None,
            default_severity: Severity::default(),
            docs_url: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
