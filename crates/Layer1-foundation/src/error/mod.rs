//! Error types for UILint
//!
//! 모든 에러를 중앙에서 관리

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// UILint 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 플러그인 관련
    // ========================================================================
    #[error("Plugin {plugin_id} failed to initialize: {message}")]
    PluginInit { plugin_id: String, message: String },

    #[error("Plugin {plugin_id} failed to dispose: {message}")]
    PluginDispose { plugin_id: String, message: String },

    // ========================================================================
    // 메시지/채널 관련
    // ========================================================================
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    // ========================================================================
    // 상태 관련
    // ========================================================================
    #[error("State error: {slice} - {message}")]
    State { slice: String, message: String },

    // ========================================================================
    // 매니페스트 관련
    // ========================================================================
    #[error("Manifest error: {0}")]
    Manifest(String),

    // ========================================================================
    // 일반
    // ========================================================================
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),
}

impl Error {
    /// 사용자 입력(설정, 매니페스트 위치/내용)이 원인인 에러인지 확인
    ///
    /// CLI는 이 에러를 한 줄 메시지로만 보여줍니다.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::Config(_)
                | Error::Manifest(_)
                | Error::InvalidInput(_)
                | Error::Io(_)
                | Error::Http(_)
        )
    }

    /// 플러그인 초기화 에러 생성 헬퍼
    pub fn plugin_init(plugin_id: impl Into<String>, message: impl Into<String>) -> Self {
        Error::PluginInit {
            plugin_id: plugin_id.into(),
            message: message.into(),
        }
    }

    /// 플러그인 해제 에러 생성 헬퍼
    pub fn plugin_dispose(plugin_id: impl Into<String>, message: impl Into<String>) -> Self {
        Error::PluginDispose {
            plugin_id: plugin_id.into(),
            message: message.into(),
        }
    }

    /// 상태 에러 생성 헬퍼
    pub fn state(slice: impl Into<String>, message: impl Into<String>) -> Self {
        Error::State {
            slice: slice.into(),
            message: message.into(),
        }
    }
}
