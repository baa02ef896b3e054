//! # uilint-foundation
//!
//! Foundation layer for UILint:
//! - Error: 공통 에러 타입
//! - Config: 통합 설정 (UilintConfig)
//! - State: 플러그인 공유 상태 (slice 단위 얕은 병합)
//! - Event: 원격 메시지 / 연결 상태 / 페이지 요소 이벤트 전달
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Host (overlay / CLI)                                    │
//! │     │ messages      │ connection     │ element batches   │
//! │     ▼               ▼                ▼                   │
//! │  MessageRouter  ConnectionSignal  ElementObserver        │
//! │          \            |             /                    │
//! │           ──────  plugin handlers ──                     │
//! │                       │                                  │
//! │                       ▼                                  │
//! │                  StateStore (slices)                     │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod state;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{UilintConfig, ENV_MANIFEST, ENV_SERVER_URL, UILINT_CONFIG_FILE};

// ============================================================================
// State (공유 상태)
// ============================================================================
pub use state::StateStore;

// ============================================================================
// Event (이벤트 전달)
// ============================================================================
pub use event::{
    // Channel
    ChannelSink,
    NullSink,
    OutboundRequest,
    OutboundSink,
    RemoteMessage,
    // Routing
    MessageRouter,
    WILDCARD,
    // Connection
    ConnectionSignal,
    // Elements
    ElementDescriptor,
    ElementObserver,
    // Subscription
    HandlerId,
    Subscription,
};
