//! Event Delivery - 호스트와 플러그인 사이의 이벤트 전달
//!
//! 세 가지 이벤트 소스와 송신 경로를 제공합니다:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  remote channel ──▶ MessageRouter  (type / "*" 키)          │
//! │  connection     ──▶ ConnectionSignal (구독 시 현재 상태 replay) │
//! │  page mutations ──▶ ElementObserver (added / removed 배치)   │
//! │                                                            │
//! │  plugins ──▶ OutboundSink ──▶ remote channel               │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! 모든 구독은 `Subscription`을 반환하며, `unsubscribe()`로 해제합니다.
//! 핸들러는 락을 잡지 않은 상태에서 등록 순서대로 호출됩니다.

pub mod connection;
pub mod elements;
pub mod message;
pub mod router;
pub mod sink;
pub mod subscription;

pub use connection::{ConnectionHandler, ConnectionSignal};
pub use elements::{ElementDescriptor, ElementObserver, ElementsHandler};
pub use message::{OutboundRequest, RemoteMessage};
pub use router::{MessageHandler, MessageRouter, WILDCARD};
pub use sink::{ChannelSink, NullSink, OutboundSink};
pub use subscription::{HandlerId, Subscription};
