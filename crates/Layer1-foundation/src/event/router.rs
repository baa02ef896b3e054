//! Message Router - 메시지 타입별 구독/전달
//!
//! 정확한 타입 키와 와일드카드(`"*"`) 키로 핸들러를 보관합니다.
//! 전달 순서: 정확한 타입 핸들러(등록 순) → 와일드카드 핸들러(등록 순).

use super::message::RemoteMessage;
use super::subscription::{HandlerId, HandlerSet, Subscription};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// 모든 메시지를 받는 키
pub const WILDCARD: &str = "*";

/// 메시지 핸들러
pub type MessageHandler = dyn Fn(&RemoteMessage) + Send + Sync;

type HandlerMap = HashMap<String, HandlerSet<MessageHandler>>;

/// 메시지 라우터
#[derive(Clone, Default)]
pub struct MessageRouter {
    handlers: Arc<RwLock<HandlerMap>>,
}

impl MessageRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 메시지 타입 구독
    pub fn on<F>(&self, message_type: impl Into<String>, handler: F) -> Subscription
    where
        F: Fn(&RemoteMessage) + Send + Sync + 'static,
    {
        let message_type = message_type.into();
        let id = HandlerId::next();

        self.handlers
            .write()
            .entry(message_type.clone())
            .or_insert_with(HandlerSet::new)
            .insert(id, Arc::new(handler));

        debug!(message_type = %message_type, handler_id = %id, "Subscribed to message type");

        let weak: Weak<RwLock<HandlerMap>> = Arc::downgrade(&self.handlers);
        Subscription::new(id, move || {
            if let Some(handlers) = weak.upgrade() {
                remove_handler(&handlers, &message_type, id);
            }
        })
    }

    /// 모든 메시지 구독
    pub fn on_any<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&RemoteMessage) + Send + Sync + 'static,
    {
        self.on(WILDCARD, handler)
    }

    /// 메시지 전달, 호출된 핸들러 수 반환
    pub fn dispatch(&self, message: &RemoteMessage) -> usize {
        let targets = {
            let handlers = self.handlers.read();
            let mut targets = handlers
                .get(&message.message_type)
                .map(HandlerSet::snapshot)
                .unwrap_or_default();
            if message.message_type != WILDCARD {
                if let Some(wildcard) = handlers.get(WILDCARD) {
                    targets.extend(wildcard.snapshot());
                }
            }
            targets
        };

        trace!(
            message_type = %message.message_type,
            handler_count = targets.len(),
            "Dispatching message"
        );

        for handler in &targets {
            handler(message);
        }
        targets.len()
    }

    /// 특정 타입 핸들러 수
    pub fn handler_count(&self, message_type: &str) -> usize {
        self.handlers
            .read()
            .get(message_type)
            .map(HandlerSet::len)
            .unwrap_or(0)
    }

    /// 핸들러가 남아있는 타입 수
    pub fn type_count(&self) -> usize {
        self.handlers.read().len()
    }
}

fn remove_handler(handlers: &RwLock<HandlerMap>, message_type: &str, id: HandlerId) {
    let mut handlers = handlers.write();
    let now_empty = match handlers.get_mut(message_type) {
        Some(set) => {
            set.remove(id);
            set.is_empty()
        }
        None => false,
    };
    if now_empty {
        handlers.remove(message_type);
    }
    debug!(message_type, handler_id = %id, "Unsubscribed from message type");
}

impl std::fmt::Debug for MessageRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageRouter")
            .field("types", &self.type_count())
            .finish()
    }
}
