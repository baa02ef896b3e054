//! Connection Signal - 연결 상태 구독
//!
//! 구독 즉시 현재 상태로 핸들러를 한 번 동기 호출한 뒤(replay-on-subscribe),
//! 이후 상태가 바뀔 때마다 호출합니다. 같은 값으로의 `set`은 전달하지 않습니다.
//!
//! 전달은 `dispatch` 락으로 직렬화되어 구독자는 replay 다음에 그 이후의 변경만
//! 순서대로 받습니다. 같은 스레드의 재진입(핸들러 안의 구독/설정)은 허용됩니다.

use super::subscription::{HandlerId, HandlerSet, Subscription};
use parking_lot::{Mutex, ReentrantMutex};
use std::sync::{Arc, Weak};
use tracing::{debug, info};

/// 연결 상태 핸들러
pub type ConnectionHandler = dyn Fn(bool) + Send + Sync;

struct SignalState {
    connected: bool,
    handlers: HandlerSet<ConnectionHandler>,
}

/// 연결 상태 신호
#[derive(Clone)]
pub struct ConnectionSignal {
    state: Arc<Mutex<SignalState>>,
    dispatch: Arc<ReentrantMutex<()>>,
}

impl ConnectionSignal {
    pub fn new(connected: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(SignalState {
                connected,
                handlers: HandlerSet::new(),
            })),
            dispatch: Arc::new(ReentrantMutex::new(())),
        }
    }

    /// 현재 연결 상태
    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    /// 상태 변경 구독 (현재 상태를 즉시 한 번 전달)
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let id = HandlerId::next();
        let handler: Arc<ConnectionHandler> = Arc::new(handler);

        let order = self.dispatch.lock();
        let current = {
            let mut state = self.state.lock();
            state.handlers.insert(id, Arc::clone(&handler));
            state.connected
        };

        // 상태 락 밖에서 호출해야 핸들러 안에서 재구독/해제가 가능
        handler(current);
        drop(order);

        let weak: Weak<Mutex<SignalState>> = Arc::downgrade(&self.state);
        Subscription::new(id, move || {
            if let Some(state) = weak.upgrade() {
                state.lock().handlers.remove(id);
                debug!(handler_id = %id, "Unsubscribed from connection changes");
            }
        })
    }

    /// 상태 설정, 실제로 바뀐 경우에만 전달
    pub fn set(&self, connected: bool) -> bool {
        let _order = self.dispatch.lock();
        let targets = {
            let mut state = self.state.lock();
            if state.connected == connected {
                return false;
            }
            state.connected = connected;
            state.handlers.snapshot()
        };

        info!(connected, subscribers = targets.len(), "Connection state changed");

        for handler in &targets {
            handler(connected);
        }
        true
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.lock().handlers.len()
    }
}

impl Default for ConnectionSignal {
    fn default() -> Self {
        Self::new(false)
    }
}

impl std::fmt::Debug for ConnectionSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSignal")
            .field("connected", &self.is_connected())
            .finish()
    }
}
