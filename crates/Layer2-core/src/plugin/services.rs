//! Services - 플러그인에 주입되는 호스트 기능 묶음
//!
//! 플러그인은 서로를 직접 참조하지 않고 `Services`만 통해 상호작용합니다:
//!
//! - 공유 상태: `get_state` / `set_state` (slice 단위 얕은 병합, last-write-wins),
//!   `update_state` (읽기-변경-쓰기를 한 락 안에서)
//! - 원격 메시지: `on_message(type)` / `on_any_message` / `send`
//! - 연결 상태: `on_connection_change` (구독 즉시 현재 상태를 한 번 전달)
//! - 페이지 요소: `on_elements_added` / `on_elements_removed`
//! - UI 액션: `open_inspector` / `close_command_palette`
//!
//! 호스트 쪽은 `ServiceHub`로 이벤트를 밀어 넣습니다.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use uilint_foundation::{
    ConnectionSignal, ElementDescriptor, ElementObserver, MessageRouter, NullSink,
    OutboundRequest, OutboundSink, RemoteMessage, Result, StateStore, Subscription,
};

// ============================================================================
// UI Actions
// ============================================================================

/// 인스펙터를 열 대상
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum InspectorRequest {
    /// 페이지 요소
    #[serde(rename_all = "camelCase")]
    Element { element_id: String },

    /// 룰 상세
    #[serde(rename_all = "camelCase")]
    Rule { rule_id: String },

    /// 소스 위치
    #[serde(rename_all = "camelCase")]
    Location { location_key: String },
}

/// 호스트 UI 제어
pub trait UiActions: Send + Sync {
    fn open_inspector(&self, request: InspectorRequest);
    fn close_command_palette(&self);
}

/// 아무것도 하지 않는 UI (CLI, 테스트)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopUi;

impl UiActions for NoopUi {
    fn open_inspector(&self, request: InspectorRequest) {
        debug!(?request, "open_inspector ignored (no UI)");
    }

    fn close_command_palette(&self) {
        debug!("close_command_palette ignored (no UI)");
    }
}

// ============================================================================
// Services - 플러그인 측 façade
// ============================================================================

struct ServicesInner {
    state: StateStore,
    router: MessageRouter,
    connection: ConnectionSignal,
    elements: ElementObserver,
    sink: Arc<dyn OutboundSink>,
    ui: Arc<dyn UiActions>,
}

/// 플러그인에 주입되는 façade (clone은 같은 호스트를 가리킴)
#[derive(Clone)]
pub struct Services {
    inner: Arc<ServicesInner>,
}

impl Services {
    fn from_parts(sink: Arc<dyn OutboundSink>, ui: Arc<dyn UiActions>) -> Self {
        Self {
            inner: Arc::new(ServicesInner {
                state: StateStore::new(),
                router: MessageRouter::new(),
                connection: ConnectionSignal::new(false),
                elements: ElementObserver::new(),
                sink,
                ui,
            }),
        }
    }

    // === State ===

    /// slice 읽기 (없거나 형식이 다르면 기본값)
    pub fn get_state<T: DeserializeOwned + Default>(&self, slice: &str) -> T {
        self.inner.state.get_state(slice)
    }

    pub fn try_get_state<T: DeserializeOwned>(&self, slice: &str) -> Result<Option<T>> {
        self.inner.state.try_get_state(slice)
    }

    /// slice에 부분 객체 병합
    pub fn set_state<P: Serialize + ?Sized>(&self, slice: &str, partial: &P) -> Result<()> {
        self.inner.state.set_state(slice, partial)
    }

    /// 현재 slice에서 다음 값을 계산해 한 번에 쓰기 (`StateStore::update_state`)
    pub fn update_state<T, R, F>(&self, slice: &str, f: F) -> Result<Option<R>>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut T) -> Option<R>,
    {
        self.inner.state.update_state(slice, f)
    }

    pub fn remove_state(&self, slice: &str) -> bool {
        self.inner.state.remove_slice(slice)
    }

    pub fn state(&self) -> &StateStore {
        &self.inner.state
    }

    // === Remote messages ===

    /// 메시지 타입 구독 ("*"는 모든 타입)
    pub fn on_message<F>(&self, message_type: impl Into<String>, handler: F) -> Subscription
    where
        F: Fn(&RemoteMessage) + Send + Sync + 'static,
    {
        self.inner.router.on(message_type, handler)
    }

    pub fn on_any_message<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&RemoteMessage) + Send + Sync + 'static,
    {
        self.inner.router.on_any(handler)
    }

    /// 원격 채널로 요청 전송
    pub fn send(&self, request: OutboundRequest) -> Result<()> {
        debug!(
            message_type = %request.message_type,
            request_id = %request.request_id,
            "Sending outbound request"
        );
        self.inner.sink.send(request)
    }

    // === Connection ===

    /// 연결 상태 구독 (현재 상태를 즉시 한 번 전달)
    pub fn on_connection_change<F>(&self, handler: F) -> Subscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.inner.connection.subscribe(handler)
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connection.is_connected()
    }

    // === Elements ===

    pub fn on_elements_added<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&[ElementDescriptor]) + Send + Sync + 'static,
    {
        self.inner.elements.on_added(handler)
    }

    pub fn on_elements_removed<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&[ElementDescriptor]) + Send + Sync + 'static,
    {
        self.inner.elements.on_removed(handler)
    }

    // === UI ===

    pub fn open_inspector(&self, request: InspectorRequest) {
        self.inner.ui.open_inspector(request);
    }

    pub fn close_command_palette(&self) {
        self.inner.ui.close_command_palette();
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("connected", &self.is_connected())
            .field("message_types", &self.inner.router.type_count())
            .finish()
    }
}

// ============================================================================
// ServiceHub - 호스트 측
// ============================================================================

/// 호스트가 이벤트를 밀어 넣는 쪽
pub struct ServiceHub {
    services: Services,
}

impl ServiceHub {
    /// NullSink + NoopUi
    pub fn new() -> Self {
        Self::with_parts(Arc::new(NullSink), Arc::new(NoopUi))
    }

    pub fn with_sink(sink: Arc<dyn OutboundSink>) -> Self {
        Self::with_parts(sink, Arc::new(NoopUi))
    }

    pub fn with_parts(sink: Arc<dyn OutboundSink>, ui: Arc<dyn UiActions>) -> Self {
        Self {
            services: Services::from_parts(sink, ui),
        }
    }

    /// 플러그인에 넘길 façade
    pub fn services(&self) -> Services {
        self.services.clone()
    }

    pub fn state(&self) -> &StateStore {
        self.services.state()
    }

    /// 수신 메시지 전달, 호출된 핸들러 수 반환
    pub fn deliver_message(&self, message: &RemoteMessage) -> usize {
        let delivered = self.services.inner.router.dispatch(message);
        if delivered == 0 {
            debug!(message_type = %message.message_type, "No handler for message");
        }
        delivered
    }

    /// JSON 텍스트 수신 (형식 오류는 로그 후 버림)
    pub fn deliver_raw(&self, text: &str) -> usize {
        match RemoteMessage::from_json(text) {
            Ok(message) => self.deliver_message(&message),
            Err(e) => {
                warn!(error = %e, "Dropping malformed message");
                0
            }
        }
    }

    /// 연결 상태 변경 (실제로 바뀐 경우 true)
    pub fn set_connected(&self, connected: bool) -> bool {
        self.services.inner.connection.set(connected)
    }

    pub fn elements_added(&self, elements: &[ElementDescriptor]) -> usize {
        self.services.inner.elements.emit_added(elements)
    }

    pub fn elements_removed(&self, elements: &[ElementDescriptor]) -> usize {
        self.services.inner.elements.emit_removed(elements)
    }
}

impl Default for ServiceHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uilint_foundation::ChannelSink;

    #[derive(Default)]
    struct RecordingUi {
        opened: Mutex<Vec<InspectorRequest>>,
        closed: AtomicUsize,
    }

    impl UiActions for RecordingUi {
        fn open_inspector(&self, request: InspectorRequest) {
            self.opened.lock().push(request);
        }

        fn close_command_palette(&self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_state_is_shared_between_clones() {
        let hub = ServiceHub::new();
        let a = hub.services();
        let b = hub.services();

        a.set_state("core", &json!({ "elementCount": 3 })).unwrap();
        let value: serde_json::Value = b.get_state("core");
        assert_eq!(value["elementCount"], 3);
    }

    #[test]
    fn test_deliver_routes_by_type() {
        let hub = ServiceHub::new();
        let services = hub.services();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        let _sub = services.on_message("lint:result", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(hub.deliver_message(&RemoteMessage::new("lint:result")), 1);
        assert_eq!(hub.deliver_message(&RemoteMessage::new("other")), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_deliver_raw_drops_malformed() {
        let hub = ServiceHub::new();
        let _sub = hub.services().on_any_message(|_| {});

        assert_eq!(hub.deliver_raw("not json"), 0);
        assert_eq!(hub.deliver_raw(r#"{"type":"ping"}"#), 1);
    }

    #[test]
    fn test_connection_replay_then_changes() {
        let hub = ServiceHub::new();
        hub.set_connected(true);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let _sub = hub
            .services()
            .on_connection_change(move |connected| log.lock().push(connected));

        hub.set_connected(false);
        assert_eq!(*seen.lock(), vec![true, false]);
    }

    #[test]
    fn test_send_goes_through_sink() {
        let (sink, mut rx) = ChannelSink::new();
        let hub = ServiceHub::with_sink(Arc::new(sink));

        hub.services()
            .send(OutboundRequest::new("lint:file").with("filePath", "src/App.tsx"))
            .unwrap();

        let request = rx.try_recv().unwrap();
        assert_eq!(request.message_type, "lint:file");
        assert_eq!(request.get_str("filePath"), Some("src/App.tsx"));
    }

    #[test]
    fn test_ui_actions_forwarded() {
        let ui = Arc::new(RecordingUi::default());
        let hub = ServiceHub::with_parts(Arc::new(NullSink), ui.clone());
        let services = hub.services();

        services.open_inspector(InspectorRequest::Rule {
            rule_id: "no-unused-vars".to_string(),
        });
        services.close_command_palette();

        assert_eq!(ui.opened.lock().len(), 1);
        assert_eq!(ui.closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_element_batches() {
        let hub = ServiceHub::new();
        let count = Arc::new(AtomicUsize::new(0));

        let added = Arc::clone(&count);
        let _sub = hub
            .services()
            .on_elements_added(move |batch| {
                added.fetch_add(batch.len(), Ordering::SeqCst);
            });

        hub.elements_added(&[
            ElementDescriptor::new("el-1", "src/App.tsx:1:1"),
            ElementDescriptor::new("el-2", "src/App.tsx:2:1"),
        ]);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
