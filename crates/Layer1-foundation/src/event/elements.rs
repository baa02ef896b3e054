//! Element Observer - 페이지 요소 추가/제거 배치 구독
//!
//! 연결 상태와 달리 구독 시 replay하지 않습니다.

use super::subscription::{HandlerId, HandlerSet, Subscription};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use tracing::trace;

/// 페이지에서 감지된 요소
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDescriptor {
    /// 안정적인 요소 ID
    pub id: String,

    /// `resource:line:column` 형식의 위치 키
    pub location_key: String,

    /// 태그 이름 (선택)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
}

impl ElementDescriptor {
    pub fn new(id: impl Into<String>, location_key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            location_key: location_key.into(),
            tag_name: None,
        }
    }

    pub fn with_tag(mut self, tag_name: impl Into<String>) -> Self {
        self.tag_name = Some(tag_name.into());
        self
    }
}

/// 요소 배치 핸들러
pub type ElementsHandler = dyn Fn(&[ElementDescriptor]) + Send + Sync;

type SharedSet = Arc<Mutex<HandlerSet<ElementsHandler>>>;

/// 요소 변경 옵저버
#[derive(Clone)]
pub struct ElementObserver {
    added: SharedSet,
    removed: SharedSet,
}

impl ElementObserver {
    pub fn new() -> Self {
        Self {
            added: Arc::new(Mutex::new(HandlerSet::new())),
            removed: Arc::new(Mutex::new(HandlerSet::new())),
        }
    }

    /// 추가 배치 구독
    pub fn on_added<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&[ElementDescriptor]) + Send + Sync + 'static,
    {
        subscribe(&self.added, Arc::new(handler))
    }

    /// 제거 배치 구독
    pub fn on_removed<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&[ElementDescriptor]) + Send + Sync + 'static,
    {
        subscribe(&self.removed, Arc::new(handler))
    }

    /// 추가 배치 전달
    pub fn emit_added(&self, elements: &[ElementDescriptor]) -> usize {
        emit(&self.added, elements, "added")
    }

    /// 제거 배치 전달
    pub fn emit_removed(&self, elements: &[ElementDescriptor]) -> usize {
        emit(&self.removed, elements, "removed")
    }

    pub fn subscriber_count(&self) -> usize {
        self.added.lock().len() + self.removed.lock().len()
    }
}

impl Default for ElementObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ElementObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementObserver")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

fn subscribe(set: &SharedSet, handler: Arc<ElementsHandler>) -> Subscription {
    let id = HandlerId::next();
    set.lock().insert(id, handler);

    let weak: Weak<Mutex<HandlerSet<ElementsHandler>>> = Arc::downgrade(set);
    Subscription::new(id, move || {
        if let Some(set) = weak.upgrade() {
            set.lock().remove(id);
        }
    })
}

fn emit(set: &SharedSet, elements: &[ElementDescriptor], kind: &str) -> usize {
    if elements.is_empty() {
        return 0;
    }
    let targets = set.lock().snapshot();
    trace!(kind, batch = elements.len(), handlers = targets.len(), "Emitting element batch");
    for handler in &targets {
        handler(elements);
    }
    targets.len()
}
