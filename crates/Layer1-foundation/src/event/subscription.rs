//! Subscription handles and ordered handler sets

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static HANDLER_COUNTER: AtomicU64 = AtomicU64::new(1);

/// 핸들러 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

impl HandlerId {
    pub(crate) fn next() -> Self {
        Self(HANDLER_COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl std::fmt::Display for HandlerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "handler-{}", self.0)
    }
}

/// 구독 해제 핸들
///
/// `unsubscribe`를 호출해야 해제됩니다. drop만으로는 해제되지 않으므로
/// 반환값을 버리면 구독은 소스가 살아있는 동안 유지됩니다.
pub struct Subscription {
    id: Option<HandlerId>,
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new(id: HandlerId, release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            id: Some(id),
            release: Some(Box::new(release)),
        }
    }

    /// 아무것도 하지 않는 구독
    pub fn noop() -> Self {
        Self {
            id: None,
            release: None,
        }
    }

    pub fn id(&self) -> Option<HandlerId> {
        self.id
    }

    /// 구독 해제
    pub fn unsubscribe(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// 등록 순서를 유지하는 핸들러 집합
pub(crate) struct HandlerSet<H: ?Sized> {
    entries: Vec<(HandlerId, Arc<H>)>,
}

impl<H: ?Sized> HandlerSet<H> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, id: HandlerId, handler: Arc<H>) {
        self.entries.push((id, handler));
    }

    pub(crate) fn remove(&mut self, id: HandlerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// 호출용 스냅샷 (락 밖에서 호출하기 위해)
    pub(crate) fn snapshot(&self) -> Vec<Arc<H>> {
        self.entries.iter().map(|(_, h)| Arc::clone(h)).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_handler_set_keeps_order() {
        let mut set: HandlerSet<dyn Fn() -> u32 + Send + Sync> = HandlerSet::new();
        let first = HandlerId::next();
        let second = HandlerId::next();
        set.insert(first, Arc::new(|| 1));
        set.insert(second, Arc::new(|| 2));

        let results: Vec<u32> = set.snapshot().iter().map(|h| h()).collect();
        assert_eq!(results, vec![1, 2]);

        assert!(set.remove(first));
        assert!(!set.remove(first));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_unsubscribe_runs_release_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let sub = Subscription::new(HandlerId::next(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sub.unsubscribe();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        Subscription::noop().unsubscribe();
    }
}
