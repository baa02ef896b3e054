//! Shared State Store - 플러그인 공유 상태
//!
//! 플러그인마다 하나의 slice(이름 있는 JSON 객체)를 가집니다.
//! `set_state`는 partial 객체의 최상위 필드를 slice에 얕게 병합합니다
//! (last-write-wins, 트랜잭션 없음).
//!
//! 현재 값에서 다음 값을 계산하는 갱신은 `update_state`를 씁니다.
//! 읽기, 변경, 쓰기가 하나의 쓰기 락 안에서 일어나므로 동시에 들어온
//! 갱신이 서로를 덮어쓰지 않습니다. `get_state` 후 `set_state`로 나눠 쓰면
//! 그 사이의 갱신이 사라질 수 있습니다.

use crate::{Error, Result};
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{trace, warn};

/// 공유 상태 저장소
#[derive(Debug, Default)]
pub struct StateStore {
    /// slice 이름 -> JSON 객체
    slices: RwLock<HashMap<String, Value>>,

    /// 적용된 `set_state` 호출 수
    update_count: AtomicU64,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// slice를 타입으로 읽기
    ///
    /// slice가 없거나 역직렬화에 실패하면 `T::default()`를 반환합니다.
    pub fn get_state<T: DeserializeOwned + Default>(&self, slice: &str) -> T {
        match self.try_get_state(slice) {
            Ok(Some(state)) => state,
            Ok(None) => T::default(),
            Err(e) => {
                warn!(slice, error = %e, "Failed to decode state slice, using default");
                T::default()
            }
        }
    }

    /// slice를 타입으로 읽기 (에러 전파)
    pub fn try_get_state<T: DeserializeOwned>(&self, slice: &str) -> Result<Option<T>> {
        let value = self.slices.read().get(slice).cloned();
        match value {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| Error::state(slice, e.to_string())),
            None => Ok(None),
        }
    }

    /// partial 객체를 slice에 병합
    pub fn set_state<P: Serialize + ?Sized>(&self, slice: &str, partial: &P) -> Result<()> {
        let fields = object_fields(slice, partial)?;
        merge_fields(&mut self.slices.write(), slice, fields);
        self.update_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// slice를 쓰기 락 안에서 읽고 바꾸고 병합
    ///
    /// 클로저가 `None`을 반환하면 아무것도 쓰지 않고 갱신 수도 그대로입니다.
    /// 클로저 안에서 같은 저장소를 다시 호출하면 안 됩니다.
    pub fn update_state<T, R, F>(&self, slice: &str, f: F) -> Result<Option<R>>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut T) -> Option<R>,
    {
        let mut slices = self.slices.write();
        let mut state: T = match slices.get(slice) {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| Error::state(slice, e.to_string()))?,
            None => T::default(),
        };

        let Some(result) = f(&mut state) else {
            return Ok(None);
        };

        let fields = object_fields(slice, &state)?;
        merge_fields(&mut slices, slice, fields);
        drop(slices);

        self.update_count.fetch_add(1, Ordering::SeqCst);
        Ok(Some(result))
    }

    /// slice 전체 삭제
    pub fn remove_slice(&self, slice: &str) -> bool {
        self.slices.write().remove(slice).is_some()
    }

    /// slice 존재 여부
    pub fn has_slice(&self, slice: &str) -> bool {
        self.slices.read().contains_key(slice)
    }

    /// 지금까지 적용된 갱신 수
    pub fn update_count(&self) -> u64 {
        self.update_count.load(Ordering::SeqCst)
    }

    /// 전체 상태 스냅샷 (디버깅용)
    pub fn snapshot(&self) -> Value {
        let slices = self.slices.read();
        let map: Map<String, Value> = slices
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Value::Object(map)
    }
}

fn object_fields<P: Serialize + ?Sized>(slice: &str, partial: &P) -> Result<Map<String, Value>> {
    match serde_json::to_value(partial)? {
        Value::Object(fields) => Ok(fields),
        other => Err(Error::state(
            slice,
            format!("partial update must be an object, got {}", json_kind(&other)),
        )),
    }
}

fn merge_fields(slices: &mut HashMap<String, Value>, slice: &str, fields: Map<String, Value>) {
    let entry = slices
        .entry(slice.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    if let Value::Object(target) = entry {
        let field_count = fields.len();
        for (key, value) in fields {
            target.insert(key, value);
        }
        trace!(slice, field_count, "State slice updated");
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    #[serde(default, rename_all = "camelCase")]
    struct Counter {
        count: u32,
        label: String,
    }

    #[test]
    fn test_missing_slice_is_default() {
        let store = StateStore::new();
        let counter: Counter = store.get_state("counter");
        assert_eq!(counter, Counter::default());
        assert_eq!(store.update_count(), 0);
    }

    #[test]
    fn test_partial_merge_keeps_other_fields() {
        let store = StateStore::new();
        store
            .set_state("counter", &json!({ "count": 1, "label": "a" }))
            .unwrap();
        store.set_state("counter", &json!({ "count": 2 })).unwrap();

        let counter: Counter = store.get_state("counter");
        assert_eq!(counter.count, 2);
        assert_eq!(counter.label, "a");
        assert_eq!(store.update_count(), 2);
    }

    #[test]
    fn test_non_object_partial_rejected() {
        let store = StateStore::new();
        let err = store.set_state("counter", &json!([1, 2])).unwrap_err();
        assert!(matches!(err, Error::State { .. }));
        assert_eq!(store.update_count(), 0);
    }

    #[test]
    fn test_remove_slice() {
        let store = StateStore::new();
        store.set_state("counter", &json!({ "count": 5 })).unwrap();
        assert!(store.has_slice("counter"));
        assert!(store.remove_slice("counter"));
        assert!(!store.has_slice("counter"));
    }

    #[test]
    fn test_update_state_keeps_untouched_fields() {
        let store = StateStore::new();
        store
            .set_state("counter", &json!({ "count": 1, "label": "a", "extra": true }))
            .unwrap();

        let result = store
            .update_state("counter", |counter: &mut Counter| {
                counter.count += 1;
                Some(counter.count)
            })
            .unwrap();

        assert_eq!(result, Some(2));
        let value: Value = store.get_state("counter");
        assert_eq!(value, json!({ "count": 2, "label": "a", "extra": true }));
        assert_eq!(store.update_count(), 2);
    }

    #[test]
    fn test_update_state_none_skips_write() {
        let store = StateStore::new();
        let result = store
            .update_state("counter", |_: &mut Counter| None::<()>)
            .unwrap();

        assert!(result.is_none());
        assert!(!store.has_slice("counter"));
        assert_eq!(store.update_count(), 0);
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let store = Arc::new(StateStore::new());

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let store = Arc::clone(&store);
                scope.spawn(move || {
                    for _ in 0..100 {
                        store
                            .update_state("counter", |counter: &mut Counter| {
                                counter.count += 1;
                                Some(())
                            })
                            .unwrap();
                    }
                });
            }
        });

        let counter: Counter = store.get_state("counter");
        assert_eq!(counter.count, 800);
        assert_eq!(store.update_count(), 800);
    }
}
