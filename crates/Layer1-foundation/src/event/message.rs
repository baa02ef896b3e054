//! Remote channel message shapes
//!
//! Inbound: `{ "type": "...", ...payload }`
//! Outbound: `{ "type": "...", "requestId": "...", ...params }`

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 원격 채널에서 들어온 메시지
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteMessage {
    /// 메시지 타입 (라우팅 키)
    #[serde(rename = "type")]
    pub message_type: String,

    /// 나머지 필드
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl RemoteMessage {
    pub fn new(message_type: impl Into<String>) -> Self {
        Self {
            message_type: message_type.into(),
            payload: Map::new(),
        }
    }

    /// payload 필드 추가 (빌더)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// JSON 텍스트 파싱
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::InvalidMessage(e.to_string()))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.payload
            .get(key)
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
    }

    /// payload 전체를 타입으로 변환
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.payload.clone())).map_err(|e| {
            Error::InvalidMessage(format!("{} payload: {}", self.message_type, e))
        })
    }
}

/// 원격 채널로 나가는 요청
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundRequest {
    #[serde(rename = "type")]
    pub message_type: String,

    /// 클라이언트 측 상관관계용 ID (서버 응답에 포함된다는 보장은 없음)
    pub request_id: String,

    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl OutboundRequest {
    pub fn new(message_type: impl Into<String>) -> Self {
        Self {
            message_type: message_type.into(),
            request_id: uuid::Uuid::new_v4().to_string(),
            params: Map::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inbound() {
        let msg = RemoteMessage::from_json(
            r#"{"type":"lint:result","filePath":"src/App.tsx","issues":[]}"#,
        )
        .unwrap();

        assert_eq!(msg.message_type, "lint:result");
        assert_eq!(msg.get_str("filePath"), Some("src/App.tsx"));
        assert!(msg.get("issues").unwrap().is_array());
    }

    #[test]
    fn test_parse_missing_type_is_invalid() {
        let err = RemoteMessage::from_json(r#"{"filePath":"a"}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidMessage(_)));
    }

    #[test]
    fn test_outbound_shape() {
        let req = OutboundRequest::new("lint:file").with("filePath", "src/App.tsx");
        let json: Value = serde_json::from_str(&req.to_json().unwrap()).unwrap();

        assert_eq!(json["type"], "lint:file");
        assert_eq!(json["filePath"], "src/App.tsx");
        assert!(!json["requestId"].as_str().unwrap().is_empty());
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = OutboundRequest::new("lint:file");
        let b = OutboundRequest::new("lint:file");
        assert_ne!(a.request_id, b.request_id);
    }
}
