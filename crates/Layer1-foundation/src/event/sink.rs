//! Outbound sinks - 원격 채널로 요청 내보내기

use super::message::OutboundRequest;
use crate::{Error, Result};
use tokio::sync::mpsc;
use tracing::debug;

/// 원격 채널 송신 인터페이스
///
/// 호스트가 실제 전송(WebSocket 등)을 담당합니다.
pub trait OutboundSink: Send + Sync {
    fn send(&self, request: OutboundRequest) -> Result<()>;
}

/// mpsc 채널 기반 sink
///
/// 호스트는 receiver를 읽어 실제 연결로 전달합니다.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<OutboundRequest>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl OutboundSink for ChannelSink {
    fn send(&self, request: OutboundRequest) -> Result<()> {
        self.tx
            .send(request)
            .map_err(|e| Error::ChannelClosed(format!("outbound {}", e.0.message_type)))
    }
}

/// 연결이 없을 때 사용하는 sink (로그만 남김)
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl OutboundSink for NullSink {
    fn send(&self, request: OutboundRequest) -> Result<()> {
        debug!(
            message_type = %request.message_type,
            request_id = %request.request_id,
            "No remote channel, dropping outbound request"
        );
        Ok(())
    }
}
