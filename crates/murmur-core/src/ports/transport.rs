//! ChannelTransport port - topic 単位の pub/sub 接続
//!
//! 接続確立・認証ハンドシェイク・再接続は実装側の責務です。
//! このクレートは join / push / 受信ストリームだけを使います。
//!
//! # 設計原則
//! - 受信は `subscribe()` が返す単一の mpsc ストリーム（イベント名ごとの callback は持たない）
//! - `push()` は即座に返り、応答は `PendingReply` で後から受け取る
//!
//! # 実装
//! - **LoopbackTransport**: 開発・テスト用のインメモリ実装（`impls::loopback`）

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::domain::{ChannelMessage, Topic};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("channel transport closed")]
    Closed,

    #[error("reply was dropped before it arrived")]
    ReplyDropped,

    #[error("no reply within {0:?}")]
    Timeout(Duration),

    #[error("topic {0} has not been joined")]
    NotJoined(Topic),
}

/// Server reply to a join or push (`ok` / `error` status with a payload).
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Ok(Value),
    Error(Value),
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Ok(Value::Object(Default::default()))
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Reply::Error(serde_json::json!({ "reason": reason.into() }))
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Ok(_))
    }

    pub fn payload(&self) -> &Value {
        match self {
            Reply::Ok(v) | Reply::Error(v) => v,
        }
    }

    /// Human readable reason: the `reason` field when present, the raw payload otherwise.
    pub fn reason(&self) -> String {
        match self.payload().get("reason").and_then(Value::as_str) {
            Some(reason) => reason.to_string(),
            None => self.payload().to_string(),
        }
    }
}

/// Reply that has not arrived yet.
#[derive(Debug)]
pub struct PendingReply {
    rx: oneshot::Receiver<Reply>,
    timeout: Option<Duration>,
}

impl PendingReply {
    pub fn new(rx: oneshot::Receiver<Reply>) -> Self {
        Self { rx, timeout: None }
    }

    /// A reply that is already known (the transport answered synchronously).
    pub fn resolved(reply: Reply) -> Self {
        let (tx, rx) = oneshot::channel();
        // the receiver is alive right here
        let _ = tx.send(reply);
        Self::new(rx)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub async fn wait(self) -> Result<Reply, TransportError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.rx)
                .await
                .map_err(|_| TransportError::Timeout(limit))?
                .map_err(|_| TransportError::ReplyDropped),
            None => self.rx.await.map_err(|_| TransportError::ReplyDropped),
        }
    }
}

/// ChannelTransport は 1 本の pub/sub 接続
///
/// # Thread Safety
/// - `Send + Sync` を要求（dispatcher と session から共有する）
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    /// Register interest in a topic and get its inbound stream.
    ///
    /// Subscribing before joining means no broadcast is lost between join and setup.
    /// `capacity` bounds the buffer. When it is full the transport waits for the
    /// consumer; messages are never dropped.
    fn subscribe(
        &self,
        topic: &Topic,
        capacity: usize,
    ) -> Result<mpsc::Receiver<ChannelMessage>, TransportError>;

    /// Join a topic; the reply says whether the server accepted us.
    async fn join(&self, topic: &Topic) -> Result<Reply, TransportError>;

    /// Send one event. Returns as soon as the message is handed over.
    fn push(&self, topic: &Topic, message: ChannelMessage) -> Result<PendingReply, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reason_prefers_reason_field() {
        assert_eq!(Reply::error("unauthorized").reason(), "unauthorized");
        assert_eq!(Reply::Error(json!({"code": 7})).reason(), "{\"code\":7}");
        assert!(Reply::ok().is_ok());
    }

    #[tokio::test]
    async fn resolved_reply_is_immediately_available() {
        let reply = PendingReply::resolved(Reply::ok()).wait().await.unwrap();
        assert!(reply.is_ok());
    }

    #[tokio::test]
    async fn dropped_sender_is_reported() {
        let (tx, rx) = oneshot::channel::<Reply>();
        drop(tx);
        let err = PendingReply::new(rx).wait().await.unwrap_err();
        assert_eq!(err, TransportError::ReplyDropped);
    }

    #[tokio::test]
    async fn reply_times_out() {
        let (_tx, rx) = oneshot::channel::<Reply>();
        let limit = Duration::from_millis(20);
        let err = PendingReply::new(rx).with_timeout(limit).wait().await.unwrap_err();
        assert_eq!(err, TransportError::Timeout(limit));
    }
}
