//! LoopbackHub - 開発・テスト用のインメモリ channel サーバー
//!
//! # 学習ポイント
//! - Arc<Mutex<..>> で複数の接続から共有される状態
//! - push の処理（id 採番・権限チェック）は呼び出し順に同期的に行う
//! - broadcast は outbox に積み、配送タスクが順番に `send().await` で流す
//!   （購読者のバッファが一杯なら待つ。メッセージは捨てない）
//!
//! # 実装
//! 1. push: 状態を更新し、broadcast を outbox の末尾に積む
//! 2. 配送タスクを spawn（tokio Mutex で同時に 1 本だけ動く）
//! 3. 配送タスクは outbox が空になるまで先頭から配送する
//!
//! push と broadcast は Tokio runtime の中から呼ぶ必要があります。

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::{
    ApproveIntent, ApprovedPayload, ChannelMessage, Comment, CommentId, CreateIntent,
    CreatedPayload, DeleteIntent, DeletedPayload, EventName, Topic, Viewer,
};
use crate::ports::{ChannelTransport, PendingReply, Reply, TransportError};

#[derive(Default)]
struct HubState {
    subscribers: HashMap<Topic, Vec<mpsc::Sender<ChannelMessage>>>,
    comments: HashMap<Topic, Vec<Comment>>,
    pushed: HashMap<Topic, Vec<ChannelMessage>>,
    outbox: VecDeque<(Topic, ChannelMessage)>,
    next_comment_id: u64,
    auto_approve_privileged: bool,
    reject_joins: Option<String>,
    reject_pushes: Option<String>,
}

/// Accepted push: the reply payload and the broadcast it causes.
type Accepted = (Value, ChannelMessage);

impl HubState {
    /// Live senders for `topic`; closed ones are dropped on the way.
    fn senders(&mut self, topic: &Topic) -> Vec<mpsc::Sender<ChannelMessage>> {
        match self.subscribers.get_mut(topic) {
            Some(senders) => {
                senders.retain(|tx| !tx.is_closed());
                senders.clone()
            }
            None => Vec::new(),
        }
    }

    fn handle_push(&mut self, topic: &Topic, viewer: Viewer, message: &ChannelMessage) -> Reply {
        if let Some(reason) = &self.reject_pushes {
            return Reply::error(reason.clone());
        }
        let Ok(name) = message.event().parse::<EventName>() else {
            return Reply::error("unknown event");
        };
        if name.is_moderation() && !viewer.is_privileged() {
            return Reply::error("unauthorized");
        }

        let accepted = match name {
            EventName::Created => decode(message).and_then(|intent| self.create(topic, viewer, intent)),
            EventName::Approved => decode(message).and_then(|intent| self.approve(topic, intent)),
            EventName::Deleted => decode(message).and_then(|intent| self.delete(topic, intent)),
        };
        match accepted {
            Ok((payload, broadcast)) => {
                self.outbox.push_back((topic.clone(), broadcast));
                Reply::Ok(payload)
            }
            Err(reason) => Reply::error(reason),
        }
    }

    fn create(
        &mut self,
        topic: &Topic,
        viewer: Viewer,
        intent: CreateIntent,
    ) -> Result<Accepted, String> {
        if intent.author.trim().is_empty() || intent.body.trim().is_empty() {
            return Err("author and body are required".into());
        }

        self.next_comment_id += 1;
        let comment_id = self.next_comment_id;
        let comment = Comment::new(
            CommentId::from(comment_id),
            intent.post_id,
            intent.author,
            intent.body,
        )
        .inserted_at(Utc::now().to_rfc3339().as_str())
        .approved(viewer.is_privileged() && self.auto_approve_privileged);

        let payload = encode(&CreatedPayload::from(comment.clone()))?;
        self.comments.entry(topic.clone()).or_default().push(comment);

        Ok((
            json!({ "commentId": comment_id }),
            ChannelMessage::new(EventName::Created.as_str(), payload),
        ))
    }

    fn approve(&mut self, topic: &Topic, intent: ApproveIntent) -> Result<Accepted, String> {
        let comment = self
            .comments
            .get_mut(topic)
            .and_then(|comments| comments.iter_mut().find(|c| c.comment_id == intent.comment_id))
            .ok_or_else(|| "not found".to_string())?;
        comment.approved = true;
        comment.author = intent.author;
        comment.body = intent.body;

        let payload = encode(&ApprovedPayload {
            comment_id: comment.comment_id.clone(),
            author: comment.author.clone(),
            body: comment.body.clone(),
            inserted_at: Some(comment.inserted_at.clone()),
            post_id: Some(comment.post_id.clone()),
        })?;
        Ok((json!({}), ChannelMessage::new(EventName::Approved.as_str(), payload)))
    }

    fn delete(&mut self, topic: &Topic, intent: DeleteIntent) -> Result<Accepted, String> {
        let comments = self.comments.entry(topic.clone()).or_default();
        let Some(index) = comments.iter().position(|c| c.comment_id == intent.comment_id) else {
            return Err("not found".into());
        };
        comments.remove(index);

        let payload = encode(&DeletedPayload {
            comment_id: intent.comment_id,
            post_id: Some(intent.post_id),
        })?;
        Ok((json!({}), ChannelMessage::new(EventName::Deleted.as_str(), payload)))
    }
}

fn decode<T: DeserializeOwned>(message: &ChannelMessage) -> Result<T, String> {
    serde_json::from_value(message.payload().clone())
        .map_err(|e| format!("malformed {} payload: {e}", message.event()))
}

fn encode<T: Serialize>(value: &T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| e.to_string())
}

/// LoopbackHub は topic ごとにコメントと購読者を持つインメモリサーバー
///
/// # 使用例
/// ```ignore
/// let hub = LoopbackHub::new();
/// let moderator = hub.connect(Some("token"));
/// let reader = hub.connect(None);
/// ```
#[derive(Clone)]
pub struct LoopbackHub {
    state: Arc<Mutex<HubState>>,
    /// 配送タスクを 1 本に絞る（outbox の順序 = 全購読者が見る順序）
    delivery: Arc<tokio::sync::Mutex<()>>,
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(HubState {
                auto_approve_privileged: true,
                ..HubState::default()
            })),
            delivery: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a connection. A present, non-blank token makes the connection privileged.
    pub fn connect(&self, token: Option<&str>) -> LoopbackTransport {
        LoopbackTransport {
            hub: self.clone(),
            viewer: Viewer::from_token(token),
            joined: Mutex::new(HashSet::new()),
        }
    }

    /// Whether comments created by privileged connections start approved (default: true).
    pub fn auto_approve_privileged(&self, enabled: bool) {
        self.lock().auto_approve_privileged = enabled;
    }

    pub fn reject_joins(&self, reason: impl Into<String>) {
        self.lock().reject_joins = Some(reason.into());
    }

    pub fn reject_pushes(&self, reason: impl Into<String>) {
        self.lock().reject_pushes = Some(reason.into());
    }

    /// Put a comment on the server side without broadcasting it.
    pub fn seed(&self, topic: &Topic, comment: Comment) {
        let mut state = self.lock();
        if let Ok(n) = comment.comment_id.as_str().parse::<u64>() {
            state.next_comment_id = state.next_comment_id.max(n);
        }
        state.comments.entry(topic.clone()).or_default().push(comment);
    }

    /// Send a raw message to every subscriber of `topic`, bypassing the push rules.
    ///
    /// Returns once the message (and anything queued before it) is in every live buffer.
    pub async fn broadcast(&self, topic: &Topic, message: ChannelMessage) {
        self.lock().outbox.push_back((topic.clone(), message));
        self.drain().await;
    }

    /// Live subscribers of `topic`.
    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        self.lock().senders(topic).len()
    }

    pub fn comments(&self, topic: &Topic) -> Vec<Comment> {
        self.lock().comments.get(topic).cloned().unwrap_or_default()
    }

    /// Every message pushed on `topic`, accepted or not.
    pub fn pushed(&self, topic: &Topic) -> Vec<ChannelMessage> {
        self.lock().pushed.get(topic).cloned().unwrap_or_default()
    }

    fn spawn_drain(&self) {
        let hub = self.clone();
        tokio::spawn(async move { hub.drain().await });
    }

    async fn drain(&self) {
        let _turn = self.delivery.lock().await;
        loop {
            let next = {
                let mut state = self.lock();
                state
                    .outbox
                    .pop_front()
                    .map(|(topic, message)| {
                        let senders = state.senders(&topic);
                        (topic, message, senders)
                    })
            };
            let Some((topic, message, senders)) = next else {
                break;
            };

            for tx in senders {
                // a full buffer makes us wait here
                if tx.send(message.clone()).await.is_err() {
                    debug!("subscriber on {topic} went away before {}", message.event());
                }
            }
        }
    }
}

impl Default for LoopbackHub {
    fn default() -> Self {
        Self::new()
    }
}

/// One client connection to a `LoopbackHub`.
pub struct LoopbackTransport {
    hub: LoopbackHub,
    viewer: Viewer,
    joined: Mutex<HashSet<Topic>>,
}

impl LoopbackTransport {
    pub fn viewer(&self) -> Viewer {
        self.viewer
    }

    fn is_joined(&self, topic: &Topic) -> bool {
        self.joined
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(topic)
    }
}

#[async_trait]
impl ChannelTransport for LoopbackTransport {
    fn subscribe(
        &self,
        topic: &Topic,
        capacity: usize,
    ) -> Result<mpsc::Receiver<ChannelMessage>, TransportError> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        self.hub
            .lock()
            .subscribers
            .entry(topic.clone())
            .or_default()
            .push(tx);
        Ok(rx)
    }

    async fn join(&self, topic: &Topic) -> Result<Reply, TransportError> {
        let refused = self.hub.lock().reject_joins.clone();
        if let Some(reason) = refused {
            debug!("join {topic} refused: {reason}");
            return Ok(Reply::error(reason));
        }
        self.joined
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(topic.clone());
        Ok(Reply::ok())
    }

    fn push(&self, topic: &Topic, message: ChannelMessage) -> Result<PendingReply, TransportError> {
        if !self.is_joined(topic) {
            return Err(TransportError::NotJoined(topic.clone()));
        }

        let (reply, queued) = {
            let mut state = self.hub.lock();
            state
                .pushed
                .entry(topic.clone())
                .or_default()
                .push(message.clone());
            let reply = state.handle_push(topic, self.viewer, &message);
            (reply, !state.outbox.is_empty())
        };
        debug!("{} on {topic} -> {:?}", message.event(), reply);

        if queued {
            self.hub.spawn_drain();
        }
        Ok(PendingReply::resolved(reply))
    }
}
