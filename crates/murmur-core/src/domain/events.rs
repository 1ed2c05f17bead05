//! Events - channel イベントの型付き表現
//!
//! # イベント種類
//! - `CREATED_COMMENT`: コメント作成
//! - `APPROVED_COMMENT`: コメント承認
//! - `DELETED_COMMENT`: コメント削除
//!
//! 受信側（Inbound*）と送信側（*Intent）で同じイベント名を使いますが、payload の形は異なります。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::comment::{Comment, InsertedAt};
use super::envelope::ChannelMessage;
use super::ids::{CommentId, PostId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventName {
    #[serde(rename = "CREATED_COMMENT")]
    Created,
    #[serde(rename = "APPROVED_COMMENT")]
    Approved,
    #[serde(rename = "DELETED_COMMENT")]
    Deleted,
}

impl EventName {
    pub const ALL: [EventName; 3] = [EventName::Created, EventName::Approved, EventName::Deleted];

    pub fn as_str(self) -> &'static str {
        match self {
            EventName::Created => "CREATED_COMMENT",
            EventName::Approved => "APPROVED_COMMENT",
            EventName::Deleted => "DELETED_COMMENT",
        }
    }

    /// Approve and delete are moderation actions.
    pub fn is_moderation(self) -> bool {
        matches!(self, EventName::Approved | EventName::Deleted)
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventName {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| EventError::UnknownEvent(s.to_string()))
    }
}

/// EventError は channel メッセージの decode/encode エラー
#[derive(Debug, Error)]
pub enum EventError {
    #[error("unknown event '{0}'")]
    UnknownEvent(String),

    #[error("malformed {event} payload: {source}")]
    Malformed {
        event: EventName,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode {event} payload: {source}")]
    Encode {
        event: EventName,
        #[source]
        source: serde_json::Error,
    },
}

// ========================================
// Inbound (server -> client)
// ========================================

/// `CREATED_COMMENT` payload. `postId` may be omitted; the view's post is assumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPayload {
    pub comment_id: CommentId,
    pub author: String,
    pub body: String,
    #[serde(default)]
    pub inserted_at: InsertedAt,
    #[serde(default)]
    pub approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<PostId>,
}

impl CreatedPayload {
    pub fn into_comment(self, view_post: &PostId) -> Comment {
        Comment {
            comment_id: self.comment_id,
            author: self.author,
            body: self.body,
            inserted_at: self.inserted_at,
            approved: self.approved,
            post_id: self.post_id.unwrap_or_else(|| view_post.clone()),
        }
    }
}

impl From<Comment> for CreatedPayload {
    fn from(comment: Comment) -> Self {
        Self {
            comment_id: comment.comment_id,
            author: comment.author,
            body: comment.body,
            inserted_at: comment.inserted_at,
            approved: comment.approved,
            post_id: Some(comment.post_id),
        }
    }
}

/// `APPROVED_COMMENT` payload.
///
/// Carries author/body so a viewer that never saw the comment can still render it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovedPayload {
    pub comment_id: CommentId,
    pub author: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inserted_at: Option<InsertedAt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<PostId>,
}

impl ApprovedPayload {
    /// Build the comment record for a viewer that never stored the create.
    pub fn synthesize(&self, view_post: &PostId) -> Comment {
        Comment {
            comment_id: self.comment_id.clone(),
            author: self.author.clone(),
            body: self.body.clone(),
            inserted_at: self.inserted_at.clone().unwrap_or_default(),
            approved: true,
            post_id: self.post_id.clone().unwrap_or_else(|| view_post.clone()),
        }
    }
}

/// `DELETED_COMMENT` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedPayload {
    pub comment_id: CommentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<PostId>,
}

/// A decoded inbound broadcast.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Created(CreatedPayload),
    Approved(ApprovedPayload),
    Deleted(DeletedPayload),
}

impl InboundEvent {
    pub fn decode(message: &ChannelMessage) -> Result<Self, EventError> {
        let name: EventName = message.event().parse()?;
        let payload = message.payload().clone();
        let malformed = |source| EventError::Malformed {
            event: name,
            source,
        };

        let event = match name {
            EventName::Created => {
                InboundEvent::Created(serde_json::from_value(payload).map_err(malformed)?)
            }
            EventName::Approved => {
                InboundEvent::Approved(serde_json::from_value(payload).map_err(malformed)?)
            }
            EventName::Deleted => {
                InboundEvent::Deleted(serde_json::from_value(payload).map_err(malformed)?)
            }
        };
        Ok(event)
    }

    pub fn name(&self) -> EventName {
        match self {
            InboundEvent::Created(_) => EventName::Created,
            InboundEvent::Approved(_) => EventName::Approved,
            InboundEvent::Deleted(_) => EventName::Deleted,
        }
    }

    pub fn comment_id(&self) -> &CommentId {
        match self {
            InboundEvent::Created(p) => &p.comment_id,
            InboundEvent::Approved(p) => &p.comment_id,
            InboundEvent::Deleted(p) => &p.comment_id,
        }
    }

    pub fn post_id(&self) -> Option<&PostId> {
        match self {
            InboundEvent::Created(p) => p.post_id.as_ref(),
            InboundEvent::Approved(p) => p.post_id.as_ref(),
            InboundEvent::Deleted(p) => p.post_id.as_ref(),
        }
    }
}

// ========================================
// Outbound (client -> server)
// ========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntent {
    pub author: String,
    pub body: String,
    pub post_id: PostId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveIntent {
    pub author: String,
    pub body: String,
    pub comment_id: CommentId,
    pub post_id: PostId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteIntent {
    pub comment_id: CommentId,
    pub post_id: PostId,
}

/// A user action translated into a channel event.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    Create(CreateIntent),
    Approve(ApproveIntent),
    Delete(DeleteIntent),
}

impl OutboundEvent {
    pub fn name(&self) -> EventName {
        match self {
            OutboundEvent::Create(_) => EventName::Created,
            OutboundEvent::Approve(_) => EventName::Approved,
            OutboundEvent::Delete(_) => EventName::Deleted,
        }
    }

    pub fn to_message(&self) -> Result<ChannelMessage, EventError> {
        let event = self.name();
        let payload = match self {
            OutboundEvent::Create(intent) => serde_json::to_value(intent),
            OutboundEvent::Approve(intent) => serde_json::to_value(intent),
            OutboundEvent::Delete(intent) => serde_json::to_value(intent),
        }
        .map_err(|source| EventError::Encode { event, source })?;
        Ok(ChannelMessage::new(event.as_str(), payload))
    }
}
