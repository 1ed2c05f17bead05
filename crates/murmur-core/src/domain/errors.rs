//! Errors - エラー型と分類
//!
//! # 分類
//! - Connection: join 失敗（"unable to connect" としてユーザーに表示）
//! - Validation: ローカル入力チェック（push しない、致命的ではない）
//! - Payload: 受信イベントの decode 失敗（破棄してログ）
//! - Rejected: サーバーが push を拒否（store は変更しない）
//! - Local: 手元で拒否した操作（未描画・権限なし）
//! - Transport / Config / Runtime: インフラ側の失敗

use thiserror::Error;

use super::events::{EventError, EventName};
use super::ids::CommentId;
use super::topic::Topic;
use crate::config::ConfigError;
use crate::ports::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connection,
    Validation,
    Payload,
    Rejected,
    Local,
    Transport,
    Config,
    Runtime,
}

/// ValidationError は作成フォームの入力エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("author must not be blank")]
    BlankAuthor,

    #[error("body must not be blank")]
    BlankBody,
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("unable to join {topic}: {reason}")]
    JoinFailed { topic: Topic, reason: String },

    #[error("invalid comment: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Event(#[from] EventError),

    #[error("{event} rejected by server: {reason}")]
    PushRejected { event: EventName, reason: String },

    #[error("comment {0} is not rendered")]
    NotRendered(CommentId),

    #[error("{0} requires a privileged viewer")]
    Unauthorized(EventName),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("reconcile loop stopped unexpectedly: {0}")]
    LoopStopped(String),
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::JoinFailed { .. } => ErrorKind::Connection,
            SyncError::Validation(_) => ErrorKind::Validation,
            SyncError::Event(_) => ErrorKind::Payload,
            SyncError::PushRejected { .. } => ErrorKind::Rejected,
            SyncError::NotRendered(_) | SyncError::Unauthorized(_) => ErrorKind::Local,
            SyncError::Transport(_) => ErrorKind::Transport,
            SyncError::Config(_) => ErrorKind::Config,
            SyncError::LoopStopped(_) => ErrorKind::Runtime,
        }
    }

    /// Fatal errors end the session; the rest are reported and the view keeps running.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Connection | ErrorKind::Config | ErrorKind::Runtime
        )
    }
}
