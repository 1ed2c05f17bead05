//! Comment - 1 つの投稿ビューに表示されるコメント
//!
//! `insertedAt` はサーバーの値（文字列でも数値でも）をそのまま保持します。

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{CommentId, PostId};

/// Timestamp the server attached when the comment was inserted.
///
/// The view only displays it, so it is kept verbatim: either a string
/// (ISO 8601 from the server) or a number (epoch based).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InsertedAt {
    Number(serde_json::Number),
    Text(String),
}

impl InsertedAt {
    pub fn is_empty(&self) -> bool {
        matches!(self, InsertedAt::Text(s) if s.is_empty())
    }
}

impl Default for InsertedAt {
    fn default() -> Self {
        InsertedAt::Text(String::new())
    }
}

impl fmt::Display for InsertedAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertedAt::Number(n) => write!(f, "{n}"),
            InsertedAt::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for InsertedAt {
    fn from(value: &str) -> Self {
        InsertedAt::Text(value.to_string())
    }
}

/// A comment in the local view state.
///
/// The serialized form is the `CREATED_COMMENT` payload shape (camelCase keys).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub comment_id: CommentId,
    pub author: String,
    pub body: String,
    #[serde(default)]
    pub inserted_at: InsertedAt,
    #[serde(default)]
    pub approved: bool,
    pub post_id: PostId,
}

impl Comment {
    pub fn new(
        comment_id: CommentId,
        post_id: PostId,
        author: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            comment_id,
            author: author.into(),
            body: body.into(),
            inserted_at: InsertedAt::default(),
            approved: false,
            post_id,
        }
    }

    pub fn approved(mut self, approved: bool) -> Self {
        self.approved = approved;
        self
    }

    pub fn inserted_at(mut self, inserted_at: impl Into<InsertedAt>) -> Self {
        self.inserted_at = inserted_at.into();
        self
    }
}
