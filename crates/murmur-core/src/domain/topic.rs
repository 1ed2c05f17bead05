//! Topic - 投稿ごとの pub/sub スコープ（`comments:<postId>`）

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::PostId;

/// Default topic prefix; the full topic is `comments:<postId>`.
pub const DEFAULT_TOPIC_PREFIX: &str = "comments";

/// Name of a pub/sub channel scope (one per post).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Topic(String);

impl Topic {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn for_post(prefix: &str, post_id: &PostId) -> Self {
        Self(format!("{prefix}:{post_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
