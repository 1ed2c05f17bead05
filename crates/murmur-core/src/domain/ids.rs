//! Ids - 型付き ID（CommentId, PostId）
//!
//! サーバーが払い出す ID は opaque です。JSON では数値 (`42`) でも文字列 (`"42"`)
//! でも届くため、どちらも受け付けて文字列表現に正規化します。
//!
//! ## Phantom Type パターン
//! `Id<T>` で共通実装を提供し、`T` はマーカー型としてコンパイル時にだけ使います。
//! `CommentId` と `PostId` は混同できません。

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// IdMarker は各 ID 型のマーカー trait
pub trait IdMarker: Send + Sync + 'static {
    /// ログやエラーで使う種別名（例: "comment", "post"）
    fn kind() -> &'static str;
}

/// ジェネリック ID 型
///
/// 等価性とハッシュは正規化済みの文字列表現だけで決まります。
/// `numeric` は wire 形式を保つためだけに持っています（数値で届いた ID は数値で返す）。
pub struct Id<T: IdMarker> {
    raw: String,
    numeric: bool,
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    /// 文字列から Id を作成
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            numeric: false,
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric
    }

    pub fn kind() -> &'static str {
        T::kind()
    }
}

impl<T: IdMarker> From<u64> for Id<T> {
    fn from(value: u64) -> Self {
        Self {
            raw: value.to_string(),
            numeric: true,
            _marker: PhantomData,
        }
    }
}

impl<T: IdMarker> From<&str> for Id<T> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            numeric: self.numeric,
            _marker: PhantomData,
        }
    }
}

impl<T: IdMarker> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T: IdMarker> Eq for Id<T> {}

impl<T: IdMarker> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T: IdMarker> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: IdMarker> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T: IdMarker> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", T::kind(), self.raw)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl<T: IdMarker> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.numeric
            && let Ok(n) = self.raw.parse::<u64>()
        {
            return serializer.serialize_u64(n);
        }
        serializer.serialize_str(&self.raw)
    }
}

/// wire 上の ID 表現
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Unsigned(u64),
    Signed(i64),
    Text(String),
}

impl<'de, T: IdMarker> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawId::deserialize(deserializer)? {
            RawId::Unsigned(n) => Ok(Self::from(n)),
            RawId::Signed(n) => Ok(Self {
                raw: n.to_string(),
                numeric: false,
                _marker: PhantomData,
            }),
            RawId::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(de::Error::custom(format!("empty {} id", T::kind())));
                }
                Ok(Self::new(trimmed))
            }
        }
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// Comment のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Comment {}

impl IdMarker for Comment {
    fn kind() -> &'static str {
        "comment"
    }
}

/// Post のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Post {}

impl IdMarker for Post {
    fn kind() -> &'static str {
        "post"
    }
}

/// Identifier of a comment (unique key of the comment store).
pub type CommentId = Id<Comment>;

/// Identifier of the post a view is showing comments for.
pub type PostId = Id<Post>;
