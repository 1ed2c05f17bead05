//! ViewRenderer port - コメント一覧の描画
//!
//! テンプレートや DOM 操作は実装側の責務です。
//! reconcile loop は store の差分だけをここに通知します。

use crate::domain::{Comment, CommentId};

/// Author/body text as currently shown for one comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedText {
    pub author: String,
    pub body: String,
}

/// ViewRenderer は store の差分を画面に反映する
///
/// # 設計原則
/// - `init()` で一度だけ viewer の権限を受け取る（モデレーション操作を描くかどうか）
/// - 同じ id に対する `remove()` は何度呼ばれても安全であること
pub trait ViewRenderer: Send + Sync {
    fn init(&self, privileged: bool);

    fn insert(&self, comment: &Comment);

    fn remove_moderation_controls(&self, comment_id: &CommentId);

    fn remove(&self, comment_id: &CommentId);

    /// Text as rendered now, which may differ from the store after renderer-side edits.
    fn rendered_text(&self, comment_id: &CommentId) -> Option<RenderedText>;
}
