//! Recording - ビュー側 ports の記録用実装
//!
//! 描画・フォーム・通知をすべてメモリに残します。
//! テストと CLI デモはここから「ページに何が表示されたか」を確認します。

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::domain::{Comment, CommentId};
use crate::ports::{FormStore, Notice, Notifier, RenderedText, ViewRenderer};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ========================================
// Renderer
// ========================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderCall {
    Init { privileged: bool },
    Insert(CommentId),
    RemoveModerationControls(CommentId),
    Remove(CommentId),
}

/// One row of the rendered list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedComment {
    pub comment_id: CommentId,
    pub author: String,
    pub body: String,
    pub inserted_at: String,
    pub approvable: bool,
    pub deletable: bool,
}

#[derive(Default)]
struct RendererState {
    privileged: bool,
    rows: Vec<RenderedComment>,
    calls: Vec<RenderCall>,
}

/// RecordingRenderer はコメント一覧を Vec で再現する
///
/// - 新しいコメントは先頭に入る
/// - 特権 viewer には未承認コメントの承認ボタンと削除ボタンを出す
#[derive(Default)]
pub struct RecordingRenderer {
    state: Mutex<RendererState>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        lock(&self.state).calls.clone()
    }

    /// Rendered ids, top to bottom.
    pub fn rendered_ids(&self) -> Vec<CommentId> {
        lock(&self.state)
            .rows
            .iter()
            .map(|row| row.comment_id.clone())
            .collect()
    }

    pub fn rows(&self) -> Vec<RenderedComment> {
        lock(&self.state).rows.clone()
    }

    pub fn rendered(&self, comment_id: &CommentId) -> Option<RenderedComment> {
        lock(&self.state)
            .rows
            .iter()
            .find(|row| &row.comment_id == comment_id)
            .cloned()
    }

    /// Change the shown text without going through the store (a moderator editing in place).
    pub fn edit_text(&self, comment_id: &CommentId, author: &str, body: &str) -> bool {
        let mut state = lock(&self.state);
        match state.rows.iter_mut().find(|row| &row.comment_id == comment_id) {
            Some(row) => {
                row.author = author.to_string();
                row.body = body.to_string();
                true
            }
            None => false,
        }
    }
}

impl ViewRenderer for RecordingRenderer {
    fn init(&self, privileged: bool) {
        let mut state = lock(&self.state);
        state.privileged = privileged;
        state.calls.push(RenderCall::Init { privileged });
    }

    fn insert(&self, comment: &Comment) {
        let mut state = lock(&self.state);
        let row = RenderedComment {
            comment_id: comment.comment_id.clone(),
            author: comment.author.clone(),
            body: comment.body.clone(),
            inserted_at: comment.inserted_at.to_string(),
            approvable: state.privileged && !comment.approved,
            deletable: state.privileged,
        };
        state.rows.retain(|r| r.comment_id != comment.comment_id);
        state.rows.insert(0, row);
        state.calls.push(RenderCall::Insert(comment.comment_id.clone()));
    }

    fn remove_moderation_controls(&self, comment_id: &CommentId) {
        let mut state = lock(&self.state);
        if let Some(row) = state.rows.iter_mut().find(|row| &row.comment_id == comment_id) {
            row.approvable = false;
        }
        state
            .calls
            .push(RenderCall::RemoveModerationControls(comment_id.clone()));
    }

    fn remove(&self, comment_id: &CommentId) {
        let mut state = lock(&self.state);
        state.rows.retain(|row| &row.comment_id != comment_id);
        state.calls.push(RenderCall::Remove(comment_id.clone()));
    }

    fn rendered_text(&self, comment_id: &CommentId) -> Option<RenderedText> {
        self.rendered(comment_id).map(|row| RenderedText {
            author: row.author,
            body: row.body,
        })
    }
}

// ========================================
// Form
// ========================================

#[derive(Default)]
struct FormState {
    author: String,
    body: String,
    resets: usize,
}

#[derive(Default)]
pub struct MemoryForm {
    state: Mutex<FormState>,
}

impl MemoryForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill(&self, author: &str, body: &str) {
        let mut state = lock(&self.state);
        state.author = author.to_string();
        state.body = body.to_string();
    }

    /// How many times the fields were cleared.
    pub fn reset_count(&self) -> usize {
        lock(&self.state).resets
    }
}

impl FormStore for MemoryForm {
    fn author(&self) -> String {
        lock(&self.state).author.clone()
    }

    fn body(&self) -> String {
        lock(&self.state).body.clone()
    }

    fn reset_fields(&self) {
        let mut state = lock(&self.state);
        state.author.clear();
        state.body.clear();
        state.resets += 1;
    }
}

// ========================================
// Notifier
// ========================================

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        lock(&self.notices).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        lock(&self.notices).push(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PostId;

    fn comment(id: u64, approved: bool) -> Comment {
        Comment::new(CommentId::from(id), PostId::from(1), "ann", "hi").approved(approved)
    }

    #[test]
    fn newest_comment_is_on_top() {
        let renderer = RecordingRenderer::new();
        renderer.init(false);

        renderer.insert(&comment(1, true));
        renderer.insert(&comment(2, true));

        assert_eq!(
            renderer.rendered_ids(),
            vec![CommentId::from(2), CommentId::from(1)]
        );
    }

    #[test]
    fn moderation_controls_follow_privilege() {
        let renderer = RecordingRenderer::new();
        renderer.init(true);
        renderer.insert(&comment(1, false));
        renderer.insert(&comment(2, true));

        assert!(renderer.rendered(&CommentId::from(1)).unwrap().approvable);
        assert!(!renderer.rendered(&CommentId::from(2)).unwrap().approvable);

        renderer.remove_moderation_controls(&CommentId::from(1));
        let row = renderer.rendered(&CommentId::from(1)).unwrap();
        assert!(!row.approvable);
        assert!(row.deletable);
    }

    #[test]
    fn remove_is_idempotent() {
        let renderer = RecordingRenderer::new();
        renderer.insert(&comment(1, true));

        renderer.remove(&CommentId::from(1));
        renderer.remove(&CommentId::from(1));

        assert!(renderer.rendered_ids().is_empty());
        assert!(renderer.rendered_text(&CommentId::from(1)).is_none());
    }

    #[test]
    fn form_reset_clears_both_fields() {
        let form = MemoryForm::new();
        form.fill("ann", "hello");

        form.reset_fields();

        assert_eq!((form.author(), form.body()), (String::new(), String::new()));
        assert_eq!(form.reset_count(), 1);
    }
}
