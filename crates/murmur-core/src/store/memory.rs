//! CommentStore - 表示中コメントのインメモリ store
//!
//! # 設計原則
//! - id ごとに最大 1 件（重複 create は no-op）
//! - 削除した id は覚えない（後から届いた approve は late create になる）
//! - reconcile loop だけが書き換える

use std::collections::HashMap;

use super::StoreCounts;
use crate::domain::{Comment, CommentId, CommentState};

/// Local view state: comments currently displayed, keyed by id.
///
/// Owned by the reconcile loop alone, so there is no locking here.
#[derive(Debug, Clone, Default)]
pub struct CommentStore {
    /// All displayed comments (at most one per id).
    entries: HashMap<CommentId, Comment>,

    /// Insertion order, oldest first.
    order: Vec<CommentId>,

    /// How many entries `remove` actually dropped.
    removed: usize,
}

impl CommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a comment unless its id is already present.
    ///
    /// Returns `false` for duplicates (re-delivery, own echo).
    pub fn upsert_created(&mut self, comment: Comment) -> bool {
        let id = &comment.comment_id;
        if self.entries.contains_key(id) {
            return false;
        }
        self.order.push(id.clone());
        self.entries.insert(id.clone(), comment);
        true
    }

    /// Flag a stored comment as approved. Returns whether anything changed.
    pub fn mark_approved(&mut self, comment_id: &CommentId) -> bool {
        match self.entries.get_mut(comment_id) {
            Some(comment) if !comment.approved => {
                comment.approved = true;
                true
            }
            _ => false,
        }
    }

    /// Drop a comment. Absent ids are a no-op.
    pub fn remove(&mut self, comment_id: &CommentId) -> Option<Comment> {
        let removed = self.entries.remove(comment_id)?;
        self.order.retain(|id| id != comment_id);
        self.removed += 1;
        Some(removed)
    }

    pub fn has(&self, comment_id: &CommentId) -> bool {
        self.entries.contains_key(comment_id)
    }

    pub fn get(&self, comment_id: &CommentId) -> Option<&Comment> {
        self.entries.get(comment_id)
    }

    pub fn state_of(&self, comment_id: &CommentId) -> CommentState {
        match self.entries.get(comment_id) {
            Some(c) if c.approved => CommentState::VisibleApproved,
            Some(_) => CommentState::VisibleUnapproved,
            None => CommentState::Absent,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Comments in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Comment> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    pub fn counts(&self) -> StoreCounts {
        let mut counts = StoreCounts {
            removed: self.removed,
            ..StoreCounts::default()
        };
        for comment in self.entries.values() {
            if comment.approved {
                counts.approved += 1;
            } else {
                counts.unapproved += 1;
            }
        }
        counts
    }
}
