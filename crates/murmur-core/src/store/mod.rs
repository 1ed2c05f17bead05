//! Store - 表示中コメントの store とカウンタ

mod memory;

pub use memory::CommentStore;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCounts {
    pub approved: usize,
    pub unapproved: usize,
    /// Entries dropped so far (deletes of absent ids are not counted).
    pub removed: usize,
}

impl StoreCounts {
    pub fn visible(&self) -> usize {
        self.approved + self.unapproved
    }
}
