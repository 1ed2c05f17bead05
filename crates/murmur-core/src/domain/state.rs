//! State - コメントのライフサイクル
//!
//! # 状態遷移
//! - Absent -> VisibleUnapproved -> VisibleApproved -> Absent
//! - Absent -> VisibleApproved（承認済みの create、または late create）
//!
//! 削除されたコメントは store に残りません。削除後に届いたイベントは
//! 「store にない id」への通常のイベントとして扱われます。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentState {
    /// Not in the store: never seen, filtered by the visibility gate, or deleted.
    Absent,

    /// Shown, still waiting for moderation.
    VisibleUnapproved,

    /// Shown and approved.
    VisibleApproved,
}

impl CommentState {
    pub fn is_visible(self) -> bool {
        !matches!(self, CommentState::Absent)
    }

    pub fn is_approved(self) -> bool {
        matches!(self, CommentState::VisibleApproved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::absent(CommentState::Absent, false, false)]
    #[case::unapproved(CommentState::VisibleUnapproved, true, false)]
    #[case::approved(CommentState::VisibleApproved, true, true)]
    fn classification(
        #[case] state: CommentState,
        #[case] visible: bool,
        #[case] approved: bool,
    ) {
        assert_eq!(state.is_visible(), visible);
        assert_eq!(state.is_approved(), approved);
    }
}
