//! Reconcile - 受信イベントがローカルの表示に何をするかを決める
//!
//! # 設計原則
//! - Reconciler は純粋関数（event + 現在の store → Transition）
//! - 副作用なし（store と renderer への反映は reconcile loop が行う）
//! - 同じイベントを何度適用しても結果は同じ（冪等）

use crate::domain::{Comment, CommentId, CommentState, InboundEvent, PostId, Viewer};
use crate::store::CommentStore;

/// Why an event left the view untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    /// Unapproved comment and the viewer may not see those.
    HiddenUnapproved,
    /// Create for an id already in the store (re-delivery or own echo).
    Duplicate,
    /// Approve for a comment already approved.
    AlreadyApproved,
    /// Event for another post arrived on this topic.
    ForeignPost(PostId),
}

/// The next change to make to the view.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Store the comment and render it.
    Insert(Comment),

    /// Mark as approved and drop the moderation controls.
    Approve(CommentId),

    /// Delete from the store and the view. Emitted even for unknown ids.
    Remove(CommentId),

    /// Leave everything as is.
    Ignore(Skip),
}

impl Transition {
    pub fn is_ignore(&self) -> bool {
        matches!(self, Transition::Ignore(_))
    }
}

/// Trait for deciding what an inbound event does to the view.
///
/// Reconcilers are pure functions: given the event and the current store they
/// return the transition without side effects. Applying it is the reconcile
/// loop's job.
pub trait Reconciler: Send + Sync {
    fn reconcile(&self, event: &InboundEvent, store: &CommentStore) -> Transition;
}

/// Default reconciliation rules.
///
/// - Created: visibility gate (non-privileged viewers never see unapproved
///   comments), then idempotent insert.
/// - Approved: approve a stored comment, or synthesize it as a late create
///   when the viewer never stored it.
/// - Deleted: always remove.
///
/// A deleted id is simply absent again, so a later approve synthesizes it.
#[derive(Debug, Clone)]
pub struct DefaultReconciler {
    viewer: Viewer,
    post_id: PostId,
}

impl DefaultReconciler {
    pub fn new(viewer: Viewer, post_id: PostId) -> Self {
        Self { viewer, post_id }
    }

    pub fn viewer(&self) -> Viewer {
        self.viewer
    }
}

impl Reconciler for DefaultReconciler {
    fn reconcile(&self, event: &InboundEvent, store: &CommentStore) -> Transition {
        if let Some(post_id) = event.post_id()
            && post_id != &self.post_id
        {
            return Transition::Ignore(Skip::ForeignPost(post_id.clone()));
        }

        let comment_id = event.comment_id();
        let state = store.state_of(comment_id);

        match event {
            InboundEvent::Created(payload) => {
                if !self.viewer.is_privileged() && !payload.approved {
                    return Transition::Ignore(Skip::HiddenUnapproved);
                }
                if state.is_visible() {
                    Transition::Ignore(Skip::Duplicate)
                } else {
                    Transition::Insert(payload.clone().into_comment(&self.post_id))
                }
            }
            InboundEvent::Approved(payload) => match state {
                CommentState::VisibleUnapproved => Transition::Approve(comment_id.clone()),
                CommentState::VisibleApproved => Transition::Ignore(Skip::AlreadyApproved),
                CommentState::Absent => Transition::Insert(payload.synthesize(&self.post_id)),
            },
            InboundEvent::Deleted(_) => Transition::Remove(comment_id.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ApprovedPayload, CreatedPayload, DeletedPayload, InsertedAt};
    use rstest::rstest;

    fn post() -> PostId {
        PostId::from(1)
    }

    fn created(id: u64, approved: bool) -> InboundEvent {
        InboundEvent::Created(CreatedPayload {
            comment_id: CommentId::from(id),
            author: "ann".into(),
            body: "hello".into(),
            inserted_at: InsertedAt::from("2016-05-01T10:00:00"),
            approved,
            post_id: Some(post()),
        })
    }

    fn approved(id: u64) -> InboundEvent {
        InboundEvent::Approved(ApprovedPayload {
            comment_id: CommentId::from(id),
            author: "ann".into(),
            body: "hello".into(),
            inserted_at: None,
            post_id: Some(post()),
        })
    }

    fn deleted(id: u64) -> InboundEvent {
        InboundEvent::Deleted(DeletedPayload {
            comment_id: CommentId::from(id),
            post_id: Some(post()),
        })
    }

    fn store_with(comments: &[(u64, bool)]) -> CommentStore {
        let mut store = CommentStore::new();
        for &(id, approved) in comments {
            store.upsert_created(
                Comment::new(CommentId::from(id), post(), "ann", "hello").approved(approved),
            );
        }
        store
    }

    #[rstest]
    #[case::anon_unapproved(Viewer::anonymous(), false, false)]
    #[case::anon_approved(Viewer::anonymous(), true, true)]
    #[case::privileged_unapproved(Viewer::privileged(), false, true)]
    #[case::privileged_approved(Viewer::privileged(), true, true)]
    fn created_visibility_gate(
        #[case] viewer: Viewer,
        #[case] approved_flag: bool,
        #[case] inserted: bool,
    ) {
        let reconciler = DefaultReconciler::new(viewer, post());
        let transition = reconciler.reconcile(&created(1, approved_flag), &CommentStore::new());

        if inserted {
            assert!(matches!(transition, Transition::Insert(c) if c.approved == approved_flag));
        } else {
            assert_eq!(transition, Transition::Ignore(Skip::HiddenUnapproved));
        }
    }

    #[test]
    fn created_twice_is_duplicate() {
        let reconciler = DefaultReconciler::new(Viewer::privileged(), post());
        let store = store_with(&[(1, false)]);

        assert_eq!(
            reconciler.reconcile(&created(1, false), &store),
            Transition::Ignore(Skip::Duplicate)
        );
    }

    #[rstest]
    #[case::unapproved_becomes_approved(&[(2, false)], Transition::Approve(CommentId::from(2)))]
    #[case::already_approved(&[(2, true)], Transition::Ignore(Skip::AlreadyApproved))]
    fn approved_for_stored_comment(
        #[case] existing: &[(u64, bool)],
        #[case] expected: Transition,
    ) {
        let reconciler = DefaultReconciler::new(Viewer::privileged(), post());
        assert_eq!(reconciler.reconcile(&approved(2), &store_with(existing)), expected);
    }

    #[test]
    fn approved_for_unknown_comment_is_a_late_create() {
        let reconciler = DefaultReconciler::new(Viewer::anonymous(), post());
        let transition = reconciler.reconcile(&approved(3), &CommentStore::new());

        let Transition::Insert(comment) = transition else {
            panic!("expected insert, got {transition:?}");
        };
        assert_eq!(comment.comment_id, CommentId::from(3));
        assert!(comment.approved);
        assert_eq!(comment.author, "ann");
    }

    #[test]
    fn create_after_late_create_is_duplicate() {
        let reconciler = DefaultReconciler::new(Viewer::anonymous(), post());
        let store = store_with(&[(3, true)]);

        assert_eq!(
            reconciler.reconcile(&created(3, false), &store),
            Transition::Ignore(Skip::HiddenUnapproved)
        );
        assert_eq!(
            reconciler.reconcile(&created(3, true), &store),
            Transition::Ignore(Skip::Duplicate)
        );
    }

    #[rstest]
    #[case::present(&[(5, true)])]
    #[case::absent(&[])]
    fn deleted_always_removes(#[case] existing: &[(u64, bool)]) {
        let reconciler = DefaultReconciler::new(Viewer::anonymous(), post());
        assert_eq!(
            reconciler.reconcile(&deleted(5), &store_with(existing)),
            Transition::Remove(CommentId::from(5))
        );
    }

    #[rstest]
    #[case::anonymous(Viewer::anonymous())]
    #[case::privileged(Viewer::privileged())]
    fn approved_after_delete_is_a_late_create(#[case] viewer: Viewer) {
        let reconciler = DefaultReconciler::new(viewer, post());
        let mut store = store_with(&[(6, false)]);
        store.remove(&CommentId::from(6));

        let transition = reconciler.reconcile(&approved(6), &store);

        assert!(matches!(
            transition,
            Transition::Insert(ref c) if c.comment_id == CommentId::from(6) && c.approved
        ));
    }

    #[test]
    fn foreign_post_is_ignored() {
        let reconciler = DefaultReconciler::new(Viewer::privileged(), PostId::from(99));
        assert_eq!(
            reconciler.reconcile(&created(1, true), &CommentStore::new()),
            Transition::Ignore(Skip::ForeignPost(post()))
        );
    }

    #[test]
    fn missing_post_id_means_this_post() {
        let reconciler = DefaultReconciler::new(Viewer::privileged(), post());
        let event = InboundEvent::Deleted(DeletedPayload {
            comment_id: CommentId::from(1),
            post_id: None,
        });
        assert_eq!(
            reconciler.reconcile(&event, &CommentStore::new()),
            Transition::Remove(CommentId::from(1))
        );
    }
}
