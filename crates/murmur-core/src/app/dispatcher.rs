//! ActionDispatcher - ユーザー操作を channel イベントに変換
//!
//! # フロー
//! 1. 入力を集める（作成: フォーム / 承認: 描画中のテキスト / 削除: id のみ）
//! 2. ローカル検証（失敗したら通知して push しない）
//! 3. push して即座に戻る（fire-and-continue）
//! 4. 応答はバックグラウンドで待ち、成功したらフォームをリセット、拒否なら通知
//!
//! store は一切変更しません。反映は broadcast を受けた reconcile loop が行います。
//!
//! 応答待ちのタスクは生成時に受け取った runtime `Handle` 上で動くため、
//! `submit_*` は runtime 外のスレッドからも呼べます。

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::{
    ApproveIntent, CommentId, CreateIntent, DeleteIntent, EventName, OutboundEvent, PostId,
    SyncError, Topic, ValidationError, Viewer,
};
use crate::ports::{ChannelTransport, FormStore, Notice, Notifier, Reply, ViewRenderer};

/// A pushed action whose acknowledgment is still outstanding.
#[derive(Debug)]
pub struct PendingAction {
    event: EventName,
    handle: JoinHandle<Result<Value, SyncError>>,
}

impl PendingAction {
    pub fn event(&self) -> EventName {
        self.event
    }

    /// Wait for the acknowledgment. Follow-up (form reset, notices) has already run by then.
    pub async fn outcome(self) -> Result<Value, SyncError> {
        self.handle
            .await
            .map_err(|e| SyncError::LoopStopped(format!("{} acknowledgment task: {e}", self.event)))?
    }
}

#[derive(Clone)]
pub struct ActionDispatcher {
    topic: Topic,
    post_id: PostId,
    viewer: Viewer,
    reply_timeout: Option<Duration>,
    transport: Arc<dyn ChannelTransport>,
    renderer: Arc<dyn ViewRenderer>,
    form: Arc<dyn FormStore>,
    notifier: Arc<dyn Notifier>,
    runtime: Handle,
}

impl ActionDispatcher {
    /// `runtime` runs the acknowledgment tasks.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        runtime: Handle,
        topic: Topic,
        post_id: PostId,
        viewer: Viewer,
        reply_timeout: Option<Duration>,
        transport: Arc<dyn ChannelTransport>,
        renderer: Arc<dyn ViewRenderer>,
        form: Arc<dyn FormStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            topic,
            post_id,
            viewer,
            reply_timeout,
            transport,
            renderer,
            form,
            notifier,
            runtime,
        }
    }

    /// Submit the comment form.
    ///
    /// Fields are cleared only once the server acknowledges the create.
    pub fn submit_create(&self) -> Result<PendingAction, SyncError> {
        let author = self.form.author().trim().to_string();
        let body = self.form.body().trim().to_string();

        let validation = if author.is_empty() {
            Some(ValidationError::BlankAuthor)
        } else if body.is_empty() {
            Some(ValidationError::BlankBody)
        } else {
            None
        };
        if let Some(err) = validation {
            return Err(self.report(err.into()));
        }

        let event = OutboundEvent::Create(CreateIntent {
            author,
            body,
            post_id: self.post_id.clone(),
        });
        let form = Arc::clone(&self.form);
        self.dispatch(event, move || form.reset_fields())
    }

    /// Approve a comment, using the author/body the view currently shows.
    pub fn submit_approve(&self, comment_id: &CommentId) -> Result<PendingAction, SyncError> {
        self.require_privilege(EventName::Approved)?;

        let Some(text) = self.renderer.rendered_text(comment_id) else {
            return Err(self.report(SyncError::NotRendered(comment_id.clone())));
        };

        let event = OutboundEvent::Approve(ApproveIntent {
            author: text.author.trim().to_string(),
            body: text.body.trim().to_string(),
            comment_id: comment_id.clone(),
            post_id: self.post_id.clone(),
        });
        self.dispatch(event, || {})
    }

    pub fn submit_delete(&self, comment_id: &CommentId) -> Result<PendingAction, SyncError> {
        self.require_privilege(EventName::Deleted)?;

        let event = OutboundEvent::Delete(DeleteIntent {
            comment_id: comment_id.clone(),
            post_id: self.post_id.clone(),
        });
        self.dispatch(event, || {})
    }

    fn require_privilege(&self, event: EventName) -> Result<(), SyncError> {
        if self.viewer.is_privileged() {
            Ok(())
        } else {
            Err(self.report(SyncError::Unauthorized(event)))
        }
    }

    fn report(&self, err: SyncError) -> SyncError {
        warn!("{err}");
        self.notifier.notify(Notice::from(&err));
        err
    }

    /// Push and return right away; `on_ok` runs when the server acknowledges.
    fn dispatch<F>(&self, event: OutboundEvent, on_ok: F) -> Result<PendingAction, SyncError>
    where
        F: FnOnce() + Send + 'static,
    {
        let name = event.name();
        let message = event.to_message().map_err(|e| self.report(e.into()))?;

        // transports may spawn their own delivery work
        let _runtime = self.runtime.enter();
        let mut pending = self
            .transport
            .push(&self.topic, message)
            .map_err(|e| self.report(e.into()))?;
        if let Some(limit) = self.reply_timeout {
            pending = pending.with_timeout(limit);
        }
        debug!("pushed {name} on {}", self.topic);

        let notifier = Arc::clone(&self.notifier);
        let handle = self.runtime.spawn(async move {
            let result = match pending.wait().await {
                Ok(Reply::Ok(payload)) => {
                    debug!("{name} acknowledged");
                    on_ok();
                    Ok(payload)
                }
                Ok(reply @ Reply::Error(_)) => Err(SyncError::PushRejected {
                    event: name,
                    reason: reply.reason(),
                }),
                Err(e) => Err(SyncError::from(e)),
            };
            if let Err(err) = &result {
                warn!("{err}");
                notifier.notify(Notice::from(err));
            }
            result
        });

        Ok(PendingAction {
            event: name,
            handle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Comment, ErrorKind};
    use crate::impls::{LoopbackHub, MemoryForm, RecordingNotifier, RecordingRenderer};
    use crate::ports::TransportError;
    use serde_json::json;

    struct Fixture {
        hub: LoopbackHub,
        topic: Topic,
        form: Arc<MemoryForm>,
        renderer: Arc<RecordingRenderer>,
        notifier: Arc<RecordingNotifier>,
        dispatcher: ActionDispatcher,
    }

    async fn fixture(token: Option<&str>) -> Fixture {
        let hub = LoopbackHub::new();
        let topic = Topic::new("comments:1");
        let transport = Arc::new(hub.connect(token));
        transport.join(&topic).await.unwrap();

        let form = Arc::new(MemoryForm::new());
        let renderer = Arc::new(RecordingRenderer::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let dispatcher = ActionDispatcher::new(
            Handle::current(),
            topic.clone(),
            PostId::from(1),
            Viewer::from_token(token),
            Some(Duration::from_secs(1)),
            transport,
            renderer.clone(),
            form.clone(),
            notifier.clone(),
        );
        Fixture {
            hub,
            topic,
            form,
            renderer,
            notifier,
            dispatcher,
        }
    }

    #[tokio::test]
    async fn blank_author_is_not_pushed() {
        let f = fixture(None).await;
        f.form.fill("   ", "some body");

        let err = f.dispatcher.submit_create().unwrap_err();

        assert!(matches!(err, SyncError::Validation(ValidationError::BlankAuthor)));
        assert!(f.hub.pushed(&f.topic).is_empty());
        assert_eq!(f.notifier.notices().len(), 1);
        assert_eq!(f.form.author(), "   ");
    }

    #[tokio::test]
    async fn blank_body_is_not_pushed() {
        let f = fixture(None).await;
        f.form.fill("ann", "");

        let err = f.dispatcher.submit_create().unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(f.hub.pushed(&f.topic).is_empty());
    }

    #[tokio::test]
    async fn create_pushes_trimmed_fields_and_resets_on_ack() {
        let f = fixture(None).await;
        f.form.fill(" ann ", " hello ");

        let pending = f.dispatcher.submit_create().unwrap();
        assert_eq!(pending.event(), EventName::Created);
        pending.outcome().await.unwrap();

        let pushed = f.hub.pushed(&f.topic);
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed[0].event(), "CREATED_COMMENT");
        assert_eq!(
            pushed[0].payload(),
            &json!({"author": "ann", "body": "hello", "postId": 1})
        );
        assert_eq!(f.form.author(), "");
        assert_eq!(f.form.reset_count(), 1);
    }

    #[tokio::test]
    async fn rejected_create_keeps_fields() {
        let f = fixture(None).await;
        f.hub.reject_pushes("post is locked");
        f.form.fill("ann", "hello");

        let err = f.dispatcher.submit_create().unwrap().outcome().await.unwrap_err();

        assert!(matches!(err, SyncError::PushRejected { event: EventName::Created, ref reason } if reason == "post is locked"));
        assert_eq!(f.form.author(), "ann");
        assert_eq!(f.form.reset_count(), 0);
        assert_eq!(f.notifier.notices().len(), 1);
    }

    #[tokio::test]
    async fn approve_reads_the_rendered_text() {
        let f = fixture(Some("token")).await;
        f.renderer.init(true);
        let comment = Comment::new(CommentId::from(3), PostId::from(1), "ann", "hello");
        f.renderer.insert(&comment);
        f.renderer.edit_text(&CommentId::from(3), "  Ann  ", " hello, edited ");
        f.hub.seed(&f.topic, comment);

        f.dispatcher
            .submit_approve(&CommentId::from(3))
            .unwrap()
            .outcome()
            .await
            .unwrap();

        let pushed = f.hub.pushed(&f.topic);
        assert_eq!(
            pushed[0].payload(),
            &json!({"author": "Ann", "body": "hello, edited", "commentId": 3, "postId": 1})
        );
    }

    #[tokio::test]
    async fn approve_of_unrendered_comment_is_refused() {
        let f = fixture(Some("token")).await;

        let err = f.dispatcher.submit_approve(&CommentId::from(9)).unwrap_err();

        assert!(matches!(err, SyncError::NotRendered(_)));
        assert!(f.hub.pushed(&f.topic).is_empty());
    }

    #[tokio::test]
    async fn delete_sends_only_ids() {
        let f = fixture(Some("token")).await;
        f.hub
            .seed(&f.topic, Comment::new(CommentId::from(4), PostId::from(1), "a", "b"));

        f.dispatcher
            .submit_delete(&CommentId::from(4))
            .unwrap()
            .outcome()
            .await
            .unwrap();

        let pushed = f.hub.pushed(&f.topic);
        assert_eq!(pushed[0].event(), "DELETED_COMMENT");
        assert_eq!(pushed[0].payload(), &json!({"commentId": 4, "postId": 1}));
    }

    #[tokio::test]
    async fn moderation_needs_privilege() {
        let f = fixture(None).await;

        let err = f.dispatcher.submit_delete(&CommentId::from(4)).unwrap_err();

        assert!(matches!(err, SyncError::Unauthorized(EventName::Deleted)));
        assert!(f.hub.pushed(&f.topic).is_empty());
    }

    #[tokio::test]
    async fn push_before_join_fails_fast() {
        let hub = LoopbackHub::new();
        let form = Arc::new(MemoryForm::new());
        form.fill("ann", "hello");
        let notifier = Arc::new(RecordingNotifier::new());
        let dispatcher = ActionDispatcher::new(
            Handle::current(),
            Topic::new("comments:1"),
            PostId::from(1),
            Viewer::anonymous(),
            None,
            Arc::new(hub.connect(None)),
            Arc::new(RecordingRenderer::new()),
            form,
            notifier.clone(),
        );

        let err = dispatcher.submit_create().unwrap_err();

        assert!(matches!(err, SyncError::Transport(TransportError::NotJoined(_))));
        assert_eq!(notifier.notices().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn submit_from_a_plain_thread_runs_on_the_session_runtime() {
        let f = fixture(None).await;
        f.form.fill("ann", "from elsewhere");

        let dispatcher = f.dispatcher.clone();
        let pending = std::thread::spawn(move || dispatcher.submit_create())
            .join()
            .unwrap()
            .unwrap();
        pending.outcome().await.unwrap();

        assert_eq!(f.hub.pushed(&f.topic).len(), 1);
        assert_eq!(f.form.reset_count(), 1);
    }
}
