//! SyncSession - 1 つの投稿ビューのセッションコンテキスト
//!
//! topic・post id・viewer・注入された協調者をまとめて持ちます。
//! グローバルな socket や DOM 参照の代わりに、このコンテキストを
//! dispatcher と reconcile loop に渡します。

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::dispatcher::ActionDispatcher;
use super::reconcile_loop::ReconcileLoop;
use super::status::SyncStatus;
use crate::config::SyncConfig;
use crate::domain::{PostId, SyncError, Topic, Viewer};
use crate::ports::{
    ChannelTransport, FormStore, Notice, Notifier, Reply, TransportError, ViewRenderer,
};
use crate::reconcile::Reconciler;
use crate::store::CommentStore;

/// A configured session that has not joined its topic yet.
pub struct SyncSession {
    pub(crate) post_id: PostId,
    pub(crate) topic: Topic,
    pub(crate) viewer: Viewer,
    pub(crate) config: SyncConfig,
    pub(crate) transport: Arc<dyn ChannelTransport>,
    pub(crate) renderer: Arc<dyn ViewRenderer>,
    pub(crate) form: Arc<dyn FormStore>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) reconciler: Arc<dyn Reconciler>,
}

impl SyncSession {
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn viewer(&self) -> Viewer {
        self.viewer
    }

    /// Subscribe, join, and start the reconcile loop.
    ///
    /// On join failure the user is told "unable to connect" and no event is processed.
    pub async fn start(self) -> Result<RunningSession, SyncError> {
        self.renderer.init(self.viewer.is_privileged());

        let inbound = self
            .transport
            .subscribe(&self.topic, self.config.channel.inbound_capacity)
            .map_err(|e| self.join_failed(e.to_string()))?;

        let joined = match self.config.channel.reply_timeout() {
            Some(limit) => tokio::time::timeout(limit, self.transport.join(&self.topic))
                .await
                .unwrap_or(Err(TransportError::Timeout(limit))),
            None => self.transport.join(&self.topic).await,
        };
        match joined {
            Ok(Reply::Ok(_)) => info!("joined {}", self.topic),
            Ok(reply @ Reply::Error(_)) => return Err(self.join_failed(reply.reason())),
            Err(e) => return Err(self.join_failed(e.to_string())),
        }

        let reconcile_loop = ReconcileLoop::new(self.reconciler, Arc::clone(&self.renderer));
        let status_rx = reconcile_loop.subscribe_status();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(reconcile_loop.run(inbound, shutdown_rx));

        let dispatcher = ActionDispatcher::new(
            Handle::current(),
            self.topic.clone(),
            self.post_id,
            self.viewer,
            self.config.channel.reply_timeout(),
            self.transport,
            self.renderer,
            self.form,
            self.notifier,
        );

        Ok(RunningSession {
            topic: self.topic,
            dispatcher,
            status_rx,
            shutdown_tx,
            handle,
        })
    }

    fn join_failed(&self, reason: String) -> SyncError {
        let err = SyncError::JoinFailed {
            topic: self.topic.clone(),
            reason,
        };
        warn!("{err}");
        self.notifier.notify(Notice::from(&err));
        err
    }
}

/// A joined session with its reconcile loop running.
pub struct RunningSession {
    topic: Topic,
    dispatcher: ActionDispatcher,
    status_rx: watch::Receiver<SyncStatus>,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<CommentStore>,
}

impl RunningSession {
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    pub fn status(&self) -> SyncStatus {
        self.status_rx.borrow().clone()
    }

    /// Wait until the loop has processed at least `events` inbound messages.
    pub async fn settle(&mut self, events: u64) -> Result<SyncStatus, SyncError> {
        self.wait_until(|s| s.events_processed >= events).await
    }

    pub async fn wait_until(
        &mut self,
        predicate: impl FnMut(&SyncStatus) -> bool,
    ) -> Result<SyncStatus, SyncError> {
        let status = self
            .status_rx
            .wait_for(predicate)
            .await
            .map_err(|_| SyncError::LoopStopped("status channel closed".into()))?;
        Ok(status.clone())
    }

    /// Stop the loop and hand back the final store.
    pub async fn shutdown(self) -> Result<CommentStore, SyncError> {
        // the loop may already have exited on its own
        let _ = self.shutdown_tx.send(true);
        self.handle
            .await
            .map_err(|e| SyncError::LoopStopped(e.to_string()))
    }
}
