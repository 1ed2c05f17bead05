//! ReconcileLoop - 受信イベントの単一コンシューマー
//!
//! # フロー
//! 1. inbound ストリームから ChannelMessage を受け取る
//! 2. InboundEvent に decode（失敗したら破棄してログ、ループは止めない）
//! 3. Reconciler で Transition を決める
//! 4. CommentStore に反映し、ViewRenderer に通知
//! 5. SyncStatus を watch に流す
//!
//! store を書き換えるのはこのループだけなので、ロックは不要です。

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::status::SyncStatus;
use crate::domain::{ChannelMessage, InboundEvent};
use crate::ports::ViewRenderer;
use crate::reconcile::{Reconciler, Transition};
use crate::store::CommentStore;

pub struct ReconcileLoop {
    reconciler: Arc<dyn Reconciler>,
    renderer: Arc<dyn ViewRenderer>,
    store: CommentStore,
    status: SyncStatus,
    status_tx: watch::Sender<SyncStatus>,
}

impl ReconcileLoop {
    pub fn new(reconciler: Arc<dyn Reconciler>, renderer: Arc<dyn ViewRenderer>) -> Self {
        let (status_tx, _) = watch::channel(SyncStatus::default());
        Self {
            reconciler,
            renderer,
            store: CommentStore::new(),
            status: SyncStatus::default(),
            status_tx,
        }
    }

    pub fn store(&self) -> &CommentStore {
        &self.store
    }

    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.status_tx.subscribe()
    }

    /// Process one inbound message. `None` when it could not be decoded.
    pub fn handle(&mut self, message: ChannelMessage) -> Option<Transition> {
        let transition = match InboundEvent::decode(&message) {
            Ok(event) => {
                let transition = self.reconciler.reconcile(&event, &self.store);
                debug!(
                    "{} {} -> {:?}",
                    event.name(),
                    event.comment_id(),
                    transition
                );
                self.apply(&transition);
                self.status.record(&transition);
                Some(transition)
            }
            Err(e) => {
                warn!("discarding inbound message: {e}");
                self.status.record_malformed();
                None
            }
        };

        self.status.store = self.store.counts();
        self.status_tx.send_replace(self.status.clone());
        transition
    }

    fn apply(&mut self, transition: &Transition) {
        match transition {
            Transition::Insert(comment) => {
                if self.store.upsert_created(comment.clone()) {
                    self.renderer.insert(comment);
                }
            }
            Transition::Approve(comment_id) => {
                if self.store.mark_approved(comment_id) {
                    self.renderer.remove_moderation_controls(comment_id);
                }
            }
            Transition::Remove(comment_id) => {
                self.store.remove(comment_id);
                // safe even if it was never shown
                self.renderer.remove(comment_id);
            }
            Transition::Ignore(_) => {}
        }
    }

    /// Consume the inbound stream until it closes or shutdown is requested.
    ///
    /// Returns the final store.
    pub async fn run(
        mut self,
        mut inbound: mpsc::Receiver<ChannelMessage>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> CommentStore {
        info!("reconcile loop started");
        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            let message = tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() {
                        // session handle dropped: nobody can ask us to stop any more,
                        // keep draining until the transport closes
                        match inbound.recv().await {
                            Some(message) => message,
                            None => break,
                        }
                    } else {
                        continue;
                    }
                }
                message = inbound.recv() => match message {
                    Some(message) => message,
                    None => {
                        info!("inbound stream closed");
                        break;
                    }
                },
            };

            self.handle(message);
        }
        info!(
            "reconcile loop stopped after {} events",
            self.status.events_processed
        );
        self.store
    }
}
