//! SessionBuilder - セッションの構築とワイヤリング
//!
//! # Fail-fast 設計
//! - transport / renderer / form は必須
//! - build() 時に不足している協調者をまとめて報告する
//! - notifier と reconciler は省略可能（tracing へのログ出力 / DefaultReconciler）

use std::sync::Arc;

use super::session::SyncSession;
use crate::config::{ConfigError, SyncConfig};
use crate::domain::{PostId, Topic, Viewer};
use crate::impls::TracingNotifier;
use crate::ports::{ChannelTransport, FormStore, Notifier, ViewRenderer};
use crate::reconcile::{DefaultReconciler, Reconciler};

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing collaborators: {0:?}. These must be set before build().")]
    MissingCollaborators(Vec<&'static str>),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// ```ignore
/// let session = SessionBuilder::new(PostId::from(1))
///     .viewer(Viewer::from_token(token))
///     .transport(Arc::new(hub.connect(token)))
///     .renderer(renderer)
///     .form(form)
///     .build()?;
/// let running = session.start().await?;
/// ```
pub struct SessionBuilder {
    post_id: PostId,
    viewer: Viewer,
    config: SyncConfig,
    transport: Option<Arc<dyn ChannelTransport>>,
    renderer: Option<Arc<dyn ViewRenderer>>,
    form: Option<Arc<dyn FormStore>>,
    notifier: Option<Arc<dyn Notifier>>,
    reconciler: Option<Arc<dyn Reconciler>>,
}

impl SessionBuilder {
    pub fn new(post_id: PostId) -> Self {
        Self {
            post_id,
            viewer: Viewer::anonymous(),
            config: SyncConfig::default(),
            transport: None,
            renderer: None,
            form: None,
            notifier: None,
            reconciler: None,
        }
    }

    pub fn viewer(mut self, viewer: Viewer) -> Self {
        self.viewer = viewer;
        self
    }

    pub fn config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    pub fn transport(mut self, transport: Arc<dyn ChannelTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn ViewRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn form(mut self, form: Arc<dyn FormStore>) -> Self {
        self.form = Some(form);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Replace the default reconciliation rules.
    pub fn reconciler(mut self, reconciler: Arc<dyn Reconciler>) -> Self {
        self.reconciler = Some(reconciler);
        self
    }

    pub fn build(self) -> Result<SyncSession, BuildError> {
        self.config.validate()?;

        let mut missing = Vec::new();
        if self.transport.is_none() {
            missing.push("transport");
        }
        if self.renderer.is_none() {
            missing.push("renderer");
        }
        if self.form.is_none() {
            missing.push("form");
        }
        let (Some(transport), Some(renderer), Some(form)) =
            (self.transport, self.renderer, self.form)
        else {
            return Err(BuildError::MissingCollaborators(missing));
        };

        let topic = Topic::for_post(&self.config.channel.topic_prefix, &self.post_id);
        let reconciler = self.reconciler.unwrap_or_else(|| {
            Arc::new(DefaultReconciler::new(self.viewer, self.post_id.clone()))
        });

        Ok(SyncSession {
            post_id: self.post_id,
            topic,
            viewer: self.viewer,
            config: self.config,
            transport,
            renderer,
            form,
            notifier: self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier)),
            reconciler,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{LoopbackHub, MemoryForm, RecordingRenderer};

    #[test]
    fn build_success() {
        let hub = LoopbackHub::new();
        let session = SessionBuilder::new(PostId::from(7))
            .transport(Arc::new(hub.connect(None)))
            .renderer(Arc::new(RecordingRenderer::new()))
            .form(Arc::new(MemoryForm::new()))
            .build()
            .unwrap();

        assert_eq!(session.topic().as_str(), "comments:7");
        assert!(!session.viewer().is_privileged());
    }

    #[test]
    fn build_reports_all_missing_collaborators() {
        let result = SessionBuilder::new(PostId::from(7))
            .form(Arc::new(MemoryForm::new()))
            .build();

        assert!(matches!(
            result,
            Err(BuildError::MissingCollaborators(missing)) if missing == vec!["transport", "renderer"]
        ));
    }

    #[test]
    fn build_uses_configured_prefix() {
        let mut config = SyncConfig::default();
        config.channel.topic_prefix = "talk".into();

        let session = SessionBuilder::new(PostId::new("abc"))
            .config(config)
            .transport(Arc::new(LoopbackHub::new().connect(None)))
            .renderer(Arc::new(RecordingRenderer::new()))
            .form(Arc::new(MemoryForm::new()))
            .build()
            .unwrap();

        assert_eq!(session.topic().as_str(), "talk:abc");
    }

    #[test]
    fn build_rejects_invalid_config() {
        let mut config = SyncConfig::default();
        config.channel.inbound_capacity = 0;

        let result = SessionBuilder::new(PostId::from(1)).config(config).build();
        assert!(matches!(result, Err(BuildError::Config(_))));
    }
}
