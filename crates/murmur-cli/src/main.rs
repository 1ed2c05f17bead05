use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde_json::json;
use tracing::info;

use murmur_core::app::{RunningSession, SessionBuilder};
use murmur_core::config::{ConfigLoader, SyncConfig};
use murmur_core::domain::{CommentId, PostId, Viewer};
use murmur_core::impls::{LoopbackHub, MemoryForm, RecordingNotifier, RecordingRenderer};
use murmur_core::telemetry;

/// Two viewers of one post, synced through an in-memory hub.
#[derive(Debug, Parser)]
#[command(name = "murmur", version)]
struct Args {
    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "1")]
    post_id: String,

    /// Moderator auth token
    #[arg(long, default_value = "demo-moderator")]
    token: String,

    /// Log filter directive (overrides config and MURMUR_LOG)
    #[arg(long)]
    log: Option<String>,
}

/// 1 人分の画面: セッションと、そのセッションが描画・入力に使うダブル
struct Page {
    running: RunningSession,
    renderer: Arc<RecordingRenderer>,
    form: Arc<MemoryForm>,
    notifier: Arc<RecordingNotifier>,
}

async fn open_page(
    hub: &LoopbackHub,
    config: &SyncConfig,
    post_id: &PostId,
    token: Option<&str>,
) -> Result<Page> {
    let renderer = Arc::new(RecordingRenderer::new());
    let form = Arc::new(MemoryForm::new());
    let notifier = Arc::new(RecordingNotifier::new());

    let session = SessionBuilder::new(post_id.clone())
        .viewer(Viewer::from_token(token))
        .config(config.clone())
        .transport(Arc::new(hub.connect(token)))
        .renderer(renderer.clone())
        .form(form.clone())
        .notifier(notifier.clone())
        .build()?;
    let running = session.start().await?;

    Ok(Page {
        running,
        renderer,
        form,
        notifier,
    })
}

async fn settle(page: &mut Page, events: u64) -> Result<()> {
    tokio::time::timeout(Duration::from_secs(5), page.running.settle(events))
        .await
        .with_context(|| format!("{} did not settle", page.running.topic()))??;
    Ok(())
}

fn parse_post_id(raw: &str) -> Result<PostId> {
    let raw = raw.trim();
    if raw.is_empty() {
        bail!("--post-id must not be blank");
    }
    Ok(raw
        .parse::<u64>()
        .map(PostId::from)
        .unwrap_or_else(|_| PostId::new(raw)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // (A) 設定: defaults → file → env → CLI
    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_file(path);
    }
    let mut config = loader.load().context("loading config")?;
    if let Some(level) = args.log {
        config.logging.level = level;
    }
    telemetry::init(&config.logging)?;

    let post_id = parse_post_id(&args.post_id)?;
    let hub = LoopbackHub::new();

    // (B) モデレーターと一般読者が同じ投稿を開く
    let mut moderator = open_page(&hub, &config, &post_id, Some(&args.token)).await?;
    let mut reader = open_page(&hub, &config, &post_id, None).await?;
    info!("both viewers joined {}", moderator.running.topic());

    // (C) 読者がコメント → モデレーターだけに見える
    reader.form.fill("reader", "Nice post!");
    let created = reader.running.dispatcher().submit_create()?.outcome().await?;
    settle(&mut moderator, 1).await?;
    settle(&mut reader, 1).await?;
    let comment_id: CommentId = serde_json::from_value(created["commentId"].clone())
        .context("create acknowledgment without commentId")?;
    info!("reader sees {} comments before approval", reader.renderer.rendered_ids().len());

    // (D) 承認 → 読者にも表示される
    moderator
        .running
        .dispatcher()
        .submit_approve(&comment_id)?
        .outcome()
        .await?;
    settle(&mut moderator, 2).await?;
    settle(&mut reader, 2).await?;

    // (E) モデレーター自身のコメント（自動承認）を投稿して削除
    moderator.form.fill("moderator", "Thread will be tidied up.");
    let created = moderator.running.dispatcher().submit_create()?.outcome().await?;
    let own_id: CommentId = serde_json::from_value(created["commentId"].clone())
        .context("create acknowledgment without commentId")?;
    moderator
        .running
        .dispatcher()
        .submit_delete(&own_id)?
        .outcome()
        .await?;
    settle(&mut moderator, 4).await?;
    settle(&mut reader, 4).await?;

    // (F) 最終状態を出力
    let moderator_status = moderator.running.status();
    let reader_status = reader.running.status();
    let moderator_rows = moderator.renderer.rows();
    let reader_rows = reader.renderer.rows();
    let notices: Vec<_> = moderator
        .notifier
        .notices()
        .into_iter()
        .chain(reader.notifier.notices())
        .collect();
    let moderator_store = moderator.running.shutdown().await?;
    let reader_store = reader.running.shutdown().await?;

    let report = json!({
        "moderator": {
            "status": moderator_status,
            "rendered": moderator_rows,
            "store": moderator_store.iter().collect::<Vec<_>>(),
        },
        "reader": {
            "status": reader_status,
            "rendered": reader_rows,
            "store": reader_store.iter().collect::<Vec<_>>(),
        },
        "notices": notices,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
