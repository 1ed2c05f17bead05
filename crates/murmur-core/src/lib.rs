//! murmur-core
//!
//! Client-side real-time comment sync for one post view.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, comment, channel イベント, state, viewer, errors）
//! - **ports**: 抽象化レイヤー（ChannelTransport, ViewRenderer, FormStore, Notifier）
//! - **store**: 表示中コメントのインメモリ store
//! - **reconcile**: 受信イベント → store 変更の決定（純粋関数）
//! - **app**: アプリケーションロジック（builder, session, reconcile_loop, dispatcher, status）
//! - **impls**: 実装（LoopbackHub など開発・テスト用）
//! - **config / telemetry**: 設定読み込みとログ初期化
//!
//! # フロー
//! 1. `SessionBuilder` で協調者を注入して `SyncSession` を作る
//! 2. `start()` で subscribe → join → reconcile loop 起動
//! 3. ユーザー操作は `ActionDispatcher` から push、反映は broadcast 経由のみ

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod reconcile;
pub mod store;
pub mod telemetry;

pub use app::{ActionDispatcher, RunningSession, SessionBuilder, SyncSession, SyncStatus};
pub use config::{ConfigLoader, SyncConfig};
pub use domain::{Comment, CommentId, PostId, SyncError, Topic, Viewer};
