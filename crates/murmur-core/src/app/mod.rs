//! App - アプリケーション層
//!
//! ports を組み合わせて同期ロジックを実装します。
//!
//! # 主要コンポーネント
//! - **SessionBuilder**: セッションの構築とワイヤリング
//! - **SyncSession / RunningSession**: join と reconcile loop の起動・停止
//! - **ReconcileLoop**: 受信イベントの単一コンシューマー（store の唯一の書き手）
//! - **ActionDispatcher**: ユーザー操作 → channel push
//! - **SyncStatus**: ループの進捗

pub mod builder;
pub mod dispatcher;
pub mod reconcile_loop;
pub mod session;
pub mod status;

pub use self::builder::{BuildError, SessionBuilder};
pub use self::dispatcher::{ActionDispatcher, PendingAction};
pub use self::reconcile_loop::ReconcileLoop;
pub use self::session::{RunningSession, SyncSession};
pub use self::status::SyncStatus;
