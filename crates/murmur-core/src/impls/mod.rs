//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports の実装を含めます。
//!
//! # 含まれる実装
//! - **LoopbackHub / LoopbackTransport**: インメモリの channel サーバーと接続
//! - **RecordingRenderer / MemoryForm / RecordingNotifier**: 画面側のテスト用ダブル
//! - **TracingNotifier**: 通知をログに流すデフォルト実装
//!
//! # 本番用実装
//! WebSocket transport や実際の画面描画は、このクレートを使う側で実装します。

pub mod loopback;
pub mod recording;
pub mod tracing_notifier;

pub use self::loopback::{LoopbackHub, LoopbackTransport};
pub use self::recording::{
    MemoryForm, RecordingNotifier, RecordingRenderer, RenderCall, RenderedComment,
};
pub use self::tracing_notifier::TracingNotifier;
