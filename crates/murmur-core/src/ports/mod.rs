//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」です。
//! 外部の協調者（channel transport, 描画, フォーム, 通知）へのインターフェースを定義し、
//! 実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - 正本はサーバー。クライアントは表示中のコメントだけをメモリに持つ
//! - transport はセッション生成時に注入する（グローバルな socket は持たない）

pub mod form;
pub mod notifier;
pub mod renderer;
pub mod transport;

pub use self::form::FormStore;
pub use self::notifier::{Notice, NoticeLevel, Notifier};
pub use self::renderer::{RenderedText, ViewRenderer};
pub use self::transport::{ChannelTransport, PendingReply, Reply, TransportError};
