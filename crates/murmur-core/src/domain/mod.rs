//! Domain - ドメインモデル
//!
//! ids, comment, channel イベント, ライフサイクル state, viewer, topic, errors を含みます。

pub mod comment;
pub mod envelope;
pub mod errors;
pub mod events;
pub mod ids;
pub mod state;
pub mod topic;
pub mod viewer;

pub use comment::{Comment, InsertedAt};
pub use envelope::ChannelMessage;
pub use errors::{ErrorKind, SyncError, ValidationError};
pub use events::{
    ApproveIntent, ApprovedPayload, CreateIntent, CreatedPayload, DeleteIntent, DeletedPayload,
    EventError, EventName, InboundEvent, OutboundEvent,
};
pub use ids::{CommentId, PostId};
pub use state::CommentState;
pub use topic::{DEFAULT_TOPIC_PREFIX, Topic};
pub use viewer::Viewer;
