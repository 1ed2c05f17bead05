//! TracingNotifier - 通知をログに書き出す既定の Notifier

use tracing::{error, info, warn};

use crate::ports::{Notice, NoticeLevel, Notifier};

/// Notifier that writes notices to the log. Default when none is injected.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => info!(target: "murmur::notice", "{}", notice.message),
            NoticeLevel::Warning => warn!(target: "murmur::notice", "{}", notice.message),
            NoticeLevel::Error => error!(target: "murmur::notice", "{}", notice.message),
        }
    }
}
