//! Status - reconcile loop の進捗
//!
//! ループはイベントを 1 件処理するたびに `watch` チャネルへ最新の SyncStatus を流します。

use serde::{Deserialize, Serialize};

use crate::reconcile::Transition;
use crate::store::StoreCounts;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    /// Inbound messages seen, including malformed ones.
    pub events_processed: u64,
    pub inserted: u64,
    pub approved: u64,
    pub removed: u64,
    pub ignored: u64,
    pub malformed: u64,
    pub store: StoreCounts,
}

impl SyncStatus {
    pub(crate) fn record(&mut self, transition: &Transition) {
        self.events_processed += 1;
        match transition {
            Transition::Insert(_) => self.inserted += 1,
            Transition::Approve(_) => self.approved += 1,
            Transition::Remove(_) => self.removed += 1,
            Transition::Ignore(_) => self.ignored += 1,
        }
    }

    pub(crate) fn record_malformed(&mut self) {
        self.events_processed += 1;
        self.malformed += 1;
    }
}
