use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexingPhase {
    Completed,
    InProgress,
    NotStarted,
}

/// Advisory upstream indexing progress for a collection.
///
/// Rendered as a banner; never gates loading.
/// 仅作提示用途，不阻塞加载。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexingStatus {
    pub status: IndexingPhase,
    pub progress: u8,
}

impl IndexingStatus {
    pub fn completed() -> Self {
        Self {
            status: IndexingPhase::Completed,
            progress: 100,
        }
    }

    pub fn in_progress(progress: u8) -> Self {
        Self {
            status: IndexingPhase::InProgress,
            progress: progress.min(100),
        }
    }

    pub fn not_started() -> Self {
        Self {
            status: IndexingPhase::NotStarted,
            progress: 0,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == IndexingPhase::Completed
    }
}

impl Default for IndexingStatus {
    /// Optimistic: assume the collection is fully indexed until told otherwise.
    fn default() -> Self {
        Self::completed()
    }
}
