use serde::{Deserialize, Serialize};

/// Load progress of one view.
///
/// Only the progressive loader and the retry controller move a view between
/// these states; everything else observes them.
/// 只有渐进加载器与重试控制器可以驱动状态转换。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    Idle,
    Loading {
        progress: u8,
    },
    Loaded,
    Failed {
        reason: String,
        attempts: u32,
    },
}

impl LoadState {
    pub fn loading(loaded: usize, total: u64) -> Self {
        LoadState::Loading {
            progress: progress_percent(loaded, total),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LoadState::Failed { .. })
    }

    /// `Loaded` and `Failed` end a load; `Idle` and `Loading` do not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadState::Loaded | LoadState::Failed { .. })
    }

    pub fn progress(&self) -> u8 {
        match self {
            LoadState::Idle | LoadState::Failed { .. } => 0,
            LoadState::Loading { progress } => *progress,
            LoadState::Loaded => 100,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoadState::Idle => "idle",
            LoadState::Loading { .. } => "loading",
            LoadState::Loaded => "loaded",
            LoadState::Failed { .. } => "failed",
        }
    }
}

/// 0..=100; an unknown total reports 0.
pub fn progress_percent(loaded: usize, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (loaded as u128 * 100) / total as u128;
    pct.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent_bounds() {
        assert_eq!(progress_percent(0, 0), 0);
        assert_eq!(progress_percent(20, 45), 44);
        assert_eq!(progress_percent(45, 45), 100);
        assert_eq!(progress_percent(50, 45), 100);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!LoadState::Idle.is_terminal());
        assert!(!LoadState::loading(1, 2).is_terminal());
        assert!(LoadState::Loaded.is_terminal());
        assert!(LoadState::Failed {
            reason: "x".into(),
            attempts: 3
        }
        .is_terminal());
    }

    #[test]
    fn test_serializes_with_tag() {
        let json = serde_json::to_string(&LoadState::Loading { progress: 40 }).unwrap();
        assert_eq!(json, r#"{"state":"loading","progress":40}"#);
    }
}
