//! Progressive loading of one view into its cache entry.
//! 将单个视图渐进加载到缓存条目中。

mod handle;
mod options;
mod progressive_loader;
mod sequencer;

pub use handle::{LoadHandle, LoadOrigin};
pub use options::{LoadOptions, ProgressFn};
pub use progressive_loader::ProgressiveLoader;
pub use sequencer::BatchSequencer;
