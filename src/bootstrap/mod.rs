//! Process bootstrap: configuration, tracing and dependency wiring.
//! 进程启动：配置、日志追踪与依赖装配。

pub mod config;
pub mod tracing;
pub mod wiring;

pub use config::{load_settings, resolve_settings, ResolvedSettings, SettingsSource, CONFIG_ENV};
pub use self::tracing::init_tracing_subscriber;
pub use wiring::{build_session, wire_dependencies, AppDeps, ProviderSource};
