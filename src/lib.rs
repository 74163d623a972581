//! # tokenview
//!
//! Binary-side glue: loads settings, initializes tracing, wires the
//! `tv-infra` adapters into the `tv-app` gallery session and renders one
//! view.

pub mod bootstrap;
pub mod cli;

use tracing::{info, info_span, warn, Instrument};
use tv_app::RenderWindow;
use tv_core::Settings;

use crate::bootstrap::{build_session, wire_dependencies};
use crate::cli::Cli;

/// Loads the view described by `cli` and returns the render window for its
/// viewport. A failed load is still rendered; its state is in the window.
pub async fn run(cli: &Cli, settings: &Settings) -> anyhow::Result<RenderWindow> {
    let key = cli.view_key();
    let viewport = cli.viewport(&settings.viewport);
    let span = info_span!("cli.run", view = %key);

    async {
        let deps = wire_dependencies(settings, cli.provider_source())?;
        let session = build_session(settings, deps);

        let mut handle = session.set_view_key(key).await;
        let state = handle.wait().await;
        if state.is_failed() {
            warn!(?state, "load did not complete");
        }

        let render = session.render_window(&viewport).await?;
        info!(
            loaded = render.loaded,
            cells = render.cells.len(),
            has_more = render.has_more,
            "view rendered"
        );
        session.shutdown().await;
        Ok::<_, anyhow::Error>(render)
    }
    .instrument(span)
    .await
}
