use clap::Parser;
use tokenview_lib::bootstrap::{init_tracing_subscriber, resolve_settings};
use tokenview_lib::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let resolved = resolve_settings(cli.config.clone())?;
    init_tracing_subscriber(&resolved.settings.logging)?;
    resolved.log_source();
    let settings = resolved.settings;

    let render = tokenview_lib::run(&cli, &settings).await?;
    let output = if cli.pretty {
        serde_json::to_string_pretty(&render)?
    } else {
        serde_json::to_string(&render)?
    };
    println!("{output}");

    if render.load_state.is_failed() {
        std::process::exit(1);
    }
    Ok(())
}
