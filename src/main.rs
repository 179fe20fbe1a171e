use std::sync::Arc;

use financebot_pro::app::App;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    init_logging()?;
    color_eyre::install()?;
    let terminal = ratatui::init();
    let result = App::new()?.run(terminal).await;
    ratatui::restore();
    result
}

/// The terminal belongs to ratatui, so logs go to a file instead of stdout.
fn init_logging() -> color_eyre::Result<()> {
    std::fs::create_dir_all("./logs")?;
    let log_file = std::fs::File::create("./logs/financebot.log")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}
